use crate::textprep::{clip_with_ellipsis, collapse_ws, has_any_text};
use crate::youtube;
use gistpipe_core::{PageContent, PageKind};
use html_scraper::{ElementRef, Html, Node, Selector};
use std::borrow::Cow;

/// Extracted page text is clipped to this many chars (plus `...`).
pub const MAX_PAGE_CHARS: usize = 10_000;

/// A main-content match shorter than this falls back to the whole body.
pub const MIN_MAIN_CONTENT_CHARS: usize = 200;

/// Elements whose text is never part of the readable page.
///
/// `noscript` bodies parse as text (scripting is on), but a browser never renders them.
const HIDDEN_TAGS: [&str; 8] = [
    "script", "style", "noscript", "template", "nav", "header", "footer", "aside",
];

/// Class names marking ads and sidebars.
const HIDDEN_CLASSES: [&str; 3] = ["advertisement", "ads", "sidebar"];

/// Main-content candidates, most specific first. The first match wins.
const CONTENT_SELECTORS: [&str; 9] = [
    "main",
    "article",
    "[role=\"main\"]",
    ".content",
    ".main-content",
    ".post-content",
    ".entry-content",
    "#content",
    "#main",
];

/// Elements that start a new line when rendered; their text must not run into neighbors.
const BLOCK_TAGS: [&str; 30] = [
    "address", "article", "blockquote", "br", "caption", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "form", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p",
    "pre", "section", "table", "td", "th", "tr", "ul",
];

#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub title: Option<String>,
    /// Whitespace-collapsed visible text, clipped to [`MAX_PAGE_CHARS`].
    pub text: String,
    /// Which selector the text came from (`"body"` when none matched).
    pub source: &'static str,
    pub truncated: bool,
}

fn is_hidden_element(el: &ElementRef) -> bool {
    let v = el.value();
    if HIDDEN_TAGS.contains(&v.name()) {
        return true;
    }
    v.classes().any(|c| HIDDEN_CLASSES.contains(&c))
}

fn has_hidden_ancestor(el: &ElementRef) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| is_hidden_element(&a))
}

fn push_visible_text(el: ElementRef, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(t) => out.push_str(t),
            Node::Element(_) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                if is_hidden_element(&child_el) {
                    continue;
                }
                let block = BLOCK_TAGS.contains(&child_el.value().name());
                if block {
                    out.push(' ');
                }
                push_visible_text(child_el, out);
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// Visible text under `el`, skipping hidden subtrees, whitespace-collapsed.
pub(crate) fn visible_text(el: ElementRef) -> String {
    let mut raw = String::new();
    push_visible_text(el, &mut raw);
    collapse_ws(&raw)
}

/// First element matching `selector` that is not inside a hidden subtree.
pub(crate) fn first_visible<'a>(doc: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel)
        .find(|el| !is_hidden_element(el) && !has_hidden_ancestor(el))
}

pub(crate) fn page_title(doc: &Html) -> Option<String> {
    let sel = Selector::parse("title").ok()?;
    let el = doc.select(&sel).next()?;
    let t = collapse_ws(&el.text().collect::<String>());
    has_any_text(&t).then_some(t)
}

fn pick_main_content(doc: &Html) -> Option<(&'static str, String)> {
    CONTENT_SELECTORS
        .iter()
        .find_map(|sel| first_visible(doc, sel).map(|el| (*sel, visible_text(el))))
}

/// Extract the readable text of a regular webpage.
///
/// Uses the first main-content selector that matches; if none matches or the match is
/// short, the whole body is used instead.
pub fn extract_webpage(html: &str) -> ExtractedPage {
    let doc = Html::parse_document(html);
    let title = page_title(&doc);

    let mut source = "body";
    let mut text = String::new();
    if let Some((sel, t)) = pick_main_content(&doc) {
        source = sel;
        text = t;
    }
    if text.chars().count() < MIN_MAIN_CONTENT_CHARS {
        source = "body";
        text = first_visible(&doc, "body")
            .map(visible_text)
            .unwrap_or_default();
    }

    let (text, truncated) = clip_with_ellipsis(&text, MAX_PAGE_CHARS);
    ExtractedPage {
        title,
        text,
        source,
        truncated,
    }
}

/// Best-effort guess for whether bytes are HTML-ish.
pub fn bytes_look_like_html(bytes: &[u8]) -> bool {
    let mut i = 0usize;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if i >= bytes.len() {
        return false;
    }
    let rest = &bytes[i..];
    rest.starts_with(b"<!doctype")
        || rest.starts_with(b"<!DOCTYPE")
        || rest.starts_with(b"<html")
        || rest.starts_with(b"<HTML")
        || rest.starts_with(b"<head")
        || rest.starts_with(b"<body")
}

fn content_type_lc_prefix(ct: Option<&str>) -> String {
    ct.unwrap_or("")
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Build [`PageContent`] from an HTML document.
///
/// `url` decides the page kind: YouTube hosts get the video extractor.
pub fn page_content_from_html(html: &str, url: Option<&str>) -> PageContent {
    let kind = match url {
        Some(u) if youtube::is_video_url(u) => PageKind::Video,
        _ => PageKind::Webpage,
    };
    page_content_with_kind(html, url, kind)
}

/// Like [`page_content_from_html`], with the page kind chosen by the caller.
pub fn page_content_with_kind(html: &str, url: Option<&str>, kind: PageKind) -> PageContent {
    let (title, text, video) = match kind {
        PageKind::Video => {
            let doc = Html::parse_document(html);
            let meta = youtube::extract_video_metadata(&doc);
            (page_title(&doc), youtube::extract_video_text(&doc), Some(meta))
        }
        PageKind::Webpage => {
            let page = extract_webpage(html);
            (page.title, page.text, None)
        }
    };
    PageContent {
        url: url.map(str::to_string),
        title,
        kind,
        text,
        video,
    }
}

const QUOTES: &[char] = &['"', '\''];

fn charset_from_content_type(ct: &str) -> Option<&str> {
    ct.split(';').skip(1).find_map(|param| {
        let (k, v) = param.split_once('=')?;
        k.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| v.trim().trim_matches(QUOTES))
    })
}

/// `<meta charset=..>` or `<meta http-equiv content="..; charset=..">` near the top of a document.
fn charset_from_meta(bytes: &[u8]) -> Option<String> {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(1024)]).to_ascii_lowercase();
    let at = head.find("charset=")? + "charset=".len();
    let label: String = head[at..]
        .trim_start_matches(QUOTES)
        .chars()
        .take_while(|c: &char| c.is_ascii_alphanumeric() || matches!(*c, '-' | '_' | ':' | '.'))
        .collect();
    (!label.is_empty()).then_some(label)
}

/// Decode a fetched body using its declared charset.
///
/// The `content-type` charset wins, then a `<meta>` charset for HTML. A BOM overrides both;
/// anything unknown decodes as UTF-8 with replacement characters.
pub fn decode_body<'a>(bytes: &'a [u8], content_type: Option<&str>, is_html: bool) -> Cow<'a, str> {
    let label = content_type
        .and_then(charset_from_content_type)
        .map(str::to_string)
        .or_else(|| is_html.then(|| charset_from_meta(bytes)).flatten());
    let encoding = label
        .and_then(|l| encoding_rs::Encoding::for_label(l.as_bytes()))
        .unwrap_or(encoding_rs::UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text
}

/// Build [`PageContent`] from a fetched body.
///
/// HTML goes through the extractors; plain text is only whitespace-collapsed and clipped.
pub fn page_content_from_bytes(bytes: &[u8], content_type: Option<&str>, url: &str) -> PageContent {
    let ct = content_type_lc_prefix(content_type);
    let is_html = ct == "text/html" || ct == "application/xhtml+xml" || bytes_look_like_html(bytes);
    let body = decode_body(bytes, content_type, is_html);
    if is_html {
        return page_content_from_html(&body, Some(url));
    }
    let (text, _) = clip_with_ellipsis(&collapse_ws(&body), MAX_PAGE_CHARS);
    PageContent {
        url: Some(url.to_string()),
        title: None,
        kind: PageKind::Webpage,
        text,
        video: None,
    }
}
