//! YouTube helpers: video URL detection, watch-page text and metadata extraction.
//!
//! The watch page is scraped from server-rendered HTML, so every field is best-effort.
//! Missing elements are skipped, never errors.

use crate::extract::{first_visible, page_title};
use crate::textprep::{collapse_ws, has_any_text};
use gistpipe_core::VideoMetadata;
use html_scraper::{ElementRef, Html, Selector};

/// Comments included in the summarizable text of a video page.
pub const MAX_COMMENTS: usize = 5;

/// Below this many chars the page-level fallback selectors are tried.
pub const MIN_VIDEO_TEXT_CHARS: usize = 50;

const TITLE_SELECTOR: &str = "h1.ytd-video-primary-info-renderer, h1.title";
const DESCRIPTION_SELECTOR: &str =
    "#description-text, .content-description, #watch-description-text";
const COMMENT_SELECTOR: &str = "#content-text, .comment-text";
const FALLBACK_SELECTORS: [&str; 3] = [
    ".ytd-video-secondary-info-renderer",
    ".watch-main-col",
    "#watch-description",
];

pub fn is_youtube_host(host: &str) -> bool {
    let h = host.to_ascii_lowercase();
    h == "youtube.com"
        || h == "www.youtube.com"
        || h == "m.youtube.com"
        || h == "youtu.be"
        || h.ends_with(".youtube.com")
}

/// True when `url` parses and points at a YouTube host.
pub fn is_video_url(url: &str) -> bool {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(is_youtube_host))
        .unwrap_or(false)
}

fn raw_text(el: ElementRef) -> String {
    el.text().collect::<String>()
}

fn first_text(doc: &Html, selector: &str) -> Option<String> {
    let t = collapse_ws(&raw_text(first_visible(doc, selector)?));
    has_any_text(&t).then_some(t)
}

/// Summarizable text of a watch page: title, description, then up to
/// [`MAX_COMMENTS`] comments.
pub fn extract_video_text(doc: &Html) -> String {
    let mut content = String::new();

    if let Some(el) = first_visible(doc, TITLE_SELECTOR) {
        content.push_str(&raw_text(el));
        content.push_str(". ");
    }
    if let Some(el) = first_visible(doc, DESCRIPTION_SELECTOR) {
        content.push_str(&raw_text(el));
        content.push(' ');
    }
    if let Ok(sel) = Selector::parse(COMMENT_SELECTOR) {
        let mut comments = doc.select(&sel).take(MAX_COMMENTS).peekable();
        if comments.peek().is_some() {
            content.push_str("Comments: ");
            for c in comments {
                content.push_str(&raw_text(c));
                content.push(' ');
            }
        }
    }

    let mut content = collapse_ws(&content);
    if content.chars().count() < MIN_VIDEO_TEXT_CHARS {
        if let Some(el) = FALLBACK_SELECTORS
            .iter()
            .find_map(|sel| first_visible(doc, sel))
        {
            content = collapse_ws(&raw_text(el));
        }
    }
    content
}

/// Best-effort metadata from a watch page.
pub fn extract_video_metadata(doc: &Html) -> VideoMetadata {
    VideoMetadata {
        title: first_text(doc, "h1.ytd-video-primary-info-renderer").or_else(|| page_title(doc)),
        channel: first_text(doc, "#owner-name a, #channel-name a"),
        views: first_text(doc, "#count .view-count, .view-count"),
        upload_date: first_text(doc, "#date span, #info-strings yt-formatted-string"),
        description: first_text(doc, "#description-text, .content-description"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATCH_PAGE: &str = r#"
    <html><head><title>Rust in ten minutes - YouTube</title></head><body>
      <h1 class="title ytd-video-primary-info-renderer">Rust in   ten minutes</h1>
      <div id="owner-name"><a href="/c/x">Ferris Channel</a></div>
      <div id="count"><span class="view-count">12,345 views</span></div>
      <div id="date"><span>Mar 3, 2024</span></div>
      <div id="description-text">A quick tour of
        ownership, borrowing and lifetimes.</div>
      <div class="comment"><span id="content-text">Great video!</span></div>
      <div class="comment"><span class="comment-text">Loved the borrowing part.</span></div>
      <div class="comment"><span class="comment-text">c3</span></div>
      <div class="comment"><span class="comment-text">c4</span></div>
      <div class="comment"><span class="comment-text">c5</span></div>
      <div class="comment"><span class="comment-text">c6 should be dropped</span></div>
    </body></html>"#;

    #[test]
    fn is_video_url_checks_host_only() {
        assert!(is_video_url("https://m.youtube.com/watch?v=x"));
        assert!(is_video_url("https://music.youtube.com/"));
        assert!(!is_video_url("https://notyoutube.com/watch?v=x"));
        assert!(!is_video_url("not a url"));
    }

    #[test]
    fn video_text_has_title_description_and_five_comments() {
        let doc = Html::parse_document(WATCH_PAGE);
        let t = extract_video_text(&doc);
        assert!(t.starts_with(
            "Rust in ten minutes. A quick tour of ownership, borrowing and lifetimes. Comments: Great video!"
        ));
        assert!(t.contains("c5"));
        assert!(!t.contains("c6"));
        assert_eq!(t.matches("Comments:").count(), 1);
    }

    #[test]
    fn sparse_pages_use_fallback_selectors() {
        let html = r#"<html><body>
          <h1 class="title">Short</h1>
          <div class="watch-main-col">Older layout: the full description lives in this column instead.</div>
        </body></html>"#;
        let doc = Html::parse_document(html);
        assert_eq!(
            extract_video_text(&doc),
            "Older layout: the full description lives in this column instead."
        );
    }

    #[test]
    fn metadata_is_best_effort() {
        let m = extract_video_metadata(&Html::parse_document(WATCH_PAGE));
        assert_eq!(m.title.as_deref(), Some("Rust in ten minutes"));
        assert_eq!(m.channel.as_deref(), Some("Ferris Channel"));
        assert_eq!(m.views.as_deref(), Some("12,345 views"));
        assert_eq!(m.upload_date.as_deref(), Some("Mar 3, 2024"));
        assert!(m.description.unwrap_or_default().contains("lifetimes"));

        let empty = extract_video_metadata(&Html::parse_document(
            "<html><head><title>Only title</title></head></html>",
        ));
        assert_eq!(empty.title.as_deref(), Some("Only title"));
        assert!(empty.channel.is_none());
    }
}
