//! Page summarization: extract the page, check there is enough of it, summarize.

use crate::extract::{page_content_from_bytes, page_content_from_html, page_content_with_kind};
use crate::summarize::ExtractiveSummarizer;
use gistpipe_core::{
    Error, FetchBackend, FetchRequest, PageContent, PageContentProvider, PageKind, PageSummary,
    Result, SummaryOptions,
};
use std::sync::Arc;

/// Pages with less trimmed text than this are not summarized.
pub const MIN_PAGE_CHARS: usize = 100;

pub const NOT_ENOUGH_CONTENT_MESSAGE: &str =
    "Not enough content found to summarize. The page might be loading or have restricted access.";

/// An HTML document already in memory.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    pub html: String,
    pub url: Option<String>,
    /// Forces the page kind instead of deriving it from `url`.
    pub kind: Option<PageKind>,
}

impl HtmlPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            url: None,
            kind: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_kind(mut self, kind: PageKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

#[async_trait::async_trait]
impl PageContentProvider for HtmlPage {
    async fn page_content(&self) -> Result<PageContent> {
        let url = self.url.as_deref();
        Ok(match self.kind {
            Some(kind) => page_content_with_kind(&self.html, url, kind),
            None => page_content_from_html(&self.html, url),
        })
    }
}

/// A page fetched over the network when its content is requested.
#[derive(Clone)]
pub struct FetchedPage {
    fetcher: Arc<dyn FetchBackend>,
    request: FetchRequest,
}

impl FetchedPage {
    pub fn new(fetcher: Arc<dyn FetchBackend>, request: FetchRequest) -> Self {
        Self { fetcher, request }
    }
}

#[async_trait::async_trait]
impl PageContentProvider for FetchedPage {
    async fn page_content(&self) -> Result<PageContent> {
        let resp = self.fetcher.fetch(&self.request).await?;
        if !(200..300).contains(&resp.status) {
            return Err(Error::Extraction(format!(
                "HTTP {} for {}",
                resp.status, resp.final_url
            )));
        }
        Ok(page_content_from_bytes(
            &resp.bytes,
            resp.content_type.as_deref(),
            &resp.final_url,
        ))
    }
}

/// Extract the page from `provider` and summarize it.
///
/// `options.is_video` is overridden by the extracted page kind.
pub async fn summarize_page(
    provider: &dyn PageContentProvider,
    options: &SummaryOptions,
) -> Result<PageSummary> {
    tracing::debug!(stage = "extracting", "page summary");
    let page = provider.page_content().await?;
    let chars = page.text.trim().chars().count();
    if chars < MIN_PAGE_CHARS {
        tracing::debug!(stage = "failed", chars, "page text too short");
        return Err(Error::InsufficientContent(
            NOT_ENOUGH_CONTENT_MESSAGE.to_string(),
        ));
    }

    tracing::debug!(stage = "scoring", chars, kind = ?page.kind, "page summary");
    let mut options = options.clone();
    options.is_video = page.is_video();
    let summary = ExtractiveSummarizer::new().summarize(&page.text, &options)?;
    tracing::debug!(stage = "done", selected = summary.selected.len(), "page summary");

    Ok(PageSummary {
        url: page.url,
        title: page.title,
        kind: page.kind,
        video: page.video,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocalFetcher;
    use axum::{http::header, http::StatusCode, routing::get, Router};
    use gistpipe_core::SummaryLength;
    use std::net::SocketAddr;

    const ARTICLE: &str = r#"<html><head><title>Bees</title></head><body>
      <nav>Home About Contact</nav>
      <article>
        <p>Honey bees communicate the location of flowers through a waggle dance inside the hive.</p>
        <p>The angle of the dance encodes the direction of the food source relative to the sun.</p>
        <p>The duration of the waggle run tells other bees how far away the flowers are.</p>
        <p>Scientists decoded the waggle dance of honey bees in the middle of the last century.</p>
      </article>
      <footer>Copyright</footer>
    </body></html>"#;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn summarizes_in_memory_html() {
        let page = HtmlPage::new(ARTICLE).with_url("https://example.com/bees");
        let out = summarize_page(&page, &SummaryOptions::default()).await.unwrap();
        assert_eq!(out.kind, PageKind::Webpage);
        assert_eq!(out.title.as_deref(), Some("Bees"));
        assert_eq!(out.summary.sentence_count, 4);
        assert_eq!(out.summary.selected.len(), 1);
        assert!(!out.summary.text.contains("Copyright"));
        assert!(out.video.is_none());
    }

    #[tokio::test]
    async fn short_pages_are_insufficient_content() {
        let page = HtmlPage::new("<html><body><p>Loading...</p></body></html>");
        let err = summarize_page(&page, &SummaryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientContent(_)));
        assert_eq!(err.to_string(), NOT_ENOUGH_CONTENT_MESSAGE);
    }

    #[tokio::test]
    async fn video_kind_adds_prefix() {
        let html = r#"<html><body>
          <h1 class="title">How compilers turn source code into fast machine code</h1>
          <div id="description-text">This talk walks through parsing, type checking and code generation in a real compiler.</div>
        </body></html>"#;
        let page = HtmlPage::new(html).with_kind(PageKind::Video);
        let opts = SummaryOptions {
            length: SummaryLength::Long,
            ..SummaryOptions::default()
        };
        let out = summarize_page(&page, &opts).await.unwrap();
        assert_eq!(out.kind, PageKind::Video);
        assert!(out.summary.text.starts_with("This YouTube video discusses: "));
        let video = out.video.expect("video metadata");
        assert!(video.description.unwrap_or_default().starts_with("This talk walks through"));
    }

    #[tokio::test]
    async fn fetched_page_is_extracted_and_summarized() {
        let app = Router::new()
            .route(
                "/bees",
                get(|| async { ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], ARTICLE) }),
            )
            .route("/gone", get(|| async { (StatusCode::NOT_FOUND, "nope") }));
        let addr = serve(app).await;
        let fetcher: Arc<dyn FetchBackend> = Arc::new(LocalFetcher::new().unwrap());

        let page = FetchedPage::new(fetcher.clone(), FetchRequest::new(format!("http://{addr}/bees")));
        let out = summarize_page(&page, &SummaryOptions::default()).await.unwrap();
        assert_eq!(out.url.as_deref(), Some(format!("http://{addr}/bees").as_str()));
        assert!(out.summary.text.contains("bees"));

        let page = FetchedPage::new(fetcher, FetchRequest::new(format!("http://{addr}/gone")));
        let err = summarize_page(&page, &SummaryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }
}
