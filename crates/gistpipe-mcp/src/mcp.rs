use crate::envelope::{add_envelope_fields, error_obj, ErrorCode};
use crate::ops;
use gistpipe_core::{
    FetchRequest, PageContentProvider, PageKind, SummaryLength, SummaryOptions, LANGUAGES,
};
use gistpipe_local::bus::LocalBus;
use gistpipe_local::orchestrate::Orchestrator;
use gistpipe_local::page::{FetchedPage, HtmlPage};
use gistpipe_local::LocalFetcher;
use rmcp::{
    handler::server::router::tool::ToolRouter as RmcpToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    transport::stdio,
    ErrorData as McpError, ServiceExt,
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

fn tool_result(payload: serde_json::Value) -> CallToolResult {
    // Structured content for machine consumers, plus a text copy for clients that
    // only read `content[0].text`.
    let mut r = CallToolResult::structured(payload.clone());
    r.content = vec![Content::text(payload.to_string())];
    r
}

fn invalid_params(kind: &str, message: &str, hint: &str, request: serde_json::Value) -> CallToolResult {
    let t0 = std::time::Instant::now();
    let mut payload = serde_json::json!({
        "ok": false,
        "error": error_obj(ErrorCode::InvalidParams, message, hint),
        "request": request,
    });
    add_envelope_fields(&mut payload, kind, t0.elapsed().as_millis());
    tool_result(payload)
}

fn options_from(length: Option<&str>, language: Option<&str>, is_video: bool) -> SummaryOptions {
    SummaryOptions {
        length: length
            .map(SummaryLength::parse_lenient)
            .unwrap_or_default(),
        language: language
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("en")
            .to_string(),
        is_video,
    }
}

#[derive(Debug, Deserialize, JsonSchema, Default)]
struct SummarizeTextArgs {
    /// Text to summarize (required).
    #[serde(default)]
    text: Option<String>,
    /// short|medium|long (default: medium; unknown values mean medium).
    #[serde(default)]
    length: Option<String>,
    /// Language tag (default: en).
    #[serde(default)]
    language: Option<String>,
    /// Prefix the summary as a video summary (default: false).
    #[serde(default)]
    is_video: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema, Default)]
struct SummarizePageArgs {
    /// URL to fetch and summarize. Exactly one of `url` or `html` is required.
    #[serde(default)]
    url: Option<String>,
    /// Raw HTML to summarize instead of fetching.
    #[serde(default)]
    html: Option<String>,
    /// With `html`: the page's original URL (decides webpage vs video).
    #[serde(default)]
    page_url: Option<String>,
    /// With `html`: force the page kind (webpage|video).
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    length: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    timeout_ms: Option<u64>,
    #[serde(default)]
    max_bytes: Option<u64>,
    /// With `url`: Accept-Language sent with the fetch (e.g. "fr" or "de-DE,de;q=0.9").
    #[serde(default)]
    accept_language: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema, Default)]
struct SummarizeSelectionArgs {
    /// The selected text. Selections of 50 chars or fewer are ignored.
    #[serde(default)]
    selected_text: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema, Default)]
struct SummarizeRemoteArgs {
    /// Text to send to the summarize API (required).
    #[serde(default)]
    text: Option<String>,
    /// Language tag sent as `lang` (default: en).
    #[serde(default)]
    language: Option<String>,
}

#[derive(Clone)]
pub(crate) struct GistpipeMcp {
    tool_router: RmcpToolRouter<Self>,
    fetcher: Arc<LocalFetcher>,
    bus: LocalBus,
}

#[tool_router]
impl GistpipeMcp {
    pub(crate) fn new() -> Result<Self, McpError> {
        let fetcher =
            LocalFetcher::new().map_err(|e| McpError::internal_error(e.to_string(), None))?;
        let http = gistpipe_local::http_client("gistpipe-mcp/0.1")
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(Self {
            tool_router: Self::tool_router(),
            fetcher: Arc::new(fetcher),
            bus: LocalBus::new(Orchestrator::from_env(http)),
        })
    }

    #[tool(description = "Report gistpipe configuration + version (no secrets)")]
    async fn gistpipe_meta(&self) -> Result<CallToolResult, McpError> {
        let t0 = std::time::Instant::now();
        let remote = self.bus.orchestrator().backend_name().is_some();
        let languages: Vec<serde_json::Value> = LANGUAGES
            .iter()
            .map(|(code, name)| serde_json::json!({ "code": code, "name": name }))
            .collect();
        let mut payload = serde_json::json!({
            "ok": true,
            "name": "gistpipe",
            "version": env!("CARGO_PKG_VERSION"),
            "configured": {
                "remote_api": remote,
                "summary_mode": if remote { "remote" } else { "demo" },
            },
            "languages": languages,
            "lengths": ["short", "medium", "long"],
            "limits": {
                "max_page_chars": gistpipe_local::extract::MAX_PAGE_CHARS,
                "min_page_chars": gistpipe_local::page::MIN_PAGE_CHARS,
                "min_selection_chars": gistpipe_local::summarize::MIN_SELECTION_CHARS + 1,
            },
        });
        add_envelope_fields(&mut payload, "gistpipe_meta", t0.elapsed().as_millis());
        Ok(tool_result(payload))
    }

    #[tool(description = "Extractive summary of text (local; no network)")]
    async fn summarize_text(
        &self,
        params: Parameters<Option<SummarizeTextArgs>>,
    ) -> Result<CallToolResult, McpError> {
        let args = params.0.unwrap_or_default();
        let options = options_from(
            args.length.as_deref(),
            args.language.as_deref(),
            args.is_video.unwrap_or(false),
        );
        let text = args.text.unwrap_or_default();
        Ok(tool_result(ops::summarize_text_payload(&text, &options)))
    }

    #[tool(description = "Extract a webpage or YouTube watch page (URL or raw HTML) and summarize it")]
    async fn summarize_page(
        &self,
        params: Parameters<Option<SummarizePageArgs>>,
    ) -> Result<CallToolResult, McpError> {
        const KIND: &str = "summarize_page";
        let args = params.0.unwrap_or_default();
        let options = options_from(args.length.as_deref(), args.language.as_deref(), false);
        let url = args.url.filter(|s| !s.trim().is_empty());
        let html = args.html.filter(|s| !s.trim().is_empty());

        let forced = match args.kind.as_deref().map(|s| s.trim().to_ascii_lowercase()) {
            None => None,
            Some(k) if k == "webpage" || k == "page" => Some(PageKind::Webpage),
            Some(k) if k == "video" => Some(PageKind::Video),
            Some(k) => {
                return Ok(invalid_params(
                    KIND,
                    &format!("unknown kind: {k}"),
                    "Allowed kinds: webpage, video",
                    serde_json::json!({ "kind": k }),
                ));
            }
        };

        let (page, source): (Arc<dyn PageContentProvider>, serde_json::Value) = match (url, html) {
            (Some(url), None) => {
                let mut req = FetchRequest::new(url.clone());
                req.timeout_ms = Some(args.timeout_ms.unwrap_or(20_000));
                req.max_bytes = Some(
                    args.max_bytes
                        .unwrap_or(gistpipe_local::DEFAULT_MAX_PAGE_BYTES),
                );
                req.accept_language = args.accept_language.clone();
                let source = serde_json::json!({
                    "url": url,
                    "accept_language": args.accept_language,
                });
                let page: Arc<dyn PageContentProvider> =
                    Arc::new(FetchedPage::new(self.fetcher.clone(), req));
                (page, source)
            }
            (None, Some(html)) => {
                let mut page = HtmlPage::new(html);
                if let Some(u) = args.page_url {
                    page = page.with_url(u);
                }
                if let Some(k) = forced {
                    page = page.with_kind(k);
                }
                let page: Arc<dyn PageContentProvider> = Arc::new(page);
                (page, serde_json::json!({ "html": true }))
            }
            (Some(_), Some(_)) => {
                return Ok(invalid_params(
                    KIND,
                    "pass either url or html, not both",
                    "Use url to fetch a live page, or html for a page you already have.",
                    serde_json::Value::Null,
                ));
            }
            (None, None) => {
                return Ok(invalid_params(
                    KIND,
                    "url or html is required",
                    "Pass an absolute URL like https://example.com/article, or the page HTML.",
                    serde_json::Value::Null,
                ));
            }
        };
        let bus = self.bus.clone().with_page(page);
        Ok(tool_result(
            ops::summarize_page_payload(&bus, &options, source).await,
        ))
    }

    #[tool(description = "Quick summary of a text selection (first two sentences)")]
    async fn summarize_selection(
        &self,
        params: Parameters<Option<SummarizeSelectionArgs>>,
    ) -> Result<CallToolResult, McpError> {
        let args = params.0.unwrap_or_default();
        let text = args.selected_text.unwrap_or_default();
        Ok(tool_result(
            ops::summarize_selection_payload(&self.bus, &text).await,
        ))
    }

    #[tool(
        description = "Summarize via the configured remote API (GISTPIPE_API_BASE_URL); falls back to a [DEMO] summary"
    )]
    async fn summarize_remote(
        &self,
        params: Parameters<Option<SummarizeRemoteArgs>>,
    ) -> Result<CallToolResult, McpError> {
        let args = params.0.unwrap_or_default();
        let text = args.text.unwrap_or_default();
        let language = args.language.unwrap_or_else(|| "en".to_string());
        Ok(tool_result(
            ops::summarize_remote_payload(&self.bus, &text, &language).await,
        ))
    }
}

#[tool_handler]
impl rmcp::ServerHandler for GistpipeMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Extractive summaries of pages, selections and text. Outputs are JSON and schema-versioned."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub(crate) async fn serve_stdio() -> Result<(), McpError> {
    let svc = GistpipeMcp::new()?;
    let running = svc
        .serve(stdio())
        .await
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    // Keep the stdio server alive until the client closes.
    running
        .waiting()
        .await
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(())
}
