use gistpipe_core::{Error, FetchBackend, FetchRequest, FetchResponse, Result};
use std::time::Duration;

pub mod bus;
pub mod extract;
pub mod orchestrate;
pub mod page;
pub mod remote;
pub mod score;
pub mod segment;
pub mod summarize;
pub mod textprep;
pub mod youtube;

/// Default cap on bytes read from a fetched page.
pub const DEFAULT_MAX_PAGE_BYTES: u64 = 5_000_000;

pub(crate) fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Shared HTTP client with connect/request timeouts so nothing hangs forever.
///
/// Per-request timeouts can still override the request timeout.
pub fn http_client(user_agent: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::limited(10))
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| Error::Transport(e.to_string()))
}

/// Fetches pages over HTTP(S) with a bounded body.
#[derive(Debug, Clone)]
pub struct LocalFetcher {
    client: reqwest::Client,
}

impl LocalFetcher {
    pub fn new() -> Result<Self> {
        let client = http_client("gistpipe-local/0.1").map_err(|e| Error::Extraction(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl FetchBackend for LocalFetcher {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse> {
        let url = url::Url::parse(&req.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }

        let mut rb = self.client.get(url);
        if let Some(to) = req.timeout() {
            rb = rb.timeout(to);
        }
        if let Some(lang) = req
            .accept_language
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let v = reqwest::header::HeaderValue::from_str(lang).map_err(|_| {
                Error::InvalidInput(format!("invalid accept-language value: {lang:?}"))
            })?;
            rb = rb.header(reqwest::header::ACCEPT_LANGUAGE, v);
        }
        let resp = rb
            .send()
            .await
            .map_err(|e| Error::Extraction(e.to_string()))?;
        let final_url = resp.url().to_string();
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let max_bytes = req.max_bytes.unwrap_or(DEFAULT_MAX_PAGE_BYTES) as usize;
        let mut truncated = false;
        let mut bytes = Vec::new();
        let mut stream = resp.bytes_stream();
        use futures_util::StreamExt;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Extraction(e.to_string()))?;
            if bytes.len().saturating_add(chunk.len()) > max_bytes {
                let can_take = max_bytes.saturating_sub(bytes.len());
                bytes.extend_from_slice(&chunk[..can_take]);
                truncated = true;
                break;
            }
            bytes.extend_from_slice(&chunk);
        }

        tracing::debug!(
            url = %req.url,
            status,
            bytes = bytes.len(),
            truncated,
            "page fetched"
        );
        Ok(FetchResponse {
            url: req.url.clone(),
            final_url,
            status,
            content_type,
            bytes,
            truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::header, http::StatusCode, routing::get, Router};
    use std::net::SocketAddr;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn local_fetcher_reads_body_and_content_type() {
        let app = Router::new().route(
            "/",
            get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<html>hi</html>") }),
        );
        let addr = serve(app).await;

        let fetcher = LocalFetcher::new().unwrap();
        let mut req = FetchRequest::new(format!("http://{addr}/"));
        req.timeout_ms = Some(2_000);
        let resp = fetcher.fetch(&req).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type.as_deref(), Some("text/html"));
        assert_eq!(resp.bytes, b"<html>hi</html>");
        assert!(!resp.truncated);
    }

    #[tokio::test]
    async fn local_fetcher_truncates_at_max_bytes() {
        let app = Router::new().route("/", get(|| async { "x".repeat(10_000) }));
        let addr = serve(app).await;

        let fetcher = LocalFetcher::new().unwrap();
        let mut req = FetchRequest::new(format!("http://{addr}/"));
        req.max_bytes = Some(100);
        let resp = fetcher.fetch(&req).await.unwrap();
        assert!(resp.truncated);
        assert_eq!(resp.bytes.len(), 100);
    }

    #[tokio::test]
    async fn local_fetcher_rejects_non_http_schemes() {
        let fetcher = LocalFetcher::new().unwrap();
        let err = fetcher
            .fetch(&FetchRequest::new("file:///etc/passwd"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn local_fetcher_sends_accept_language() {
        let app = Router::new().route(
            "/",
            get(|headers: axum::http::HeaderMap| async move {
                let lang = headers
                    .get(header::ACCEPT_LANGUAGE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("none")
                    .to_string();
                (StatusCode::OK, format!("accept-language={lang}"))
            }),
        );
        let addr = serve(app).await;
        let fetcher = LocalFetcher::new().unwrap();

        let mut req = FetchRequest::new(format!("http://{addr}/"));
        req.accept_language = Some("fr".to_string());
        let resp = fetcher.fetch(&req).await.unwrap();
        assert_eq!(resp.bytes, b"accept-language=fr");

        let resp = fetcher
            .fetch(&FetchRequest::new(format!("http://{addr}/")))
            .await
            .unwrap();
        assert_eq!(resp.bytes, b"accept-language=none");

        let mut req = FetchRequest::new(format!("http://{addr}/"));
        req.accept_language = Some("fr\nX-Evil: 1".to_string());
        let err = fetcher.fetch(&req).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
