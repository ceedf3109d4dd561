use crate::env;
use gistpipe_core::{Error, RemoteRequest, RemoteResponse, Result, SummarizeBackend};

/// Remote call timeout when `GISTPIPE_API_TIMEOUT_MS` is unset.
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

fn api_base_url_from_env() -> Option<String> {
    env("GISTPIPE_API_BASE_URL")
}

fn api_timeout_ms_from_env() -> Option<u64> {
    env("GISTPIPE_API_TIMEOUT_MS").and_then(|s| s.parse().ok())
}

/// Client for a `POST /api/summarize` endpoint.
#[derive(Debug, Clone)]
pub struct RemoteSummarizer {
    client: reqwest::Client,
    base_url: String,
    timeout_ms: u64,
}

impl RemoteSummarizer {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn from_env(client: reqwest::Client) -> Result<Self> {
        let base_url = api_base_url_from_env()
            .ok_or_else(|| Error::NotConfigured("missing GISTPIPE_API_BASE_URL".to_string()))?;
        let mut s = Self::new(client, base_url);
        if let Some(ms) = api_timeout_ms_from_env() {
            s.timeout_ms = ms;
        }
        Ok(s)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    fn endpoint_summarize(&self) -> String {
        format!("{}/api/summarize", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl SummarizeBackend for RemoteSummarizer {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn summarize(&self, req: &RemoteRequest) -> Result<String> {
        let resp = self
            .client
            .post(self.endpoint_summarize())
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(req)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("api/summarize HTTP {status}")));
        }

        let parsed: RemoteResponse = resp
            .json()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(parsed.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use std::net::SocketAddr;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn posts_text_and_lang_and_reads_summary() {
        let app = Router::new().route(
            "/api/summarize",
            post(|Json(req): Json<RemoteRequest>| async move {
                Json(serde_json::json!({
                    "summary": format!("{}:{}", req.lang, req.text.len())
                }))
            }),
        );
        let addr = serve(app).await;

        let remote = RemoteSummarizer::new(reqwest::Client::new(), format!("http://{addr}/"));
        let out = remote
            .summarize(&RemoteRequest {
                text: "hello".to_string(),
                lang: "fr".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(out, "fr:5");
    }

    #[tokio::test]
    async fn non_success_status_is_transport_error() {
        let app = Router::new().route(
            "/api/summarize",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let addr = serve(app).await;

        let remote = RemoteSummarizer::new(reqwest::Client::new(), format!("http://{addr}"));
        let err = remote
            .summarize(&RemoteRequest {
                text: "hello".to_string(),
                lang: "en".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn malformed_body_is_transport_error() {
        let app = Router::new().route("/api/summarize", post(|| async { "not json" }));
        let addr = serve(app).await;

        let remote = RemoteSummarizer::new(reqwest::Client::new(), format!("http://{addr}"))
            .with_timeout_ms(2_000);
        let err = remote
            .summarize(&RemoteRequest {
                text: "hello".to_string(),
                lang: "en".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let r = RemoteSummarizer::new(reqwest::Client::new(), "http://api.local/");
        assert_eq!(r.endpoint_summarize(), "http://api.local/api/summarize");
        assert_eq!(r.timeout_ms(), DEFAULT_TIMEOUT_MS);
    }
}
