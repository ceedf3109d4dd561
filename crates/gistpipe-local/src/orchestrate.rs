//! Remote-first summarization with a local demo fallback.

use crate::remote::RemoteSummarizer;
use gistpipe_core::{
    is_supported_language, Error, RemoteRequest, Result, SummarizeBackend, SummaryOrigin,
    SummaryOutcome, DEMO_TAG,
};
use std::sync::Arc;

pub const EMPTY_TEXT_MESSAGE: &str = "Please enter some text to summarize.";

/// Shown alongside every fallback summary.
pub const DEMO_NOTICE: &str = "API is not available in demo mode. Here's a simulated summary:";

/// Share of the input words kept by the demo summary.
pub const DEMO_WORD_RATIO: f64 = 0.3;

/// The demo summary never keeps fewer words than this (unless the input has fewer).
pub const DEMO_MIN_WORDS: usize = 10;

/// Word-truncation summary used when the remote endpoint is unavailable.
pub fn demo_summary(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let keep = ((words.len() as f64 * DEMO_WORD_RATIO).floor() as usize).max(DEMO_MIN_WORDS);
    let head = words.iter().take(keep).copied().collect::<Vec<_>>().join(" ");
    format!("{DEMO_TAG} {head}...")
}

#[derive(Clone, Default)]
pub struct Orchestrator {
    backend: Option<Arc<dyn SummarizeBackend>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("backend", &self.backend.as_ref().map(|b| b.name()))
            .finish()
    }
}

impl Orchestrator {
    /// An orchestrator that always falls back to the demo summary.
    pub fn offline() -> Self {
        Self { backend: None }
    }

    pub fn with_backend(backend: Arc<dyn SummarizeBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Uses [`RemoteSummarizer::from_env`] when `GISTPIPE_API_BASE_URL` is set.
    pub fn from_env(client: reqwest::Client) -> Self {
        match RemoteSummarizer::from_env(client) {
            Ok(remote) => Self::with_backend(Arc::new(remote)),
            Err(e) => {
                tracing::debug!(error = %e, "remote summarizer not configured");
                Self::offline()
            }
        }
    }

    pub fn backend_name(&self) -> Option<&'static str> {
        self.backend.as_ref().map(|b| b.name())
    }

    /// Summarize free text, remote first.
    ///
    /// Input errors are returned; every remote failure is recovered with [`demo_summary`].
    pub async fn summarize(&self, text: &str, language: &str) -> Result<SummaryOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput(EMPTY_TEXT_MESSAGE.to_string()));
        }
        let language = language.trim();
        if !is_supported_language(language) {
            return Err(Error::InvalidInput(format!(
                "unsupported language: {language:?}"
            )));
        }

        if let Some(backend) = &self.backend {
            let req = RemoteRequest {
                text: text.to_string(),
                lang: language.to_ascii_lowercase(),
            };
            match backend.summarize(&req).await {
                Ok(summary) => {
                    tracing::debug!(backend = backend.name(), "remote summary received");
                    return Ok(SummaryOutcome {
                        summary,
                        origin: SummaryOrigin::Remote,
                        notice: None,
                    });
                }
                Err(e) => {
                    tracing::warn!(backend = backend.name(), error = %e, "remote summarize failed; using demo summary");
                }
            }
        }

        Ok(SummaryOutcome {
            summary: demo_summary(text),
            origin: SummaryOrigin::Demo,
            notice: Some(DEMO_NOTICE.to_string()),
        })
    }
}
