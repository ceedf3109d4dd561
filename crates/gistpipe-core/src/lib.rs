use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Literal prefix for summaries of video pages.
pub const VIDEO_PREFIX: &str = "This YouTube video discusses: ";

/// Tag prepended to fallback (non-extractive) summaries.
pub const DEMO_TAG: &str = "[DEMO]";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    InsufficientContent(String),
    #[error("extraction failed: {0}")]
    Extraction(String),
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl SummaryLength {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }

    /// Unrecognized values fall back to `Medium`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Self::Short,
            "long" => Self::Long,
            _ => Self::Medium,
        }
    }
}

impl std::fmt::Display for SummaryLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryOptions {
    #[serde(default)]
    pub length: SummaryLength,
    /// Language tag, see [`LANGUAGES`].
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub is_video: bool,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            length: SummaryLength::default(),
            language: default_language(),
            is_video: false,
        }
    }
}

/// Supported language tags and their display names.
pub const LANGUAGES: [(&str, &str); 10] = [
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
];

pub fn language_name(tag: &str) -> Option<&'static str> {
    let tag = tag.trim();
    LANGUAGES
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(tag))
        .map(|(_, name)| *name)
}

pub fn is_supported_language(tag: &str) -> bool {
    language_name(tag).is_some()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Webpage,
    Video,
}

/// Cleaned text extracted from a page, plus what we know about where it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContent {
    pub url: Option<String>,
    pub title: Option<String>,
    pub kind: PageKind,
    pub text: String,
    /// Watch-page details; only set for video pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoMetadata>,
}

/// Best-effort details scraped from a video watch page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: Option<String>,
    pub channel: Option<String>,
    pub views: Option<String>,
    pub upload_date: Option<String>,
    pub description: Option<String>,
}

impl PageContent {
    pub fn is_video(&self) -> bool {
        self.kind == PageKind::Video
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSentence {
    pub text: String,
    pub score: f64,
    /// Index in segmentation order.
    pub position: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub text: String,
    /// Selected sentences, highest score first.
    pub selected: Vec<ScoredSentence>,
    /// Number of sentences that survived segmentation.
    pub sentence_count: usize,
    pub word_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryOrigin {
    Remote,
    Demo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOutcome {
    pub summary: String,
    pub origin: SummaryOrigin,
    /// User-visible notice; set when the summary is a fallback.
    pub notice: Option<String>,
}

/// Wire body for `POST /api/summarize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRequest {
    pub text: String,
    pub lang: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteResponse {
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    /// Timeout for the operation (network + body read).
    pub timeout_ms: Option<u64>,
    /// Hard cap on bytes read from the response body.
    pub max_bytes: Option<u64>,
    /// Sent as `Accept-Language` so sites serve the page in the summary language.
    pub accept_language: Option<String>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: None,
            max_bytes: None,
            accept_language: None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub url: String,
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub truncated: bool,
}

#[async_trait::async_trait]
pub trait FetchBackend: Send + Sync {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse>;
}

/// Supplies the text of the page being summarized.
#[async_trait::async_trait]
pub trait PageContentProvider: Send + Sync {
    async fn page_content(&self) -> Result<PageContent>;
}

/// A remote summarization endpoint.
#[async_trait::async_trait]
pub trait SummarizeBackend: Send + Sync {
    fn name(&self) -> &'static str;
    async fn summarize(&self, req: &RemoteRequest) -> Result<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Message {
    SummarizePage {
        #[serde(default)]
        options: SummaryOptions,
    },
    SummarizeSelection {
        selected_text: String,
    },
    SummarizeText {
        text: String,
        #[serde(default = "default_language")]
        language: String,
    },
}

/// A page summary together with what is known about the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSummary {
    pub url: Option<String>,
    pub title: Option<String>,
    pub kind: PageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoMetadata>,
    pub summary: Summary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Reply {
    Summary(PageSummary),
    Quick(String),
    Outcome(SummaryOutcome),
    /// The message was valid but had nothing to act on.
    Ignored,
}

/// Request/reply channel between the UI surface and the summarizer.
#[async_trait::async_trait]
pub trait MessageBus: Send + Sync {
    async fn request(&self, msg: Message) -> Result<Reply>;
}
