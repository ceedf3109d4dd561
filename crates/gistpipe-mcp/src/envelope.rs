use gistpipe_core::Error;
use serde::Serialize;

pub(crate) const SCHEMA_VERSION: u64 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InsufficientContent,
    ExtractionFailed,
    TransportFailed,
    InvalidUrl,
    InvalidParams,
    NotConfigured,
}

impl ErrorCode {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::InsufficientContent => "insufficient_content",
            Self::ExtractionFailed => "extraction_failed",
            Self::TransportFailed => "transport_failed",
            Self::InvalidUrl => "invalid_url",
            Self::InvalidParams => "invalid_params",
            Self::NotConfigured => "not_configured",
        }
    }

    pub(crate) fn retryable(self) -> bool {
        match self {
            Self::ExtractionFailed | Self::TransportFailed => true,
            // Bad input or config is not retryable without changing something.
            Self::InsufficientContent
            | Self::InvalidUrl
            | Self::InvalidParams
            | Self::NotConfigured => false,
        }
    }

    pub(crate) fn default_hint(self) -> &'static str {
        match self {
            Self::InsufficientContent => {
                "Wait for the page to finish loading, or pass text with more complete sentences."
            }
            Self::ExtractionFailed => {
                "The page could not be fetched or parsed. Check the URL, or save the page and pass --html-file."
            }
            Self::TransportFailed => {
                "The summarize API did not answer. Check GISTPIPE_API_BASE_URL and that the server is running."
            }
            Self::InvalidUrl => "Pass an absolute http(s) URL like https://example.com/article.",
            Self::InvalidParams => "Check the arguments (non-empty text, supported language tag).",
            Self::NotConfigured => "Set GISTPIPE_API_BASE_URL to enable remote summaries.",
        }
    }
}

impl From<&Error> for ErrorCode {
    fn from(e: &Error) -> Self {
        match e {
            Error::InsufficientContent(_) => Self::InsufficientContent,
            Error::Extraction(_) => Self::ExtractionFailed,
            Error::Transport(_) => Self::TransportFailed,
            Error::InvalidUrl(_) => Self::InvalidUrl,
            Error::InvalidInput(_) => Self::InvalidParams,
            Error::NotConfigured(_) => Self::NotConfigured,
        }
    }
}

pub(crate) fn add_envelope_fields(payload: &mut serde_json::Value, kind: &str, elapsed_ms: u128) {
    payload["schema_version"] = serde_json::json!(SCHEMA_VERSION);
    payload["kind"] = serde_json::json!(kind);
    payload["elapsed_ms"] = serde_json::json!(elapsed_ms);
    // Keep `request` present so clients don't branch on missing vs null.
    if payload.get("request").is_none() {
        payload["request"] = serde_json::Value::Null;
    }
}

pub(crate) fn error_obj(
    code: ErrorCode,
    message: impl ToString,
    hint: impl ToString,
) -> serde_json::Value {
    #[derive(Serialize)]
    struct ErrorObject {
        code: &'static str,
        message: String,
        hint: String,
        retryable: bool,
    }

    let e = ErrorObject {
        code: code.as_str(),
        message: message.to_string(),
        hint: hint.to_string(),
        retryable: code.retryable(),
    };
    match serde_json::to_value(e) {
        Ok(v) => v,
        Err(_) => serde_json::json!({
            "code": code.as_str(),
            "message": message.to_string(),
            "hint": hint.to_string(),
            "retryable": code.retryable()
        }),
    }
}

/// Error object for a library error, with the code's default hint.
pub(crate) fn error_from(e: &Error) -> serde_json::Value {
    let code = ErrorCode::from(e);
    error_obj(code, e, code.default_hint())
}
