//! Payload builders shared by the CLI subcommands and the MCP tools.
//!
//! Every builder returns a complete JSON envelope; failures are `ok=false` payloads,
//! never `Err`, so both surfaces can print them as-is.

use crate::envelope::{add_envelope_fields, error_from, error_obj, ErrorCode};
use gistpipe_core::{Error, Message, MessageBus, Reply, SummaryOptions};
use gistpipe_local::bus::LocalBus;
use gistpipe_local::summarize::{summarize, MIN_SELECTION_CHARS};

fn failed(kind: &str, t0: std::time::Instant, e: &Error, request: serde_json::Value) -> serde_json::Value {
    tracing::debug!(kind, error = %e, "request failed");
    let mut payload = serde_json::json!({
        "ok": false,
        "error": error_from(e),
        "request": request,
    });
    add_envelope_fields(&mut payload, kind, t0.elapsed().as_millis());
    payload
}

fn unexpected(reply: &Reply) -> Error {
    Error::Extraction(format!("unexpected reply from message bus: {reply:?}"))
}

fn options_json(options: &SummaryOptions) -> serde_json::Value {
    serde_json::json!({
        "length": options.length,
        "language": options.language,
        "is_video": options.is_video,
    })
}

fn merge(payload: &mut serde_json::Value, value: serde_json::Value) {
    if let (Some(dst), serde_json::Value::Object(src)) = (payload.as_object_mut(), value) {
        dst.extend(src);
    }
}

/// Extractive summary of free text.
pub(crate) fn summarize_text_payload(text: &str, options: &SummaryOptions) -> serde_json::Value {
    const KIND: &str = "summarize_text";
    let t0 = std::time::Instant::now();
    let request = options_json(options);
    if text.trim().is_empty() {
        let mut payload = serde_json::json!({
            "ok": false,
            "error": error_obj(
                ErrorCode::InvalidParams,
                "text must be non-empty",
                "Pass text as an argument, with --file, or on stdin."
            ),
            "request": request,
        });
        add_envelope_fields(&mut payload, KIND, t0.elapsed().as_millis());
        return payload;
    }
    match summarize(text, options) {
        Ok(summary) => {
            let mut payload = serde_json::json!({ "ok": true, "request": request });
            merge(&mut payload, serde_json::to_value(&summary).unwrap_or_default());
            add_envelope_fields(&mut payload, KIND, t0.elapsed().as_millis());
            payload
        }
        Err(e) => failed(KIND, t0, &e, request),
    }
}

/// Extract the bus's page and summarize it.
pub(crate) async fn summarize_page_payload(
    bus: &LocalBus,
    options: &SummaryOptions,
    source: serde_json::Value,
) -> serde_json::Value {
    const KIND: &str = "summarize_page";
    let t0 = std::time::Instant::now();
    let mut request = options_json(options);
    request["source"] = source;
    let msg = Message::SummarizePage {
        options: options.clone(),
    };
    match bus.request(msg).await {
        Ok(Reply::Summary(page)) => {
            let mut payload = serde_json::json!({
                "ok": true,
                "url": page.url,
                "title": page.title,
                "page_kind": page.kind,
                "video": page.video,
                "request": request,
            });
            merge(&mut payload, serde_json::to_value(&page.summary).unwrap_or_default());
            add_envelope_fields(&mut payload, KIND, t0.elapsed().as_millis());
            payload
        }
        Ok(other) => failed(KIND, t0, &unexpected(&other), request),
        Err(e) => failed(KIND, t0, &e, request),
    }
}

/// Quick summary of a selection. Short selections are `ok=true, ignored=true`.
pub(crate) async fn summarize_selection_payload(bus: &LocalBus, selected_text: &str) -> serde_json::Value {
    const KIND: &str = "summarize_selection";
    let t0 = std::time::Instant::now();
    let request = serde_json::json!({
        "chars": selected_text.chars().count(),
        "min_chars": MIN_SELECTION_CHARS + 1,
    });
    let msg = Message::SummarizeSelection {
        selected_text: selected_text.to_string(),
    };
    let summary = match bus.request(msg).await {
        Ok(Reply::Quick(s)) => Some(s),
        Ok(Reply::Ignored) => None,
        Ok(other) => return failed(KIND, t0, &unexpected(&other), request),
        Err(e) => return failed(KIND, t0, &e, request),
    };
    let mut payload = serde_json::json!({
        "ok": true,
        "ignored": summary.is_none(),
        "text": summary,
        "request": request,
    });
    add_envelope_fields(&mut payload, KIND, t0.elapsed().as_millis());
    payload
}

/// Remote summary with the demo fallback.
pub(crate) async fn summarize_remote_payload(
    bus: &LocalBus,
    text: &str,
    language: &str,
) -> serde_json::Value {
    const KIND: &str = "summarize_remote";
    let t0 = std::time::Instant::now();
    let request = serde_json::json!({
        "language": language,
        "backend": bus.orchestrator().backend_name(),
    });
    let msg = Message::SummarizeText {
        text: text.to_string(),
        language: language.to_string(),
    };
    match bus.request(msg).await {
        Ok(Reply::Outcome(outcome)) => {
            let mut payload = serde_json::json!({ "ok": true, "request": request });
            merge(&mut payload, serde_json::to_value(&outcome).unwrap_or_default());
            add_envelope_fields(&mut payload, KIND, t0.elapsed().as_millis());
            payload
        }
        Ok(other) => failed(KIND, t0, &unexpected(&other), request),
        Err(e) => failed(KIND, t0, &e, request),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gistpipe_core::{PageKind, SummaryLength};
    use gistpipe_local::orchestrate::Orchestrator;
    use gistpipe_local::page::HtmlPage;
    use std::sync::Arc;

    fn offline_bus() -> LocalBus {
        LocalBus::new(Orchestrator::offline())
    }

    const TEXT: &str = "Solar panels convert sunlight directly into electricity using semiconductors. \
        Modern solar panels reach efficiencies above twenty percent in full sunlight. \
        Cloudy weather reduces the output of solar panels but rarely stops it.";

    #[test]
    fn text_payload_is_enveloped() {
        let opts = SummaryOptions {
            length: SummaryLength::Short,
            ..SummaryOptions::default()
        };
        let v = summarize_text_payload(TEXT, &opts);
        assert_eq!(v["ok"], true);
        assert_eq!(v["kind"], "summarize_text");
        assert_eq!(v["schema_version"], 1);
        assert_eq!(v["sentence_count"], 3);
        assert_eq!(v["selected"].as_array().map(Vec::len), Some(2));
        assert_eq!(v["request"]["length"], "short");
        assert!(v["text"].as_str().unwrap_or("").ends_with('.'));
    }

    #[test]
    fn text_payload_reports_insufficient_content() {
        let v = summarize_text_payload("Too short. Nope.", &SummaryOptions::default());
        assert_eq!(v["ok"], false);
        assert_eq!(v["error"]["code"], "insufficient_content");

        let v = summarize_text_payload("   ", &SummaryOptions::default());
        assert_eq!(v["error"]["code"], "invalid_params");
    }

    #[tokio::test]
    async fn selection_payload_marks_short_selections_ignored() {
        let v = summarize_selection_payload(&offline_bus(), "tiny").await;
        assert_eq!(v["ok"], true);
        assert_eq!(v["ignored"], true);
        assert!(v["text"].is_null());

        let v = summarize_selection_payload(&offline_bus(), TEXT).await;
        assert_eq!(v["ignored"], false);
        assert_eq!(
            v["text"],
            "Solar panels convert sunlight directly into electricity using semiconductors. \
             Modern solar panels reach efficiencies above twenty percent in full sunlight."
        );
    }

    #[tokio::test]
    async fn page_payload_carries_page_fields() {
        let html = format!("<html><head><title>Solar</title></head><body><article><p>{TEXT}</p></article></body></html>");
        let page = HtmlPage::new(html).with_url("https://example.com/solar");
        let bus = offline_bus().with_page(Arc::new(page));
        let v = summarize_page_payload(&bus, &SummaryOptions::default(), serde_json::json!({"html_file": "x"})).await;
        assert_eq!(v["ok"], true, "{v}");
        assert_eq!(v["title"], "Solar");
        assert_eq!(v["page_kind"], "webpage");
        assert!(v["video"].is_null());
        assert_eq!(v["request"]["source"]["html_file"], "x");
    }

    #[tokio::test]
    async fn video_page_payload_carries_watch_page_metadata() {
        let html = format!(
            r#"<html><body>
              <h1 class="title ytd-video-primary-info-renderer">Solar power basics</h1>
              <div id="owner-name"><a href="/c/sun">Sun Channel</a></div>
              <div id="description-text">{TEXT}</div>
            </body></html>"#
        );
        let page = HtmlPage::new(html).with_kind(PageKind::Video);
        let bus = offline_bus().with_page(Arc::new(page));
        let v = summarize_page_payload(&bus, &SummaryOptions::default(), serde_json::json!({"html": true})).await;
        assert_eq!(v["ok"], true, "{v}");
        assert_eq!(v["page_kind"], "video");
        assert_eq!(v["video"]["title"], "Solar power basics");
        assert_eq!(v["video"]["channel"], "Sun Channel");
    }

    #[tokio::test]
    async fn page_payload_without_a_page_is_invalid_params() {
        let v = summarize_page_payload(&offline_bus(), &SummaryOptions::default(), serde_json::Value::Null).await;
        assert_eq!(v["ok"], false);
        assert_eq!(v["error"]["code"], "invalid_params");
    }

    #[tokio::test]
    async fn remote_payload_falls_back_offline() {
        let v = summarize_remote_payload(&offline_bus(), "a b c", "en").await;
        assert_eq!(v["ok"], true);
        assert_eq!(v["origin"], "demo");
        assert_eq!(v["summary"], "[DEMO] a b c...");
        assert!(v["request"]["backend"].is_null());

        let v = summarize_remote_payload(&offline_bus(), "", "en").await;
        assert_eq!(v["ok"], false);
        assert_eq!(v["error"]["code"], "invalid_params");
    }
}
