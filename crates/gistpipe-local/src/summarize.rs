//! Extractive summarization: segment, score, select by score, assemble.

use crate::score::DocumentStats;
use crate::segment::{segment, PAGE_MIN_SENTENCE_CHARS, SELECTION_MIN_SENTENCE_CHARS};
use crate::textprep::word_count;
use gistpipe_core::{
    Error, Result, ScoredSentence, Summary, SummaryLength, SummaryOptions, VIDEO_PREFIX,
};

pub const NO_SENTENCES_MESSAGE: &str = "No meaningful sentences found in the content";

/// Selections must be longer than this (in chars) to get a quick summary.
pub const MIN_SELECTION_CHARS: usize = 50;

/// Sentences kept by a selection quick summary.
pub const QUICK_SUMMARY_SENTENCES: usize = 2;

/// How many sentences a summary of `sentence_count` sentences keeps.
///
/// short: up to 2; medium: ceil(20%); long: ceil(40%); never more than available.
pub fn selection_count(length: SummaryLength, sentence_count: usize) -> usize {
    let n = sentence_count;
    let want = match length {
        SummaryLength::Short => 2,
        SummaryLength::Medium => n.div_ceil(5),
        SummaryLength::Long => (2 * n).div_ceil(5),
    };
    want.min(n)
}

/// Score every sentence against the document stats, keeping segmentation order.
pub fn score_all(sentences: Vec<String>, stats: &DocumentStats) -> Vec<ScoredSentence> {
    sentences
        .into_iter()
        .enumerate()
        .map(|(position, text)| {
            let score = stats.score(&text);
            ScoredSentence {
                text,
                score,
                position,
            }
        })
        .collect()
}

/// Keep the `n` best sentences, highest score first.
///
/// Equal scores keep segmentation order (the sort is stable).
pub fn select_top(mut scored: Vec<ScoredSentence>, n: usize) -> Vec<ScoredSentence> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(n);
    scored
}

/// Join sentences with `". "` and end with exactly one period.
pub fn assemble<'a>(sentences: impl IntoIterator<Item = &'a str>, is_video: bool) -> String {
    let body = sentences.into_iter().collect::<Vec<_>>().join(". ");
    if is_video {
        format!("{VIDEO_PREFIX}{body}.")
    } else {
        format!("{body}.")
    }
}

#[derive(Debug, Clone)]
pub struct ExtractiveSummarizer {
    min_sentence_chars: usize,
}

impl Default for ExtractiveSummarizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractiveSummarizer {
    pub fn new() -> Self {
        Self {
            min_sentence_chars: PAGE_MIN_SENTENCE_CHARS,
        }
    }

    pub fn with_min_sentence_chars(mut self, min_chars: usize) -> Self {
        self.min_sentence_chars = min_chars;
        self
    }

    pub fn summarize(&self, text: &str, options: &SummaryOptions) -> Result<Summary> {
        let sentences = segment(text, self.min_sentence_chars);
        if sentences.is_empty() {
            return Err(Error::InsufficientContent(NO_SENTENCES_MESSAGE.to_string()));
        }
        let sentence_count = sentences.len();
        let n = selection_count(options.length, sentence_count);

        let stats = DocumentStats::from_text(text);
        let selected = select_top(score_all(sentences, &stats), n);
        let text = assemble(selected.iter().map(|s| s.text.as_str()), options.is_video);
        tracing::debug!(
            sentence_count,
            selected = selected.len(),
            length = %options.length,
            "extractive summary assembled"
        );

        Ok(Summary {
            word_count: word_count(&text),
            text,
            selected,
            sentence_count,
        })
    }
}

/// Summarize `text` with the page/text sentence threshold.
pub fn summarize(text: &str, options: &SummaryOptions) -> Result<Summary> {
    ExtractiveSummarizer::new().summarize(text, options)
}

/// Quick summary of a user selection: its first two sentences, in order.
///
/// Returns `None` when the selection is too short or has no usable sentence.
pub fn quick_summary(selected_text: &str) -> Option<String> {
    if selected_text.chars().count() <= MIN_SELECTION_CHARS {
        return None;
    }
    let sentences = segment(selected_text, SELECTION_MIN_SENTENCE_CHARS);
    if sentences.is_empty() {
        return None;
    }
    Some(assemble(
        sentences
            .iter()
            .take(QUICK_SUMMARY_SENTENCES)
            .map(String::as_str),
        false,
    ))
}
