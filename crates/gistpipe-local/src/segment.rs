//! Sentence segmentation on terminal punctuation.

/// Minimum sentence length (exclusive, in chars) for page and pasted-text summaries.
pub const PAGE_MIN_SENTENCE_CHARS: usize = 20;

/// Minimum sentence length (exclusive, in chars) for selection quick summaries.
pub const SELECTION_MIN_SENTENCE_CHARS: usize = 10;

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split `text` on runs of `.`, `!` or `?` and keep the trimmed pieces that are
/// strictly longer than `min_chars` characters.
///
/// Order is document order. Consecutive punctuation never yields empty sentences.
pub fn segment(text: &str, min_chars: usize) -> Vec<String> {
    text.split(is_terminal)
        .map(str::trim)
        .filter(|s| s.chars().count() > min_chars)
        .map(str::to_string)
        .collect()
}
