//! Small, deterministic text helpers shared by extraction and summarization.

/// Collapse every whitespace run (spaces, tabs, newlines) into one space and trim.
pub fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn has_any_text(s: &str) -> bool {
    s.chars().any(|c| !c.is_whitespace())
}

/// Whitespace-delimited words, lowercased. Punctuation stays attached to the word.
pub fn lower_words(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split_whitespace().map(|w| w.to_lowercase())
}

pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Clip `s` to `max_chars` characters, appending `...` when something was cut.
///
/// Returns the (possibly clipped) text and whether clipping happened.
pub fn clip_with_ellipsis(s: &str, max_chars: usize) -> (String, bool) {
    match s.char_indices().nth(max_chars) {
        None => (s.to_string(), false),
        Some((byte, _)) => {
            let mut out = s[..byte].to_string();
            out.push_str("...");
            (out, true)
        }
    }
}
