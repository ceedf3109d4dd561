//! Sentence scoring: a length-fitness term plus a keyword-frequency term.
//!
//! Scores are only meaningful relative to other sentences of the same document.

use crate::textprep::lower_words;
use std::collections::HashMap;

/// Sentence length (in words) with the best length fitness.
pub const IDEAL_SENTENCE_WORDS: usize = 15;

/// Words with at most this many characters never count as keywords.
pub const MAX_IGNORED_WORD_CHARS: usize = 4;

/// `max(0, 1 - |words - 15| / 15)`: 1 at 15 words, 0 at 0 and at 30+ words.
pub fn length_fitness(word_count: usize) -> f64 {
    let ideal = IDEAL_SENTENCE_WORDS as f64;
    let dist = (word_count as f64 - ideal).abs();
    (1.0 - dist / ideal).max(0.0)
}

/// Word frequencies of a whole document (lowercased, whitespace-tokenized).
#[derive(Debug, Clone, Default)]
pub struct DocumentStats {
    counts: HashMap<String, usize>,
    total: usize,
}

impl DocumentStats {
    pub fn from_text(document: &str) -> Self {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut total = 0usize;
        for w in lower_words(document) {
            *counts.entry(w).or_insert(0) += 1;
            total += 1;
        }
        Self { counts, total }
    }

    pub fn total_words(&self) -> usize {
        self.total
    }

    pub fn occurrences(&self, word: &str) -> usize {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// Share of the document taken by `word`, in percent.
    fn frequency_pct(&self, word: &str) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.occurrences(word) as f64 / self.total as f64 * 100.0
    }

    /// Sum of document frequencies over the sentence's long words.
    ///
    /// A word repeated inside the sentence is counted once per occurrence.
    pub fn keyword_score(&self, sentence: &str) -> f64 {
        lower_words(sentence)
            .filter(|w| w.chars().count() > MAX_IGNORED_WORD_CHARS)
            .map(|w| self.frequency_pct(&w))
            .sum()
    }

    pub fn score(&self, sentence: &str) -> f64 {
        let words = sentence.split_whitespace().count();
        length_fitness(words) + self.keyword_score(sentence)
    }
}

/// Score one sentence against its full document.
///
/// Callers scoring many sentences of the same document should build a
/// [`DocumentStats`] once and call [`DocumentStats::score`] instead.
pub fn score_sentence(sentence: &str, document: &str) -> f64 {
    DocumentStats::from_text(document).score(sentence)
}
