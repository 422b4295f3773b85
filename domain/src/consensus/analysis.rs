//! Lightweight text analysis for opinions and explanations

use crate::core::text::{sentences, words};
use serde::{Deserialize, Serialize};

const KEY_POINT_MARKERS: [&str; 8] = [
    "should",
    "must",
    "recommend",
    "suggest",
    "important",
    "critical",
    "key",
    "essential",
];

/// Sentences that carry a recommendation
///
/// Falls back to every sentence when none contains a marker word.
pub fn key_points(text: &str) -> Vec<String> {
    let all = sentences(text);
    let marked = concerns(text);
    if marked.is_empty() { all } else { marked }
}

/// Sentences that carry a recommendation, with no fallback
pub fn concerns(text: &str) -> Vec<String> {
    sentences(text)
        .into_iter()
        .filter(|s| {
            let lower = s.to_lowercase();
            KEY_POINT_MARKERS.iter().any(|m| lower.contains(m))
        })
        .collect()
}

/// Rough topic of a sentence
///
/// The word after the first "the", else the word after "should"/"must",
/// else the first three words.
pub fn extract_topic(text: &str) -> String {
    let tokens = words(text);
    for marker in ["the", "should", "must"] {
        if let Some(pos) = tokens.iter().position(|w| w == marker)
            && let Some(next) = tokens.get(pos + 1)
        {
            return next.clone();
        }
    }
    tokens.into_iter().take(3).collect::<Vec<_>>().join(" ")
}

/// Flesch readability metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Readability {
    pub flesch_reading_ease: f64,
    pub flesch_kincaid_grade: f64,
    pub syllables_per_word: f64,
    pub words_per_sentence: f64,
}

impl Readability {
    pub fn of(text: &str) -> Self {
        let sentence_count = sentences(text).len();
        let tokens = words(text);
        if sentence_count == 0 || tokens.is_empty() {
            return Self::default();
        }

        let syllables: usize = tokens.iter().map(|w| count_syllables(w)).sum();
        let words_per_sentence = tokens.len() as f64 / sentence_count as f64;
        let syllables_per_word = syllables as f64 / tokens.len() as f64;

        Self {
            flesch_reading_ease: 206.835
                - 1.015 * words_per_sentence
                - 84.6 * syllables_per_word,
            flesch_kincaid_grade: 0.39 * words_per_sentence + 11.8 * syllables_per_word - 15.59,
            syllables_per_word,
            words_per_sentence,
        }
    }
}

/// Vowel-group syllable estimate, at least one per word
pub fn count_syllables(word: &str) -> usize {
    let lower = word.to_lowercase();
    let trimmed = lower.strip_suffix('e').unwrap_or(&lower);

    let mut count = 0;
    let mut in_group = false;
    for c in trimmed.chars() {
        if "aeiouy".contains(c) {
            if !in_group {
                count += 1;
                in_group = true;
            }
        } else {
            in_group = false;
        }
    }
    count.max(1)
}
