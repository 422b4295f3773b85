//! Text utilities for the domain layer.

use std::collections::BTreeSet;

/// At most `max_len` bytes of `s`, ending in `...` when cut short
///
/// Cuts fall back to the previous char boundary.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut cut = max_len.saturating_sub(3);
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &s[..cut])
}

/// Lower-cased alphanumeric words of `text` (underscores count as word characters).
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Distinct lower-cased words of `text`.
pub fn word_set(text: &str) -> BTreeSet<String> {
    words(text).into_iter().collect()
}

/// Split text into trimmed, non-empty sentences on `.`, `!` and `?`.
pub fn sentences(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 64-bit FNV-1a hash. Stable across builds and platforms, unlike `DefaultHasher`.
pub fn stable_hash(input: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    input.bytes().fold(OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("quorum", 10), "quorum");
        assert_eq!(truncate("expertise weighted", 9), "expert...");
    }

    #[test]
    fn test_truncate_multibyte_boundary() {
        let s = "あのね";
        assert_eq!(truncate(s, 7), "あ...");
    }

    #[test]
    fn test_words_lowercases_and_splits() {
        assert_eq!(
            words("Use PostgreSQL, not my_sql!"),
            vec!["use", "postgresql", "not", "my_sql"]
        );
    }

    #[test]
    fn test_sentences_drop_empty_fragments() {
        let parts = sentences("We should cache. Really?! Yes.");
        assert_eq!(parts, vec!["We should cache", "Really", "Yes"]);
    }

    #[test]
    fn test_stable_hash_is_deterministic() {
        assert_eq!(stable_hash("task"), stable_hash("task"));
        assert_ne!(stable_hash("task-a"), stable_hash("task-b"));
        assert_eq!(stable_hash(""), 0xcbf2_9ce4_8422_2325);
    }
}
