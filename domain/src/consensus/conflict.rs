//! Conflict detection between agent positions

use crate::core::text::{word_set, words};
use serde::{Deserialize, Serialize};

/// Severity above which a conflict is labelled high
pub const HIGH_SEVERITY: f64 = 0.7;

const TOPIC_WORDS: [&str; 5] = ["approach", "method", "solution", "implementation", "design"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Agents favor different options
    OptionPreference,
    /// Free-text opinions contradict each other
    Opinion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub id: String,
    pub kind: ConflictKind,
    pub agents: Vec<String>,
    /// Options in dispute, for option conflicts
    pub options: Vec<String>,
    pub reason: String,
    pub severity: f64,
    /// `"high"` or `"medium"`
    pub severity_label: String,
}

impl Conflict {
    pub fn new(
        kind: ConflictKind,
        agents: Vec<String>,
        options: Vec<String>,
        reason: impl Into<String>,
        severity: f64,
    ) -> Self {
        let id = format!("conflict-{}", agents.join("-"));
        Self {
            id,
            kind,
            agents,
            options,
            reason: reason.into(),
            severity,
            severity_label: severity_label(severity).to_string(),
        }
    }

    pub fn is_high(&self) -> bool {
        self.severity > HIGH_SEVERITY
    }
}

pub fn severity_label(severity: f64) -> &'static str {
    if severity > HIGH_SEVERITY { "high" } else { "medium" }
}

/// Severity and reason when two free-text opinions conflict
///
/// Rules, first match wins:
/// - one says yes and the other no (0.9)
/// - one recommends "should", the other "should not" (0.8)
/// - both say "use X" with different X (0.6)
/// - both discuss a design topic but share under 30% of their words
///   (1 minus the overlap)
///
/// # Example
///
/// ```
/// use edrr_domain::consensus::text_conflict;
///
/// let (severity, _) = text_conflict("We should use redis", "We should use memcached").unwrap();
/// assert_eq!(severity, 0.6);
/// assert!(text_conflict("Cache the results", "Cache the results").is_none());
/// ```
pub fn text_conflict(a: &str, b: &str) -> Option<(f64, String)> {
    let (words_a, words_b) = (words(a), words(b));
    let has = |ws: &[String], w: &str| ws.iter().any(|x| x == w);

    if (has(&words_a, "yes") && has(&words_b, "no"))
        || (has(&words_a, "no") && has(&words_b, "yes"))
    {
        return Some((0.9, "direct contradiction".to_string()));
    }

    let (neg_a, neg_b) = (says_should_not(a), says_should_not(b));
    let (pos_a, pos_b) = (says_should(a), says_should(b));
    if (pos_a && neg_b && !neg_a) || (neg_a && pos_b && !neg_b) {
        return Some((0.8, "opposing recommendations".to_string()));
    }

    if let (Some(use_a), Some(use_b)) = (used_tool(&words_a), used_tool(&words_b))
        && use_a != use_b
    {
        return Some((0.6, format!("different approaches: {} vs {}", use_a, use_b)));
    }

    let (set_a, set_b) = (word_set(a), word_set(b));
    let larger = set_a.len().max(set_b.len());
    if larger == 0 {
        return None;
    }
    let overlap = set_a.intersection(&set_b).count() as f64 / larger as f64;
    let topic = TOPIC_WORDS
        .iter()
        .find(|t| set_a.contains(**t))
        .filter(|_| TOPIC_WORDS.iter().any(|t| set_b.contains(*t)));
    match topic {
        Some(topic) if overlap < 0.3 => {
            Some((1.0 - overlap, format!("divergent views on the {}", topic)))
        }
        _ => None,
    }
}

fn says_should_not(text: &str) -> bool {
    let tokens = words(text);
    tokens.windows(2).any(|w| w[0] == "should" && w[1] == "not")
        || tokens.iter().any(|w| w == "shouldn")
}

fn says_should(text: &str) -> bool {
    let tokens = words(text);
    tokens
        .iter()
        .enumerate()
        .any(|(i, w)| w == "should" && tokens.get(i + 1).is_none_or(|next| next != "not"))
}

fn used_tool(tokens: &[String]) -> Option<&str> {
    tokens
        .windows(2)
        .find(|w| w[0] == "use")
        .map(|w| w[1].as_str())
}
