//! Result of one dialectical reasoning iteration

use crate::edrr::Phase;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceStatus {
    Completed,
    /// Any status other than `completed` keeps the loop going
    #[default]
    #[serde(other)]
    InProgress,
}

/// One thesis → antithesis → synthesis step
///
/// Phases are carried as free text so reasoners can emit any casing; use
/// [`effective_phase`](Self::effective_phase) and
/// [`next_phase_or_fallback`](Self::next_phase_or_fallback) to interpret them.
/// Fields the loop does not know about are kept in `extra`.
///
/// # Example
///
/// ```
/// use edrr_domain::{DialecticalSequence, Phase};
/// use serde_json::json;
///
/// let seq = DialecticalSequence::from_value(json!({
///     "status": "in_progress",
///     "phase": "expand",
///     "synthesis": {"content": "v2"},
///     "next_phase": "bogus",
/// }))
/// .unwrap();
///
/// assert_eq!(seq.effective_phase(Phase::Refine), Phase::Expand);
/// assert_eq!(seq.next_phase_or_fallback(Phase::Expand), Phase::Differentiate);
/// assert_eq!(seq.solution_for_next(), Some(json!("v2")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialecticalSequence {
    #[serde(default)]
    pub status: SequenceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_phase: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DialecticalSequence {
    pub fn in_progress(synthesis: Value) -> Self {
        Self {
            synthesis: Some(synthesis),
            ..Default::default()
        }
    }

    pub fn completed(synthesis: Value) -> Self {
        Self {
            status: SequenceStatus::Completed,
            synthesis: Some(synthesis),
            ..Default::default()
        }
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase.as_str().to_string());
        self
    }

    pub fn with_next_phase(mut self, phase: Phase) -> Self {
        self.next_phase = Some(phase.as_str().to_string());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn is_completed(&self) -> bool {
        self.status == SequenceStatus::Completed
    }

    /// Phase this result belongs to, or `tracked` when absent or unknown
    pub fn effective_phase(&self, tracked: Phase) -> Phase {
        self.phase
            .as_deref()
            .and_then(Phase::parse_label)
            .unwrap_or(tracked)
    }

    /// Phase to continue with after `current`
    pub fn next_phase_or_fallback(&self, current: Phase) -> Phase {
        self.next_phase
            .as_deref()
            .and_then(Phase::parse_label)
            .unwrap_or_else(|| current.fallback_next())
    }

    /// New task solution: the synthesis, with a `{content}` wrapper removed
    ///
    /// `None` when the synthesis is missing or null.
    pub fn solution_for_next(&self) -> Option<Value> {
        match self.synthesis.as_ref()? {
            Value::Null => None,
            Value::Object(map) if map.contains_key("content") => map.get("content").cloned(),
            other => Some(other.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_parsing() {
        let done = DialecticalSequence::from_value(json!({"status": "completed"})).unwrap();
        assert!(done.is_completed());

        let other = DialecticalSequence::from_value(json!({"status": "thinking"})).unwrap();
        assert_eq!(other.status, SequenceStatus::InProgress);

        let missing = DialecticalSequence::from_value(json!({})).unwrap();
        assert!(!missing.is_completed());
    }

    #[test]
    fn test_malformed_payload_is_error() {
        assert!(DialecticalSequence::from_value(json!("just text")).is_err());
        assert!(DialecticalSequence::from_value(json!({"phase": 3})).is_err());
    }

    #[test]
    fn test_extra_fields_survive() {
        let seq = DialecticalSequence::from_value(json!({
            "synthesis": "x",
            "thesis": {"content": "v1"},
        }))
        .unwrap();
        assert_eq!(seq.extra["thesis"], json!({"content": "v1"}));
        assert_eq!(seq.to_value()["thesis"], json!({"content": "v1"}));
    }

    #[test]
    fn test_solution_unwrapping() {
        assert_eq!(
            DialecticalSequence::in_progress(json!({"content": "code"})).solution_for_next(),
            Some(json!("code"))
        );
        assert_eq!(
            DialecticalSequence::in_progress(json!({"text": "plan"})).solution_for_next(),
            Some(json!({"text": "plan"}))
        );
        assert_eq!(DialecticalSequence::default().solution_for_next(), None);
        assert_eq!(
            DialecticalSequence::in_progress(Value::Null).solution_for_next(),
            None
        );
    }

    #[test]
    fn test_phase_resolution() {
        let seq = DialecticalSequence::default().with_next_phase(Phase::Retrospect);
        assert_eq!(seq.effective_phase(Phase::Refine), Phase::Refine);
        assert_eq!(seq.next_phase_or_fallback(Phase::Expand), Phase::Retrospect);
        assert_eq!(
            DialecticalSequence::default().next_phase_or_fallback(Phase::Refine),
            Phase::Refine
        );
    }
}
