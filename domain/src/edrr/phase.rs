//! EDRR phases

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Phase of an EDRR cycle
///
/// Phases are ordered; `RETROSPECT` is terminal.
///
/// # Example
///
/// ```
/// use edrr_domain::Phase;
///
/// assert_eq!(Phase::Expand.next(), Some(Phase::Differentiate));
/// assert_eq!(Phase::Retrospect.next(), None);
/// assert_eq!("refine".parse::<Phase>().unwrap(), Phase::Refine);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Generate a broad range of ideas
    #[default]
    Expand,
    /// Compare and evaluate the ideas
    Differentiate,
    /// Turn the selected idea into a concrete implementation
    Refine,
    /// Reflect on the cycle and extract learnings
    Retrospect,
}

impl Phase {
    /// All phases in cycle order
    pub const ALL: [Phase; 4] = [
        Phase::Expand,
        Phase::Differentiate,
        Phase::Refine,
        Phase::Retrospect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Expand => "EXPAND",
            Phase::Differentiate => "DIFFERENTIATE",
            Phase::Refine => "REFINE",
            Phase::Retrospect => "RETROSPECT",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Phase::Expand => "Expand",
            Phase::Differentiate => "Differentiate",
            Phase::Refine => "Refine",
            Phase::Retrospect => "Retrospect",
        }
    }

    /// Position in the cycle (0-based)
    pub fn index(&self) -> usize {
        match self {
            Phase::Expand => 0,
            Phase::Differentiate => 1,
            Phase::Refine => 2,
            Phase::Retrospect => 3,
        }
    }

    /// Next phase of a full cycle, `None` after RETROSPECT
    pub fn next(&self) -> Option<Phase> {
        Phase::ALL.get(self.index() + 1).copied()
    }

    /// Transition used when a reasoning step does not name its successor.
    ///
    /// EXPAND → DIFFERENTIATE → REFINE → REFINE. RETROSPECT stays where it is.
    pub fn fallback_next(&self) -> Phase {
        match self {
            Phase::Expand => Phase::Differentiate,
            Phase::Differentiate => Phase::Refine,
            Phase::Refine => Phase::Refine,
            Phase::Retrospect => Phase::Retrospect,
        }
    }

    /// Phases strictly between `self` and `target`, in order
    pub fn phases_between(&self, target: Phase) -> Vec<Phase> {
        Phase::ALL
            .iter()
            .copied()
            .filter(|p| p.index() > self.index() && p.index() < target.index())
            .collect()
    }

    /// Parse leniently, returning `None` for unknown labels
    pub fn parse_label(label: &str) -> Option<Phase> {
        label.parse().ok()
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expand" => Ok(Phase::Expand),
            "differentiate" => Ok(Phase::Differentiate),
            "refine" => Ok(Phase::Refine),
            "retrospect" => Ok(Phase::Retrospect),
            _ => Err(DomainError::InvalidPhase(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order_and_next() {
        assert_eq!(Phase::Expand.next(), Some(Phase::Differentiate));
        assert_eq!(Phase::Differentiate.next(), Some(Phase::Refine));
        assert_eq!(Phase::Refine.next(), Some(Phase::Retrospect));
        assert_eq!(Phase::Retrospect.next(), None);
        assert!(Phase::Expand < Phase::Retrospect);
    }

    #[test]
    fn test_fallback_next_saturates_at_refine() {
        assert_eq!(Phase::Expand.fallback_next(), Phase::Differentiate);
        assert_eq!(Phase::Differentiate.fallback_next(), Phase::Refine);
        assert_eq!(Phase::Refine.fallback_next(), Phase::Refine);
        assert_eq!(Phase::Retrospect.fallback_next(), Phase::Retrospect);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("EXPAND".parse::<Phase>().unwrap(), Phase::Expand);
        assert_eq!(" Differentiate ".parse::<Phase>().unwrap(), Phase::Differentiate);
        assert_eq!(Phase::parse_label("retrospect"), Some(Phase::Retrospect));
        assert_eq!(Phase::parse_label("mystery"), None);
        assert!(matches!(
            "???".parse::<Phase>(),
            Err(DomainError::InvalidPhase(_))
        ));
    }

    #[test]
    fn test_phases_between() {
        assert_eq!(
            Phase::Expand.phases_between(Phase::Retrospect),
            vec![Phase::Differentiate, Phase::Refine]
        );
        assert!(Phase::Expand.phases_between(Phase::Differentiate).is_empty());
        assert!(Phase::Refine.phases_between(Phase::Expand).is_empty());
    }

    #[test]
    fn test_serde_uses_upper_case_labels() {
        let json = serde_json::to_string(&Phase::Differentiate).unwrap();
        assert_eq!(json, "\"DIFFERENTIATE\"");
        let parsed: Phase = serde_json::from_str("\"REFINE\"").unwrap();
        assert_eq!(parsed, Phase::Refine);
    }
}
