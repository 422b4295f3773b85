//! Voting method and abstention policy

use serde::{Deserialize, Serialize};

/// How votes are weighted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VotingMethod {
    /// One agent, one vote
    Majority,
    /// Votes weighted by expertise and experience
    #[default]
    Weighted,
}

impl VotingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            VotingMethod::Majority => "majority",
            VotingMethod::Weighted => "weighted",
        }
    }
}

impl std::str::FromStr for VotingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "majority" | "simple" => Ok(VotingMethod::Majority),
            "weighted" => Ok(VotingMethod::Weighted),
            _ => Err(format!("Invalid VotingMethod: {}", s)),
        }
    }
}

impl std::fmt::Display for VotingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How agents that did not cast a valid vote are counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbstentionPolicy {
    /// Abstainers are left out of turnout and weights
    #[default]
    Exclude,
    /// Abstainers count as participants with weight 0
    ZeroWeight,
}

impl AbstentionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbstentionPolicy::Exclude => "exclude",
            AbstentionPolicy::ZeroWeight => "zero_weight",
        }
    }
}

impl std::str::FromStr for AbstentionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exclude" => Ok(AbstentionPolicy::Exclude),
            "zero_weight" | "zero-weight" | "zero" => Ok(AbstentionPolicy::ZeroWeight),
            _ => Err(format!("Invalid AbstentionPolicy: {}", s)),
        }
    }
}

impl std::fmt::Display for AbstentionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voting_method_from_str() {
        assert_eq!("Weighted".parse::<VotingMethod>().unwrap(), VotingMethod::Weighted);
        assert_eq!("majority".parse::<VotingMethod>().unwrap(), VotingMethod::Majority);
        assert!("ranked".parse::<VotingMethod>().is_err());
    }

    #[test]
    fn test_abstention_policy_from_str() {
        assert_eq!("exclude".parse::<AbstentionPolicy>().unwrap(), AbstentionPolicy::Exclude);
        assert_eq!(
            "zero-weight".parse::<AbstentionPolicy>().unwrap(),
            AbstentionPolicy::ZeroWeight
        );
        assert!("ignore".parse::<AbstentionPolicy>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(VotingMethod::default(), VotingMethod::Weighted);
        assert_eq!(AbstentionPolicy::default(), AbstentionPolicy::Exclude);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&AbstentionPolicy::ZeroWeight).unwrap(),
            "\"zero_weight\""
        );
        assert_eq!(serde_json::to_string(&VotingMethod::Majority).unwrap(), "\"majority\"");
    }
}
