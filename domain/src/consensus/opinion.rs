//! Agent opinions and proposed solutions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How strongly an agent backs an option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    StronglyFavor,
    Favor,
    #[default]
    Neutral,
    Oppose,
    StronglyOppose,
}

impl Stance {
    /// Signed strength: +2 strongly favor down to -2 strongly oppose
    pub fn score(&self) -> f64 {
        match self {
            Stance::StronglyFavor => 2.0,
            Stance::Favor => 1.0,
            Stance::Neutral => 0.0,
            Stance::Oppose => -1.0,
            Stance::StronglyOppose => -2.0,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.score() > 0.0
    }

    pub fn is_strong(&self) -> bool {
        matches!(self, Stance::StronglyFavor | Stance::StronglyOppose)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stance::StronglyFavor => "strongly_favor",
            Stance::Favor => "favor",
            Stance::Neutral => "neutral",
            Stance::Oppose => "oppose",
            Stance::StronglyOppose => "strongly_oppose",
        }
    }
}

impl std::str::FromStr for Stance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "strongly_favor" => Ok(Stance::StronglyFavor),
            "favor" => Ok(Stance::Favor),
            "neutral" => Ok(Stance::Neutral),
            "oppose" => Ok(Stance::Oppose),
            "strongly_oppose" => Ok(Stance::StronglyOppose),
            _ => Err(format!("Invalid Stance: {}", s)),
        }
    }
}

impl std::fmt::Display for Stance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An agent's position on a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opinion {
    pub agent: String,
    pub option_id: Option<String>,
    pub stance: Stance,
    /// Free-text opinion
    pub opinion: String,
    pub rationale: String,
    pub timestamp: DateTime<Utc>,
}

impl Opinion {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            option_id: None,
            stance: Stance::Neutral,
            opinion: String::new(),
            rationale: String::new(),
            timestamp: Utc::now(),
        }
    }

    /// Option this opinion favors, if the stance is positive
    pub fn favored_option(&self) -> Option<&str> {
        self.option_id
            .as_deref()
            .filter(|_| self.stance.is_positive())
    }

    pub fn has_text(&self) -> bool {
        !self.opinion.trim().is_empty()
    }
}

/// A proposed solution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub agent: String,
    pub content: String,
}

impl Solution {
    pub fn new(agent: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            content: content.into(),
        }
    }
}
