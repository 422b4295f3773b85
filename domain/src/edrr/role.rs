//! Team roles

use serde::{Deserialize, Serialize};

/// Role an agent plays during a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Lead agent for the current phase
    Primus,
    Worker,
    Supervisor,
    Designer,
    Evaluator,
}

impl Role {
    /// Secondary roles handed out after the Primus, in rotation order
    pub const SECONDARY: [Role; 4] = [
        Role::Supervisor,
        Role::Designer,
        Role::Evaluator,
        Role::Worker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Primus => "primus",
            Role::Worker => "worker",
            Role::Supervisor => "supervisor",
            Role::Designer => "designer",
            Role::Evaluator => "evaluator",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
