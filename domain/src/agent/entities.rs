//! Agent entity

use crate::edrr::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A team member with expertise and experience
///
/// Expertise keywords are stored lower-cased so matching is case-insensitive.
///
/// # Example
///
/// ```
/// use edrr_domain::Agent;
///
/// let agent = Agent::new("backend")
///     .with_expertise(["Rust", "backend"])
///     .with_experience(7);
/// assert!(agent.has_expertise("rust"));
/// assert_eq!(agent.experience_level, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique agent name, used as the agent id
    pub name: String,
    pub expertise: BTreeSet<String>,
    pub experience_level: u32,
    pub current_role: Option<Role>,
    pub has_been_primus: bool,
}

impl Agent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expertise: BTreeSet::new(),
            experience_level: 0,
            current_role: None,
            has_been_primus: false,
        }
    }

    pub fn with_expertise<I, S>(mut self, expertise: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.expertise.extend(
            expertise
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty()),
        );
        self
    }

    pub fn with_experience(mut self, level: u32) -> Self {
        self.experience_level = level;
        self
    }

    pub fn has_expertise(&self, keyword: &str) -> bool {
        self.expertise.contains(&keyword.trim().to_lowercase())
    }

    /// Number of the given keywords this agent has exact expertise in
    pub fn expertise_overlap<'a, I>(&self, keywords: I) -> usize
    where
        I: IntoIterator<Item = &'a String>,
    {
        keywords
            .into_iter()
            .filter(|k| self.expertise.contains(&k.to_lowercase()))
            .count()
    }

    /// Number of expertise entries that match `domain` exactly or by containment
    ///
    /// "security" matches "security", "web-security" and "sec".
    pub fn domain_matches(&self, domain: &str) -> usize {
        let domain = domain.trim().to_lowercase();
        if domain.is_empty() {
            return 0;
        }
        self.expertise
            .iter()
            .filter(|e| e.contains(domain.as_str()) || domain.contains(e.as_str()))
            .count()
    }

    pub fn is_primus(&self) -> bool {
        self.current_role == Some(Role::Primus)
    }
}
