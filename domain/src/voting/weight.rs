//! Vote weighting

use crate::agent::Agent;

/// Computes the weight of an agent's vote
///
/// Weights must be finite and non-negative.
pub trait VoteWeigher: Send + Sync {
    fn weight(&self, agent: &Agent, domain: Option<&str>) -> f64;

    /// Human-readable explanation of the weight
    fn justification(&self, agent: &Agent, domain: Option<&str>) -> String {
        format!("{} weight {:.2}", agent.name, self.weight(agent, domain))
    }
}

/// Every vote counts 1.0
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformWeigher;

impl VoteWeigher for UniformWeigher {
    fn weight(&self, _agent: &Agent, _domain: Option<&str>) -> f64 {
        1.0
    }

    fn justification(&self, agent: &Agent, _domain: Option<&str>) -> String {
        format!("{} has an equal vote", agent.name)
    }
}

/// `(1 + dc × domain_matches) × (1 + ec × experience_level)`
///
/// Strictly increasing in both domain matches and experience as long as both
/// coefficients are positive.
///
/// # Example
///
/// ```
/// use edrr_domain::{Agent, ExpertiseWeigher, VoteWeigher};
///
/// let weigher = ExpertiseWeigher::default();
/// let expert = Agent::new("sec").with_expertise(["security"]).with_experience(5);
/// let novice = Agent::new("ux").with_expertise(["design"]);
///
/// assert!(weigher.weight(&expert, Some("security")) > weigher.weight(&novice, Some("security")));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpertiseWeigher {
    pub domain_coefficient: f64,
    pub experience_coefficient: f64,
}

impl Default for ExpertiseWeigher {
    fn default() -> Self {
        Self {
            domain_coefficient: 1.0,
            experience_coefficient: 0.1,
        }
    }
}

impl ExpertiseWeigher {
    pub fn new(domain_coefficient: f64, experience_coefficient: f64) -> Self {
        Self {
            domain_coefficient,
            experience_coefficient,
        }
    }
}

impl VoteWeigher for ExpertiseWeigher {
    fn weight(&self, agent: &Agent, domain: Option<&str>) -> f64 {
        let matches = domain.map(|d| agent.domain_matches(d)).unwrap_or(0) as f64;
        let weight = (1.0 + self.domain_coefficient * matches)
            * (1.0 + self.experience_coefficient * agent.experience_level as f64);
        if weight.is_finite() { weight.max(0.0) } else { 0.0 }
    }

    fn justification(&self, agent: &Agent, domain: Option<&str>) -> String {
        let matches = domain.map(|d| agent.domain_matches(d)).unwrap_or(0);
        format!(
            "{} has {} domain match(es) and experience level {} (weight {:.2})",
            agent.name,
            matches,
            agent.experience_level,
            self.weight(agent, domain)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expertise_weight_formula() {
        let weigher = ExpertiseWeigher::default();
        let agent = Agent::new("a").with_expertise(["security"]).with_experience(5);
        assert!((weigher.weight(&agent, Some("security")) - 3.0).abs() < 1e-9);
        assert!((weigher.weight(&agent, None) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_weight_strictly_ordered() {
        let weigher = ExpertiseWeigher::default();
        let base = Agent::new("base").with_expertise(["security"]).with_experience(2);
        let more_exp = Agent::new("exp").with_expertise(["security"]).with_experience(3);
        let more_domain = Agent::new("dom")
            .with_expertise(["security", "web-security"])
            .with_experience(2);

        let w = |a: &Agent| weigher.weight(a, Some("security"));
        assert!(w(&more_exp) > w(&base));
        assert!(w(&more_domain) > w(&base));
    }

    #[test]
    fn test_uniform_weigher() {
        let agent = Agent::new("a").with_expertise(["security"]).with_experience(9);
        assert_eq!(UniformWeigher.weight(&agent, Some("security")), 1.0);
    }

    #[test]
    fn test_justification_mentions_agent() {
        let agent = Agent::new("alice").with_experience(4);
        assert!(ExpertiseWeigher::default()
            .justification(&agent, Some("x"))
            .contains("alice"));
    }
}
