//! Tie-break strategies
//!
//! Each strategy narrows a set of tied options. A strategy that cannot
//! discriminate (or would eliminate every option) leaves the set unchanged.

use super::tally::{Tally, TIE_EPSILON};
use crate::agent::TeamRoster;
use rand::RngCore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakStrategy {
    /// Keep the option the Primus voted for
    PrimusVote,
    /// Keep the options whose supporters have the most domain expertise
    DomainExpertise,
    /// Keep the options backed by the single heaviest voter
    StrongestVoter,
    /// Keep the options whose supporters have the most combined experience
    Experience,
    /// Pick one option with the shared PRNG
    Random,
}

impl TieBreakStrategy {
    /// Deterministic strategies, in the order they are applied by default
    pub const DEFAULT_ORDER: [TieBreakStrategy; 4] = [
        TieBreakStrategy::PrimusVote,
        TieBreakStrategy::DomainExpertise,
        TieBreakStrategy::StrongestVoter,
        TieBreakStrategy::Experience,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TieBreakStrategy::PrimusVote => "primus_vote",
            TieBreakStrategy::DomainExpertise => "domain_expertise",
            TieBreakStrategy::StrongestVoter => "strongest_voter",
            TieBreakStrategy::Experience => "experience",
            TieBreakStrategy::Random => "random",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TieBreakStrategy::PrimusVote => "Prefer the option chosen by the Primus",
            TieBreakStrategy::DomainExpertise => {
                "Prefer options backed by the most domain expertise"
            }
            TieBreakStrategy::StrongestVoter => "Prefer options backed by the heaviest single vote",
            TieBreakStrategy::Experience => "Prefer options backed by the most combined experience",
            TieBreakStrategy::Random => "Pick one of the tied options at random",
        }
    }

    /// Narrow `tied` and describe what happened
    pub fn apply(
        &self,
        tied: &[String],
        ctx: &TieContext<'_>,
        rng: &mut dyn RngCore,
    ) -> StrategyApplication {
        let narrowed = match self {
            TieBreakStrategy::PrimusVote => ctx
                .primus
                .and_then(|p| ctx.tally.vote_of(p))
                .filter(|choice| tied.iter().any(|t| t == choice))
                .map(|choice| vec![choice.to_string()])
                .unwrap_or_else(|| tied.to_vec()),
            TieBreakStrategy::DomainExpertise => keep_max(tied, |option| {
                ctx.tally
                    .supporters(option)
                    .filter_map(|agent| ctx.roster.get(agent))
                    .map(|agent| {
                        ctx.domain_keywords
                            .iter()
                            .map(|k| agent.domain_matches(k))
                            .sum::<usize>() as f64
                    })
                    .sum()
            }),
            TieBreakStrategy::StrongestVoter => keep_max(tied, |option| {
                ctx.tally
                    .supporters(option)
                    .map(|agent| ctx.tally.weight_of(agent))
                    .fold(0.0, f64::max)
            }),
            TieBreakStrategy::Experience => keep_max(tied, |option| {
                ctx.tally
                    .supporters(option)
                    .filter_map(|agent| ctx.roster.get(agent))
                    .map(|agent| agent.experience_level as f64)
                    .sum()
            }),
            TieBreakStrategy::Random => {
                if tied.is_empty() {
                    Vec::new()
                } else {
                    let index = (rng.next_u64() % tied.len() as u64) as usize;
                    vec![tied[index].clone()]
                }
            }
        };

        let outcome = if narrowed.len() == 1 {
            format!("selected {}", narrowed[0])
        } else if narrowed.len() < tied.len() {
            format!("narrowed to {}", narrowed.join(", "))
        } else {
            "no change".to_string()
        };

        StrategyApplication {
            name: self.as_str().to_string(),
            description: self.description().to_string(),
            outcome,
            remaining: narrowed,
        }
    }
}

impl std::str::FromStr for TieBreakStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "primus_vote" | "primus" => Ok(TieBreakStrategy::PrimusVote),
            "domain_expertise" | "expertise" => Ok(TieBreakStrategy::DomainExpertise),
            "strongest_voter" => Ok(TieBreakStrategy::StrongestVoter),
            "experience" => Ok(TieBreakStrategy::Experience),
            "random" => Ok(TieBreakStrategy::Random),
            _ => Err(format!("Invalid TieBreakStrategy: {}", s)),
        }
    }
}

impl std::fmt::Display for TieBreakStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inputs shared by all strategies
pub struct TieContext<'a> {
    pub tally: &'a Tally,
    pub roster: &'a TeamRoster,
    pub primus: Option<&'a str>,
    /// Task domain and required expertise
    pub domain_keywords: Vec<String>,
}

/// One applied strategy, as recorded in the tie resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyApplication {
    pub name: String,
    pub description: String,
    pub outcome: String,
    pub remaining: Vec<String>,
}

fn keep_max(tied: &[String], score: impl Fn(&str) -> f64) -> Vec<String> {
    let scored: Vec<(&String, f64)> = tied.iter().map(|o| (o, score(o))).collect();
    let best = scored.iter().map(|(_, s)| *s).fold(f64::NEG_INFINITY, f64::max);
    scored
        .into_iter()
        .filter(|(_, s)| (best - s).abs() <= TIE_EPSILON)
        .map(|(o, _)| o.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::voting::method::AbstentionPolicy;
    use crate::voting::tally::Ballot;
    use crate::voting::weight::{ExpertiseWeigher, UniformWeigher, VoteWeigher};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn roster() -> TeamRoster {
        TeamRoster::with_agents([
            Agent::new("lead").with_expertise(["ux"]).with_experience(1),
            Agent::new("sec").with_expertise(["security"]).with_experience(2),
            Agent::new("vet").with_expertise(["ops"]).with_experience(9),
        ])
        .unwrap()
    }

    fn tied() -> Vec<String> {
        vec!["a".to_string(), "b".to_string()]
    }

    fn tally(roster: &TeamRoster, weigher: &dyn VoteWeigher) -> Tally {
        Tally::compute(
            roster,
            &tied(),
            [Ballot::cast("lead", "a"), Ballot::cast("sec", "b")],
            weigher,
            Some("security"),
            AbstentionPolicy::Exclude,
        )
    }

    fn ctx<'a>(
        tally: &'a Tally,
        roster: &'a TeamRoster,
        primus: Option<&'a str>,
    ) -> TieContext<'a> {
        TieContext {
            tally,
            roster,
            primus,
            domain_keywords: vec!["security".to_string()],
        }
    }

    #[test]
    fn test_primus_vote() {
        let roster = roster();
        let tally = tally(&roster, &UniformWeigher);
        let mut rng = StdRng::seed_from_u64(1);

        let context = ctx(&tally, &roster, Some("lead"));
        let applied = TieBreakStrategy::PrimusVote.apply(&tied(), &context, &mut rng);
        assert_eq!(applied.remaining, vec!["a".to_string()]);
        assert_eq!(applied.outcome, "selected a");
        assert_eq!(applied.name, "primus_vote");
    }

    #[test]
    fn test_primus_without_vote_keeps_set() {
        let roster = roster();
        let tally = tally(&roster, &UniformWeigher);
        let mut rng = StdRng::seed_from_u64(1);

        let context = ctx(&tally, &roster, Some("vet"));
        let applied = TieBreakStrategy::PrimusVote.apply(&tied(), &context, &mut rng);
        assert_eq!(applied.remaining, tied());
        assert_eq!(applied.outcome, "no change");
    }

    #[test]
    fn test_domain_expertise() {
        let roster = roster();
        let tally = tally(&roster, &UniformWeigher);
        let mut rng = StdRng::seed_from_u64(1);

        let applied =
            TieBreakStrategy::DomainExpertise.apply(&tied(), &ctx(&tally, &roster, None), &mut rng);
        assert_eq!(applied.remaining, vec!["b".to_string()]);
    }

    #[test]
    fn test_strongest_voter_uses_weights() {
        let roster = roster();
        let tally = tally(&roster, &ExpertiseWeigher::default());
        let mut rng = StdRng::seed_from_u64(1);

        let applied =
            TieBreakStrategy::StrongestVoter.apply(&tied(), &ctx(&tally, &roster, None), &mut rng);
        assert_eq!(applied.remaining, vec!["b".to_string()]);
    }

    #[test]
    fn test_experience() {
        let roster = roster();
        let tally = tally(&roster, &UniformWeigher);
        let mut rng = StdRng::seed_from_u64(1);

        let applied =
            TieBreakStrategy::Experience.apply(&tied(), &ctx(&tally, &roster, None), &mut rng);
        assert_eq!(applied.remaining, vec!["b".to_string()]);
    }

    #[test]
    fn test_random_is_reproducible() {
        let roster = roster();
        let tally = tally(&roster, &UniformWeigher);

        let pick = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            TieBreakStrategy::Random
                .apply(&tied(), &ctx(&tally, &roster, None), &mut rng)
                .remaining
        };
        assert_eq!(pick(42), pick(42));
        assert_eq!(pick(42).len(), 1);
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "primus-vote".parse::<TieBreakStrategy>().unwrap(),
            TieBreakStrategy::PrimusVote
        );
        assert_eq!(
            "Strongest_Voter".parse::<TieBreakStrategy>().unwrap(),
            TieBreakStrategy::StrongestVoter
        );
        assert!("coin".parse::<TieBreakStrategy>().is_err());
    }
}
