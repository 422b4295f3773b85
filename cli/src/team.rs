//! Team assembly from configuration

use anyhow::{Context, Result};
use edrr_application::Team;
use edrr_domain::{Agent, Role, Stance, Task, task_key};
use edrr_infrastructure::{FileConfig, ScriptedAgent};
use std::sync::Arc;
use tracing::{debug, warn};

/// Team used when the configuration lists no agents, one per phase
const BUILTIN_TEAM: [(&str, &[&str], u32); 4] = [
    ("explorer", &["exploration", "brainstorming", "creativity"], 5),
    ("analyst", &["analysis", "comparison", "evaluation"], 6),
    ("engineer", &["implementation", "coding", "optimization"], 7),
    ("reviewer", &["reflection", "learning", "improvement"], 4),
];

/// A team member's simulated agent and its configured stance
pub struct Member {
    pub name: String,
    pub stance: Stance,
    pub agent: Arc<ScriptedAgent>,
}

/// Build the team from `[[team.agents]]`, or the built-in team when none are configured
pub fn build_team(config: &FileConfig) -> Result<(Team, Vec<Member>)> {
    let mut specs: Vec<(Agent, Stance)> = Vec::new();
    if config.team.agents.is_empty() {
        for (name, expertise, experience) in BUILTIN_TEAM {
            let agent = Agent::new(name)
                .with_expertise(expertise.iter().copied())
                .with_experience(experience);
            specs.push((agent, Stance::Favor));
        }
    } else {
        for (index, entry) in config.team.agents.iter().enumerate() {
            let (stance, issues) = entry.parse_stance(index);
            for issue in issues {
                warn!("{}", issue.message);
            }
            specs.push((entry.to_agent(), stance));
        }
    }

    let mut team = Team::new("edrr-quorum");
    let mut members = Vec::with_capacity(specs.len());
    for (agent, stance) in specs {
        let scripted = Arc::new(ScriptedAgent::new(&agent).with_stance(stance));
        let name = agent.name.clone();
        team.add_agent(agent, scripted.clone())
            .with_context(|| format!("cannot add agent '{}'", name))?;
        members.push(Member {
            name,
            stance,
            agent: scripted,
        });
    }
    debug!("Team of {} agents assembled", team.len());
    Ok((team, members))
}

/// Record each member's stance on the option it prefers
pub fn seed_opinions(team: &mut Team, members: &[Member], task: &Task) {
    let key = task_key(task);
    for member in members {
        if let Some(option) = member.agent.preferred_option(&task.options) {
            team.consensus_mut()
                .set_agent_opinion(&key, &member.name, &option.id, member.stance);
        }
    }
}

/// Agent that critiques the current Primus's work
///
/// The agent holding the Evaluator role, else the first agent that is not Primus.
pub fn pick_critic(team: &Team) -> Option<String> {
    let roster = team.roster();
    roster
        .iter()
        .find(|a| a.current_role == Some(Role::Evaluator))
        .or_else(|| roster.iter().find(|a| a.current_role != Some(Role::Primus)))
        .or_else(|| roster.agents().first())
        .map(|a| a.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use edrr_domain::{Phase, RoleAssignor, TaskOption};
    use edrr_infrastructure::FileTeamAgent;

    #[test]
    fn test_builtin_team_when_unconfigured() {
        let (team, members) = build_team(&FileConfig::default()).unwrap();
        assert_eq!(team.len(), 4);
        assert!(members.iter().all(|m| m.stance == Stance::Favor));
        assert!(team.agent_port("engineer").is_some());
    }

    #[test]
    fn test_configured_team_keeps_stances() {
        let mut config = FileConfig::default();
        config.team.agents = vec![
            FileTeamAgent {
                name: "ana".to_string(),
                expertise: vec!["analysis".to_string()],
                experience_level: 3,
                stance: Some("oppose".to_string()),
            },
            FileTeamAgent {
                name: "ben".to_string(),
                expertise: vec!["coding".to_string()],
                experience_level: 2,
                stance: None,
            },
        ];
        let (team, members) = build_team(&config).unwrap();
        assert_eq!(team.len(), 2);
        assert_eq!(members[0].stance, Stance::Oppose);
        assert_eq!(members[1].stance, Stance::Favor);
    }

    #[test]
    fn test_duplicate_agents_are_rejected() {
        let mut config = FileConfig::default();
        let agent = FileTeamAgent {
            name: "ana".to_string(),
            expertise: Vec::new(),
            experience_level: 1,
            stance: None,
        };
        config.team.agents = vec![agent.clone(), agent];
        assert!(build_team(&config).is_err());
    }

    #[test]
    fn test_seed_opinions_records_preferred_option() {
        let (mut team, members) = build_team(&FileConfig::default()).unwrap();
        let task = Task::new("Pick a technique")
            .with_id("t1")
            .with_options([
                TaskOption::new("brainstorm", "Brainstorming session"),
                TaskOption::new("bench", "Optimization benchmark"),
            ]);
        seed_opinions(&mut team, &members, &task);
        let result = team.build_consensus(&task);
        assert!(!result.agent_reasoning.is_empty());
    }

    #[test]
    fn test_critic_is_never_the_primus_when_others_exist() {
        let (mut team, _) = build_team(&FileConfig::default()).unwrap();
        let task = Task::new("Write code").with_id("t1");
        let primus = RoleAssignor::new()
            .assign_roles(team.roster_mut(), Phase::Refine, &task)
            .unwrap();
        let critic = pick_critic(&team).unwrap();
        assert_ne!(critic, primus);
    }
}
