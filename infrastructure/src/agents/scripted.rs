//! Deterministic agent driven by its expertise keywords
//!
//! Answers the three request types the engine sends:
//!
//! - `vote_request`: votes for the option whose name or description mentions
//!   the most of its expertise, the first listed option on a tie
//! - `critique_request`: asks for every expertise keyword (of its own that the
//!   task requires, or all of its own when the task requires none) the
//!   solution does not mention yet
//! - `operation`: returns a structured output for the named phase operation

use async_trait::async_trait;
use edrr_application::ports::agent::{AgentError, AgentPort};
use edrr_domain::{Agent, Stance, Task, TaskOption};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use tracing::debug;

pub struct ScriptedAgent {
    name: String,
    expertise: BTreeSet<String>,
    stance: Stance,
}

impl ScriptedAgent {
    pub fn new(agent: &Agent) -> Self {
        Self {
            name: agent.name.clone(),
            expertise: agent.expertise.clone(),
            stance: Stance::Favor,
        }
    }

    pub fn with_stance(mut self, stance: Stance) -> Self {
        self.stance = stance;
        self
    }

    pub fn stance(&self) -> Stance {
        self.stance
    }

    /// Option this agent backs: most expertise mentions, earliest on a tie
    pub fn preferred_option<'t>(&self, options: &'t [TaskOption]) -> Option<&'t TaskOption> {
        let mut best: Option<(&TaskOption, usize)> = None;
        for option in options {
            let score = self.mentions(&option_text(option));
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((option, score));
            }
        }
        best.map(|(option, _)| option)
    }

    fn mentions(&self, text: &str) -> usize {
        let text = text.to_lowercase();
        self.expertise
            .iter()
            .filter(|keyword| text.contains(keyword.as_str()))
            .count()
    }

    /// Keywords this agent checks a solution for
    fn concerns(&self, task: &Task) -> Vec<String> {
        match &task.required_expertise {
            Some(required) if self.expertise.iter().any(|e| required.contains(e)) => self
                .expertise
                .intersection(required)
                .cloned()
                .collect(),
            _ => self.expertise.iter().cloned().collect(),
        }
    }

    fn vote(&self, task: &Task, request: &Value) -> Result<Value, AgentError> {
        let ids: Vec<&str> = request
            .get("options")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .collect();
        let offered: Vec<TaskOption> = ids
            .iter()
            .map(|id| {
                task.option(id)
                    .cloned()
                    .unwrap_or_else(|| TaskOption::new(*id, *id))
            })
            .collect();

        let Some(choice) = self.preferred_option(&offered) else {
            return Ok(json!({"reasoning": "no options offered"}));
        };
        let matched = self.mentions(&option_text(choice));
        Ok(json!({
            "vote": choice.id,
            "reasoning": format!(
                "{} matches {} of my {} expertise area(s)",
                choice.name,
                matched,
                self.expertise.len()
            ),
        }))
    }

    fn critique(&self, task: &Task, request: &Value) -> Value {
        let solution = request
            .get("solution")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase();
        let missing: Vec<String> = self
            .concerns(task)
            .into_iter()
            .filter(|keyword| !solution.contains(keyword.as_str()))
            .collect();

        json!({
            "critiques": missing
                .iter()
                .map(|k| format!("The solution should cover {}", k))
                .collect::<Vec<_>>(),
            "alternatives": missing
                .iter()
                .map(|k| format!("Start from a {}-first design", k))
                .collect::<Vec<_>>(),
        })
    }

    fn operation(&self, task: &Task, request: &Value) -> Result<Value, AgentError> {
        let operation = request
            .get("operation")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::InvalidRequest("operation name missing".to_string()))?;
        let revision = request.get("revision").and_then(Value::as_u64).unwrap_or(0);
        let feedback = request.get("feedback").cloned().unwrap_or(json!([]));
        let label = task.label();

        let output = match operation {
            "generate_diverse_ideas" => {
                let mut ideas: Vec<String> = task
                    .options
                    .iter()
                    .map(|o| format!("{}: {}", o.name, label))
                    .collect();
                ideas.extend(
                    self.expertise
                        .iter()
                        .map(|e| format!("Approach '{}' through {}", label, e)),
                );
                json!({"ideas": ideas})
            }
            "evaluate_options" => {
                let evaluations: Vec<Value> = task
                    .options
                    .iter()
                    .map(|o| json!({"option": o.id, "score": self.mentions(&option_text(o))}))
                    .collect();
                json!({"evaluations": evaluations})
            }
            "select_best_option" => {
                json!({"selected": self.preferred_option(&task.options).map(|o| o.id.clone())})
            }
            "elaborate_details" => json!({
                "details": self
                    .concerns(task)
                    .iter()
                    .map(|k| format!("Detail the {} aspects of {}", k, label))
                    .collect::<Vec<_>>(),
            }),
            "create_implementation_plan" => json!({
                "steps": [
                    format!("Prototype {}", label),
                    "Cover the prototype with tests".to_string(),
                    "Integrate and measure".to_string(),
                ],
            }),
            "optimize_implementation" => json!({
                "code": format!("// {}\nfn run() {{}}\n", label),
            }),
            "perform_quality_assurance" => json!({
                "checks": ["tests pass", "no regressions"],
                "quality_score": (0.6 + 0.15 * revision as f64).min(1.0),
                "addressed_feedback": feedback,
            }),
            "extract_learnings" => json!({
                "learnings": self
                    .expertise
                    .iter()
                    .map(|e| format!("{} review of '{}' complete", e, label))
                    .collect::<Vec<_>>(),
            }),
            other => {
                return Err(AgentError::InvalidRequest(format!(
                    "unknown operation: {}",
                    other
                )));
            }
        };

        Ok(json!({
            "agent": self.name,
            "operation": operation,
            "revision": revision,
            "result": output,
        }))
    }
}

fn option_text(option: &TaskOption) -> String {
    match &option.description {
        Some(description) => format!("{} {}", option.name, description),
        None => option.name.clone(),
    }
}

#[async_trait]
impl AgentPort for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, request: &Value) -> Result<Value, AgentError> {
        let kind = request.get("type").and_then(Value::as_str).unwrap_or_default();
        let task: Task = request
            .get("task")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| AgentError::InvalidRequest(format!("malformed task: {}", e)))?
            .unwrap_or_default();
        debug!("{} handles {}", self.name, kind);

        match kind {
            "vote_request" => self.vote(&task, request),
            "critique_request" => Ok(self.critique(&task, request)),
            "operation" => self.operation(&task, request),
            other => Err(AgentError::InvalidRequest(format!(
                "unsupported request type: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(expertise: &[&str]) -> ScriptedAgent {
        ScriptedAgent::new(&Agent::new("scripted").with_expertise(expertise))
    }

    fn task() -> Task {
        Task::new("Protect the login form")
            .with_options([
                TaskOption::new("captcha", "Captcha").with_description("usability cost"),
                TaskOption::new("rate", "Rate limiting").with_description("security at the edge"),
            ])
            .with_required_expertise(["security", "usability"])
    }

    #[tokio::test]
    async fn test_votes_for_best_matching_option() {
        let agent = agent(&["security"]);
        let reply = agent
            .process(&json!({
                "type": "vote_request",
                "task": task().to_value(),
                "options": ["captcha", "rate"],
            }))
            .await
            .unwrap();
        assert_eq!(reply["vote"], "rate");

        let neutral = agent_without_match().await;
        assert_eq!(neutral["vote"], "captcha");
    }

    async fn agent_without_match() -> Value {
        agent(&["databases"])
            .process(&json!({
                "type": "vote_request",
                "task": task().to_value(),
                "options": ["captcha", "rate"],
            }))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_critiques_stop_once_addressed() {
        let agent = agent(&["security", "cooking"]);
        let request = |solution: &str| {
            json!({
                "type": "critique_request",
                "task": task().to_value(),
                "solution": solution,
            })
        };

        let first = agent.process(&request("Add a captcha")).await.unwrap();
        assert_eq!(first["critiques"], json!(["The solution should cover security"]));

        let second = agent
            .process(&request("Add a captcha\n- Addressed: The solution should cover security"))
            .await
            .unwrap();
        assert_eq!(second["critiques"], json!([]));
    }

    #[tokio::test]
    async fn test_operation_outputs() {
        let agent = agent(&["security"]);
        let reply = agent
            .process(&json!({
                "type": "operation",
                "operation": "perform_quality_assurance",
                "task": task().to_value(),
                "revision": 2,
                "feedback": ["add tests"],
            }))
            .await
            .unwrap();
        assert_eq!(reply["agent"], "scripted");
        assert_eq!(reply["result"]["addressed_feedback"], json!(["add tests"]));
        assert!((reply["result"]["quality_score"].as_f64().unwrap() - 0.9).abs() < 1e-9);

        let selected = agent
            .process(&json!({
                "type": "operation",
                "operation": "select_best_option",
                "task": task().to_value(),
            }))
            .await
            .unwrap();
        assert_eq!(selected["result"]["selected"], "rate");
    }

    #[tokio::test]
    async fn test_unknown_requests_are_invalid() {
        let agent = agent(&["security"]);
        let error = agent.process(&json!({"type": "gossip"})).await.unwrap_err();
        assert!(matches!(error, AgentError::InvalidRequest(_)));

        let error = agent
            .process(&json!({"type": "operation", "operation": "dance"}))
            .await
            .unwrap_err();
        assert!(matches!(error, AgentError::InvalidRequest(_)));
    }
}
