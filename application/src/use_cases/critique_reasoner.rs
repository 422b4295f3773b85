//! Default dialectical reasoner: the current solution is the thesis, the
//! critic's findings are the antithesis, and the synthesis is the solution
//! amended to address every finding that does not contradict another.

use crate::ports::agent::{AgentError, AgentPort};
use crate::ports::dialectical::{DialecticalReasoner, ReasonerError, ReasoningOutput};
use crate::ports::memory::MemoryPort;
use crate::team::Team;
use async_trait::async_trait;
use edrr_domain::consensus::text_conflict;
use edrr_domain::{DialecticalSequence, Phase, Task};
use serde_json::{Value, json};
use tracing::{debug, warn};

pub struct CritiqueReasoner {
    phase: Phase,
}

impl CritiqueReasoner {
    pub fn new() -> Self {
        Self {
            phase: Phase::Refine,
        }
    }

    /// Phase under which sequences are stored in memory
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }
}

impl Default for CritiqueReasoner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DialecticalReasoner for CritiqueReasoner {
    async fn apply_dialectical_reasoning(
        &self,
        team: &Team,
        task: &Task,
        critic: &dyn AgentPort,
        memory: Option<&dyn MemoryPort>,
    ) -> Result<ReasoningOutput, ReasonerError> {
        let solution = task.solution.as_ref().ok_or(ReasonerError::MissingSolution)?;
        let thesis = solution_text(solution);

        let request = json!({
            "type": "critique_request",
            "task": task.to_value(),
            "solution": thesis,
            "team": team.name(),
        });
        let reply = critic.process(&request).await.map_err(classify)?;
        if !reply.is_object() {
            return Err(ReasonerError::Invalid(format!(
                "critique reply from {} is not an object",
                critic.name()
            )));
        }

        let critiques = strings(&reply, "critiques");
        let alternatives = strings(&reply, "alternatives");
        debug!("{} raised {} critique(s)", critic.name(), critiques.len());

        let (integrated, rejected) = partition_critiques(&critiques);
        let improvements: Vec<String> = integrated
            .iter()
            .map(|critique| format!("Address: {}", critique))
            .collect();

        let mut content = thesis.clone();
        for critique in &integrated {
            content.push_str("\n- Addressed: ");
            content.push_str(critique);
        }

        let synthesis = json!({
            "content": content,
            "integrated_critiques": integrated,
            "rejected_critiques": rejected,
            "improvements": improvements,
            "reasoning": if critiques.is_empty() {
                "No critiques raised; the solution stands".to_string()
            } else {
                format!(
                    "Integrated {} of {} critique(s); rejected {} that contradicted earlier ones",
                    integrated.len(),
                    critiques.len(),
                    rejected.len()
                )
            },
        });

        let sequence = if critiques.is_empty() {
            DialecticalSequence::completed(synthesis)
        } else {
            DialecticalSequence::in_progress(synthesis)
        }
        .with_extra("thesis", json!({"content": thesis}))
        .with_extra(
            "antithesis",
            json!({
                "critic": critic.name(),
                "critiques": critiques,
                "alternative_approaches": alternatives,
                "improvement_suggestions": improvements,
            }),
        );

        if let Some(memory) = memory {
            let metadata = json!({"type": "dialectical_reasoning", "task_id": task.id});
            if let Err(e) = memory
                .store_with_edrr_phase(sequence.to_value(), self.phase, metadata)
                .await
            {
                warn!("Failed to store reasoning step: {}", e);
            }
        }

        Ok(sequence.into())
    }
}

fn classify(error: AgentError) -> ReasonerError {
    match error {
        AgentError::InvalidRequest(msg) => ReasonerError::Invalid(msg),
        other => ReasonerError::Transient(other.to_string()),
    }
}

fn solution_text(solution: &Value) -> String {
    match solution {
        Value::String(text) => text.clone(),
        Value::Object(map) => match map.get("content") {
            Some(Value::String(text)) => text.clone(),
            _ => solution.to_string(),
        },
        other => other.to_string(),
    }
}

fn strings(reply: &Value, key: &str) -> Vec<String> {
    reply
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// Keep critiques in order, rejecting any that contradict one already kept
fn partition_critiques(critiques: &[String]) -> (Vec<String>, Vec<String>) {
    let mut integrated: Vec<String> = Vec::new();
    let mut rejected = Vec::new();
    for critique in critiques {
        let contradicts = integrated.iter().any(|kept| {
            text_conflict(kept, critique).is_some_and(|(_, reason)| {
                matches!(
                    reason.as_str(),
                    "direct contradiction" | "opposing recommendations"
                )
            })
        });
        if contradicts {
            rejected.push(critique.clone());
        } else {
            integrated.push(critique.clone());
        }
    }
    (integrated, rejected)
}
