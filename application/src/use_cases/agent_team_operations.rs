//! Default [`TeamOperations`]: every operation is sent to the phase's Primus

use crate::ports::agent::AgentPort;
use crate::ports::team_operations::{Operation, OperationContext, OperationError, TeamOperations};
use crate::team::Team;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub struct AgentTeamOperations {
    ports: BTreeMap<String, Arc<dyn AgentPort>>,
    /// Used when the context names no Primus
    fallback: Option<String>,
}

impl AgentTeamOperations {
    pub fn from_team(team: &Team) -> Self {
        let ports = team
            .roster()
            .iter()
            .filter_map(|agent| {
                team.agent_port(&agent.name)
                    .map(|port| (agent.name.clone(), port.clone()))
            })
            .collect();
        let fallback = team.roster().agents().first().map(|a| a.name.clone());
        Self { ports, fallback }
    }
}

#[async_trait]
impl TeamOperations for AgentTeamOperations {
    async fn run(
        &self,
        operation: Operation,
        context: &OperationContext,
    ) -> Result<Value, OperationError> {
        let name = context
            .primus
            .as_deref()
            .or(self.fallback.as_deref())
            .ok_or_else(|| OperationError::Failed("team has no agents".to_string()))?;
        let port = self
            .ports
            .get(name)
            .ok_or_else(|| OperationError::Failed(format!("no agent port for {}", name)))?;

        debug!("{} runs {} in {}", name, operation, context.phase);
        Ok(port.process(&context.to_request(operation)).await?)
    }
}
