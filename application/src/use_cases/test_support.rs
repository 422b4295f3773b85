//! Mock ports shared by the use case tests

use crate::ports::agent::{AgentError, AgentPort};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Agent that replays scripted responses, then repeats a fallback reply
pub(crate) struct MockAgent {
    name: String,
    responses: Mutex<VecDeque<Result<Value, AgentError>>>,
    fallback: Option<Value>,
    delay: Option<Duration>,
    requests: Mutex<Vec<Value>>,
}

impl MockAgent {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            responses: Mutex::new(VecDeque::new()),
            fallback: None,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replying(name: &str, reply: Value) -> Self {
        let mut agent = Self::new(name);
        agent.fallback = Some(reply);
        agent
    }

    pub(crate) fn with_responses(self, responses: Vec<Result<Value, AgentError>>) -> Self {
        *self.responses.lock().unwrap() = responses.into();
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentPort for MockAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, request: &Value) -> Result<Value, AgentError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.responses.lock().unwrap().pop_front();
        match scripted {
            Some(response) => response,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| AgentError::Other("no scripted response".to_string())),
        }
    }
}
