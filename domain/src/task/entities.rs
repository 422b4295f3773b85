//! Task entity

use crate::core::text::{stable_hash, word_set};
use crate::voting::VotingMethod;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Kind of task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    #[default]
    DecisionTask,
    CriticalDecision,
    ImplementationTask,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::DecisionTask => "decision_task",
            TaskKind::CriticalDecision => "critical_decision",
            TaskKind::ImplementationTask => "implementation_task",
        }
    }
}

/// A selectable option of a decision task
///
/// Deserializes from either a bare id string or an `{id, name, description}` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTaskOption")]
pub struct TaskOption {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TaskOption {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTaskOption {
    Id(String),
    Full {
        id: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
}

impl From<RawTaskOption> for TaskOption {
    fn from(raw: RawTaskOption) -> Self {
        match raw {
            RawTaskOption::Id(id) => TaskOption {
                name: id.clone(),
                id,
                description: None,
            },
            RawTaskOption::Full {
                id,
                name,
                description,
            } => TaskOption {
                name: name.unwrap_or_else(|| id.clone()),
                id,
                description,
            },
        }
    }
}

/// A task handed to the team
///
/// Unknown fields survive a JSON round trip through `extra`, since agents and
/// team operations may attach their own keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Task {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: TaskKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<TaskOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criticality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_expertise: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voting_method: Option<VotingMethod>,
    /// Current solution, rewritten by each dialectical iteration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<Value>,
    /// How finely grained the task is (0.0 to 1.0); small values stop recursion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_override: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_kind(mut self, kind: TaskKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_option(mut self, option: TaskOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_options(mut self, options: impl IntoIterator<Item = TaskOption>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_criticality(mut self, criticality: impl Into<String>) -> Self {
        self.criticality = Some(criticality.into());
        self
    }

    pub fn with_required_expertise<I, S>(mut self, expertise: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.required_expertise = Some(
            expertise
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        );
        self
    }

    pub fn with_voting_method(mut self, method: VotingMethod) -> Self {
        self.voting_method = Some(method);
        self
    }

    pub fn with_solution(mut self, solution: Value) -> Self {
        self.solution = Some(solution);
        self
    }

    /// Assign a fresh UUID when the task has no id
    pub fn ensure_id(&mut self) -> &str {
        if self.id.trim().is_empty() {
            self.id = uuid::Uuid::new_v4().to_string();
        }
        &self.id
    }

    pub fn option(&self, id: &str) -> Option<&TaskOption> {
        self.options.iter().find(|o| o.id == id)
    }

    pub fn option_ids(&self) -> Vec<String> {
        self.options.iter().map(|o| o.id.clone()).collect()
    }

    /// Lower-cased words of the title and description
    pub fn keywords(&self) -> BTreeSet<String> {
        let mut text = self.description.clone();
        if let Some(title) = &self.title {
            text.push(' ');
            text.push_str(title);
        }
        word_set(&text)
    }

    /// Short human label: title, otherwise description
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.description)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Stable key for a task, used to index voting history and decisions
///
/// The task id when present; otherwise a hash of the description and option ids,
/// so the same anonymous task always maps to the same key.
pub fn task_key(task: &Task) -> String {
    let id = task.id.trim();
    if !id.is_empty() {
        return id.to_string();
    }
    let mut material = task.description.trim().to_lowercase();
    for option in &task.options {
        material.push('|');
        material.push_str(&option.id);
    }
    format!("task-{:016x}", stable_hash(&material))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_deserializes_mixed_options_and_extra_fields() {
        let task: Task = serde_json::from_value(json!({
            "id": "db",
            "type": "critical_decision",
            "description": "Select the database",
            "options": ["postgres", {"id": "mongo", "name": "MongoDB"}],
            "domain": "data",
            "priority_hint": 3
        }))
        .unwrap();

        assert_eq!(task.kind, TaskKind::CriticalDecision);
        assert_eq!(task.options[0], TaskOption::new("postgres", "postgres"));
        assert_eq!(task.options[1].name, "MongoDB");
        assert_eq!(task.extra["priority_hint"], 3);

        let back = task.to_value();
        assert_eq!(back["type"], "critical_decision");
        assert_eq!(back["priority_hint"], 3);
    }

    #[test]
    fn test_task_key_prefers_id() {
        let task = Task::new("Pick a cache").with_id("cache-choice");
        assert_eq!(task_key(&task), "cache-choice");
    }

    #[test]
    fn test_task_key_is_stable_without_id() {
        let a = Task::new("Pick a cache").with_option(TaskOption::new("redis", "Redis"));
        let b = Task::new("  pick a CACHE ").with_option(TaskOption::new("redis", "Redis"));
        let c = Task::new("Pick a cache").with_option(TaskOption::new("memcached", "Memcached"));

        assert_eq!(task_key(&a), task_key(&b));
        assert_ne!(task_key(&a), task_key(&c));
        assert!(task_key(&a).starts_with("task-"));
    }

    #[test]
    fn test_ensure_id_only_fills_blank() {
        let mut task = Task::new("x");
        let generated = task.ensure_id().to_string();
        assert!(!generated.is_empty());
        assert_eq!(task.ensure_id(), generated);
    }

    #[test]
    fn test_keywords_include_title() {
        let task = Task::new("Design the API").with_title("Gateway");
        let keywords = task.keywords();
        assert!(keywords.contains("api"));
        assert!(keywords.contains("gateway"));
    }
}
