//! Subtask entity

use serde::{Deserialize, Serialize};

/// Lifecycle of a subtask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubtaskStatus {
    #[default]
    Pending,
    Assigned,
    InProgress,
    Completed,
}

impl SubtaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubtaskStatus::Pending => "pending",
            SubtaskStatus::Assigned => "assigned",
            SubtaskStatus::InProgress => "in_progress",
            SubtaskStatus::Completed => "completed",
        }
    }

    /// Progress value → status, for an already assigned subtask
    pub fn from_progress(progress: f64) -> Self {
        if progress >= 1.0 {
            SubtaskStatus::Completed
        } else if progress > 0.0 {
            SubtaskStatus::InProgress
        } else {
            SubtaskStatus::Assigned
        }
    }
}

/// A decomposed piece of a task
///
/// Subtasks refer to their parent by id rather than holding a reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub primary_expertise: String,
    /// Higher values are more urgent
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub status: SubtaskStatus,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl Subtask {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        primary_expertise: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            primary_expertise: primary_expertise.into().trim().to_lowercase(),
            priority: 0,
            status: SubtaskStatus::Pending,
            assigned_to: None,
            parent_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn is_open(&self) -> bool {
        self.status != SubtaskStatus::Completed
    }
}
