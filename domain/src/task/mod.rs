//! Tasks, subtasks and delegation
//!
//! - [`entities::Task`]: the unit of work a cycle or vote operates on
//! - [`subtask::Subtask`]: a decomposed piece of a task with progress tracking
//! - [`delegator::TaskDelegator`]: expertise-based assignment and reassignment

pub mod delegator;
pub mod entities;
pub mod subtask;

pub use delegator::{Assignment, ContributionMetrics, Reassignment, TaskDelegator};
pub use entities::{Task, TaskKind, TaskOption, task_key};
pub use subtask::{Subtask, SubtaskStatus};
