//! Agent domain
//!
//! Agents are the members of the team. Their mutable coordination state
//! (current role, Primus rotation) lives on the [`roster::TeamRoster`] that
//! owns them, so every mutation goes through an explicit `&mut` borrow.

pub mod entities;
pub mod roster;

pub use entities::Agent;
pub use roster::{RoleHistoryEntry, TeamRoster};
