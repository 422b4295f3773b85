//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod agent;
pub mod code_analysis;
pub mod dialectical;
pub mod event_logger;
pub mod memory;
pub mod peer_review;
pub mod progress;
pub mod seed;
pub mod team_operations;
