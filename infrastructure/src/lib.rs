//! Infrastructure layer for edrr-quorum
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod agents;
pub mod config;
pub mod logging;
pub mod memory;
pub mod review;

// Re-export commonly used types
pub use agents::ScriptedAgent;
pub use config::{ConfigLoader, FileConfig, FileTeamAgent};
pub use logging::JsonlEventLogger;
pub use memory::InMemoryMemoryStore;
pub use review::AutoApprovePeerReview;
