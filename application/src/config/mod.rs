//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`CoordinatorConfig`]: cycle control, recursion limits and peer review
//! - [`VotingParams`]: vote method, abstentions, tie-breaking and timeouts
//! - [`ReasoningLoopParams`]: reasoning loop iterations, seeding and retries

pub mod coordinator_config;
pub mod reasoning_params;
pub mod voting_params;

pub use coordinator_config::{CoordinatorConfig, PeerReviewSettings};
pub use reasoning_params::ReasoningLoopParams;
pub use voting_params::VotingParams;
