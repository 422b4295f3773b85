//! Use cases for the EDRR engine
//!
//! - [`edrr_coordinator`]: drives a cycle through its four phases
//! - [`voting_engine`]: expertise-weighted votes on critical decisions
//! - [`reasoning_loop`]: iterated thesis / antithesis / synthesis
//! - [`critique_reasoner`] and [`agent_team_operations`]: default
//!   agent-backed implementations of the reasoning and operation ports

pub mod agent_team_operations;
pub mod critique_reasoner;
pub mod edrr_coordinator;
pub mod reasoning_loop;
pub mod voting_engine;

#[cfg(test)]
pub(crate) mod test_support;
