//! Agent adapters

mod scripted;

pub use scripted::ScriptedAgent;
