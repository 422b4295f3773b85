//! Memory port
//!
//! Phase-tagged storage used by the coordinator to persist phase results and
//! by the reasoning loop to keep its sequences. Synchronization with the
//! backing store only happens on [`MemoryPort::flush_updates`].

use async_trait::async_trait;
use edrr_domain::Phase;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Flush error: {0}")]
    Flush(String),
}

#[async_trait]
pub trait MemoryPort: Send + Sync {
    /// Store an item under a phase and return its id
    async fn store_with_edrr_phase(
        &self,
        item: Value,
        phase: Phase,
        metadata: Value,
    ) -> Result<String, MemoryError>;

    /// Items stored under `phase` whose metadata contains every field of `query`
    async fn retrieve_with_edrr_phase(
        &self,
        phase: Phase,
        query: &Value,
    ) -> Result<Vec<Value>, MemoryError>;

    async fn flush_updates(&self) -> Result<(), MemoryError>;
}

/// Memory that stores nothing
pub struct NoMemory;

#[async_trait]
impl MemoryPort for NoMemory {
    async fn store_with_edrr_phase(
        &self,
        _item: Value,
        _phase: Phase,
        _metadata: Value,
    ) -> Result<String, MemoryError> {
        Ok(String::new())
    }

    async fn retrieve_with_edrr_phase(
        &self,
        _phase: Phase,
        _query: &Value,
    ) -> Result<Vec<Value>, MemoryError> {
        Ok(Vec::new())
    }

    async fn flush_updates(&self) -> Result<(), MemoryError> {
        Ok(())
    }
}
