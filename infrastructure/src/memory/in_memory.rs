//! Process-local, phase-tagged memory
//!
//! Items are kept in insertion order. Writes are counted as pending until
//! [`MemoryPort::flush_updates`] marks them synchronized.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edrr_application::ports::memory::{MemoryError, MemoryPort};
use edrr_domain::Phase;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

/// One stored item with its phase tag and metadata
#[derive(Debug, Clone, Serialize)]
pub struct StoredItem {
    pub id: String,
    pub phase: Phase,
    pub item: Value,
    pub metadata: Value,
    pub stored_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct StoreState {
    items: Vec<StoredItem>,
    pending: usize,
    flushes: usize,
}

#[derive(Debug, Default)]
pub struct InMemoryMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Every item stored under `phase`, oldest first
    pub async fn items_for(&self, phase: Phase) -> Vec<StoredItem> {
        self.state
            .read()
            .await
            .items
            .iter()
            .filter(|stored| stored.phase == phase)
            .cloned()
            .collect()
    }

    /// Writes since the last flush
    pub async fn pending(&self) -> usize {
        self.state.read().await.pending
    }

    pub async fn flush_count(&self) -> usize {
        self.state.read().await.flushes
    }
}

/// Whether every field of `query` is present in `metadata` with an equal value
///
/// A non-object query matches everything.
fn matches_query(metadata: &Value, query: &Value) -> bool {
    let Some(fields) = query.as_object() else {
        return true;
    };
    fields
        .iter()
        .all(|(key, expected)| metadata.get(key) == Some(expected))
}

#[async_trait]
impl MemoryPort for InMemoryMemoryStore {
    async fn store_with_edrr_phase(
        &self,
        item: Value,
        phase: Phase,
        metadata: Value,
    ) -> Result<String, MemoryError> {
        let id = uuid::Uuid::new_v4().to_string();
        let mut state = self.state.write().await;
        state.items.push(StoredItem {
            id: id.clone(),
            phase,
            item,
            metadata,
            stored_at: Utc::now(),
        });
        state.pending += 1;
        debug!("Stored memory item {} under {}", id, phase);
        Ok(id)
    }

    async fn retrieve_with_edrr_phase(
        &self,
        phase: Phase,
        query: &Value,
    ) -> Result<Vec<Value>, MemoryError> {
        let state = self.state.read().await;
        Ok(state
            .items
            .iter()
            .filter(|stored| stored.phase == phase && matches_query(&stored.metadata, query))
            .map(|stored| stored.item.clone())
            .collect())
    }

    async fn flush_updates(&self) -> Result<(), MemoryError> {
        let mut state = self.state.write().await;
        debug!("Flushing {} pending memory write(s)", state.pending);
        state.pending = 0;
        state.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_retrieve_filters_by_phase_and_metadata() {
        let store = InMemoryMemoryStore::new();
        store
            .store_with_edrr_phase(json!("idea"), Phase::Expand, json!({"cycle_id": "c1"}))
            .await
            .unwrap();
        store
            .store_with_edrr_phase(json!("other"), Phase::Expand, json!({"cycle_id": "c2"}))
            .await
            .unwrap();
        store
            .store_with_edrr_phase(json!("plan"), Phase::Refine, json!({"cycle_id": "c1"}))
            .await
            .unwrap();

        let found = store
            .retrieve_with_edrr_phase(Phase::Expand, &json!({"cycle_id": "c1"}))
            .await
            .unwrap();
        assert_eq!(found, vec![json!("idea")]);

        let all_expand = store
            .retrieve_with_edrr_phase(Phase::Expand, &json!({}))
            .await
            .unwrap();
        assert_eq!(all_expand.len(), 2);
        assert_eq!(store.items_for(Phase::Refine).await.len(), 1);
    }

    #[tokio::test]
    async fn test_flush_resets_pending() {
        let store = InMemoryMemoryStore::new();
        assert!(store.is_empty().await);

        let id = store
            .store_with_edrr_phase(json!({"a": 1}), Phase::Retrospect, Value::Null)
            .await
            .unwrap();
        assert!(!id.is_empty());
        assert_eq!(store.pending().await, 1);

        store.flush_updates().await.unwrap();
        assert_eq!(store.pending().await, 0);
        assert_eq!(store.flush_count().await, 1);
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn test_matches_query_requires_equal_values() {
        let metadata = json!({"type": "phase_result", "revision": 1});
        assert!(matches_query(&metadata, &json!({"type": "phase_result"})));
        assert!(!matches_query(&metadata, &json!({"revision": 2})));
        assert!(!matches_query(&metadata, &json!({"missing": true})));
        assert!(matches_query(&metadata, &Value::Null));
    }
}
