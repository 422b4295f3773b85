//! Memory adapters

mod in_memory;

pub use in_memory::{InMemoryMemoryStore, StoredItem};
