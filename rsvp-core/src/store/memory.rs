use std::collections::HashMap;
use std::sync::Mutex;

use super::{SnapshotRepository, StoreError};

/// In-process snapshot storage. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemorySnapshotRepository {
    entries: Mutex<HashMap<String, Entry>>,
}

#[derive(Debug, Default)]
struct Entry {
    snapshot: String,
    writes: usize,
}

impl MemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw snapshot without counting it as a write.
    pub fn insert(&self, store_id: &str, snapshot: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.entry(store_id.to_string()).or_default().snapshot = snapshot.to_string();
    }

    pub fn get(&self, store_id: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.get(store_id).map(|e| e.snapshot.clone())
    }

    /// Number of times `save` was called for `store_id`.
    pub fn writes(&self, store_id: &str) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.get(store_id).map_or(0, |e| e.writes)
    }
}

impl SnapshotRepository for MemorySnapshotRepository {
    fn load(&self, store_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get(store_id))
    }

    fn save(&self, store_id: &str, snapshot: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        let entry = entries.entry(store_id.to_string()).or_default();
        entry.snapshot = snapshot.to_string();
        entry.writes += 1;
        Ok(())
    }
}
