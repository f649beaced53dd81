//! Durable key-value snapshots for in-memory stores.
//!
//! A [`PersistedStore`] owns one piece of state identified by a store id. It
//! reads a snapshot for that id when opened and writes the full state back
//! after every mutation. Storage problems never surface to callers: a missing
//! or broken snapshot means "start from the default", a failed write is logged.

mod file;
mod memory;

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use file::{default_dir, FileSnapshotRepository};
pub use memory::MemorySnapshotRepository;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid store id: {0:?}")]
    InvalidId(String),

    #[error("Could not determine data directory")]
    NoDataDir,
}

/// Durable medium holding one serialized snapshot per store id.
pub trait SnapshotRepository: Send + Sync {
    /// Read the raw snapshot for `store_id`, `None` if nothing was saved yet.
    fn load(&self, store_id: &str) -> Result<Option<String>, StoreError>;

    /// Replace the snapshot for `store_id`.
    fn save(&self, store_id: &str, snapshot: &str) -> Result<(), StoreError>;
}

/// State of type `S` mirrored to a [`SnapshotRepository`].
pub struct PersistedStore<S> {
    id: String,
    state: Mutex<S>,
    repository: Arc<dyn SnapshotRepository>,
}

impl<S> PersistedStore<S>
where
    S: Serialize + DeserializeOwned + Default,
{
    /// Open the store, rehydrating it from any snapshot saved under `id`.
    pub fn open(id: impl Into<String>, repository: Arc<dyn SnapshotRepository>) -> Self {
        let id = id.into();
        let state = rehydrate::<S>(&id, repository.as_ref());
        Self {
            id,
            state: Mutex::new(state),
            repository,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run `f` against the current state.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.lock())
    }

    /// Mutate the state and write the resulting snapshot.
    ///
    /// The write happens before the lock is released, so snapshots of one
    /// store are saved in mutation order.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut state = self.lock();
        let result = f(&mut state);
        self.persist(&state);
        result
    }

    fn persist(&self, state: &S) {
        let written = serde_json::to_string(state)
            .map_err(StoreError::from)
            .and_then(|snapshot| self.repository.save(&self.id, &snapshot));

        if let Err(e) = written {
            tracing::warn!(store = %self.id, "Failed to persist snapshot: {}", e);
        }
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        // A panic inside a mutation leaves the state as it was last written.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S> std::fmt::Debug for PersistedStore<S>
where
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedStore")
            .field("id", &self.id)
            .field("state", &*self.state.lock().unwrap_or_else(|p| p.into_inner()))
            .finish_non_exhaustive()
    }
}

/// Build the initial state: the default, with the saved snapshot's top-level
/// keys patched over it.
fn rehydrate<S>(id: &str, repository: &dyn SnapshotRepository) -> S
where
    S: Serialize + DeserializeOwned + Default,
{
    let raw = match repository.load(id) {
        Ok(Some(raw)) => raw,
        Ok(None) => return S::default(),
        Err(e) => {
            tracing::warn!(store = %id, "Snapshot unavailable, using defaults: {}", e);
            return S::default();
        }
    };

    match patch_default::<S>(&raw) {
        Ok(state) => {
            tracing::debug!(store = %id, "Rehydrated from snapshot");
            state
        }
        Err(e) => {
            tracing::warn!(store = %id, "Ignoring malformed snapshot: {}", e);
            S::default()
        }
    }
}

fn patch_default<S>(raw: &str) -> Result<S, StoreError>
where
    S: Serialize + DeserializeOwned + Default,
{
    let Value::Object(patch) = serde_json::from_str::<Value>(raw)? else {
        return Err(StoreError::Serialize(serde::de::Error::custom(
            "snapshot is not a JSON object",
        )));
    };

    let mut merged = serde_json::to_value(S::default())?;
    if let Value::Object(ref mut fields) = merged {
        fields.extend(patch);
    }

    Ok(serde_json::from_value(merged)?)
}
