//! Run store
//!
//! Durable persistence of [`RunRecord`]s keyed by run id. The orchestrator
//! only talks to the [`RunStore`] trait, so the backing store can be swapped
//! without touching the state machine.
//!
//! # Example
//!
//! ```rust,ignore
//! use jockey::runs::{FileRunStore, RunStore};
//!
//! let store = FileRunStore::open("./runs").await?;
//! let run = store.create().await?;
//! let loaded = store.load(&run.run_id).await?;
//! assert_eq!(loaded.map(|r| r.status), Some(run.status));
//! ```

pub mod file;
pub mod memory;

pub use file::FileRunStore;
pub use memory::MemoryRunStore;

use crate::types::{Result, RunRecord};
use crate::utils::toml_config::{StorageBackend, StorageConfig};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Persistence contract for run records.
///
/// `save` replaces the stored record atomically: a reader sees either the
/// previous version or the new one, never a mix.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Allocate a fresh run id and persist a `pending` record for it.
    async fn create(&self) -> Result<RunRecord> {
        let run = RunRecord::new(Uuid::new_v4().to_string());
        self.save(&run).await?;
        Ok(run)
    }

    /// Persist the full current state of `run`.
    async fn save(&self, run: &RunRecord) -> Result<()>;

    /// Load a run, or `None` if no run with this id exists.
    async fn load(&self, run_id: &str) -> Result<Option<RunRecord>>;
}

/// Build the run store selected by configuration.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn RunStore>> {
    match config.backend {
        StorageBackend::File => Ok(Arc::new(FileRunStore::open(&config.runs_dir).await?)),
        StorageBackend::Memory => Ok(Arc::new(MemoryRunStore::new())),
    }
}
