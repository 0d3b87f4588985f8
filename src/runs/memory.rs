//! In-memory run store for tests and embedding.

use super::RunStore;
use crate::types::{Result, RunRecord};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Keeps cloned run records in a map. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryRunStore {
    runs: RwLock<HashMap<String, RunRecord>>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored runs.
    pub fn len(&self) -> usize {
        self.runs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.read().is_empty()
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn save(&self, run: &RunRecord) -> Result<()> {
        self.runs.write().insert(run.run_id.clone(), run.clone());
        Ok(())
    }

    async fn load(&self, run_id: &str) -> Result<Option<RunRecord>> {
        Ok(self.runs.read().get(run_id).cloned())
    }
}
