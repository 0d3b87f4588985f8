//! File-per-run JSON store.
//!
//! Layout: `<runs_dir>/<run_id>.json`, pretty-printed. Every save goes
//! through [`write_atomic`], so a crash between saves leaves either the old
//! or the new record on disk.

use super::RunStore;
use crate::types::{AppError, Result, RunRecord};
use crate::utils::fs::write_atomic;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Run store backed by one JSON file per run.
pub struct FileRunStore {
    runs_dir: PathBuf,
    /// Per-run write locks; entries are dropped once no save holds them.
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl FileRunStore {
    /// Open (and create if needed) a store rooted at `runs_dir`.
    pub async fn open(runs_dir: impl AsRef<Path>) -> Result<Self> {
        let runs_dir = runs_dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&runs_dir).await.map_err(|e| {
            AppError::Persistence(format!(
                "Failed to create runs directory {}: {}",
                runs_dir.display(),
                e
            ))
        })?;
        Ok(Self {
            runs_dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn runs_dir(&self) -> &Path {
        &self.runs_dir
    }

    /// Path of the JSON file for `run_id`, or `None` unless the id is a UUID
    /// in lowercase hyphenated form, so each run has exactly one file name.
    pub fn run_path(&self, run_id: &str) -> Option<PathBuf> {
        Uuid::parse_str(run_id)
            .ok()
            .filter(|uuid| uuid.hyphenated().to_string() == run_id)
            .map(|_| self.runs_dir.join(format!("{}.json", run_id)))
    }

    fn lock_for(&self, run_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .entry(run_id.to_string())
            .or_default()
            .clone()
    }

    fn release_lock(&self, run_id: &str) {
        let mut locks = self.locks.lock();
        if locks
            .get(run_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(run_id);
        }
    }
}

#[async_trait]
impl RunStore for FileRunStore {
    async fn save(&self, run: &RunRecord) -> Result<()> {
        let path = self.run_path(&run.run_id).ok_or_else(|| {
            AppError::InvalidInput(format!("run id '{}' is not a valid UUID", run.run_id))
        })?;
        let json = serde_json::to_vec_pretty(run).map_err(|e| {
            AppError::Persistence(format!("Failed to serialize run {}: {}", run.run_id, e))
        })?;

        let lock = self.lock_for(&run.run_id);
        let outcome = {
            let _guard = lock.lock().await;
            write_atomic(&path, &json).await
        };
        drop(lock);
        self.release_lock(&run.run_id);

        outcome.map_err(|e| {
            AppError::Persistence(format!("Failed to write run {}: {}", run.run_id, e))
        })?;
        debug!(run_id = %run.run_id, status = %run.status, "Saved run");
        Ok(())
    }

    async fn load(&self, run_id: &str) -> Result<Option<RunRecord>> {
        let Some(path) = self.run_path(run_id) else {
            return Ok(None);
        };

        let lock = self.lock_for(run_id);
        let content = {
            let _guard = lock.lock().await;
            tokio::fs::read_to_string(&path).await
        };
        drop(lock);
        self.release_lock(run_id);

        let content = match content {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::Persistence(format!(
                    "Failed to read run {}: {}",
                    run_id, e
                )))
            }
        };

        serde_json::from_str(&content).map(Some).map_err(|e| {
            AppError::Persistence(format!("Run {} is unreadable: {}", run_id, e))
        })
    }
}
