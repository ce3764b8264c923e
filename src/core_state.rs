//! Application state shared by every request handler.
//!
//! `CoreState` owns configuration, the chat response engine, and the file
//! store. It holds no database connection: each operation opens its own
//! via `open_db()`, so handlers never contend on a lock.

use std::sync::Arc;

use crate::assistant::{KeywordEngine, ResponseEngine};
use crate::config::AppConfig;
use crate::db;
use crate::storage::FileStore;

pub struct CoreState {
    pub config: AppConfig,
    engine: Arc<dyn ResponseEngine>,
    files: FileStore,
}

impl CoreState {
    /// State with the built-in keyword engine.
    pub fn new(config: AppConfig) -> Self {
        Self::with_engine(config, Arc::new(KeywordEngine::default()))
    }

    /// State with a caller-supplied response engine.
    pub fn with_engine(config: AppConfig, engine: Arc<dyn ResponseEngine>) -> Self {
        let files = FileStore::new(config.uploads_dir(), config.max_upload_bytes);
        Self { config, engine, files }
    }

    /// Create the data and upload directories and apply migrations once, so
    /// the first request does not pay for it and misconfiguration fails fast.
    pub fn prepare(&self) -> Result<(), CoreError> {
        std::fs::create_dir_all(&self.config.data_dir)?;
        std::fs::create_dir_all(self.files.root())?;
        self.open_db()?;
        Ok(())
    }

    /// Open a database connection. Cheap; callers drop it when done.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.config.db_path()).map_err(CoreError::Database)
    }

    pub fn engine(&self) -> &dyn ResponseEngine {
        self.engine.as_ref()
    }

    pub fn files(&self) -> &FileStore {
        &self.files
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Test helpers shared by handler and server tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::time::Duration;

    use super::*;

    /// A state rooted in a fresh temp dir, with fast hashing and a short scan delay.
    pub fn test_state() -> (tempfile::TempDir, Arc<CoreState>) {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            scan_delay: Duration::from_millis(50),
            password_iterations: 1_000,
            ..AppConfig::default()
        };
        let state = CoreState::new(config);
        state.prepare().unwrap();
        (dir, Arc::new(state))
    }
}
