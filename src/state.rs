//! Shared host state: the global key-value table and its optional snapshot.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. Every
//! value is a string, as the form side expects. When a snapshot path is
//! configured the whole table is rewritten as pretty JSON after each set.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

/// Snapshot I/O failures.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("snapshot {path}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
}

/// Shared application state. Clone is required by Axum.
#[derive(Clone, Default)]
pub struct AppState {
    globals: Arc<RwLock<BTreeMap<String, String>>>,
    snapshot: Option<PathBuf>,
}

impl AppState {
    #[must_use]
    pub fn new(globals: BTreeMap<String, String>, snapshot: Option<PathBuf>) -> Self {
        Self { globals: Arc::new(RwLock::new(globals)), snapshot }
    }

    /// Load the snapshot at `path` if it exists, else start empty.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when the file exists but cannot be read or parsed.
    pub async fn from_snapshot(path: PathBuf) -> Result<Self, SnapshotError> {
        let globals = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| SnapshotError::Json { path: path.clone(), source })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(SnapshotError::Io { path, source }),
        };
        info!(path = %path.display(), globals = globals.len(), "snapshot loaded");
        Ok(Self::new(globals, Some(path)))
    }

    pub async fn get(&self, name: &str) -> Option<String> {
        self.globals.read().await.get(name).cloned()
    }

    /// Store `value` under `name` and rewrite the snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when the snapshot cannot be written. The
    /// in-memory table is updated regardless.
    pub async fn set(&self, name: &str, value: String) -> Result<(), SnapshotError> {
        let mut globals = self.globals.write().await;
        globals.insert(name.to_owned(), value);
        match &self.snapshot {
            Some(path) => write_snapshot(path, &globals).await,
            None => Ok(()),
        }
    }

    pub async fn list(&self) -> BTreeMap<String, String> {
        self.globals.read().await.clone()
    }
}

async fn write_snapshot(path: &Path, globals: &BTreeMap<String, String>) -> Result<(), SnapshotError> {
    let json = serde_json::to_vec_pretty(globals).map_err(|source| SnapshotError::Json { path: path.to_owned(), source })?;
    tokio::fs::write(path, json).await.map_err(|source| SnapshotError::Io { path: path.to_owned(), source })
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
