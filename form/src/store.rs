//! Remote key-value store seam and change sinks.
//!
//! The form never talks to a transport directly. Reads go through
//! [`RemoteStore`]; user edits go through a [`ChangeSink`], which is either a
//! [`PersistQueue`] feeding a store or the generator-mode query sink.

use std::cell::RefCell;
use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::StreamExt;
use futures::channel::mpsc;
use tracing::{debug, warn};

use crate::value::Value;

/// Store-side failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("store rejected `{key}`: {reason}")]
    Rejected { key: String, reason: String },
    #[error("store connection closed")]
    Closed,
}

/// Asynchronous key-value store holding wire strings.
///
/// A missing key is `Ok(None)`, never an error.
#[async_trait(?Send)]
pub trait RemoteStore {
    async fn get_value(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set_value(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-process store with a write log.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
    writes: RefCell<Vec<(String, String)>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry without recording a write.
    pub fn insert(&self, key: &str, value: &str) {
        self.entries.borrow_mut().insert(key.to_owned(), value.to_owned());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    /// Every `set_value` call, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.borrow().clone()
    }

    /// Current contents, sorted by key.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.borrow().clone()
    }
}

impl<K, V> FromIterator<(K, V)> for MemoryStore
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(entries: I) -> Self {
        let entries = entries.into_iter().map(|(key, value)| (key.into(), value.into())).collect();
        Self { entries: RefCell::new(entries), writes: RefCell::new(Vec::new()) }
    }
}

#[async_trait(?Send)]
impl RemoteStore for MemoryStore {
    async fn get_value(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get(key))
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.writes.borrow_mut().push((key.to_owned(), value.to_owned()));
        self.entries.borrow_mut().insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

// =============================================================================
// SINKS
// =============================================================================

/// Receives committed user edits, keyed by option name.
pub trait ChangeSink {
    fn persist(&self, key: &str, value: &Value);
}

/// One queued write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistRequest {
    pub key: String,
    /// Wire string of the committed value.
    pub value: String,
}

/// Receiving half of a [`PersistQueue`].
pub type PersistReceiver = mpsc::UnboundedReceiver<PersistRequest>;

/// Fire-and-forget persistence: edits are queued and drained in order.
#[derive(Debug, Clone)]
pub struct PersistQueue {
    tx: mpsc::UnboundedSender<PersistRequest>,
}

impl PersistQueue {
    /// Create a queue and the receiver [`drain_persist_queue`] consumes.
    #[must_use]
    pub fn channel() -> (Self, PersistReceiver) {
        let (tx, rx) = mpsc::unbounded();
        (Self { tx }, rx)
    }

    /// Stop accepting requests; the drain finishes once the backlog is written.
    pub fn close(&self) {
        self.tx.close_channel();
    }
}

impl ChangeSink for PersistQueue {
    fn persist(&self, key: &str, value: &Value) {
        let request = PersistRequest { key: key.to_owned(), value: value.to_wire() };
        if let Err(e) = self.tx.unbounded_send(request) {
            warn!(key, error = %e, "persist dropped; queue closed");
        }
    }
}

/// Forward queued writes to `store` one at a time, in arrival order.
///
/// Failures are logged and skipped. Returns the number of successful writes
/// once every sender is dropped or closed.
pub async fn drain_persist_queue<S>(mut rx: PersistReceiver, store: &S) -> usize
where
    S: RemoteStore + ?Sized,
{
    let mut written = 0;
    while let Some(request) = rx.next().await {
        match store.set_value(&request.key, &request.value).await {
            Ok(()) => {
                debug!(key = %request.key, value = %request.value, "persisted");
                written += 1;
            }
            Err(e) => warn!(key = %request.key, error = %e, "persist failed"),
        }
    }
    written
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
