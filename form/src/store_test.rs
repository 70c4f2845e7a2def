use futures::executor::block_on;

use super::*;

/// Rejects every write to `locked`.
struct LockedKeyStore {
    inner: MemoryStore,
}

#[async_trait(?Send)]
impl RemoteStore for LockedKeyStore {
    async fn get_value(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get_value(key).await
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if key == "locked" {
            return Err(StoreError::Rejected { key: key.into(), reason: "read only".into() });
        }
        self.inner.set_value(key, value).await
    }
}

#[test]
fn memory_store_reads_seeded_entries() {
    let store: MemoryStore = [("color", "red")].into_iter().collect();
    assert_eq!(block_on(store.get_value("color")), Ok(Some("red".into())));
    assert_eq!(block_on(store.get_value("missing")), Ok(None));
    assert!(store.writes().is_empty());
}

#[test]
fn memory_store_logs_writes_in_order() {
    let store = MemoryStore::new();
    block_on(async {
        store.set_value("a", "1").await.expect("set");
        store.set_value("b", "2").await.expect("set");
        store.set_value("a", "3").await.expect("set");
    });
    assert_eq!(store.writes(), vec![("a".into(), "1".into()), ("b".into(), "2".into()), ("a".into(), "3".into())]);
    assert_eq!(store.get("a").as_deref(), Some("3"));
}

#[test]
fn persist_queue_encodes_wire_strings() {
    let (queue, rx) = PersistQueue::channel();
    queue.persist("alertInterval", &Value::Number(4.0));
    queue.persist("debug", &Value::Bool(true));
    drop(queue);

    let store = MemoryStore::new();
    let written = block_on(drain_persist_queue(rx, &store));
    assert_eq!(written, 2);
    assert_eq!(store.writes(), vec![("alertInterval".into(), "4".into()), ("debug".into(), "true".into())]);
}

#[test]
fn drain_preserves_per_key_order() {
    let (queue, rx) = PersistQueue::channel();
    for step in 1..=5 {
        queue.persist("level", &Value::Number(f64::from(step)));
    }
    queue.close();

    let store = MemoryStore::new();
    block_on(drain_persist_queue(rx, &store));
    let levels: Vec<String> = store.writes().into_iter().map(|(_, value)| value).collect();
    assert_eq!(levels, vec!["1", "2", "3", "4", "5"]);
    assert_eq!(store.get("level").as_deref(), Some("5"));
}

#[test]
fn drain_skips_failed_writes() {
    let (queue, rx) = PersistQueue::channel();
    queue.persist("locked", &Value::from("x"));
    queue.persist("open", &Value::from("y"));
    drop(queue);

    let store = LockedKeyStore { inner: MemoryStore::new() };
    let written = block_on(drain_persist_queue(rx, &store));
    assert_eq!(written, 1);
    assert_eq!(store.inner.writes(), vec![("open".into(), "y".into())]);
}

#[test]
fn persist_after_close_is_dropped() {
    let (queue, rx) = PersistQueue::channel();
    queue.close();
    queue.persist("late", &Value::from("x"));

    let store = MemoryStore::new();
    assert_eq!(block_on(drain_persist_queue(rx, &store)), 0);
}
