use super::*;

fn scratch_path() -> PathBuf {
    std::env::temp_dir().join(format!("confighost-{}.json", uuid::Uuid::new_v4()))
}

#[tokio::test]
async fn set_then_get() {
    let state = AppState::default();
    assert_eq!(state.get("debug").await, None);
    state.set("debug", "true".into()).await.expect("set");
    assert_eq!(state.get("debug").await.as_deref(), Some("true"));
}

#[tokio::test]
async fn list_is_sorted_by_name() {
    let state = AppState::default();
    state.set("b", "2".into()).await.expect("set");
    state.set("a", "1".into()).await.expect("set");
    let names: Vec<String> = state.list().await.into_keys().collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[tokio::test]
async fn missing_snapshot_starts_empty() {
    let state = AppState::from_snapshot(scratch_path()).await.expect("state");
    assert!(state.list().await.is_empty());
}

#[tokio::test]
async fn snapshot_survives_restart() {
    let path = scratch_path();
    let state = AppState::from_snapshot(path.clone()).await.expect("state");
    state.set("alertInterval", "4".into()).await.expect("set");

    let restarted = AppState::from_snapshot(path.clone()).await.expect("restart");
    assert_eq!(restarted.get("alertInterval").await.as_deref(), Some("4"));
    tokio::fs::remove_file(&path).await.expect("cleanup");
}

#[tokio::test]
async fn corrupt_snapshot_is_an_error() {
    let path = scratch_path();
    tokio::fs::write(&path, b"not json").await.expect("write");
    let result = AppState::from_snapshot(path.clone()).await;
    assert!(matches!(result, Err(SnapshotError::Json { .. })));
    tokio::fs::remove_file(&path).await.expect("cleanup");
}
