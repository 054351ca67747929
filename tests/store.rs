//! Tests for persisting and restoring execution state.
mod common;
use common::*;
use keiro::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::sync::Arc;

fn advanced_engine() -> ExecutionEngine {
    let mut engine = started_engine(create_diamond_flow(), None);
    engine
        .submit_stage_values(&raw(&[("customer", json!("ACME")), ("amount", json!(99.5))]))
        .unwrap();
    engine
}

#[test]
fn test_file_store_missing_file_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSnapshotStore::new(dir.path().join("run.state"));
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn test_file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.state");
    let mut store = FileSnapshotStore::new(&path);
    let engine = advanced_engine();

    store.save(engine.state()).unwrap();

    assert!(path.exists());
    assert!(!dir.path().join("run.state.tmp").exists());
    assert_eq!(store.load().unwrap().as_ref(), Some(engine.state()));
}

#[test]
fn test_file_store_overwrites_previous_state() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileSnapshotStore::new(dir.path().join("run.state"));

    let mut engine = advanced_engine();
    store.save(engine.state()).unwrap();
    engine.reset();
    store.save(engine.state()).unwrap();

    assert_eq!(store.load().unwrap(), Some(ExecutionState::new()));
}

#[test]
fn test_file_store_rejects_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.state");
    fs::write(&path, [0xffu8; 3]).unwrap();

    let store = FileSnapshotStore::new(&path);
    assert!(matches!(store.load(), Err(StoreError::Decode(_))));
}

#[test]
fn test_file_store_reports_io_errors() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileSnapshotStore::new(dir.path().join("missing").join("run.state"));

    match store.save(&ExecutionState::new()) {
        Err(StoreError::Io { path, .. }) => assert!(path.ends_with("run.state")),
        other => panic!("expected an I/O error, got {:?}", other),
    }
}

#[test]
fn test_file_store_path_with_tmp_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.tmp");
    let mut store = FileSnapshotStore::new(&path);
    let engine = advanced_engine();

    store.save(engine.state()).unwrap();

    assert!(!dir.path().join("run.tmp.tmp").exists());
    assert_eq!(store.load().unwrap().as_ref(), Some(engine.state()));
}

#[test]
fn test_file_store_failed_save_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.state");
    // A directory in place of the state file makes the final rename fail.
    fs::create_dir(&path).unwrap();
    let mut store = FileSnapshotStore::new(&path);

    assert!(matches!(
        store.save(&ExecutionState::new()),
        Err(StoreError::Io { .. })
    ));
    assert!(!dir.path().join("run.state.tmp").exists());
    assert!(path.is_dir());
}

#[test]
fn test_memory_store_round_trip() {
    let mut store = MemorySnapshotStore::new();
    assert_eq!(store.load().unwrap(), None);

    let engine = advanced_engine();
    store.save(engine.state()).unwrap();
    assert_eq!(store.load().unwrap().as_ref(), Some(engine.state()));
}

#[test]
fn test_state_bytes_round_trip_keeps_stall() {
    let mut engine = started_engine(create_loop_flow(), Some("review"));
    engine
        .submit_stage_values(&raw(&[("decision", json!("maybe"))]))
        .unwrap();

    let bytes = engine.state().to_bytes().unwrap();
    let decoded = ExecutionState::from_bytes(&bytes).unwrap();

    assert_eq!(&decoded, engine.state());
    assert_eq!(
        decoded.status,
        ExecutionStatus::Stalled(StallReason::NoMatchingTransition)
    );
}

#[test]
fn test_resume_from_saved_state() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileSnapshotStore::new(dir.path().join("run.state"));
    let graph = build(create_diamond_flow());

    let mut first = ExecutionEngine::new(Arc::clone(&graph));
    first.start(None).unwrap();
    first
        .submit_stage_values(&raw(&[("customer", json!("ACME")), ("amount", json!(1200))]))
        .unwrap();
    first
        .submit_stage_values(&raw(&[("score", json!(700))]))
        .unwrap();
    store.save(first.state()).unwrap();
    drop(first);

    let mut resumed = ExecutionEngine::new(graph);
    resumed.restore(store.load().unwrap().unwrap()).unwrap();

    assert_eq!(resumed.current_stage_id(), Some("bottom"));
    let form = resumed.current_form().unwrap();
    assert_eq!(form.values.get("amount"), Some(&Value::Number(1200.0)));

    let outcome = resumed
        .submit_stage_values(&raw(&[("amount", json!(1200)), ("result", json!("approved"))]))
        .unwrap();
    assert_eq!(
        outcome,
        StepOutcome::Completed {
            stage_id: "bottom".to_string()
        }
    );
}

#[test]
fn test_saved_state_must_fit_graph() {
    let mut store = MemorySnapshotStore::new();
    store.save(advanced_engine().state()).unwrap();

    let mut engine = ExecutionEngine::new(build(create_review_flow()));
    let err = engine.restore(store.load().unwrap().unwrap()).unwrap_err();
    assert!(matches!(err, ExecutionError::UnknownStage(_)));
    assert_eq!(engine.status(), &ExecutionStatus::NotStarted);
}
