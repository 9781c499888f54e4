//! Test: Failure Handling - fail-fast and errors before a run exists

use crate::helpers::*;
use orchid::core::{EntryKind, ERROR_TRAILER};
use orchid::{OrchidError, Outcome, RunStatus};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_failing_step_stops_the_pipeline() {
    let launcher = ScriptedLauncher::new(vec![
        step(&["built"], 0),
        step(&["connection refused"], 255),
        step(&["should never run"], 0),
    ]);
    let spawned = launcher.spawned.clone();
    let (orchestrator, _dir) = orchestrator(launcher).await;

    let handle = orchestrator.start_run("deploy").await.unwrap();
    let log_id = handle.log_id.clone();

    // A failed step is recorded in the run, not returned as an error
    let record = handle.wait().await.unwrap();
    assert_eq!(record.status, RunStatus::Error);
    assert_eq!(spawned.lock().unwrap().len(), 2);

    let (outcome, lines) = collect(&orchestrator, &log_id).await;
    assert_eq!(outcome, Outcome::Error);
    assert_eq!(lines, vec!["built", "connection refused"]);

    let content = std::fs::read_to_string(orchestrator.store().log_path(&log_id)).unwrap();
    assert!(content.ends_with(&format!("{}\n", ERROR_TRAILER)));
    assert_eq!(content.matches(ERROR_TRAILER).count(), 1);
}

#[tokio::test]
async fn test_launch_failure_ends_run_with_error() {
    let (orchestrator, _dir) = orchestrator(ScriptedLauncher::new(vec![])).await;

    let handle = orchestrator.start_run("single").await.unwrap();
    let log_id = handle.log_id.clone();
    assert_eq!(handle.wait().await.unwrap().status, RunStatus::Error);

    let (outcome, lines) = collect(&orchestrator, &log_id).await;
    assert_eq!(outcome, Outcome::Error);
    assert!(lines.is_empty());
}

#[tokio::test]
async fn test_unknown_job_creates_nothing() {
    let launcher = ScriptedLauncher::new(vec![]);
    let spawned = launcher.spawned.clone();
    let (orchestrator, _dir) = orchestrator(launcher).await;

    let err = orchestrator.start_run("ghost").await.err().unwrap();
    assert!(matches!(err, OrchidError::Lookup { kind: EntryKind::Job, ref id } if id == "ghost"));

    assert!(orchestrator.logs().await.unwrap().is_empty());
    assert_eq!(std::fs::read_dir(orchestrator.store().logs_dir()).unwrap().count(), 0);
    assert!(spawned.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_machine_in_job_creates_nothing() {
    let (orchestrator, _dir) = orchestrator(ScriptedLauncher::new(vec![])).await;

    let err = orchestrator.start_run("stray").await.err().unwrap();
    assert!(matches!(err, OrchidError::Lookup { kind: EntryKind::Machine, .. }));
    assert!(orchestrator.logs().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_broken_record_store_still_ends_the_run_visibly() {
    let launcher = ScriptedLauncher::new(vec![step(&["never"], 0)]);
    let spawned = launcher.spawned.clone();
    let (orchestrator, _dir) =
        orchestrator_with_records(launcher, Arc::new(FailingUpdates::default())).await;

    let handle = orchestrator.start_run("single").await.unwrap();
    let log_id = handle.log_id.clone();

    let outcome = tokio::time::timeout(Duration::from_secs(5), orchestrator.watch(handle, |_| {}))
        .await
        .expect("watching a broken run should end")
        .unwrap();
    assert_eq!(outcome, Outcome::Error);
    assert!(spawned.lock().unwrap().is_empty());

    let content = std::fs::read_to_string(orchestrator.store().log_path(&log_id)).unwrap();
    assert_eq!(content, format!("{}\n", ERROR_TRAILER));
}
