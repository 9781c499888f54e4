//! Test: Log Resolution - full ids and prefixes given to `follow`

use crate::helpers::*;
use orchid::{OrchidError, Outcome};

#[tokio::test]
async fn test_follow_by_unique_prefix() {
    let (orchestrator, _dir) = orchestrator(ScriptedLauncher::new(vec![step(&["hi"], 0)])).await;

    let handle = orchestrator.start_run("single").await.unwrap();
    let id = handle.log_id.clone();
    handle.wait().await.unwrap();

    assert_eq!(id.len(), 32);
    let (outcome, lines) = collect(&orchestrator, &id[..12]).await;
    assert_eq!(outcome, Outcome::Finished);
    assert_eq!(lines, vec!["hi"]);
}

#[tokio::test]
async fn test_store_resolves_full_id_exactly() {
    let (orchestrator, _dir) = orchestrator(ScriptedLauncher::new(vec![])).await;
    let store = orchestrator.store();

    let record = store.create("single").await.unwrap();
    assert_eq!(store.resolve(&record.id).await.unwrap(), record.id);
}

#[tokio::test]
async fn test_unmatched_prefix_is_not_found() {
    let (orchestrator, _dir) = orchestrator(ScriptedLauncher::new(vec![])).await;
    orchestrator.store().create("single").await.unwrap();

    // Ids are lowercase hex, so this prefix can never match
    let err = orchestrator.follow("xyz", |_| {}).await.unwrap_err();
    assert!(matches!(err, OrchidError::NotFound(ref p) if p == "xyz"));

    let err = orchestrator.follow("", |_| {}).await.unwrap_err();
    assert!(matches!(err, OrchidError::NotFound(_)));
}
