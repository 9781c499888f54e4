//! Test: Live Follow - readers tail a log while the run writes it

use crate::helpers::*;
use orchid::{Outcome, RunStatus};
use std::time::Duration;

#[tokio::test]
async fn test_follow_while_running_sees_every_line() {
    let launcher = ScriptedLauncher::new(vec![
        step(&["a1", "a2", "a3"], 0),
        step(&["b1", "b2"], 0),
        step(&["c1"], 0),
    ])
    .with_line_delay(Duration::from_millis(20));
    let (orchestrator, _dir) = orchestrator(launcher).await;

    let handle = orchestrator.start_run("deploy").await.unwrap();
    let (outcome, lines) = collect(&orchestrator, &handle.log_id).await;

    assert_eq!(outcome, Outcome::Finished);
    assert_eq!(lines, vec!["a1", "a2", "a3", "b1", "b2", "c1"]);
    assert_eq!(handle.wait().await.unwrap().status, RunStatus::Finished);
}

#[tokio::test]
async fn test_concurrent_followers_see_the_same_lines() {
    let launcher = ScriptedLauncher::new(vec![
        step(&["one", "two"], 0),
        step(&["three"], 3),
    ])
    .with_line_delay(Duration::from_millis(15));
    let (orchestrator, _dir) = orchestrator(launcher).await;

    let handle = orchestrator.start_run("deploy").await.unwrap();
    let id = handle.log_id.clone();

    let (first, second) = tokio::join!(collect(&orchestrator, &id), collect(&orchestrator, &id));

    assert_eq!(first, second);
    assert_eq!(first.0, Outcome::Error);
    assert_eq!(first.1, vec!["one", "two", "three"]);
    handle.wait().await.unwrap();
}

#[tokio::test]
async fn test_follow_of_finished_run_returns_immediately() {
    let (orchestrator, _dir) = orchestrator(ScriptedLauncher::new(vec![step(&["done"], 0)])).await;

    let handle = orchestrator.start_run("single").await.unwrap();
    let id = handle.log_id.clone();
    handle.wait().await.unwrap();

    let mut lines = Vec::new();
    let outcome = tokio::time::timeout(
        Duration::from_millis(500),
        orchestrator.follow(&id, |line| lines.push(line.to_string())),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(outcome, Outcome::Finished);
    assert_eq!(lines, vec!["done"]);
}

#[tokio::test]
async fn test_follow_blocks_until_the_run_ends() {
    let launcher = ScriptedLauncher::new(vec![step(&["slow"], 0)])
        .with_line_delay(Duration::from_millis(300));
    let (orchestrator, _dir) = orchestrator(launcher).await;

    let handle = orchestrator.start_run("single").await.unwrap();

    // Cancelling a follower is dropping its future
    let early = tokio::time::timeout(
        Duration::from_millis(50),
        orchestrator.follow(&handle.log_id, |_| {}),
    )
    .await;
    assert!(early.is_err());

    let (outcome, lines) = collect(&orchestrator, &handle.log_id).await;
    assert_eq!(outcome, Outcome::Finished);
    assert_eq!(lines, vec!["slow"]);
    handle.wait().await.unwrap();
}
