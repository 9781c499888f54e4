//! Test: Success Chain - every step exits 0

use crate::helpers::*;
use orchid::{Invocation, Outcome, RunStatus};

#[tokio::test]
async fn test_all_steps_succeed() {
    let launcher = ScriptedLauncher::new(vec![
        step(&["compiling", "built"], 0),
        step(&["deployed v2"], 0),
        step(&["notified"], 0),
    ]);
    let (orchestrator, _dir) = orchestrator(launcher).await;

    let handle = orchestrator.start_run("deploy").await.unwrap();
    let log_id = handle.log_id.clone();
    let record = handle.wait().await.unwrap();

    assert_eq!(record.status, RunStatus::Finished);
    assert!(record.end_time >= record.start_time);

    let (outcome, lines) = collect(&orchestrator, &log_id).await;
    assert_eq!(outcome, Outcome::Finished);
    assert_eq!(lines, vec!["compiling", "built", "deployed v2", "notified"]);
}

#[tokio::test]
async fn test_steps_dispatch_local_and_remote() {
    let launcher = ScriptedLauncher::new(vec![step(&[], 0), step(&[], 0), step(&[], 0)]);
    let spawned = launcher.spawned.clone();
    let (orchestrator, dir) = orchestrator(launcher).await;

    orchestrator.start_run("deploy").await.unwrap().wait().await.unwrap();

    let spawned = spawned.lock().unwrap();
    assert_eq!(spawned.len(), 3);
    assert_eq!(spawned[0], Invocation::new("build.sh"));
    assert_eq!(spawned[2], Invocation::new("notify.sh"));

    let remote = &spawned[1];
    assert_eq!(remote.program, "ssh");
    let key = dir.path().join("keys").join("web1.pem");
    assert!(remote.args.contains(&key.display().to_string()));
    assert!(remote.args.contains(&"deploy@10.0.0.5".to_string()));
    assert_eq!(remote.args.last().unwrap(), "deploy.sh v2 --force");
}

#[tokio::test]
async fn test_records_are_listed_oldest_first() {
    let launcher = ScriptedLauncher::new(vec![step(&["one"], 0), step(&["two"], 0)]);
    let (orchestrator, _dir) = orchestrator(launcher).await;

    let first = orchestrator.start_run("single").await.unwrap();
    let first_id = first.log_id.clone();
    first.wait().await.unwrap();

    let second = orchestrator.start_run("single").await.unwrap();
    let second_id = second.log_id.clone();
    second.wait().await.unwrap();

    let ids: Vec<String> = orchestrator
        .logs()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![first_id, second_id]);
}
