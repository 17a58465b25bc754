// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box integration tests against `qo-daemon`'s public surface only
//! (`submit`/`await_completion`), covering the scenarios named in §8 that
//! span a full run rather than a single component.

use std::collections::HashMap;
use std::time::Duration;

use qo_core::{FailurePolicy, JobDefinition, JobStatus, JobStep};
use qo_daemon::{Daemon, DaemonConfig};
use serial_test::serial;
use tempfile::tempdir;

fn crawl_step(name: &str, start_urls: &[&str]) -> JobStep {
    let mut config = HashMap::new();
    config.insert("start_urls".to_string(), serde_json::json!(start_urls));
    JobStep::new(name, "crawler_url").config(config)
}

async fn start_daemon(concurrency: usize) -> (tempfile::TempDir, Daemon) {
    let dir = tempdir().unwrap();
    let config = DaemonConfig { data_dir: dir.path().join("state.wal"), concurrency };
    let daemon = Daemon::start(config).unwrap();
    (dir, daemon)
}

/// S1: a single seed URL is one work item; the step completes and the run
/// reaches `completed` with no further intervention.
#[tokio::test]
#[serial]
async fn single_seed_url_completes_the_run() {
    let (_dir, daemon) = start_daemon(2).await;
    let definition = JobDefinition::new("single-page", "web", vec![crawl_step("crawl", &["https://example.com/a"])]);

    let root_id = daemon.submit(definition).await.unwrap();
    let status = tokio::time::timeout(Duration::from_secs(5), daemon.await_completion(root_id)).await.unwrap().unwrap();

    assert_eq!(status, JobStatus::Completed);
    daemon.stop().await;
}

/// S2 analog: three seed URLs fan out to three independent queue messages;
/// the orchestrator only reports the step (and therefore the run) complete
/// once every one of them has terminated.
#[tokio::test]
#[serial]
async fn parallel_seed_urls_all_complete_before_the_run_does() {
    let (_dir, daemon) = start_daemon(3).await;
    let definition = JobDefinition::new(
        "three-pages",
        "web",
        vec![crawl_step("crawl", &["https://example.com/a", "https://example.com/b", "https://example.com/c"])],
    );

    let root_id = daemon.submit(definition).await.unwrap();
    let status = tokio::time::timeout(Duration::from_secs(5), daemon.await_completion(root_id)).await.unwrap().unwrap();

    assert_eq!(status, JobStatus::Completed);
    daemon.stop().await;
}

/// A step naming a worker type nothing registers fails that step (and, under
/// the default `Stop` failure policy, the whole run) rather than hanging.
#[tokio::test]
#[serial]
async fn unregistered_worker_type_fails_the_run_instead_of_hanging() {
    let (_dir, daemon) = start_daemon(1).await;
    let definition = JobDefinition::new("bad-step", "web", vec![JobStep::new("noop", "never_registered")]);

    let root_id = daemon.submit(definition).await.unwrap();
    let status = tokio::time::timeout(Duration::from_secs(5), daemon.await_completion(root_id)).await.unwrap().unwrap();

    assert_eq!(status, JobStatus::Failed);
    daemon.stop().await;
}

/// A multi-step run under `FailurePolicy::Continue` still executes every
/// step even though an earlier one failed, and the run's final status
/// reflects that failure rather than masking it.
#[tokio::test]
#[serial]
async fn continue_policy_reaches_every_step_and_still_reports_failure() {
    let (_dir, daemon) = start_daemon(2).await;
    let mut definition = JobDefinition::new(
        "continue-run",
        "web",
        vec![JobStep::new("broken", "never_registered"), crawl_step("fine", &["https://example.com/z"])],
    );
    definition.failure_policy = FailurePolicy::Continue;

    let root_id = daemon.submit(definition).await.unwrap();
    let status = tokio::time::timeout(Duration::from_secs(5), daemon.await_completion(root_id)).await.unwrap().unwrap();

    assert_eq!(status, JobStatus::Failed);
    daemon.stop().await;
}
