use std::collections::HashMap;

use qo_core::{JobDefinition, JobStatus, JobStep};
use tempfile::tempdir;

use super::*;

fn crawl_step(start_url: &str) -> JobStep {
    let mut config = HashMap::new();
    config.insert("start_urls".to_string(), serde_json::json!([start_url]));
    JobStep::new("crawl", "crawler_url").config(config)
}

#[tokio::test]
async fn submit_runs_a_single_step_definition_to_completion() {
    let dir = tempdir().unwrap();
    let config = DaemonConfig { data_dir: dir.path().join("state.wal"), concurrency: 2 };
    let daemon = Daemon::start(config).unwrap();

    let definition = JobDefinition::new("crawl-one-page", "web", vec![crawl_step("https://example.com")]);
    let root_id = daemon.submit(definition).await.unwrap();
    let status = daemon.await_completion(root_id).await.unwrap();

    assert_eq!(status, JobStatus::Completed);
    daemon.stop().await;
}

#[tokio::test]
async fn await_completion_rejects_an_unknown_job_id() {
    let dir = tempdir().unwrap();
    let config = DaemonConfig { data_dir: dir.path().join("state.wal"), concurrency: 1 };
    let daemon = Daemon::start(config).unwrap();

    let bogus = qo_core::JobId::new();
    assert!(matches!(daemon.await_completion(bogus).await, Err(DaemonError::UnknownJob(_))));
    daemon.stop().await;
}
