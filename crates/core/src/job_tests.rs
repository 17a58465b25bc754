// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;
use yare::parameterized;

#[test]
fn new_root_is_its_own_parent() {
    let clock = FakeClock::new();
    let job = Job::new_root("run-fundamentals", "fundamentals_ingest", &clock);
    assert!(job.is_root());
    assert_eq!(job.phase, JobPhase::Execution);
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.depth, 0);
}

#[test]
fn new_child_links_to_root_and_discoverer() {
    let clock = FakeClock::new();
    let root = Job::new_root("run", "fundamentals_ingest", &clock);
    let step = Job::new_child("step-1", "fundamentals_ingest", JobPhase::Step, root.id, None, 1, &clock);
    assert!(!step.is_root());
    assert_eq!(step.parent_id, root.id);
    assert!(step.discovered_by.is_none());

    let leaf = Job::new_child("crawl:https://x", "crawler_url", JobPhase::Leaf, root.id, Some(step.id), 2, &clock);
    assert_eq!(leaf.discovered_by, Some(step.id));
    assert_eq!(leaf.depth, 2);
}

#[parameterized(
    pending_to_running = { JobStatus::Pending, JobStatus::Running, true },
    running_to_completed = { JobStatus::Running, JobStatus::Completed, true },
    running_to_failed = { JobStatus::Running, JobStatus::Failed, true },
    pending_to_completed_skips_running = { JobStatus::Pending, JobStatus::Completed, true },
    running_back_to_pending_rejected = { JobStatus::Running, JobStatus::Pending, false },
    completed_to_running_rejected = { JobStatus::Completed, JobStatus::Running, false },
    completed_to_completed_is_noop = { JobStatus::Completed, JobStatus::Completed, true },
    failed_to_completed_rejected = { JobStatus::Failed, JobStatus::Completed, false },
)]
fn transition_validation(from: JobStatus, to: JobStatus, expect_ok: bool) {
    assert_eq!(from.validate_transition(to).is_ok(), expect_ok);
}

#[test]
fn terminal_statuses_report_terminal() {
    assert!(JobStatus::Completed.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
    assert!(JobStatus::Cancelled.is_terminal());
    assert!(!JobStatus::Pending.is_terminal());
    assert!(!JobStatus::Running.is_terminal());
}

#[test]
fn builder_produces_leaf_job_with_defaults() {
    let job = Job::builder().name("leaf-job").worker_type("crawler_url").build();
    assert_eq!(job.name, "leaf-job");
    assert_eq!(job.worker_type, "crawler_url");
    assert_eq!(job.phase, JobPhase::Leaf);
    assert_eq!(job.status, JobStatus::Pending);
    assert!(job.discovered_by.is_none());
}

#[test]
fn builder_sets_payload_and_discovered_by() {
    let parent = JobId::new();
    let job = Job::builder()
        .discovered_by(parent)
        .payload(serde_json::json!({"url": "https://example.com"}))
        .build();
    assert_eq!(job.discovered_by, Some(parent));
    assert_eq!(job.payload.unwrap()["url"], "https://example.com");
}

#[test]
fn serde_roundtrip_omits_absent_optionals() {
    let clock = FakeClock::new();
    let job = Job::new_root("run", "fundamentals_ingest", &clock);
    let json = serde_json::to_string(&job).unwrap();
    assert!(!json.contains("discovered_by"));
    assert!(!json.contains("started_at_ms"));
    let parsed: Job = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.id, job.id);
    assert_eq!(parsed.status, job.status);
}
