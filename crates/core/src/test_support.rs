// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::clock::{Clock, FakeClock};
use crate::document::Document;
use crate::event::Event;
use crate::job::{Job, JobId, JobPhase, JobStatus};
use crate::job_definition::{JobDefinition, JobStep};
use crate::job_log::JobLog;
use crate::queue_job::QueueJob;
use crate::worker_init::{WorkItem, WorkStrategy, WorkerInitResult};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core state machine types.
pub mod strategies {
    use crate::job::JobStatus;
    use proptest::prelude::*;

    pub fn arb_job_status() -> impl Strategy<Value = JobStatus> {
        prop_oneof![
            Just(JobStatus::Pending),
            Just(JobStatus::Running),
            Just(JobStatus::Completed),
            Just(JobStatus::Failed),
            Just(JobStatus::Cancelled),
        ]
    }
}

// ── Fixture builders ─────────────────────────────────────────────────────

/// A minimal one-step Job Definition for a fictional fundamentals-ingest run.
pub fn sample_job_definition() -> JobDefinition {
    JobDefinition::new(
        "fundamentals-ingest",
        "equities",
        vec![JobStep::new("crawl", "crawler_url")],
    )
}

pub fn sample_root_job(clock: &FakeClock) -> Job {
    Job::new_root("fundamentals-ingest", "fundamentals_ingest", clock)
}

pub fn sample_step_job(root_id: JobId, clock: &FakeClock) -> Job {
    Job::new_child("crawl", "crawler_url", JobPhase::Step, root_id, None, 1, clock)
}

pub fn sample_leaf_job(root_id: JobId, discovered_by: JobId, clock: &FakeClock) -> Job {
    Job::new_child("crawl:https://example.com", "crawler_url", JobPhase::Leaf, root_id, Some(discovered_by), 2, clock)
}

pub fn sample_document() -> Document {
    Document::new("equities", "AAPL", "Apple Inc.", "# Apple Inc.\n\nFundamentals.", "summary")
}

pub fn sample_queue_job(parent_id: JobId) -> QueueJob {
    QueueJob::new(parent_id, "crawler_url", "crawl:https://example.com", 2)
}

pub fn sample_worker_init_result() -> WorkerInitResult {
    let items = vec![WorkItem {
        id: "1".into(),
        name: "crawl:https://example.com".into(),
        worker_type: "crawler_url".into(),
        config: Default::default(),
    }];
    WorkerInitResult::new(items, WorkStrategy::Parallel)
}

// ── Event factory functions ──────────────────────────────────────────────

pub fn job_created_event(job: Job) -> Event {
    Event::JobCreated { job: Box::new(job) }
}

pub fn job_status_changed_event(job_id: JobId, status: JobStatus, clock: &FakeClock) -> Event {
    Event::JobStatusChanged { job_id, status, error: None, at_ms: clock.epoch_ms() }
}

pub fn job_failed_event(job_id: JobId, error: &str, clock: &FakeClock) -> Event {
    Event::JobStatusChanged {
        job_id,
        status: JobStatus::Failed,
        error: Some(error.to_string()),
        at_ms: clock.epoch_ms(),
    }
}

pub fn job_log_appended_event(root_job_id: JobId, message: &str) -> Event {
    Event::JobLogAppended { log: JobLog::info(root_job_id, message) }
}

pub fn document_upserted_event(document: Document) -> Event {
    Event::DocumentUpserted { document }
}

pub fn queue_job_enqueued_event(queue_job: QueueJob) -> Event {
    Event::QueueJobEnqueued { queue_job: Box::new(queue_job) }
}

pub fn queue_job_leased_event(job_id: JobId, lease_id: &str, visible_again_at_ms: u64) -> Event {
    Event::QueueJobLeased { job_id, lease_id: lease_id.to_string(), visible_again_at_ms }
}

pub fn queue_job_acked_event(job_id: JobId, lease_id: &str) -> Event {
    Event::QueueJobAcked { job_id, lease_id: lease_id.to_string() }
}
