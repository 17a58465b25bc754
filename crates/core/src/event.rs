// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The append-only event log every storage component replays into its
//! `MaterializedState` (§4.A-D, §6 persistent state layout).
//!
//! Every handler for these variants must be idempotent: replaying the same
//! event twice (after a crash between `Wal::append` and `mark_processed`)
//! must produce the same state as replaying it once.

use crate::document::Document;
use crate::job::{JobId, JobStatus};
use crate::job_log::{JobLog, LogLevel};
use crate::queue_job::QueueJob;
use serde::{Deserialize, Serialize};

/// One entry in the write-ahead log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Document Store upsert (§4.A). Idempotent: re-applying merges again
    /// with the same result since `Document::merge_upsert` unions tags.
    #[serde(rename = "document_upserted")]
    DocumentUpserted { document: Document },

    #[serde(rename = "document_deleted")]
    DocumentDeleted { source_type: String, source_id: String },

    /// Job Store record creation (§4.C `CreateJobRecord`).
    #[serde(rename = "job_created")]
    JobCreated { job: Box<crate::job::Job> },

    /// Job Store status transition (§4.C `UpdateJobStatus`). Applying this
    /// when the stored job is already in a terminal state with the same
    /// `status` is a no-op (§3 invariant: re-delivery of a terminal job).
    #[serde(rename = "job_status_changed")]
    JobStatusChanged {
        job_id: JobId,
        status: JobStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        at_ms: u64,
    },

    #[serde(rename = "job_progress_updated")]
    JobProgressUpdated { job_id: JobId, current: u64, total: u64 },

    /// Merges entries into a job's `metadata` (e.g. the Step Orchestrator
    /// storing a step's `WorkerInitResult`, §4.H step 2.c). Idempotent:
    /// re-applying the same key/value pairs is a no-op.
    #[serde(rename = "job_metadata_updated")]
    JobMetadataUpdated { job_id: JobId, metadata: std::collections::HashMap<String, serde_json::Value> },

    /// Job Store log append (§4.C `AddJobLog`).
    #[serde(rename = "job_log_appended")]
    JobLogAppended { log: JobLog },

    /// Message Queue enqueue (§4.B).
    #[serde(rename = "queue_job_enqueued")]
    QueueJobEnqueued { queue_job: Box<QueueJob> },

    /// A consumer leased `job_id` until `visible_again_at_ms` (visibility
    /// timeout). Re-applying with the same lease is a no-op; a later lease
    /// for the same job supersedes an earlier one (extension).
    #[serde(rename = "queue_job_leased")]
    QueueJobLeased { job_id: JobId, lease_id: String, visible_again_at_ms: u64 },

    #[serde(rename = "queue_job_acked")]
    QueueJobAcked { job_id: JobId, lease_id: String },

    /// Negative ack; `requeue=false` means the retry budget was exhausted
    /// and the message moves to the dead-letter state instead.
    #[serde(rename = "queue_job_nacked")]
    QueueJobNacked { job_id: JobId, lease_id: String, requeue: bool },

    #[serde(rename = "kv_set")]
    KvSet { key: String, value: serde_json::Value },

    #[serde(rename = "kv_deleted")]
    KvDeleted { key: String },

    /// Event Bus-only notification (§4.C): a worker spawned a child job. Never
    /// written to the WAL — published directly from `qo-crawler`'s link-spawn
    /// loop so a subscriber can observe fan-out as it happens.
    #[serde(rename = "job_spawn")]
    JobSpawned { job_id: JobId, parent_id: JobId, at_ms: u64 },

    /// Event Bus-only notification (§4.C): crawler-specific progress, distinct
    /// from the Job Store's persisted `progress_current`/`progress_total`
    /// (`JobProgressUpdated` above) which `update_job_progress` writes.
    #[serde(rename = "crawler_job_progress")]
    CrawlerJobProgress { job_id: JobId, current: u64, total: u64, at_ms: u64 },

    /// Event Bus-only notification (§4.C) mirroring an `AddJobLog` call in
    /// real time, for subscribers that want log lines without polling the
    /// Job Store.
    #[serde(rename = "crawler_job_log")]
    CrawlerJobLog { job_id: JobId, level: LogLevel, message: String, at_ms: u64 },

    /// Forward-compatible catch-all so an older reader can skip events from a
    /// newer writer instead of failing to deserialize the whole log.
    #[serde(other, skip_serializing)]
    Custom,
}

impl Event {
    /// A stable label for structured logging and metrics, independent of the
    /// serde wire tag (which is renamed per-variant above).
    pub fn kind(&self) -> &'static str {
        match self {
            Event::DocumentUpserted { .. } => "document_upserted",
            Event::DocumentDeleted { .. } => "document_deleted",
            Event::JobCreated { .. } => "job_created",
            Event::JobStatusChanged { .. } => "job_status_changed",
            Event::JobProgressUpdated { .. } => "job_progress_updated",
            Event::JobMetadataUpdated { .. } => "job_metadata_updated",
            Event::JobLogAppended { .. } => "job_log_appended",
            Event::QueueJobEnqueued { .. } => "queue_job_enqueued",
            Event::QueueJobLeased { .. } => "queue_job_leased",
            Event::QueueJobAcked { .. } => "queue_job_acked",
            Event::QueueJobNacked { .. } => "queue_job_nacked",
            Event::KvSet { .. } => "kv_set",
            Event::KvDeleted { .. } => "kv_deleted",
            Event::JobSpawned { .. } => "job_spawn",
            Event::CrawlerJobProgress { .. } => "crawler_job_progress",
            Event::CrawlerJobLog { .. } => "crawler_job_log",
            Event::Custom => "custom",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FakeClock};

    #[test]
    fn serde_tag_matches_kind_for_job_status_changed() {
        let event = Event::JobStatusChanged {
            job_id: JobId::new(),
            status: JobStatus::Running,
            error: None,
            at_ms: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "job_status_changed");
        assert_eq!(event.kind(), "job_status_changed");
    }

    #[test]
    fn unknown_tag_deserializes_to_custom_instead_of_erroring() {
        let json = r#"{"type":"some_future_event","payload":{}}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert!(matches!(event, Event::Custom));
    }

    #[test]
    fn job_created_roundtrips() {
        let clock = FakeClock::new();
        let job = crate::job::Job::new_root("run", "fundamentals_ingest", &clock);
        let event = Event::JobCreated { job: Box::new(job.clone()) };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();
        match parsed {
            Event::JobCreated { job: parsed_job } => assert_eq!(parsed_job.id, job.id),
            other => panic!("expected JobCreated, got {other:?}"),
        }
        let _ = clock.now();
    }

    #[test]
    fn document_upserted_roundtrips() {
        let doc = Document::new("equities", "AAPL", "Apple", "# Apple", "summary");
        let event = Event::DocumentUpserted { document: doc.clone() };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();
        match parsed {
            Event::DocumentUpserted { document } => assert_eq!(document.id, doc.id),
            other => panic!("expected DocumentUpserted, got {other:?}"),
        }
    }

    #[test]
    fn job_spawned_roundtrips() {
        let event = Event::JobSpawned { job_id: JobId::new(), parent_id: JobId::new(), at_ms: 42 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "job_spawn");
        let parsed: Event = serde_json::from_value(json).unwrap();
        match parsed {
            Event::JobSpawned { at_ms, .. } => assert_eq!(at_ms, 42),
            other => panic!("expected JobSpawned, got {other:?}"),
        }
        assert_eq!(event.kind(), "job_spawn");
    }
}
