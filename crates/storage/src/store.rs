// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Store` is the Job Manager from §4.E/F generalized to also back the
//! Document Store, KV Store, and Message Queue: one WAL, one
//! `MaterializedState`, one writer. Every mutation is append-then-apply
//! under a single lock, so the in-memory view is never ahead of what's
//! durable (§5 "Shared resources... are concurrency-safe").

use crate::state::{MaterializedState, QueueItem};
use crate::wal::{Wal, WalError};
use parking_lot::Mutex;
use qo_core::{
    Clock, Document, Event, Job, JobId, JobLog, JobStatus, LogLevel, QueueJob, QueueJobError,
    SearchOptions, StatusTransitionError,
};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error(transparent)]
    Wal(#[from] WalError),
    #[error("job not found: {0}")]
    JobNotFound(String),
    #[error(transparent)]
    InvalidTransition(#[from] StatusTransitionError),
    #[error(transparent)]
    InvalidQueueJob(#[from] QueueJobError),
}

struct Inner {
    wal: Wal,
    state: MaterializedState,
}

/// The sole writer for Documents, Jobs, the Queue, and the KV store.
/// Cloneable handle; clones share the same underlying log and state.
#[derive(Clone)]
pub struct Store {
    inner: std::sync::Arc<Mutex<Inner>>,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let wal = Wal::open(path, 0)?;
        let mut state = MaterializedState::default();
        Self::replay(&wal, &mut state);
        Ok(Self { inner: std::sync::Arc::new(Mutex::new(Inner { wal, state })) })
    }

    fn replay(wal: &Wal, state: &mut MaterializedState) {
        for entry in wal.entries_after(0).unwrap_or_default() {
            state.apply_event(&entry.event);
        }
    }

    fn commit(&self, event: Event) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        inner.state.apply_event(&event);
        let seq = inner.wal.append(&event)?;
        inner.wal.mark_processed(seq);
        if inner.wal.needs_flush() {
            inner.wal.flush()?;
        }
        Ok(())
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        Ok(self.inner.lock().wal.flush()?)
    }

    // ── Document Store (§4.A) ───────────────────────────────────────────

    pub fn document_upsert(&self, document: Document) -> Result<(), StorageError> {
        self.commit(Event::DocumentUpserted { document })
    }

    pub fn document_get_by_source(&self, source_type: &str, source_id: &str) -> Option<Document> {
        self.inner.lock().state.get_document_by_source(source_type, source_id).cloned()
    }

    pub fn document_search(&self, opts: &SearchOptions) -> Vec<Document> {
        self.inner.lock().state.search_documents(opts).into_iter().cloned().collect()
    }

    pub fn document_delete(&self, source_type: &str, source_id: &str) -> Result<(), StorageError> {
        self.commit(Event::DocumentDeleted { source_type: source_type.to_string(), source_id: source_id.to_string() })
    }

    // ── Key/Value Store (§4.B) ──────────────────────────────────────────

    pub fn kv_set(&self, key: impl Into<String>, value: serde_json::Value) -> Result<(), StorageError> {
        self.commit(Event::KvSet { key: key.into(), value })
    }

    pub fn kv_get(&self, key: &str) -> Option<serde_json::Value> {
        self.inner.lock().state.kv.get(key).cloned()
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), StorageError> {
        self.commit(Event::KvDeleted { key: key.to_string() })
    }

    // ── Job Store / Job Manager (§4.C, §4.E/F) ──────────────────────────

    pub fn create_job_record(&self, job: Job) -> Result<(), StorageError> {
        self.commit(Event::JobCreated { job: Box::new(job) })
    }

    /// Rejects transitions the current status doesn't allow (§4.E: "Status
    /// transitions that are not allowed... are rejected").
    pub fn update_job_status(
        &self,
        job_id: JobId,
        status: JobStatus,
        error: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), StorageError> {
        let current = {
            let inner = self.inner.lock();
            inner.state.get_job(job_id.as_str()).map(|j| j.status).ok_or_else(|| StorageError::JobNotFound(job_id.to_string()))?
        };
        current.validate_transition(status)?;
        self.commit(Event::JobStatusChanged { job_id, status, error, at_ms: clock.epoch_ms() })
    }

    pub fn set_job_error(&self, job_id: JobId, error: impl Into<String>, clock: &impl Clock) -> Result<(), StorageError> {
        self.update_job_status(job_id, JobStatus::Failed, Some(error.into()), clock)
    }

    pub fn update_job_progress(&self, job_id: JobId, current: u64, total: u64) -> Result<(), StorageError> {
        self.commit(Event::JobProgressUpdated { job_id, current, total })
    }

    /// Merge entries into a job's metadata (§4.H step 2.c: storing a step's
    /// `WorkerInitResult`).
    pub fn update_job_metadata(
        &self,
        job_id: JobId,
        metadata: std::collections::HashMap<String, serde_json::Value>,
    ) -> Result<(), StorageError> {
        self.commit(Event::JobMetadataUpdated { job_id, metadata })
    }

    /// Append a log line under the run's root id, regardless of which
    /// descendant emitted it (§4.E `AddJobLog(root_id, level, message)`).
    pub fn add_job_log(&self, root_job_id: JobId, level: LogLevel, message: impl Into<String>) -> Result<(), StorageError> {
        self.commit(Event::JobLogAppended { log: JobLog::new(root_job_id, level, message) })
    }

    pub fn get_job(&self, id: &str) -> Option<Job> {
        self.inner.lock().state.get_job(id).cloned()
    }

    pub fn logs_for_run(&self, root_job_id: JobId) -> Vec<JobLog> {
        self.inner.lock().state.logs_for_run(root_job_id).to_vec()
    }

    /// Whether every job under `root_id` has reached a terminal status (the
    /// whole-run completion probe).
    pub fn all_descendants_terminal(&self, root_id: JobId) -> bool {
        self.inner.lock().state.all_descendants_terminal(root_id)
    }

    /// Whether every job spawned (directly or transitively) from
    /// `step_job_id` has reached a terminal status (§4.H step 2.e, the Step
    /// Orchestrator's completion probe).
    pub fn descendants_terminal(&self, step_job_id: JobId) -> bool {
        self.inner.lock().state.descendants_terminal(step_job_id)
    }

    // ── Message Queue (§4.D) ────────────────────────────────────────────

    pub fn enqueue(&self, message: QueueJob) -> Result<(), StorageError> {
        message.validate()?;
        self.commit(Event::QueueJobEnqueued { queue_job: Box::new(message) })
    }

    /// A snapshot of currently visible (pending or lease-expired) items, in
    /// insertion order, for a consumer to choose from. Does not block: §4.D's
    /// `Receive` blocking/backoff loop lives in the Job Processor (qo-engine),
    /// which polls this and backs off when it's empty.
    pub fn visible_queue_items(&self, now_ms: u64) -> Vec<QueueItem> {
        let inner = self.inner.lock();
        let mut items: Vec<QueueItem> = inner.state.queue_items.values().filter(|i| i.is_visible(now_ms)).cloned().collect();
        items.sort_by(|a, b| a.message.created_at.cmp(&b.message.created_at));
        items
    }

    pub fn lease(&self, job_id: JobId, lease_id: impl Into<String>, visible_again_at_ms: u64) -> Result<(), StorageError> {
        self.commit(Event::QueueJobLeased { job_id, lease_id: lease_id.into(), visible_again_at_ms })
    }

    /// Extend the visibility timeout for a message under active processing
    /// (§4.D `Extend`); implemented as re-leasing with the same lease id.
    pub fn extend(&self, job_id: JobId, lease_id: impl Into<String>, visible_again_at_ms: u64) -> Result<(), StorageError> {
        self.lease(job_id, lease_id, visible_again_at_ms)
    }

    pub fn ack(&self, job_id: JobId, lease_id: impl Into<String>) -> Result<(), StorageError> {
        self.commit(Event::QueueJobAcked { job_id, lease_id: lease_id.into() })
    }

    pub fn nack(&self, job_id: JobId, lease_id: impl Into<String>, requeue: bool) -> Result<(), StorageError> {
        self.commit(Event::QueueJobNacked { job_id, lease_id: lease_id.into(), requeue })
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
