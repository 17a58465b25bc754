// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The narrow storage surface a worker is handed, so `qo-registry` (and any
//! crate implementing a worker against it, such as `qo-crawler`) depends on a
//! trait rather than on `qo-storage` directly — the same inversion the
//! teacher uses for its adapter traits.

use async_trait::async_trait;
use qo_core::{Document, Event, JobId, LogLevel, QueueJob, SearchOptions};

use crate::error::WorkerError;

/// Storage operations available to a worker during `Init`, `CreateJobs`, and
/// `Execute`. Implemented by `qo-engine` as a thin wrapper over `qo-storage`'s
/// `Store`.
#[async_trait]
pub trait WorkerContext: Send + Sync {
    async fn document_upsert(&self, document: Document) -> Result<(), WorkerError>;
    async fn document_get_by_source(&self, source_type: &str, source_id: &str) -> Option<Document>;
    async fn document_search(&self, options: &SearchOptions) -> Vec<Document>;

    async fn kv_get(&self, key: &str) -> Option<serde_json::Value>;
    async fn kv_set(&self, key: &str, value: serde_json::Value) -> Result<(), WorkerError>;

    /// Enqueue a message for the Message Queue (§4.D); used by `CreateJobs`
    /// when a step returns child jobs instead of running inline.
    async fn enqueue(&self, message: QueueJob) -> Result<(), WorkerError>;

    async fn add_job_log(&self, root_job_id: JobId, level: LogLevel, message: String) -> Result<(), WorkerError>;
    async fn update_job_progress(&self, job_id: JobId, current: u64, total: u64) -> Result<(), WorkerError>;

    /// Publish an Event Bus-only notification (§4.C), e.g. `JobSpawned` on
    /// child enqueue or `CrawlerJobProgress`/`CrawlerJobLog` during `Execute`.
    /// Never persisted to the WAL; fire-and-forget like the bus itself.
    fn publish(&self, event: Event);
}
