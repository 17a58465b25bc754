// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Implements `qo_registry::WorkerContext` over `qo_storage::Store`, the
//! only place in the workspace that bridges the two — workers themselves
//! never depend on `qo-storage` (§5, §6).

use std::sync::Arc;

use async_trait::async_trait;
use qo_core::{Document, Event, JobId, LogLevel, QueueJob, SearchOptions};
use qo_registry::{WorkerContext, WorkerError};
use qo_storage::Store;

use crate::event_bus::EventBus;

pub struct StoreContext {
    store: Store,
    event_bus: Arc<EventBus>,
}

impl StoreContext {
    pub fn new(store: Store, event_bus: Arc<EventBus>) -> Self {
        Self { store, event_bus }
    }
}

#[async_trait]
impl WorkerContext for StoreContext {
    async fn document_upsert(&self, document: Document) -> Result<(), WorkerError> {
        self.store.document_upsert(document).map_err(storage_err)
    }

    async fn document_get_by_source(&self, source_type: &str, source_id: &str) -> Option<Document> {
        self.store.document_get_by_source(source_type, source_id)
    }

    async fn document_search(&self, options: &SearchOptions) -> Vec<Document> {
        self.store.document_search(options)
    }

    async fn kv_get(&self, key: &str) -> Option<serde_json::Value> {
        self.store.kv_get(key)
    }

    async fn kv_set(&self, key: &str, value: serde_json::Value) -> Result<(), WorkerError> {
        self.store.kv_set(key, value).map_err(storage_err)
    }

    async fn enqueue(&self, message: QueueJob) -> Result<(), WorkerError> {
        self.store.enqueue(message).map_err(storage_err)
    }

    async fn add_job_log(&self, root_job_id: JobId, level: LogLevel, message: String) -> Result<(), WorkerError> {
        self.store.add_job_log(root_job_id, level, message).map_err(storage_err)
    }

    async fn update_job_progress(&self, job_id: JobId, current: u64, total: u64) -> Result<(), WorkerError> {
        self.store.update_job_progress(job_id, current, total).map_err(storage_err)
    }

    fn publish(&self, event: Event) {
        self.event_bus.publish(event);
    }
}

/// Storage failures reaching a worker are always fatal: invalid queue jobs
/// and WAL I/O errors aren't something `Execute`/`CreateJobs` can retry past.
fn storage_err(error: qo_storage::StorageError) -> WorkerError {
    WorkerError::Fatal(error.to_string())
}

#[cfg(test)]
#[path = "store_context_tests.rs"]
mod tests;
