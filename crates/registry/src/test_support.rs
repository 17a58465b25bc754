// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic in-memory fakes for the worker traits and their
//! collaborators, mirroring the teacher's `oj-adapters` `test-support`
//! feature pattern so `qo-engine` and `qo-crawler` can drive the full
//! Init → CreateJobs → Execute chain without a real store or network.

use async_trait::async_trait;
use cookie::Cookie;
use parking_lot::Mutex;
use qo_core::{Document, Event, JobDefinitionId, JobId, JobStep, LogLevel, QueueJob, SearchOptions, WorkItem, WorkStrategy, WorkerInitResult, WorkerType};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::collab::{CredentialError, CredentialResolver, RenderError, RenderedPage, Renderer};
use crate::context::WorkerContext;
use crate::error::WorkerError;
use crate::worker::{DefinitionWorker, JobWorker};

/// In-memory `WorkerContext` backed by plain collections, guarded by a
/// single lock like the teacher's `FakeAdapter`s.
#[derive(Default)]
pub struct FakeWorkerContext {
    inner: Mutex<FakeWorkerContextInner>,
}

#[derive(Default)]
struct FakeWorkerContextInner {
    documents: HashMap<(String, String), Document>,
    kv: HashMap<String, serde_json::Value>,
    enqueued: Vec<QueueJob>,
    logs: Vec<(JobId, LogLevel, String)>,
    progress: Vec<(JobId, u64, u64)>,
    published: Vec<Event>,
}

impl FakeWorkerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueued(&self) -> Vec<QueueJob> {
        self.inner.lock().enqueued.clone()
    }

    pub fn documents(&self) -> Vec<Document> {
        self.inner.lock().documents.values().cloned().collect()
    }

    pub fn logs(&self) -> Vec<(JobId, LogLevel, String)> {
        self.inner.lock().logs.clone()
    }

    pub fn progress(&self) -> Vec<(JobId, u64, u64)> {
        self.inner.lock().progress.clone()
    }

    pub fn published(&self) -> Vec<Event> {
        self.inner.lock().published.clone()
    }
}

#[async_trait]
impl WorkerContext for FakeWorkerContext {
    async fn document_upsert(&self, document: Document) -> Result<(), WorkerError> {
        let key = (document.source_type.clone(), document.source_id.clone());
        self.inner.lock().documents.insert(key, document);
        Ok(())
    }

    async fn document_get_by_source(&self, source_type: &str, source_id: &str) -> Option<Document> {
        let key = (source_type.to_string(), source_id.to_string());
        self.inner.lock().documents.get(&key).cloned()
    }

    async fn document_search(&self, options: &SearchOptions) -> Vec<Document> {
        self.inner.lock().documents.values().filter(|d| options.matches(d)).cloned().collect()
    }

    async fn kv_get(&self, key: &str) -> Option<serde_json::Value> {
        self.inner.lock().kv.get(key).cloned()
    }

    async fn kv_set(&self, key: &str, value: serde_json::Value) -> Result<(), WorkerError> {
        self.inner.lock().kv.insert(key.to_string(), value);
        Ok(())
    }

    async fn enqueue(&self, message: QueueJob) -> Result<(), WorkerError> {
        self.inner.lock().enqueued.push(message);
        Ok(())
    }

    async fn add_job_log(&self, root_job_id: JobId, level: LogLevel, message: String) -> Result<(), WorkerError> {
        self.inner.lock().logs.push((root_job_id, level, message));
        Ok(())
    }

    async fn update_job_progress(&self, job_id: JobId, current: u64, total: u64) -> Result<(), WorkerError> {
        self.inner.lock().progress.push((job_id, current, total));
        Ok(())
    }

    fn publish(&self, event: Event) {
        self.inner.lock().published.push(event);
    }
}

/// A Definition Worker that reports a fixed number of work items and, when
/// `returns_child_jobs` is set, enqueues one `QueueJob` per item instead of
/// running inline.
pub struct FakeDefinitionWorker {
    worker_type: WorkerType,
    work_item_count: usize,
    returns_child_jobs: bool,
}

impl FakeDefinitionWorker {
    pub fn new(worker_type: impl Into<WorkerType>) -> Self {
        Self { worker_type: worker_type.into(), work_item_count: 1, returns_child_jobs: false }
    }

    pub fn with_work_items(mut self, count: usize) -> Self {
        self.work_item_count = count;
        self
    }

    pub fn with_child_jobs(mut self) -> Self {
        self.returns_child_jobs = true;
        self
    }
}

#[async_trait]
impl DefinitionWorker for FakeDefinitionWorker {
    fn get_type(&self) -> WorkerType {
        self.worker_type.clone()
    }

    fn validate_config(&self, _step: &JobStep) -> Result<(), WorkerError> {
        Ok(())
    }

    async fn init(
        &self,
        _ctx: &dyn WorkerContext,
        _step: &JobStep,
        _job_definition_id: JobDefinitionId,
    ) -> Result<WorkerInitResult, WorkerError> {
        let items: Vec<WorkItem> = (0..self.work_item_count)
            .map(|i| WorkItem { id: format!("item-{i}"), name: format!("item {i}"), worker_type: self.worker_type.clone(), config: HashMap::new() })
            .collect();
        let strategy = if self.returns_child_jobs { WorkStrategy::Parallel } else { WorkStrategy::Inline };
        Ok(WorkerInitResult::new(items, strategy))
    }

    async fn create_jobs(
        &self,
        ctx: &dyn WorkerContext,
        step: &JobStep,
        job_definition_id: JobDefinitionId,
        step_job_id: JobId,
        init_result: Option<WorkerInitResult>,
    ) -> Result<JobId, WorkerError> {
        let init_result = match init_result {
            Some(r) => r,
            None => self.init(ctx, step, job_definition_id).await?,
        };
        if self.returns_child_jobs {
            for item in &init_result.work_items {
                let job = QueueJob::new(step_job_id, self.worker_type.clone(), item.name.clone(), 1);
                job.validate().map_err(|e| WorkerError::ConfigInvalid(e.to_string()))?;
                ctx.enqueue(job).await?;
            }
        }
        Ok(step_job_id)
    }

    fn returns_child_jobs(&self) -> bool {
        self.returns_child_jobs
    }
}

/// A Job Worker that just records it ran; used to exercise the processor's
/// dispatch path without real side effects.
pub struct FakeJobWorker {
    worker_type: WorkerType,
    fail_with: Option<WorkerError>,
}

impl FakeJobWorker {
    pub fn new(worker_type: impl Into<WorkerType>) -> Self {
        Self { worker_type: worker_type.into(), fail_with: None }
    }

    pub fn failing_with(mut self, error: WorkerError) -> Self {
        self.fail_with = Some(error);
        self
    }
}

#[async_trait]
impl JobWorker for FakeJobWorker {
    fn get_worker_type(&self) -> WorkerType {
        self.worker_type.clone()
    }

    fn validate(&self, _job: &QueueJob) -> Result<(), WorkerError> {
        Ok(())
    }

    async fn execute(&self, ctx: &dyn WorkerContext, job: &QueueJob) -> Result<(), WorkerError> {
        if let Some(err) = &self.fail_with {
            return Err(clone_error(err));
        }
        ctx.kv_set(&format!("executed:{}", job.id), serde_json::json!(true)).await
    }
}

fn clone_error(error: &WorkerError) -> WorkerError {
    match error {
        WorkerError::ConfigInvalid(m) => WorkerError::ConfigInvalid(m.clone()),
        WorkerError::Transient(m) => WorkerError::Transient(m.clone()),
        WorkerError::Fatal(m) => WorkerError::Fatal(m.clone()),
        WorkerError::Cancelled => WorkerError::Cancelled,
    }
}

/// Always resolves the same placeholder value.
pub struct FakeCredentialResolver(pub String);

#[async_trait]
impl CredentialResolver for FakeCredentialResolver {
    async fn resolve(&self, name: &str) -> Result<String, CredentialError> {
        if name.is_empty() {
            return Err(CredentialError::NotFound(name.to_string()));
        }
        Ok(self.0.clone())
    }
}

/// Returns canned HTML for any URL; records the cookies it was given and
/// counts how many times it was asked to render, so a cache-hit test can
/// assert no network I/O happened (rather than just asserting on output).
#[derive(Default)]
pub struct FakeRenderer {
    pub html: String,
    cookies: Mutex<Vec<Cookie<'static>>>,
    render_count: Mutex<usize>,
}

impl FakeRenderer {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into(), cookies: Mutex::new(Vec::new()), render_count: Mutex::new(0) }
    }

    pub fn received_cookies(&self) -> Vec<Cookie<'static>> {
        self.cookies.lock().clone()
    }

    pub fn render_count(&self) -> usize {
        *self.render_count.lock()
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn render(&self, _url: &str, _timeout: Duration) -> Result<RenderedPage, RenderError> {
        *self.render_count.lock() += 1;
        Ok(RenderedPage { html: self.html.clone(), status: 200 })
    }

    async fn set_cookies(&self, cookies: Vec<Cookie<'static>>) -> Result<(), RenderError> {
        *self.cookies.lock() = cookies;
        Ok(())
    }
}

pub fn fake_context() -> Arc<FakeWorkerContext> {
    Arc::new(FakeWorkerContext::new())
}
