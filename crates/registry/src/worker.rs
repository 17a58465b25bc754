// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The two worker contracts a `WorkerType` can register under (§4.G). A
//! worker may implement either or both — composition, never inheritance
//! (§9).

use async_trait::async_trait;
use qo_core::{JobDefinitionId, JobId, JobStep, QueueJob, WorkerInitResult, WorkerType};

use crate::context::WorkerContext;
use crate::error::WorkerError;

/// Participates in step execution: resolves inputs (`Init`) and either does
/// the work inline or fans it out to the queue (`CreateJobs`).
#[async_trait]
pub trait DefinitionWorker: Send + Sync {
    fn get_type(&self) -> WorkerType;

    /// Structural validation only; cheap, no I/O.
    fn validate_config(&self, step: &JobStep) -> Result<(), WorkerError>;

    /// Resolve inputs and enumerate work items. Read-only w.r.t. durable
    /// state except cache probes (§4.G).
    async fn init(
        &self,
        ctx: &dyn WorkerContext,
        step: &JobStep,
        job_definition_id: JobDefinitionId,
    ) -> Result<WorkerInitResult, WorkerError>;

    /// Perform the work inline, or enqueue child jobs, depending on
    /// `returns_child_jobs`. If `init_result` is `None` the worker calls
    /// `init` itself (§4.G: "If initResult is nil, the worker must call Init
    /// itself").
    async fn create_jobs(
        &self,
        ctx: &dyn WorkerContext,
        step: &JobStep,
        job_definition_id: JobDefinitionId,
        step_job_id: JobId,
        init_result: Option<WorkerInitResult>,
    ) -> Result<JobId, WorkerError>;

    /// Tells the Step Orchestrator whether to wait for descendants of the
    /// step job before advancing (§4.H step 2.e).
    fn returns_child_jobs(&self) -> bool;
}

/// Consumes queue messages of a specific `WorkerType` (`QueueJob.type`).
#[async_trait]
pub trait JobWorker: Send + Sync {
    fn get_worker_type(&self) -> WorkerType;

    fn validate(&self, job: &QueueJob) -> Result<(), WorkerError>;

    /// Must be idempotent under redelivery (§4.I: at-least-once).
    async fn execute(&self, ctx: &dyn WorkerContext, job: &QueueJob) -> Result<(), WorkerError>;
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
