// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step Orchestrator (§4.H): executes a Job Definition's steps in order,
//! waiting for a step's descendants when its worker fans out to the queue.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use qo_core::{Clock, FailurePolicy, Job, JobDefinition, JobId, JobPhase, JobStatus};
use qo_registry::{WorkerContext, WorkerError, WorkerRegistry};
use qo_storage::Store;

use crate::event_bus::EventBus;

/// Polling floor for [`StepOrchestrator::wait_for_descendants`]: an
/// EventBus notification wakes the wait early; this guards against a missed
/// one (matches the teacher's periodic-reconciliation idiom in
/// `daemon::engine::monitor`).
const DESCENDANT_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Storage(#[from] qo_storage::StorageError),
    #[error("no worker registered for step type {0}")]
    UnknownWorkerType(qo_core::WorkerType),
    #[error(transparent)]
    Worker(#[from] WorkerError),
}

#[derive(Clone)]
pub struct StepOrchestrator<C: Clock> {
    store: Store,
    registry: Arc<WorkerRegistry>,
    event_bus: Arc<EventBus>,
    context: Arc<dyn WorkerContext>,
    clock: C,
}

impl<C: Clock> StepOrchestrator<C> {
    pub fn new(store: Store, registry: Arc<WorkerRegistry>, event_bus: Arc<EventBus>, context: Arc<dyn WorkerContext>, clock: C) -> Self {
        Self { store, registry, event_bus, context, clock }
    }

    /// Creates the root job and transitions it to `Running`, without
    /// executing any step. Lets a caller (`qo-daemon`'s `submit`) hand back
    /// the root id to its own caller before the run itself completes.
    pub fn start_root(&self, job_definition: &JobDefinition) -> Result<JobId, OrchestratorError> {
        let root = Job::new_root(job_definition.name.clone(), job_definition.source_type.clone(), &self.clock);
        let root_id = root.id;
        self.store.create_job_record(root)?;
        self.transition(root_id, JobStatus::Running)?;
        Ok(root_id)
    }

    /// Executes every step of `job_definition`, in order. Returns the root
    /// job id; its final status (`Completed`/`Failed`) reflects the run's
    /// outcome (§4.H steps 1-3).
    pub async fn run_definition(&self, job_definition: &JobDefinition) -> Result<JobId, OrchestratorError> {
        let root_id = self.start_root(job_definition)?;
        self.run_from_root(job_definition, root_id).await
    }

    /// Runs every step against an already-created root job (§4.H steps 2-3).
    pub async fn run_from_root(&self, job_definition: &JobDefinition, root_id: JobId) -> Result<JobId, OrchestratorError> {
        let mut any_step_failed = false;
        for step in &job_definition.steps {
            let step_job = Job::new_child(step.name.clone(), step.worker_type.to_string(), JobPhase::Step, root_id, None, 1, &self.clock);
            let step_id = step_job.id;
            self.store.create_job_record(step_job)?;
            self.transition(step_id, JobStatus::Running)?;

            match self.run_step(step, job_definition.id, step_id, root_id).await {
                Ok(()) => self.transition(step_id, JobStatus::Completed)?,
                Err(err) => {
                    self.store.set_job_error(step_id, err.to_string(), &self.clock)?;
                    self.transition(step_id, JobStatus::Failed)?;
                    any_step_failed = true;
                    if job_definition.failure_policy == FailurePolicy::Stop {
                        self.store.set_job_error(root_id, err.to_string(), &self.clock)?;
                        self.transition(root_id, JobStatus::Failed)?;
                        return Ok(root_id);
                    }
                }
            }
        }

        self.transition(root_id, if any_step_failed { JobStatus::Failed } else { JobStatus::Completed })?;
        Ok(root_id)
    }

    async fn run_step(
        &self,
        step: &qo_core::JobStep,
        job_definition_id: qo_core::JobDefinitionId,
        step_id: JobId,
        root_id: JobId,
    ) -> Result<(), OrchestratorError> {
        let worker = self.registry.definition(&step.worker_type).ok_or_else(|| OrchestratorError::UnknownWorkerType(step.worker_type.clone()))?;
        worker.validate_config(step)?;

        let init_result = worker.init(self.context.as_ref(), step, job_definition_id).await?;
        let init_value = serde_json::to_value(&init_result).unwrap_or(serde_json::Value::Null);
        self.store.update_job_metadata(step_id, HashMap::from([("init_result".to_string(), init_value)]))?;

        // Tie-break (§4.H): zero work items completes the step without
        // invoking CreateJobs.
        if init_result.is_empty() {
            self.store.add_job_log(root_id, qo_core::LogLevel::Info, "no work items")?;
            return Ok(());
        }

        let returns_child_jobs = worker.returns_child_jobs();
        worker.create_jobs(self.context.as_ref(), step, job_definition_id, step_id, Some(init_result)).await?;

        if returns_child_jobs {
            self.wait_for_descendants(step_id).await;
        }
        Ok(())
    }

    /// Blocks until every descendant of `step_id` reaches a terminal status.
    /// Woken early by an EventBus publish (the Job Processor publishes one
    /// on every leaf status change); falls back to polling so a missed
    /// event can't wedge the run.
    async fn wait_for_descendants(&self, step_id: JobId) {
        let mut events = self.event_bus.subscribe();
        while !self.store.descendants_terminal(step_id) {
            tokio::select! {
                _ = events.recv() => {}
                _ = tokio::time::sleep(DESCENDANT_POLL_INTERVAL) => {}
            }
        }
    }

    fn transition(&self, job_id: JobId, status: JobStatus) -> Result<(), OrchestratorError> {
        self.store.update_job_status(job_id, status, None, &self.clock)?;
        self.event_bus.publish(qo_core::Event::JobStatusChanged { job_id, status, error: None, at_ms: self.clock.epoch_ms() });
        Ok(())
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
