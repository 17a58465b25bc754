// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]

//! `qo-daemon`: wires `qo-storage`, `qo-registry`, `qo-engine`, and
//! `qo-crawler` into a running orchestration core (§6). Exposes `submit`
//! and `await_completion` as its only surface — not a CLI; `list runs`,
//! `tail logs`, and `cancel` are out of scope.

use std::sync::Arc;
use std::time::Duration;

use qo_core::{JobDefinition, JobId, JobStatus, SystemClock};
use qo_engine::{EventBus, JobProcessor, ProcessorHandle, StepOrchestrator, StoreContext};
use qo_registry::test_support::{FakeCredentialResolver, FakeRenderer};
use qo_registry::{WorkerContext, WorkerRegistry};
use qo_storage::{Store, StorageError};

pub mod config;

pub use config::DaemonConfig;

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Orchestrator(#[from] qo_engine::OrchestratorError),
    #[error("job {0} was never observed by this daemon")]
    UnknownJob(JobId),
}

/// A running orchestration core: one `Store`, one `WorkerRegistry`, a Job
/// Processor pool draining the queue in the background, and a Step
/// Orchestrator used to drive submitted runs.
pub struct Daemon {
    store: Store,
    orchestrator: StepOrchestrator<SystemClock>,
    processor: ProcessorHandle,
}

impl Daemon {
    /// Opens `config.data_dir`, registers the built-in crawler worker, and
    /// starts `config.concurrency` Job Processor consumers. The crawler's
    /// `Renderer`/`CredentialResolver` collaborators have no production
    /// implementation in this workspace (§6: "the LLM provider factory and
    /// HTTP feed fetchers... are out of scope"), so the deterministic fakes
    /// `qo-registry::test_support` ships are reused here rather than left
    /// unregistered.
    pub fn start(config: DaemonConfig) -> Result<Self, DaemonError> {
        let store = Store::open(&config.data_dir)?;
        let event_bus = Arc::new(EventBus::default());
        let context: Arc<dyn WorkerContext> = Arc::new(StoreContext::new(store.clone(), event_bus.clone()));

        let mut registry = WorkerRegistry::new();
        let crawler = Arc::new(qo_crawler::CrawlerWorker::new(
            Arc::new(FakeRenderer::new(String::new())),
            Arc::new(FakeCredentialResolver(String::new())),
        ));
        registry.register_definition(crawler.clone());
        registry.register_job(crawler);
        let registry = Arc::new(registry);

        let orchestrator = StepOrchestrator::new(store.clone(), registry.clone(), event_bus.clone(), context.clone(), SystemClock);
        let processor = JobProcessor::new(store.clone(), registry, event_bus, context, SystemClock, config.concurrency.max(1));
        let processor = processor.spawn();

        Ok(Self { store, orchestrator, processor })
    }

    /// Creates the run's root job and spawns its execution in the
    /// background, returning the root job id immediately (§4.H, §6).
    pub async fn submit(&self, job_definition: JobDefinition) -> Result<JobId, DaemonError> {
        let root_id = self.orchestrator.start_root(&job_definition)?;
        let orchestrator = self.orchestrator.clone();
        tokio::spawn(async move {
            if let Err(error) = orchestrator.run_from_root(&job_definition, root_id).await {
                tracing::error!(%error, %root_id, "run failed");
            }
        });
        Ok(root_id)
    }

    /// Polls the store until `job_id` reaches a terminal status (§4.H "a
    /// job's status progresses monotonically to a terminal state").
    pub async fn await_completion(&self, job_id: JobId) -> Result<JobStatus, DaemonError> {
        loop {
            let job = self.store.get_job(job_id.as_str()).ok_or(DaemonError::UnknownJob(job_id))?;
            if job.status.is_terminal() {
                return Ok(job.status);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Cancels the Job Processor pool's consumers and waits for them to
    /// exit. Does not touch in-flight runs' job records.
    pub async fn stop(self) {
        self.processor.stop().await;
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
