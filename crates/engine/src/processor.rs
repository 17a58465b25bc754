// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job Processor (§4.I): a pool of cooperative consumers that pull from the
//! Message Queue, dispatch to a registered [`JobWorker`], and ack/nack based
//! on [`WorkerError::retryable`].

use std::sync::Arc;
use std::time::Duration;

use qo_core::{Clock, Event, JobId, JobStatus, LogLevel, QueueJob};
use qo_registry::{WorkerContext, WorkerRegistry};
use qo_storage::{QueueItem, Store};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backoff::Backoff;
use crate::event_bus::EventBus;

/// How long a lease is held before it's considered expired and the message
/// becomes visible again (§4.D visibility timeout).
const LEASE_MS: u64 = 30_000;
/// How often the watchdog re-extends the lease while `Execute` runs.
const EXTEND_INTERVAL: Duration = Duration::from_secs(10);

pub struct JobProcessor<C: Clock> {
    store: Store,
    registry: Arc<WorkerRegistry>,
    event_bus: Arc<EventBus>,
    context: Arc<dyn WorkerContext>,
    clock: C,
    concurrency: usize,
}

/// A running pool; `stop` cancels every consumer and waits for them to exit.
pub struct ProcessorHandle {
    cancel: CancellationToken,
    tasks: JoinSet<()>,
}

impl ProcessorHandle {
    pub async fn stop(mut self) {
        self.cancel.cancel();
        while self.tasks.join_next().await.is_some() {}
    }
}

impl<C: Clock + 'static> JobProcessor<C> {
    pub fn new(
        store: Store,
        registry: Arc<WorkerRegistry>,
        event_bus: Arc<EventBus>,
        context: Arc<dyn WorkerContext>,
        clock: C,
        concurrency: usize,
    ) -> Self {
        Self { store, registry, event_bus, context, clock, concurrency }
    }

    /// Starts `concurrency.max(1)` consumer tasks sharing one cancellation
    /// token (§4.I "N cooperative consumers").
    pub fn spawn(&self) -> ProcessorHandle {
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();
        for _ in 0..self.concurrency.max(1) {
            let store = self.store.clone();
            let registry = self.registry.clone();
            let event_bus = self.event_bus.clone();
            let context = self.context.clone();
            let clock = self.clock.clone();
            let token = cancel.clone();
            tasks.spawn(async move {
                consumer_loop(store, registry, event_bus, context, clock, token).await;
            });
        }
        ProcessorHandle { cancel, tasks }
    }
}

async fn consumer_loop<C: Clock>(
    store: Store,
    registry: Arc<WorkerRegistry>,
    event_bus: Arc<EventBus>,
    context: Arc<dyn WorkerContext>,
    clock: C,
    cancel: CancellationToken,
) {
    let mut backoff = Backoff::new();
    loop {
        if cancel.is_cancelled() {
            return;
        }
        let next = store.visible_queue_items(clock.epoch_ms()).into_iter().next();
        let Some(item) = next else {
            tokio::select! {
                _ = tokio::time::sleep(backoff.next()) => {}
                _ = cancel.cancelled() => return,
            }
            continue;
        };
        backoff.reset();
        process_item(&store, &registry, &event_bus, context.as_ref(), &clock, item).await;
    }
}

async fn process_item<C: Clock>(
    store: &Store,
    registry: &WorkerRegistry,
    event_bus: &EventBus,
    context: &dyn WorkerContext,
    clock: &C,
    item: QueueItem,
) {
    let queue_job = item.message;
    let job_id = queue_job.id;
    let lease_id = nanoid::nanoid!(19);
    if store.lease(job_id, &lease_id, clock.epoch_ms() + LEASE_MS).is_err() {
        // Lost the race to another consumer (or a transient storage error);
        // it will reappear once the winner's lease resolves.
        return;
    }

    let Some(worker) = registry.job(&queue_job.worker_type) else {
        warn!(worker_type = %queue_job.worker_type, "no Job Worker registered for type, dead-lettering");
        let _ = store.nack(job_id, &lease_id, false);
        return;
    };

    if let Err(error) = worker.validate(&queue_job) {
        let _ = store.set_job_error(job_id, error.to_string(), clock);
        let _ = store.nack(job_id, &lease_id, false);
        return;
    }

    if store.update_job_status(job_id, JobStatus::Running, None, clock).is_ok() {
        event_bus.publish(Event::JobStatusChanged { job_id, status: JobStatus::Running, error: None, at_ms: clock.epoch_ms() });
    }

    let outcome = run_with_lease_watchdog(store, &lease_id, &queue_job, worker.as_ref(), context, clock).await;

    match outcome {
        Ok(()) => {
            let _ = store.ack(job_id, &lease_id);
            let _ = store.update_job_status(job_id, JobStatus::Completed, None, clock);
            event_bus.publish(Event::JobStatusChanged { job_id, status: JobStatus::Completed, error: None, at_ms: clock.epoch_ms() });
        }
        Err(error) if error.retryable() => {
            debug!(%job_id, %error, "retryable failure, requeuing");
            let _ = store.add_job_log(root_job_id(store, job_id), LogLevel::Warn, format!("retrying {job_id}: {error}"));
            let _ = store.nack(job_id, &lease_id, true);
        }
        Err(error) => {
            let _ = store.set_job_error(job_id, error.to_string(), clock);
            let _ = store.add_job_log(root_job_id(store, job_id), LogLevel::Error, format!("{job_id} failed: {error}"));
            // Acked, not dead-lettered: a fatal error is a final outcome for
            // this job, not a delivery failure for the queue to retry (§4.I).
            let _ = store.ack(job_id, &lease_id);
            event_bus.publish(Event::JobStatusChanged { job_id, status: JobStatus::Failed, error: Some(error.to_string()), at_ms: clock.epoch_ms() });
        }
    }
}

/// Resolves the run root a leaf job's `AddJobLog` entries attach to. The
/// synthesized leaf `Job` record's `parent_id` already equals the true root
/// (`state::queue::synthesize_leaf_job`), so no ancestor walk is needed.
fn root_job_id(store: &Store, job_id: JobId) -> JobId {
    store.get_job(job_id.as_str()).map(|job| job.parent_id).unwrap_or(job_id)
}

async fn run_with_lease_watchdog<C: Clock>(
    store: &Store,
    lease_id: &str,
    queue_job: &QueueJob,
    worker: &dyn qo_registry::JobWorker,
    context: &dyn WorkerContext,
    clock: &C,
) -> Result<(), qo_registry::WorkerError> {
    let job_id: JobId = queue_job.id;
    let execute = worker.execute(context, queue_job);
    tokio::pin!(execute);
    let mut ticker = tokio::time::interval(EXTEND_INTERVAL);
    ticker.tick().await; // first tick fires immediately; consume it
    loop {
        tokio::select! {
            result = &mut execute => return result,
            _ = ticker.tick() => {
                let _ = store.extend(job_id, lease_id, clock.epoch_ms() + LEASE_MS);
            }
        }
    }
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
