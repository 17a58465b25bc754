// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message Queue event handlers (§4.D). At-least-once; a leased message
//! becomes visible again if its lease expires before an ack.

use super::types::{QueueItem, QueueItemStatus};
use super::MaterializedState;
use qo_core::{Event, Job, JobPhase, JobStatus, QueueJob};

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::QueueJobEnqueued { queue_job } => {
            // Idempotent: re-enqueuing the same job id is a no-op.
            state.queue_items.entry(queue_job.id.to_string()).or_insert_with(|| QueueItem::new((**queue_job).clone()));
            synthesize_leaf_job(state, queue_job);
        }

        Event::QueueJobLeased { job_id, lease_id, visible_again_at_ms } => {
            if let Some(item) = state.queue_items.get_mut(job_id.as_str()) {
                if item.status != QueueItemStatus::Acked && item.status != QueueItemStatus::Dead {
                    let is_new_lease = item.lease_id.as_deref() != Some(lease_id.as_str());
                    item.status = QueueItemStatus::Leased;
                    item.lease_id = Some(lease_id.clone());
                    item.visible_again_at_ms = Some(*visible_again_at_ms);
                    if is_new_lease {
                        item.delivery_count += 1;
                    }
                }
            }
        }

        Event::QueueJobAcked { job_id, lease_id } => {
            if let Some(item) = state.queue_items.get_mut(job_id.as_str()) {
                if item.lease_id.as_deref() == Some(lease_id.as_str()) {
                    item.status = QueueItemStatus::Acked;
                }
            }
        }

        Event::QueueJobNacked { job_id, lease_id, requeue } => {
            if let Some(item) = state.queue_items.get_mut(job_id.as_str()) {
                if item.lease_id.as_deref() == Some(lease_id.as_str()) {
                    item.status = if *requeue { QueueItemStatus::Pending } else { QueueItemStatus::Dead };
                    item.lease_id = None;
                    item.visible_again_at_ms = None;
                }
            }
        }

        _ => {}
    }
}

/// A `QueueJob` enqueued by `CreateJobs` (or by a leaf worker spawning
/// children) is, per the flat job hierarchy (§3), also a `Job` record: this
/// is what "Job created... by a spawning worker" means mechanically, since
/// `WorkerContext` only exposes `enqueue`, never `CreateJobRecord`. The run
/// root is resolved by following the immediate predecessor's own
/// `parent_id`, which (being flat) already equals the true root.
fn synthesize_leaf_job(state: &mut MaterializedState, queue_job: &QueueJob) {
    if state.jobs.contains_key(queue_job.id.as_str()) {
        return;
    }
    let root_id = state.jobs.get(queue_job.parent_id.as_str()).map(|predecessor| predecessor.parent_id).unwrap_or(queue_job.parent_id);
    let job = Job {
        id: queue_job.id,
        parent_id: root_id,
        discovered_by: Some(queue_job.parent_id),
        worker_type: queue_job.worker_type.to_string(),
        name: queue_job.name.clone(),
        phase: JobPhase::Leaf,
        status: JobStatus::Pending,
        created_at_ms: queue_job.created_at.timestamp_millis().max(0) as u64,
        started_at_ms: None,
        finished_at_ms: None,
        progress_current: 0,
        progress_total: 0,
        depth: queue_job.depth,
        payload: serde_json::to_value(queue_job).ok(),
        error: None,
        metadata: queue_job.metadata.clone(),
    };
    state.jobs.insert(job.id.to_string(), job);
}
