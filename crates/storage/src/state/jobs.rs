// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job Store event handlers (§4.C, §4.E/F).

use qo_core::{Event, JobStatus};

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::JobCreated { job } => {
            // Idempotent: a job's id is generated once at creation, so a
            // replayed JobCreated for an id already present is a no-op.
            state.jobs.entry(job.id.to_string()).or_insert_with(|| (**job).clone());
        }

        Event::JobStatusChanged { job_id, status, error, at_ms } => {
            if let Some(job) = state.jobs.get_mut(job_id.as_str()) {
                // Idempotent: validate_transition rejects regressions but
                // accepts same-terminal-status re-delivery as a no-op.
                if job.status.validate_transition(*status).is_ok() {
                    job.status = *status;
                    if *status == JobStatus::Running && job.started_at_ms.is_none() {
                        job.started_at_ms = Some(*at_ms);
                    }
                    if status.is_terminal() && job.finished_at_ms.is_none() {
                        job.finished_at_ms = Some(*at_ms);
                    }
                    if let Some(err) = error {
                        job.error = Some(err.clone());
                    }
                }
            }
        }

        Event::JobProgressUpdated { job_id, current, total } => {
            if let Some(job) = state.jobs.get_mut(job_id.as_str()) {
                job.progress_current = *current;
                job.progress_total = *total;
            }
        }

        Event::JobMetadataUpdated { job_id, metadata } => {
            if let Some(job) = state.jobs.get_mut(job_id.as_str()) {
                job.metadata.extend(metadata.clone());
            }
        }

        Event::JobLogAppended { log } => {
            state.job_logs.entry(log.job_id.to_string()).or_default().push(log.clone());
        }

        _ => {}
    }
}
