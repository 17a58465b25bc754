// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state derived by replaying the WAL event log.

mod documents;
mod helpers;
mod jobs;
mod kv;
mod queue;
mod types;

pub use types::{QueueItem, QueueItemStatus};

use qo_core::{Document, Event, Job, JobId, JobLog, SearchOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Composite key for [`MaterializedState::document_index`]. `\u{0}` can't
/// appear in either field so this never collides across a differently-split
/// `(source_type, source_id)` pair.
pub(crate) fn document_source_key(source_type: &str, source_id: &str) -> String {
    format!("{source_type}\u{0}{source_id}")
}

/// State built by folding [`Event`]s over the empty default (§4.A-D).
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub jobs: HashMap<String, Job>,
    #[serde(default)]
    pub job_logs: HashMap<String, Vec<JobLog>>,
    pub documents: HashMap<String, Document>,
    /// `document_source_key(source_type, source_id)` → document id,
    /// enforcing the Document Store's upsert uniqueness constraint. Uses a
    /// joined string rather than a tuple key since the map is serialized to
    /// JSON, whose object keys must be strings.
    #[serde(default)]
    pub document_index: HashMap<String, String>,
    /// Tag → document ids (§6 "tag inverted index"). Narrows `search_documents`
    /// before the full `SearchOptions::matches` filter runs.
    #[serde(default)]
    pub tag_index: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub queue_items: HashMap<String, QueueItem>,
    #[serde(default)]
    pub kv: HashMap<String, serde_json::Value>,
}

impl MaterializedState {
    /// Fold `event` into state. All handlers are idempotent: replaying the
    /// same event twice (crash between `Wal::append` and `mark_processed`)
    /// reproduces the same state as replaying it once.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::DocumentUpserted { .. } | Event::DocumentDeleted { .. } => documents::apply(self, event),

            Event::JobCreated { .. }
            | Event::JobStatusChanged { .. }
            | Event::JobProgressUpdated { .. }
            | Event::JobMetadataUpdated { .. }
            | Event::JobLogAppended { .. } => jobs::apply(self, event),

            Event::QueueJobEnqueued { .. }
            | Event::QueueJobLeased { .. }
            | Event::QueueJobAcked { .. }
            | Event::QueueJobNacked { .. } => queue::apply(self, event),

            Event::KvSet { .. } | Event::KvDeleted { .. } => kv::apply(self, event),

            Event::Custom => {}
        }
    }

    /// Look up a job by exact id or unique prefix.
    pub fn get_job(&self, id: &str) -> Option<&Job> {
        helpers::find_by_prefix(&self.jobs, id)
    }

    /// Logs for a run, in append order, keyed by the root job id.
    pub fn logs_for_run(&self, root_job_id: JobId) -> &[JobLog] {
        self.job_logs.get(root_job_id.as_str()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Exact `(source_type, source_id)` lookup; `None` if absent, never an
    /// error (§4.A `GetBySource`).
    pub fn get_document_by_source(&self, source_type: &str, source_id: &str) -> Option<&Document> {
        let key = document_source_key(source_type, source_id);
        self.document_index.get(&key).and_then(|id| self.documents.get(id))
    }

    pub fn search_documents(&self, opts: &SearchOptions) -> Vec<&Document> {
        let mut results: Vec<&Document> = match opts.tags.first() {
            // Narrow via the inverted index on the first tag; the remaining
            // tags (and every other filter) are checked by `matches`.
            Some(first_tag) => self
                .tag_index
                .get(first_tag)
                .into_iter()
                .flatten()
                .filter_map(|id| self.documents.get(id))
                .filter(|d| opts.matches(d))
                .collect(),
            None => self.documents.values().filter(|d| opts.matches(d)).collect(),
        };
        results.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        if let Some(limit) = opts.limit {
            results.truncate(limit);
        }
        results
    }

    /// True once every job under `root_id` (matched via `parent_id`, the flat
    /// hierarchy) has reached a terminal status — the whole-run completion
    /// probe (used by `qo-daemon`'s `await_completion`, not by the Step
    /// Orchestrator, since the currently-executing step's own job is itself
    /// one of these and is never terminal until the orchestrator says so).
    pub fn all_descendants_terminal(&self, root_id: JobId) -> bool {
        self.jobs
            .values()
            .filter(|j| j.parent_id == root_id && j.id != root_id)
            .all(|j| j.is_terminal())
    }

    /// Descendants of `root_id` still pending or running.
    pub fn pending_descendants(&self, root_id: JobId) -> Vec<&Job> {
        self.jobs.values().filter(|j| j.parent_id == root_id && j.id != root_id && !j.is_terminal()).collect()
    }

    /// True once every job spawned, directly or transitively, from
    /// `step_job_id` has reached a terminal status — the `discovered_by`
    /// closure (§9) the Step Orchestrator waits on for a step with
    /// `ReturnsChildJobs() == true` (§4.H step 2.e). Excludes the step job
    /// itself, which is why this differs from [`Self::all_descendants_terminal`].
    pub fn descendants_terminal(&self, step_job_id: JobId) -> bool {
        self.discovered_by_closure(step_job_id).iter().all(|j| j.is_terminal())
    }

    fn discovered_by_closure(&self, root: JobId) -> Vec<&Job> {
        let mut frontier = vec![root];
        let mut closure: Vec<&Job> = Vec::new();
        loop {
            let mut grew = false;
            for job in self.jobs.values() {
                let Some(discoverer) = job.discovered_by else { continue };
                if frontier.contains(&discoverer) && !closure.iter().any(|j| j.id == job.id) {
                    closure.push(job);
                    frontier.push(job.id);
                    grew = true;
                }
            }
            if !grew {
                return closure;
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
