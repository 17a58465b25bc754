// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output of a Definition Worker's `Init` phase (§3, §4.G).

use crate::worker_type::WorkerType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One work item Init proposes; `CreateJobs` turns these into queue jobs (or,
/// when `strategy == Inline`, executes them directly without a queue round-trip).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub worker_type: WorkerType,
    #[serde(default)]
    pub config: HashMap<String, serde_json::Value>,
}

/// How the Job Processor should run a step's work items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStrategy {
    /// Run on the orchestrator's own thread, no queue round-trip.
    Inline,
    /// Enqueue each item; the Job Processor pool executes them concurrently.
    Parallel,
}

crate::simple_display! {
    WorkStrategy {
        Inline => "inline",
        Parallel => "parallel",
    }
}

/// Produced by `Init`, consumed by the same worker's `CreateJobs` and stored
/// in the step job's metadata (§4.H step 2.c).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerInitResult {
    pub work_items: Vec<WorkItem>,
    pub total_count: usize,
    pub strategy: WorkStrategy,
    pub suggested_concurrency: u32,
    /// Fingerprints the prompt/inputs for cache invalidation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl WorkerInitResult {
    pub fn new(work_items: Vec<WorkItem>, strategy: WorkStrategy) -> Self {
        let total_count = work_items.len();
        Self {
            work_items,
            total_count,
            strategy,
            suggested_concurrency: 1,
            content_hash: None,
            metadata: HashMap::new(),
        }
    }

    /// Fingerprint `input` with SHA-256 for `content_hash` (cache invalidation).
    pub fn fingerprint(input: &[u8]) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(input);
        format!("{:x}", hasher.finalize())
    }

    /// True when Init produced no work (§4.H tie-break: the step completes
    /// successfully without invoking `CreateJobs`).
    pub fn is_empty(&self) -> bool {
        self.work_items.is_empty()
    }

    crate::setters! {
        option { content_hash: String }
        set { suggested_concurrency: u32, metadata: HashMap<String, serde_json::Value> }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_computes_total_count_from_items() {
        let items = vec![
            WorkItem { id: "1".into(), name: "a".into(), worker_type: "crawler_url".into(), config: HashMap::new() },
            WorkItem { id: "2".into(), name: "b".into(), worker_type: "crawler_url".into(), config: HashMap::new() },
        ];
        let result = WorkerInitResult::new(items, WorkStrategy::Parallel);
        assert_eq!(result.total_count, 2);
        assert!(!result.is_empty());
    }

    #[test]
    fn empty_work_items_reports_empty() {
        let result = WorkerInitResult::new(vec![], WorkStrategy::Inline);
        assert!(result.is_empty());
        assert_eq!(result.total_count, 0);
    }

    #[test]
    fn fingerprint_is_stable_and_distinguishes_input() {
        let a = WorkerInitResult::fingerprint(b"hello");
        let b = WorkerInitResult::fingerprint(b"hello");
        let c = WorkerInitResult::fingerprint(b"world");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
