// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier, status state machine, and the persistent job record.

use crate::clock::Clock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

crate::define_id! {
    /// Unique identifier for a job instance (root, step, or leaf).
    pub struct JobId("job-");
}

/// Where a job sits in the flat parent/child hierarchy (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// The root job for a Job Definition run.
    Execution,
    /// One step of a run, child of the root.
    Step,
    /// A queue-dispatched unit of work spawned under a step.
    Leaf,
}

crate::simple_display! {
    JobPhase {
        Execution => "execution",
        Step => "step",
        Leaf => "leaf",
    }
}

/// Job status. Progresses monotonically: `Pending -> Running -> terminal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }

    /// Ordinal used to enforce monotone progression. Terminal states are all
    /// equally "after" Running; the specific terminal value is a choice, not
    /// a further ordering, so re-delivery of a terminal job is a no-op rather
    /// than an error (checked by callers, not by ordinal comparison alone).
    fn rank(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Running => 1,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled => 2,
        }
    }

    /// Validate a transition from `self` to `next`. Re-delivery of a terminal
    /// job (same terminal status twice) is accepted as a no-op per the
    /// at-least-once queue contract; any other backward move is rejected.
    pub fn validate_transition(self, next: JobStatus) -> Result<(), StatusTransitionError> {
        if self.is_terminal() {
            if self == next {
                return Ok(());
            }
            return Err(StatusTransitionError { from: self, to: next });
        }
        if next.rank() < self.rank() {
            return Err(StatusTransitionError { from: self, to: next });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal job status transition: {from} -> {to}")]
pub struct StatusTransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// Persistent job record (§3 `Job`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Points at the *root* job for flat hierarchy (root's own `parent_id == id`).
    pub parent_id: JobId,
    /// Immediate predecessor in spawn order (crawler child links); `None` for
    /// jobs created directly by the Step Orchestrator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovered_by: Option<JobId>,
    pub worker_type: String,
    pub name: String,
    pub phase: JobPhase,
    pub status: JobStatus,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
    #[serde(default)]
    pub progress_current: u64,
    #[serde(default)]
    pub progress_total: u64,
    pub depth: u32,
    /// Serialized `QueueJob` payload (present for leaf jobs dispatched through
    /// the message queue; absent for the root/step jobs created in-process by
    /// the orchestrator).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Job {
    /// Create a new root job (its own parent).
    pub fn new_root(name: impl Into<String>, worker_type: impl Into<String>, clock: &impl Clock) -> Self {
        let id = JobId::new();
        Self {
            id,
            parent_id: id,
            discovered_by: None,
            worker_type: worker_type.into(),
            name: name.into(),
            phase: JobPhase::Execution,
            status: JobStatus::Pending,
            created_at_ms: clock.epoch_ms(),
            started_at_ms: None,
            finished_at_ms: None,
            progress_current: 0,
            progress_total: 0,
            depth: 0,
            payload: None,
            error: None,
            metadata: HashMap::new(),
        }
    }

    /// Create a new non-root job under `parent_id` (the run's root).
    pub fn new_child(
        name: impl Into<String>,
        worker_type: impl Into<String>,
        phase: JobPhase,
        parent_id: JobId,
        discovered_by: Option<JobId>,
        depth: u32,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: JobId::new(),
            parent_id,
            discovered_by,
            worker_type: worker_type.into(),
            name: name.into(),
            phase,
            status: JobStatus::Pending,
            created_at_ms: clock.epoch_ms(),
            started_at_ms: None,
            finished_at_ms: None,
            progress_current: 0,
            progress_total: 0,
            depth,
            payload: None,
            error: None,
            metadata: HashMap::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id == self.id
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            name: String = "test-job",
            worker_type: String = "test_worker",
        }
        set {
            phase: JobPhase = JobPhase::Leaf,
            status: JobStatus = JobStatus::Pending,
            depth: u32 = 0,
            progress_current: u64 = 0,
            progress_total: u64 = 0,
            metadata: HashMap<String, serde_json::Value> = HashMap::new(),
        }
        option {
            discovered_by: JobId = None,
            payload: serde_json::Value = None,
            error: String = None,
        }
        computed {
            id: JobId = JobId::new(),
            parent_id: JobId = JobId::new(),
            created_at_ms: u64 = 0,
            started_at_ms: Option<u64> = None,
            finished_at_ms: Option<u64> = None,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
