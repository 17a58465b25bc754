// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The self-contained message a Job Worker dequeues (§3, §6 wire format).

use crate::job::JobId;
use crate::worker_type::WorkerType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A queued unit of work. Self-contained: a Job Worker can execute it with no
/// further lookups beyond its own collaborators (Credential Resolver,
/// Renderer). Validated with [`QueueJob::validate`] before enqueue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueJob {
    pub id: JobId,
    pub parent_id: JobId,
    #[serde(rename = "type")]
    pub worker_type: WorkerType,
    pub name: String,
    #[serde(default)]
    pub config: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub depth: u32,
    /// RFC 3339 timestamp, matching the on-disk/wire message format (§6).
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueueJobError {
    #[error("queue job name must not be empty")]
    EmptyName,
    #[error("queue job type must not be empty")]
    EmptyType,
    #[error("queue job parent_id must not be empty")]
    EmptyParent,
}

impl QueueJob {
    pub fn new(
        parent_id: JobId,
        worker_type: impl Into<WorkerType>,
        name: impl Into<String>,
        depth: u32,
    ) -> Self {
        Self {
            id: JobId::new(),
            parent_id,
            worker_type: worker_type.into(),
            name: name.into(),
            config: HashMap::new(),
            metadata: HashMap::new(),
            depth,
            created_at: chrono::Utc::now(),
        }
    }

    /// Validate before enqueue (the invariant named in §3: "Validated before
    /// enqueue"). Checked at the queue boundary, not on every field mutation.
    pub fn validate(&self) -> Result<(), QueueJobError> {
        if self.name.trim().is_empty() {
            return Err(QueueJobError::EmptyName);
        }
        if self.worker_type.as_str().trim().is_empty() {
            return Err(QueueJobError::EmptyType);
        }
        if self.parent_id.is_empty() {
            return Err(QueueJobError::EmptyParent);
        }
        Ok(())
    }

    crate::setters! {
        set { config: HashMap<String, serde_json::Value>, metadata: HashMap<String, serde_json::Value> }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[test]
    fn new_queue_job_validates() {
        let job = QueueJob::new(JobId::new(), "crawler_url", "crawl:https://x", 1);
        assert!(job.validate().is_ok());
    }

    #[parameterized(
        empty_name = { "", "crawler_url" },
        blank_name = { "   ", "crawler_url" },
    )]
    fn rejects_empty_name(name: &str, worker_type: &str) {
        let mut job = QueueJob::new(JobId::new(), worker_type, "placeholder", 0);
        job.name = name.to_string();
        assert_eq!(job.validate(), Err(QueueJobError::EmptyName));
    }

    #[test]
    fn rejects_empty_type() {
        let mut job = QueueJob::new(JobId::new(), "crawler_url", "crawl", 0);
        job.worker_type = "".into();
        assert_eq!(job.validate(), Err(QueueJobError::EmptyType));
    }

    #[test]
    fn serializes_type_field_and_rfc3339_timestamp() {
        let job = QueueJob::new(JobId::new(), "crawler_url", "crawl", 1);
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["type"], "crawler_url");
        assert!(json["created_at"].as_str().unwrap().contains('T'));
    }
}
