// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only per-run log record (§3).

use crate::job::JobId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

crate::simple_display! {
    LogLevel {
        Debug => "debug",
        Info => "info",
        Warn => "warn",
        Error => "error",
    }
}

/// A single log line attached to a run. `job_id` is always the *root* job id
/// so that a run's logs aggregate regardless of which descendant emitted them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLog {
    pub job_id: JobId,
    pub level: LogLevel,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl JobLog {
    pub fn new(root_job_id: JobId, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            job_id: root_job_id,
            level,
            message: message.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn info(root_job_id: JobId, message: impl Into<String>) -> Self {
        Self::new(root_job_id, LogLevel::Info, message)
    }

    pub fn error(root_job_id: JobId, message: impl Into<String>) -> Self {
        Self::new(root_job_id, LogLevel::Error, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_attaches_root_id_regardless_of_emitter() {
        let root = JobId::new();
        let log = JobLog::info(root, "step started");
        assert_eq!(log.job_id, root);
        assert_eq!(log.level, LogLevel::Info);
    }

    #[test]
    fn level_ordering_is_severity_increasing() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn error_constructor_sets_error_level() {
        let log = JobLog::error(JobId::new(), "boom");
        assert_eq!(log.level, LogLevel::Error);
        assert_eq!(log.message, "boom");
    }
}
