// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Error kinds every worker operation reports through, so the Job Processor
/// can decide ack/nack without downcasting (§4.I).
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("config invalid: {0}")]
    ConfigInvalid(String),
    #[error("transient: {0}")]
    Transient(String),
    #[error("fatal: {0}")]
    Fatal(String),
    #[error("cancelled")]
    Cancelled,
}

impl WorkerError {
    /// Only `Transient` failures are worth redelivering; the rest terminate
    /// the job on the processor's first attempt.
    pub fn retryable(&self) -> bool {
        matches!(self, WorkerError::Transient(_))
    }
}
