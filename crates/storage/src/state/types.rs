// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supporting record types materialized alongside jobs and documents.

use qo_core::QueueJob;
use serde::{Deserialize, Serialize};

/// Queue item status. Distinct from [`qo_core::JobStatus`] — this tracks the
/// *message's* position in the at-least-once delivery pipeline, not the
/// downstream job's execution outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueItemStatus {
    /// Not currently leased; eligible for `Receive`.
    Pending,
    /// Leased by a consumer; invisible until `visible_again_at_ms`.
    Leased,
    /// Acked; terminal, kept for a grace period for idempotent re-acks.
    Acked,
    /// Retry budget exhausted; terminal, moved to the dead-letter state.
    Dead,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub message: QueueJob,
    pub status: QueueItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_again_at_ms: Option<u64>,
    #[serde(default)]
    pub delivery_count: u32,
}

impl QueueItem {
    pub fn new(message: QueueJob) -> Self {
        Self { message, status: QueueItemStatus::Pending, lease_id: None, visible_again_at_ms: None, delivery_count: 0 }
    }

    /// Visible to `Receive` right now: pending, or leased with an expired
    /// visibility timeout (redelivery).
    pub fn is_visible(&self, now_ms: u64) -> bool {
        match self.status {
            QueueItemStatus::Pending => true,
            QueueItemStatus::Leased => self.visible_again_at_ms.map_or(true, |t| now_ms >= t),
            QueueItemStatus::Acked | QueueItemStatus::Dead => false,
        }
    }
}
