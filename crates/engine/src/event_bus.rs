// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process publish/subscribe fan-out over [`Event`] (§4.C). Best-effort:
//! a bounded `tokio::sync::broadcast` channel drops the oldest message for
//! any subscriber that falls behind rather than apply backpressure to the
//! writer; subscribers see that as a `Lagged` error.

use qo_core::Event;
use std::fmt;
use tokio::sync::broadcast;

pub struct EventBus {
    sender: broadcast::Sender<Event>,
    capacity: usize,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus").field("capacity", &self.capacity).field("subscribers", &self.sender.receiver_count()).finish()
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    /// Publish to all current subscribers. A `send` error (no subscribers)
    /// is not a failure here — publishing is fire-and-forget.
    pub fn publish(&self, event: Event) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
