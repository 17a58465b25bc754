// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential backoff for an idle consumer (§4.I): `100ms * 2^n` capped at
//! `5s`, ±20% jitter so a pool of consumers polling an empty queue doesn't
//! wake in lockstep.

use rand::Rng;
use std::time::Duration;

const BASE: Duration = Duration::from_millis(100);
const CAP: Duration = Duration::from_secs(5);
const JITTER_FRACTION: f64 = 0.2;

pub struct Backoff {
    attempt: u32,
}

impl Backoff {
    pub fn new() -> Self {
        Self { attempt: 0 }
    }

    /// The next delay, with jitter applied, advancing internal state.
    /// Call [`Backoff::reset`] after a successful receive.
    pub fn next(&mut self) -> Duration {
        let unjittered = self.unjittered_delay();
        self.attempt = self.attempt.saturating_add(1);
        jitter(unjittered)
    }

    /// The delay `next` would apply before jitter, for test assertions on
    /// the cap and growth curve.
    fn unjittered_delay(&self) -> Duration {
        match BASE.checked_mul(1u32.checked_shl(self.attempt).unwrap_or(u32::MAX)) {
            Some(d) if d < CAP => d,
            _ => CAP,
        }
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

fn jitter(base: Duration) -> Duration {
    let delta = base.as_secs_f64() * JITTER_FRACTION;
    let offset = rand::rng().random_range(-delta..=delta);
    Duration::from_secs_f64((base.as_secs_f64() + offset).max(0.0))
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
