// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Jittered exponential backoff for reconnection delays.
//!
//! Delays double per attempt up to a configured cap. A uniform jitter of up
//! to one second is added so a fleet of clients losing the same server does
//! not retry in lockstep.

use std::time::Duration;

use rand::Rng;

/// Upper bound of the uniform jitter added to every delay, in milliseconds.
pub const JITTER_MS: u64 = 1000;

/// Exponential backoff calculator.
///
/// The attempt counter freezes once the undoubled delay reaches the cap, so
/// repeated calls during a long outage cannot overflow.
#[derive(Debug)]
pub struct Backoff {
    base_ms: u64,
    max_ms: u64,
    attempt: u32,
}

impl Backoff {
    /// Creates a backoff starting at `base_ms` with a cap of `max_ms`.
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Backoff {
            base_ms,
            max_ms,
            attempt: 0,
        }
    }

    /// Returns the next delay in milliseconds: `base * 2^attempt` clamped
    /// to the cap, plus jitter in `[0, JITTER_MS]`.
    pub fn next_delay_ms(&mut self) -> u64 {
        let factor = 1u64.checked_shl(self.attempt).unwrap_or(u64::MAX);
        let unclamped = self.base_ms.saturating_mul(factor);
        let clamped = unclamped.min(self.max_ms);
        if unclamped < self.max_ms {
            self.attempt = self.attempt.saturating_add(1);
        }
        clamped + rand::rng().random_range(0..=JITTER_MS)
    }

    /// Returns the next delay as a [`Duration`].
    pub fn next_delay(&mut self) -> Duration {
        Duration::from_millis(self.next_delay_ms())
    }

    /// Restores the first-call delay range, e.g. after a successful connect.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
