// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn delays_grow_until_the_cap() {
    let mut backoff = Backoff::new(100, 10_000);

    let d1 = backoff.next_delay_ms();
    let d2 = backoff.next_delay_ms();
    let d3 = backoff.next_delay_ms();

    // Each delay sits in [base * 2^n, base * 2^n + jitter].
    assert!((100..=100 + JITTER_MS).contains(&d1));
    assert!((200..=200 + JITTER_MS).contains(&d2));
    assert!((400..=400 + JITTER_MS).contains(&d3));
}

#[test]
fn delays_saturate_at_the_cap() {
    let mut backoff = Backoff::new(100, 500);

    for _ in 0..50 {
        let delay = backoff.next_delay_ms();
        assert!(delay <= 500 + JITTER_MS);
    }

    // Saturated: every further delay stays within the capped range.
    let delay = backoff.next_delay_ms();
    assert!((500..=500 + JITTER_MS).contains(&delay));
}

#[test]
fn attempt_counter_does_not_overflow() {
    let mut backoff = Backoff::new(500, 30 * 60 * 1000);

    // Far more calls than doublings to reach the cap.
    for _ in 0..10_000 {
        let delay = backoff.next_delay_ms();
        assert!(delay <= 30 * 60 * 1000 + JITTER_MS);
    }
}

#[test]
fn reset_restores_the_first_call_range() {
    let mut backoff = Backoff::new(100, 10_000);
    backoff.next_delay_ms();
    backoff.next_delay_ms();
    backoff.next_delay_ms();

    backoff.reset();

    let delay = backoff.next_delay_ms();
    assert!((100..=100 + JITTER_MS).contains(&delay));
}

#[test]
fn duration_form_matches_millisecond_range() {
    let mut backoff = Backoff::new(100, 10_000);
    let delay = backoff.next_delay();
    assert!(delay >= Duration::from_millis(100));
    assert!(delay <= Duration::from_millis(100 + JITTER_MS));
}
