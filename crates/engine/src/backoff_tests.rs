// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn unjittered_delay_doubles_then_caps() {
    let mut b = Backoff::new();
    assert_eq!(b.unjittered_delay(), Duration::from_millis(100));
    b.attempt = 1;
    assert_eq!(b.unjittered_delay(), Duration::from_millis(200));
    b.attempt = 2;
    assert_eq!(b.unjittered_delay(), Duration::from_millis(400));
    b.attempt = 10;
    assert_eq!(b.unjittered_delay(), CAP);
    b.attempt = 1000;
    assert_eq!(b.unjittered_delay(), CAP);
}

#[test]
fn next_advances_attempt_and_stays_within_jitter_bounds_of_cap() {
    let mut b = Backoff::new();
    for _ in 0..50 {
        let d = b.next();
        assert!(d <= CAP + CAP.mul_f64(JITTER_FRACTION));
    }
}

#[test]
fn reset_returns_to_the_base_delay() {
    let mut b = Backoff::new();
    b.next();
    b.next();
    b.reset();
    assert_eq!(b.unjittered_delay(), BASE);
}
