// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn fake_clock_advances_monotonically() {
    let clock = FakeClock::new(1_000);
    assert_eq!(clock.epoch_ms(), 1_000);
    clock.advance_ms(500);
    assert_eq!(clock.epoch_ms(), 1_500);
}

#[test]
fn fake_clock_can_be_set_directly() {
    let clock = FakeClock::new(0);
    clock.set_ms(42);
    assert_eq!(clock.epoch_ms(), 42);
}

#[test]
fn system_clock_is_nonzero() {
    let clock = SystemClock;
    assert!(clock.epoch_ms() > 0);
}
