// Copyright 2026 Lumen OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: tick_delay driven end-to-end over the Photon kernel clock
//! OWNERS: @runtime
//!
//! TEST_SCOPE:
//!   - Blocking delay wakes exactly on the kernel alarm notification
//!   - A pre-existing shorter alarm survives a longer delay (corrected re-arm)

use std::thread;

use alarmd::tick_delay;
use lumen_abi::sys;
use lumen_e2e::{shared_kernel, spawn, KernelAlarmClock};
use photon::syscall::{dispatch, Args};

#[test]
fn delay_completes_when_kernel_clock_reaches_deadline() {
    let kernel = shared_kernel();
    let caller = spawn(&kernel);
    let mut clock = KernelAlarmClock::new(kernel.clone(), caller);

    let waiter = thread::spawn(move || tick_delay(&mut clock, 10).expect("delay"));
    while !waiter.is_finished() {
        let now = kernel.lock().clock().now();
        kernel.lock().advance_clock(now + 1);
        thread::yield_now();
    }
    waiter.join().expect("waiter exits cleanly");
    assert!(kernel.lock().clock().now() >= 10);
}

#[test]
fn shorter_pending_alarm_is_serviced_after_the_delay() {
    let kernel = shared_kernel();
    let caller = spawn(&kernel);

    // A 5-tick alarm is outstanding before the server blocks for 20 ticks.
    let previous =
        dispatch(&mut kernel.lock(), caller, sys::SETALARM, &Args::new([5, 0, 0, 0, 0, 0]))
            .expect("armed");
    assert_eq!(previous, sys::ALARM_NEVER);

    let mut clock = KernelAlarmClock::new(kernel.clone(), caller);
    let waiter = thread::spawn(move || tick_delay(&mut clock, 20).expect("delay"));

    // Hold time still until the delay's own alarm superseded the short one,
    // so the short alarm cannot fire early and fake the wake-up.
    while kernel.lock().clock().next_deadline() != Some(20) {
        thread::yield_now();
    }
    kernel.lock().advance_clock(20);
    waiter.join().expect("waiter exits cleanly");

    // The corrected remainder (floored at one tick) is armed again.
    assert_eq!(kernel.lock().clock().next_deadline(), Some(21));
    kernel.lock().advance_clock(21);
    assert!(kernel.lock().take_alarm(caller).expect("live"));
}
