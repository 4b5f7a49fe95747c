// Copyright 2026 Lumen OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Kernel tick clock and per-process synchronous alarms
//! OWNERS: @kernel-team
//! PUBLIC API: KernelClock (set_alarm/cancel_alarm/advance), AlarmOutbox
//! DEPENDS_ON: lumen-timers queue, proc::ProcessTable (notification delivery)
//! INVARIANTS: At most one outstanding alarm per process slot; arming a new
//! alarm supersedes the old and reports its remaining ticks; delivery goes by
//! endpoint, so alarms armed by a dead occupant never reach the slot's next one

extern crate alloc;

use alloc::boxed::Box;
use alloc::vec::Vec;

use lumen_abi::Endpoint;
use lumen_timers::{Tick, TimerHandle, TimerQueue};

use crate::proc::ProcessTable;

/// Watchdog context: endpoints whose alarms fired during one expiry sweep.
#[derive(Default)]
pub struct AlarmOutbox {
    fired: Vec<Endpoint>,
}

/// The clock-owning component: monotonic tick counter plus the alarm queue.
pub struct KernelClock {
    now: Tick,
    timers: TimerQueue<AlarmOutbox>,
    alarms: Vec<TimerHandle>,
}

impl KernelClock {
    /// Creates a clock at tick zero with one alarm timer per process slot.
    pub fn new(slot_count: usize) -> Self {
        let mut timers = TimerQueue::with_capacity(slot_count);
        let mut alarms = Vec::with_capacity(slot_count);
        for _ in 0..slot_count {
            // The arena is sized for exactly one alarm per slot.
            alarms.push(timers.create().expect("alarm arena sized to slot count"));
        }
        Self { now: 0, timers, alarms }
    }

    /// Current monotonic tick count.
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Expiry of the next pending alarm, for re-arming the hardware timer.
    pub fn next_deadline(&self) -> Option<Tick> {
        self.timers.head_expiry()
    }

    /// Arms the alarm of the process in `slot` for `ticks` from now, on
    /// behalf of `caller`; `ticks == 0` disarms instead.
    ///
    /// Returns the remaining ticks of the superseded alarm, `None` when no
    /// alarm was outstanding.
    pub fn set_alarm(&mut self, slot: usize, caller: Endpoint, ticks: Tick) -> Option<Tick> {
        let handle = self.alarms[slot];
        let previous =
            self.timers.deadline(handle).map(|expiry| expiry.saturating_sub(self.now));
        if ticks == 0 {
            self.timers.cancel(handle);
        } else {
            let expiry = self.now.saturating_add(ticks);
            self.timers.schedule(
                handle,
                expiry,
                Box::new(move |_, outbox: &mut AlarmOutbox, _| outbox.fired.push(caller)),
            );
        }
        previous
    }

    /// Disarms any alarm pending for `slot` (process exit path).
    pub fn cancel_alarm(&mut self, slot: usize) {
        self.timers.cancel(self.alarms[slot]);
    }

    /// Moves the clock to `now` and fires every due alarm, posting the
    /// notification to each armer that is still alive.
    ///
    /// Alarms armed by an endpoint that has since died (or whose slot was
    /// reused) are dropped on the floor: delivery resolves the armer's
    /// endpoint, and a stale endpoint no longer resolves.
    pub fn advance(&mut self, procs: &mut ProcessTable, now: Tick) -> Vec<Endpoint> {
        if now > self.now {
            self.now = now;
        }
        let mut outbox = AlarmOutbox::default();
        self.timers.expire_due(self.now, &mut outbox);
        for &endpoint in &outbox.fired {
            if let Ok(proc) = procs.lookup_mut(endpoint) {
                proc.post_alarm();
            }
        }
        outbox.fired
    }
}
