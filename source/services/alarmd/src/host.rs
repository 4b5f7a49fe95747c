// Copyright 2026 Lumen OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Host-side clock backends for testing the alarm service
//! OWNERS: @runtime
//!
//! PUBLIC API:
//!   - ScriptClock: deterministic single-thread backend recording arm calls
//!   - VirtualClock / VirtualClockDriver: tick clock driven from a test thread
//!
//! SECURITY INVARIANTS:
//!   - No unsafe code; all shared state behind parking_lot locks
//!   - The notification is a single pending bit, so repeated fires coalesce
//!     exactly like the kernel's alarm notice
//!
//! ERROR CONDITIONS:
//!   - AlarmError::ClockUnavailable: scripted rejection (ScriptClock only)

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::{AlarmClock, AlarmError};

/// Scripted in-process clock for unit tests.
///
/// `arm` records every request and returns a scripted outstanding-alarm
/// remainder on the first call; `wait` wakes instantly.
#[derive(Default)]
pub struct ScriptClock {
    outstanding: Option<i64>,
    armed: Vec<i64>,
    reject: bool,
}

impl ScriptClock {
    /// Clock with no previously outstanding alarm.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock that reports `remaining` ticks left on a pre-existing alarm.
    pub fn with_outstanding(remaining: i64) -> Self {
        Self { outstanding: Some(remaining), ..Self::default() }
    }

    /// Clock whose arm requests all fail.
    pub fn unavailable() -> Self {
        Self { reject: true, ..Self::default() }
    }

    /// Every arm request issued so far, in order.
    pub fn armed(&self) -> &[i64] {
        &self.armed
    }
}

impl AlarmClock for ScriptClock {
    fn arm(&mut self, ticks: i64) -> Result<Option<i64>, AlarmError> {
        if self.reject {
            return Err(AlarmError::ClockUnavailable);
        }
        self.armed.push(ticks);
        Ok(self.outstanding.take())
    }

    fn wait(&mut self) {}
}

struct VirtualState {
    now: i64,
    deadline: Option<i64>,
    fired: bool,
}

struct VirtualInner {
    state: Mutex<VirtualState>,
    wakeup: Condvar,
}

/// Caller half of a ticking clock driven by a separate test thread.
pub struct VirtualClock {
    inner: Arc<VirtualInner>,
}

/// Driver half: advances time and fires due alarms.
#[derive(Clone)]
pub struct VirtualClockDriver {
    inner: Arc<VirtualInner>,
}

/// Creates a connected caller/driver clock pair starting at tick zero.
pub fn virtual_clock() -> (VirtualClock, VirtualClockDriver) {
    let inner = Arc::new(VirtualInner {
        state: Mutex::new(VirtualState { now: 0, deadline: None, fired: false }),
        wakeup: Condvar::new(),
    });
    (VirtualClock { inner: inner.clone() }, VirtualClockDriver { inner })
}

impl AlarmClock for VirtualClock {
    fn arm(&mut self, ticks: i64) -> Result<Option<i64>, AlarmError> {
        let mut state = self.inner.state.lock();
        let previous = state.deadline.map(|deadline| deadline - state.now);
        state.deadline = Some(state.now + ticks);
        Ok(previous)
    }

    fn wait(&mut self) {
        let mut state = self.inner.state.lock();
        while !state.fired {
            self.inner.wakeup.wait(&mut state);
        }
        state.fired = false;
    }
}

impl VirtualClockDriver {
    /// Moves the clock forward by `ticks`, firing a due alarm.
    pub fn advance(&self, ticks: i64) {
        let mut state = self.inner.state.lock();
        state.now += ticks;
        if state.deadline.is_some_and(|deadline| deadline <= state.now) {
            state.deadline = None;
            state.fired = true;
            log::trace!("virtual clock fired at tick {}", state.now);
            self.inner.wakeup.notify_all();
        }
    }

    /// Current tick count.
    pub fn now(&self) -> i64 {
        self.inner.state.lock().now
    }

    /// Pending alarm deadline, if one is armed.
    pub fn deadline(&self) -> Option<i64> {
        self.inner.state.lock().deadline
    }
}
