// Copyright 2026 Lumen OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Shared fixtures for the end-to-end scenarios: a small-slot kernel behind
//! its boundary lock and an [`alarmd::AlarmClock`] backend that goes through
//! the kernel's syscall dispatcher like a real server would.

use std::sync::Arc;
use std::thread;

use alarmd::{AlarmClock, AlarmError};
use lumen_abi::{sys, Endpoint, EndpointSpace};
use photon::syscall::{dispatch, Args, Kernel, SharedKernel};

/// Arena bytes given to each test process.
pub const TEST_ARENA_LEN: usize = 512;

/// Builds a shared kernel over a small synthetic slot space.
pub fn shared_kernel() -> Arc<SharedKernel> {
    let space = EndpointSpace::new(8).expect("test slot space");
    Arc::new(Kernel::new(space, TEST_ARENA_LEN).into_shared())
}

/// Spawns one process and returns its endpoint.
pub fn spawn(kernel: &SharedKernel) -> Endpoint {
    kernel.lock().spawn().expect("free slot")
}

/// Encodes an endpoint as a raw syscall argument word.
pub fn ep_arg(endpoint: Endpoint) -> usize {
    endpoint.to_raw() as isize as usize
}

/// Alarm-clock backend that traps into the shared kernel.
///
/// `arm` issues `SETALARM` through the dispatcher; `wait` polls the caller's
/// pending-notification bit, yielding between probes, until the clock driver
/// thread advances time past the deadline.
pub struct KernelAlarmClock {
    kernel: Arc<SharedKernel>,
    caller: Endpoint,
}

impl KernelAlarmClock {
    /// Creates a backend trapping as `caller`.
    pub fn new(kernel: Arc<SharedKernel>, caller: Endpoint) -> Self {
        Self { kernel, caller }
    }
}

impl AlarmClock for KernelAlarmClock {
    fn arm(&mut self, ticks: i64) -> Result<Option<i64>, AlarmError> {
        let ticks = u64::try_from(ticks).map_err(|_| AlarmError::ClockUnavailable)?;
        let args = Args::new([ticks as usize, 0, 0, 0, 0, 0]);
        let mut kernel = self.kernel.lock();
        let previous = dispatch(&mut kernel, self.caller, sys::SETALARM, &args)
            .map_err(|_| AlarmError::ClockUnavailable)?;
        Ok((previous != sys::ALARM_NEVER).then_some(previous as i64))
    }

    fn wait(&mut self) {
        loop {
            if self.kernel.lock().take_alarm(self.caller).unwrap_or(false) {
                return;
            }
            thread::yield_now();
        }
    }
}
