// Copyright 2026 Lumen OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Kernel state aggregate and the syscall dispatch boundary
//! OWNERS: @kernel-team
//! PUBLIC API: Kernel, SharedKernel, Error, SysResult, dispatch
//! DEPENDS_ON: proc, grant, copy, clock; spin (the kernel lock)
//! INVARIANTS: Every handler runs Decode→Check→Execute under one lock
//! acquisition, which serializes grant revocation against in-flight copies
//! ADR: docs/adr/0001-kernel-core-boundaries.md

extern crate alloc;

use core::fmt;

use lumen_abi::{CopyError, Endpoint, EndpointSpace};
use lumen_timers::Tick;

use crate::clock::KernelClock;
use crate::proc::{ProcError, ProcessTable};
use crate::{ARENA_LEN, SPACE};

pub mod api;

pub use api::Args;

/// Errors returned across the syscall boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Copy-engine failure (grants, ranges, peers).
    Copy(CopyError),
    /// Process-table failure (spawn/exit/liveness).
    Proc(ProcError),
    /// Unknown call number.
    BadCall(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy(err) => write!(f, "copy failed: {err}"),
            Self::Proc(err) => write!(f, "process table: {err}"),
            Self::BadCall(number) => write!(f, "unknown call number {number}"),
        }
    }
}

impl From<CopyError> for Error {
    fn from(err: CopyError) -> Self {
        Self::Copy(err)
    }
}

impl From<ProcError> for Error {
    fn from(err: ProcError) -> Self {
        Self::Proc(err)
    }
}

/// Result type produced by syscall handlers.
pub type SysResult = Result<usize, Error>;

/// The whole mutable kernel state: process table plus clock.
///
/// Embedders wrap it in [`SharedKernel`]; holding that lock across a whole
/// handler is the serialization discipline the grant contract requires.
pub struct Kernel {
    procs: ProcessTable,
    clock: KernelClock,
}

impl Kernel {
    /// Creates a kernel over `space` with `arena_len`-byte process arenas.
    pub fn new(space: EndpointSpace, arena_len: usize) -> Self {
        Self {
            procs: ProcessTable::new(space, arena_len),
            clock: KernelClock::new(space.slot_count() as usize),
        }
    }

    /// Creates a kernel with the stock build configuration.
    pub fn stock() -> Self {
        Self::new(SPACE, ARENA_LEN)
    }

    /// Wraps the kernel in its boundary lock.
    pub fn into_shared(self) -> SharedKernel {
        spin::Mutex::new(self)
    }

    /// Read view of the process table.
    pub fn procs(&self) -> &ProcessTable {
        &self.procs
    }

    /// Write view of the process table (policy-layer entry point).
    pub fn procs_mut(&mut self) -> &mut ProcessTable {
        &mut self.procs
    }

    /// Read view of the clock.
    pub fn clock(&self) -> &KernelClock {
        &self.clock
    }

    /// Spawns a process into the first vacant slot.
    pub fn spawn(&mut self) -> Result<Endpoint, ProcError> {
        self.procs.spawn()
    }

    /// Terminates `endpoint`, disarming any alarm it still has pending.
    pub fn exit(&mut self, endpoint: Endpoint) -> Result<(), ProcError> {
        let slot = self.procs.resolve(endpoint)?;
        self.clock.cancel_alarm(slot);
        self.procs.exit(endpoint)
    }

    /// Arms (or with zero ticks disarms) the synchronous alarm of `caller`.
    pub fn set_alarm(&mut self, caller: Endpoint, ticks: Tick) -> Result<Option<Tick>, Error> {
        let slot = self.procs.resolve(caller)?;
        Ok(self.clock.set_alarm(slot, caller, ticks))
    }

    /// Moves the clock forward and delivers due alarm notifications.
    pub fn advance_clock(&mut self, now: Tick) -> alloc::vec::Vec<Endpoint> {
        self.clock.advance(&mut self.procs, now)
    }

    /// Consumes a pending alarm notification for `endpoint`.
    pub fn take_alarm(&mut self, endpoint: Endpoint) -> Result<bool, ProcError> {
        Ok(self.procs.lookup_mut(endpoint)?.take_alarm())
    }
}

/// The kernel behind its boundary lock.
pub type SharedKernel = spin::Mutex<Kernel>;

// Embedders hand the locked kernel to service threads.
static_assertions::assert_impl_all!(SharedKernel: Send, Sync);

/// Routes one trapped call to its handler.
///
/// `caller` is the trapping process as established by the trap layer; the
/// privileged calls (`VIRCOPY`) rely on that layer to gate who may issue
/// them, which is outside this crate.
pub fn dispatch(kernel: &mut Kernel, caller: Endpoint, call: usize, args: &Args) -> SysResult {
    match call {
        lumen_abi::sys::VIRCOPY => api::sys_vircopy(kernel, args),
        lumen_abi::sys::SAFECOPY_FROM => api::sys_safecopy_from(kernel, caller, args),
        lumen_abi::sys::SAFECOPY_TO => api::sys_safecopy_to(kernel, caller, args),
        lumen_abi::sys::SETALARM => api::sys_setalarm(kernel, caller, args),
        lumen_abi::sys::TIMES => api::sys_times(kernel, args),
        other => Err(Error::BadCall(other)),
    }
}
