// Copyright 2026 Lumen OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Process slot table with generation-tracked endpoints
//! OWNERS: @kernel-team
//! PUBLIC API: ProcessTable (spawn/exit/lookup), Process, ProcError
//! DEPENDS_ON: lumen-abi EndpointSpace, grant::GrantTable
//! INVARIANTS: Slot reuse bumps the generation, so endpoints issued to a
//! previous occupant stop resolving the instant that occupant exits

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use lumen_abi::{CopyError, Endpoint, EndpointSpace};

use crate::grant::GrantTable;

/// Grant-table capacity given to every spawned process.
pub const GRANTS_PER_PROC: usize = 32;

/// Errors reported by process-table operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcError {
    /// Endpoint decodes to a slot outside the configured space.
    BadEndpoint,
    /// Slot exists but hosts no process.
    Vacant,
    /// Slot is occupied by a later generation than the endpoint names.
    Stale,
    /// No vacant slot is left to spawn into.
    NoFreeSlot,
}

impl fmt::Display for ProcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadEndpoint => write!(f, "endpoint outside configured slot space"),
            Self::Vacant => write!(f, "slot hosts no process"),
            Self::Stale => write!(f, "endpoint generation out of date"),
            Self::NoFreeSlot => write!(f, "process table full"),
        }
    }
}

impl From<ProcError> for CopyError {
    fn from(err: ProcError) -> Self {
        match err {
            ProcError::Vacant | ProcError::Stale => Self::PeerUnavailable,
            ProcError::BadEndpoint | ProcError::NoFreeSlot => Self::InvalidArgument,
        }
    }
}

/// One live process: its identity, memory arena, grants and alarm state.
pub struct Process {
    endpoint: Endpoint,
    arena: Vec<u8>,
    grants: GrantTable,
    alarm_pending: bool,
}

impl Process {
    fn new(endpoint: Endpoint, arena_len: usize) -> Self {
        Self {
            endpoint,
            arena: vec![0; arena_len],
            grants: GrantTable::with_capacity(GRANTS_PER_PROC),
            alarm_pending: false,
        }
    }

    /// Endpoint this process was spawned with.
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Read view of the process arena.
    pub fn arena(&self) -> &[u8] {
        &self.arena
    }

    /// Write view of the process arena.
    pub fn arena_mut(&mut self) -> &mut [u8] {
        &mut self.arena
    }

    /// Read view of the process grant table.
    pub fn grants(&self) -> &GrantTable {
        &self.grants
    }

    /// Write view of the process grant table (policy-layer entry point).
    pub fn grants_mut(&mut self) -> &mut GrantTable {
        &mut self.grants
    }

    /// Marks the synchronous alarm notification pending.
    pub fn post_alarm(&mut self) {
        self.alarm_pending = true;
    }

    /// Consumes a pending alarm notification, if any.
    pub fn take_alarm(&mut self) -> bool {
        core::mem::take(&mut self.alarm_pending)
    }
}

struct SlotEntry {
    generation: i32,
    occupant: Option<Process>,
}

/// The kernel's process table.
///
/// Slots are reused; each reuse bumps the slot's generation and the new
/// occupant's endpoint embeds that generation. Lookups therefore reject
/// endpoints issued to any earlier occupant of the same slot.
pub struct ProcessTable {
    space: EndpointSpace,
    arena_len: usize,
    slots: Vec<SlotEntry>,
}

impl ProcessTable {
    /// Creates an empty table over `space`, each process getting an arena of
    /// `arena_len` bytes.
    pub fn new(space: EndpointSpace, arena_len: usize) -> Self {
        let mut slots = Vec::with_capacity(space.slot_count() as usize);
        for _ in 0..space.slot_count() {
            slots.push(SlotEntry { generation: 0, occupant: None });
        }
        Self { space, arena_len, slots }
    }

    /// Endpoint space this table was configured with.
    pub fn space(&self) -> EndpointSpace {
        self.space
    }

    /// Spawns a process into the first vacant slot and returns its endpoint.
    pub fn spawn(&mut self) -> Result<Endpoint, ProcError> {
        let index = self
            .slots
            .iter()
            .position(|slot| slot.occupant.is_none())
            .ok_or(ProcError::NoFreeSlot)?;
        let entry = &mut self.slots[index];
        // Generations stay in [1, max_generation]; wrap skips 0 so reused
        // slots never revisit the boot-time value.
        entry.generation = entry.generation % self.space.max_generation() + 1;
        let endpoint = self.space.endpoint(entry.generation, index as i32);
        entry.occupant = Some(Process::new(endpoint, self.arena_len));
        Ok(endpoint)
    }

    /// Terminates the process named by `endpoint`.
    ///
    /// The slot's generation is left in place, so the dead endpoint keeps
    /// decoding to the slot but stops resolving.
    pub fn exit(&mut self, endpoint: Endpoint) -> Result<(), ProcError> {
        let index = self.resolve(endpoint)?;
        self.slots[index].occupant = None;
        Ok(())
    }

    /// Resolves `endpoint` to its slot index, enforcing liveness and
    /// generation match.
    pub fn resolve(&self, endpoint: Endpoint) -> Result<usize, ProcError> {
        let slot = self.space.slot(endpoint);
        if !self.space.is_valid_slot(slot) {
            return Err(ProcError::BadEndpoint);
        }
        let index = slot as usize;
        let entry = &self.slots[index];
        match &entry.occupant {
            None => Err(ProcError::Vacant),
            Some(_) if entry.generation != self.space.generation(endpoint) => Err(ProcError::Stale),
            Some(_) => Ok(index),
        }
    }

    /// Borrows the process named by `endpoint`.
    pub fn lookup(&self, endpoint: Endpoint) -> Result<&Process, ProcError> {
        let index = self.resolve(endpoint)?;
        self.slots[index].occupant.as_ref().ok_or(ProcError::Vacant)
    }

    /// Mutably borrows the process named by `endpoint`.
    pub fn lookup_mut(&mut self, endpoint: Endpoint) -> Result<&mut Process, ProcError> {
        let index = self.resolve(endpoint)?;
        self.slots[index].occupant.as_mut().ok_or(ProcError::Vacant)
    }

    /// Borrows the process in a resolved slot.
    pub(crate) fn at(&self, index: usize) -> Option<&Process> {
        self.slots.get(index).and_then(|entry| entry.occupant.as_ref())
    }

    /// Mutably borrows the process in a resolved slot.
    pub(crate) fn at_mut(&mut self, index: usize) -> Option<&mut Process> {
        self.slots.get_mut(index).and_then(|entry| entry.occupant.as_mut())
    }

    /// Mutably borrows two distinct resolved slots at once.
    pub(crate) fn pair_mut(&mut self, a: usize, b: usize) -> Option<(&mut Process, &mut Process)> {
        if a == b || a >= self.slots.len() || b >= self.slots.len() {
            return None;
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.slots.split_at_mut(high);
        let first = head[low].occupant.as_mut()?;
        let second = tail[0].occupant.as_mut()?;
        if a < b {
            Some((first, second))
        } else {
            Some((second, first))
        }
    }
}
