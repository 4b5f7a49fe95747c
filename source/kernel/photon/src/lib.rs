// Copyright 2026 Lumen OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]
#![deny(clippy::all)]

//! CONTEXT: Photon microkernel core — process slots, grants, safe copies, clock
//! OWNERS: @kernel-team
//! PUBLIC API: ProcessTable, GrantTable, safecopy/vircopy, KernelClock, syscall::Kernel
//! DEPENDS_ON: lumen-abi (endpoint/grant types), lumen-timers (clock queue)
//! INVARIANTS: Grants checked before every cross-arena copy; endpoint
//! generation validated on every lookup; all kernel state mutated under one
//! lock at the syscall boundary
//! ADR: docs/adr/0001-kernel-core-boundaries.md

extern crate alloc;

pub mod clock;
pub mod copy;
pub mod grant;
pub mod proc;
pub mod syscall;

use lumen_abi::{Endpoint, EndpointSpace};

/// Process-table slots configured for the stock kernel build.
pub const NR_PROCS: i32 = 64;

/// Default per-process arena length in bytes.
pub const ARENA_LEN: usize = 64 * 1024;

/// Endpoint space of the stock kernel build.
pub const SPACE: EndpointSpace = match EndpointSpace::new(NR_PROCS) {
    Some(space) => space,
    None => panic!("NR_PROCS within EndpointSpace bounds"),
};

/// Wildcard endpoint of the stock space.
pub const ANY: Endpoint = SPACE.any();

/// Null endpoint of the stock space.
pub const NONE: Endpoint = SPACE.none();
