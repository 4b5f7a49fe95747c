// Copyright 2026 Lumen OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Grant-checked safe copy and the privileged raw virtual copy
//! OWNERS: @kernel-team
//! PUBLIC API: safecopy, vircopy
//! DEPENDS_ON: proc::ProcessTable, grant::authorize
//! INVARIANTS: safecopy never moves a byte without a grant authorizing the
//! exact range and direction; zero-length requests succeed with no
//! validation at all; same-arena copies use overlap-safe semantics
//!
//! Both engines run to completion under the caller's borrow of the process
//! table; the syscall layer holds the kernel lock across resolve-and-copy,
//! which is what keeps a concurrent revoke from racing a copy in flight.

use lumen_abi::{CopyDir, CopyError, Endpoint, GrantId, ProcAddr, Result};

use crate::grant::authorize;
use crate::proc::ProcessTable;

/// Copies `length` bytes between two endpoints' arenas with no grant check.
///
/// Reserved for callers whose legitimacy was established out of band; the
/// syscall layer exposes it under a privileged call number only.
pub fn vircopy(
    procs: &mut ProcessTable,
    src: Endpoint,
    src_addr: ProcAddr,
    dst: Endpoint,
    dst_addr: ProcAddr,
    length: usize,
) -> Result<()> {
    if length == 0 {
        return Ok(());
    }
    let src_index = procs.resolve(src)?;
    let dst_index = procs.resolve(dst)?;
    raw_copy(procs, src_index, src_addr, dst_index, dst_addr, length)
}

/// Copies `length` bytes between the caller and a granter, gated by the
/// granter's grant table.
///
/// `dir` picks the transfer direction: `FromGranter` reads out of the
/// granted range into the caller's `local` address, `ToGranter` writes the
/// caller's bytes into the granted range. Validation order: granter
/// liveness, grant resolution, grantee match, access mode, range.
pub fn safecopy(
    procs: &mut ProcessTable,
    dir: CopyDir,
    caller: Endpoint,
    granter: Endpoint,
    grant_id: GrantId,
    grant_offset: usize,
    local: ProcAddr,
    length: usize,
) -> Result<()> {
    if length == 0 {
        return Ok(());
    }
    let caller_index = procs.resolve(caller)?;
    let granter_index = procs.resolve(granter)?;
    let wildcard = procs.space().any();
    let granter_addr = {
        let granter_proc = procs.at(granter_index).ok_or(CopyError::PeerUnavailable)?;
        let grant = granter_proc.grants().resolve(grant_id).ok_or(CopyError::BadGrant)?;
        authorize(grant, caller, wildcard, dir, grant_offset, length)?
    };
    match dir {
        CopyDir::FromGranter => {
            raw_copy(procs, granter_index, granter_addr, caller_index, local, length)
        }
        CopyDir::ToGranter => {
            raw_copy(procs, caller_index, local, granter_index, granter_addr, length)
        }
    }
}

fn raw_copy(
    procs: &mut ProcessTable,
    src_index: usize,
    src_addr: ProcAddr,
    dst_index: usize,
    dst_addr: ProcAddr,
    length: usize,
) -> Result<()> {
    let src_start = src_addr.raw();
    let src_end = src_addr.checked_add(length).ok_or(CopyError::BadRange)?.raw();
    let dst_start = dst_addr.raw();
    let dst_end = dst_addr.checked_add(length).ok_or(CopyError::BadRange)?.raw();
    if src_index == dst_index {
        let arena = procs.at_mut(src_index).ok_or(CopyError::PeerUnavailable)?.arena_mut();
        if src_end > arena.len() || dst_end > arena.len() {
            return Err(CopyError::BadRange);
        }
        arena.copy_within(src_start..src_end, dst_start);
    } else {
        let (src_proc, dst_proc) =
            procs.pair_mut(src_index, dst_index).ok_or(CopyError::PeerUnavailable)?;
        let src_arena = src_proc.arena();
        let dst_arena = dst_proc.arena_mut();
        if src_end > src_arena.len() || dst_end > dst_arena.len() {
            return Err(CopyError::BadRange);
        }
        dst_arena[dst_start..dst_end].copy_from_slice(&src_arena[src_start..src_end]);
    }
    Ok(())
}
