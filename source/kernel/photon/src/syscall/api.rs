// Copyright 2026 Lumen OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Syscall handlers exposed to the dispatcher
//! OWNERS: @kernel-team
//! PUBLIC API: Args, sys_vircopy, sys_safecopy_from/to, sys_setalarm, sys_times
//! DEPENDS_ON: copy engines, clock; lumen-abi wire types
//! INVARIANTS: Stable call numbers; Decode→Check→Execute — raw words are
//! decoded into typed values and rejected before any engine state is touched

use lumen_abi::{sys, CopyDir, CopyError, Endpoint, GrantId, ProcAddr};
use lumen_timers::Tick;

use super::{Error, Kernel, SysResult};
use crate::copy;

/// Raw argument words accompanying one trapped call.
#[derive(Clone, Copy, Debug, Default)]
pub struct Args([usize; 6]);

impl Args {
    /// Wraps the raw argument words.
    pub const fn new(raw: [usize; 6]) -> Self {
        Self(raw)
    }

    /// Returns argument `index`, zero when out of range.
    pub fn get(&self, index: usize) -> usize {
        self.0.get(index).copied().unwrap_or(0)
    }
}

fn decode_endpoint(raw: usize) -> Result<Endpoint, Error> {
    i32::try_from(raw as isize)
        .map(Endpoint::from_raw)
        .map_err(|_| Error::Copy(CopyError::InvalidArgument))
}

// Typed decoders, one per call shape.

#[derive(Copy, Clone)]
struct VircopyArgsTyped {
    src: Endpoint,
    src_addr: ProcAddr,
    dst: Endpoint,
    dst_addr: ProcAddr,
    length: usize,
}

impl VircopyArgsTyped {
    #[inline]
    fn decode(args: &Args) -> Result<Self, Error> {
        Ok(Self {
            src: decode_endpoint(args.get(0))?,
            src_addr: ProcAddr::new(args.get(1)),
            dst: decode_endpoint(args.get(2))?,
            dst_addr: ProcAddr::new(args.get(3)),
            length: args.get(4),
        })
    }
}

#[derive(Copy, Clone)]
struct SafecopyArgsTyped {
    granter: Endpoint,
    grant_id: GrantId,
    grant_offset: usize,
    local: ProcAddr,
    length: usize,
}

impl SafecopyArgsTyped {
    #[inline]
    fn decode(args: &Args) -> Result<Self, Error> {
        let grant_raw = args.get(1);
        let grant_id = u32::try_from(grant_raw)
            .map(GrantId::from_raw)
            .map_err(|_| Error::Copy(CopyError::BadGrant))?;
        Ok(Self {
            granter: decode_endpoint(args.get(0))?,
            grant_id,
            grant_offset: args.get(2),
            local: ProcAddr::new(args.get(3)),
            length: args.get(4),
        })
    }
}

#[derive(Copy, Clone)]
struct SetAlarmArgsTyped {
    ticks: Tick,
}

impl SetAlarmArgsTyped {
    #[inline]
    fn decode(args: &Args) -> Result<Self, Error> {
        Ok(Self { ticks: args.get(0) as Tick })
    }
}

/// `VIRCOPY`: ungated copy between two endpoints' arenas.
pub fn sys_vircopy(kernel: &mut Kernel, args: &Args) -> SysResult {
    let typed = VircopyArgsTyped::decode(args)?;
    copy::vircopy(
        kernel.procs_mut(),
        typed.src,
        typed.src_addr,
        typed.dst,
        typed.dst_addr,
        typed.length,
    )?;
    Ok(0)
}

/// `SAFECOPY_FROM`: grant-checked read out of a granter's arena.
pub fn sys_safecopy_from(kernel: &mut Kernel, caller: Endpoint, args: &Args) -> SysResult {
    let typed = SafecopyArgsTyped::decode(args)?;
    copy::safecopy(
        kernel.procs_mut(),
        CopyDir::FromGranter,
        caller,
        typed.granter,
        typed.grant_id,
        typed.grant_offset,
        typed.local,
        typed.length,
    )?;
    Ok(0)
}

/// `SAFECOPY_TO`: grant-checked write into a granter's arena.
pub fn sys_safecopy_to(kernel: &mut Kernel, caller: Endpoint, args: &Args) -> SysResult {
    let typed = SafecopyArgsTyped::decode(args)?;
    copy::safecopy(
        kernel.procs_mut(),
        CopyDir::ToGranter,
        caller,
        typed.granter,
        typed.grant_id,
        typed.grant_offset,
        typed.local,
        typed.length,
    )?;
    Ok(0)
}

/// `SETALARM`: arms (zero ticks: disarms) the caller's synchronous alarm.
///
/// Returns the previous alarm's remaining ticks, [`sys::ALARM_NEVER`] when
/// none was outstanding.
pub fn sys_setalarm(kernel: &mut Kernel, caller: Endpoint, args: &Args) -> SysResult {
    let typed = SetAlarmArgsTyped::decode(args)?;
    let previous = kernel.set_alarm(caller, typed.ticks)?;
    Ok(match previous {
        // Clamp below the sentinel so a huge remainder can never alias it.
        Some(remaining) => {
            usize::try_from(remaining).unwrap_or(usize::MAX).min(sys::ALARM_NEVER - 1)
        }
        None => sys::ALARM_NEVER,
    })
}

/// `TIMES`: reads the monotonic tick counter.
pub fn sys_times(kernel: &mut Kernel, _args: &Args) -> SysResult {
    Ok(kernel.clock().now() as usize)
}
