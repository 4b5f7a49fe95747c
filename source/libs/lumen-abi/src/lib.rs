// Copyright 2026 Lumen OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

//! CONTEXT: Shared ABI definitions for the Photon kernel and its servers
//! OWNERS: @runtime
//! PUBLIC API: Endpoint, EndpointSpace, GrantId, GrantAccess, CopyDir, ProcAddr, CopyError
//! DEPENDS_ON: bitflags
//! INVARIANTS: Endpoint encoding is total and invertible; sentinel values never
//! collide with valid encodings; foreign addresses are never dereferenced locally
//! ADR: docs/adr/0001-kernel-core-boundaries.md

use core::fmt;

use bitflags::bitflags;

mod endpoint;

pub use endpoint::{Endpoint, EndpointSpace, RESERVED_SLOTS};

/// Result type returned by copy operations.
pub type Result<T> = core::result::Result<T, CopyError>;

/// Errors surfaced by the safe-copy and virtual-copy engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyError {
    /// Grant id does not resolve to a live grant in the granter's table.
    BadGrant,
    /// Grant resolves but grantee or access mode does not authorize the request.
    PermissionDenied,
    /// Requested offset/length falls outside the granted or addressable range.
    BadRange,
    /// Named endpoint is vacant or stale (generation mismatch).
    PeerUnavailable,
    /// Malformed input, e.g. a slot number outside the configured space.
    InvalidArgument,
}

impl fmt::Display for CopyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadGrant => write!(f, "grant does not resolve"),
            Self::PermissionDenied => write!(f, "grant does not authorize request"),
            Self::BadRange => write!(f, "range outside granted or addressable memory"),
            Self::PeerUnavailable => write!(f, "peer endpoint vacant or stale"),
            Self::InvalidArgument => write!(f, "malformed argument"),
        }
    }
}

#[cfg(test)]
impl std::error::Error for CopyError {}

bitflags! {
    /// Access modes a grant can confer on its grantee.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct GrantAccess: u32 {
        /// Grantee may read out of the granted range.
        const READ = 1 << 0;
        /// Grantee may write into the granted range.
        const WRITE = 1 << 1;
    }
}

impl GrantAccess {
    /// Whether this mode authorizes a copy in `dir`.
    #[inline]
    pub const fn permits(self, dir: CopyDir) -> bool {
        match dir {
            CopyDir::FromGranter => self.contains(Self::READ),
            CopyDir::ToGranter => self.contains(Self::WRITE),
        }
    }
}

/// Direction of a grant-checked copy, seen from the grantee.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyDir {
    /// Granter's memory into the grantee's (requires `GrantAccess::READ`).
    FromGranter,
    /// Grantee's memory into the granter's (requires `GrantAccess::WRITE`).
    ToGranter,
}

/// Handle naming one grant inside its owner's grant table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct GrantId(u32);

impl GrantId {
    /// Reconstructs a grant id from its wire representation.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the wire representation of this grant id.
    #[inline]
    pub const fn to_raw(self) -> u32 {
        self.0
    }

    /// Returns the id as an index into the owner's grant table.
    #[inline]
    pub const fn as_index(self) -> usize {
        self.0 as usize
    }
}

/// Byte offset within some process's address arena.
///
/// Opaque on purpose: a `ProcAddr` only has meaning relative to the process
/// it was issued against and must never be turned into a local pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct ProcAddr(usize);

impl ProcAddr {
    /// Wraps a raw arena offset.
    #[inline]
    pub const fn new(offset: usize) -> Self {
        Self(offset)
    }

    /// Returns the raw arena offset.
    #[inline]
    pub const fn raw(self) -> usize {
        self.0
    }

    /// Offset arithmetic that reports overflow instead of wrapping.
    #[inline]
    pub fn checked_add(self, bytes: usize) -> Option<ProcAddr> {
        self.0.checked_add(bytes).map(Self)
    }
}

/// Stable kernel call numbers exposed to servers.
pub mod sys {
    /// Ungated copy between two endpoints' arenas (privileged callers only).
    pub const VIRCOPY: usize = 1;
    /// Grant-checked copy out of a granter's arena into the caller's.
    pub const SAFECOPY_FROM: usize = 2;
    /// Grant-checked copy out of the caller's arena into a granter's.
    pub const SAFECOPY_TO: usize = 3;
    /// Arms (or with zero ticks disarms) the caller's synchronous alarm.
    pub const SETALARM: usize = 4;
    /// Reads the kernel's monotonic tick counter.
    pub const TIMES: usize = 5;

    /// `SETALARM` return value meaning no alarm was previously outstanding.
    pub const ALARM_NEVER: usize = usize::MAX;
}
