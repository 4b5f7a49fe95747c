// Copyright 2026 Lumen OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Per-process capability grant table and authorization checks
//! OWNERS: @kernel-team
//! PUBLIC API: Grant, GrantTable (issue/revoke/resolve), authorize
//! DEPENDS_ON: lumen-abi grant types
//! INVARIANTS: The copy engine only ever reads grants; issue/revoke are the
//! policy layer's entry points and run under the same kernel lock as copies

extern crate alloc;

use alloc::vec::Vec;
use core::fmt;

use lumen_abi::{CopyDir, CopyError, Endpoint, GrantAccess, GrantId, ProcAddr};

/// One memory-access capability handed out by the owning process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grant {
    /// Endpoint allowed to use this grant, or the space's wildcard.
    pub grantee: Endpoint,
    /// Start of the granted range inside the owner's arena.
    pub base: ProcAddr,
    /// Length of the granted range in bytes.
    pub length: usize,
    /// Directions the grantee may copy in.
    pub access: GrantAccess,
}

/// Errors reported by grant bookkeeping (not by grant consumption).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantTableError {
    /// No free grant slots are left in the table.
    NoSpace,
}

impl fmt::Display for GrantTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSpace => write!(f, "grant table full"),
        }
    }
}

/// Bounded per-process grant table, addressed by [`GrantId`] slot handles.
pub struct GrantTable {
    slots: Vec<Option<Grant>>,
}

impl GrantTable {
    /// Creates an empty table sized for `slots` grants.
    pub fn with_capacity(slots: usize) -> Self {
        let mut table = Vec::with_capacity(slots);
        for _ in 0..slots {
            table.push(None);
        }
        Self { slots: table }
    }

    /// Records `grant` in the first free slot and returns its id.
    pub fn issue(&mut self, grant: Grant) -> Result<GrantId, GrantTableError> {
        for (index, entry) in self.slots.iter_mut().enumerate() {
            if entry.is_none() {
                *entry = Some(grant);
                return Ok(GrantId::from_raw(index as u32));
            }
        }
        Err(GrantTableError::NoSpace)
    }

    /// Revokes the grant in `id`; returns whether a grant was present.
    pub fn revoke(&mut self, id: GrantId) -> bool {
        match self.slots.get_mut(id.as_index()) {
            Some(entry) => entry.take().is_some(),
            None => false,
        }
    }

    /// Resolves `id` to its grant, if one is live.
    pub fn resolve(&self, id: GrantId) -> Option<&Grant> {
        self.slots.get(id.as_index()).and_then(|entry| entry.as_ref())
    }
}

/// Checks that `grant` authorizes `grantee` to copy `length` bytes in `dir`
/// starting `offset` bytes into the granted range.
///
/// Check order is fixed: grantee match, then access mode, then range. On
/// success returns the effective address inside the granter's arena.
pub fn authorize(
    grant: &Grant,
    grantee: Endpoint,
    wildcard: Endpoint,
    dir: CopyDir,
    offset: usize,
    length: usize,
) -> Result<ProcAddr, CopyError> {
    if grant.grantee != grantee && grant.grantee != wildcard {
        return Err(CopyError::PermissionDenied);
    }
    if !grant.access.permits(dir) {
        return Err(CopyError::PermissionDenied);
    }
    let end = offset.checked_add(length).ok_or(CopyError::BadRange)?;
    if end > grant.length {
        return Err(CopyError::BadRange);
    }
    grant.base.checked_add(offset).ok_or(CopyError::BadRange)
}

#[cfg(test)]
mod tests_prop;
