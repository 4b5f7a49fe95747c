// Copyright 2026 Lumen OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Endpoint addressing: (generation, slot) pairs packed into one `i32`.
//!
//! A process-table slot is reused across process lifetimes; the generation
//! counter embedded in the endpoint is what makes a reference to a previous
//! occupant detectably stale. Encoding and decoding are total and raise no
//! errors; deciding whether a decoded slot currently hosts a live process is
//! the process table's job.

use core::fmt;

/// Opaque process identity carrying a generation and a slot index.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Endpoint(i32);

impl Endpoint {
    /// Reconstructs an endpoint from its wire representation.
    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the wire representation of this endpoint.
    #[inline]
    pub const fn to_raw(self) -> i32 {
        self.0
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Endpoint").field(&self.0).finish()
    }
}

/// Slot positions reserved per generation for the `any`/`none` sentinels.
pub const RESERVED_SLOTS: i32 = 2;

/// Construction-time description of an endpoint slot space.
///
/// The slot count is a runtime configuration value rather than a build-time
/// constant so tests can exercise small synthetic spaces. Valid slots are
/// `0..slot_count`; the two reserved positions directly above the valid
/// range hold the sentinels, and the generation size is padded by one more
/// so no valid `(generation, slot)` encoding can land on a sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndpointSpace {
    slots: i32,
}

impl EndpointSpace {
    /// Upper bound on configurable slot counts.
    pub const MAX_SLOTS: i32 = 4096;

    /// Creates a space with `slots` valid process slots.
    ///
    /// Returns `None` for a slot count outside `1..=MAX_SLOTS`.
    pub const fn new(slots: i32) -> Option<Self> {
        if slots >= 1 && slots <= Self::MAX_SLOTS {
            Some(Self { slots })
        } else {
            None
        }
    }

    /// Number of valid process slots in this space.
    #[inline]
    pub const fn slot_count(&self) -> i32 {
        self.slots
    }

    /// Width of one generation in the flat endpoint space.
    #[inline]
    pub const fn generation_size(&self) -> i32 {
        self.slots + RESERVED_SLOTS + 1
    }

    /// Largest generation representable without overflowing the encoding.
    #[inline]
    pub const fn max_generation(&self) -> i32 {
        i32::MAX / self.generation_size() - 1
    }

    /// Encodes a `(generation, slot)` pair.
    #[inline]
    pub const fn endpoint(&self, generation: i32, slot: i32) -> Endpoint {
        Endpoint(generation * self.generation_size() + slot)
    }

    /// Recovers the generation component of `endpoint`.
    #[inline]
    pub const fn generation(&self, endpoint: Endpoint) -> i32 {
        endpoint.0 / self.generation_size()
    }

    /// Recovers the slot component of `endpoint`.
    ///
    /// Total: sentinel endpoints decode to the reserved positions at and
    /// above `slot_count`, which `is_valid_slot` rejects.
    #[inline]
    pub const fn slot(&self, endpoint: Endpoint) -> i32 {
        endpoint.0 % self.generation_size()
    }

    /// Wildcard sentinel matching any endpoint.
    #[inline]
    pub const fn any(&self) -> Endpoint {
        self.endpoint(0, self.slots)
    }

    /// Sentinel naming no endpoint at all.
    #[inline]
    pub const fn none(&self) -> Endpoint {
        self.endpoint(0, self.slots + 1)
    }

    /// Whether `slot` is inside the valid (non-reserved) slot range.
    #[inline]
    pub const fn is_valid_slot(&self, slot: i32) -> bool {
        slot >= 0 && slot < self.slots
    }
}
