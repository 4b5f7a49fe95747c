// Copyright 2026 Lumen OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg(test)]
//! CONTEXT: Property-based tests for grant authorization
//! OWNERS: @kernel-team
//! NOTE: Tests only; no kernel logic. Ensures authorization is sound over the
//! whole request space.
//!
//! TEST_SCOPE:
//!   - In-range requests against a permitting grant always authorize
//!   - Requests crossing the grant end never authorize
//!   - Authorized addresses always fall inside the granted range

use lumen_abi::{CopyDir, CopyError, EndpointSpace, GrantAccess, ProcAddr};
use proptest::prelude::*;

use super::{authorize, Grant};

const SPACE: EndpointSpace = match EndpointSpace::new(16) {
    Some(space) => space,
    None => panic!("slot count in range"),
};

fn arb_access() -> impl Strategy<Value = GrantAccess> {
    (1u32..4).prop_map(GrantAccess::from_bits_truncate)
}

fn arb_dir() -> impl Strategy<Value = CopyDir> {
    prop_oneof![Just(CopyDir::FromGranter), Just(CopyDir::ToGranter)]
}

// (grant_len, offset, len) with [offset, offset+len) inside [0, grant_len).
fn arb_in_range_request() -> impl Strategy<Value = (usize, usize, usize)> {
    (1usize..0x1000)
        .prop_flat_map(|grant_len| (Just(grant_len), 0..grant_len))
        .prop_flat_map(|(grant_len, offset)| {
            (Just(grant_len), Just(offset), 0..=grant_len - offset)
        })
}

proptest! {
    #[test]
    fn in_range_requests_authorize(
        base in 0usize..0x1000,
        (grant_len, offset, len) in arb_in_range_request(),
        access in arb_access(),
        dir in arb_dir(),
    ) {
        prop_assume!(access.permits(dir));
        let grantee = SPACE.endpoint(1, 0);
        let grant = Grant { grantee, base: ProcAddr::new(base), length: grant_len, access };
        let addr = authorize(&grant, grantee, SPACE.any(), dir, offset, len).unwrap();
        prop_assert_eq!(addr.raw(), base + offset);
    }

    #[test]
    fn requests_past_the_grant_end_fail(
        grant_len in 1usize..0x1000,
        overshoot in 1usize..0x1000,
        len in 0usize..0x1000,
        dir in arb_dir(),
    ) {
        let grantee = SPACE.endpoint(1, 0);
        let grant = Grant {
            grantee,
            base: ProcAddr::new(0),
            length: grant_len,
            access: GrantAccess::READ | GrantAccess::WRITE,
        };
        let offset = grant_len - len.min(grant_len) + overshoot;
        prop_assume!(offset + len > grant_len);
        prop_assert_eq!(
            authorize(&grant, grantee, SPACE.any(), dir, offset, len),
            Err(CopyError::BadRange)
        );
    }

    #[test]
    fn denied_direction_never_reaches_range_checks(
        offset in 0usize..0x2000,
        len in 0usize..0x2000,
    ) {
        let grantee = SPACE.endpoint(1, 0);
        let grant = Grant {
            grantee,
            base: ProcAddr::new(0),
            length: 0x100,
            access: GrantAccess::READ,
        };
        prop_assert_eq!(
            authorize(&grant, grantee, SPACE.any(), CopyDir::ToGranter, offset, len),
            Err(CopyError::PermissionDenied)
        );
    }
}
