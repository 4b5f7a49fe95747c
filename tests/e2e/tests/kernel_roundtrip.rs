// Copyright 2026 Lumen OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Grant lifecycle and copy scenarios through the syscall boundary
//! OWNERS: @runtime
//!
//! TEST_SCOPE:
//!   - Safecopy through dispatch against issued, revoked and reissued grants
//!   - Stale endpoints after exit/reuse
//!   - Revocation racing in-flight copies under the kernel lock

use std::thread;

use lumen_abi::{sys, CopyError, GrantAccess, ProcAddr};
use lumen_e2e::{ep_arg, shared_kernel, spawn};
use photon::grant::Grant;
use photon::syscall::{dispatch, Args, Error};

#[test]
fn grant_lifecycle_through_dispatch() {
    let kernel = shared_kernel();
    let granter = spawn(&kernel);
    let grantee = spawn(&kernel);

    let id = {
        let mut kernel = kernel.lock();
        kernel.procs_mut().lookup_mut(granter).unwrap().arena_mut()[64..69]
            .copy_from_slice(b"hello");
        kernel
            .procs_mut()
            .lookup_mut(granter)
            .unwrap()
            .grants_mut()
            .issue(Grant {
                grantee,
                base: ProcAddr::new(64),
                length: 32,
                access: GrantAccess::READ,
            })
            .expect("grant slot")
    };

    let args = Args::new([ep_arg(granter), id.to_raw() as usize, 0, 0, 5, 0]);
    dispatch(&mut kernel.lock(), grantee, sys::SAFECOPY_FROM, &args).expect("copy ok");
    assert_eq!(&kernel.lock().procs().lookup(grantee).unwrap().arena()[..5], b"hello");

    // Revoked: the same request now fails cleanly.
    assert!(kernel.lock().procs_mut().lookup_mut(granter).unwrap().grants_mut().revoke(id));
    assert_eq!(
        dispatch(&mut kernel.lock(), grantee, sys::SAFECOPY_FROM, &args),
        Err(Error::Copy(CopyError::BadGrant))
    );

    // The freed slot serves the next grant, scoped to its own range.
    let reissued = kernel
        .lock()
        .procs_mut()
        .lookup_mut(granter)
        .unwrap()
        .grants_mut()
        .issue(Grant {
            grantee,
            base: ProcAddr::new(0),
            length: 8,
            access: GrantAccess::READ,
        })
        .expect("slot reused");
    assert_eq!(reissued, id);
    let wide = Args::new([ep_arg(granter), id.to_raw() as usize, 0, 0, 16, 0]);
    assert_eq!(
        dispatch(&mut kernel.lock(), grantee, sys::SAFECOPY_FROM, &wide),
        Err(Error::Copy(CopyError::BadRange))
    );
}

#[test]
fn exited_peer_goes_stale_for_copies() {
    let kernel = shared_kernel();
    let alive = spawn(&kernel);
    let doomed = spawn(&kernel);

    kernel.lock().exit(doomed).expect("live process");
    let reborn = spawn(&kernel);
    {
        let kernel = kernel.lock();
        let space = kernel.procs().space();
        assert_eq!(space.slot(doomed), space.slot(reborn));
    }

    let to_dead = Args::new([ep_arg(alive), 0, ep_arg(doomed), 0, 4, 0]);
    assert_eq!(
        dispatch(&mut kernel.lock(), alive, sys::VIRCOPY, &to_dead),
        Err(Error::Copy(CopyError::PeerUnavailable))
    );
    let to_reborn = Args::new([ep_arg(alive), 0, ep_arg(reborn), 0, 4, 0]);
    dispatch(&mut kernel.lock(), alive, sys::VIRCOPY, &to_reborn).expect("new occupant reachable");
}

#[test]
fn revocation_races_cleanly_with_inflight_copies() {
    let kernel = shared_kernel();
    let granter = spawn(&kernel);
    let grantee = spawn(&kernel);
    let id = kernel
        .lock()
        .procs_mut()
        .lookup_mut(granter)
        .unwrap()
        .grants_mut()
        .issue(Grant {
            grantee,
            base: ProcAddr::new(0),
            length: 64,
            access: GrantAccess::READ | GrantAccess::WRITE,
        })
        .expect("grant slot");

    let copier = {
        let kernel = kernel.clone();
        thread::spawn(move || {
            let args = Args::new([ep_arg(granter), id.to_raw() as usize, 0, 128, 64, 0]);
            let mut outcomes = Vec::new();
            for _ in 0..2000 {
                outcomes.push(dispatch(&mut kernel.lock(), grantee, sys::SAFECOPY_FROM, &args));
            }
            outcomes
        })
    };

    thread::yield_now();
    assert!(kernel.lock().procs_mut().lookup_mut(granter).unwrap().grants_mut().revoke(id));

    // Every copy either completed fully before the revoke or failed cleanly
    // after it; the single kernel lock admits no third outcome.
    let outcomes = copier.join().expect("copier exits cleanly");
    for outcome in outcomes {
        assert!(
            outcome == Ok(0) || outcome == Err(Error::Copy(CopyError::BadGrant)),
            "unexpected outcome: {outcome:?}"
        );
    }
}
