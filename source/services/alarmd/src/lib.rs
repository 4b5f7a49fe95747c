// Copyright 2026 Lumen OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

//! CONTEXT: Synchronous alarm / tick-delay service
//! OWNERS: @runtime
//! STATUS: Functional
//! PUBLIC API: AlarmClock trait, tick_delay(), AlarmError, host backends
//! DEPENDS_ON: a clock component implementing AlarmClock (kernel or host)
//! INVARIANTS:
//! - tick_delay never issues clock traffic for non-positive tick counts
//! - a superseded shorter alarm is always re-armed with at least one tick
//! - the blocking wait consumes exactly the one alarm notification
//!
//! The caller-side state machine is: **Idle** (nothing outstanding) →
//! **Armed** (alarm requested, caller blocked) → back to Idle when the
//! notification arrives, detouring through **Rescheduling** when the arm
//! request superseded a pre-existing shorter alarm whose corrected remainder
//! must be re-armed on wake.

use thiserror::Error;

pub mod host;

/// Errors surfaced by the alarm service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum AlarmError {
    /// The clock component rejected the alarm-arming request.
    #[error("clock component rejected alarm request")]
    ClockUnavailable,
}

/// Caller-side interface to the clock-owning component.
///
/// The contract mirrors the kernel's synchronous-alarm call: arming is
/// relative, supersedes any outstanding alarm for this caller, and reports
/// the superseded alarm's remaining ticks; exactly one notification is
/// delivered when the armed time arrives.
pub trait AlarmClock {
    /// Arms a relative alarm for `ticks`.
    ///
    /// Returns the remaining ticks of the previously outstanding alarm,
    /// `None` when there was none.
    fn arm(&mut self, ticks: i64) -> Result<Option<i64>, AlarmError>;

    /// Blocks until the clock delivers the alarm notification.
    ///
    /// The receive itself is treated as infallible; only process
    /// termination interrupts it.
    fn wait(&mut self);
}

/// Blocks the caller for `ticks` clock ticks.
///
/// Non-positive tick counts return immediately without touching the clock.
/// If a shorter alarm was already outstanding when the delay was armed, its
/// corrected remainder (floored at one tick to guarantee forward progress)
/// is re-armed after the delay completes, so this call never permanently
/// cancels an alarm it did not own. There is no cancellation primitive;
/// callers needing cancellable delays must layer their own deadline checks.
pub fn tick_delay<C: AlarmClock>(clock: &mut C, ticks: i64) -> Result<(), AlarmError> {
    if ticks <= 0 {
        return Ok(());
    }
    let superseded = clock.arm(ticks)?;
    clock.wait();
    if let Some(remaining) = superseded.filter(|&remaining| remaining > 0) {
        let corrected = if remaining > ticks { remaining - ticks } else { 1 };
        clock.arm(corrected)?;
        log::debug!("tick_delay: re-armed superseded alarm for {corrected} ticks");
    }
    Ok(())
}
