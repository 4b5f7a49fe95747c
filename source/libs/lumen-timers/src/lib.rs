// Copyright 2026 Lumen OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

//! CONTEXT: Ordered timer queue shared by the kernel clock and servers
//! OWNERS: @runtime
//! PUBLIC API: TimerQueue (create/release/schedule/cancel/expire_due), TimerHandle, Tick
//! DEPENDS_ON: alloc only
//! INVARIANTS: Order list sorted by (expiry, seq); at most one occurrence per
//! handle; head always carries the next global expiry; watchdogs may reschedule
//! freely during expiry
//! ADR: docs/adr/0002-timer-queue-design.md
//!
//! Timers live in an arena and are addressed by stable handles, so callers
//! never hold pointers into the queue. A monotonic sequence number stamped at
//! schedule time breaks ties between equal expiries: the first timer scheduled
//! at a given tick stays ahead of later arrivals at the same tick.

extern crate alloc;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::num::NonZeroU32;

/// Monotonic clock tick count used for expiries.
pub type Tick = u64;

/// Expiry marker for a timer that is not scheduled.
pub const TICK_NEVER: Tick = Tick::MAX;

/// Default arena capacity for [`TimerQueue::new`].
pub const MAX_TIMERS: usize = 1024;

/// Stable reference to a timer slot in a queue's arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(NonZeroU32);

impl TimerHandle {
    fn from_index(index: usize) -> Self {
        // Offset by one keeps the backing value non-zero.
        Self(NonZeroU32::new(index as u32 + 1).expect("index + 1 is non-zero"))
    }

    fn index(self) -> usize {
        self.0.get() as usize - 1
    }

    /// Reconstructs a handle from its raw representation.
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// Returns the raw representation of this handle.
    pub fn to_raw(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TimerHandle").field(&self.0.get()).finish()
    }
}

/// Callback invoked when a timer expires.
///
/// Receives the queue itself so it may schedule or cancel timers (including
/// the one that just fired); firing consumes the stored callback, and a
/// reschedule supplies a fresh one.
pub type WatchdogFn<C> = Box<dyn FnMut(&mut TimerQueue<C>, &mut C, TimerHandle) + Send>;

struct TimerSlot<C> {
    live: bool,
    expiry: Tick,
    seq: u64,
    watchdog: Option<WatchdogFn<C>>,
}

impl<C> TimerSlot<C> {
    fn inert() -> Self {
        Self { live: true, expiry: TICK_NEVER, seq: 0, watchdog: None }
    }
}

/// Ordered collection of pending timers.
///
/// `C` is the context value threaded into watchdog callbacks, e.g. the
/// kernel's alarm outbox. All operations are total: cancelling an idle timer
/// or expiring an empty queue is a no-op, never an error.
pub struct TimerQueue<C> {
    slots: Vec<TimerSlot<C>>,
    order: Vec<TimerHandle>,
    free: Vec<usize>,
    next_seq: u64,
    capacity: usize,
}

impl<C> TimerQueue<C> {
    /// Creates a queue with the default arena capacity.
    pub fn new() -> Self {
        Self::with_capacity(MAX_TIMERS)
    }

    /// Creates a queue holding at most `capacity` timer slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { slots: Vec::new(), order: Vec::new(), free: Vec::new(), next_seq: 0, capacity }
    }

    /// Allocates an inert timer, or `None` when the arena is full.
    pub fn create(&mut self) -> Option<TimerHandle> {
        if let Some(index) = self.free.pop() {
            self.slots[index] = TimerSlot::inert();
            return Some(TimerHandle::from_index(index));
        }
        if self.slots.len() >= self.capacity {
            return None;
        }
        self.slots.push(TimerSlot::inert());
        Some(TimerHandle::from_index(self.slots.len() - 1))
    }

    /// Cancels `handle` and returns its slot to the arena.
    pub fn release(&mut self, handle: TimerHandle) {
        if !self.is_live(handle) {
            return;
        }
        self.cancel(handle);
        self.slots[handle.index()].live = false;
        self.free.push(handle.index());
    }

    /// Schedules `handle` to fire at `expiry`, replacing any pending schedule
    /// for the same handle.
    ///
    /// A timer scheduled at an expiry equal to existing entries lands behind
    /// them, so the first-scheduled timer keeps the front position. Returns
    /// the head expiry as it was *before* this operation (`None` when the
    /// queue was empty), which is what callers compare against to decide
    /// whether the underlying alarm needs re-arming.
    pub fn schedule(
        &mut self,
        handle: TimerHandle,
        expiry: Tick,
        watchdog: WatchdogFn<C>,
    ) -> Option<Tick> {
        debug_assert!(self.is_live(handle), "schedule on a released timer handle");
        if !self.is_live(handle) {
            return self.head_expiry();
        }
        let previous_head = self.head_expiry();
        self.unlink(handle);
        let seq = self.next_seq;
        self.next_seq += 1;
        {
            let slot = &mut self.slots[handle.index()];
            slot.expiry = expiry;
            slot.seq = seq;
            slot.watchdog = Some(watchdog);
        }
        let position = self
            .order
            .iter()
            .position(|queued| self.slots[queued.index()].expiry > expiry)
            .unwrap_or(self.order.len());
        self.order.insert(position, handle);
        previous_head
    }

    /// Cancels any pending schedule for `handle`.
    ///
    /// The watchdog is unconditionally cleared so stale references are
    /// detectable; cancelling a timer that is not queued is a harmless no-op.
    /// Returns the head expiry after removal, `None` when the queue is empty.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<Tick> {
        if self.is_live(handle) {
            let slot = &mut self.slots[handle.index()];
            slot.expiry = TICK_NEVER;
            slot.watchdog = None;
            self.unlink(handle);
        }
        self.head_expiry()
    }

    /// Fires every timer whose expiry is at or before `now`.
    ///
    /// Each due timer is unlinked and marked inert before its watchdog runs,
    /// and the head is re-read after every firing, so watchdogs may freely
    /// reschedule themselves or any other timer. Returns the head expiry
    /// left after expiry, `None` when the queue drained.
    pub fn expire_due(&mut self, now: Tick, ctx: &mut C) -> Option<Tick> {
        loop {
            let Some(&head) = self.order.first() else {
                break;
            };
            if self.slots[head.index()].expiry > now {
                break;
            }
            self.order.remove(0);
            let watchdog = {
                let slot = &mut self.slots[head.index()];
                slot.expiry = TICK_NEVER;
                slot.watchdog.take()
            };
            if let Some(mut watchdog) = watchdog {
                watchdog(self, ctx, head);
            }
        }
        self.head_expiry()
    }

    /// Expiry of the next timer to fire, `None` when nothing is pending.
    pub fn head_expiry(&self) -> Option<Tick> {
        self.order.first().map(|handle| self.slots[handle.index()].expiry)
    }

    /// Pending expiry of `handle`, `None` when it is not scheduled.
    pub fn deadline(&self, handle: TimerHandle) -> Option<Tick> {
        if !self.is_live(handle) {
            return None;
        }
        let expiry = self.slots[handle.index()].expiry;
        (expiry != TICK_NEVER).then_some(expiry)
    }

    /// Whether `handle` currently sits in the queue.
    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.deadline(handle).is_some()
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no timer is pending.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn is_live(&self, handle: TimerHandle) -> bool {
        self.slots.get(handle.index()).is_some_and(|slot| slot.live)
    }

    fn unlink(&mut self, handle: TimerHandle) {
        if let Some(position) = self.order.iter().position(|queued| *queued == handle) {
            self.order.remove(position);
        }
    }
}

impl<C> Default for TimerQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}
