//! Variable-height pointer storage for a node's `next` array.
//!
//! Most nodes are short: with `p = 0.25`, about 75% of nodes have level 1
//! and about 94% have level <= 2. Paying for a full [`crate::level::MAX_LEVEL`]
//! slots on every node would waste most of that memory, so the array is
//! split into a fixed inline prefix and a heap-allocated tail that only
//! exists for nodes tall enough to need it.

use crate::level::MAX_LEVEL;
use crossbeam::epoch::{Atomic, Guard, Shared};
use std::sync::atomic::Ordering;

/// Size of the inline prefix. Node heights above this spill into `extra`.
const OP1: usize = 4;
const OP2: usize = MAX_LEVEL - OP1;

pub struct OptionalArray<T> {
    base: [Atomic<T>; OP1],
    extra: Option<Box<[Atomic<T>; OP2]>>,
}

impl<T> OptionalArray<T> {
    /// Allocates storage for `level` slots, spilling to the heap only if
    /// `level` exceeds the inline prefix.
    pub fn new(level: usize) -> Self {
        let extra = if level > OP1 {
            Some(Box::new(std::array::from_fn(|_| Atomic::null())))
        } else {
            None
        };
        Self {
            base: std::array::from_fn(|_| Atomic::null()),
            extra,
        }
    }

    fn slot(&self, i: usize) -> &Atomic<T> {
        if i < OP1 {
            &self.base[i]
        } else {
            &self.extra.as_ref().expect("index beyond allocated height")[i - OP1]
        }
    }

    /// Non-atomic load. Only valid while the caller has exclusive access
    /// (construction, or holding the owning node's lock during commit).
    pub fn load<'g>(&self, i: usize, guard: &'g Guard) -> Shared<'g, T> {
        self.slot(i).load(Ordering::Relaxed, guard)
    }

    /// Non-atomic store. Same exclusivity requirement as [`Self::load`].
    pub fn store(&self, i: usize, p: Shared<'_, T>) {
        self.slot(i).store(p, Ordering::Relaxed);
    }

    /// Acquire-ordered load, safe for lock-free traversal.
    pub fn atomic_load<'g>(&self, i: usize, guard: &'g Guard) -> Shared<'g, T> {
        self.slot(i).load(Ordering::Acquire, guard)
    }

    /// Release-ordered store, publishing `p` to concurrent readers.
    pub fn atomic_store(&self, i: usize, p: Shared<'_, T>) {
        self.slot(i).store(p, Ordering::Release);
    }
}
