//! Node shape: value, variable-height next-pointer array, flags, lock.

use crate::flag::Bitflag;
use crate::oparray::OptionalArray;
use crossbeam::epoch::{Atomic, Guard, Owned, Shared};
use parking_lot::Mutex;

/// A skip-list node. The header node stores `value = None` and is never
/// compared against; every other node stores `Some(value)`.
pub struct Node<T> {
    pub value: Option<T>,
    next: OptionalArray<Node<T>>,
    /// Immutable after construction.
    pub level: u32,
    pub flags: Bitflag,
    pub mu: Mutex<()>,
}

impl<T> Node<T> {
    pub fn new(value: Option<T>, level: usize) -> Self {
        Self {
            value,
            next: OptionalArray::new(level),
            level: level as u32,
            flags: Bitflag::new(),
            mu: Mutex::new(()),
        }
    }

    /// Allocates the header sentinel, already fully linked so traversal
    /// never has to special-case it.
    pub fn header(max_level: usize) -> Atomic<Node<T>> {
        let h = Node::new(None, max_level);
        h.flags.set_true(crate::flag::FULLY_LINKED);
        Atomic::new(h)
    }

    /// Plain load, exclusive-access only (construction or under `mu`).
    pub fn load_next<'g>(&self, i: usize, guard: &'g Guard) -> Shared<'g, Node<T>> {
        self.next.load(i, guard)
    }

    /// Plain store, exclusive-access only.
    pub fn store_next(&self, i: usize, n: Shared<'_, Node<T>>) {
        self.next.store(i, n);
    }

    /// Acquire-ordered load for lock-free traversal.
    pub fn atomic_load_next<'g>(&self, i: usize, guard: &'g Guard) -> Shared<'g, Node<T>> {
        self.next.atomic_load(i, guard)
    }

    /// Release-ordered store that publishes `n` to concurrent readers.
    pub fn atomic_store_next(&self, i: usize, n: Shared<'_, Node<T>>) {
        self.next.atomic_store(i, n);
    }
}

pub fn new_owned<T>(value: T, level: usize) -> Owned<Node<T>> {
    Owned::new(Node::new(Some(value), level))
}
