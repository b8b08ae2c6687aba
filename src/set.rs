//! The concurrent ordered set itself: lock-free traversal, optimistic
//! validation, and the lazy two-phase removal protocol.

use crate::comparator::{BoxedComparator, Comparator, FnComparator};
use crate::flag::{FULLY_LINKED, MARKED};
use crate::level::{self, DEFAULT_HIGHEST_LEVEL, MAX_LEVEL};
use crate::node::Node;
use crossbeam::epoch::{self, Atomic, Guard, Shared};
use parking_lot::MutexGuard;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// A concurrent ordered set backed by a lazy, fine-grained-locking skip
/// list (a variant of the Herlihy-Lev-Shavit-Shah lazy skip list).
///
/// Reads ([`SkipSet::contains`], [`SkipSet::range`],
/// [`SkipSet::range_from`]) never take a lock: they walk atomic
/// next-pointers and decide membership from a node's `fullyLinked`/
/// `marked` flags. Writes ([`SkipSet::add`], [`SkipSet::remove`])
/// traverse lock-free to find their insertion/removal point, then
/// acquire only the predecessor locks they need, re-validate, and
/// commit. No operation ever takes a global lock.
///
/// # Thread safety
///
/// `SkipSet<T, C>` is `Send + Sync` whenever `T: Send + Sync`: every
/// field (`Atomic<Node<T>>`, the two atomic counters, the comparator)
/// is `Send + Sync` on its own, so the compiler derives it for us.
///
/// # Memory reclamation
///
/// Physically unlinked nodes are reclaimed through `crossbeam`'s
/// epoch-based garbage collector: a reader that has loaded a `next`
/// pointer is guaranteed the node behind it stays alive until the
/// reader drops its [`epoch::Guard`].
pub struct SkipSet<T, C> {
    head: Atomic<Node<T>>,
    length: AtomicI64,
    highest_level: AtomicU64,
    comparator: C,
}

impl<T, C: Comparator<T> + Default> SkipSet<T, C> {
    /// Creates an empty set using `C`'s default ordering.
    pub fn new() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<T, C: Comparator<T> + Default> Default for SkipSet<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C: Comparator<T>> SkipSet<T, C> {
    /// Creates an empty set using an explicit comparator instance.
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            head: Node::header(MAX_LEVEL),
            length: AtomicI64::new(0),
            highest_level: AtomicU64::new(DEFAULT_HIGHEST_LEVEL),
            comparator,
        }
    }
}

impl<T: Send + Sync + 'static> SkipSet<T, BoxedComparator<T>> {
    /// Creates an empty set ordered by an arbitrary strict weak order
    /// supplied as a `less(a, b)` closure.
    pub fn new_by<F>(less: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        let boxed: Box<dyn Comparator<T>> = Box::new(FnComparator(less));
        Self::with_comparator(boxed)
    }
}

impl<T: 'static, C: Comparator<T>> SkipSet<T, C> {
    fn head<'g>(&self, guard: &'g Guard) -> Shared<'g, Node<T>> {
        // The header is set once at construction and never replaced.
        self.head.load(Ordering::Relaxed, guard)
    }

    fn top_level(&self) -> usize {
        self.highest_level.load(Ordering::Acquire) as usize
    }

    /// Draws a level for a new node and grows `highestLevel` if needed.
    fn sample_level(&self) -> usize {
        let level = level::random_level();
        loop {
            let hl = self.highest_level.load(Ordering::Acquire);
            if level as u64 <= hl {
                break;
            }
            if self
                .highest_level
                .compare_exchange_weak(hl, level as u64, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                log::trace!("highestLevel grew to {level}");
                break;
            }
        }
        level
    }

    fn value_of<'g>(node: Shared<'g, Node<T>>) -> &'g T {
        // Safety: callers only pass non-null shareds that are not the header.
        unsafe { node.deref() }.value.as_ref().expect("not the header node")
    }

    /// Lock-free descent used by `Add`: may short-circuit as soon as a
    /// match is seen, since `Add` only needs presence plus preds/succs.
    fn find_for_add<'g>(
        &self,
        value: &T,
        preds: &mut [Shared<'g, Node<T>>],
        succs: &mut [Shared<'g, Node<T>>],
        guard: &'g Guard,
    ) -> isize {
        let mut x = self.head(guard);
        for i in (0..self.top_level()).rev() {
            let mut succ = unsafe { x.deref() }.atomic_load_next(i, guard);
            while !succ.is_null() && self.comparator.less(Self::value_of(succ), value) {
                x = succ;
                succ = unsafe { x.deref() }.atomic_load_next(i, guard);
            }
            preds[i] = x;
            succs[i] = succ;
            if !succ.is_null() && !self.comparator.less(value, Self::value_of(succ)) {
                return i as isize;
            }
        }
        -1
    }

    /// Lock-free descent used by `Remove`: completes the full descent so
    /// the returned level is the topmost level the target appears at.
    fn find_for_remove<'g>(
        &self,
        value: &T,
        preds: &mut [Shared<'g, Node<T>>],
        succs: &mut [Shared<'g, Node<T>>],
        guard: &'g Guard,
    ) -> isize {
        let mut l_found = -1isize;
        let mut x = self.head(guard);
        for i in (0..self.top_level()).rev() {
            let mut succ = unsafe { x.deref() }.atomic_load_next(i, guard);
            while !succ.is_null() && self.comparator.less(Self::value_of(succ), value) {
                x = succ;
                succ = unsafe { x.deref() }.atomic_load_next(i, guard);
            }
            preds[i] = x;
            succs[i] = succ;
            if l_found == -1 && !succ.is_null() && !self.comparator.less(value, Self::value_of(succ))
            {
                l_found = i as isize;
            }
        }
        l_found
    }

    /// Locks the distinct predecessors among `preds[0..count]`, bottom-up,
    /// skipping nodes already locked by an earlier (lower) layer.
    fn lock_predecessors<'g>(
        preds: &[Shared<'g, Node<T>>],
        count: usize,
    ) -> Vec<MutexGuard<'g, ()>> {
        let mut locks = Vec::with_capacity(count);
        let mut prev: Option<Shared<'g, Node<T>>> = None;
        for p in preds.iter().take(count).copied() {
            if prev != Some(p) {
                locks.push(unsafe { p.deref() }.mu.lock());
                prev = Some(p);
            }
        }
        locks
    }

    /// Adds `value` to the set. Returns `true` iff it was not already
    /// present.
    pub fn add(&self, value: T) -> bool {
        let level = self.sample_level();
        let guard = &epoch::pin();
        let mut preds: [Shared<'_, Node<T>>; MAX_LEVEL] = [Shared::null(); MAX_LEVEL];
        let mut succs: [Shared<'_, Node<T>>; MAX_LEVEL] = [Shared::null(); MAX_LEVEL];

        loop {
            let l_found = self.find_for_add(&value, &mut preds, &mut succs, guard);
            if l_found != -1 {
                let found = succs[l_found as usize];
                let found_ref = unsafe { found.deref() };
                if !found_ref.flags.get(MARKED) {
                    if !found_ref.flags.get(FULLY_LINKED) {
                        log::trace!("add: spin-waiting for concurrent insert to finish linking");
                    }
                    while !found_ref.flags.get(FULLY_LINKED) {
                        std::hint::spin_loop();
                    }
                    return false;
                }
                // A concurrent remover is racing us; wait for it to finish
                // physically unlinking, then retry.
                log::trace!("add: found marked node, retrying");
                continue;
            }

            let locks = Self::lock_predecessors(&preds, level);
            let mut valid = true;
            for i in 0..level {
                let pred = unsafe { preds[i].deref() };
                let succ = succs[i];
                let succ_marked = !succ.is_null() && unsafe { succ.deref() }.flags.get(MARKED);
                if pred.flags.get(MARKED) || succ_marked || pred.load_next(i, guard) != succ {
                    valid = false;
                    break;
                }
            }
            if !valid {
                drop(locks);
                log::trace!("add: validation failed, retrying");
                continue;
            }

            let nn = crate::node::new_owned(value, level).into_shared(guard);
            let nn_ref = unsafe { nn.deref() };
            for i in 0..level {
                nn_ref.store_next(i, succs[i]);
            }
            for i in 0..level {
                unsafe { preds[i].deref() }.atomic_store_next(i, nn);
            }
            nn_ref.flags.set_true(FULLY_LINKED);
            drop(locks);
            self.length.fetch_add(1, Ordering::Relaxed);
            return true;
        }
    }

    /// Removes `value` from the set. Returns `true` iff this call
    /// performed the removal.
    pub fn remove(&self, value: &T) -> bool {
        let guard = &epoch::pin();
        let mut preds: [Shared<'_, Node<T>>; MAX_LEVEL] = [Shared::null(); MAX_LEVEL];
        let mut succs: [Shared<'_, Node<T>>; MAX_LEVEL] = [Shared::null(); MAX_LEVEL];

        let mut target: Option<Shared<'_, Node<T>>> = None;
        let mut target_lock: Option<MutexGuard<'_, ()>> = None;
        let mut top_layer: isize = -1;

        loop {
            let l_found = self.find_for_remove(value, &mut preds, &mut succs, guard);

            let commit_ready = target.is_some()
                || (l_found != -1 && {
                    let f = unsafe { succs[l_found as usize].deref() };
                    f.flags.matches(FULLY_LINKED | MARKED, FULLY_LINKED)
                        && (f.level as isize - 1) == l_found
                });
            if !commit_ready {
                return false;
            }

            if target.is_none() {
                let node_to_remove = succs[l_found as usize];
                top_layer = l_found;
                let lock = unsafe { node_to_remove.deref() }.mu.lock();
                if unsafe { node_to_remove.deref() }.flags.get(MARKED) {
                    // Another remover beat us to it.
                    return false;
                }
                unsafe { node_to_remove.deref() }.flags.set_true(MARKED);
                target = Some(node_to_remove);
                target_lock = Some(lock);
                log::trace!("remove: marked node for removal");
            }

            let locks = Self::lock_predecessors(&preds, (top_layer + 1) as usize);
            let mut valid = true;
            for i in 0..=(top_layer as usize) {
                let pred = unsafe { preds[i].deref() };
                if pred.flags.get(MARKED) || pred.load_next(i, guard) != succs[i] {
                    valid = false;
                    break;
                }
            }
            if !valid {
                drop(locks);
                log::trace!("remove: validation failed, retrying search");
                continue;
            }

            let target_shared = target.expect("marked before reaching commit");
            let target_ref = unsafe { target_shared.deref() };
            log::trace!("remove: physically unlinking node at layers 0..={top_layer}");
            for i in (0..=(top_layer as usize)).rev() {
                unsafe { preds[i].deref() }.atomic_store_next(i, target_ref.load_next(i, guard));
            }
            drop(target_lock.take());
            drop(locks);
            self.length.fetch_add(-1, Ordering::Relaxed);
            unsafe {
                guard.defer_destroy(target_shared);
            }
            return true;
        }
    }

    /// Returns `true` iff `value` is present and fully linked.
    pub fn contains(&self, value: &T) -> bool {
        let guard = &epoch::pin();
        let mut x = self.head(guard);
        for i in (0..self.top_level()).rev() {
            let mut next = unsafe { x.deref() }.atomic_load_next(i, guard);
            while !next.is_null() && self.comparator.less(Self::value_of(next), value) {
                x = next;
                next = unsafe { x.deref() }.atomic_load_next(i, guard);
            }
            if !next.is_null() && !self.comparator.less(value, Self::value_of(next)) {
                return unsafe { next.deref() }.flags.matches(FULLY_LINKED | MARKED, FULLY_LINKED);
            }
        }
        false
    }

    /// Visits every live value in order until `f` returns `false`.
    pub fn range<F: FnMut(&T) -> bool>(&self, mut f: F) {
        let guard = &epoch::pin();
        let mut x = unsafe { self.head(guard).deref() }.atomic_load_next(0, guard);
        while !x.is_null() {
            let node = unsafe { x.deref() };
            if node.flags.matches(FULLY_LINKED | MARKED, FULLY_LINKED) {
                if !f(node.value.as_ref().expect("not the header node")) {
                    return;
                }
            }
            x = node.atomic_load_next(0, guard);
        }
    }

    /// Visits every live value from `start` onward (inclusive of an
    /// exact match), in order, until `f` returns `false`.
    pub fn range_from<F: FnMut(&T) -> bool>(&self, start: &T, mut f: F) {
        let guard = &epoch::pin();
        let mut x = self.head(guard);
        let mut cursor: Shared<'_, Node<T>> = Shared::null();
        for i in (0..self.top_level()).rev() {
            let mut succ = unsafe { x.deref() }.atomic_load_next(i, guard);
            while !succ.is_null() && self.comparator.less(Self::value_of(succ), start) {
                x = succ;
                succ = unsafe { x.deref() }.atomic_load_next(i, guard);
            }
            cursor = succ;
        }
        let mut cur = cursor;
        while !cur.is_null() {
            let node = unsafe { cur.deref() };
            if node.flags.matches(FULLY_LINKED | MARKED, FULLY_LINKED) {
                if !f(node.value.as_ref().expect("not the header node")) {
                    return;
                }
            }
            cur = node.atomic_load_next(0, guard);
        }
    }

    /// Number of live (fully-linked, unmarked) elements. Weakly
    /// consistent with concurrent mutations.
    pub fn len(&self) -> i64 {
        self.length.load(Ordering::Acquire)
    }

    /// True iff the set currently has no live elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T, C> Drop for SkipSet<T, C> {
    fn drop(&mut self) {
        // No concurrent access is possible once we have `&mut self`, so
        // it is safe to walk and reclaim the whole chain without pinning
        // an epoch guard.
        unsafe {
            let guard = epoch::unprotected();
            let mut cur = self.head.load(Ordering::Relaxed, guard);
            while !cur.is_null() {
                let next = cur.deref().atomic_load_next(0, guard);
                drop(cur.into_owned());
                cur = next;
            }
        }
    }
}
