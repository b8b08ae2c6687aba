//! A concurrent ordered set built on a lazy, fine-grained-locking skip
//! list.
//!
//! This crate provides [`SkipSet`], a skip-list-backed set that targets
//! read-heavy mixed workloads (contains-dominated, with a minority of
//! adds and removes) and sustains many concurrent readers alongside
//! multiple writers without any global lock. It implements a variant of
//! the Herlihy-Lev-Shavit-Shah lazy skip list:
//!
//! - [`SkipSet::contains`], [`SkipSet::range`], and
//!   [`SkipSet::range_from`] traverse lock-free, following atomic
//!   `next` pointers and deciding membership from a node's
//!   `fullyLinked`/`marked` flags.
//! - [`SkipSet::add`] and [`SkipSet::remove`] traverse lock-free to find
//!   their target, then commit by locking only the predecessor nodes
//!   they need, re-validating, and either linking a new node in or
//!   physically unlinking a logically-deleted one.
//!
//! Iteration is weakly consistent: it reflects concurrent mutations but
//! never observes a torn or partially-linked structure.
//!
//! # Example
//!
//! ```
//! use skipset::{SkipSet, Ascending};
//!
//! let set: SkipSet<i64, Ascending> = SkipSet::new();
//! assert!(set.add(10));
//! assert!(set.add(20));
//! assert!(!set.add(10)); // already present
//!
//! assert!(set.contains(&10));
//! assert!(set.remove(&10));
//! assert!(!set.contains(&10));
//!
//! let mut seen = Vec::new();
//! set.range(|v| {
//!     seen.push(*v);
//!     true
//! });
//! assert_eq!(seen, vec![20]);
//! ```
//!
//! # Orderings
//!
//! The set is generic over a [`Comparator`], so built-in orderings
//! monomorphize to direct comparisons with no dynamic dispatch on the
//! hot traversal path:
//!
//! - [`Ascending`] / [`Descending`] for any `Ord` type (ints, strings, ...).
//! - [`AscendingF64`] / [`DescendingF64`] / [`AscendingF32`] /
//!   [`DescendingF32`] for floats, where NaN sorts below every non-NaN
//!   value and is equivalent to itself.
//! - [`SkipSet::new_by`] for an arbitrary closure, and
//!   [`BoxedComparator`] for callers who need to pick an ordering at
//!   runtime rather than at the type level.
//!
//! # Non-goals
//!
//! No snapshot isolation, no transactional multi-key updates, no
//! persistence. A reader's `less` function must define a strict weak
//! order; violating that is undefined behavior the set does not detect.

mod comparator;
mod flag;
mod level;
mod node;
mod oparray;
mod set;

pub use comparator::{
    Ascending, AscendingF32, AscendingF64, BoxedComparator, Comparator, Descending, DescendingF32,
    DescendingF64, FnComparator,
};
pub use level::MAX_LEVEL;
pub use set::SkipSet;
