//! Geometric level sampling for new nodes.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;

/// Fixed compile-time bound on a node's height. All per-node pointer
/// arrays are sized to this or less (see [`crate::oparray`]).
pub const MAX_LEVEL: usize = 16;

/// Success probability used by the geometric level distribution.
pub const P: u32 = 4; // level increases while `u32 mod P == 0`

/// Initial upper bound on the highest level in use, grown lazily as
/// taller nodes are added.
pub const DEFAULT_HIGHEST_LEVEL: u64 = 3;

thread_local! {
    // A thread-local generator avoids a hot mutex around a single shared
    // RNG; each thread seeds its own on first use.
    static RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_entropy());
}

/// Draws a level in `[1, MAX_LEVEL]` from a geometric distribution with
/// per-step success probability `1/P`.
pub fn random_level() -> usize {
    RNG.with(|rng| {
        let mut rng = rng.borrow_mut();
        let mut level = 1usize;
        while level < MAX_LEVEL && rng.gen_range(0..P) == 0 {
            level += 1;
        }
        level
    })
}
