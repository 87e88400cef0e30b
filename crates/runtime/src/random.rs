//! Pseudorandom state for the `R` instruction.
//!
//! The reference engine keeps process-global random state; we keep it as
//! an explicit, engine-owned field instead so a test (or an embedder) can
//! seed it and get deterministic runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug)]
pub struct Random(StdRng);

impl Random {
    pub fn seeded(seed: u64) -> Self {
        Random(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Random(StdRng::from_entropy())
    }

    /// Any `i64`, uniformly distributed.
    pub fn next_int(&mut self) -> i64 {
        self.0.gen()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_is_deterministic() {
        let mut a = Random::seeded(7);
        let mut b = Random::seeded(7);
        assert_eq!(a.next_int(), b.next_int());
        assert_eq!(a.next_int(), b.next_int());
    }
}
