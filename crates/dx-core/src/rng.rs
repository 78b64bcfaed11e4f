//! Deterministic per-operator RNG for simulated operators.
//!
//! Each simulated operator gets its own `SmallRng` seeded by:
//!
//!   seed = global_seed XOR (operator_index * MIXING_CONSTANT)
//!
//! so a drill replays the same dispatch decisions for the same seed, and
//! adding operators does not disturb the streams of existing ones.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Per-operator deterministic RNG.
pub struct OperatorRng(SmallRng);

impl OperatorRng {
    /// Seed deterministically from the run's global seed and an operator index.
    pub fn new(global_seed: u64, operator: u32) -> Self {
        let seed = global_seed ^ (operator as u64).wrapping_mul(MIXING_CONSTANT);
        OperatorRng(SmallRng::seed_from_u64(seed))
    }

    /// Expose the inner `SmallRng` for use with `rand` distribution types.
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// Return `true` with probability `p`.
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p)
    }

    /// Pick one element of `items`, or `None` when empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.0)
    }
}
