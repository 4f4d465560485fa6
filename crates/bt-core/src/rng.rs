//! `AgentRng`, the random source owned by one behavior tree.
//!
//! Every draw a tree makes (the Random node's starting child, a Priority
//! node's scatter offset, a randomized Latch cooldown) comes from the tree's
//! own `SmallRng`.  The stream is keyed by `(run seed, agent)`:
//!
//! ```text
//! seed = run_seed ^ agent.0 * 0x9e37_79b9_7f4a_7c15
//! ```
//!
//! The multiplier (2^64 / φ) sends neighbouring agent ids to distant seeds,
//! so two agents running the same tree shape drift apart, while a rerun
//! with the same run seed replays every draw exactly.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::{Rng, SeedableRng};

use crate::AgentId;

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

pub struct AgentRng(SmallRng);

impl AgentRng {
    pub fn new(run_seed: u64, agent: AgentId) -> Self {
        let seed = run_seed ^ u64::from(agent.0).wrapping_mul(GOLDEN_GAMMA);
        AgentRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// Uniform index into a list of `len` items.  `len` must be non-zero.
    #[inline]
    pub fn pick(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }

    /// `base` scaled by a factor drawn uniformly from `[lo, hi)`; `base * lo`
    /// when the range is empty.  Negative factors clamp to zero.
    pub fn scale_duration(&mut self, base: Duration, lo: f64, hi: f64) -> Duration {
        let factor = if hi > lo { self.gen_range(lo..hi) } else { lo };
        base.mul_f64(factor.max(0.0))
    }
}
