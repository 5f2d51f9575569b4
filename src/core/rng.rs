//! Per-episode deterministic random streams.
//!
//! ## Properties
//!
//! - **Owned**: every episode carries its own stream; nothing is process-global
//! - **Deterministic**: same seed produces the identical sequence
//! - **Forkable**: independent sub-streams (e.g. policy sampling in rollouts)
//! - **Checkpointable**: the stream position can be captured and restored
//!
//! ## Seeding
//!
//! Rollouts are identified by a sample id and a launch id. Both are folded
//! into one seed so parallel rollouts get reproducible, non-colliding streams:
//!
//! ```
//! use turn_env::core::{EpisodeRng, EpisodeSeed};
//!
//! let seed = EpisodeSeed::new(3, 7);
//! assert_eq!(seed.value(), 3 * 1024 + 7);
//!
//! let mut a = EpisodeRng::new(seed.value());
//! let mut b = EpisodeRng::new(seed.value());
//! assert_eq!(a.gen_range_usize(0..100), b.gen_range_usize(0..100));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Launch ids per sample id. Launch ids must stay below this stride.
pub const LAUNCH_STRIDE: u64 = 1024;

/// Seed for one episode, derived from a sample id and a launch id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpisodeSeed {
    /// Sample identifier assigned by the training loop.
    pub sample_id: u64,
    /// Launch identifier of the training run.
    pub launch_id: u64,
}

impl EpisodeSeed {
    /// Create a seed from a sample id and a launch id.
    ///
    /// # Panics
    /// If `launch_id >= LAUNCH_STRIDE`, which would alias another sample's stream.
    #[must_use]
    pub fn new(sample_id: u64, launch_id: u64) -> Self {
        assert!(
            launch_id < LAUNCH_STRIDE,
            "Launch id must be below {}",
            LAUNCH_STRIDE
        );
        Self {
            sample_id,
            launch_id,
        }
    }

    /// The folded seed value: `sample_id * 1024 + launch_id`.
    #[must_use]
    pub fn value(self) -> u64 {
        self.sample_id
            .wrapping_mul(LAUNCH_STRIDE)
            .wrapping_add(self.launch_id)
    }
}

impl std::fmt::Display for EpisodeSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sample {} / launch {}", self.sample_id, self.launch_id)
    }
}

/// Deterministic RNG owned by one episode.
///
/// Uses ChaCha8 for speed while keeping high-quality randomness.
#[derive(Clone, Debug)]
pub struct EpisodeRng {
    inner: ChaCha8Rng,
    seed: u64,
    fork_counter: u64,
}

impl EpisodeRng {
    /// Stream for `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// The seed this stream was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Derive a sub-stream. Successive forks differ from each other and from
    /// the parent, but are reproducible from the parent's seed.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        let fork_seed = self
            .seed
            .wrapping_add(self.fork_counter.wrapping_mul(0x9E3779B97F4A7C15));
        Self {
            inner: ChaCha8Rng::seed_from_u64(fork_seed),
            seed: fork_seed,
            fork_counter: 0,
        }
    }

    /// Uniform index in `range`.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Uniform pick from `slice`; `None` when it is empty.
    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.inner)
    }

    /// Choose an index with weighted probability.
    ///
    /// Weights do not need to sum to 1.0. Negative weights count as zero.
    /// `None` when no weight is positive.
    pub fn choose_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        if weights.is_empty() {
            return None;
        }

        let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
        if total <= 0.0 || !total.is_finite() {
            return None;
        }

        let mut threshold = self.inner.gen::<f64>() * total;

        for (i, &weight) in weights.iter().enumerate() {
            let weight = weight.max(0.0);
            if weight == 0.0 {
                continue;
            }
            threshold -= weight;
            if threshold <= 0.0 {
                return Some(i);
            }
        }

        // Rounding left a sliver of threshold.
        weights.iter().rposition(|&w| w > 0.0)
    }

    /// Capture the stream position.
    #[must_use]
    pub fn state(&self) -> EpisodeRngState {
        EpisodeRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
            fork_counter: self.fork_counter,
        }
    }

    /// Resume a stream from a captured position.
    #[must_use]
    pub fn from_state(state: &EpisodeRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
            fork_counter: state.fork_counter,
        }
    }
}

/// Captured stream position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRngState {
    /// Stream seed
    pub seed: u64,
    /// ChaCha8 word position
    pub word_pos: u128,
    /// Forks taken so far
    pub fork_counter: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_derivation() {
        assert_eq!(EpisodeSeed::new(0, 0).value(), 0);
        assert_eq!(EpisodeSeed::new(1, 0).value(), 1024);
        assert_eq!(EpisodeSeed::new(2, 5).value(), 2053);
    }

    #[test]
    fn test_seeds_do_not_collide() {
        let mut seen = std::collections::HashSet::new();
        for sample in 0..16 {
            for launch in [0, 1, 511, 1023] {
                assert!(seen.insert(EpisodeSeed::new(sample, launch).value()));
            }
        }
    }

    #[test]
    #[should_panic(expected = "Launch id must be below")]
    fn test_launch_id_overflow() {
        let _ = EpisodeSeed::new(0, 1024);
    }

    #[test]
    fn test_determinism() {
        let mut rng1 = EpisodeRng::new(42);
        let mut rng2 = EpisodeRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.gen_range_usize(0..1000), rng2.gen_range_usize(0..1000));
        }
    }

    #[test]
    fn test_different_seeds() {
        let mut rng1 = EpisodeRng::new(1);
        let mut rng2 = EpisodeRng::new(2);

        let seq1: Vec<_> = (0..10).map(|_| rng1.gen_range_usize(0..1000)).collect();
        let seq2: Vec<_> = (0..10).map(|_| rng2.gen_range_usize(0..1000)).collect();

        assert_ne!(seq1, seq2);
    }

    #[test]
    fn test_fork_produces_different_sequence() {
        let mut rng = EpisodeRng::new(42);
        let mut forked = rng.fork();

        let seq1: Vec<_> = (0..10).map(|_| rng.gen_range_usize(0..1000)).collect();
        let seq2: Vec<_> = (0..10).map(|_| forked.gen_range_usize(0..1000)).collect();

        assert_ne!(seq1, seq2);
    }

    #[test]
    fn test_fork_is_deterministic() {
        let mut rng1 = EpisodeRng::new(42);
        let mut rng2 = EpisodeRng::new(42);

        assert_eq!(rng1.fork().seed(), rng2.fork().seed());
    }

    #[test]
    fn test_choose() {
        let mut rng = EpisodeRng::new(42);
        let items = vec![1, 2, 3];

        let chosen = rng.choose(&items);
        assert!(items.contains(chosen.unwrap()));

        let empty: Vec<i32> = vec![];
        assert!(rng.choose(&empty).is_none());
    }

    #[test]
    fn test_choose_weighted() {
        let mut rng = EpisodeRng::new(42);

        let weights = vec![0.0, 100.0, 0.0];
        for _ in 0..10 {
            assert_eq!(rng.choose_weighted(&weights), Some(1));
        }

        assert_eq!(rng.choose_weighted(&[]), None);
        assert_eq!(rng.choose_weighted(&[0.0, 0.0]), None);
        assert_eq!(rng.choose_weighted(&[-1.0, 0.0]), None);
    }

    #[test]
    fn test_state_roundtrip_continues_sequence() {
        let mut rng = EpisodeRng::new(42);
        for _ in 0..50 {
            rng.gen_range_usize(0..1000);
        }

        let state = rng.state();
        let expected: Vec<_> = (0..10).map(|_| rng.gen_range_usize(0..1000)).collect();

        let mut restored = EpisodeRng::from_state(&state);
        let actual: Vec<_> = (0..10).map(|_| restored.gen_range_usize(0..1000)).collect();

        assert_eq!(expected, actual);
    }

    #[test]
    fn test_state_serde() {
        let state = EpisodeRngState {
            seed: 42,
            word_pos: 12345,
            fork_counter: 2,
        };

        let json = serde_json::to_string(&state).unwrap();
        let deserialized: EpisodeRngState = serde_json::from_str(&json).unwrap();

        assert_eq!(state, deserialized);
    }
}
