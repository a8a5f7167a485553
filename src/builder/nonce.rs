use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::num::NonZeroU32;
use std::sync::Mutex;

/// Default upper bound (inclusive) of the nonce draw
pub const DEFAULT_NONCE_RANGE: NonZeroU32 = match NonZeroU32::new(100_000) {
    Some(range) => range,
    None => unreachable!(),
};

/// Source of transaction nonces
///
/// Implementations must draw uniformly from `1..=range` so that two payloads
/// built back to back collide with probability at most `1 / range`.
pub trait NonceSource: Send + Sync {
    fn next_nonce(&self) -> NonZeroU32;
}

/// Draws from the calling thread's RNG; no state is shared between tasks
#[derive(Debug, Clone, Copy)]
pub struct ThreadRngNonce {
    range: NonZeroU32,
}

impl ThreadRngNonce {
    pub fn new(range: NonZeroU32) -> Self {
        Self { range }
    }
}

impl Default for ThreadRngNonce {
    fn default() -> Self {
        Self::new(DEFAULT_NONCE_RANGE)
    }
}

impl NonceSource for ThreadRngNonce {
    fn next_nonce(&self) -> NonZeroU32 {
        draw(&mut rand::thread_rng(), self.range)
    }
}

/// Deterministic nonce stream for reproducible runs and tests
#[derive(Debug)]
pub struct SeededNonce {
    range: NonZeroU32,
    rng: Mutex<StdRng>,
}

impl SeededNonce {
    pub fn new(seed: u64, range: NonZeroU32) -> Self {
        Self {
            range,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl NonceSource for SeededNonce {
    fn next_nonce(&self) -> NonZeroU32 {
        // RNG state stays valid even if another draw panicked
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        draw(&mut *rng, self.range)
    }
}

fn draw<R: Rng + ?Sized>(rng: &mut R, range: NonZeroU32) -> NonZeroU32 {
    let value = rng.gen_range(1..=range.get());
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn range(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn test_draws_stay_in_range() {
        let source = SeededNonce::new(7, range(10));
        for _ in 0..10_000 {
            let nonce = source.next_nonce().get();
            assert!((1..=10).contains(&nonce));
        }
    }

    #[test]
    fn test_range_of_one_is_constant() {
        let source = ThreadRngNonce::new(range(1));
        assert_eq!(source.next_nonce().get(), 1);
        assert_eq!(source.next_nonce().get(), 1);
    }

    #[test]
    fn test_same_seed_same_stream() {
        let a = SeededNonce::new(42, DEFAULT_NONCE_RANGE);
        let b = SeededNonce::new(42, DEFAULT_NONCE_RANGE);
        let left: Vec<u32> = (0..100).map(|_| a.next_nonce().get()).collect();
        let right: Vec<u32> = (0..100).map(|_| b.next_nonce().get()).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn test_thread_rng_is_not_constant() {
        let source = ThreadRngNonce::default();
        let distinct: HashSet<u32> = (0..1_000).map(|_| source.next_nonce().get()).collect();
        // 1000 draws from 100k values: the chance of fewer than 900 distinct is negligible
        assert!(distinct.len() > 900, "only {} distinct nonces", distinct.len());
    }
}
