//! Seeded randomness for jitter.
//!
//! Each solver that needs jitter owns its own generator, seeded from the
//! simulation seed combined with a fixed per-solver label. Separate streams
//! keep multiple simulations (and the solvers within one) from
//! cross-contaminating each other while staying reproducible for a given
//! seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A deterministic per-solver random stream.
#[derive(Debug, Clone)]
pub struct SolverRng {
    inner: ChaCha8Rng,
}

impl SolverRng {
    /// Create a stream for `label`, keyed by the simulation seed. The same
    /// `(seed, label)` pair always yields the same sequence.
    pub fn new(seed: u64, label: &str) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed ^ fnv1a(label)),
        }
    }

    /// Next value in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.inner.random::<f64>()
    }

    /// Next value in `[-scale / 2, scale / 2)`, used for position jitter.
    pub fn jitter(&mut self, scale: f64) -> f64 {
        (self.unit() - 0.5) * scale
    }
}

/// FNV-1a over the label bytes. The label is a compile-time constant per
/// solver, so this only needs to be stable, not fast.
fn fnv1a(label: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in label.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
