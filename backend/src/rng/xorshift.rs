//! xorshift64* random number generator
//!
//! Fast, deterministic PRNG suitable for Monte Carlo resampling.
//!
//! # Determinism
//!
//! Same seed → same sequence. Monte Carlo batches never share a generator:
//! each batch gets its own stream via [`RngManager::derive`], so the samples
//! drawn for batch *k* do not depend on how many threads ran the other batches.

use serde::{Deserialize, Serialize};

/// SplitMix64 increment (golden ratio)
const SPLITMIX_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use kpi_forecast_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let u = rng.uniform(-0.2, 0.2);
/// assert!((-0.2..0.2).contains(&u));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngManager {
    /// Internal state (64-bit, never zero)
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed
    ///
    /// A zero seed is mapped to 1 (xorshift cannot leave the all-zero state).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Create an RNG for stream `stream` of a base seed
    ///
    /// Streams are decorrelated by passing `seed + stream * gamma` through the
    /// SplitMix64 finaliser, so neighbouring batch indices yield unrelated
    /// sequences.
    pub fn derive(seed: u64, stream: u64) -> Self {
        let mut z = seed.wrapping_add(stream.wrapping_add(1).wrapping_mul(SPLITMIX_GAMMA));
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        Self::new(z)
    }

    /// Draw a fresh seed from a random (v4) UUID
    ///
    /// Used when the caller supplies no seed; the drawn seed is reported
    /// back so the run can be replayed.
    pub fn entropy_seed() -> u64 {
        let (high, low) = uuid::Uuid::new_v4().as_u64_pair();
        high ^ low.rotate_left(17)
    }

    /// Generate next random u64 value
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Generate random f64 in [0.0, 1.0)
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next();
        // Top 53 bits → uniform mantissa
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Uniform draw in [min, max)
    ///
    /// Returns `min` when the interval is empty or inverted.
    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.next_f64()
    }

    /// Current internal state (for replay)
    pub fn get_state(&self) -> u64 {
        self.state
    }
}
