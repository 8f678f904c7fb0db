//! Complex white Gaussian source
//!
//! Drives the Doppler shaping filters. Uses the Box-Muller transform on a
//! ChaCha8 stream so that a seed fully determines the sequence.

use num_complex::Complex64;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::f64::consts::PI;

/// Circularly-symmetric complex Gaussian generator with configurable power
pub struct ComplexGaussian {
    /// Per-component standard deviation, sqrt(power / 2)
    std_dev: f64,

    rng: ChaCha8Rng,
}

impl ComplexGaussian {
    pub fn new(power: f64, seed: u64) -> Self {
        Self {
            std_dev: (power / 2.0).sqrt(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Create a generator whose seed is drawn from a parent stream
    pub fn from_rng(power: f64, seed_rng: &mut ChaCha8Rng) -> Self {
        let seed: u64 = seed_rng.gen();
        Self::new(power, seed)
    }

    /// Next sample; both Box-Muller outputs land in I and Q
    pub fn next_sample(&mut self) -> Complex64 {
        let u1: f64 = self.rng.gen();
        let u2: f64 = self.rng.gen();

        // Avoid log(0)
        let u1 = u1.max(1e-300);

        let r = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * PI * u2;

        Complex64::new(r * theta.cos(), r * theta.sin()) * self.std_dev
    }
}
