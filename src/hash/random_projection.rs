//! Seeded generator for random hyperplanes.
//!
//! Hyperplane weights are standard-normal samples produced by the Box–Muller
//! transform. Draw order is fixed: row-major over the output, and every
//! sample consumes two fresh uniform draws (`u1`, `u2`) that are never shared
//! with another sample. With a fixed seed this makes the weight matrix, and
//! therefore every code, reproducible bit for bit.
//!
//! The generator is owned by the index and serialized with it (full stream
//! position, not just the seed), so a restored index continues exactly where
//! the original left off.

use crate::matrix::Matrix;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Seeded ChaCha12 stream (the algorithm behind `rand::rngs::StdRng`) that
/// remembers its seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionRng {
    seed: u64,
    rng: ChaCha12Rng,
}

impl ProjectionRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha12Rng::seed_from_u64(seed),
        }
    }

    /// Pick a seed from the thread-local entropy source.
    pub fn from_entropy() -> Self {
        Self::new(rand::rng().random())
    }

    /// Seed this stream was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restart the stream from its seed.
    pub fn reseed(&mut self) {
        self.rng = ChaCha12Rng::seed_from_u64(self.seed);
    }

    /// Position in the underlying ChaCha stream, in 32-bit words.
    pub fn word_pos(&self) -> u128 {
        self.rng.get_word_pos()
    }

    /// Uniform sample in `[0, 1)`.
    #[inline]
    pub fn next_uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// One normal sample with mean `mu` and standard deviation `sigma`.
    #[inline]
    pub fn next_normal(&mut self, mu: f64, sigma: f64) -> f64 {
        let u1 = self.next_uniform();
        let u2 = self.next_uniform();
        // 1 - u1 lies in (0, 1], keeping ln finite.
        (-2.0 * (1.0 - u1).ln()).sqrt() * (2.0 * PI * u2).cos() * sigma + mu
    }
}

/// `rows x cols` matrix of normal samples, drawn row-major.
pub fn rand_normal(
    rows: usize,
    cols: usize,
    mu: f64,
    sigma: f64,
    rng: &mut ProjectionRng,
) -> Matrix {
    let data: Vec<f64> = (0..rows * cols).map(|_| rng.next_normal(mu, sigma)).collect();
    Matrix::from_vec_unchecked(rows, cols, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_matrix() {
        let mut a = ProjectionRng::new(7);
        let mut b = ProjectionRng::new(7);
        assert_eq!(
            rand_normal(5, 9, 0.0, 1.0, &mut a),
            rand_normal(5, 9, 0.0, 1.0, &mut b)
        );
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_differ() {
        let mut a = ProjectionRng::new(1);
        let mut b = ProjectionRng::new(2);
        assert_ne!(
            rand_normal(3, 3, 0.0, 1.0, &mut a),
            rand_normal(3, 3, 0.0, 1.0, &mut b)
        );
    }

    #[test]
    fn each_sample_consumes_two_uniforms() {
        let mut rng = ProjectionRng::new(11);
        let m = rand_normal(2, 3, 0.0, 1.0, &mut rng);

        let mut manual = ProjectionRng::new(11);
        for i in 0..2 {
            for j in 0..3 {
                let u1 = manual.next_uniform();
                let u2 = manual.next_uniform();
                let z = (-2.0 * (1.0 - u1).ln()).sqrt() * (2.0 * PI * u2).cos();
                assert_eq!(m.get(i, j), z);
            }
        }
        assert_eq!(rng.word_pos(), manual.word_pos());
    }

    #[test]
    fn moments_are_roughly_standard() {
        let mut rng = ProjectionRng::new(42);
        let m = rand_normal(200, 100, 0.0, 1.0, &mut rng);
        let n = m.as_slice().len() as f64;
        let mean = m.as_slice().iter().sum::<f64>() / n;
        let var = m.as_slice().iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var - 1.0).abs() < 0.05, "variance {var}");
    }

    #[test]
    fn mu_and_sigma_shift_and_scale() {
        let mut a = ProjectionRng::new(3);
        let mut b = ProjectionRng::new(3);
        let std = rand_normal(1, 10, 0.0, 1.0, &mut a);
        let scaled = rand_normal(1, 10, 5.0, 2.0, &mut b);
        for (s, t) in std.as_slice().iter().zip(scaled.as_slice()) {
            assert!((s * 2.0 + 5.0 - t).abs() < 1e-12);
        }
    }

    #[test]
    fn reseed_restarts_stream() {
        let mut rng = ProjectionRng::new(9);
        let first = rand_normal(2, 2, 0.0, 1.0, &mut rng);
        let second = rand_normal(2, 2, 0.0, 1.0, &mut rng);
        assert_ne!(first, second);
        rng.reseed();
        assert_eq!(rand_normal(2, 2, 0.0, 1.0, &mut rng), first);
    }
}
