//! Standard-normal sample sources.

use std::f64::consts::PI;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::error::{Result, SimError};

/// Anything that yields one standard-normal sample per call.
pub trait GaussianSource {
    /// Draws the next sample.
    fn sample(&mut self) -> f64;
}

/// Box-Muller transform, cosine branch only.
///
/// `u1` must lie in `(0, 1]`; zero has no logarithm.
pub fn box_muller(u1: f64, u2: f64) -> Result<f64> {
    if u1 <= 0.0 {
        return Err(SimError::DomainError {
            context: "box-muller requires u1 > 0",
        });
    }

    Ok((-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos())
}

/// Gaussian sampler backed by an explicitly seeded generator.
pub struct BoxMullerSampler<R = StdRng> {
    rng: R,
}

impl BoxMullerSampler<StdRng> {
    /// Creates a sampler whose stream is fully determined by `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> BoxMullerSampler<R> {
    /// Wraps an existing generator.
    pub fn from_rng(rng: R) -> Self {
        Self { rng }
    }

    fn nonzero_uniform(&mut self) -> f64 {
        loop {
            let u: f64 = self.rng.random();
            if u > 0.0 {
                return u;
            }
        }
    }
}

impl<R: Rng> GaussianSource for BoxMullerSampler<R> {
    fn sample(&mut self) -> f64 {
        let u1 = self.nonzero_uniform();
        let u2: f64 = self.rng.random();

        // u1 is strictly positive here
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

/// Replays a fixed sequence of samples, wrapping around at the end.
#[derive(Clone, Debug)]
pub struct SequenceSampler {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceSampler {
    /// Replays `values` in order. An empty sequence yields zeros.
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    /// Always returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of samples handed out so far.
    pub fn drawn(&self) -> usize {
        self.cursor
    }
}

impl GaussianSource for SequenceSampler {
    fn sample(&mut self) -> f64 {
        let value = if self.values.is_empty() {
            0.0
        } else {
            self.values[self.cursor % self.values.len()]
        };

        self.cursor += 1;
        value
    }
}
