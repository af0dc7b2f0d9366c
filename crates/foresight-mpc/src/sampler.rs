//! Random candidate action sequences.
//!
//! [`UniformSampler`] draws every element of a `(N, H, D_act)` batch
//! independently from `U[low_d, high_d)`. It owns a ChaCha8 generator so
//! that a seeded sampler replays the same candidate stream.

use foresight_core::{ActionBounds, CandidateBatch, PlanError, SequenceSampler};
use ndarray::Array3;
use rand::distr::{Distribution, Uniform};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Uniform sampler over an [`ActionBounds`] box.
#[derive(Clone, Debug)]
pub struct UniformSampler {
    bounds: ActionBounds,
    dists: Vec<Uniform<f32>>,
    rng: ChaCha8Rng,
}

impl UniformSampler {
    /// Create a sampler seeded from the thread-local generator.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidArgument`] if any `high - low` is not
    /// representable as a finite `f32`.
    pub fn new(bounds: ActionBounds) -> Result<Self, PlanError> {
        let rng = ChaCha8Rng::from_rng(&mut rand::rng());
        Self::with_rng(bounds, rng)
    }

    /// Create a sampler whose candidate stream is fully determined by `seed`.
    pub fn seeded(bounds: ActionBounds, seed: u64) -> Result<Self, PlanError> {
        Self::with_rng(bounds, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(bounds: ActionBounds, rng: ChaCha8Rng) -> Result<Self, PlanError> {
        let dists = bounds
            .low()
            .iter()
            .zip(bounds.high().iter())
            .enumerate()
            .map(|(d, (&lo, &hi))| {
                Uniform::new(lo, hi).map_err(|e| {
                    PlanError::invalid_argument(format!("action bound {d} [{lo}, {hi}): {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { bounds, dists, rng })
    }

    /// The bounds this sampler draws from.
    pub fn bounds(&self) -> &ActionBounds {
        &self.bounds
    }

    /// Restart the candidate stream from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }
}

impl SequenceSampler for UniformSampler {
    fn action_dim(&self) -> usize {
        self.bounds.dim()
    }

    fn sample(
        &mut self,
        num_sequences: usize,
        horizon: usize,
    ) -> Result<CandidateBatch, PlanError> {
        if num_sequences == 0 {
            return Err(PlanError::invalid_argument("num_sequences must be at least 1"));
        }
        if horizon == 0 {
            return Err(PlanError::invalid_argument("horizon must be at least 1"));
        }
        let dists = &self.dists;
        let rng = &mut self.rng;
        // from_shape_fn visits indices in row-major order, so a seeded
        // sampler fills the same element with the same draw every time.
        let actions = Array3::from_shape_fn((num_sequences, horizon, dists.len()), |(_, _, d)| {
            dists[d].sample(&mut *rng)
        });
        CandidateBatch::new(actions)
    }
}
