//! Normalisation statistics supplied by the training subsystem.
//!
//! The planner treats [`DataStatistics`] as opaque and only forwards it to
//! dynamics models. Models that work in normalised space use the helpers
//! here.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{ensure_shape, PlanError};

/// Added to the standard deviation before dividing.
pub const NORMALIZE_EPS: f32 = 1e-8;

/// Mean and standard deviation of one quantity.
#[derive(Clone, Debug, PartialEq)]
pub struct Normalizer {
    mean: Array1<f32>,
    std: Array1<f32>,
}

impl Normalizer {
    /// Create a normaliser.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidArgument`] if the lengths differ, the
    /// length is zero, any value is non-finite, or any std is negative.
    pub fn new(mean: Vec<f32>, std: Vec<f32>) -> Result<Self, PlanError> {
        if mean.len() != std.len() {
            return Err(PlanError::invalid_argument(format!(
                "normalizer mean has {} entries but std has {}",
                mean.len(),
                std.len()
            )));
        }
        if mean.is_empty() {
            return Err(PlanError::invalid_argument("normalizer must be non-empty"));
        }
        if mean.iter().any(|m| !m.is_finite()) {
            return Err(PlanError::invalid_argument("normalizer mean must be finite"));
        }
        if std.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(PlanError::invalid_argument(
                "normalizer std must be finite and >= 0",
            ));
        }
        Ok(Self {
            mean: Array1::from(mean),
            std: Array1::from(std),
        })
    }

    /// The identity normaliser (mean 0, std 1) of dimension `dim`.
    pub fn identity(dim: usize) -> Self {
        Self {
            mean: Array1::zeros(dim),
            std: Array1::ones(dim),
        }
    }

    /// Number of entries.
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Per-entry mean.
    pub fn mean(&self) -> ArrayView1<'_, f32> {
        self.mean.view()
    }

    /// Per-entry standard deviation.
    pub fn std(&self) -> ArrayView1<'_, f32> {
        self.std.view()
    }

    /// `(x - mean) / (std + eps)` applied row-wise to a `(N, dim)` batch.
    pub fn normalize(&self, x: ArrayView2<'_, f32>) -> Result<Array2<f32>, PlanError> {
        ensure_shape("normalize input", &[x.nrows(), self.dim()], x.shape())?;
        let denom = self.std.mapv(|s| s + NORMALIZE_EPS);
        Ok((&x - &self.mean.view().insert_axis(Axis(0))) / &denom.insert_axis(Axis(0)))
    }

    /// `x * std + mean` applied row-wise to a `(N, dim)` batch.
    pub fn unnormalize(&self, x: ArrayView2<'_, f32>) -> Result<Array2<f32>, PlanError> {
        ensure_shape("unnormalize input", &[x.nrows(), self.dim()], x.shape())?;
        Ok(&x * &self.std.view().insert_axis(Axis(0)) + &self.mean.view().insert_axis(Axis(0)))
    }
}

/// Normalisation statistics for observations, actions, and observation deltas.
#[derive(Clone, Debug, PartialEq)]
pub struct DataStatistics {
    obs: Normalizer,
    acs: Normalizer,
    delta: Normalizer,
}

impl DataStatistics {
    /// Bundle the three normalisers.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidArgument`] if `obs` and `delta` differ in
    /// dimension (deltas live in observation space).
    pub fn new(obs: Normalizer, acs: Normalizer, delta: Normalizer) -> Result<Self, PlanError> {
        if obs.dim() != delta.dim() {
            return Err(PlanError::invalid_argument(format!(
                "observation statistics have {} entries but delta statistics have {}",
                obs.dim(),
                delta.dim()
            )));
        }
        Ok(Self { obs, acs, delta })
    }

    /// Identity statistics for the given dimensions.
    pub fn identity(obs_dim: usize, ac_dim: usize) -> Self {
        Self {
            obs: Normalizer::identity(obs_dim),
            acs: Normalizer::identity(ac_dim),
            delta: Normalizer::identity(obs_dim),
        }
    }

    /// Observation normaliser.
    pub fn obs(&self) -> &Normalizer {
        &self.obs
    }

    /// Action normaliser.
    pub fn acs(&self) -> &Normalizer {
        &self.acs
    }

    /// Observation-delta normaliser.
    pub fn delta(&self) -> &Normalizer {
        &self.delta
    }

    /// Observation dimensionality these statistics describe.
    pub fn obs_dim(&self) -> usize {
        self.obs.dim()
    }

    /// Action dimensionality these statistics describe.
    pub fn ac_dim(&self) -> usize {
        self.acs.dim()
    }

    /// Normalise a batch of observations.
    pub fn normalize_obs(&self, obs: ArrayView2<'_, f32>) -> Result<Array2<f32>, PlanError> {
        self.obs.normalize(obs)
    }

    /// Normalise a batch of actions.
    pub fn normalize_acs(&self, acs: ArrayView2<'_, f32>) -> Result<Array2<f32>, PlanError> {
        self.acs.normalize(acs)
    }

    /// Map normalised deltas back to observation space.
    pub fn unnormalize_delta(&self, delta: ArrayView2<'_, f32>) -> Result<Array2<f32>, PlanError> {
        self.delta.unnormalize(delta)
    }
}
