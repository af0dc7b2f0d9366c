//! Reference dynamics model with fixed linear weights.
//!
//! [`LinearDeltaModel`] follows the usual learned-dynamics convention:
//! normalise observation and action, predict a normalised delta, map the
//! delta back to observation space, and add it to the observation. Weights
//! are supplied by whatever fitted them; this crate never trains.

use foresight_core::{CollaboratorError, DataStatistics, DynamicsModel, PlanError};
use ndarray::{concatenate, Array1, Array2, ArrayView2, Axis};

/// `next = obs + unnormalize_delta(W [norm(obs); norm(acs)] + b)`.
#[derive(Clone, Debug)]
pub struct LinearDeltaModel {
    name: String,
    /// Shape `(D_obs, D_obs + D_act)`.
    weights: Array2<f32>,
    /// Shape `(D_obs,)`.
    bias: Array1<f32>,
    ac_dim: usize,
}

impl LinearDeltaModel {
    /// Create a model from a `(D_obs, D_obs + D_act)` weight matrix and a
    /// `(D_obs,)` bias.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::ShapeMismatch`] if the weight matrix or bias do
    /// not match `ac_dim`, or [`PlanError::InvalidArgument`] if any
    /// parameter is non-finite.
    pub fn new(
        name: impl Into<String>,
        weights: Array2<f32>,
        bias: Array1<f32>,
        ac_dim: usize,
    ) -> Result<Self, PlanError> {
        let obs_dim = bias.len();
        if obs_dim == 0 || ac_dim == 0 {
            return Err(PlanError::invalid_argument(
                "linear delta model needs non-empty observation and action spaces",
            ));
        }
        foresight_core::ensure_shape("weights", &[obs_dim, obs_dim + ac_dim], weights.shape())?;
        if weights.iter().chain(bias.iter()).any(|v| !v.is_finite()) {
            return Err(PlanError::invalid_argument(
                "linear delta model parameters must be finite",
            ));
        }
        Ok(Self {
            name: name.into(),
            weights,
            bias,
            ac_dim,
        })
    }

    /// A model that always predicts a zero delta (next = obs).
    pub fn zeros(name: impl Into<String>, obs_dim: usize, ac_dim: usize) -> Result<Self, PlanError> {
        Self::new(
            name,
            Array2::zeros((obs_dim, obs_dim + ac_dim)),
            Array1::zeros(obs_dim),
            ac_dim,
        )
    }

    /// Observation dimensionality.
    pub fn obs_dim(&self) -> usize {
        self.bias.len()
    }

    /// Action dimensionality.
    pub fn ac_dim(&self) -> usize {
        self.ac_dim
    }
}

fn failed(e: impl std::fmt::Display) -> CollaboratorError {
    CollaboratorError::ExecutionFailed {
        reason: e.to_string(),
    }
}

impl DynamicsModel for LinearDeltaModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(
        &self,
        obs: ArrayView2<'_, f32>,
        acs: ArrayView2<'_, f32>,
        stats: Option<&DataStatistics>,
    ) -> Result<Array2<f32>, CollaboratorError> {
        let stats = stats.ok_or(CollaboratorError::MissingStatistics)?;
        if obs.ncols() != self.obs_dim() || acs.ncols() != self.ac_dim {
            return Err(failed(format!(
                "expected ({}, {}) inputs, got obs {:?} and acs {:?}",
                self.obs_dim(),
                self.ac_dim,
                obs.shape(),
                acs.shape()
            )));
        }
        if obs.nrows() != acs.nrows() {
            return Err(failed(format!(
                "batch sizes differ: {} observations, {} actions",
                obs.nrows(),
                acs.nrows()
            )));
        }

        let obs_n = stats.normalize_obs(obs).map_err(failed)?;
        let acs_n = stats.normalize_acs(acs).map_err(failed)?;
        let input = concatenate(Axis(1), &[obs_n.view(), acs_n.view()]).map_err(failed)?;
        let delta_n = input.dot(&self.weights.t()) + &self.bias;
        let delta = stats.unnormalize_delta(delta_n.view()).map_err(failed)?;
        Ok(&obs + &delta)
    }
}
