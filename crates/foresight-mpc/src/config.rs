//! Planner configuration, validation, and error types.
//!
//! [`PlannerConfig`] is the builder-input for constructing an
//! [`MpcPlanner`](crate::MpcPlanner). [`validate()`](PlannerConfig::validate)
//! checks structural invariants; the planner constructors call it before
//! touching the ensemble or sampler.

use std::error::Error;
use std::fmt;

use foresight_core::PlanError;

// ── EnsembleExecution ──────────────────────────────────────────────

/// How ensemble members are evaluated within one planning call.
///
/// Both modes produce bit-identical results: per-member returns are
/// always aggregated in member order, and a panicking member surfaces as
/// `PlanError::ModelFailed` in both.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnsembleExecution {
    /// Evaluate members one after another on the calling thread.
    #[default]
    Sequential,
    /// Evaluate each member on its own scoped thread.
    Threaded,
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while constructing a planner.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// `obs_dim` is zero.
    ZeroObsDim,
    /// `horizon` is zero.
    ZeroHorizon,
    /// `num_sequences` is zero.
    ZeroSequences,
    /// The ensemble has no members.
    EmptyEnsemble,
    /// The trajectory sampler could not be constructed.
    Sampler(PlanError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroObsDim => write!(f, "obs_dim must be at least 1"),
            Self::ZeroHorizon => write!(f, "horizon must be at least 1"),
            Self::ZeroSequences => write!(f, "num_sequences must be at least 1"),
            Self::EmptyEnsemble => write!(f, "ensemble must contain at least one dynamics model"),
            Self::Sampler(e) => write!(f, "sampler: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sampler(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PlanError> for ConfigError {
    fn from(e: PlanError) -> Self {
        Self::Sampler(e)
    }
}

// ── PlannerConfig ──────────────────────────────────────────────────

/// Fixed-at-construction planner settings.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannerConfig {
    /// Observation dimensionality `D_obs`.
    pub obs_dim: usize,
    /// Length `H` of each candidate action sequence. Default: 10.
    pub horizon: usize,
    /// Number `N` of candidate sequences sampled per call. Trades compute
    /// for plan quality. Default: 1000.
    pub num_sequences: usize,
    /// Ensemble evaluation mode. Default: [`EnsembleExecution::Sequential`].
    pub execution: EnsembleExecution,
    /// Sampler seed. `None` seeds from the thread-local generator.
    pub seed: Option<u64>,
}

impl PlannerConfig {
    /// Default settings for the given observation dimensionality.
    pub fn new(obs_dim: usize) -> Self {
        Self {
            obs_dim,
            horizon: 10,
            num_sequences: 1000,
            execution: EnsembleExecution::Sequential,
            seed: None,
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.obs_dim == 0 {
            return Err(ConfigError::ZeroObsDim);
        }
        if self.horizon == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        if self.num_sequences == 0 {
            return Err(ConfigError::ZeroSequences);
        }
        Ok(())
    }
}
