//! Collaborator traits consumed by the planning components.
//!
//! Dynamics models, reward functions, and critics are owned by other
//! subsystems (training, the environment). Planning code only calls them
//! through these traits and validates every array they return.

use ndarray::{Array1, Array2, ArrayView2, ArrayViewD};

use crate::batch::CandidateBatch;
use crate::error::{CollaboratorError, PlanError};
use crate::stats::DataStatistics;

/// One-step dynamics predictor: `(obs, action) -> next obs`, batched.
///
/// # Contract
///
/// - `predict` receives `(N, D_obs)` observations and `(N, D_act)` actions
///   and MUST return `(N, D_obs)` next observations.
/// - `predict` SHOULD be deterministic for identical inputs and statistics;
///   otherwise planning results are not reproducible.
/// - `&self`: models are read-only during a planning call.
///
/// # Object safety
///
/// Ensembles are stored as `Vec<Box<dyn DynamicsModel>>`.
///
/// # Examples
///
/// ```
/// use foresight_core::{CollaboratorError, DataStatistics, DynamicsModel};
/// use ndarray::{array, Array2, ArrayView2};
///
/// struct Drift;
///
/// impl DynamicsModel for Drift {
///     fn name(&self) -> &str { "drift" }
///
///     fn requires_statistics(&self) -> bool { false }
///
///     fn predict(
///         &self,
///         obs: ArrayView2<'_, f32>,
///         _acs: ArrayView2<'_, f32>,
///         _stats: Option<&DataStatistics>,
///     ) -> Result<Array2<f32>, CollaboratorError> {
///         Ok(&obs + 1.0)
///     }
/// }
///
/// let next = Drift
///     .predict(array![[0.0f32, 1.0]].view(), array![[0.5f32]].view(), None)
///     .unwrap();
/// assert_eq!(next, array![[1.0f32, 2.0]]);
/// ```
pub trait DynamicsModel: Send + Sync {
    /// Human-readable name for error reporting and logs.
    fn name(&self) -> &str;

    /// Whether `predict` needs [`DataStatistics`].
    ///
    /// Callers refuse to invoke a model that returns `true` here while no
    /// statistics are available. Default: `true`.
    fn requires_statistics(&self) -> bool {
        true
    }

    /// Predict next observations for a batch of `(obs, action)` pairs.
    fn predict(
        &self,
        obs: ArrayView2<'_, f32>,
        acs: ArrayView2<'_, f32>,
        stats: Option<&DataStatistics>,
    ) -> Result<Array2<f32>, CollaboratorError>;
}

/// Per-sample rewards and termination flags for one batched reward call.
#[derive(Clone, Debug, PartialEq)]
pub struct RewardBatch {
    /// Reward per sample, shape `(N,)`.
    pub rewards: Array1<f32>,
    /// Episode-termination flag per sample, shape `(N,)`.
    pub dones: Array1<bool>,
}

impl RewardBatch {
    /// Rewards with every done flag cleared.
    pub fn not_done(rewards: Array1<f32>) -> Self {
        let n = rewards.len();
        Self {
            rewards,
            dones: Array1::from_elem(n, false),
        }
    }
}

/// Environment reward, evaluated on predicted observations.
pub trait RewardFn: Send + Sync {
    /// Rewards for `(N, D_obs)` observations and `(N, D_act)` actions.
    ///
    /// MUST return `rewards` and `dones` of shape `(N,)`.
    fn reward(
        &self,
        obs: ArrayView2<'_, f32>,
        acs: ArrayView2<'_, f32>,
    ) -> Result<RewardBatch, CollaboratorError>;
}

/// Action-value function over a discrete action space.
pub trait Critic: Send + Sync {
    /// Q-values for a batch of observations.
    ///
    /// `obs` has a leading batch axis of length `B`; the remaining axes are
    /// the observation's own shape. MUST return `(B, num_actions)`.
    fn qa_values(&self, obs: ArrayViewD<'_, f32>) -> Result<Array2<f32>, CollaboratorError>;
}

/// Source of candidate action sequences for planning.
pub trait SequenceSampler: Send {
    /// Action dimensionality `D_act` of every batch this sampler produces.
    fn action_dim(&self) -> usize;

    /// Produce `num_sequences` candidate sequences of length `horizon`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidArgument`] if either count is zero.
    fn sample(&mut self, num_sequences: usize, horizon: usize)
        -> Result<CandidateBatch, PlanError>;
}
