//! Batched rollout of candidate sequences through one dynamics model.
//!
//! For a single observation and a `(N, H, D_act)` candidate batch the
//! evaluator builds a `(N, H, D_obs)` predicted trajectory whose row 0 is
//! the observation itself, calling the reward function and the model once
//! per timestep on all `N` candidates at a time. Returns are the per-candidate
//! sum of rewards over the horizon.

use foresight_core::{
    ensure_shape, CandidateBatch, DataStatistics, DynamicsModel, PlanError, RewardFn,
};
use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis};
use tracing::trace;

/// Predicted trajectory and per-step rewards for one model.
#[derive(Clone, Debug, PartialEq)]
pub struct Rollout {
    trajectory: Array3<f32>,
    rewards: Array2<f32>,
}

impl Rollout {
    /// Predicted observations, shape `(N, H, D_obs)`.
    ///
    /// `trajectory[n, 0]` is the input observation for every `n`.
    pub fn trajectory(&self) -> ArrayView3<'_, f32> {
        self.trajectory.view()
    }

    /// Reward at each step, shape `(N, H)`.
    pub fn rewards(&self) -> ArrayView2<'_, f32> {
        self.rewards.view()
    }

    /// Horizon-sum of rewards per candidate, shape `(N,)`.
    pub fn returns(&self) -> Array1<f32> {
        self.rewards.sum_axis(Axis(1))
    }
}

/// Rolls candidate batches through dynamics models and scores them.
///
/// Borrows the reward function and the current statistics for the
/// duration of one planning call.
pub struct RolloutEvaluator<'a, R: RewardFn + ?Sized> {
    reward: &'a R,
    stats: Option<&'a DataStatistics>,
    obs_dim: usize,
    ac_dim: usize,
}

impl<'a, R: RewardFn + ?Sized> RolloutEvaluator<'a, R> {
    /// Create an evaluator for `obs_dim`-wide observations and
    /// `ac_dim`-wide candidate actions.
    pub fn new(
        reward: &'a R,
        stats: Option<&'a DataStatistics>,
        obs_dim: usize,
        ac_dim: usize,
    ) -> Self {
        Self {
            reward,
            stats,
            obs_dim,
            ac_dim,
        }
    }

    /// Per-candidate returns of `candidates` under `model`, shape `(N,)`.
    pub fn evaluate(
        &self,
        obs: ArrayView1<'_, f32>,
        candidates: &CandidateBatch,
        model: &dyn DynamicsModel,
    ) -> Result<Array1<f32>, PlanError> {
        self.evaluate_member(obs, candidates, 0, model)
    }

    /// As [`evaluate`](Self::evaluate), attributing model failures to
    /// ensemble member `member`.
    pub fn evaluate_member(
        &self,
        obs: ArrayView1<'_, f32>,
        candidates: &CandidateBatch,
        member: usize,
        model: &dyn DynamicsModel,
    ) -> Result<Array1<f32>, PlanError> {
        Ok(self.rollout_member(obs, candidates, member, model)?.returns())
    }

    /// Full predicted trajectory and reward table of `candidates` under `model`.
    pub fn rollout(
        &self,
        obs: ArrayView1<'_, f32>,
        candidates: &CandidateBatch,
        model: &dyn DynamicsModel,
    ) -> Result<Rollout, PlanError> {
        self.rollout_member(obs, candidates, 0, model)
    }

    fn rollout_member(
        &self,
        obs: ArrayView1<'_, f32>,
        candidates: &CandidateBatch,
        member: usize,
        model: &dyn DynamicsModel,
    ) -> Result<Rollout, PlanError> {
        let n = candidates.num_sequences();
        let h = candidates.horizon();
        ensure_shape("observation", &[self.obs_dim], obs.shape())?;
        ensure_shape("candidate batch", &[n, h, self.ac_dim], &candidates.shape())?;
        if model.requires_statistics() && self.stats.is_none() {
            return Err(PlanError::UninitializedStatistics);
        }

        let mut trajectory = Array3::<f32>::zeros((n, h, self.obs_dim));
        trajectory.index_axis_mut(Axis(1), 0).assign(&obs);
        let mut rewards = Array2::<f32>::zeros((n, h));

        for t in 0..h {
            let obs_t = trajectory.index_axis(Axis(1), t);
            let acs_t = candidates.step(t);

            let step = self
                .reward
                .reward(obs_t, acs_t)
                .map_err(PlanError::RewardFailed)?;
            ensure_shape("rewards", &[n], step.rewards.shape())?;
            ensure_shape("done flags", &[n], step.dones.shape())?;
            // Done flags are ignored: every rollout runs the full horizon.
            rewards.index_axis_mut(Axis(1), t).assign(&step.rewards);

            if t + 1 < h {
                let next = model
                    .predict(obs_t, acs_t, self.stats)
                    .map_err(|reason| PlanError::ModelFailed {
                        member,
                        name: model.name().to_string(),
                        reason,
                    })?;
                ensure_shape("predicted observations", &[n, self.obs_dim], next.shape())?;
                trajectory.index_axis_mut(Axis(1), t + 1).assign(&next);
            }
        }

        trace!(member, model = model.name(), n, h, "rollout complete");
        Ok(Rollout {
            trajectory,
            rewards,
        })
    }
}
