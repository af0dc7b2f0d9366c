//! Random-shooting MPC over an ensemble of dynamics models.
//!
//! [`MpcPlanner`] owns the ensemble, the reward function, and a
//! [`SequenceSampler`]. Each [`plan`](MpcPlanner::plan) call:
//!
//! 1. Falls back to one uniformly random action if no data statistics
//!    have been injected yet (no model is touched).
//! 2. Samples `N` candidate sequences of length `H`.
//! 3. Rolls the candidates through every ensemble member.
//! 4. Averages per-candidate returns across members.
//! 5. Returns the first action of the first candidate with the highest
//!    mean return, as a `(1, D_act)` array.
//!
//! Nothing carries over between calls except the sampler's RNG state, the
//! injected statistics, and the telemetry in [`PlanMetrics`].

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use foresight_core::{
    ensure_shape, first_argmax, ActionBounds, CandidateBatch, CollaboratorError, DataStatistics,
    DynamicsModel, PlanError, RewardFn, SequenceSampler,
};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use tracing::{debug, debug_span, trace};

use crate::config::{ConfigError, EnsembleExecution, PlannerConfig};
use crate::metrics::{elapsed_us, PlanMetrics};
use crate::rollout::RolloutEvaluator;
use crate::sampler::UniformSampler;

/// Per-member returns and rollout time in microseconds.
type MemberResult = Result<(Array1<f32>, u64), PlanError>;

/// Ensemble model-predictive controller.
pub struct MpcPlanner<R, S = UniformSampler> {
    config: PlannerConfig,
    ensemble: Vec<Box<dyn DynamicsModel>>,
    reward: R,
    sampler: S,
    stats: Option<Arc<DataStatistics>>,
    last_metrics: Option<PlanMetrics>,
}

impl<R: RewardFn> MpcPlanner<R, UniformSampler> {
    /// Create a planner that samples uniformly within `bounds`.
    ///
    /// The sampler is seeded from `config.seed` when set.
    pub fn new(
        config: PlannerConfig,
        bounds: ActionBounds,
        ensemble: Vec<Box<dyn DynamicsModel>>,
        reward: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let sampler = match config.seed {
            Some(seed) => UniformSampler::seeded(bounds, seed)?,
            None => UniformSampler::new(bounds)?,
        };
        Self::with_sampler(config, ensemble, reward, sampler)
    }
}

impl<R: RewardFn, S: SequenceSampler> MpcPlanner<R, S> {
    /// Create a planner with a caller-supplied candidate sampler.
    ///
    /// `config.seed` is ignored; seeding is the sampler's business.
    pub fn with_sampler(
        config: PlannerConfig,
        ensemble: Vec<Box<dyn DynamicsModel>>,
        reward: R,
        sampler: S,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if ensemble.is_empty() {
            return Err(ConfigError::EmptyEnsemble);
        }
        if sampler.action_dim() == 0 {
            return Err(ConfigError::Sampler(PlanError::invalid_argument(
                "sampler action dimension must be at least 1",
            )));
        }
        Ok(Self {
            config,
            ensemble,
            reward,
            sampler,
            stats: None,
            last_metrics: None,
        })
    }

    /// The planner's configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Number of ensemble members.
    pub fn ensemble_len(&self) -> usize {
        self.ensemble.len()
    }

    /// The candidate sampler.
    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// Mutable access to the candidate sampler (e.g. to reseed it).
    pub fn sampler_mut(&mut self) -> &mut S {
        &mut self.sampler
    }

    /// Currently injected data statistics, if any.
    pub fn data_statistics(&self) -> Option<&Arc<DataStatistics>> {
        self.stats.as_ref()
    }

    /// Replace the data statistics used by every subsequent call.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::ShapeMismatch`] if the statistics describe a
    /// different observation or action dimensionality than the planner.
    pub fn set_data_statistics(&mut self, stats: Arc<DataStatistics>) -> Result<(), PlanError> {
        ensure_shape(
            "data statistics dimensions",
            &[self.config.obs_dim, self.sampler.action_dim()],
            &[stats.obs_dim(), stats.ac_dim()],
        )?;
        debug!(
            obs_dim = stats.obs_dim(),
            ac_dim = stats.ac_dim(),
            "data statistics replaced"
        );
        self.stats = Some(stats);
        Ok(())
    }

    /// Drop the injected statistics, returning the planner to cold start.
    pub fn clear_data_statistics(&mut self) -> Option<Arc<DataStatistics>> {
        self.stats.take()
    }

    /// Metrics from the most recent successful [`plan`](Self::plan) call.
    pub fn last_metrics(&self) -> Option<&PlanMetrics> {
        self.last_metrics.as_ref()
    }

    /// Choose an action for observation `obs`.
    ///
    /// Returns a `(1, D_act)` array holding the first action of the best
    /// candidate sequence, or a uniformly random action before any data
    /// statistics have been injected.
    ///
    /// # Errors
    ///
    /// Any sampler, rollout, or shape failure aborts the call. Ensemble
    /// members are never skipped. A member that panics is reported as
    /// [`PlanError::ModelFailed`] in either execution mode.
    pub fn plan(&mut self, obs: ArrayView1<'_, f32>) -> Result<Array2<f32>, PlanError> {
        let start = Instant::now();
        ensure_shape("observation", &[self.config.obs_dim], obs.shape())?;

        let Some(stats) = self.stats.clone() else {
            return self.random_action(start);
        };

        let n = self.config.num_sequences;
        let h = self.config.horizon;
        let span = debug_span!("plan", n, horizon = h, members = self.ensemble.len());
        let _enter = span.enter();

        let sample_start = Instant::now();
        let candidates = self.sampler.sample(n, h)?;
        ensure_shape(
            "candidate batch",
            &[n, h, self.sampler.action_dim()],
            &candidates.shape(),
        )?;
        let sample_us = elapsed_us(sample_start);

        let evaluator = RolloutEvaluator::new(
            &self.reward,
            Some(stats.as_ref()),
            self.config.obs_dim,
            self.sampler.action_dim(),
        );
        let per_member = match self.config.execution {
            EnsembleExecution::Sequential => {
                evaluate_sequential(&self.ensemble, &evaluator, obs, &candidates)
            }
            EnsembleExecution::Threaded => {
                evaluate_threaded(&self.ensemble, &evaluator, obs, &candidates)
            }
        }?;

        // Summed in member order so threaded and sequential runs agree bit-for-bit.
        let mut total = Array1::<f32>::zeros(n);
        let mut member_us = Vec::with_capacity(per_member.len());
        for (member, (returns, us)) in per_member.iter().enumerate() {
            trace!(member, mean_return = returns.mean().unwrap_or(f32::NAN), "member evaluated");
            total += returns;
            member_us.push(*us);
        }
        let ensemble_return = total / self.ensemble.len() as f32;

        let best = first_argmax(ensemble_return.iter().copied())
            .ok_or_else(|| PlanError::invalid_argument("empty candidate batch"))?;
        let best_return = ensemble_return[best];
        debug!(best, best_return, "candidate selected");

        let action = candidates.first_action(best).to_owned().insert_axis(Axis(0));
        self.last_metrics = Some(PlanMetrics {
            total_us: elapsed_us(start),
            sample_us,
            member_us,
            cold_start: false,
            best_index: Some(best),
            best_return: Some(best_return),
        });
        Ok(action)
    }

    fn random_action(&mut self, start: Instant) -> Result<Array2<f32>, PlanError> {
        debug!("no data statistics; sampling random action");
        let sample_start = Instant::now();
        let batch = self.sampler.sample(1, 1)?;
        ensure_shape(
            "candidate batch",
            &[1, 1, self.sampler.action_dim()],
            &batch.shape(),
        )?;
        let sample_us = elapsed_us(sample_start);
        // (1, 1, D_act) -> (1, D_act)
        let action = batch.into_array().index_axis_move(Axis(0), 0);
        self.last_metrics = Some(PlanMetrics {
            total_us: elapsed_us(start),
            sample_us,
            cold_start: true,
            ..PlanMetrics::default()
        });
        Ok(action)
    }
}

fn evaluate_member<R: RewardFn + ?Sized>(
    evaluator: &RolloutEvaluator<'_, R>,
    obs: ArrayView1<'_, f32>,
    candidates: &CandidateBatch,
    member: usize,
    model: &dyn DynamicsModel,
) -> MemberResult {
    let start = Instant::now();
    let returns = evaluator.evaluate_member(obs, candidates, member, model)?;
    Ok((returns, elapsed_us(start)))
}

fn member_panicked(member: usize, model: &dyn DynamicsModel) -> PlanError {
    PlanError::ModelFailed {
        member,
        name: model.name().to_string(),
        reason: CollaboratorError::ExecutionFailed {
            reason: "member panicked during rollout".into(),
        },
    }
}

fn evaluate_sequential<R: RewardFn + ?Sized>(
    ensemble: &[Box<dyn DynamicsModel>],
    evaluator: &RolloutEvaluator<'_, R>,
    obs: ArrayView1<'_, f32>,
    candidates: &CandidateBatch,
) -> Result<Vec<(Array1<f32>, u64)>, PlanError> {
    ensemble
        .iter()
        .enumerate()
        .map(|(member, model)| {
            // Panics are reported the same way as in threaded mode.
            panic::catch_unwind(AssertUnwindSafe(|| {
                evaluate_member(evaluator, obs, candidates, member, model.as_ref())
            }))
            .unwrap_or_else(|_| Err(member_panicked(member, model.as_ref())))
        })
        .collect()
}

fn evaluate_threaded<R: RewardFn + ?Sized>(
    ensemble: &[Box<dyn DynamicsModel>],
    evaluator: &RolloutEvaluator<'_, R>,
    obs: ArrayView1<'_, f32>,
    candidates: &CandidateBatch,
) -> Result<Vec<(Array1<f32>, u64)>, PlanError> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = ensemble
            .iter()
            .enumerate()
            .map(|(member, model)| {
                scope.spawn(move || {
                    evaluate_member(evaluator, obs, candidates, member, model.as_ref())
                })
            })
            .collect();
        // Join every handle before inspecting results: an unjoined panicked
        // thread would re-panic when the scope closes.
        let joined: Vec<MemberResult> = handles
            .into_iter()
            .enumerate()
            .map(|(member, handle)| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(member_panicked(member, ensemble[member].as_ref())))
            })
            .collect();
        joined.into_iter().collect()
    })
}
