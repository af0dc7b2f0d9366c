//! Reusable dynamics-model and reward fixtures.
//!
//! Deterministic stubs with closed-form outputs for rollout and planner
//! tests:
//!
//! - [`ShiftModel`]: adds a constant to every observation entry.
//! - [`ActionIntegratorModel`]: adds `gain * action` to the observation.
//! - [`CountingModel`]: wraps another model and counts `predict` calls.
//! - [`FailingModel`]: fails every call (and counts them).
//! - [`WrongShapeModel`]: returns one column too many.
//! - [`PanickingModel`]: panics inside `predict`.
//! - [`FirstObsReward`], [`ObsSumReward`], [`ConstantReward`],
//!   [`BadShapeReward`], [`BadDonesReward`]: reward functions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use foresight_core::{CollaboratorError, DataStatistics, DynamicsModel, RewardBatch, RewardFn};
use ndarray::{Array1, Array2, ArrayView2, Axis};

fn missing_stats(needs: bool, stats: Option<&DataStatistics>) -> Result<(), CollaboratorError> {
    if needs && stats.is_none() {
        Err(CollaboratorError::MissingStatistics)
    } else {
        Ok(())
    }
}

// ── Models ─────────────────────────────────────────────────────────

/// `next = obs + shift`.
pub struct ShiftModel {
    pub name: String,
    pub shift: f32,
    pub needs_stats: bool,
}

impl ShiftModel {
    pub fn new(name: impl Into<String>, shift: f32) -> Self {
        Self {
            name: name.into(),
            shift,
            needs_stats: true,
        }
    }

    /// Same model, but usable without data statistics.
    pub fn without_statistics(mut self) -> Self {
        self.needs_stats = false;
        self
    }
}

impl DynamicsModel for ShiftModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires_statistics(&self) -> bool {
        self.needs_stats
    }

    fn predict(
        &self,
        obs: ArrayView2<'_, f32>,
        _acs: ArrayView2<'_, f32>,
        stats: Option<&DataStatistics>,
    ) -> Result<Array2<f32>, CollaboratorError> {
        missing_stats(self.needs_stats, stats)?;
        Ok(&obs + self.shift)
    }
}

/// `next = obs + gain * action`. Requires `D_obs == D_act`.
pub struct ActionIntegratorModel {
    pub name: String,
    pub gain: f32,
    pub needs_stats: bool,
}

impl ActionIntegratorModel {
    pub fn new(name: impl Into<String>, gain: f32) -> Self {
        Self {
            name: name.into(),
            gain,
            needs_stats: true,
        }
    }

    /// Same model, but usable without data statistics.
    pub fn without_statistics(mut self) -> Self {
        self.needs_stats = false;
        self
    }
}

impl DynamicsModel for ActionIntegratorModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires_statistics(&self) -> bool {
        self.needs_stats
    }

    fn predict(
        &self,
        obs: ArrayView2<'_, f32>,
        acs: ArrayView2<'_, f32>,
        stats: Option<&DataStatistics>,
    ) -> Result<Array2<f32>, CollaboratorError> {
        missing_stats(self.needs_stats, stats)?;
        if obs.shape() != acs.shape() {
            return Err(CollaboratorError::ExecutionFailed {
                reason: format!(
                    "integrator needs matching shapes, got obs {:?} and acs {:?}",
                    obs.shape(),
                    acs.shape()
                ),
            });
        }
        Ok(&obs + &(&acs * self.gain))
    }
}

/// Wraps a model and counts `predict` calls.
///
/// Clone the counter with [`counter`](CountingModel::counter) before
/// moving the model into an ensemble.
pub struct CountingModel {
    inner: Box<dyn DynamicsModel>,
    calls: Arc<AtomicUsize>,
}

impl CountingModel {
    pub fn new(inner: impl DynamicsModel + 'static) -> Self {
        Self {
            inner: Box::new(inner),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle to the call counter.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Number of `predict` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DynamicsModel for CountingModel {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn requires_statistics(&self) -> bool {
        self.inner.requires_statistics()
    }

    fn predict(
        &self,
        obs: ArrayView2<'_, f32>,
        acs: ArrayView2<'_, f32>,
        stats: Option<&DataStatistics>,
    ) -> Result<Array2<f32>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.predict(obs, acs, stats)
    }
}

/// Fails every `predict` call. Counts calls so tests can assert it was
/// never reached.
pub struct FailingModel {
    pub name: String,
    calls: Arc<AtomicUsize>,
}

impl FailingModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle to the call counter.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl DynamicsModel for FailingModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(
        &self,
        _obs: ArrayView2<'_, f32>,
        _acs: ArrayView2<'_, f32>,
        _stats: Option<&DataStatistics>,
    ) -> Result<Array2<f32>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CollaboratorError::ExecutionFailed {
            reason: format!("{} must not be invoked", self.name),
        })
    }
}

/// Returns `(N, D_obs + 1)` predictions.
pub struct WrongShapeModel;

impl DynamicsModel for WrongShapeModel {
    fn name(&self) -> &str {
        "wrong_shape"
    }

    fn predict(
        &self,
        obs: ArrayView2<'_, f32>,
        _acs: ArrayView2<'_, f32>,
        _stats: Option<&DataStatistics>,
    ) -> Result<Array2<f32>, CollaboratorError> {
        Ok(Array2::zeros((obs.nrows(), obs.ncols() + 1)))
    }
}

/// Panics inside `predict`.
pub struct PanickingModel;

impl DynamicsModel for PanickingModel {
    fn name(&self) -> &str {
        "panicking"
    }

    fn predict(
        &self,
        _obs: ArrayView2<'_, f32>,
        _acs: ArrayView2<'_, f32>,
        _stats: Option<&DataStatistics>,
    ) -> Result<Array2<f32>, CollaboratorError> {
        panic!("panicking model invoked");
    }
}

// ── Rewards ────────────────────────────────────────────────────────

/// `reward = obs[0]`; every done flag is `done`.
pub struct FirstObsReward {
    pub done: bool,
}

impl FirstObsReward {
    pub fn new() -> Self {
        Self { done: false }
    }

    /// Reports every sample as terminal (rollouts must ignore it).
    pub fn always_done() -> Self {
        Self { done: true }
    }
}

impl Default for FirstObsReward {
    fn default() -> Self {
        Self::new()
    }
}

impl RewardFn for FirstObsReward {
    fn reward(
        &self,
        obs: ArrayView2<'_, f32>,
        _acs: ArrayView2<'_, f32>,
    ) -> Result<RewardBatch, CollaboratorError> {
        Ok(RewardBatch {
            rewards: obs.column(0).to_owned(),
            dones: Array1::from_elem(obs.nrows(), self.done),
        })
    }
}

/// `reward = sum(obs) + sum(action)`.
pub struct ObsSumReward;

impl RewardFn for ObsSumReward {
    fn reward(
        &self,
        obs: ArrayView2<'_, f32>,
        acs: ArrayView2<'_, f32>,
    ) -> Result<RewardBatch, CollaboratorError> {
        Ok(RewardBatch::not_done(
            obs.sum_axis(Axis(1)) + acs.sum_axis(Axis(1)),
        ))
    }
}

/// The same reward for every sample.
pub struct ConstantReward(pub f32);

impl RewardFn for ConstantReward {
    fn reward(
        &self,
        obs: ArrayView2<'_, f32>,
        _acs: ArrayView2<'_, f32>,
    ) -> Result<RewardBatch, CollaboratorError> {
        Ok(RewardBatch::not_done(Array1::from_elem(obs.nrows(), self.0)))
    }
}

/// Returns `N + 1` rewards.
pub struct BadShapeReward;

impl RewardFn for BadShapeReward {
    fn reward(
        &self,
        obs: ArrayView2<'_, f32>,
        _acs: ArrayView2<'_, f32>,
    ) -> Result<RewardBatch, CollaboratorError> {
        Ok(RewardBatch::not_done(Array1::zeros(obs.nrows() + 1)))
    }
}

/// Returns `N` rewards but `N + 1` done flags.
pub struct BadDonesReward;

impl RewardFn for BadDonesReward {
    fn reward(
        &self,
        obs: ArrayView2<'_, f32>,
        _acs: ArrayView2<'_, f32>,
    ) -> Result<RewardBatch, CollaboratorError> {
        Ok(RewardBatch {
            rewards: Array1::zeros(obs.nrows()),
            dones: Array1::from_elem(obs.nrows() + 1, false),
        })
    }
}
