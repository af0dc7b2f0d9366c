//! Test utilities and stub collaborators for Foresight development.
//!
//! Provides deterministic stand-ins for the collaborator traits
//! ([`SequenceSampler`], [`Critic`]) plus the dynamics-model and reward
//! stubs in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use foresight_core::{
    CandidateBatch, CollaboratorError, Critic, DataStatistics, PlanError, SequenceSampler,
};
use ndarray::{Array2, Array3, ArrayViewD, Axis, Slice};

/// Identity statistics: normalization leaves values unchanged (up to eps).
pub fn identity_stats(obs_dim: usize, ac_dim: usize) -> Arc<DataStatistics> {
    Arc::new(DataStatistics::identity(obs_dim, ac_dim))
}

/// Wrap a raw `(N, H, D_act)` array, panicking on an empty axis.
pub fn candidates(actions: Array3<f32>) -> CandidateBatch {
    CandidateBatch::new(actions).expect("test candidate batch must be non-empty")
}

/// Sampler that replays a fixed candidate batch.
///
/// A request for `(n, h)` returns the leading `n` sequences truncated to
/// `h` steps. Requests larger than the stored batch fail.
pub struct FixedSampler {
    batch: Array3<f32>,
    calls: Arc<AtomicUsize>,
}

impl FixedSampler {
    pub fn new(batch: Array3<f32>) -> Self {
        Self {
            batch,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle to the `sample` call counter.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Number of `sample` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SequenceSampler for FixedSampler {
    fn action_dim(&self) -> usize {
        self.batch.shape()[2]
    }

    fn sample(
        &mut self,
        num_sequences: usize,
        horizon: usize,
    ) -> Result<CandidateBatch, PlanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let shape = self.batch.shape();
        if num_sequences > shape[0] || horizon > shape[1] {
            return Err(PlanError::invalid_argument(format!(
                "fixed batch {shape:?} cannot serve ({num_sequences}, {horizon})"
            )));
        }
        let leading = self
            .batch
            .slice_axis(Axis(0), Slice::from(..num_sequences));
        CandidateBatch::new(leading.slice_axis(Axis(1), Slice::from(..horizon)).to_owned())
    }
}

/// Critic returning a fixed Q table and recording the input shape it saw.
pub struct FixedCritic {
    values: Array2<f32>,
    last_shape: Mutex<Option<Vec<usize>>>,
}

impl FixedCritic {
    pub fn new(values: Array2<f32>) -> Self {
        Self {
            values,
            last_shape: Mutex::new(None),
        }
    }

    /// Shape of the most recent `qa_values` input.
    pub fn last_shape(&self) -> Option<Vec<usize>> {
        self.last_shape
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Critic for FixedCritic {
    fn qa_values(&self, obs: ArrayViewD<'_, f32>) -> Result<Array2<f32>, CollaboratorError> {
        let mut last = self
            .last_shape
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = Some(obs.shape().to_vec());
        Ok(self.values.clone())
    }
}

/// Critic that fails every call.
pub struct FailingCritic;

impl Critic for FailingCritic {
    fn qa_values(&self, _obs: ArrayViewD<'_, f32>) -> Result<Array2<f32>, CollaboratorError> {
        Err(CollaboratorError::ExecutionFailed {
            reason: "critic offline".into(),
        })
    }
}
