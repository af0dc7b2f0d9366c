//! Candidate action sequences.

use ndarray::{Array3, ArrayView1, ArrayView2, Axis};

use crate::error::PlanError;

/// A batch of `N` candidate action sequences, each `H` steps long.
///
/// Backed by a `(N, H, D_act)` array with every axis non-empty. Created
/// fresh for each planning call and discarded after selection.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateBatch {
    actions: Array3<f32>,
}

impl CandidateBatch {
    /// Wrap a `(N, H, D_act)` array.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidArgument`] if any axis has length zero.
    pub fn new(actions: Array3<f32>) -> Result<Self, PlanError> {
        if actions.shape().contains(&0) {
            return Err(PlanError::invalid_argument(format!(
                "candidate batch axes must be non-empty, got shape {:?}",
                actions.shape()
            )));
        }
        Ok(Self { actions })
    }

    /// Number of candidate sequences `N`.
    pub fn num_sequences(&self) -> usize {
        self.actions.len_of(Axis(0))
    }

    /// Planning horizon `H`.
    pub fn horizon(&self) -> usize {
        self.actions.len_of(Axis(1))
    }

    /// Action dimensionality `D_act`.
    pub fn action_dim(&self) -> usize {
        self.actions.len_of(Axis(2))
    }

    /// `[N, H, D_act]`.
    pub fn shape(&self) -> [usize; 3] {
        [self.num_sequences(), self.horizon(), self.action_dim()]
    }

    /// Actions of every candidate at timestep `t`, shape `(N, D_act)`.
    ///
    /// # Panics
    ///
    /// Panics if `t >= H`.
    pub fn step(&self, t: usize) -> ArrayView2<'_, f32> {
        self.actions.index_axis(Axis(1), t)
    }

    /// The full sequence of candidate `n`, shape `(H, D_act)`.
    ///
    /// # Panics
    ///
    /// Panics if `n >= N`.
    pub fn sequence(&self, n: usize) -> ArrayView2<'_, f32> {
        self.actions.index_axis(Axis(0), n)
    }

    /// First action of candidate `n`.
    ///
    /// # Panics
    ///
    /// Panics if `n >= N`.
    pub fn first_action(&self, n: usize) -> ArrayView1<'_, f32> {
        self.sequence(n).index_axis_move(Axis(0), 0)
    }

    /// Borrow the underlying array.
    pub fn as_array(&self) -> &Array3<f32> {
        &self.actions
    }

    /// Consume the batch, returning the underlying array.
    pub fn into_array(self) -> Array3<f32> {
        self.actions
    }
}
