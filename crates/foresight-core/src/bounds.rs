//! Box constraint on the action space.

use ndarray::{Array1, ArrayView1};

use crate::error::PlanError;

/// Per-dimension action bounds `[low, high)`.
///
/// Validated at construction: both vectors have the same non-zero length,
/// every entry is finite, and `low[d] < high[d]` for every dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionBounds {
    low: Array1<f32>,
    high: Array1<f32>,
}

impl ActionBounds {
    /// Create bounds from `low` and `high` vectors.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidArgument`] if the vectors are empty,
    /// differ in length, contain non-finite values, or if any
    /// `low[d] >= high[d]`.
    pub fn new(low: Vec<f32>, high: Vec<f32>) -> Result<Self, PlanError> {
        Self::from_arrays(Array1::from(low), Array1::from(high))
    }

    /// Create bounds from owned arrays. Same validation as [`new`](Self::new).
    pub fn from_arrays(low: Array1<f32>, high: Array1<f32>) -> Result<Self, PlanError> {
        if low.len() != high.len() {
            return Err(PlanError::invalid_argument(format!(
                "action bounds dimensionality mismatch: low has {}, high has {}",
                low.len(),
                high.len()
            )));
        }
        if low.is_empty() {
            return Err(PlanError::invalid_argument(
                "action bounds must have at least one dimension",
            ));
        }
        for (d, (&lo, &hi)) in low.iter().zip(high.iter()).enumerate() {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(PlanError::invalid_argument(format!(
                    "action bound {d} is not finite: [{lo}, {hi})"
                )));
            }
            if lo >= hi {
                return Err(PlanError::invalid_argument(format!(
                    "action bound {d} is empty: low {lo} >= high {hi}"
                )));
            }
        }
        Ok(Self { low, high })
    }

    /// Action dimensionality `D_act`.
    pub fn dim(&self) -> usize {
        self.low.len()
    }

    /// Lower bounds (inclusive).
    pub fn low(&self) -> ArrayView1<'_, f32> {
        self.low.view()
    }

    /// Upper bounds (exclusive for sampling).
    pub fn high(&self) -> ArrayView1<'_, f32> {
        self.high.view()
    }

    /// Whether `action` has dimension `D_act` and lies in `[low, high)`.
    pub fn contains(&self, action: ArrayView1<'_, f32>) -> bool {
        action.len() == self.dim()
            && action
                .iter()
                .zip(self.low.iter().zip(self.high.iter()))
                .all(|(&a, (&lo, &hi))| a >= lo && a < hi)
    }
}
