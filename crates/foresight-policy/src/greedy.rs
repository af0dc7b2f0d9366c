//! Greedy arg-max policy over a critic's action values.
//!
//! An input of rank at most `unbatched_rank` is one observation (a vector,
//! or an image up to `(C, H, W)` with the default of 3); it is promoted to a
//! batch of one before the critic sees it and the result is a single
//! action index. Higher-rank input is a batch and yields one index per row.
//!
//! # Construction
//!
//! ```
//! use std::sync::Arc;
//!
//! use foresight_core::{CollaboratorError, Critic};
//! use foresight_policy::{GreedyAction, GreedyPolicy};
//! use ndarray::{array, Array2, ArrayViewD};
//!
//! struct Table;
//!
//! impl Critic for Table {
//!     fn qa_values(&self, _obs: ArrayViewD<'_, f32>) -> Result<Array2<f32>, CollaboratorError> {
//!         Ok(array![[0.1, 0.9, 0.3]])
//!     }
//! }
//!
//! let policy = GreedyPolicy::builder()
//!     .critic(Arc::new(Table))
//!     .num_actions(3)
//!     .build()
//!     .unwrap();
//! let action = policy.act(array![0.0f32, 1.0].into_dyn().view()).unwrap();
//! assert_eq!(action, GreedyAction::Single(1));
//! ```

use std::fmt;
use std::sync::Arc;

use foresight_core::{ensure_shape, first_argmax, Critic, PlanError};
use ndarray::{Array1, ArrayViewD, Axis};
use tracing::{debug, trace};

/// Inputs with at most this many axes are treated as one observation.
pub const DEFAULT_UNBATCHED_RANK: usize = 3;

/// Result of [`GreedyPolicy::act`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GreedyAction {
    /// The input was a single observation.
    Single(usize),
    /// One action index per row of a batched input.
    Batch(Array1<usize>),
}

impl GreedyAction {
    /// The index, if this is a single-observation result.
    pub fn single(&self) -> Option<usize> {
        match self {
            Self::Single(a) => Some(*a),
            Self::Batch(_) => None,
        }
    }

    /// Action indices as a flat vector (length 1 for a single result).
    pub fn to_vec(&self) -> Vec<usize> {
        match self {
            Self::Single(a) => vec![*a],
            Self::Batch(a) => a.to_vec(),
        }
    }
}

/// Chooses the highest-valued discrete action for each observation.
pub struct GreedyPolicy {
    critic: Arc<dyn Critic>,
    num_actions: usize,
    unbatched_rank: usize,
}

impl fmt::Debug for GreedyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreedyPolicy")
            .field("num_actions", &self.num_actions)
            .field("unbatched_rank", &self.unbatched_rank)
            .finish_non_exhaustive()
    }
}

/// Builder for [`GreedyPolicy`].
///
/// Required: `critic`, `num_actions`.
/// Default: `unbatched_rank = 3`.
pub struct GreedyPolicyBuilder {
    critic: Option<Arc<dyn Critic>>,
    num_actions: Option<usize>,
    unbatched_rank: usize,
}

impl GreedyPolicy {
    /// Create a new builder.
    pub fn builder() -> GreedyPolicyBuilder {
        GreedyPolicyBuilder {
            critic: None,
            num_actions: None,
            unbatched_rank: DEFAULT_UNBATCHED_RANK,
        }
    }

    /// Size of the discrete action space.
    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Highest input rank treated as a single observation.
    pub fn unbatched_rank(&self) -> usize {
        self.unbatched_rank
    }

    /// The critic currently queried by [`act`](Self::act).
    pub fn critic(&self) -> &Arc<dyn Critic> {
        &self.critic
    }

    /// Replace the critic used by subsequent calls.
    pub fn set_critic(&mut self, critic: Arc<dyn Critic>) {
        debug!(num_actions = self.num_actions, "critic replaced");
        self.critic = critic;
    }

    /// Greedy action(s) for `obs`.
    ///
    /// # Errors
    ///
    /// - [`PlanError::CriticFailed`] if the critic reports a failure.
    /// - [`PlanError::ShapeMismatch`] unless the critic returns exactly one
    ///   row per observation and `num_actions` columns.
    pub fn act(&self, obs: ArrayViewD<'_, f32>) -> Result<GreedyAction, PlanError> {
        let single = obs.ndim() <= self.unbatched_rank;
        let batch = if single {
            obs.insert_axis(Axis(0))
        } else {
            obs
        };
        let rows = batch.len_of(Axis(0));

        let values = self
            .critic
            .qa_values(batch)
            .map_err(PlanError::CriticFailed)?;
        ensure_shape("action values", &[rows, self.num_actions], values.shape())?;

        let actions = values
            .rows()
            .into_iter()
            .map(|row| first_argmax(row.iter().copied()))
            .collect::<Option<Array1<usize>>>()
            .ok_or_else(|| PlanError::invalid_argument("action-value row is empty"))?;
        trace!(rows, single, "greedy actions selected");

        if single {
            Ok(GreedyAction::Single(actions[0]))
        } else {
            Ok(GreedyAction::Batch(actions))
        }
    }
}

impl GreedyPolicyBuilder {
    /// Set the critic. Required.
    pub fn critic(mut self, critic: Arc<dyn Critic>) -> Self {
        self.critic = Some(critic);
        self
    }

    /// Set the number of discrete actions. Required; must be >= 1.
    pub fn num_actions(mut self, n: usize) -> Self {
        self.num_actions = Some(n);
        self
    }

    /// Set the highest input rank treated as a single observation.
    /// Default: [`DEFAULT_UNBATCHED_RANK`].
    pub fn unbatched_rank(mut self, rank: usize) -> Self {
        self.unbatched_rank = rank;
        self
    }

    /// Build the policy.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidArgument`] if the critic or
    /// `num_actions` is missing, or `num_actions` is zero.
    pub fn build(self) -> Result<GreedyPolicy, PlanError> {
        let critic = self
            .critic
            .ok_or_else(|| PlanError::invalid_argument("critic is required"))?;
        let num_actions = self
            .num_actions
            .ok_or_else(|| PlanError::invalid_argument("num_actions is required"))?;
        if num_actions == 0 {
            return Err(PlanError::invalid_argument("num_actions must be at least 1"));
        }
        Ok(GreedyPolicy {
            critic,
            num_actions,
            unbatched_rank: self.unbatched_rank,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foresight_core::CollaboratorError;
    use foresight_test_utils::{FailingCritic, FixedCritic};
    use ndarray::{array, Array2, ArrayD, IxDyn};

    fn policy(values: Array2<f32>) -> (GreedyPolicy, Arc<FixedCritic>) {
        let critic = Arc::new(FixedCritic::new(values.clone()));
        let policy = GreedyPolicy::builder()
            .critic(critic.clone())
            .num_actions(values.ncols())
            .build()
            .unwrap();
        (policy, critic)
    }

    #[test]
    fn builder_requires_critic() {
        let err = GreedyPolicy::builder().num_actions(2).build().unwrap_err();
        assert!(err.to_string().contains("critic"));
    }

    #[test]
    fn builder_rejects_zero_actions() {
        let err = GreedyPolicy::builder()
            .critic(Arc::new(FailingCritic))
            .num_actions(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("num_actions"));
    }

    #[test]
    fn single_vector_is_promoted() {
        let (p, critic) = policy(array![[0.1, 0.9, 0.3]]);
        let obs = ArrayD::<f32>::zeros(IxDyn(&[4]));
        assert_eq!(p.act(obs.view()).unwrap(), GreedyAction::Single(1));
        assert_eq!(critic.last_shape(), Some(vec![1, 4]));
    }

    #[test]
    fn single_image_is_promoted() {
        let (p, critic) = policy(array![[2.0, -1.0]]);
        let obs = ArrayD::<f32>::zeros(IxDyn(&[3, 8, 8]));
        assert_eq!(p.act(obs.view()).unwrap(), GreedyAction::Single(0));
        assert_eq!(critic.last_shape(), Some(vec![1, 3, 8, 8]));
    }

    #[test]
    fn batch_of_vectors_uses_custom_rank() {
        let critic = Arc::new(FixedCritic::new(array![[0.0, 1.0], [5.0, 4.0]]));
        let p = GreedyPolicy::builder()
            .critic(critic)
            .num_actions(2)
            .unbatched_rank(1)
            .build()
            .unwrap();
        let obs = ArrayD::<f32>::zeros(IxDyn(&[2, 4]));
        assert_eq!(
            p.act(obs.view()).unwrap(),
            GreedyAction::Batch(array![1usize, 0])
        );
    }

    #[test]
    fn batched_images_select_per_row() {
        let (p, critic) = policy(array![[0.1, 0.9, 0.3], [0.7, 0.2, 0.7], [-1.0, -2.0, -0.5]]);
        let obs = ArrayD::<f32>::zeros(IxDyn(&[3, 1, 2, 2]));
        assert_eq!(
            p.act(obs.view()).unwrap(),
            GreedyAction::Batch(array![1usize, 0, 2])
        );
        assert_eq!(critic.last_shape(), Some(vec![3, 1, 2, 2]));
    }

    #[test]
    fn ties_pick_lowest_index() {
        let (p, _) = policy(array![[3.0, 3.0, 3.0]]);
        let obs = ArrayD::<f32>::zeros(IxDyn(&[2]));
        assert_eq!(p.act(obs.view()).unwrap().single(), Some(0));
    }

    #[test]
    fn fewer_columns_than_actions_is_shape_mismatch() {
        let critic = Arc::new(FixedCritic::new(array![[1.0, 2.0]]));
        let p = GreedyPolicy::builder()
            .critic(critic)
            .num_actions(3)
            .build()
            .unwrap();
        let err = p.act(ArrayD::<f32>::zeros(IxDyn(&[4])).view()).unwrap_err();
        assert!(matches!(
            err,
            PlanError::ShapeMismatch {
                context: "action values",
                ..
            }
        ));
    }

    #[test]
    fn wrong_row_count_is_shape_mismatch() {
        let (p, _) = policy(array![[1.0, 2.0], [3.0, 4.0]]);
        let err = p.act(ArrayD::<f32>::zeros(IxDyn(&[4])).view()).unwrap_err();
        assert!(matches!(err, PlanError::ShapeMismatch { .. }));
    }

    #[test]
    fn critic_failure_is_wrapped() {
        let p = GreedyPolicy::builder()
            .critic(Arc::new(FailingCritic))
            .num_actions(2)
            .build()
            .unwrap();
        let err = p.act(ArrayD::<f32>::zeros(IxDyn(&[4])).view()).unwrap_err();
        assert!(matches!(
            err,
            PlanError::CriticFailed(CollaboratorError::ExecutionFailed { .. })
        ));
    }

    #[test]
    fn set_critic_takes_effect_next_call() {
        let (mut p, _) = policy(array![[1.0, 0.0]]);
        let obs = ArrayD::<f32>::zeros(IxDyn(&[4]));
        assert_eq!(p.act(obs.view()).unwrap(), GreedyAction::Single(0));
        p.set_critic(Arc::new(FixedCritic::new(array![[0.0, 1.0]])));
        assert_eq!(p.act(obs.view()).unwrap(), GreedyAction::Single(1));
    }
}
