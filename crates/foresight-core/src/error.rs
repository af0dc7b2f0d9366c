//! Error types for Foresight planning.
//!
//! Two layers: [`CollaboratorError`] is what a dynamics model, reward
//! function, or critic reports about itself; [`PlanError`] is what the
//! planning components surface to their caller, wrapping collaborator
//! failures with the context they occurred in.

use std::error::Error;
use std::fmt;

use smallvec::SmallVec;

/// Array shape as reported in [`PlanError::ShapeMismatch`].
pub type Shape = SmallVec<[usize; 4]>;

/// Failure reported by a collaborator implementation.
///
/// Returned by [`DynamicsModel::predict`](crate::DynamicsModel::predict),
/// [`RewardFn::reward`](crate::RewardFn::reward) and
/// [`Critic::qa_values`](crate::Critic::qa_values).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The collaborator's computation failed.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The collaborator needs data statistics but was called without them.
    MissingStatistics,
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
            Self::MissingStatistics => write!(f, "data statistics are required but missing"),
        }
    }
}

impl Error for CollaboratorError {}

/// Errors from sampling, rollout, planning, and greedy action selection.
///
/// No planning component catches or retries any of these: every failure
/// aborts the current decision step and surfaces to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanError {
    /// A caller-supplied parameter is out of range.
    InvalidArgument {
        /// Description of the offending argument.
        reason: String,
    },
    /// A batched array does not have the shape its contract requires.
    ShapeMismatch {
        /// Which array was checked.
        context: &'static str,
        /// The shape required at this boundary.
        expected: Shape,
        /// The shape actually observed.
        actual: Shape,
    },
    /// A dynamics model that requires data statistics was invoked
    /// before any were injected.
    UninitializedStatistics,
    /// An ensemble member's `predict` failed.
    ModelFailed {
        /// Index of the member within the ensemble (0-based).
        member: usize,
        /// The member's reported name.
        name: String,
        /// The underlying collaborator error.
        reason: CollaboratorError,
    },
    /// The reward function failed.
    RewardFailed(CollaboratorError),
    /// The critic failed.
    CriticFailed(CollaboratorError),
}

impl PlanError {
    /// Build a [`PlanError::ShapeMismatch`] from two shape slices.
    pub fn shape_mismatch(context: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            context,
            expected: Shape::from_slice(expected),
            actual: Shape::from_slice(actual),
        }
    }

    /// Build a [`PlanError::InvalidArgument`].
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

/// Fail with [`PlanError::ShapeMismatch`] unless `actual == expected`.
pub fn ensure_shape(
    context: &'static str,
    expected: &[usize],
    actual: &[usize],
) -> Result<(), PlanError> {
    if expected == actual {
        Ok(())
    } else {
        Err(PlanError::shape_mismatch(context, expected, actual))
    }
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
            Self::ShapeMismatch {
                context,
                expected,
                actual,
            } => write!(
                f,
                "shape mismatch in {context}: expected {:?}, got {:?}",
                expected.as_slice(),
                actual.as_slice()
            ),
            Self::UninitializedStatistics => {
                write!(f, "dynamics model invoked before data statistics were set")
            }
            Self::ModelFailed {
                member,
                name,
                reason,
            } => write!(f, "ensemble member {member} ('{name}') failed: {reason}"),
            Self::RewardFailed(e) => write!(f, "reward function failed: {e}"),
            Self::CriticFailed(e) => write!(f, "critic failed: {e}"),
        }
    }
}

impl Error for PlanError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ModelFailed { reason, .. } => Some(reason),
            Self::RewardFailed(e) | Self::CriticFailed(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_shape_accepts_equal_shapes() {
        assert!(ensure_shape("obs", &[4, 3], &[4, 3]).is_ok());
    }

    #[test]
    fn ensure_shape_reports_both_shapes() {
        let err = ensure_shape("next_obs", &[8, 3], &[8, 2]).unwrap_err();
        match &err {
            PlanError::ShapeMismatch {
                context,
                expected,
                actual,
            } => {
                assert_eq!(*context, "next_obs");
                assert_eq!(expected.as_slice(), &[8, 3]);
                assert_eq!(actual.as_slice(), &[8, 2]);
            }
            other => panic!("expected ShapeMismatch, got {other:?}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("next_obs"));
        assert!(msg.contains("[8, 3]"));
        assert!(msg.contains("[8, 2]"));
    }

    #[test]
    fn model_failed_chains_source() {
        let err = PlanError::ModelFailed {
            member: 2,
            name: "ff".into(),
            reason: CollaboratorError::ExecutionFailed {
                reason: "nan weights".into(),
            },
        };
        let source = err.source().expect("source");
        assert!(source.to_string().contains("nan weights"));
        assert!(err.to_string().contains("member 2"));
    }

    #[test]
    fn plain_variants_have_no_source() {
        assert!(PlanError::UninitializedStatistics.source().is_none());
        assert!(PlanError::invalid_argument("horizon").source().is_none());
    }
}
