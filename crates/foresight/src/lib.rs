//! Foresight: action selection for model-based reinforcement learning.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Foresight sub-crates. For most users, adding `foresight` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use foresight::prelude::*;
//! use ndarray::{array, Array1, ArrayView2};
//!
//! // Reward: stay close to the origin.
//! struct Stay;
//! impl RewardFn for Stay {
//!     fn reward(
//!         &self,
//!         obs: ArrayView2<'_, f32>,
//!         _acs: ArrayView2<'_, f32>,
//!     ) -> Result<RewardBatch, CollaboratorError> {
//!         let rewards: Array1<f32> = obs.rows().into_iter().map(|r| -r.dot(&r)).collect();
//!         Ok(RewardBatch::not_done(rewards))
//!     }
//! }
//!
//! let config = PlannerConfig {
//!     num_sequences: 64,
//!     horizon: 5,
//!     seed: Some(3),
//!     ..PlannerConfig::new(2)
//! };
//! let bounds = ActionBounds::new(vec![-1.0], vec![1.0]).unwrap();
//! let ensemble: Vec<Box<dyn DynamicsModel>> = vec![
//!     Box::new(LinearDeltaModel::zeros("a", 2, 1).unwrap()),
//!     Box::new(LinearDeltaModel::zeros("b", 2, 1).unwrap()),
//! ];
//! let mut planner = MpcPlanner::new(config, bounds.clone(), ensemble, Stay).unwrap();
//!
//! // Before statistics are injected the planner acts uniformly at random.
//! let action = planner.plan(array![0.5, -0.5].view()).unwrap();
//! assert_eq!(action.shape(), &[1, 1]);
//!
//! planner
//!     .set_data_statistics(Arc::new(DataStatistics::identity(2, 1)))
//!     .unwrap();
//! let action = planner.plan(array![0.5, -0.5].view()).unwrap();
//! assert!(bounds.contains(action.row(0)));
//! assert!(!planner.last_metrics().unwrap().cold_start);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `foresight-core` | Bounds, candidate batches, statistics, errors, collaborator traits |
//! | [`mpc`] | `foresight-mpc` | Sampler, rollout evaluator, MPC planner, config, metrics |
//! | [`policy`] | `foresight-policy` | Greedy value policy |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core data model, errors, and collaborator traits (`foresight-core`).
///
/// The extension points are [`types::DynamicsModel`], [`types::RewardFn`],
/// [`types::Critic`] and [`types::SequenceSampler`].
pub use foresight_core as types;

/// Ensemble model-predictive control (`foresight-mpc`).
///
/// [`mpc::MpcPlanner`] composes a [`mpc::UniformSampler`] and a
/// [`mpc::RolloutEvaluator`] over an ensemble of dynamics models.
pub use foresight_mpc as mpc;

/// Value-based action selection (`foresight-policy`).
pub use foresight_policy as policy;

/// Common imports for typical Foresight usage.
///
/// ```rust
/// use foresight::prelude::*;
/// ```
pub mod prelude {
    // Data model and traits
    pub use foresight_core::{
        ActionBounds, CandidateBatch, Critic, DataStatistics, DynamicsModel, Normalizer,
        RewardBatch, RewardFn, SequenceSampler,
    };

    // Errors
    pub use foresight_core::{CollaboratorError, PlanError};
    pub use foresight_mpc::ConfigError;

    // Planning
    pub use foresight_mpc::{
        EnsembleExecution, LinearDeltaModel, MpcPlanner, PlanMetrics, PlannerConfig,
        UniformSampler,
    };

    // Policy
    pub use foresight_policy::{GreedyAction, GreedyPolicy};
}
