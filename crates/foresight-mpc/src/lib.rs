//! Ensemble model-predictive control for Foresight.
//!
//! Provides the candidate [`sampler`], the batched [`rollout`] evaluator,
//! and the [`MpcPlanner`] that composes them over an ensemble of dynamics
//! models. A fixed-weight [`LinearDeltaModel`] is included as a concrete
//! dynamics model for callers that fit weights elsewhere.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod metrics;
pub mod model;
pub mod planner;
pub mod rollout;
pub mod sampler;

pub use foresight_core::SequenceSampler;

pub use config::{ConfigError, EnsembleExecution, PlannerConfig};
pub use metrics::PlanMetrics;
pub use model::LinearDeltaModel;
pub use planner::MpcPlanner;
pub use rollout::{Rollout, RolloutEvaluator};
pub use sampler::UniformSampler;
