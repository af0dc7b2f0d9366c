//! Core types and traits for Foresight planning.
//!
//! This is the leaf crate of the workspace. It defines the batched data
//! model (action bounds, candidate batches, normalisation statistics), the
//! error taxonomy, and the collaborator traits that planning code consumes:
//! dynamics models, reward functions, critics, and candidate samplers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod batch;
pub mod bounds;
pub mod error;
pub mod select;
pub mod stats;
pub mod traits;

pub use batch::CandidateBatch;
pub use bounds::ActionBounds;
pub use error::{ensure_shape, CollaboratorError, PlanError, Shape};
pub use select::first_argmax;
pub use stats::{DataStatistics, Normalizer};
pub use traits::{Critic, DynamicsModel, RewardBatch, RewardFn, SequenceSampler};
