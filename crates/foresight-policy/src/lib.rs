//! Value-based action selection for Foresight.
//!
//! [`GreedyPolicy`] picks, for each observation, the discrete action with
//! the highest value under a [`Critic`](foresight_core::Critic).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod greedy;

pub use greedy::{GreedyAction, GreedyPolicy, GreedyPolicyBuilder, DEFAULT_UNBATCHED_RANK};
