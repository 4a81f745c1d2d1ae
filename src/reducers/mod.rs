//! Per-channel merge disciplines.
//!
//! Every state channel that can be written by concurrently-scheduled nodes
//! has exactly one registered merge rule:
//!
//! - log, errors: append
//! - inputs: per-key insert (producers write disjoint keys)
//! - review: field-wise fold, with set-union-by-identity-key accumulators
//! - outputs: write-once per phase key
//!
//! [`ReducerRegistry`] wires these up; graph compilation refuses graphs whose
//! patches could touch a channel with no reducer.

mod append_errors;
mod append_log;
mod fold_review;
mod merge_inputs;
mod record_outputs;
mod registry;

pub use append_errors::AppendErrors;
pub use append_log::AppendLog;
pub use fold_review::{FoldReview, union_by_key};
pub use merge_inputs::MergeInputs;
pub use record_outputs::RecordOutputs;
pub use registry::ReducerRegistry;

use crate::node::NodePatch;
use crate::state::WorkflowState;
use crate::types::ChannelType;
use std::fmt;

/// A reducer folds one patch into the state for its channel.
///
/// Reducers never bump channel versions; the barrier does that once after
/// all patches of a superstep have been applied.
pub trait Reducer: Send + Sync {
    fn apply(&self, state: &mut WorkflowState, patch: &NodePatch);
}

#[derive(Debug)]
pub enum ReducerError {
    /// A patch addressed a channel with no registered reducer.
    UnknownChannel(ChannelType),
}

impl fmt::Display for ReducerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReducerError::UnknownChannel(channel) => {
                write!(f, "no reducer registered for channel: {channel}")
            }
        }
    }
}

impl std::error::Error for ReducerError {}
