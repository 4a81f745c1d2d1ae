use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::{
    node::NodePatch,
    reducers::{
        AppendErrors, AppendLog, FoldReview, MergeInputs, RecordOutputs, Reducer, ReducerError,
    },
    state::WorkflowState,
    types::ChannelType,
};

/// Maps each channel to its registered merge discipline.
///
/// The default registry wires every channel; graph compilation checks
/// [`covers`](Self::covers) so a custom registry missing a channel fails at
/// build time, not mid-run.
#[derive(Clone)]
pub struct ReducerRegistry {
    reducer_map: FxHashMap<ChannelType, Vec<Arc<dyn Reducer>>>,
}

/// Whether the patch actually carries data for the channel, so registered
/// reducers are only invoked when there is something to merge.
fn channel_guard(channel: &ChannelType, patch: &NodePatch) -> bool {
    match channel {
        ChannelType::Log => patch.log.as_ref().is_some_and(|v| !v.is_empty()),
        ChannelType::Inputs => patch.inputs.as_ref().is_some_and(|m| !m.is_empty()),
        ChannelType::Review => patch.review.is_some(),
        ChannelType::Outputs => patch.outputs.as_ref().is_some_and(|m| !m.is_empty()),
        ChannelType::Errors => patch.errors.as_ref().is_some_and(|v| !v.is_empty()),
    }
}

/// Which channels a patch addresses, guard-filtered.
pub(crate) fn touched_channels(patch: &NodePatch) -> Vec<ChannelType> {
    ChannelType::ALL
        .iter()
        .filter(|channel| channel_guard(channel, patch))
        .cloned()
        .collect()
}

impl Default for ReducerRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry
            .register(ChannelType::Log, Arc::new(AppendLog))
            .register(ChannelType::Inputs, Arc::new(MergeInputs))
            .register(ChannelType::Review, Arc::new(FoldReview))
            .register(ChannelType::Outputs, Arc::new(RecordOutputs))
            .register(ChannelType::Errors, Arc::new(AppendErrors));
        registry
    }
}

impl ReducerRegistry {
    /// An empty registry; useful only with explicit registration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reducer_map: FxHashMap::default(),
        }
    }

    /// Registers a reducer for a channel. Multiple reducers per channel apply
    /// in registration order.
    pub fn register(&mut self, channel: ChannelType, reducer: Arc<dyn Reducer>) -> &mut Self {
        self.reducer_map.entry(channel).or_default().push(reducer);
        self
    }

    /// Builder-style registration.
    #[must_use]
    pub fn with_reducer(mut self, channel: ChannelType, reducer: Arc<dyn Reducer>) -> Self {
        self.register(channel, reducer);
        self
    }

    /// True when the channel has at least one registered reducer.
    #[must_use]
    pub fn covers(&self, channel: &ChannelType) -> bool {
        self.reducer_map
            .get(channel)
            .is_some_and(|reducers| !reducers.is_empty())
    }

    /// Applies one channel's reducers to the state for one patch.
    pub fn try_update(
        &self,
        channel: ChannelType,
        state: &mut WorkflowState,
        patch: &NodePatch,
    ) -> Result<(), ReducerError> {
        if !channel_guard(&channel, patch) {
            return Ok(());
        }
        match self.reducer_map.get(&channel) {
            Some(reducers) => {
                for reducer in reducers {
                    reducer.apply(state, patch);
                }
                Ok(())
            }
            None => Err(ReducerError::UnknownChannel(channel)),
        }
    }

    /// Applies every touched channel of a patch to the state.
    pub fn apply_patch(
        &self,
        state: &mut WorkflowState,
        patch: &NodePatch,
    ) -> Result<(), ReducerError> {
        for channel in touched_channels(patch) {
            self.try_update(channel, state, patch)?;
        }
        Ok(())
    }
}
