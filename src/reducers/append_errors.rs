use super::Reducer;
use crate::node::NodePatch;
use crate::state::WorkflowState;

/// Appends patch error events to the errors channel.
pub struct AppendErrors;

impl Reducer for AppendErrors {
    fn apply(&self, state: &mut WorkflowState, patch: &NodePatch) {
        if let Some(events) = &patch.errors {
            state.errors.get_mut().extend(events.iter().cloned());
        }
    }
}
