use super::Reducer;
use crate::node::NodePatch;
use crate::state::WorkflowState;

/// Appends patch log entries to the run narration.
pub struct AppendLog;

impl Reducer for AppendLog {
    fn apply(&self, state: &mut WorkflowState, patch: &NodePatch) {
        if let Some(entries) = &patch.log {
            state.log.get_mut().extend(entries.iter().cloned());
        }
    }
}
