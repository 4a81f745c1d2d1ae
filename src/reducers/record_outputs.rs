use super::Reducer;
use crate::channels::errors::{ErrorEvent, FaultDetail};
use crate::node::NodePatch;
use crate::state::WorkflowState;

/// Write-once insert of finalized phase results.
///
/// A phase output is set exactly once per run. A second write for the same
/// key keeps the first value and records an error event instead of aborting
/// the session.
pub struct RecordOutputs;

impl Reducer for RecordOutputs {
    fn apply(&self, state: &mut WorkflowState, patch: &NodePatch) {
        if let Some(outputs) = &patch.outputs {
            let mut pairs: Vec<_> = outputs.iter().collect();
            pairs.sort_by(|(left, _), (right, _)| left.cmp(right));
            for (phase, value) in pairs {
                if state.outputs.get().contains_key(phase) {
                    tracing::warn!(phase = %phase, "phase output already recorded; keeping first value");
                    state.errors.get_mut().push(
                        ErrorEvent::app(FaultDetail::msg(format!(
                            "phase output for '{phase}' written twice; first value kept"
                        )))
                        .with_tag("write-once"),
                    );
                    continue;
                }
                state.outputs.get_mut().insert(phase.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::collections::new_input_map;
    use serde_json::json;

    #[test]
    fn test_second_write_keeps_first_value() {
        let mut state = WorkflowState::default();

        let mut first = new_input_map();
        first.insert("needs".into(), json!({"items": 5}));
        RecordOutputs.apply(&mut state, &NodePatch::new().with_outputs(first));

        let mut second = new_input_map();
        second.insert("needs".into(), json!({"items": 9}));
        RecordOutputs.apply(&mut state, &NodePatch::new().with_outputs(second));

        let snap = state.snapshot();
        assert_eq!(snap.outputs.get("needs"), Some(&json!({"items": 5})));
        assert_eq!(snap.errors.len(), 1);
    }
}
