use super::Reducer;
use crate::node::NodePatch;
use crate::state::WorkflowState;

/// Per-key insert of input fragments.
///
/// The parallel producers each write a disjoint named key, so key order does
/// not matter; within one key the last non-null write wins. Null values are
/// skipped so a degraded producer cannot blank out a fragment another run
/// already collected.
pub struct MergeInputs;

impl Reducer for MergeInputs {
    fn apply(&self, state: &mut WorkflowState, patch: &NodePatch) {
        if let Some(fragments) = &patch.inputs {
            // Sorted keys keep the merged map deterministic across runs.
            let mut pairs: Vec<_> = fragments.iter().collect();
            pairs.sort_by(|(left, _), (right, _)| left.cmp(right));
            for (name, value) in pairs {
                if value.is_null() {
                    continue;
                }
                state.inputs.get_mut().insert(name.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodePatch;
    use crate::utils::collections::new_input_map;
    use serde_json::json;

    #[test]
    fn test_null_values_do_not_overwrite() {
        let mut state = WorkflowState::default();
        state.add_input("interviews", json!("transcript"));

        let mut fragments = new_input_map();
        fragments.insert("interviews".into(), json!(null));
        fragments.insert("workshops".into(), json!(["notes"]));
        MergeInputs.apply(&mut state, &NodePatch::new().with_inputs(fragments));

        let snap = state.snapshot();
        assert_eq!(snap.inputs.get("interviews"), Some(&json!("transcript")));
        assert_eq!(snap.inputs.get("workshops"), Some(&json!(["notes"])));
    }
}
