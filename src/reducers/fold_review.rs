use rustc_hash::FxHashSet;

use super::Reducer;
use crate::item::Item;
use crate::node::{NodePatch, PendingUpdate};
use crate::state::WorkflowState;

/// Folds a [`ReviewPatch`](crate::node::ReviewPatch) into the review cycle,
/// field by field.
///
/// Order matters: a phase reset applies before any other field so a finalize
/// stage can reset the cycle and seed the next phase in one patch. Accumulator
/// merges are set-unions keyed by item identity: the first entry for a key
/// wins, so resubmitting the same item (any casing, any detail drift) is
/// idempotent.
pub struct FoldReview;

impl Reducer for FoldReview {
    fn apply(&self, state: &mut WorkflowState, patch: &NodePatch) {
        let Some(review) = &patch.review else {
            return;
        };
        let cycle = state.review.get_mut();

        if let Some(start) = &review.begin_phase {
            cycle.begin_phase(start);
        }
        if let Some(proposed) = &review.proposed {
            cycle.proposed = proposed.clone();
        }
        if let Some(accepted) = &review.accepted {
            union_by_key(&mut cycle.accepted, accepted);
        }
        if let Some(rejected) = &review.rejected {
            union_by_key(&mut cycle.rejected, rejected);
        }
        if let Some(feedback) = &review.feedback {
            cycle.feedback = feedback.clone();
        }
        if let Some(iteration) = review.iteration {
            cycle.iteration = cycle.iteration.max(iteration);
        }
        match &review.pending {
            Some(PendingUpdate::Set(submission)) => cycle.pending = Some(submission.clone()),
            Some(PendingUpdate::Clear) => cycle.pending = None,
            None => {}
        }
        if let Some(exhausted) = review.exhausted {
            cycle.exhausted = exhausted;
        }
    }
}

/// Set-union of items keyed by identity; existing entries win.
pub fn union_by_key(into: &mut Vec<Item>, incoming: &[Item]) {
    let mut seen: FxHashSet<String> = into.iter().map(|item| item.key.clone()).collect();
    for item in incoming {
        if seen.insert(item.key.clone()) {
            into.push(item.clone());
        }
    }
}
