//! Conditional routing: predicates plus static label tables.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::state::StateSnapshot;
use crate::types::NodeKind;

/// Routing predicate: inspects the post-barrier snapshot and names one label
/// from the router's fixed label set.
pub type RoutePredicate = Arc<dyn Fn(&StateSnapshot) -> String + Send + Sync + 'static>;

/// A conditional edge with a declared label → target table.
///
/// The table is part of the graph definition, which is what makes "predicate
/// returns a label with no matching target" a construction-time error rather
/// than a runtime surprise.
#[derive(Clone)]
pub struct Router {
    from: NodeKind,
    predicate: RoutePredicate,
    targets: FxHashMap<String, NodeKind>,
}

impl Router {
    /// Creates a router from a stage with its label table.
    pub fn new<L, T>(from: NodeKind, predicate: RoutePredicate, targets: T) -> Self
    where
        L: Into<String>,
        T: IntoIterator<Item = (L, NodeKind)>,
    {
        Self {
            from,
            predicate,
            targets: targets
                .into_iter()
                .map(|(label, target)| (label.into(), target))
                .collect(),
        }
    }

    /// The stage this router fires after.
    #[must_use]
    pub fn from(&self) -> &NodeKind {
        &self.from
    }

    /// The declared label table.
    #[must_use]
    pub fn targets(&self) -> &FxHashMap<String, NodeKind> {
        &self.targets
    }

    /// Evaluates the predicate and resolves the label against the table.
    ///
    /// Returns the label together with its target; `None` target means the
    /// predicate produced an undeclared label (possible only with a buggy
    /// predicate; the runner degrades that branch to `End`).
    #[must_use]
    pub fn resolve(&self, snapshot: &StateSnapshot) -> (String, Option<NodeKind>) {
        let label = (self.predicate)(snapshot);
        let target = self.targets.get(&label).cloned();
        (label, target)
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("from", &self.from)
            .field("labels", &self.targets.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WorkflowState;

    #[test]
    fn test_resolve_known_and_unknown_labels() {
        let router = Router::new(
            NodeKind::stage("review"),
            Arc::new(|_| "retry".to_string()),
            [("retry", NodeKind::stage("propose"))],
        );
        let snapshot = WorkflowState::default().snapshot();

        let (label, target) = router.resolve(&snapshot);
        assert_eq!(label, "retry");
        assert_eq!(target, Some(NodeKind::stage("propose")));

        let rogue = Router::new(
            NodeKind::stage("review"),
            Arc::new(|_| "bogus".to_string()),
            [("retry", NodeKind::stage("propose"))],
        );
        let (label, target) = rogue.resolve(&snapshot);
        assert_eq!(label, "bogus");
        assert!(target.is_none());
    }
}
