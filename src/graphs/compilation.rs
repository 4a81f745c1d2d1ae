//! Graph validation and compilation into an executable [`App`].

use miette::Diagnostic;
use thiserror::Error;

use crate::app::App;
use crate::types::{ChannelType, NodeKind};

/// Structural errors caught when compiling a graph.
///
/// These are construction-time failures: they abort startup rather than
/// surfacing mid-session.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphCompileError {
    #[error("no edges leave Start; the graph has no entry frontier")]
    #[diagnostic(
        code(vetflow::graph::no_entry),
        help("Add at least one edge from NodeKind::Start.")
    )]
    NoEntryEdges,

    #[error("edge {from} -> {to} references unregistered stage '{to}'")]
    #[diagnostic(
        code(vetflow::graph::unknown_edge_target),
        help("Register the stage with add_node before wiring edges to it.")
    )]
    UnknownEdgeTarget { from: NodeKind, to: NodeKind },

    #[error("edges leave unregistered stage '{from}'")]
    #[diagnostic(code(vetflow::graph::unknown_edge_source))]
    UnknownEdgeSource { from: NodeKind },

    #[error("router on '{from}' maps label '{label}' to unregistered stage '{target}'")]
    #[diagnostic(
        code(vetflow::graph::unknown_route_target),
        help("Every router label must target a registered stage or End.")
    )]
    UnknownRouteTarget {
        from: NodeKind,
        label: String,
        target: NodeKind,
    },

    #[error("router attached to unregistered stage '{from}'")]
    #[diagnostic(code(vetflow::graph::unknown_route_source))]
    UnknownRouteSource { from: NodeKind },

    #[error("suspend-before flag on unregistered stage '{node}'")]
    #[diagnostic(code(vetflow::graph::unknown_suspend_node))]
    UnknownSuspendNode { node: NodeKind },

    #[error("no reducer registered for channel '{channel}'; concurrent writes would be ambiguous")]
    #[diagnostic(
        code(vetflow::graph::missing_reducer),
        help("Register a merge discipline for the channel, or use the default registry.")
    )]
    MissingReducer { channel: ChannelType },
}

impl super::builder::GraphBuilder {
    /// Validates the graph and compiles it into an executable [`App`].
    ///
    /// Checks performed:
    /// - at least one edge leaves `Start`;
    /// - every edge endpoint is a registered stage or a virtual endpoint;
    /// - every router hangs off a registered stage and every label in its
    ///   table maps to a registered stage or `End`;
    /// - every suspend-before flag names a registered stage;
    /// - every state channel has a registered reducer, so concurrent writes
    ///   always have an unambiguous merge.
    pub fn compile(self) -> Result<App, GraphCompileError> {
        let is_known = |kind: &NodeKind| match kind {
            NodeKind::Start | NodeKind::End => true,
            NodeKind::Stage(_) => self.nodes.contains_key(kind),
        };

        if self
            .edges
            .get(&NodeKind::Start)
            .is_none_or(|targets| targets.is_empty())
        {
            return Err(GraphCompileError::NoEntryEdges);
        }

        for (from, targets) in &self.edges {
            if !is_known(from) {
                return Err(GraphCompileError::UnknownEdgeSource { from: from.clone() });
            }
            for to in targets {
                if !is_known(to) {
                    return Err(GraphCompileError::UnknownEdgeTarget {
                        from: from.clone(),
                        to: to.clone(),
                    });
                }
            }
        }

        for router in &self.routers {
            if !is_known(router.from()) {
                return Err(GraphCompileError::UnknownRouteSource {
                    from: router.from().clone(),
                });
            }
            for (label, target) in router.targets() {
                if !is_known(target) {
                    return Err(GraphCompileError::UnknownRouteTarget {
                        from: router.from().clone(),
                        label: label.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        for node in &self.suspend_before {
            if !self.nodes.contains_key(node) {
                return Err(GraphCompileError::UnknownSuspendNode { node: node.clone() });
            }
        }

        for channel in ChannelType::ALL {
            if !self.reducers.covers(&channel) {
                return Err(GraphCompileError::MissingReducer { channel });
            }
        }

        Ok(App::from_parts(
            self.nodes,
            self.edges,
            self.routers,
            self.suspend_before,
            self.reducers,
            self.runtime_config,
        ))
    }
}
