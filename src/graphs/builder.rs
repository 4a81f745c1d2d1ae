//! Fluent builder for workflow graphs.

use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

use super::edges::Router;
use crate::node::Node;
use crate::reducers::ReducerRegistry;
use crate::runtimes::RuntimeConfig;
use crate::types::NodeKind;

/// Builder for workflow graphs.
///
/// Every graph needs at least one executable stage, an edge leaving
/// `NodeKind::Start` (the entry frontier), and a path to `NodeKind::End`.
/// `Start`/`End` are virtual endpoints: attempts to register them as nodes
/// are ignored with a warning.
///
/// Stages flagged with [`suspend_before`](Self::suspend_before) halt the
/// executor immediately before they run; the session checkpoints and waits
/// for an external resume.
pub struct GraphBuilder {
    /// Registry of executable stages, keyed by identifier.
    pub nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
    /// Unconditional edges (static topology).
    pub edges: FxHashMap<NodeKind, Vec<NodeKind>>,
    /// Conditional label-routed edges.
    pub routers: Vec<Router>,
    /// Stages that suspend execution before running.
    pub suspend_before: FxHashSet<NodeKind>,
    /// Per-channel merge disciplines.
    pub reducers: ReducerRegistry,
    /// Runtime configuration for the compiled application.
    pub runtime_config: RuntimeConfig,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            edges: FxHashMap::default(),
            routers: Vec::new(),
            suspend_before: FxHashSet::default(),
            reducers: ReducerRegistry::default(),
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Registers an executable stage.
    ///
    /// `Start`/`End` are virtual and never executed; registering them is
    /// ignored with a warning.
    #[must_use]
    pub fn add_node(mut self, id: NodeKind, node: impl Node + 'static) -> Self {
        match id {
            NodeKind::Start | NodeKind::End => {
                tracing::warn!(?id, "ignoring registration of virtual endpoint");
            }
            _ => {
                self.nodes.insert(id, Arc::new(node));
            }
        }
        self
    }

    /// Adds an unconditional edge. Multiple edges from one stage fan out;
    /// the whole fan-out group executes concurrently in one superstep and
    /// joins at the barrier.
    #[must_use]
    pub fn add_edge(mut self, from: NodeKind, to: NodeKind) -> Self {
        self.edges.entry(from).or_default().push(to);
        self
    }

    /// Adds a conditional router. Its label table is validated at compile
    /// time: every label must map to a registered stage or `End`.
    #[must_use]
    pub fn add_router(mut self, router: Router) -> Self {
        self.routers.push(router);
        self
    }

    /// Flags a stage as a suspend point: execution halts immediately before
    /// it runs, until the session is resumed with external input.
    #[must_use]
    pub fn suspend_before(mut self, id: NodeKind) -> Self {
        self.suspend_before.insert(id);
        self
    }

    /// Replaces the reducer registry (merge disciplines).
    #[must_use]
    pub fn with_reducers(mut self, reducers: ReducerRegistry) -> Self {
        self.reducers = reducers;
        self
    }

    /// Configures runtime settings for the compiled application.
    #[must_use]
    pub fn with_runtime_config(mut self, runtime_config: RuntimeConfig) -> Self {
        self.runtime_config = runtime_config;
        self
    }
}
