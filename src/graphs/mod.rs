//! Graph definition and compilation.
//!
//! [`GraphBuilder`] declares the fixed topology of a workflow: named stages,
//! unconditional edges, label-routed conditional edges, and suspend-before
//! flags, then [`compile`](GraphBuilder::compile)s it into an executable
//! [`App`](crate::app::App). Invalid graphs (edge to an unknown stage, router
//! label with no target, missing reducer) fail at compile time, not mid-run.
//!
//! # Quick start
//!
//! ```
//! use vetflow::graphs::GraphBuilder;
//! use vetflow::types::NodeKind;
//! use vetflow::node::{Node, NodeContext, NodePatch, NodeError};
//! use vetflow::state::StateSnapshot;
//! use async_trait::async_trait;
//!
//! struct Collect;
//!
//! #[async_trait]
//! impl Node for Collect {
//!     async fn run(&self, _: StateSnapshot, _: NodeContext) -> Result<NodePatch, NodeError> {
//!         Ok(NodePatch::default())
//!     }
//! }
//!
//! let app = GraphBuilder::new()
//!     .add_node(NodeKind::stage("collect"), Collect)
//!     .add_edge(NodeKind::Start, NodeKind::stage("collect"))
//!     .add_edge(NodeKind::stage("collect"), NodeKind::End)
//!     .compile()
//!     .expect("valid graph");
//! # let _ = app;
//! ```
//!
//! # Conditional routing
//!
//! Routers carry a static label table, so every label a predicate may return
//! has a declared target that is validated at compile time:
//!
//! ```
//! use std::sync::Arc;
//! use vetflow::graphs::{GraphBuilder, Router};
//! use vetflow::types::NodeKind;
//! # use vetflow::node::{Node, NodeContext, NodePatch, NodeError};
//! # use vetflow::state::StateSnapshot;
//! # use async_trait::async_trait;
//! # struct Noop;
//! # #[async_trait]
//! # impl Node for Noop {
//! #     async fn run(&self, _: StateSnapshot, _: NodeContext) -> Result<NodePatch, NodeError> {
//! #         Ok(NodePatch::default())
//! #     }
//! # }
//!
//! let router = Router::new(
//!     NodeKind::stage("review"),
//!     Arc::new(|snapshot| {
//!         if snapshot.review.accepted.len() >= 5 {
//!             "advance".to_string()
//!         } else {
//!             "retry".to_string()
//!         }
//!     }),
//!     [
//!         ("advance", NodeKind::stage("finalize")),
//!         ("retry", NodeKind::stage("propose")),
//!     ],
//! );
//! # let _ = GraphBuilder::new()
//! #     .add_node(NodeKind::stage("review"), Noop)
//! #     .add_node(NodeKind::stage("finalize"), Noop)
//! #     .add_node(NodeKind::stage("propose"), Noop)
//! #     .add_edge(NodeKind::Start, NodeKind::stage("review"))
//! #     .add_edge(NodeKind::stage("finalize"), NodeKind::End)
//! #     .add_edge(NodeKind::stage("propose"), NodeKind::stage("review"))
//! #     .add_router(router)
//! #     .compile()
//! #     .expect("valid graph");
//! ```

mod builder;
mod compilation;
mod edges;

pub use builder::GraphBuilder;
pub use compilation::GraphCompileError;
pub use edges::{RoutePredicate, Router};
