//! # Vetflow: Durable Review-Workflow Graph Engine
//!
//! Vetflow sequences work across automated stages and human-review
//! checkpoints: independent stages run concurrently and join at a hard
//! barrier, state merges go through per-channel reducers, and every suspend
//! point persists enough state that a run can be resumed indefinitely later
//! by its opaque session id alone.
//!
//! ## Core Concepts
//!
//! - **Nodes**: async units of work returning partial-state patches
//! - **State**: versioned typed channels (log, inputs, review, outputs, errors)
//! - **Reducers**: one merge discipline per channel; missing reducers are
//!   construction-time errors
//! - **Graph**: declarative topology with label-routed conditional edges and
//!   suspend-before flags, validated at compile time
//! - **Checkpointer**: swappable in-memory / SQLite persistence keyed by
//!   session id
//! - **Runner**: superstep executor driving sessions to the next suspend
//!   point or terminal node
//!
//! ## Quick Start
//!
//! ```
//! use vetflow::graphs::GraphBuilder;
//! use vetflow::message::Message;
//! use vetflow::node::{Node, NodeContext, NodeError, NodePatch};
//! use vetflow::state::StateSnapshot;
//! use vetflow::types::NodeKind;
//! use async_trait::async_trait;
//!
//! struct Greet;
//!
//! #[async_trait]
//! impl Node for Greet {
//!     async fn run(&self, _: StateSnapshot, _: NodeContext) -> Result<NodePatch, NodeError> {
//!         Ok(NodePatch::new().with_log(vec![Message::engine("hello")]))
//!     }
//! }
//!
//! let app = GraphBuilder::new()
//!     .add_node(NodeKind::stage("greet"), Greet)
//!     .add_edge(NodeKind::Start, NodeKind::stage("greet"))
//!     .add_edge(NodeKind::stage("greet"), NodeKind::End)
//!     .compile()
//!     .expect("valid graph");
//! # let _ = app;
//! ```
//!
//! ## The Discovery Pipeline
//!
//! The [`flows`] module instantiates the engine twice (a needs-review loop
//! chained into an opportunities-review loop) from one parameterized
//! template. See [`flows::ReviewPipeline`] for the external calling surface
//! (`start` / `resume` / `state`).
//!
//! ## Module Guide
//!
//! - [`message`], [`item`] - log entries and reviewable items
//! - [`state`], [`channels`] - versioned state and snapshots
//! - [`node`] - the node trait and patch types
//! - [`reducers`] - merge disciplines and the registry
//! - [`graphs`] - graph definition and compile-time validation
//! - [`schedulers`] - bounded-concurrency superstep execution
//! - [`runtimes`] - sessions, checkpointers, and the runner
//! - [`event_bus`] - structured observability events
//! - [`flows`] - the concrete discovery pipeline and its facade

pub mod app;
pub mod channels;
pub mod event_bus;
pub mod flows;
pub mod graphs;
pub mod item;
pub mod message;
pub mod node;
pub mod reducers;
pub mod runtimes;
pub mod schedulers;
pub mod state;
pub mod telemetry;
pub mod types;
pub mod utils;
