//! Concrete workflow instantiations on top of the engine.
//!
//! The discovery pipeline turns raw interview/workshop material into a
//! validated list of business needs, then a validated list of derived
//! opportunities. Both phases are the same propose → review →
//! accept-or-retry loop, instantiated twice from one template with a
//! different propose collaborator, accept threshold, and item-identity
//! extractor, with no duplicated graph code.
//!
//! Shape of one run:
//!
//! ```text
//! Start -> {collect_*}          three producers, concurrent, barrier join
//! {collect_*} -> aggregate
//! aggregate -> propose_needs
//! propose_needs -> [suspend] review_needs
//! review_needs -(router)-> finalize_needs | propose_needs | exhausted_needs
//! finalize_needs -> propose_opportunities          (same loop again)
//! finalize_opportunities -> End
//! ```
//!
//! External callers use [`ReviewPipeline`]: `start()` runs to the first
//! review suspension, each `resume()` delivers a reviewer's verdict and runs
//! to the next suspension or the end. The session id returned by `start` is
//! the only thing a caller must retain.

mod collaborators;
mod discovery;
mod nodes;
mod phase;
mod pipeline;

pub use collaborators::{CollaboratorError, ProposeContext, Proposer, SourceProducer};
pub use discovery::{DiscoverySpec, discovery_graph};
pub use nodes::{
    AggregateNode, ExhaustedNode, FinalizeNode, ProducerNode, ProposeNode, ReviewGateNode,
};
pub use phase::PhaseSpec;
pub use pipeline::{PipelineError, ReviewPipeline, RunResult};
