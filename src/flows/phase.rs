//! Per-phase loop parameters.

use crate::item::{KeyExtractor, title_key_extractor};
use crate::types::NodeKind;

/// Parameters of one review loop instance.
///
/// The two pipeline phases differ only in these values (plus their propose
/// collaborator); the graph template itself is shared.
#[derive(Clone)]
pub struct PhaseSpec {
    /// Phase name; also keys the finalized output record.
    pub name: String,
    /// Minimum distinct accepted items for the loop to succeed.
    pub accept_threshold: usize,
    /// Propose/review cycles allowed before the loop gives up.
    pub max_iterations: u32,
    /// Identity extractor used to deduplicate accepted/rejected items.
    pub identity: KeyExtractor,
}

impl PhaseSpec {
    /// Defaults observed in the pipeline: threshold 5, budget 3 cycles,
    /// identity = normalized title.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            accept_threshold: 5,
            max_iterations: 3,
            identity: title_key_extractor(),
        }
    }

    #[must_use]
    pub fn with_accept_threshold(mut self, threshold: usize) -> Self {
        self.accept_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub fn with_identity(mut self, identity: KeyExtractor) -> Self {
        self.identity = identity;
        self
    }

    pub(crate) fn propose_node(&self) -> NodeKind {
        NodeKind::stage(format!("propose_{}", self.name))
    }

    pub(crate) fn review_node(&self) -> NodeKind {
        NodeKind::stage(format!("review_{}", self.name))
    }

    pub(crate) fn finalize_node(&self) -> NodeKind {
        NodeKind::stage(format!("finalize_{}", self.name))
    }

    pub(crate) fn exhausted_node(&self) -> NodeKind {
        NodeKind::stage(format!("exhausted_{}", self.name))
    }
}

impl std::fmt::Debug for PhaseSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseSpec")
            .field("name", &self.name)
            .field("accept_threshold", &self.accept_threshold)
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}
