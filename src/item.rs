//! Reviewable items and their identity keys.
//!
//! An [`Item`] is one candidate produced by a propose step (a business need,
//! a derived opportunity). Accept/reject accumulators are sets keyed by the
//! item's identity key, so submitting the same theme twice is idempotent no
//! matter how the title was cased or which detail fields changed.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A candidate item flowing through a propose/review loop.
///
/// The `key` is the stable identity used by set-union merges. Nodes assign it
/// via the loop's [`KeyExtractor`] before items reach the reducers; the
/// default extractor normalizes the title.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Stable identity key; duplicates collapse on this value.
    pub key: String,
    /// Human-facing title of the item.
    pub title: String,
    /// Free-form display fields (rationale, source references, scores).
    #[serde(default)]
    pub details: FxHashMap<String, Value>,
}

impl Item {
    /// Creates an item whose key is the normalized title.
    #[must_use]
    pub fn new(title: &str) -> Self {
        Self {
            key: normalized_key(title),
            title: title.to_string(),
            details: FxHashMap::default(),
        }
    }

    /// Adds a display field, returning self for chaining.
    #[must_use]
    pub fn with_detail(mut self, name: &str, value: Value) -> Self {
        self.details.insert(name.to_string(), value);
        self
    }
}

/// Derives an item's identity key from its content.
///
/// Each review loop instance carries its own extractor so the two phases can
/// key on different fields without the engine knowing which.
pub type KeyExtractor = Arc<dyn Fn(&Item) -> String + Send + Sync>;

/// The default extractor: normalized title.
#[must_use]
pub fn title_key_extractor() -> KeyExtractor {
    Arc::new(|item: &Item| normalized_key(&item.title))
}

/// Normalizes raw identity text: trimmed, lowercased, inner whitespace
/// collapsed to single spaces.
#[must_use]
pub fn normalized_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
