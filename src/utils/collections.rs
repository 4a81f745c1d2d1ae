//! Constructors for the hash maps used throughout the crate.

use rustc_hash::FxHashMap;
use serde_json::Value;

/// New empty map for input fragments / phase outputs.
#[must_use]
pub fn new_input_map() -> FxHashMap<String, Value> {
    FxHashMap::default()
}
