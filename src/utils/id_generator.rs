//! Session id generation.

use uuid::Uuid;

/// Generates opaque run/session identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdGenerator;

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// A fresh opaque session id.
    #[must_use]
    pub fn generate_run_id(&self) -> String {
        format!("run-{}", Uuid::new_v4())
    }
}
