//! Versioned state channels.
//!
//! Each channel holds one slice of workflow state together with a `u32`
//! version. Versions are bumped only at barriers, and only when content
//! actually changed, so checkpoints and step reports can tell "which channels
//! moved this step" without diffing payloads.

pub mod errors;
pub mod review;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::message::Message;
use errors::ErrorEvent;

pub use review::{PhaseStart, ReviewChannel, ReviewCycle, ReviewSubmission};

/// Common surface of a versioned channel: a cloned snapshot plus version
/// accessors used by the barrier's change detection.
pub trait Channel {
    type Snapshot;

    /// Clone the current payload.
    fn snapshot(&self) -> Self::Snapshot;

    /// Current version counter.
    fn version(&self) -> u32;

    /// Overwrite the version counter (barrier bumps only).
    fn set_version(&mut self, version: u32);
}

macro_rules! versioned_channel {
    ($(#[$doc:meta])* $name:ident, $payload:ty) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq)]
        pub struct $name {
            payload: $payload,
            version: u32,
        }

        impl $name {
            #[must_use]
            pub fn new(payload: $payload, version: u32) -> Self {
                Self { payload, version }
            }

            /// Mutable access to the payload; versioning stays with the barrier.
            pub fn get_mut(&mut self) -> &mut $payload {
                &mut self.payload
            }

            /// Shared access to the payload without cloning.
            #[must_use]
            pub fn get(&self) -> &$payload {
                &self.payload
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new(<$payload>::default(), 1)
            }
        }

        impl Channel for $name {
            type Snapshot = $payload;

            fn snapshot(&self) -> $payload {
                self.payload.clone()
            }

            fn version(&self) -> u32 {
                self.version
            }

            fn set_version(&mut self, version: u32) {
                self.version = version;
            }
        }
    };
}

versioned_channel!(
    /// Append-only run narration (merge rule: concatenate).
    LogChannel,
    Vec<Message>
);

versioned_channel!(
    /// Named fragments from the parallel source producers (merge rule:
    /// per-key insert; producers write disjoint keys).
    InputsChannel,
    FxHashMap<String, Value>
);

versioned_channel!(
    /// Finalized per-phase results (merge rule: write-once per key).
    OutputsChannel,
    FxHashMap<String, Value>
);

versioned_channel!(
    /// Diagnostic error events (merge rule: concatenate).
    ErrorsChannel,
    Vec<ErrorEvent>
);

impl LogChannel {
    #[must_use]
    pub fn len(&self) -> usize {
        self.get().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.get().is_empty()
    }
}

impl ErrorsChannel {
    #[must_use]
    pub fn len(&self) -> usize {
        self.get().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.get().is_empty()
    }
}
