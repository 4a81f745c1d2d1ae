//! Diagnostic error events recorded on the errors channel.
//!
//! Runtime node failures never abort an in-flight session; they are
//! downgraded to [`ErrorEvent`]s appended here (plus a log entry), and the
//! frontier advances as if the node had returned an empty patch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded failure, with where it happened and structured context.
///
/// # Examples
///
/// ```
/// use vetflow::channels::errors::{ErrorEvent, FaultDetail};
/// use serde_json::json;
///
/// let event = ErrorEvent::node("propose_needs", 4, FaultDetail::msg("proposer timed out"))
///     .with_tag("collaborator")
///     .with_context(json!({"phase": "needs"}));
/// assert_eq!(event.tags, vec!["collaborator"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ErrorEvent {
    #[serde(default = "chrono::Utc::now")]
    pub when: DateTime<Utc>,
    #[serde(default)]
    pub scope: ErrorScope,
    #[serde(default)]
    pub error: FaultDetail,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub context: serde_json::Value,
}

impl ErrorEvent {
    /// A failure inside a specific stage during a step.
    pub fn node<S: Into<String>>(stage: S, step: u64, error: FaultDetail) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Node {
                stage: stage.into(),
                step,
            },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// A failure in the scheduler itself.
    pub fn scheduler(step: u64, error: FaultDetail) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Scheduler { step },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// A failure at the runner/session level.
    pub fn runner<S: Into<String>>(session: S, step: u64, error: FaultDetail) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Runner {
                session: session.into(),
                step,
            },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// A failure with no narrower scope (e.g., an invariant violation).
    pub fn app(error: FaultDetail) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::App,
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }
}

/// Where an error event originated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ErrorScope {
    Node {
        stage: String,
        step: u64,
    },
    Scheduler {
        step: u64,
    },
    Runner {
        session: String,
        step: u64,
    },
    #[default]
    App,
}

/// Message plus optional cause chain and structured details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FaultDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<FaultDetail>>,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl Default for FaultDetail {
    fn default() -> Self {
        FaultDetail {
            message: String::new(),
            cause: None,
            details: serde_json::Value::Null,
        }
    }
}

impl std::fmt::Display for FaultDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FaultDetail {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|c| c as &dyn std::error::Error)
    }
}

impl FaultDetail {
    pub fn msg<M: Into<String>>(m: M) -> Self {
        FaultDetail {
            message: m.into(),
            cause: None,
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_cause(mut self, cause: FaultDetail) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_constructors() {
        let e = ErrorEvent::node("aggregate", 2, FaultDetail::msg("missing fragment"));
        assert!(matches!(e.scope, ErrorScope::Node { ref stage, step: 2 } if stage == "aggregate"));

        let e = ErrorEvent::runner("sess-1", 5, FaultDetail::msg("oops"));
        assert!(matches!(e.scope, ErrorScope::Runner { step: 5, .. }));
    }

    #[test]
    fn test_cause_chain() {
        let detail = FaultDetail::msg("proposer failed")
            .with_cause(FaultDetail::msg("connection reset"));
        let source = std::error::Error::source(&detail).expect("cause present");
        assert_eq!(source.to_string(), "connection reset");
    }

    #[test]
    fn test_serde_round_trip() {
        let event = ErrorEvent::scheduler(7, FaultDetail::msg("join failure"))
            .with_tag("scheduler")
            .with_context(serde_json::json!({"frontier": ["propose_needs"]}));
        let json = serde_json::to_string(&event).expect("serialize");
        let parsed: ErrorEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(event, parsed);
    }
}
