use serde::{Deserialize, Serialize};
use std::fmt;

/// Scope of the diagnostic emitted when a session's event stream ends.
pub const STREAM_END_SCOPE: &str = "__vetflow_stream_end__";

/// A structured observability event.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Event {
    /// Emitted by a stage during execution.
    Node(NodeEvent),
    /// Emitted by the runtime itself.
    Diagnostic(DiagnosticEvent),
}

impl Event {
    /// A stage-scoped event with stage id and step metadata.
    pub fn node_with_meta(
        node_id: impl Into<String>,
        step: u64,
        scope: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Event::Node(NodeEvent {
            node_id: Some(node_id.into()),
            step: Some(step),
            scope: scope.into(),
            message: message.into(),
        })
    }

    /// A runtime diagnostic event.
    pub fn diagnostic(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Event::Diagnostic(DiagnosticEvent {
            scope: scope.into(),
            message: message.into(),
        })
    }

    #[must_use]
    pub fn scope(&self) -> &str {
        match self {
            Event::Node(e) => &e.scope,
            Event::Diagnostic(e) => &e.scope,
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Event::Node(e) => &e.message,
            Event::Diagnostic(e) => &e.message,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Node(e) => match (&e.node_id, e.step) {
                (Some(id), Some(step)) => {
                    write!(f, "[{}] step={} {}: {}", e.scope, step, id, e.message)
                }
                _ => write!(f, "[{}] {}", e.scope, e.message),
            },
            Event::Diagnostic(e) => write!(f, "[{}] {}", e.scope, e.message),
        }
    }
}

/// Event produced by a stage, tagged with its id and step.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeEvent {
    pub node_id: Option<String>,
    pub step: Option<u64>,
    pub scope: String,
    pub message: String,
}

/// Event produced by the runtime (session lifecycle, stream termination).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiagnosticEvent {
    pub scope: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_and_display() {
        let event = Event::node_with_meta("propose_needs", 3, "propose", "6 candidates");
        assert_eq!(event.scope(), "propose");
        assert_eq!(event.message(), "6 candidates");
        assert!(event.to_string().contains("propose_needs"));

        let diag = Event::diagnostic(STREAM_END_SCOPE, "session=s1 status=done");
        assert_eq!(diag.scope(), STREAM_END_SCOPE);
    }
}
