//! Core identifier types for the vetflow workflow engine.
//!
//! [`NodeKind`] names positions in the workflow graph and [`ChannelType`]
//! names the state channels reducers operate on. Runtime identifiers
//! (session ids, step numbers) are plain strings and integers owned by the
//! runtimes module.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a position in the workflow graph.
///
/// `Start` and `End` are virtual endpoints: they are never registered with
/// the builder and never executed, existing only so topology can be declared
/// ("edges from Start define the entry frontier, edges to End terminate a
/// branch"). Every executable node is a named [`Stage`](Self::Stage).
///
/// # Persistence
///
/// Checkpoints store node kinds in the string form produced by
/// [`encode`](Self::encode); [`decode`](Self::decode) is forward-compatible
/// and maps unknown shapes back to `Stage`.
///
/// # Examples
///
/// ```
/// use vetflow::types::NodeKind;
///
/// let propose = NodeKind::Stage("propose_needs".into());
/// assert_eq!(propose.encode(), "Stage:propose_needs");
/// assert_eq!(NodeKind::decode(&propose.encode()), propose);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Virtual entry endpoint; its outgoing edges form the initial frontier.
    Start,
    /// Virtual terminal endpoint; branches routed here are finished.
    End,
    /// A named executable stage in the workflow.
    Stage(String),
}

impl NodeKind {
    /// Convenience constructor for a named stage.
    #[must_use]
    pub fn stage(name: impl Into<String>) -> Self {
        NodeKind::Stage(name.into())
    }

    /// Encode into the persisted string form.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            NodeKind::Start => "Start".to_string(),
            NodeKind::End => "End".to_string(),
            NodeKind::Stage(name) => format!("Stage:{name}"),
        }
    }

    /// Decode a persisted string form, treating unknown shapes as stages.
    #[must_use]
    pub fn decode(s: &str) -> Self {
        if s == "Start" {
            NodeKind::Start
        } else if s == "End" {
            NodeKind::End
        } else if let Some(rest) = s.strip_prefix("Stage:") {
            NodeKind::Stage(rest.to_string())
        } else {
            NodeKind::Stage(s.to_string())
        }
    }

    /// Returns `true` for the virtual `Start` endpoint.
    #[must_use]
    pub fn is_start(&self) -> bool {
        matches!(self, Self::Start)
    }

    /// Returns `true` for the virtual `End` endpoint.
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Returns `true` for executable stages.
    #[must_use]
    pub fn is_stage(&self) -> bool {
        matches!(self, Self::Stage(_))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::End => write!(f, "End"),
            Self::Stage(name) => write!(f, "{name}"),
        }
    }
}

impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        match s {
            "Start" => NodeKind::Start,
            "End" => NodeKind::End,
            other => NodeKind::Stage(other.to_string()),
        }
    }
}

/// Identifies one of the typed state channels.
///
/// Every channel has exactly one registered merge discipline (see
/// [`crate::reducers`]); a patch touching a channel with no reducer is a
/// construction-time error surfaced by graph compilation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    /// Append-only run narration entries.
    Log,
    /// Named fragments collected by the parallel source producers.
    Inputs,
    /// The active propose/review cycle.
    Review,
    /// Write-once finalized phase results.
    Outputs,
    /// Diagnostic error events.
    Errors,
}

impl ChannelType {
    /// All channel types, in deterministic order.
    pub const ALL: [ChannelType; 5] = [
        ChannelType::Log,
        ChannelType::Inputs,
        ChannelType::Review,
        ChannelType::Outputs,
        ChannelType::Errors,
    ];
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Log => write!(f, "log"),
            Self::Inputs => write!(f, "inputs"),
            Self::Review => write!(f, "review"),
            Self::Outputs => write!(f, "outputs"),
            Self::Errors => write!(f, "errors"),
        }
    }
}
