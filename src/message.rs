use serde::{Deserialize, Serialize};

/// One entry in the run's event log: who said it and what was said.
///
/// The log channel is the append-only narration of a workflow run. Phase
/// transitions, review outcomes, and degraded node failures all land here so
/// a resumed session carries its full history without any side-channel
/// console output.
///
/// # Examples
///
/// ```
/// use vetflow::message::Message;
///
/// let note = Message::engine("aggregate joined 3 source fragments");
/// assert_eq!(note.actor, "engine");
///
/// let verdict = Message::reviewer("accepted 2 of 6 proposed needs");
/// assert!(verdict.has_actor(Message::REVIEWER));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    /// Who produced the entry (e.g., "engine", "reviewer", "proposer").
    pub actor: String,
    /// The text of the entry.
    pub content: String,
}

impl Message {
    /// The engine itself (scheduling, barriers, phase transitions).
    pub const ENGINE: &'static str = "engine";
    /// The human reviewer driving a resume cycle.
    pub const REVIEWER: &'static str = "reviewer";
    /// A propose collaborator generating candidate items.
    pub const PROPOSER: &'static str = "proposer";

    /// Creates an entry with an explicit actor.
    #[must_use]
    pub fn new(actor: &str, content: &str) -> Self {
        Self {
            actor: actor.to_string(),
            content: content.to_string(),
        }
    }

    /// Creates an engine-attributed entry.
    #[must_use]
    pub fn engine(content: &str) -> Self {
        Self::new(Self::ENGINE, content)
    }

    /// Creates a reviewer-attributed entry.
    #[must_use]
    pub fn reviewer(content: &str) -> Self {
        Self::new(Self::REVIEWER, content)
    }

    /// Creates a proposer-attributed entry.
    #[must_use]
    pub fn proposer(content: &str) -> Self {
        Self::new(Self::PROPOSER, content)
    }

    /// Returns true if this entry was produced by the given actor.
    #[must_use]
    pub fn has_actor(&self, actor: &str) -> bool {
        self.actor == actor
    }
}
