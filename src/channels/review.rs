//! The review channel: state of the active propose/review cycle.

use serde::{Deserialize, Serialize};

use super::Channel;
use crate::item::Item;

/// External input delivered by a resume call.
///
/// Non-`None` on [`ReviewCycle::pending`] only between a suspend point and
/// the review stage that consumes it; that stage merges the batches into the
/// accumulators and clears the inbox.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    /// Items the reviewer accepted this cycle.
    #[serde(default)]
    pub accepted: Vec<Item>,
    /// Items the reviewer rejected this cycle.
    #[serde(default)]
    pub rejected: Vec<Item>,
    /// Free-text guidance for the next propose cycle.
    #[serde(default)]
    pub feedback: Option<String>,
}

impl ReviewSubmission {
    #[must_use]
    pub fn new(accepted: Vec<Item>, rejected: Vec<Item>, feedback: Option<String>) -> Self {
        Self {
            accepted,
            rejected,
            feedback,
        }
    }
}

/// Marks the start of a phase: names it and sets its iteration budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseStart {
    pub phase: String,
    pub max_iterations: u32,
}

/// Live state of the current propose/review loop.
///
/// One cycle instance serves both workflow phases; finalizing a phase resets
/// the cycle for the next one while the finalized result moves to the
/// outputs channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewCycle {
    /// Name of the phase this cycle belongs to.
    pub phase: String,
    /// Candidates from the most recent propose step; replaced wholesale.
    #[serde(default)]
    pub proposed: Vec<Item>,
    /// Accepted accumulator; set-union keyed by item identity.
    #[serde(default)]
    pub accepted: Vec<Item>,
    /// Rejected accumulator; set-union keyed by item identity.
    #[serde(default)]
    pub rejected: Vec<Item>,
    /// Reviewer guidance from the last cycle; replaced each cycle.
    #[serde(default)]
    pub feedback: Option<String>,
    /// Completed review cycles within this phase.
    #[serde(default)]
    pub iteration: u32,
    /// Iteration budget; the loop terminates without success once reached.
    #[serde(default)]
    pub max_iterations: u32,
    /// Inbox for the next resume submission.
    #[serde(default)]
    pub pending: Option<ReviewSubmission>,
    /// Set when the loop ran out of iterations below its accept threshold.
    #[serde(default)]
    pub exhausted: bool,
}

impl ReviewCycle {
    /// A fresh cycle for the named phase.
    #[must_use]
    pub fn for_phase(phase: &str, max_iterations: u32) -> Self {
        Self {
            phase: phase.to_string(),
            max_iterations,
            ..Default::default()
        }
    }

    /// Resets loop state for the next phase, keeping nothing from the
    /// previous one.
    pub fn begin_phase(&mut self, start: &PhaseStart) {
        *self = Self::for_phase(&start.phase, start.max_iterations);
    }
}

/// Versioned wrapper around the review cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct ReviewChannel {
    cycle: ReviewCycle,
    version: u32,
}

impl Default for ReviewChannel {
    fn default() -> Self {
        Self::new(ReviewCycle::default(), 1)
    }
}

impl ReviewChannel {
    #[must_use]
    pub fn new(cycle: ReviewCycle, version: u32) -> Self {
        Self { cycle, version }
    }

    pub fn get_mut(&mut self) -> &mut ReviewCycle {
        &mut self.cycle
    }

    #[must_use]
    pub fn get(&self) -> &ReviewCycle {
        &self.cycle
    }
}

impl Channel for ReviewChannel {
    type Snapshot = ReviewCycle;

    fn snapshot(&self) -> ReviewCycle {
        self.cycle.clone()
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn set_version(&mut self, version: u32) {
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_phase_resets_everything() {
        let mut cycle = ReviewCycle::for_phase("needs", 3);
        cycle.accepted.push(Item::new("faster onboarding"));
        cycle.iteration = 2;
        cycle.feedback = Some("focus on retention".into());

        cycle.begin_phase(&PhaseStart {
            phase: "opportunities".into(),
            max_iterations: 3,
        });

        assert_eq!(cycle.phase, "opportunities");
        assert!(cycle.accepted.is_empty());
        assert_eq!(cycle.iteration, 0);
        assert!(cycle.feedback.is_none());
        assert!(!cycle.exhausted);
    }

    #[test]
    fn test_submission_serde_round_trip() {
        let submission = ReviewSubmission::new(
            vec![Item::new("Reduce churn")],
            vec![],
            Some("tighten scope".into()),
        );
        let json = serde_json::to_string(&submission).expect("serialize");
        let parsed: ReviewSubmission = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(submission, parsed);
    }
}
