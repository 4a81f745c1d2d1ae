//! The workflow facade: the two call patterns external callers use.

use miette::Diagnostic;
use thiserror::Error;
use tracing::instrument;

use super::discovery::{DiscoverySpec, discovery_graph};
use crate::channels::ReviewSubmission;
use crate::graphs::GraphCompileError;
use crate::runtimes::{
    CheckpointerType, RunOutcome, RunStatus, RunnerError, RuntimeConfig, WorkflowRunner,
};
use crate::state::WorkflowState;

/// What a caller gets back from `start`/`resume`: the session key, an
/// explicit status, the suspension point (when suspended), and the state.
/// Never a raw stack trace.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Opaque key into the checkpoint store; retain it to resume.
    pub session_id: String,
    /// Suspended, Done, or Exhausted.
    pub status: RunStatus,
    /// Name of the stage the run is parked before, when suspended.
    pub frontier: Option<String>,
    /// State as of settling.
    pub state: WorkflowState,
}

/// Errors surfaced by the facade.
#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(#[from] GraphCompileError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Runner(#[from] RunnerError),
}

/// A running discovery pipeline: needs loop chained into opportunities loop.
///
/// # Examples
///
/// ```rust,no_run
/// use vetflow::flows::{DiscoverySpec, ReviewPipeline};
/// use vetflow::channels::ReviewSubmission;
/// use vetflow::item::Item;
/// # async fn example(spec: DiscoverySpec) -> Result<(), Box<dyn std::error::Error>> {
/// let mut pipeline = ReviewPipeline::new(spec).await?;
///
/// // Runs producers, aggregation, and the first propose; suspends at review.
/// let run = pipeline.start().await?;
/// let session_id = run.session_id.clone();
///
/// // ... reviewer examines run.state.review.proposed, then:
/// let verdict = ReviewSubmission::new(
///     vec![Item::new("Faster onboarding")],
///     vec![Item::new("Dark mode")],
///     Some("focus on activation".into()),
/// );
/// let run = pipeline.resume(&session_id, verdict).await?;
/// println!("status now: {:?}", run.status);
/// # Ok(())
/// # }
/// ```
pub struct ReviewPipeline {
    runner: WorkflowRunner,
    runtime: RuntimeConfig,
    seed_phase: String,
    seed_max_iterations: u32,
}

impl ReviewPipeline {
    /// Compile the graph and set up the runner with the configured
    /// checkpoint backend.
    pub async fn new(spec: DiscoverySpec) -> Result<Self, PipelineError> {
        let runtime = spec.runtime.clone();
        let seed_phase = spec.needs.name.clone();
        let seed_max_iterations = spec.needs.max_iterations;
        let checkpointer = runtime
            .checkpointer
            .clone()
            .unwrap_or(CheckpointerType::InMemory);

        let app = discovery_graph(&spec)?;
        let runner = WorkflowRunner::new(app, checkpointer).await;
        Ok(Self {
            runner,
            runtime,
            seed_phase,
            seed_max_iterations,
        })
    }

    /// Begin a fresh run: producers fan out, join, and the first propose
    /// cycle runs; returns suspended at the first review gate.
    #[instrument(skip(self), err)]
    pub async fn start(&mut self) -> Result<RunResult, PipelineError> {
        let session_id = self.runtime.next_session_id();
        let initial = WorkflowState::for_phase(&self.seed_phase, self.seed_max_iterations);
        self.runner
            .create_session(session_id.clone(), initial)
            .await?;
        let outcome = self.runner.run_until_settled(&session_id).await?;
        Ok(Self::into_result(session_id, outcome))
    }

    /// Deliver a reviewer's verdict for a suspended session and continue to
    /// the next suspension or terminal. Unknown ids fail with
    /// `SessionNotFound`; terminal sessions return their result idempotently.
    #[instrument(skip(self, submission), err)]
    pub async fn resume(
        &mut self,
        session_id: &str,
        submission: ReviewSubmission,
    ) -> Result<RunResult, PipelineError> {
        let outcome = self.runner.resume_session(session_id, submission).await?;
        Ok(Self::into_result(session_id.to_string(), outcome))
    }

    /// Read-only introspection of a session's state.
    pub async fn state(&mut self, session_id: &str) -> Result<WorkflowState, PipelineError> {
        Ok(self.runner.get_state(session_id).await?)
    }

    /// Abandon a session, removing its checkpoint.
    pub async fn abandon(&mut self, session_id: &str) -> Result<(), PipelineError> {
        Ok(self.runner.clear_session(session_id).await?)
    }

    fn into_result(session_id: String, outcome: RunOutcome) -> RunResult {
        let frontier = match &outcome.status {
            RunStatus::Suspended { node } => Some(node.to_string()),
            _ => None,
        };
        RunResult {
            session_id,
            status: outcome.status,
            frontier,
            state: outcome.state,
        }
    }
}
