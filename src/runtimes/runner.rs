//! The session executor: drives supersteps to the next suspend point or
//! terminal node.
//!
//! One `WorkflowRunner` manages many isolated sessions over one compiled
//! [`App`]. Each session advances in supersteps: the whole frontier runs
//! concurrently, the barrier folds the patches, routers pick the next
//! frontier. Reaching a stage flagged suspend-before halts the session with a
//! persisted checkpoint; `resume_session` later injects the external
//! submission and continues. Between the two calls the process may exit
//! entirely; everything needed lives in the checkpoint store.

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

use crate::app::App;
use crate::channels::ReviewSubmission;
use crate::channels::errors::{ErrorEvent, FaultDetail};
use crate::event_bus::{Event, EventBus, STREAM_END_SCOPE};
use crate::node::{NodePatch, ReviewPatch};
use crate::reducers::ReducerError;
use crate::runtimes::checkpointer::{
    Checkpoint, Checkpointer, CheckpointerError, CheckpointerType, InMemoryCheckpointer,
    restore_session_state,
};
use crate::runtimes::session::{SessionInit, SessionState};
use crate::schedulers::Scheduler;
use crate::state::WorkflowState;
use crate::types::NodeKind;

/// Result of one executed superstep (observability surface).
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: u64,
    pub ran_nodes: Vec<NodeKind>,
    pub skipped_nodes: Vec<NodeKind>,
    pub updated_channels: Vec<&'static str>,
    pub next_frontier: Vec<NodeKind>,
}

/// How a settled session finished this call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Halted at a suspend point; resume with external input to continue.
    Suspended { node: NodeKind },
    /// Terminal with every phase finalized.
    Done,
    /// Terminal without success: the iteration budget ran out below the
    /// accept threshold. A policy outcome, not an error.
    Exhausted,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Suspended { .. } => "suspended",
            RunStatus::Done => "done",
            RunStatus::Exhausted => "exhausted",
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Suspended { .. })
    }
}

/// Status plus the state as of settling.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub state: WorkflowState,
}

/// Errors surfaced by the runner. Node failures are never among them; those
/// degrade into error events and the run continues.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    #[error("session not found: {session_id}")]
    #[diagnostic(
        code(vetflow::runner::session_not_found),
        help("The id has no checkpoint on record; start a fresh run instead.")
    )]
    SessionNotFound { session_id: String },

    #[error("no stages to run from Start (empty entry frontier)")]
    #[diagnostic(code(vetflow::runner::no_start_nodes))]
    NoStartNodes,

    #[error(transparent)]
    #[diagnostic(code(vetflow::runner::checkpointer))]
    Checkpointer(#[from] CheckpointerError),

    #[error("barrier merge failed: {0}")]
    #[diagnostic(code(vetflow::runner::barrier))]
    Barrier(#[from] ReducerError),
}

/// Runtime execution engine over one compiled app.
pub struct WorkflowRunner {
    app: Arc<App>,
    scheduler: Scheduler,
    sessions: FxHashMap<String, SessionState>,
    checkpointer: Option<Arc<dyn Checkpointer>>,
    autosave: bool,
    event_bus: EventBus,
}

impl WorkflowRunner {
    /// Runner with autosave enabled and the app's configured event bus.
    pub async fn new(app: App, checkpointer_type: CheckpointerType) -> Self {
        Self::with_options(app, checkpointer_type, true).await
    }

    /// Runner with an explicit autosave toggle.
    pub async fn with_options(
        app: App,
        checkpointer_type: CheckpointerType,
        autosave: bool,
    ) -> Self {
        let event_bus = app.runtime_config().event_bus.build_event_bus();
        event_bus.listen_for_events();
        let checkpointer = Self::create_checkpointer(
            checkpointer_type,
            app.runtime_config().sqlite_db_name.clone(),
        )
        .await;
        let scheduler = Scheduler::new(app.runtime_config().concurrency_limit);
        Self {
            app: Arc::new(app),
            scheduler,
            sessions: FxHashMap::default(),
            checkpointer,
            autosave,
            event_bus,
        }
    }

    async fn create_checkpointer(
        checkpointer_type: CheckpointerType,
        sqlite_db_name: Option<String>,
    ) -> Option<Arc<dyn Checkpointer>> {
        match checkpointer_type {
            CheckpointerType::InMemory => Some(Arc::new(InMemoryCheckpointer::new())),
            #[cfg(feature = "sqlite")]
            CheckpointerType::Sqlite => {
                let db_url = std::env::var("VETFLOW_SQLITE_URL")
                    .ok()
                    .or_else(|| sqlite_db_name.map(|name| format!("sqlite://{name}")))
                    .unwrap_or_else(|| "sqlite://vetflow.db".to_string());
                match crate::runtimes::SqliteCheckpointer::connect(&db_url).await {
                    Ok(cp) => Some(Arc::new(cp) as Arc<dyn Checkpointer>),
                    Err(e) => {
                        tracing::error!(
                            url = %db_url,
                            error = %e,
                            "SqliteCheckpointer initialization failed"
                        );
                        None
                    }
                }
            }
        }
    }

    /// Initialize a session, or restore it when the store already has a
    /// checkpoint for the id.
    #[instrument(skip(self, initial_state), err)]
    pub async fn create_session(
        &mut self,
        session_id: String,
        initial_state: WorkflowState,
    ) -> Result<SessionInit, RunnerError> {
        if let Some(cp) = &self.checkpointer
            && let Some(stored) = cp.load_latest(&session_id).await?
        {
            let restored = restore_session_state(&stored);
            self.sessions.insert(session_id, restored);
            return Ok(SessionInit::Resumed {
                checkpoint_step: stored.step,
            });
        }

        let frontier = self
            .app
            .edges()
            .get(&NodeKind::Start)
            .cloned()
            .unwrap_or_default();
        if frontier.is_empty() {
            return Err(RunnerError::NoStartNodes);
        }

        let session_state = SessionState {
            state: initial_state,
            step: 0,
            frontier,
        };
        self.sessions
            .insert(session_id.clone(), session_state.clone());
        if let Some(cp) = &self.checkpointer {
            let _ = cp
                .save(Checkpoint::from_session(&session_id, &session_state))
                .await;
        }
        Ok(SessionInit::Fresh)
    }

    /// Drive the session until it suspends or reaches a terminal node.
    #[instrument(skip(self), err)]
    pub async fn run_until_settled(
        &mut self,
        session_id: &str,
    ) -> Result<RunOutcome, RunnerError> {
        self.drive(session_id, false).await
    }

    /// Deliver an external submission and continue execution.
    ///
    /// - Unknown session id: [`RunnerError::SessionNotFound`], never a
    ///   silent fresh start.
    /// - Already-terminal session: returns the terminal outcome again without
    ///   running any stage (idempotent).
    /// - Otherwise: the submission lands in the review inbox, the suspended
    ///   stage runs (its suspend flag is consumed by this call), and the run
    ///   continues to the next suspend point or terminal.
    #[instrument(skip(self, submission), err)]
    pub async fn resume_session(
        &mut self,
        session_id: &str,
        submission: ReviewSubmission,
    ) -> Result<RunOutcome, RunnerError> {
        self.ensure_loaded(session_id).await?;

        let frontier = self
            .sessions
            .get(session_id)
            .map(|s| s.frontier.clone())
            .unwrap_or_default();
        if Self::frontier_is_terminal(&frontier) {
            tracing::info!(session = %session_id, "resume on terminal session; returning stored result");
            return self.settled_outcome(session_id);
        }

        let mut session = self
            .sessions
            .remove(session_id)
            .expect("session present after ensure_loaded");
        let inject =
            NodePatch::new().with_review(ReviewPatch::new().set_pending(submission));
        self.app.apply_barrier(&mut session.state, &[], vec![inject])?;
        self.sessions.insert(session_id.to_string(), session);

        self.drive(session_id, true).await
    }

    /// Read-only introspection of a session's current state.
    pub async fn get_state(&mut self, session_id: &str) -> Result<WorkflowState, RunnerError> {
        self.ensure_loaded(session_id).await?;
        Ok(self
            .sessions
            .get(session_id)
            .expect("session present after ensure_loaded")
            .state
            .clone())
    }

    /// Drop a session from memory and the checkpoint store.
    pub async fn clear_session(&mut self, session_id: &str) -> Result<(), RunnerError> {
        self.sessions.remove(session_id);
        if let Some(cp) = &self.checkpointer {
            cp.clear(session_id).await?;
        }
        Ok(())
    }

    /// Session ids currently held in memory.
    #[must_use]
    pub fn active_sessions(&self) -> Vec<&String> {
        self.sessions.keys().collect()
    }

    /// In-memory session lookup (no checkpoint fallback).
    #[must_use]
    pub fn get_session(&self, session_id: &str) -> Option<&SessionState> {
        self.sessions.get(session_id)
    }

    /// Load the session from memory or the checkpoint store.
    async fn ensure_loaded(&mut self, session_id: &str) -> Result<(), RunnerError> {
        if self.sessions.contains_key(session_id) {
            return Ok(());
        }
        if let Some(cp) = &self.checkpointer
            && let Some(stored) = cp.load_latest(session_id).await?
        {
            self.sessions
                .insert(session_id.to_string(), restore_session_state(&stored));
            return Ok(());
        }
        Err(RunnerError::SessionNotFound {
            session_id: session_id.to_string(),
        })
    }

    fn frontier_is_terminal(frontier: &[NodeKind]) -> bool {
        frontier.is_empty() || frontier.iter().all(NodeKind::is_end)
    }

    /// Superstep loop. `consume_suspend` skips the suspend check exactly once
    /// so a resume can execute the stage it was parked before.
    async fn drive(
        &mut self,
        session_id: &str,
        mut consume_suspend: bool,
    ) -> Result<RunOutcome, RunnerError> {
        loop {
            let frontier = {
                let session =
                    self.sessions
                        .get(session_id)
                        .ok_or_else(|| RunnerError::SessionNotFound {
                            session_id: session_id.to_string(),
                        })?;
                session.frontier.clone()
            };

            if Self::frontier_is_terminal(&frontier) {
                self.checkpoint(session_id).await;
                let outcome = self.settled_outcome(session_id)?;
                self.emit_stream_end(session_id, &outcome.status);
                return Ok(outcome);
            }

            if !consume_suspend
                && let Some(node) = frontier
                    .iter()
                    .find(|n| self.app.suspend_before().contains(*n))
            {
                self.checkpoint(session_id).await;
                tracing::info!(session = %session_id, stage = %node, "suspended before stage");
                let state = self
                    .sessions
                    .get(session_id)
                    .expect("session present")
                    .state
                    .clone();
                return Ok(RunOutcome {
                    status: RunStatus::Suspended { node: node.clone() },
                    state,
                });
            }
            consume_suspend = false;

            let report = self.run_one_superstep(session_id).await?;
            tracing::debug!(
                session = %session_id,
                step = report.step,
                ran = report.ran_nodes.len(),
                updated = ?report.updated_channels,
                next = ?report.next_frontier,
                "superstep complete"
            );
            if self.autosave {
                self.checkpoint(session_id).await;
            }
        }
    }

    /// Execute exactly one superstep: schedule the frontier, join all
    /// branches, fold patches at the barrier, compute the next frontier.
    async fn run_one_superstep(&mut self, session_id: &str) -> Result<StepReport, RunnerError> {
        let mut session =
            self.sessions
                .remove(session_id)
                .ok_or_else(|| RunnerError::SessionNotFound {
                    session_id: session_id.to_string(),
                })?;

        session.step += 1;
        let step = session.step;
        let snapshot = session.state.snapshot();

        let run = self
            .scheduler
            .superstep(
                self.app.nodes(),
                session.frontier.clone(),
                snapshot,
                step,
                self.event_bus.sender(),
            )
            .await;

        let patches: Vec<NodePatch> = run.outputs.into_iter().map(|(_, patch)| patch).collect();
        let barrier = match self
            .app
            .apply_barrier(&mut session.state, &run.ran_nodes, patches)
        {
            Ok(outcome) => outcome,
            Err(e) => {
                // Keep the session inspectable even when the barrier refuses.
                self.sessions.insert(session_id.to_string(), session);
                return Err(RunnerError::Barrier(e));
            }
        };

        let (next_frontier, router_faults) =
            self.compute_next_frontier(&session, &run.ran_nodes, step);
        if !router_faults.is_empty() {
            let patch = NodePatch::new().with_errors(router_faults);
            self.app.apply_barrier(&mut session.state, &[], vec![patch])?;
        }
        session.frontier = next_frontier.clone();

        self.sessions.insert(session_id.to_string(), session);

        Ok(StepReport {
            step,
            ran_nodes: run.ran_nodes,
            skipped_nodes: run.skipped_nodes,
            updated_channels: barrier.updated_channels,
            next_frontier,
        })
    }

    /// Next frontier = unconditional successors of every ran stage, plus
    /// resolved router targets, deduplicated in discovery order. A router
    /// label with no declared target degrades that branch to `End` and
    /// reports a fault.
    fn compute_next_frontier(
        &self,
        session: &SessionState,
        ran: &[NodeKind],
        step: u64,
    ) -> (Vec<NodeKind>, Vec<ErrorEvent>) {
        let snapshot = session.state.snapshot();
        let mut next: Vec<NodeKind> = Vec::new();
        let mut faults: Vec<ErrorEvent> = Vec::new();

        for id in ran {
            let mut targets: Vec<NodeKind> =
                self.app.edges().get(id).cloned().unwrap_or_default();

            for router in self.app.routers().iter().filter(|r| r.from() == id) {
                let (label, target) = router.resolve(&snapshot);
                match target {
                    Some(target) => {
                        tracing::debug!(stage = %id, label = %label, target = %target, step, "router resolved");
                        targets.push(target);
                    }
                    None => {
                        tracing::warn!(stage = %id, label = %label, step, "router produced undeclared label; ending branch");
                        faults.push(
                            ErrorEvent::scheduler(
                                step,
                                FaultDetail::msg(format!(
                                    "router on '{id}' produced undeclared label '{label}'"
                                )),
                            )
                            .with_tag("router"),
                        );
                        targets.push(NodeKind::End);
                    }
                }
            }

            for target in targets {
                let known = match &target {
                    NodeKind::Start | NodeKind::End => true,
                    NodeKind::Stage(_) => self.app.nodes().contains_key(&target),
                };
                if !known {
                    tracing::warn!(origin = %id, target = %target, step, "frontier target not found; skipping");
                    continue;
                }
                if !next.contains(&target) {
                    next.push(target);
                }
            }
        }

        (next, faults)
    }

    /// Terminal outcome derived from state: exhausted beats done.
    fn settled_outcome(&self, session_id: &str) -> Result<RunOutcome, RunnerError> {
        let session =
            self.sessions
                .get(session_id)
                .ok_or_else(|| RunnerError::SessionNotFound {
                    session_id: session_id.to_string(),
                })?;
        let status = if session.state.review.get().exhausted {
            RunStatus::Exhausted
        } else {
            RunStatus::Done
        };
        Ok(RunOutcome {
            status,
            state: session.state.clone(),
        })
    }

    /// Persist the session's checkpoint if a store is configured.
    async fn checkpoint(&self, session_id: &str) {
        if let Some(cp) = &self.checkpointer
            && let Some(session) = self.sessions.get(session_id)
        {
            if let Err(e) = cp
                .save(Checkpoint::from_session(session_id, session))
                .await
            {
                tracing::error!(session = %session_id, error = %e, "checkpoint save failed");
            }
        }
    }

    fn emit_stream_end(&self, session_id: &str, status: &RunStatus) {
        let step = self
            .sessions
            .get(session_id)
            .map(|s| s.step)
            .unwrap_or_default();
        let _ = self.event_bus.sender().send(Event::diagnostic(
            STREAM_END_SCOPE,
            format!(
                "session={session_id} status={} step={step}",
                status.as_str()
            ),
        ));
    }
}
