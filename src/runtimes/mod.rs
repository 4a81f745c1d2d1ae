//! Workflow runtime: sessions, checkpoint persistence, and the runner.
//!
//! The runtime layer turns a compiled [`App`](crate::app::App) into resumable
//! sessions. [`WorkflowRunner`] drives supersteps to the next suspend point
//! or terminal node; [`Checkpointer`] implementations persist `(session_id)
//! -> (state, frontier)` so a suspended run survives process exit and resumes
//! from an external trigger.
//!
//! # Persistence backends
//!
//! - [`InMemoryCheckpointer`]: process lifetime only (tests, development)
//! - [`SqliteCheckpointer`]: durable, behind the `sqlite` feature
//!
//! # Usage
//!
//! ```rust,no_run
//! use vetflow::runtimes::{CheckpointerType, WorkflowRunner};
//! use vetflow::state::WorkflowState;
//! # use vetflow::app::App;
//! # async fn example(app: App) -> Result<(), Box<dyn std::error::Error>> {
//! let mut runner = WorkflowRunner::new(app, CheckpointerType::InMemory).await;
//! runner
//!     .create_session("sess-1".to_string(), WorkflowState::for_phase("needs", 3))
//!     .await?;
//! let outcome = runner.run_until_settled("sess-1").await?;
//! println!("status: {:?}", outcome.status);
//! # Ok(())
//! # }
//! ```

pub mod checkpointer;
#[cfg(feature = "sqlite")]
pub mod checkpointer_sqlite;
pub mod persistence;
pub mod runner;
pub mod runtime_config;
pub mod session;

pub use checkpointer::{
    Checkpoint, Checkpointer, CheckpointerError, CheckpointerType, InMemoryCheckpointer,
    restore_session_state,
};
#[cfg(feature = "sqlite")]
pub use checkpointer_sqlite::SqliteCheckpointer;
pub use persistence::{PersistedCheckpoint, PersistedState, PersistenceError};
pub use runner::{RunOutcome, RunStatus, RunnerError, StepReport, WorkflowRunner};
pub use runtime_config::{EventBusConfig, RuntimeConfig, SinkConfig};
pub use session::{SessionInit, SessionState};
