//! Runtime configuration: session ids, persistence choice, concurrency
//! bound, and event bus wiring.

use super::CheckpointerType;
use crate::event_bus::{EventBus, EventSink, MemorySink, StdOutSink};
use crate::utils::id_generator::IdGenerator;

/// Configuration carried by a compiled app into its runner.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Explicit session id; a fresh opaque id is generated when absent.
    pub session_id: Option<String>,
    /// Checkpoint backend to build; defaults to in-memory.
    pub checkpointer: Option<CheckpointerType>,
    /// SQLite database file for the durable backend.
    pub sqlite_db_name: Option<String>,
    /// Bound on concurrently-running stages within one superstep.
    pub concurrency_limit: usize,
    /// Event bus sink configuration.
    pub event_bus: EventBusConfig,
}

/// Matches the fan-out width of the source collection stage.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 3;

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            session_id: None,
            checkpointer: Some(CheckpointerType::InMemory),
            sqlite_db_name: Self::resolve_sqlite_db_name(None),
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            event_bus: EventBusConfig::default(),
        }
    }
}

impl RuntimeConfig {
    fn resolve_sqlite_db_name(provided: Option<String>) -> Option<String> {
        if provided.is_some() {
            return provided;
        }
        dotenvy::dotenv().ok();
        Some(std::env::var("VETFLOW_SQLITE_DB").unwrap_or_else(|_| "vetflow.db".to_string()))
    }

    pub fn new(
        session_id: Option<String>,
        checkpointer: Option<CheckpointerType>,
        sqlite_db_name: Option<String>,
    ) -> Self {
        Self {
            session_id,
            checkpointer,
            sqlite_db_name: Self::resolve_sqlite_db_name(sqlite_db_name),
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            event_bus: EventBusConfig::default(),
        }
    }

    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[must_use]
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit.max(1);
        self
    }

    #[must_use]
    pub fn with_event_bus(mut self, event_bus: EventBusConfig) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// The session id to use for the next run: the configured one, or a
    /// freshly generated opaque id.
    #[must_use]
    pub fn next_session_id(&self) -> String {
        self.session_id
            .clone()
            .unwrap_or_else(|| IdGenerator::new().generate_run_id())
    }
}

/// Declarative sink choice, resolved to a live sink at bus construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkConfig {
    StdOut,
    Memory,
}

/// Event bus wiring carried in the runtime configuration.
#[derive(Clone, Debug)]
pub struct EventBusConfig {
    pub sinks: Vec<SinkConfig>,
}

impl EventBusConfig {
    #[must_use]
    pub fn with_stdout_only() -> Self {
        Self {
            sinks: vec![SinkConfig::StdOut],
        }
    }

    #[must_use]
    pub fn with_memory_sink() -> Self {
        Self {
            sinks: vec![SinkConfig::StdOut, SinkConfig::Memory],
        }
    }

    /// Build a live [`EventBus`] from this configuration.
    #[must_use]
    pub fn build_event_bus(&self) -> EventBus {
        let sinks: Vec<Box<dyn EventSink>> = self
            .sinks
            .iter()
            .map(|sink| match sink {
                SinkConfig::StdOut => Box::new(StdOutSink) as Box<dyn EventSink>,
                SinkConfig::Memory => Box::new(MemorySink::new()) as Box<dyn EventSink>,
            })
            .collect();
        EventBus::with_sinks(sinks)
    }
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self::with_stdout_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_session_id_prefers_configured() {
        let config = RuntimeConfig::default().with_session_id("fixed");
        assert_eq!(config.next_session_id(), "fixed");

        let generated = RuntimeConfig::default().next_session_id();
        assert!(generated.starts_with("run-"));
    }

    #[test]
    fn test_concurrency_limit_floor() {
        let config = RuntimeConfig::default().with_concurrency_limit(0);
        assert_eq!(config.concurrency_limit, 1);
    }
}
