//! Structured observability events with pluggable sinks.
//!
//! Nodes and the runner emit [`Event`]s through a flume channel; a background
//! listener fans them out to the configured [`EventSink`]s. Events are
//! observability only; run-relevant narration also lands on the state's log
//! channel so correctness never depends on console output.

pub mod bus;
pub mod event;
pub mod sink;

pub use bus::EventBus;
pub use event::{DiagnosticEvent, Event, NodeEvent, STREAM_END_SCOPE};
pub use sink::{ChannelSink, EventSink, MemorySink, StdOutSink};
