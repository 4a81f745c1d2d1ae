use std::io::{self, Result as IoResult, Write};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use super::event::Event;

/// An output target that consumes full event objects.
pub trait EventSink: Sync + Send {
    /// Handle one structured event; the sink decides formatting.
    fn handle(&mut self, event: &Event) -> IoResult<()>;
}

/// Line-per-event stdout sink.
#[derive(Default)]
pub struct StdOutSink;

impl EventSink for StdOutSink {
    fn handle(&mut self, event: &Event) -> IoResult<()> {
        let mut handle = io::stdout();
        writeln!(handle, "{event}")?;
        handle.flush()
    }
}

/// In-memory sink for tests and snapshots.
#[derive(Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<Event>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured events.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Event> {
        self.entries.lock().unwrap().clone()
    }

    /// Clear captured events.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl EventSink for MemorySink {
    fn handle(&mut self, event: &Event) -> IoResult<()> {
        self.entries.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Forwards events to a tokio mpsc channel for async consumers.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelSink {
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn handle(&mut self, event: &Event) -> IoResult<()> {
        self.tx
            .send(event.clone())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "channel receiver dropped"))
    }
}
