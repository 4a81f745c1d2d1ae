use std::sync::{Arc, Mutex};
use tokio::{sync::oneshot, task};

use super::event::Event;
use super::sink::{EventSink, StdOutSink};

/// Receives events from producers and broadcasts them to every sink.
pub struct EventBus {
    sinks: Arc<Mutex<Vec<Box<dyn EventSink>>>>,
    event_channel: (flume::Sender<Event>, flume::Receiver<Event>),
    listener: Arc<Mutex<Option<ListenerState>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_sink(StdOutSink)
    }
}

impl EventBus {
    /// Create an EventBus with a single sink.
    pub fn with_sink<T>(sink: T) -> Self
    where
        T: EventSink + 'static,
    {
        Self::with_sinks(vec![Box::new(sink)])
    }

    /// Create an EventBus with multiple sinks.
    #[must_use]
    pub fn with_sinks(sinks: Vec<Box<dyn EventSink>>) -> Self {
        Self {
            sinks: Arc::new(Mutex::new(sinks)),
            event_channel: flume::unbounded(),
            listener: Arc::new(Mutex::new(None)),
        }
    }

    /// Dynamically add a sink (e.g., a per-session channel).
    pub fn add_sink<T: EventSink + 'static>(&self, sink: T) {
        self.sinks.lock().unwrap().push(Box::new(sink));
    }

    /// Clone of the sender side so producers can emit events.
    #[must_use]
    pub fn sender(&self) -> flume::Sender<Event> {
        self.event_channel.0.clone()
    }

    /// Spawn the background task that drains the channel into the sinks.
    /// Idempotent: calling multiple times has no effect.
    pub fn listen_for_events(&self) {
        let mut guard = self.listener.lock().expect("listener poisoned");
        if guard.is_some() {
            return;
        }

        let receiver = self.event_channel.1.clone();
        let sinks = self.sinks.clone();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = task::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    recv = receiver.recv_async() => match recv {
                        Err(_) => break,
                        Ok(event) => {
                            let mut sinks_guard = sinks.lock().unwrap();
                            for sink in sinks_guard.iter_mut() {
                                if let Err(e) = sink.handle(&event) {
                                    tracing::warn!(error = %e, "event sink write failed");
                                }
                            }
                        }
                    }
                }
            }
        });

        *guard = Some(ListenerState {
            shutdown_tx,
            handle,
        });
    }

    /// Stop the background listener task.
    pub async fn stop_listener(&self) {
        let state = {
            let mut guard = self.listener.lock().expect("listener poisoned");
            guard.take()
        };
        if let Some(state) = state {
            let _ = state.shutdown_tx.send(());
            let _ = state.handle.await;
        }
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.listener.lock()
            && let Some(state) = guard.take()
        {
            let _ = state.shutdown_tx.send(());
            state.handle.abort();
        }
    }
}

struct ListenerState {
    shutdown_tx: oneshot::Sender<()>,
    handle: task::JoinHandle<()>,
}
