use std::io;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{info, trace, warn};

use dispo_events::{EventBus, EventEnvelope, MaterialEvent, MaterialEventHandlerRegistry, Subscription};

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    ///
    /// Envelopes published before this call are still dispatched; later ones
    /// may not be.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Feeds material events from a bus into a handler registry.
///
/// - Subscribes before the thread starts, so nothing published after
///   `spawn` returns is missed
/// - Envelopes are handled one at a time, in arrival order
/// - A failing handler is logged and the worker moves on to the next event
#[derive(Debug)]
pub struct DispatchWorker;

impl DispatchWorker {
    pub fn spawn<B>(
        name: &'static str,
        bus: &B,
        registry: MaterialEventHandlerRegistry,
        poll_interval: Duration,
    ) -> io::Result<WorkerHandle>
    where
        B: EventBus<EventEnvelope<MaterialEvent>> + ?Sized,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub = bus.subscribe();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, sub, shutdown_rx, &registry, poll_interval))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop(
    name: &'static str,
    sub: Subscription<EventEnvelope<MaterialEvent>>,
    shutdown_rx: mpsc::Receiver<()>,
    registry: &MaterialEventHandlerRegistry,
    tick: Duration,
) {
    info!(worker = name, handlers = registry.len(), "dispatch worker started");

    loop {
        if shutdown_rx.try_recv().is_ok() {
            let mut drained = 0;
            while let Ok(envelope) = sub.try_recv() {
                dispatch(name, registry, &envelope);
                drained += 1;
            }
            trace!(worker = name, drained, "drained queued envelopes");
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(envelope) => dispatch(name, registry, &envelope),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    info!(worker = name, "dispatch worker stopped");
}

fn dispatch(name: &'static str, registry: &MaterialEventHandlerRegistry, envelope: &EventEnvelope<MaterialEvent>) {
    match registry.dispatch(envelope.payload()) {
        Ok(handled) => {
            trace!(worker = name, event_id = %envelope.event_id(), handled, "dispatched");
        }
        Err(err) => {
            warn!(
                worker = name,
                event_id = %envelope.event_id(),
                event_type = envelope.event_type(),
                error = %err,
                "material event handler failed"
            );
        }
    }
}
