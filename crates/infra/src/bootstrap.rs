//! Wiring of a single-process dispo service.
//!
//! `build_service` connects the pieces the way a deployment runs them: one
//! candidate store backing the stock handler, and a dispatch worker feeding
//! it from a material event bus.

use std::io;
use std::sync::Arc;

use tracing::info;

use dispo_candidates::StockChangedEventHandler;
use dispo_core::{Clock, SystemClock};
use dispo_events::{
    EventBus, EventEnvelope, InMemoryBusError, InMemoryEventBus, MaterialEvent,
    MaterialEventHandlerRegistry,
};

use crate::candidate_store::InMemoryCandidateStore;
use crate::config::DispoConfig;
use crate::workers::{DispatchWorker, WorkerHandle};

pub type MaterialEventBus = InMemoryEventBus<EventEnvelope<MaterialEvent>>;

const DISPATCH_WORKER_NAME: &str = "dispo-dispatch";

#[derive(Debug)]
pub struct DispoService {
    store: Arc<InMemoryCandidateStore>,
    bus: Arc<MaterialEventBus>,
    worker: WorkerHandle,
}

impl DispoService {
    pub fn store(&self) -> &Arc<InMemoryCandidateStore> {
        &self.store
    }

    pub fn bus(&self) -> &Arc<MaterialEventBus> {
        &self.bus
    }

    /// Publish `event` on the service bus, stamped with the current time.
    pub fn publish(&self, event: MaterialEvent) -> Result<(), InMemoryBusError> {
        self.bus.publish(EventEnvelope::wrap(event, SystemClock.now()))
    }

    /// Stop dispatching once everything published so far is handled, and
    /// hand back the store.
    pub fn shutdown(self) -> Arc<InMemoryCandidateStore> {
        self.worker.shutdown();
        self.store
    }
}

pub fn build_service(config: &DispoConfig) -> io::Result<DispoService> {
    let store = Arc::new(InMemoryCandidateStore::new());
    let bus = Arc::new(MaterialEventBus::new());

    let mut registry = MaterialEventHandlerRegistry::new();
    registry.register(StockChangedEventHandler::new(store.clone(), store.clone()));

    let worker = DispatchWorker::spawn(
        DISPATCH_WORKER_NAME,
        &bus,
        registry,
        config.worker_poll_interval,
    )?;

    info!(
        worker = DISPATCH_WORKER_NAME,
        poll_interval = ?config.worker_poll_interval,
        "dispo service started"
    );

    Ok(DispoService { store, bus, worker })
}
