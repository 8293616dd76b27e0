//! Infrastructure layer: candidate storage, configuration, event dispatch
//! workers and the wiring of a single-process service.

pub mod bootstrap;
pub mod candidate_store;
pub mod config;
pub mod workers;


pub use bootstrap::{DispoService, MaterialEventBus, build_service};
pub use candidate_store::InMemoryCandidateStore;
pub use config::{ConfigError, DispoConfig};
pub use workers::{DispatchWorker, WorkerHandle};
