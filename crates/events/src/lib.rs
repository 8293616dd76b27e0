//! Material events and the mechanics to deliver them to handlers.

pub mod bus;
pub mod descriptor;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod in_memory_bus;
pub mod registry;
pub mod stock;

pub use bus::{EventBus, Subscription};
pub use descriptor::{EventDescriptor, ProductDescriptor, StorageAttributesKey};
pub use envelope::EventEnvelope;
pub use event::{Event, MaterialEvent};
pub use handler::{BoxError, MaterialEventHandler};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use registry::{DispatchError, MaterialEventHandlerRegistry};
pub use stock::{StockChangeDetails, StockChangedEvent};
