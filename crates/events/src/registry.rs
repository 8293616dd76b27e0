//! Routes material events to the handlers registered for their type.

use thiserror::Error;
use tracing::{debug, trace};

use crate::event::{Event, MaterialEvent};
use crate::handler::{BoxError, MaterialEventHandler};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("handler {handler} failed on {event_type}: {source}")]
    HandlerFailed {
        handler: &'static str,
        event_type: &'static str,
        #[source]
        source: BoxError,
    },
}

/// Set of handlers, dispatched to in registration order.
#[derive(Default)]
pub struct MaterialEventHandlerRegistry {
    handlers: Vec<Box<dyn MaterialEventHandler>>,
}

impl MaterialEventHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: impl MaterialEventHandler + 'static) -> &mut Self {
        debug!(
            handler = handler.name(),
            event_types = ?handler.handled_event_types(),
            "registered material event handler"
        );
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Hand `event` to every handler declaring its type.
    ///
    /// Stops at the first failing handler. Returns how many handlers ran
    /// successfully; `0` means nobody is interested in this event type.
    pub fn dispatch(&self, event: &MaterialEvent) -> Result<usize, DispatchError> {
        let event_type = event.event_type();
        let mut handled = 0;

        for handler in self
            .handlers
            .iter()
            .filter(|h| h.handled_event_types().contains(&event_type))
        {
            trace!(handler = handler.name(), event_type, "dispatching material event");
            handler
                .handle_event(event)
                .map_err(|source| DispatchError::HandlerFailed {
                    handler: handler.name(),
                    event_type,
                    source,
                })?;
            handled += 1;
        }

        if handled == 0 {
            debug!(event_type, "no handler registered for material event");
        }

        Ok(handled)
    }
}

impl core::fmt::Debug for MaterialEventHandlerRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|h| h.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use dispo_core::{ProductId, StockId, WarehouseId};

    use super::*;
    use crate::descriptor::{EventDescriptor, ProductDescriptor};
    use crate::stock::{StockChangeDetails, StockChangedEvent};

    struct Counting {
        types: &'static [&'static str],
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl MaterialEventHandler for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn handled_event_types(&self) -> &'static [&'static str] {
            self.types
        }

        fn handle_event(&self, _event: &MaterialEvent) -> Result<(), BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err("boom".into());
            }
            Ok(())
        }
    }

    fn stock_changed() -> MaterialEvent {
        MaterialEvent::StockChanged(StockChangedEvent {
            event_descriptor: EventDescriptor::new(
                None,
                None,
                Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap(),
            ),
            product_descriptor: ProductDescriptor::for_product(ProductId::of_repo_id(1).unwrap()),
            warehouse_id: WarehouseId::of_repo_id(1).unwrap(),
            change_date: None,
            qty_on_hand: Decimal::ONE,
            qty_on_hand_old: Decimal::ZERO,
            stock_change_details: StockChangeDetails {
                transaction_id: None,
                stock_id: StockId::of_repo_id(1).unwrap(),
                reset_stock_pinstance_id: None,
            },
        })
    }

    #[test]
    fn routes_only_to_handlers_of_the_event_type() {
        let interested = Arc::new(AtomicUsize::new(0));
        let other = Arc::new(AtomicUsize::new(0));

        let mut registry = MaterialEventHandlerRegistry::new();
        registry
            .register(Counting {
                types: &[StockChangedEvent::EVENT_TYPE],
                calls: interested.clone(),
                fail: false,
            })
            .register(Counting {
                types: &["material.shipment.created"],
                calls: other.clone(),
                fail: false,
            });

        assert_eq!(registry.dispatch(&stock_changed()).unwrap(), 1);
        assert_eq!(interested.load(Ordering::SeqCst), 1);
        assert_eq!(other.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn first_failure_stops_dispatch() {
        let second = Arc::new(AtomicUsize::new(0));

        let mut registry = MaterialEventHandlerRegistry::new();
        registry
            .register(Counting {
                types: &[StockChangedEvent::EVENT_TYPE],
                calls: Arc::new(AtomicUsize::new(0)),
                fail: true,
            })
            .register(Counting {
                types: &[StockChangedEvent::EVENT_TYPE],
                calls: second.clone(),
                fail: false,
            });

        let err = registry.dispatch(&stock_changed()).unwrap_err();
        match err {
            DispatchError::HandlerFailed { handler, event_type, .. } => {
                assert_eq!(handler, "counting");
                assert_eq!(event_type, StockChangedEvent::EVENT_TYPE);
            }
        }
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unhandled_event_types_are_not_an_error() {
        let registry = MaterialEventHandlerRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.dispatch(&stock_changed()).unwrap(), 0);
    }
}
