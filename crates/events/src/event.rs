use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stock::StockChangedEvent;

/// A domain-agnostic event.
///
/// Events are **immutable** facts, **versioned** for schema evolution.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "material.stock.changed").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}

/// Every material event the dispo service consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MaterialEvent {
    #[serde(rename = "StockChangedEvent")]
    StockChanged(StockChangedEvent),
}

impl Event for MaterialEvent {
    fn event_type(&self) -> &'static str {
        match self {
            MaterialEvent::StockChanged(e) => e.event_type(),
        }
    }

    fn version(&self) -> u32 {
        match self {
            MaterialEvent::StockChanged(e) => e.version(),
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            MaterialEvent::StockChanged(e) => e.occurred_at(),
        }
    }
}

impl From<StockChangedEvent> for MaterialEvent {
    fn from(value: StockChangedEvent) -> Self {
        MaterialEvent::StockChanged(value)
    }
}
