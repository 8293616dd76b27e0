//! Stock change notifications.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dispo_core::{PInstanceId, StockId, TransactionId, WarehouseId};

use crate::descriptor::{EventDescriptor, ProductDescriptor};
use crate::event::Event;

/// Where a stock change came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockChangeDetails {
    /// Material transaction behind the change; absent for resets and manual
    /// corrections.
    #[serde(default)]
    pub transaction_id: Option<TransactionId>,
    pub stock_id: StockId,
    /// Set when the change stems from a stock reset process.
    #[serde(default)]
    pub reset_stock_pinstance_id: Option<PInstanceId>,
}

/// Event: the on-hand quantity of a product in a warehouse changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockChangedEvent {
    pub event_descriptor: EventDescriptor,
    pub product_descriptor: ProductDescriptor,
    pub warehouse_id: WarehouseId,
    #[serde(default)]
    pub change_date: Option<DateTime<Utc>>,
    pub qty_on_hand: Decimal,
    pub qty_on_hand_old: Decimal,
    pub stock_change_details: StockChangeDetails,
}

impl StockChangedEvent {
    pub const EVENT_TYPE: &'static str = "material.stock.changed";

    /// Raw change as reported by the producer; `None` if it does not fit a
    /// `Decimal`.
    pub fn qty_delta(&self) -> Option<Decimal> {
        self.qty_on_hand.checked_sub(self.qty_on_hand_old)
    }
}

impl Event for StockChangedEvent {
    fn event_type(&self) -> &'static str {
        Self::EVENT_TYPE
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.change_date.unwrap_or(self.event_descriptor.created_at)
    }
}
