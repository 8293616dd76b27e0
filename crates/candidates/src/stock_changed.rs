//! Reconciles stock change notifications with the candidate ledger.
//!
//! The stock booking side reports the new on-hand quantity of a product in a
//! warehouse. The dispo keeps its own picture of that quantity as `STOCK`
//! candidates. For each notification this handler compares the two and
//! records the difference as an `INVENTORY_UP` / `INVENTORY_DOWN` candidate,
//! which the candidate change service then folds into the stock picture.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, warn};

use dispo_core::{CandidateGroupId, Clock, DomainError, SystemClock, TransactionId};
use dispo_events::{BoxError, MaterialEvent, MaterialEventHandler, StockChangedEvent};

use crate::candidate::{Candidate, CandidateStatus, CandidateType, MaterialDescriptor, TransactionDetail};
use crate::query::{CandidatesQuery, DateOperator, MaterialDescriptorQuery};
use crate::repository::{
    CandidateChangeError, CandidateChangeService, CandidateRepositoryError,
    CandidateRepositoryRetrieval,
};

#[derive(Debug, Error)]
pub enum StockChangedError {
    #[error(transparent)]
    Repository(#[from] CandidateRepositoryError),

    #[error(transparent)]
    Change(#[from] CandidateChangeError),

    #[error("could not build inventory candidate: {0}")]
    InvalidCandidate(#[from] DomainError),
}

/// Turns [`StockChangedEvent`]s into inventory candidates.
///
/// Inconsistent notifications are logged and skipped; only collaborator
/// failures are returned as errors. That covers negative stock without any
/// baseline and notifications without an actual change. Quantities whose
/// difference does not fit a `Decimal` are skipped the same way.
#[derive(Debug)]
pub struct StockChangedEventHandler<R, C, K = SystemClock> {
    candidate_repository: R,
    candidate_change_service: C,
    clock: K,
}

impl<R, C> StockChangedEventHandler<R, C, SystemClock>
where
    R: CandidateRepositoryRetrieval,
    C: CandidateChangeService,
{
    pub fn new(candidate_repository: R, candidate_change_service: C) -> Self {
        Self::with_clock(candidate_repository, candidate_change_service, SystemClock)
    }
}

impl<R, C, K> StockChangedEventHandler<R, C, K>
where
    R: CandidateRepositoryRetrieval,
    C: CandidateChangeService,
    K: Clock,
{
    pub fn with_clock(candidate_repository: R, candidate_change_service: C, clock: K) -> Self {
        Self {
            candidate_repository,
            candidate_change_service,
            clock,
        }
    }

    pub fn handle(&self, event: &StockChangedEvent) -> Result<(), StockChangedError> {
        let Some(transaction_quantity) = event.qty_delta() else {
            warn!(
                product_id = %event.product_descriptor.product_id,
                warehouse_id = %event.warehouse_id,
                qty_on_hand = %event.qty_on_hand,
                qty_on_hand_old = %event.qty_on_hand_old,
                "reported stock change is out of range; ignoring event"
            );
            return Ok(());
        };

        let date = self.compute_date(event);
        let material_descriptor_query = create_material_descriptor_query(event, date);

        let stock_query = CandidatesQuery {
            candidate_type: Some(CandidateType::Stock),
            material_descriptor_query: Some(material_descriptor_query.clone()),
            match_exact_storage_attributes_key: true,
            ..Default::default()
        };

        let latest_stock_record = self.candidate_repository.retrieve_latest_match(&stock_query)?;

        let (candidate_type, quantity, group_id) = match latest_stock_record {
            None => {
                let Some(qty_on_hand) = extract_quantity_if_not_negative(event) else {
                    return Ok(());
                };
                (CandidateType::InventoryUp, qty_on_hand, CandidateGroupId::NONE)
            }
            Some(latest_stock_record) => {
                // Work with the delta to the latest stock record, so the change
                // service can apply it like any other inventory movement.
                let Some(qty_difference) = event.qty_on_hand.checked_sub(latest_stock_record.quantity())
                else {
                    warn!(
                        product_id = %event.product_descriptor.product_id,
                        warehouse_id = %event.warehouse_id,
                        qty_on_hand = %event.qty_on_hand,
                        stock_qty = %latest_stock_record.quantity(),
                        "difference to stock record is out of range; ignoring event"
                    );
                    return Ok(());
                };

                let Some(candidate_type) = compute_candidate_type(event, qty_difference) else {
                    return Ok(());
                };

                let group_id = self.retrieve_group_id_or_none(
                    &material_descriptor_query,
                    candidate_type,
                    event.stock_change_details.transaction_id,
                )?;

                // Direction is carried by the type; the quantity stays positive.
                (candidate_type, qty_difference.abs(), group_id)
            }
        };

        let candidate = Candidate::builder_for_event_descriptor(&event.event_descriptor)
            .candidate_type(candidate_type)
            .status(CandidateStatus::DocCompleted)
            .group_id(group_id)
            .material_descriptor(create_material_descriptor(event, date, quantity))
            .transaction_detail(create_transaction_detail(event, transaction_quantity))
            .build()?;

        debug!(
            product_id = %event.product_descriptor.product_id,
            warehouse_id = %event.warehouse_id,
            candidate_type = ?candidate_type,
            %quantity,
            group_id = %group_id,
            "emitting inventory candidate"
        );

        self.candidate_change_service.on_candidate_new_or_change(candidate)?;
        Ok(())
    }

    fn compute_date(&self, event: &StockChangedEvent) -> DateTime<Utc> {
        event.change_date.unwrap_or_else(|| self.clock.now())
    }

    /// Group of a preceding `INVENTORY_DOWN` of the same transaction.
    ///
    /// A storage attribute change is booked as a "down" of the old attributes
    /// followed by an "up" of the new ones; both must end up in one group.
    fn retrieve_group_id_or_none(
        &self,
        material_descriptor_query: &MaterialDescriptorQuery,
        candidate_type: CandidateType,
        transaction_id: Option<TransactionId>,
    ) -> Result<CandidateGroupId, CandidateRepositoryError> {
        let Some(transaction_id) = transaction_id else {
            return Ok(CandidateGroupId::NONE);
        };
        if candidate_type != CandidateType::InventoryUp {
            return Ok(CandidateGroupId::NONE);
        }

        let inventory_query = CandidatesQuery {
            candidate_type: Some(CandidateType::InventoryDown),
            material_descriptor_query: Some(material_descriptor_query.clone()),
            match_exact_storage_attributes_key: true,
            transaction_detail: Some(TransactionDetail::for_query(transaction_id)),
            ..Default::default()
        };

        let preceding = self.candidate_repository.retrieve_latest_match(&inventory_query)?;
        Ok(preceding.map(|c| c.group_id).unwrap_or(CandidateGroupId::NONE))
    }
}

impl<R, C, K> MaterialEventHandler for StockChangedEventHandler<R, C, K>
where
    R: CandidateRepositoryRetrieval,
    C: CandidateChangeService,
    K: Clock,
{
    fn name(&self) -> &'static str {
        "StockChangedEventHandler"
    }

    fn handled_event_types(&self) -> &'static [&'static str] {
        &[StockChangedEvent::EVENT_TYPE]
    }

    fn handle_event(&self, event: &MaterialEvent) -> Result<(), BoxError> {
        match event {
            MaterialEvent::StockChanged(event) => self.handle(event).map_err(Into::into),
        }
    }
}

fn extract_quantity_if_not_negative(event: &StockChangedEvent) -> Option<Decimal> {
    if event.qty_on_hand < Decimal::ZERO {
        warn!(
            product_id = %event.product_descriptor.product_id,
            warehouse_id = %event.warehouse_id,
            qty_on_hand = %event.qty_on_hand,
            "stock out of sync: negative on-hand quantity but no stock record to subtract from"
        );
        return None;
    }
    Some(event.qty_on_hand)
}

fn compute_candidate_type(event: &StockChangedEvent, qty_difference: Decimal) -> Option<CandidateType> {
    if qty_difference.is_zero() {
        info!(
            product_id = %event.product_descriptor.product_id,
            warehouse_id = %event.warehouse_id,
            "on-hand quantity is what was already expected; nothing to do"
        );
        return None;
    }
    if qty_difference > Decimal::ZERO {
        Some(CandidateType::InventoryUp)
    } else {
        Some(CandidateType::InventoryDown)
    }
}

fn create_material_descriptor_query(event: &StockChangedEvent, date: DateTime<Utc>) -> MaterialDescriptorQuery {
    MaterialDescriptorQuery {
        product_id: event.product_descriptor.product_id,
        storage_attributes_key: event.product_descriptor.storage_attributes_key.clone(),
        warehouse_id: Some(event.warehouse_id),
        customer_id: None,
        date,
        date_operator: DateOperator::BeforeOrAt,
    }
}

fn create_material_descriptor(event: &StockChangedEvent, date: DateTime<Utc>, quantity: Decimal) -> MaterialDescriptor {
    MaterialDescriptor {
        product_descriptor: event.product_descriptor.clone(),
        warehouse_id: event.warehouse_id,
        customer_id: None,
        date,
        quantity,
    }
}

/// The booking as reported: its delta is `qty_on_hand - qty_on_hand_old`,
/// independent of what the dispo believed the stock to be.
fn create_transaction_detail(event: &StockChangedEvent, quantity: Decimal) -> TransactionDetail {
    let details = &event.stock_change_details;
    TransactionDetail {
        quantity,
        attribute_set_instance_id: event.product_descriptor.attribute_set_instance_id,
        storage_attributes_key: Some(event.product_descriptor.storage_attributes_key.clone()),
        stock_id: Some(details.stock_id),
        transaction_id: details.transaction_id,
        reset_stock_pinstance_id: details.reset_stock_pinstance_id,
        complete: true,
    }
}
