use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dispo_core::{
    AttributeSetInstanceId, BPartnerId, CandidateGroupId, CandidateId, ClientId, DomainError,
    DomainResult, OrgId, PInstanceId, ProductId, StockId, TransactionId, ValueObject, WarehouseId,
};
use dispo_events::{EventDescriptor, ProductDescriptor, StorageAttributesKey};

/// What a candidate stands for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateType {
    Demand,
    Supply,
    /// Known (or projected) on-hand quantity; the baseline deltas apply to.
    Stock,
    StockUp,
    UnrelatedIncrease,
    UnrelatedDecrease,
    /// On-hand went up outside of any planned supply.
    InventoryUp,
    /// On-hand went down outside of any planned demand.
    InventoryDown,
}

impl CandidateType {
    pub fn is_inventory(self) -> bool {
        matches!(self, CandidateType::InventoryUp | CandidateType::InventoryDown)
    }

    /// `+1` for types adding to stock, `-1` for types taking from it, `0` for
    /// `Stock` itself.
    pub fn stock_signum(self) -> i32 {
        match self {
            CandidateType::Supply
            | CandidateType::StockUp
            | CandidateType::UnrelatedIncrease
            | CandidateType::InventoryUp => 1,
            CandidateType::Demand
            | CandidateType::UnrelatedDecrease
            | CandidateType::InventoryDown => -1,
            CandidateType::Stock => 0,
        }
    }
}

/// Lifecycle of the document behind a candidate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateStatus {
    DocCreated,
    DocCompleted,
    DocClosed,
    DocVoided,
    #[default]
    Unknown,
}

/// Product, place and time a candidate refers to, with its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialDescriptor {
    pub product_descriptor: ProductDescriptor,
    pub warehouse_id: WarehouseId,
    /// Customer the quantity is reserved for; `None` means unreserved.
    #[serde(default)]
    pub customer_id: Option<BPartnerId>,
    pub date: DateTime<Utc>,
    pub quantity: Decimal,
}

impl MaterialDescriptor {
    pub fn product_id(&self) -> ProductId {
        self.product_descriptor.product_id
    }

    pub fn storage_attributes_key(&self) -> &StorageAttributesKey {
        &self.product_descriptor.storage_attributes_key
    }

    pub fn with_quantity(&self, quantity: Decimal) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }
}

impl ValueObject for MaterialDescriptor {}

/// The stock booking a candidate was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionDetail {
    /// Quantity booked by the transaction (signed).
    pub quantity: Decimal,
    #[serde(default)]
    pub attribute_set_instance_id: AttributeSetInstanceId,
    #[serde(default)]
    pub storage_attributes_key: Option<StorageAttributesKey>,
    #[serde(default)]
    pub stock_id: Option<StockId>,
    #[serde(default)]
    pub transaction_id: Option<TransactionId>,
    #[serde(default)]
    pub reset_stock_pinstance_id: Option<PInstanceId>,
    /// Whether the booking is final.
    pub complete: bool,
}

impl TransactionDetail {
    /// Detail usable as a query filter: only the transaction id is compared.
    pub fn for_query(transaction_id: TransactionId) -> Self {
        Self {
            transaction_id: Some(transaction_id),
            ..Self::default()
        }
    }
}

impl ValueObject for TransactionDetail {}

/// A forecast/ledger entry of the material dispo.
///
/// Candidates are never edited by the handlers that create them; a change in
/// stock produces a new candidate and the store supersedes older ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Assigned by the store; `None` until persisted.
    #[serde(default)]
    pub id: Option<CandidateId>,
    #[serde(default)]
    pub client_id: Option<ClientId>,
    #[serde(default)]
    pub org_id: Option<OrgId>,
    #[serde(rename = "type")]
    pub candidate_type: CandidateType,
    #[serde(default)]
    pub status: CandidateStatus,
    #[serde(default)]
    pub group_id: CandidateGroupId,
    /// Ordering among candidates sharing a date; assigned by the store.
    #[serde(default)]
    pub seq_no: i32,
    pub material_descriptor: MaterialDescriptor,
    #[serde(default)]
    pub transaction_details: Vec<TransactionDetail>,
}

impl Candidate {
    /// Start a candidate on behalf of the client/org an event came from.
    pub fn builder_for_event_descriptor(descriptor: &EventDescriptor) -> CandidateBuilder {
        CandidateBuilder {
            client_id: descriptor.client_id,
            org_id: descriptor.org_id,
            ..CandidateBuilder::default()
        }
    }

    pub fn quantity(&self) -> Decimal {
        self.material_descriptor.quantity
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.material_descriptor.date
    }

    pub fn product_id(&self) -> ProductId {
        self.material_descriptor.product_id()
    }

    pub fn warehouse_id(&self) -> WarehouseId {
        self.material_descriptor.warehouse_id
    }

    /// Effect of this candidate on stock: its quantity signed by type.
    pub fn stock_delta(&self) -> Decimal {
        self.quantity() * Decimal::from(self.candidate_type.stock_signum())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CandidateBuilder {
    client_id: Option<ClientId>,
    org_id: Option<OrgId>,
    candidate_type: Option<CandidateType>,
    status: CandidateStatus,
    group_id: CandidateGroupId,
    material_descriptor: Option<MaterialDescriptor>,
    transaction_details: Vec<TransactionDetail>,
}

impl CandidateBuilder {
    pub fn candidate_type(mut self, candidate_type: CandidateType) -> Self {
        self.candidate_type = Some(candidate_type);
        self
    }

    pub fn status(mut self, status: CandidateStatus) -> Self {
        self.status = status;
        self
    }

    pub fn group_id(mut self, group_id: CandidateGroupId) -> Self {
        self.group_id = group_id;
        self
    }

    pub fn material_descriptor(mut self, material_descriptor: MaterialDescriptor) -> Self {
        self.material_descriptor = Some(material_descriptor);
        self
    }

    pub fn transaction_detail(mut self, transaction_detail: TransactionDetail) -> Self {
        self.transaction_details.push(transaction_detail);
        self
    }

    pub fn build(self) -> DomainResult<Candidate> {
        let candidate_type = self
            .candidate_type
            .ok_or_else(|| DomainError::validation("candidate type is required"))?;
        let material_descriptor = self
            .material_descriptor
            .ok_or_else(|| DomainError::validation("material descriptor is required"))?;

        // Direction of inventory candidates is carried by the type.
        if candidate_type.is_inventory() && material_descriptor.quantity < Decimal::ZERO {
            return Err(DomainError::invariant(format!(
                "{candidate_type:?} candidate needs a non-negative quantity, got {}",
                material_descriptor.quantity
            )));
        }

        Ok(Candidate {
            id: None,
            client_id: self.client_id,
            org_id: self.org_id,
            candidate_type,
            status: self.status,
            group_id: self.group_id,
            seq_no: 0,
            material_descriptor,
            transaction_details: self.transaction_details,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn descriptor(quantity: Decimal) -> MaterialDescriptor {
        MaterialDescriptor {
            product_descriptor: ProductDescriptor::for_product(ProductId::of_repo_id(4).unwrap()),
            warehouse_id: WarehouseId::of_repo_id(2).unwrap(),
            customer_id: None,
            date: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            quantity,
        }
    }

    #[test]
    fn builder_copies_client_and_org_from_event_descriptor() {
        let event_descriptor = EventDescriptor::new(
            ClientId::of_repo_id_or_none(1),
            OrgId::of_repo_id_or_none(1000000),
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
        );

        let candidate = Candidate::builder_for_event_descriptor(&event_descriptor)
            .candidate_type(CandidateType::InventoryUp)
            .status(CandidateStatus::DocCompleted)
            .material_descriptor(descriptor(Decimal::TEN))
            .build()
            .unwrap();

        assert_eq!(candidate.client_id, event_descriptor.client_id);
        assert_eq!(candidate.org_id, event_descriptor.org_id);
        assert_eq!(candidate.id, None);
        assert!(candidate.group_id.is_none());
        assert_eq!(candidate.quantity(), Decimal::TEN);
    }

    #[test]
    fn inventory_candidates_reject_negative_quantities() {
        let err = CandidateBuilder::default()
            .candidate_type(CandidateType::InventoryDown)
            .material_descriptor(descriptor(Decimal::NEGATIVE_ONE))
            .build()
            .unwrap_err();

        match err {
            DomainError::InvariantViolation(msg) if msg.contains("non-negative") => {}
            other => panic!("expected invariant violation, got {other:?}"),
        }
    }

    #[test]
    fn type_and_descriptor_are_required() {
        assert!(CandidateBuilder::default().build().is_err());
        assert!(
            CandidateBuilder::default()
                .candidate_type(CandidateType::Stock)
                .build()
                .is_err()
        );
    }

    #[test]
    fn stock_delta_is_signed_by_type() {
        let mut candidate = CandidateBuilder::default()
            .candidate_type(CandidateType::InventoryDown)
            .material_descriptor(descriptor(Decimal::new(3, 0)))
            .build()
            .unwrap();
        assert_eq!(candidate.stock_delta(), Decimal::new(-3, 0));

        candidate.candidate_type = CandidateType::Supply;
        assert_eq!(candidate.stock_delta(), Decimal::new(3, 0));

        candidate.candidate_type = CandidateType::Stock;
        assert_eq!(candidate.stock_delta(), Decimal::ZERO);
    }
}
