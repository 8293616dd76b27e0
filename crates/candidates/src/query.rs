//! Candidate lookups.
//!
//! Queries are plain values; [`CandidatesQuery::matches`] is the reference
//! predicate in-memory stores filter with, and [`compare_recency`] decides
//! which of several matches is the "latest".

use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dispo_core::{BPartnerId, CandidateGroupId, ProductId, ValueObject, WarehouseId};
use dispo_events::StorageAttributesKey;

use crate::candidate::{Candidate, CandidateType, TransactionDetail};

/// How a candidate's date is compared to the query date.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateOperator {
    BeforeOrAt,
    At,
    AtOrAfter,
}

impl DateOperator {
    pub fn accepts(self, candidate_date: DateTime<Utc>, query_date: DateTime<Utc>) -> bool {
        match self {
            DateOperator::BeforeOrAt => candidate_date <= query_date,
            DateOperator::At => candidate_date == query_date,
            DateOperator::AtOrAfter => candidate_date >= query_date,
        }
    }
}

/// Filter on the material descriptor of candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialDescriptorQuery {
    pub product_id: ProductId,
    pub storage_attributes_key: StorageAttributesKey,
    /// `None` matches every warehouse.
    pub warehouse_id: Option<WarehouseId>,
    /// `None` matches every customer, reserved or not.
    pub customer_id: Option<BPartnerId>,
    pub date: DateTime<Utc>,
    pub date_operator: DateOperator,
}

impl ValueObject for MaterialDescriptorQuery {}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CandidatesQuery {
    pub candidate_type: Option<CandidateType>,
    pub material_descriptor_query: Option<MaterialDescriptorQuery>,
    /// Compare storage attribute keys for equality instead of by parts.
    pub match_exact_storage_attributes_key: bool,
    /// Only the transaction id of this detail is compared.
    pub transaction_detail: Option<TransactionDetail>,
    pub group_id: Option<CandidateGroupId>,
}

impl CandidatesQuery {
    pub fn matches(&self, candidate: &Candidate) -> bool {
        if let Some(candidate_type) = self.candidate_type {
            if candidate.candidate_type != candidate_type {
                return false;
            }
        }

        if let Some(group_id) = self.group_id {
            if candidate.group_id != group_id {
                return false;
            }
        }

        if let Some(query) = &self.material_descriptor_query {
            if !self.matches_material_descriptor(query, candidate) {
                return false;
            }
        }

        if let Some(transaction_id) = self
            .transaction_detail
            .as_ref()
            .and_then(|detail| detail.transaction_id)
        {
            let has_transaction = candidate
                .transaction_details
                .iter()
                .any(|detail| detail.transaction_id == Some(transaction_id));
            if !has_transaction {
                return false;
            }
        }

        true
    }

    fn matches_material_descriptor(&self, query: &MaterialDescriptorQuery, candidate: &Candidate) -> bool {
        let descriptor = &candidate.material_descriptor;

        if descriptor.product_id() != query.product_id {
            return false;
        }
        if query.warehouse_id.is_some_and(|w| w != descriptor.warehouse_id) {
            return false;
        }
        if query.customer_id.is_some() && query.customer_id != descriptor.customer_id {
            return false;
        }
        if !self.matches_storage_attributes_key(&query.storage_attributes_key, descriptor.storage_attributes_key()) {
            return false;
        }

        query.date_operator.accepts(descriptor.date, query.date)
    }

    fn matches_storage_attributes_key(
        &self,
        query_key: &StorageAttributesKey,
        candidate_key: &StorageAttributesKey,
    ) -> bool {
        if self.match_exact_storage_attributes_key {
            return query_key == candidate_key;
        }
        query_key.is_all() || candidate_key.contains_all_parts_of(query_key)
    }
}

/// Orders candidates from oldest to latest: by date, then `seq_no`, then id.
pub fn compare_recency(a: &Candidate, b: &Candidate) -> Ordering {
    a.date()
        .cmp(&b.date())
        .then(a.seq_no.cmp(&b.seq_no))
        .then(a.id.cmp(&b.id))
}
