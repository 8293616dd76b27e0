//! In-memory candidate store.
//!
//! Implements both candidate ports over one lock-protected list, which makes
//! it usable as the complete dispo backend in tests and single-process runs.
//! Reads are point-in-time snapshots.
//!
//! Applying a non-stock candidate also maintains the `STOCK` records of its
//! product/warehouse/storage-attributes key: a new stock record is added at
//! the candidate's date, and every later stock record is shifted by the same
//! delta.

use std::sync::RwLock;

use rust_decimal::Decimal;
use tracing::{debug, trace};

use dispo_candidates::query::compare_recency;
use dispo_candidates::{
    Candidate, CandidateChangeError, CandidateChangeService, CandidateRepositoryError,
    CandidateRepositoryRetrieval, CandidateType, CandidatesQuery, DateOperator,
    MaterialDescriptorQuery,
};
use dispo_core::{CandidateGroupId, CandidateId};

#[derive(Debug, Default)]
struct StoreState {
    candidates: Vec<Candidate>,
    last_id: i32,
    last_seq_no: i32,
}

fn overflow(what: &str) -> CandidateChangeError {
    CandidateChangeError::Rejected(format!("{what} out of range"))
}

/// Stock records to write for one non-stock candidate, computed up front so
/// that nothing is stored when any quantity is out of range.
#[derive(Debug)]
struct StockUpdate {
    quantity: Decimal,
    /// Indexes of later stock records with their shifted quantities.
    shifted: Vec<(usize, Decimal)>,
}

impl StoreState {
    fn next_id(&mut self) -> Result<CandidateId, CandidateChangeError> {
        let id = self.last_id.checked_add(1).ok_or_else(|| overflow("candidate id"))?;
        let candidate_id = CandidateId::of_repo_id(id).map_err(|e| CandidateChangeError::Rejected(e.to_string()))?;
        self.last_id = id;
        Ok(candidate_id)
    }

    fn next_seq_no(&mut self) -> Result<i32, CandidateChangeError> {
        self.last_seq_no = self.last_seq_no.checked_add(1).ok_or_else(|| overflow("sequence number"))?;
        Ok(self.last_seq_no)
    }

    fn latest_match(&self, query: &CandidatesQuery) -> Option<&Candidate> {
        self.candidates
            .iter()
            .filter(|c| query.matches(c))
            .max_by(|a, b| compare_recency(a, b))
    }

    /// Assign id and sequence number, keeping ids that were already set.
    fn insert(&mut self, mut candidate: Candidate) -> Result<Candidate, CandidateChangeError> {
        match candidate.id {
            Some(id) => self.last_id = self.last_id.max(id.repo_id()),
            None => candidate.id = Some(self.next_id()?),
        }
        candidate.seq_no = self.next_seq_no()?;

        self.candidates.push(candidate.clone());
        Ok(candidate)
    }

    /// Stock effect of `candidate` at its date, carried forward to later
    /// stock records.
    fn plan_stock_update(&self, candidate: &Candidate) -> Result<StockUpdate, CandidateChangeError> {
        let delta = candidate.stock_delta();
        let date = candidate.date();

        let stock_query = CandidatesQuery {
            candidate_type: Some(CandidateType::Stock),
            material_descriptor_query: Some(MaterialDescriptorQuery {
                product_id: candidate.product_id(),
                storage_attributes_key: candidate.material_descriptor.storage_attributes_key().clone(),
                warehouse_id: Some(candidate.warehouse_id()),
                customer_id: None,
                date,
                date_operator: DateOperator::BeforeOrAt,
            }),
            match_exact_storage_attributes_key: true,
            ..Default::default()
        };

        let previous_qty = self
            .latest_match(&stock_query)
            .map(|c| c.quantity())
            .unwrap_or(Decimal::ZERO);
        let quantity = previous_qty.checked_add(delta).ok_or_else(|| overflow("stock quantity"))?;

        // Later stock records were computed without this delta.
        let later_query = CandidatesQuery {
            material_descriptor_query: stock_query.material_descriptor_query.clone().map(|q| {
                MaterialDescriptorQuery {
                    date_operator: DateOperator::AtOrAfter,
                    ..q
                }
            }),
            ..stock_query
        };
        let shifted = self
            .candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| later_query.matches(c) && c.date() > date)
            .map(|(index, c)| {
                c.quantity()
                    .checked_add(delta)
                    .map(|quantity| (index, quantity))
                    .ok_or_else(|| overflow("stock quantity"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StockUpdate { quantity, shifted })
    }

    fn apply_stock_update(&mut self, candidate: &Candidate, update: StockUpdate) -> Result<(), CandidateChangeError> {
        let stock = Candidate {
            id: None,
            client_id: candidate.client_id,
            org_id: candidate.org_id,
            candidate_type: CandidateType::Stock,
            status: candidate.status,
            group_id: candidate.group_id,
            seq_no: 0,
            material_descriptor: candidate.material_descriptor.with_quantity(update.quantity),
            transaction_details: vec![],
        };
        let stock = self.insert(stock)?;

        let shifted = update.shifted.len();
        for (index, quantity) in update.shifted {
            if let Some(later) = self.candidates.get_mut(index) {
                later.material_descriptor.quantity = quantity;
            }
        }

        trace!(
            stock_id = %CandidateId::to_repo_id(stock.id),
            quantity = %stock.quantity(),
            shifted,
            "updated stock record"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCandidateStore {
    state: RwLock<StoreState>,
}

impl InMemoryCandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a prepared candidate as is, without deriving stock records.
    pub fn seed(&self, candidate: Candidate) -> Result<Candidate, CandidateChangeError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| CandidateChangeError::Unavailable("lock poisoned".to_string()))?;
        state.insert(candidate)
    }

    /// Snapshot of all candidates in insertion order.
    pub fn all(&self) -> Vec<Candidate> {
        self.state
            .read()
            .map(|s| s.candidates.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.candidates.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CandidateRepositoryRetrieval for InMemoryCandidateStore {
    fn retrieve_latest_match(
        &self,
        query: &CandidatesQuery,
    ) -> Result<Option<Candidate>, CandidateRepositoryError> {
        let state = self
            .state
            .read()
            .map_err(|_| CandidateRepositoryError::Unavailable("lock poisoned".to_string()))?;
        Ok(state.latest_match(query).cloned())
    }
}

impl CandidateChangeService for InMemoryCandidateStore {
    fn on_candidate_new_or_change(&self, candidate: Candidate) -> Result<Candidate, CandidateChangeError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| CandidateChangeError::Unavailable("lock poisoned".to_string()))?;

        let stock_update = match candidate.candidate_type {
            CandidateType::Stock => None,
            _ => Some(state.plan_stock_update(&candidate)?),
        };

        let mut candidate = state.insert(candidate)?;

        // An inventory candidate without group opens its own group.
        if candidate.candidate_type.is_inventory() && candidate.group_id.is_none() {
            if let Some(id) = candidate.id {
                candidate.group_id = CandidateGroupId::from(id);
                if let Some(stored) = state.candidates.iter_mut().rev().find(|c| c.id == Some(id)) {
                    stored.group_id = candidate.group_id;
                }
            }
        }

        if let Some(update) = stock_update {
            if let Err(err) = state.apply_stock_update(&candidate, update) {
                state.candidates.pop();
                return Err(err);
            }
        }

        debug!(
            candidate_id = %CandidateId::to_repo_id(candidate.id),
            candidate_type = ?candidate.candidate_type,
            quantity = %candidate.quantity(),
            group_id = %candidate.group_id,
            "stored candidate"
        );
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use dispo_candidates::{CandidateStatus, MaterialDescriptor};
    use dispo_core::{ProductId, WarehouseId};
    use dispo_events::{ProductDescriptor, StorageAttributesKey};

    use super::*;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, d, 8, 0, 0).unwrap()
    }

    fn candidate(candidate_type: CandidateType, key: &str, date: DateTime<Utc>, quantity: i64) -> Candidate {
        Candidate {
            id: None,
            client_id: None,
            org_id: None,
            candidate_type,
            status: CandidateStatus::DocCompleted,
            group_id: CandidateGroupId::NONE,
            seq_no: 0,
            material_descriptor: MaterialDescriptor {
                product_descriptor: ProductDescriptor::new(
                    ProductId::of_repo_id(1).unwrap(),
                    StorageAttributesKey::of(key),
                    Default::default(),
                ),
                warehouse_id: WarehouseId::of_repo_id(1).unwrap(),
                customer_id: None,
                date,
                quantity: Decimal::from(quantity),
            },
            transaction_details: vec![],
        }
    }

    fn stock_query(key: &str, date: DateTime<Utc>) -> CandidatesQuery {
        CandidatesQuery {
            candidate_type: Some(CandidateType::Stock),
            material_descriptor_query: Some(MaterialDescriptorQuery {
                product_id: ProductId::of_repo_id(1).unwrap(),
                storage_attributes_key: StorageAttributesKey::of(key),
                warehouse_id: WarehouseId::of_repo_id_or_none(1),
                customer_id: None,
                date,
                date_operator: DateOperator::BeforeOrAt,
            }),
            match_exact_storage_attributes_key: true,
            ..Default::default()
        }
    }

    fn stock_at(store: &InMemoryCandidateStore, key: &str, date: DateTime<Utc>) -> Option<Decimal> {
        store
            .retrieve_latest_match(&stock_query(key, date))
            .unwrap()
            .map(|c| c.quantity())
    }

    #[test]
    fn returns_none_when_nothing_matches() {
        let store = InMemoryCandidateStore::new();
        assert!(store.is_empty());
        assert_eq!(stock_at(&store, "A", day(1)), None);
    }

    #[test]
    fn latest_match_ignores_records_after_the_query_date() {
        let store = InMemoryCandidateStore::new();
        store.seed(candidate(CandidateType::Stock, "A", day(1), 5)).unwrap();
        store.seed(candidate(CandidateType::Stock, "A", day(3), 8)).unwrap();

        assert_eq!(stock_at(&store, "A", day(2)), Some(Decimal::from(5)));
        assert_eq!(stock_at(&store, "A", day(3)), Some(Decimal::from(8)));
        assert_eq!(stock_at(&store, "B", day(3)), None);
    }

    #[test]
    fn same_date_prefers_the_record_stored_last() {
        let store = InMemoryCandidateStore::new();
        store.seed(candidate(CandidateType::Stock, "A", day(1), 5)).unwrap();
        store.seed(candidate(CandidateType::Stock, "A", day(1), 6)).unwrap();

        assert_eq!(stock_at(&store, "A", day(1)), Some(Decimal::from(6)));
    }

    #[test]
    fn inventory_candidates_update_stock_and_open_a_group() {
        let store = InMemoryCandidateStore::new();

        let up = store
            .on_candidate_new_or_change(candidate(CandidateType::InventoryUp, "A", day(1), 10))
            .unwrap();
        let down = store
            .on_candidate_new_or_change(candidate(CandidateType::InventoryDown, "A", day(2), 4))
            .unwrap();

        assert_eq!(up.group_id, CandidateGroupId::from(up.id.unwrap()));
        assert_eq!(down.group_id, CandidateGroupId::from(down.id.unwrap()));
        assert_eq!(stock_at(&store, "A", day(1)), Some(Decimal::from(10)));
        assert_eq!(stock_at(&store, "A", day(2)), Some(Decimal::from(6)));
        assert_eq!(store.len(), 4);

        let stored_up = store.all().into_iter().find(|c| c.id == up.id).unwrap();
        assert_eq!(stored_up.group_id, up.group_id);
    }

    #[test]
    fn grouped_candidates_keep_their_group() {
        let store = InMemoryCandidateStore::new();
        let mut up = candidate(CandidateType::InventoryUp, "A", day(1), 3);
        up.group_id = CandidateGroupId::of_repo_id(77);

        let stored = store.on_candidate_new_or_change(up).unwrap();

        assert_eq!(stored.group_id, CandidateGroupId::of_repo_id(77));
    }

    #[test]
    fn backdated_changes_shift_later_stock_records() {
        let store = InMemoryCandidateStore::new();
        store
            .on_candidate_new_or_change(candidate(CandidateType::InventoryUp, "A", day(5), 10))
            .unwrap();

        store
            .on_candidate_new_or_change(candidate(CandidateType::Demand, "A", day(2), 3))
            .unwrap();

        assert_eq!(stock_at(&store, "A", day(2)), Some(Decimal::from(-3)));
        assert_eq!(stock_at(&store, "A", day(5)), Some(Decimal::from(7)));
    }

    #[test]
    fn stock_candidates_are_stored_without_derived_records() {
        let store = InMemoryCandidateStore::new();
        store
            .on_candidate_new_or_change(candidate(CandidateType::Stock, "A", day(1), 4))
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(stock_at(&store, "A", day(1)), Some(Decimal::from(4)));
    }

    #[test]
    fn out_of_range_stock_is_rejected_without_storing_anything() {
        let store = InMemoryCandidateStore::new();
        let mut stock = candidate(CandidateType::Stock, "A", day(1), 0);
        stock.material_descriptor.quantity = Decimal::MAX;
        store.seed(stock).unwrap();

        let err = store
            .on_candidate_new_or_change(candidate(CandidateType::InventoryUp, "A", day(2), 1))
            .unwrap_err();

        assert!(matches!(err, CandidateChangeError::Rejected(_)));
        assert_eq!(store.len(), 1);
        assert_eq!(stock_at(&store, "A", day(2)), Some(Decimal::MAX));
    }

    #[test]
    fn out_of_range_shift_leaves_later_records_untouched() {
        let store = InMemoryCandidateStore::new();
        let mut later = candidate(CandidateType::Stock, "A", day(5), 0);
        later.material_descriptor.quantity = Decimal::MAX;
        store.seed(later).unwrap();

        let err = store
            .on_candidate_new_or_change(candidate(CandidateType::InventoryUp, "A", day(2), 1))
            .unwrap_err();

        assert!(matches!(err, CandidateChangeError::Rejected(_)));
        assert_eq!(store.len(), 1);
        assert_eq!(stock_at(&store, "A", day(5)), Some(Decimal::MAX));
    }

    #[test]
    fn exhausted_ids_are_rejected() {
        let store = InMemoryCandidateStore::new();
        let mut seeded = candidate(CandidateType::Stock, "A", day(1), 1);
        seeded.id = CandidateId::of_repo_id_or_none(i32::MAX);
        store.seed(seeded).unwrap();

        let err = store
            .seed(candidate(CandidateType::Stock, "A", day(1), 2))
            .unwrap_err();

        assert!(matches!(err, CandidateChangeError::Rejected(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn seeded_ids_are_not_reused() {
        let store = InMemoryCandidateStore::new();
        let mut seeded = candidate(CandidateType::Stock, "A", day(1), 1);
        seeded.id = CandidateId::of_repo_id_or_none(40);
        store.seed(seeded).unwrap();

        let next = store
            .seed(candidate(CandidateType::Stock, "A", day(1), 2))
            .unwrap();

        assert_eq!(next.id, CandidateId::of_repo_id_or_none(41));
    }
}
