//! `dispo-core`: domain building blocks for material dispo.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod clock;
pub mod error;
pub mod id;
pub mod value_object;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use id::{
    AttributeSetInstanceId, BPartnerId, CandidateGroupId, CandidateId, ClientId, OrgId,
    PInstanceId, ProductId, StockId, TransactionId, WarehouseId,
};
pub use value_object::ValueObject;
