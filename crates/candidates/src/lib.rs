//! Material dispo candidates.
//!
//! A *candidate* is a forecast/ledger entry: a known or predicted stock
//! quantity (or a change of it) for a product in a warehouse at a point in
//! time. This crate holds the candidate model, the queries used to look
//! candidates up, the ports to the candidate store, and the event handlers
//! that derive new candidates from material events.
//!
//! No IO happens here; storage is reached through
//! [`CandidateRepositoryRetrieval`] and [`CandidateChangeService`].

pub mod candidate;
pub mod query;
pub mod repository;
pub mod stock_changed;

pub use candidate::{
    Candidate, CandidateBuilder, CandidateStatus, CandidateType, MaterialDescriptor,
    TransactionDetail,
};
pub use query::{CandidatesQuery, DateOperator, MaterialDescriptorQuery};
pub use repository::{
    CandidateChangeError, CandidateChangeService, CandidateRepositoryError,
    CandidateRepositoryRetrieval,
};
pub use stock_changed::{StockChangedError, StockChangedEventHandler};
