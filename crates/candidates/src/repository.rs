//! Ports to the candidate store.
//!
//! The dispo handlers read candidates through [`CandidateRepositoryRetrieval`]
//! and hand new ones to [`CandidateChangeService`]. Both are synchronous and
//! make no assumption about the storage behind them; isolation between
//! concurrent events for the same product/warehouse is the store's job.

use std::sync::Arc;

use thiserror::Error;

use crate::candidate::Candidate;
use crate::query::CandidatesQuery;

#[derive(Debug, Error)]
pub enum CandidateRepositoryError {
    #[error("candidate repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum CandidateChangeError {
    #[error("candidate store unavailable: {0}")]
    Unavailable(String),

    #[error("candidate rejected: {0}")]
    Rejected(String),
}

/// Read side of the candidate store.
pub trait CandidateRepositoryRetrieval: Send + Sync {
    /// The latest candidate matching `query`, or `None`.
    ///
    /// "Latest" is the greatest date among the matches (after applying the
    /// query's date operator), ties broken by sequence number.
    fn retrieve_latest_match(
        &self,
        query: &CandidatesQuery,
    ) -> Result<Option<Candidate>, CandidateRepositoryError>;
}

/// Write side of the candidate store.
pub trait CandidateChangeService: Send + Sync {
    /// Persist a new (or changed) candidate and update whatever depends on it.
    ///
    /// Returns the candidate as stored, with its id assigned.
    fn on_candidate_new_or_change(&self, candidate: Candidate) -> Result<Candidate, CandidateChangeError>;
}

impl<R> CandidateRepositoryRetrieval for Arc<R>
where
    R: CandidateRepositoryRetrieval + ?Sized,
{
    fn retrieve_latest_match(
        &self,
        query: &CandidatesQuery,
    ) -> Result<Option<Candidate>, CandidateRepositoryError> {
        (**self).retrieve_latest_match(query)
    }
}

impl<C> CandidateChangeService for Arc<C>
where
    C: CandidateChangeService + ?Sized,
{
    fn on_candidate_new_or_change(&self, candidate: Candidate) -> Result<Candidate, CandidateChangeError> {
        (**self).on_candidate_new_or_change(candidate)
    }
}
