//! Strongly-typed repository identifiers used across the domain.
//!
//! The ERP persists records under positive integer ids. A value `<= 0` never
//! identifies a record, so the typed ids below can only be constructed from
//! real ids; "no record" is expressed as `Option<Id>` instead.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

macro_rules! impl_repo_id_newtype {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "i32", into = "i32")]
        pub struct $t(i32);

        impl $t {
            /// Wrap a repository id, rejecting values that cannot identify a record.
            pub fn of_repo_id(repo_id: i32) -> DomainResult<Self> {
                if repo_id <= 0 {
                    return Err(DomainError::invalid_id(format!(
                        "{}: expected a positive repo id, got {}",
                        $name, repo_id
                    )));
                }
                Ok(Self(repo_id))
            }

            /// Like [`Self::of_repo_id`], mapping non-positive values to `None`.
            pub fn of_repo_id_or_none(repo_id: i32) -> Option<Self> {
                if repo_id > 0 { Some(Self(repo_id)) } else { None }
            }

            pub fn repo_id(&self) -> i32 {
                self.0
            }

            /// Repo id of an optional id, `0` standing for "none".
            pub fn to_repo_id(id: Option<Self>) -> i32 {
                id.map(|id| id.0).unwrap_or(0)
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl TryFrom<i32> for $t {
            type Error = DomainError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                Self::of_repo_id(value)
            }
        }

        impl From<$t> for i32 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let repo_id = i32::from_str(s.trim())
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Self::of_repo_id(repo_id)
            }
        }
    };
}

impl_repo_id_newtype!(ProductId, "ProductId");
impl_repo_id_newtype!(WarehouseId, "WarehouseId");
impl_repo_id_newtype!(
    /// Business partner (customer) a candidate is reserved for.
    BPartnerId,
    "BPartnerId"
);
impl_repo_id_newtype!(
    /// Material transaction that caused a stock change.
    TransactionId,
    "TransactionId"
);
impl_repo_id_newtype!(StockId, "StockId");
impl_repo_id_newtype!(
    /// Process instance that reset the stock (inventory reset marker).
    PInstanceId,
    "PInstanceId"
);
impl_repo_id_newtype!(CandidateId, "CandidateId");
impl_repo_id_newtype!(ClientId, "ClientId");
impl_repo_id_newtype!(OrgId, "OrgId");

/// Attribute set instance (ASI) of a product.
///
/// Unlike record ids, `0` is meaningful here: it is the "no attributes"
/// instance every product without lot/attribute data refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSetInstanceId(i32);

impl AttributeSetInstanceId {
    pub const NONE: Self = Self(0);

    pub fn of_repo_id(repo_id: i32) -> Self {
        if repo_id <= 0 { Self::NONE } else { Self(repo_id) }
    }

    pub fn repo_id(&self) -> i32 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 <= 0
    }
}

impl Default for AttributeSetInstanceId {
    fn default() -> Self {
        Self::NONE
    }
}

impl core::fmt::Display for AttributeSetInstanceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Links candidates that belong together (e.g. the down/up pair of an
/// attribute change). `NONE` (`0`) means "ungrouped".
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateGroupId(i32);

impl CandidateGroupId {
    pub const NONE: Self = Self(0);

    pub fn of_repo_id(repo_id: i32) -> Self {
        if repo_id <= 0 { Self::NONE } else { Self(repo_id) }
    }

    pub fn repo_id(&self) -> i32 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 <= 0
    }
}

impl Default for CandidateGroupId {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<CandidateId> for CandidateGroupId {
    fn from(value: CandidateId) -> Self {
        Self(value.repo_id())
    }
}

impl core::fmt::Display for CandidateGroupId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_repo_ids() {
        assert!(ProductId::of_repo_id(0).is_err());
        assert!(WarehouseId::of_repo_id(-5).is_err());
        assert_eq!(TransactionId::of_repo_id_or_none(0), None);
        assert_eq!(ProductId::of_repo_id(7).unwrap().repo_id(), 7);
    }

    #[test]
    fn parses_ids_from_strings() {
        let id: StockId = " 42 ".parse().unwrap();
        assert_eq!(id.repo_id(), 42);

        match "abc".parse::<StockId>() {
            Err(DomainError::InvalidId(msg)) => assert!(msg.starts_with("StockId")),
            other => panic!("expected invalid id, got {other:?}"),
        }
    }

    #[test]
    fn serde_rejects_zero_ids() {
        assert!(serde_json::from_str::<ProductId>("0").is_err());
        let id: ProductId = serde_json::from_str("12").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "12");
    }

    #[test]
    fn optional_ids_map_to_zero() {
        assert_eq!(TransactionId::to_repo_id(None), 0);
        assert_eq!(
            TransactionId::to_repo_id(TransactionId::of_repo_id_or_none(5)),
            5
        );
    }

    #[test]
    fn attribute_set_instance_none_is_zero() {
        assert!(AttributeSetInstanceId::of_repo_id(-1).is_none());
        assert_eq!(AttributeSetInstanceId::default(), AttributeSetInstanceId::NONE);
        assert!(!AttributeSetInstanceId::of_repo_id(3).is_none());
    }

    #[test]
    fn group_id_derives_from_candidate_id() {
        let candidate_id = CandidateId::of_repo_id(11).unwrap();
        assert_eq!(CandidateGroupId::from(candidate_id).repo_id(), 11);
        assert!(CandidateGroupId::NONE.is_none());
    }
}
