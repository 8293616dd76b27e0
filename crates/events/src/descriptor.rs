//! Descriptors shared by material events and candidates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dispo_core::{AttributeSetInstanceId, ClientId, OrgId, ProductId, ValueObject};

/// Origin of a material event.
///
/// `None` for client/org stands for the system client and "any" org.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDescriptor {
    #[serde(default)]
    pub client_id: Option<ClientId>,
    #[serde(default)]
    pub org_id: Option<OrgId>,
    /// When the event was raised by its producer.
    pub created_at: DateTime<Utc>,
}

impl EventDescriptor {
    pub fn new(client_id: Option<ClientId>, org_id: Option<OrgId>, created_at: DateTime<Utc>) -> Self {
        Self {
            client_id,
            org_id,
            created_at,
        }
    }
}

impl ValueObject for EventDescriptor {}

/// Derived key encoding the lot/attribute distinctions relevant for stock
/// matching, e.g. `"1§&§2"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageAttributesKey(String);

impl StorageAttributesKey {
    /// Separator between the attribute value ids of a key.
    pub const SEPARATOR: &'static str = "§&§";

    const ALL_RAW: &'static str = "-1000";
    const NONE_RAW: &'static str = "-1002";

    pub fn of(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Wildcard key; matches any key in non-exact queries.
    pub fn all() -> Self {
        Self(Self::ALL_RAW.to_string())
    }

    /// Key of stock without any storage-relevant attributes.
    pub fn none() -> Self {
        Self(Self::NONE_RAW.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_all(&self) -> bool {
        self.0 == Self::ALL_RAW
    }

    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.0.split(Self::SEPARATOR).filter(|p| !p.is_empty())
    }

    /// Whether every part of `other` also occurs in this key.
    pub fn contains_all_parts_of(&self, other: &StorageAttributesKey) -> bool {
        let own: Vec<&str> = self.parts().collect();
        other.parts().all(|p| own.contains(&p))
    }
}

impl core::fmt::Display for StorageAttributesKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ValueObject for StorageAttributesKey {}

/// Product identity plus the attribute data stock is kept apart by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDescriptor {
    pub product_id: ProductId,
    pub storage_attributes_key: StorageAttributesKey,
    #[serde(default)]
    pub attribute_set_instance_id: AttributeSetInstanceId,
}

impl ProductDescriptor {
    pub fn new(
        product_id: ProductId,
        storage_attributes_key: StorageAttributesKey,
        attribute_set_instance_id: AttributeSetInstanceId,
    ) -> Self {
        Self {
            product_id,
            storage_attributes_key,
            attribute_set_instance_id,
        }
    }

    /// Descriptor of a product without storage-relevant attributes.
    pub fn for_product(product_id: ProductId) -> Self {
        Self::new(
            product_id,
            StorageAttributesKey::none(),
            AttributeSetInstanceId::NONE,
        )
    }
}

impl ValueObject for ProductDescriptor {}
