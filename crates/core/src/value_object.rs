//! Value object trait: equality by value, not identity.
//!
//! Descriptors and queries (a product + storage attributes, a date filter, a
//! transaction detail) have no identity of their own. Two of them with the
//! same attribute values are interchangeable.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one with the changed values.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct ProductDescriptor {
///     product_id: ProductId,
///     storage_attributes_key: StorageAttributesKey,
/// }
///
/// impl ValueObject for ProductDescriptor {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
