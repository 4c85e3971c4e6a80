//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are immutable; "changing" one means building a
/// new one. A currency code is a value object, an account is an entity.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
