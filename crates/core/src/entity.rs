//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// An account snapshot is an entity: two snapshots with different balances but the same
/// id describe the same account at different points in its stream.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
