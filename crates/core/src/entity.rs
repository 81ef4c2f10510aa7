//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Products, purchases and invoices are entities: two rows with the same id are
/// the same business object, whatever their current field values.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
