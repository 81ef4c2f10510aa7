//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. `Money` and a
/// transaction's batch tag are value objects; a `Product` is not (it has an id).
///
/// To "modify" a value object, build a new one:
///
/// ```ignore
/// let cost = Money::from_minor(150);
/// let doubled = cost.checked_mul_qty(2).unwrap();
/// assert_eq!(doubled, Money::from_minor(300));
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
