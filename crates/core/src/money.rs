//! Monetary amounts in minor currency units.

use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// A non-negative amount in the smallest currency unit (e.g. cents).
///
/// Unit costs, selling prices, taxes, discounts and totals all use this type so
/// arithmetic stays exact.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    pub const fn minor(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Subtract, clamping at zero.
    pub fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    /// Extend a unit amount by a quantity. `None` on overflow or negative quantity.
    pub fn checked_mul_qty(self, quantity: i64) -> Option<Money> {
        let quantity = u64::try_from(quantity).ok()?;
        self.0.checked_mul(quantity).map(Money)
    }

    /// Sum amounts, `None` on overflow.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Money>) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn displays_with_two_decimals() {
        assert_eq!(Money::from_minor(150).to_string(), "1.50");
        assert_eq!(Money::from_minor(7).to_string(), "0.07");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn negative_quantity_does_not_extend() {
        assert_eq!(Money::from_minor(100).checked_mul_qty(-1), None);
        assert_eq!(
            Money::from_minor(100).checked_mul_qty(3),
            Some(Money::from_minor(300))
        );
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(Money::from_minor(u64::MAX).checked_mul_qty(2), None);
        assert_eq!(
            Money::checked_sum([Money::from_minor(u64::MAX), Money::from_minor(1)]),
            None
        );
    }

    proptest! {
        #[test]
        fn saturating_sub_never_underflows(a in any::<u64>(), b in any::<u64>()) {
            let r = Money::from_minor(a).saturating_sub(Money::from_minor(b));
            prop_assert!(r.minor() <= a);
        }
    }
}
