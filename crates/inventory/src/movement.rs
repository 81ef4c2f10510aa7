//! Movement planning: the pure half of the ledger primitive.
//!
//! Given the product row as currently read inside a unit of work, decide whether
//! a signed quantity change is allowed and compute everything it writes: the new
//! quantity, the new cost price and the transaction row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockpilot_core::{DomainError, DomainResult, InvoiceId, Money, ProductId, PurchaseId, TransactionId};

use crate::product::Product;
use crate::transaction::{BatchTag, EventRef, MovementKind, UncommittedTransaction};

/// How a receipt line updates the product's `cost_price`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostPolicy {
    /// The line's unit cost replaces the current cost (last line wins).
    #[default]
    Latest,
    /// Quantity-weighted average of on-hand and received cost, rounded half-up.
    WeightedAverage,
}

impl CostPolicy {
    fn next_cost(self, on_hand: i64, current: Money, received: i64, line_cost: Money) -> Money {
        match self {
            CostPolicy::Latest => line_cost,
            CostPolicy::WeightedAverage => {
                let on_hand = on_hand.max(0) as u128;
                let received = received.max(0) as u128;
                let units = on_hand + received;
                if units == 0 {
                    return line_cost;
                }
                let value = on_hand * current.minor() as u128 + received * line_cost.minor() as u128;
                let avg = (value + units / 2) / units;
                Money::from_minor(u64::try_from(avg).unwrap_or(u64::MAX))
            }
        }
    }
}

/// A requested change to one product's stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub product_id: ProductId,
    /// Signed, non-zero quantity delta.
    pub quantity: i64,
    pub kind: MovementKind,
    pub reason: String,
    /// Cost snapshot for the row; `None` records the product's current cost.
    /// On an IN movement this also refreshes the product's cost price.
    pub unit_cost: Option<Money>,
    pub reference: Option<EventRef>,
    pub batch: Option<BatchTag>,
}

impl Movement {
    /// Depletion for a sold invoice line.
    pub fn sale(product_id: ProductId, quantity: i64, invoice_id: InvoiceId) -> Self {
        Self {
            product_id,
            quantity: quantity.saturating_neg(),
            kind: MovementKind::Out,
            reason: "sale".to_string(),
            unit_cost: None,
            reference: Some(EventRef::Invoice(invoice_id)),
            batch: None,
        }
    }

    /// Increase for a received purchase line.
    pub fn receipt(
        product_id: ProductId,
        quantity: i64,
        unit_cost: Money,
        purchase_id: PurchaseId,
        batch: Option<BatchTag>,
    ) -> Self {
        Self {
            product_id,
            quantity,
            kind: MovementKind::In,
            reason: "receive".to_string(),
            unit_cost: Some(unit_cost),
            reference: Some(EventRef::Purchase(purchase_id)),
            batch: batch.filter(|b| !b.is_empty()),
        }
    }

    /// Manual correction. A blank reason is recorded as `"manual"`.
    pub fn adjustment(product_id: ProductId, delta: i64, reason: Option<&str>) -> Self {
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or("manual");
        Self {
            product_id,
            quantity: delta,
            kind: MovementKind::Adj,
            reason: reason.to_string(),
            unit_cost: None,
            reference: Some(EventRef::Adjustment),
            batch: None,
        }
    }

    fn validate(&self) -> DomainResult<()> {
        if self.quantity == 0 {
            return Err(DomainError::validation("quantity delta cannot be zero"));
        }
        match self.kind {
            MovementKind::In if self.quantity < 0 => {
                Err(DomainError::validation("IN movement must increase stock"))
            }
            MovementKind::Out if self.quantity > 0 => {
                Err(DomainError::validation("OUT movement must decrease stock"))
            }
            _ if self.reason.trim().is_empty() => {
                Err(DomainError::validation("reason cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

/// Everything one movement writes: the product's new state and one ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementPlan {
    pub product_id: ProductId,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub new_cost_price: Money,
    pub transaction: UncommittedTransaction,
}

impl Product {
    /// Decide a movement against this (freshly read) row.
    ///
    /// Fails with `InsufficientStock` when the result would be negative, and with
    /// `Validation` for a zero delta or a delta whose sign contradicts its kind.
    /// Never mutates `self`.
    pub fn plan_movement(
        &self,
        movement: &Movement,
        policy: CostPolicy,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<MovementPlan> {
        if movement.product_id != self.id_typed() {
            return Err(DomainError::validation("movement targets a different product"));
        }
        movement.validate()?;

        let previous = self.stock_on_hand();
        let new_stock = previous
            .checked_add(movement.quantity)
            .ok_or_else(|| DomainError::validation("stock quantity overflow"))?;

        if new_stock < 0 {
            let requested = movement.quantity.saturating_neg();
            return Err(DomainError::InsufficientStock {
                product_id: self.id_typed(),
                sku: self.sku().to_string(),
                requested,
                available: previous,
                shortfall: new_stock.saturating_neg(),
            });
        }

        let unit_cost = movement.unit_cost.unwrap_or(self.cost_price());
        let new_cost_price = match (movement.kind, movement.unit_cost) {
            (MovementKind::In, Some(line_cost)) => {
                policy.next_cost(previous, self.cost_price(), movement.quantity, line_cost)
            }
            _ => self.cost_price(),
        };

        Ok(MovementPlan {
            product_id: self.id_typed(),
            previous_stock: previous,
            new_stock,
            new_cost_price,
            transaction: UncommittedTransaction {
                id: TransactionId::new(),
                product_id: self.id_typed(),
                quantity: movement.quantity,
                kind: movement.kind,
                reason: movement.reason.trim().to_string(),
                unit_cost,
                reference: movement.reference,
                batch: movement.batch.clone(),
                occurred_at,
            },
        })
    }

    /// Apply a plan produced by [`Product::plan_movement`] on this row.
    pub fn apply_plan(&mut self, plan: &MovementPlan) -> DomainResult<()> {
        if plan.product_id != self.id_typed() {
            return Err(DomainError::validation("plan targets a different product"));
        }
        if plan.previous_stock != self.stock_on_hand() {
            return Err(DomainError::conflict(format!(
                "plan was computed against stock {} but row holds {}",
                plan.previous_stock,
                self.stock_on_hand()
            )));
        }
        self.set_stock_and_cost(plan.new_stock, plan.new_cost_price);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::NewProduct;
    use proptest::prelude::*;

    fn product(stock: i64, cost: u64) -> Product {
        Product::register(
            ProductId::new(),
            NewProduct::new("SKU-1001", "Demo Product 1")
                .with_cost_price(Money::from_minor(cost))
                .with_initial_stock(stock),
        )
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn sale_decrements_and_snapshots_cost() {
        let mut p = product(10, 100);
        let invoice = InvoiceId::new();
        let plan = p
            .plan_movement(&Movement::sale(p.id_typed(), 3, invoice), CostPolicy::Latest, now())
            .unwrap();

        assert_eq!(plan.new_stock, 7);
        assert_eq!(plan.transaction.quantity, -3);
        assert_eq!(plan.transaction.kind, MovementKind::Out);
        assert_eq!(plan.transaction.unit_cost, Money::from_minor(100));
        assert_eq!(plan.transaction.reference, Some(EventRef::Invoice(invoice)));

        p.apply_plan(&plan).unwrap();
        assert_eq!(p.stock_on_hand(), 7);
        assert_eq!(p.cost_price(), Money::from_minor(100));
    }

    #[test]
    fn overdraw_reports_shortfall() {
        let p = product(2, 100);
        let err = p
            .plan_movement(
                &Movement::sale(p.id_typed(), 5, InvoiceId::new()),
                CostPolicy::Latest,
                now(),
            )
            .unwrap_err();

        match err {
            DomainError::InsufficientStock {
                requested,
                available,
                shortfall,
                ..
            } => {
                assert_eq!(requested, 5);
                assert_eq!(available, 2);
                assert_eq!(shortfall, 3);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn receipt_refreshes_cost_with_latest_policy() {
        let p = product(5, 100);
        let plan = p
            .plan_movement(
                &Movement::receipt(p.id_typed(), 20, Money::from_minor(150), PurchaseId::new(), None),
                CostPolicy::Latest,
                now(),
            )
            .unwrap();

        assert_eq!(plan.new_stock, 25);
        assert_eq!(plan.new_cost_price, Money::from_minor(150));
        assert_eq!(plan.transaction.unit_cost, Money::from_minor(150));
    }

    #[test]
    fn receipt_with_weighted_average_rounds_half_up() {
        // (5 * 100 + 20 * 150) / 25 = 140
        let p = product(5, 100);
        let plan = p
            .plan_movement(
                &Movement::receipt(p.id_typed(), 20, Money::from_minor(150), PurchaseId::new(), None),
                CostPolicy::WeightedAverage,
                now(),
            )
            .unwrap();
        assert_eq!(plan.new_cost_price, Money::from_minor(140));

        // (1 * 100 + 2 * 101) / 3 = 100.67 -> 101
        let p = product(1, 100);
        let plan = p
            .plan_movement(
                &Movement::receipt(p.id_typed(), 2, Money::from_minor(101), PurchaseId::new(), None),
                CostPolicy::WeightedAverage,
                now(),
            )
            .unwrap();
        assert_eq!(plan.new_cost_price, Money::from_minor(101));
        // The row keeps the line's own cost.
        assert_eq!(plan.transaction.unit_cost, Money::from_minor(101));
    }

    #[test]
    fn adjustment_never_touches_cost() {
        let p = product(5, 100);
        let mut m = Movement::adjustment(p.id_typed(), 4, None);
        m.unit_cost = Some(Money::from_minor(999));
        let plan = p.plan_movement(&m, CostPolicy::Latest, now()).unwrap();
        assert_eq!(plan.new_cost_price, Money::from_minor(100));
        assert_eq!(plan.transaction.reason, "manual");
    }

    #[test]
    fn zero_and_mis_signed_deltas_are_rejected() {
        let p = product(5, 100);
        let zero = Movement::adjustment(p.id_typed(), 0, Some("count"));
        assert!(matches!(
            p.plan_movement(&zero, CostPolicy::Latest, now()),
            Err(DomainError::Validation(_))
        ));

        let mut negative_in =
            Movement::receipt(p.id_typed(), 1, Money::ZERO, PurchaseId::new(), None);
        negative_in.quantity = -1;
        assert!(matches!(
            p.plan_movement(&negative_in, CostPolicy::Latest, now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn empty_batch_tag_is_dropped_on_receipt() {
        let m = Movement::receipt(
            ProductId::new(),
            1,
            Money::ZERO,
            PurchaseId::new(),
            Some(BatchTag::default()),
        );
        assert_eq!(m.batch, None);
    }

    #[test]
    fn stale_plan_is_refused() {
        let mut p = product(5, 100);
        let plan = p
            .plan_movement(&Movement::adjustment(p.id_typed(), -2, None), CostPolicy::Latest, now())
            .unwrap();
        p.apply_plan(&plan).unwrap();
        assert!(matches!(p.apply_plan(&plan), Err(DomainError::Conflict(_))));
    }

    proptest! {
        #[test]
        fn stock_never_goes_negative(
            opening in 0i64..50,
            deltas in prop::collection::vec(-30i64..30, 0..40),
        ) {
            let mut p = product(opening, 100);
            for delta in deltas {
                let before = p.stock_on_hand();
                let m = Movement::adjustment(p.id_typed(), delta, None);
                match p.plan_movement(&m, CostPolicy::Latest, Utc::now()) {
                    Ok(plan) => p.apply_plan(&plan).unwrap(),
                    Err(_) => prop_assert_eq!(p.stock_on_hand(), before),
                }
                prop_assert!(p.stock_on_hand() >= 0);
            }
        }
    }
}
