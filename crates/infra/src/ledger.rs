//! The stock ledger primitive.
//!
//! Every quantity change in the system goes through [`apply_movement`]: read the
//! product inside the caller's unit of work, decide the movement, update the
//! product row and stage exactly one ledger row. The caller owns the unit of work
//! and decides when (and whether) to commit.

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use stockpilot_core::DomainError;
use stockpilot_inventory::{CostPolicy, Movement, UncommittedTransaction};

use crate::error::LedgerError;
use crate::store::UnitOfWork;

#[instrument(
    level = "debug",
    skip(uow, movement),
    fields(product_id = %movement.product_id, quantity = movement.quantity, kind = %movement.kind)
)]
pub fn apply_movement<U>(
    uow: &mut U,
    movement: &Movement,
    policy: CostPolicy,
    occurred_at: DateTime<Utc>,
) -> Result<UncommittedTransaction, LedgerError>
where
    U: UnitOfWork + ?Sized,
{
    let mut product = uow
        .product(movement.product_id)?
        .ok_or_else(|| DomainError::not_found("product", movement.product_id))?;

    let plan = product.plan_movement(movement, policy, occurred_at)?;
    product.apply_plan(&plan)?;
    uow.put_product(product)?;
    uow.append_transaction(plan.transaction.clone())?;

    debug!(
        previous_stock = plan.previous_stock,
        new_stock = plan.new_stock,
        "movement staged"
    );

    Ok(plan.transaction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryLedgerStore, LedgerStore};
    use stockpilot_core::{Money, ProductId, PurchaseId};
    use stockpilot_inventory::{MovementKind, NewProduct, Product};

    fn store_with(stock: i64) -> (InMemoryLedgerStore, ProductId) {
        let store = InMemoryLedgerStore::new();
        let id = ProductId::new();
        let mut uow = store.begin().unwrap();
        uow.insert_product(
            Product::register(
                id,
                NewProduct::new("SKU-1", "Widget")
                    .with_cost_price(Money::from_minor(100))
                    .with_initial_stock(stock),
            )
            .unwrap(),
        )
        .unwrap();
        uow.commit().unwrap();
        (store, id)
    }

    #[test]
    fn receipt_updates_stock_cost_and_ledger_together() {
        let (store, id) = store_with(10);
        let mut uow = store.begin().unwrap();

        let tx = apply_movement(
            &mut uow,
            &Movement::receipt(id, 5, Money::from_minor(150), PurchaseId::new(), None),
            CostPolicy::Latest,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(tx.kind, MovementKind::In);
        assert_eq!(tx.unit_cost, Money::from_minor(150));
        uow.commit().unwrap();

        let product = store.product(id).unwrap().unwrap();
        assert_eq!(product.stock_on_hand(), 15);
        assert_eq!(product.cost_price(), Money::from_minor(150));
        assert_eq!(store.transactions_for(id).unwrap().len(), 1);
    }

    #[test]
    fn shortfall_stages_nothing() {
        let (store, id) = store_with(2);
        let mut uow = store.begin().unwrap();

        let err = apply_movement(
            &mut uow,
            &Movement::adjustment(id, -3, Some("count")),
            CostPolicy::Latest,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock { requested: 3, available: 2, shortfall: 1, .. }
        ));

        let receipt = uow.commit().unwrap();
        assert!(receipt.transactions.is_empty());
        assert_eq!(store.product(id).unwrap().unwrap().stock_on_hand(), 2);
    }

    #[test]
    fn unknown_product_is_not_found() {
        let store = InMemoryLedgerStore::new();
        let mut uow = store.begin().unwrap();
        let err = apply_movement(
            &mut uow,
            &Movement::adjustment(ProductId::new(), 1, None),
            CostPolicy::Latest,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err.code(), "not_found");
    }
}
