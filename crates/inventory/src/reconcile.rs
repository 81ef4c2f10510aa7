//! Read-side helpers over products and the ledger: audit reconciliation,
//! low-stock listing and stock valuation.

use serde::{Deserialize, Serialize};

use stockpilot_core::{Money, ProductId};

use crate::product::Product;
use crate::transaction::StockTransaction;

/// Result of checking `stock_on_hand == initial_stock + Σ quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub product_id: ProductId,
    pub initial_stock: i64,
    pub ledger_sum: i64,
    pub stock_on_hand: i64,
    pub balanced: bool,
}

impl ReconciliationReport {
    /// Quantity on the product row not explained by the ledger (0 when balanced).
    pub fn drift(&self) -> i64 {
        self.stock_on_hand - (self.initial_stock + self.ledger_sum)
    }
}

/// Reconcile one product against its ledger rows. Rows for other products are ignored.
pub fn reconcile<'a>(
    product: &Product,
    transactions: impl IntoIterator<Item = &'a StockTransaction>,
) -> ReconciliationReport {
    let product_id = product.id_typed();
    let ledger_sum: i64 = transactions
        .into_iter()
        .filter(|t| t.product_id == product_id)
        .map(|t| t.quantity)
        .sum();

    ReconciliationReport {
        product_id,
        initial_stock: product.initial_stock(),
        ledger_sum,
        stock_on_hand: product.stock_on_hand(),
        balanced: product.initial_stock() + ledger_sum == product.stock_on_hand(),
    }
}

/// Products whose stock is strictly below their threshold, lowest stock first,
/// at most `limit` rows.
pub fn low_stock<'a>(products: impl IntoIterator<Item = &'a Product>, limit: usize) -> Vec<Product> {
    let mut low: Vec<Product> = products
        .into_iter()
        .filter(|p| p.is_low_stock())
        .cloned()
        .collect();
    low.sort_by(|a, b| {
        a.stock_on_hand()
            .cmp(&b.stock_on_hand())
            .then_with(|| a.sku().cmp(b.sku()))
    });
    low.truncate(limit);
    low
}

/// Total inventory value at current cost, `Σ stock_on_hand × cost_price`.
/// `None` on overflow.
pub fn stock_valuation<'a>(products: impl IntoIterator<Item = &'a Product>) -> Option<Money> {
    products
        .into_iter()
        .map(Product::stock_value)
        .try_fold(Money::ZERO, |acc, v| acc.checked_add(v?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::{CostPolicy, Movement};
    use crate::product::NewProduct;
    use chrono::Utc;
    use proptest::prelude::*;
    use stockpilot_core::InvoiceId;

    fn product(sku: &str, stock: i64, threshold: i64, cost: u64) -> Product {
        Product::register(
            ProductId::new(),
            NewProduct::new(sku, sku)
                .with_cost_price(Money::from_minor(cost))
                .with_low_stock_threshold(threshold)
                .with_initial_stock(stock),
        )
        .unwrap()
    }

    #[test]
    fn low_stock_orders_and_limits() {
        let products = vec![
            product("A", 3, 10, 0),
            product("B", 50, 10, 0),
            product("C", 1, 10, 0),
            product("D", 9, 10, 0),
        ];

        let low = low_stock(&products, 2);
        let skus: Vec<_> = low.iter().map(|p| p.sku()).collect();
        assert_eq!(skus, vec!["C", "A"]);
    }

    #[test]
    fn valuation_sums_stock_times_cost() {
        let products = vec![product("A", 3, 0, 150), product("B", 2, 0, 25)];
        assert_eq!(stock_valuation(&products), Some(Money::from_minor(500)));
    }

    proptest! {
        #[test]
        fn ledger_explains_every_committed_change(
            opening in 0i64..100,
            sales in prop::collection::vec(1i64..20, 0..30),
        ) {
            let mut p = product("SKU", opening, 0, 100);
            let mut ledger = Vec::new();
            for (seq, qty) in sales.into_iter().enumerate() {
                let m = Movement::sale(p.id_typed(), qty, InvoiceId::new());
                if let Ok(plan) = p.plan_movement(&m, CostPolicy::Latest, Utc::now()) {
                    p.apply_plan(&plan).unwrap();
                    ledger.push(plan.transaction.commit(seq as u64 + 1));
                }
            }

            let report = reconcile(&p, &ledger);
            prop_assert!(report.balanced);
            prop_assert_eq!(report.drift(), 0);
        }
    }
}
