use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockWriteGuard};

use serde::Serialize;
use thiserror::Error;

use stockpilot_core::ProductId;
use stockpilot_events::EventEnvelope;
use stockpilot_inventory::{LedgerEvent, Product, StockMoved, StockTransaction};

/// Queryable read model: current quantity per product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockLevel {
    pub product_id: ProductId,
    /// Empty until the product's registration has been seen.
    pub sku: String,
    pub quantity: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockLevelProjectionError {
    /// Ledger sequences start at 1.
    #[error("invalid ledger sequence number {0}")]
    InvalidSequence(u64),

    #[error("projection lock poisoned")]
    Poisoned,
}

#[derive(Debug, Default)]
struct Entry {
    sku: Option<String>,
    quantity: i64,
}

#[derive(Debug, Default)]
struct State {
    levels: HashMap<ProductId, Entry>,
    /// Sequence of the last ledger row applied.
    cursor: u64,
    /// Rows that arrived ahead of a gap, applied once the gap fills.
    pending: BTreeMap<u64, StockMoved>,
}

impl State {
    fn apply_moved(&mut self, moved: &StockMoved) {
        self.levels.entry(moved.product_id).or_default().quantity += moved.quantity;
    }

    fn drain_pending(&mut self) {
        while let Some(moved) = self.pending.remove(&(self.cursor + 1)) {
            self.apply_moved(&moved);
            self.cursor += 1;
        }
    }
}

/// Stock-level projection.
///
/// Consumes published ledger envelopes and keeps `product → quantity`. It is a
/// disposable cache: the store's product rows are authoritative, and this view
/// can always be rebuilt from the transaction log with
/// [`StockLevelProjection::rebuild_from_log`].
///
/// - Redelivered rows (`sequence <= cursor`) are ignored
/// - Rows are applied strictly in ledger order; early arrivals wait for the gap
/// - Only `ProductRegistered` (baseline) and `StockMoved` change the view
///
/// A projection attached to a store that already has history should be rebuilt
/// from the log first (after subscribing), so its cursor starts at the head.
#[derive(Debug, Default)]
pub struct StockLevelProjection {
    state: RwLock<State>,
}

impl StockLevelProjection {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StockLevelProjectionError> {
        self.state.write().map_err(|_| StockLevelProjectionError::Poisoned)
    }

    pub fn apply_envelope(&self, envelope: &EventEnvelope<LedgerEvent>) -> Result<(), StockLevelProjectionError> {
        let mut state = self.write()?;

        match envelope.payload() {
            LedgerEvent::ProductRegistered(e) => {
                let entry = state.levels.entry(e.product_id).or_default();
                if entry.sku.is_none() {
                    entry.sku = Some(e.sku.clone());
                    entry.quantity += e.initial_stock;
                }
            }
            LedgerEvent::StockMoved(moved) => {
                let seq = envelope.sequence_number();
                if seq == 0 {
                    return Err(StockLevelProjectionError::InvalidSequence(seq));
                }
                if seq <= state.cursor {
                    // Duplicate or replay; safe to ignore.
                    return Ok(());
                }
                if seq == state.cursor + 1 {
                    state.apply_moved(moved);
                    state.cursor = seq;
                    state.drain_pending();
                } else {
                    state.pending.insert(seq, moved.clone());
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Reset and rebuild from authoritative data: each product's baseline plus
    /// every ledger row, in sequence order.
    pub fn rebuild_from_log<'a>(
        &self,
        products: impl IntoIterator<Item = &'a Product>,
        transactions: impl IntoIterator<Item = &'a StockTransaction>,
    ) -> Result<(), StockLevelProjectionError> {
        let mut rows: Vec<&StockTransaction> = transactions.into_iter().collect();
        rows.sort_by_key(|t| t.sequence);

        let mut fresh = State::default();
        for product in products {
            fresh.levels.insert(
                product.id_typed(),
                Entry {
                    sku: Some(product.sku().to_string()),
                    quantity: product.initial_stock(),
                },
            );
        }
        for row in rows {
            fresh.apply_moved(&StockMoved::from(row));
            fresh.cursor = fresh.cursor.max(row.sequence);
        }

        *self.write()? = fresh;
        Ok(())
    }

    pub fn quantity(&self, product_id: ProductId) -> Option<i64> {
        let state = self.state.read().ok()?;
        state.levels.get(&product_id).map(|e| e.quantity)
    }

    /// All levels, ordered by SKU.
    pub fn list(&self) -> Vec<StockLevel> {
        let Ok(state) = self.state.read() else {
            return Vec::new();
        };
        let mut levels: Vec<StockLevel> = state
            .levels
            .iter()
            .map(|(id, e)| StockLevel {
                product_id: *id,
                sku: e.sku.clone().unwrap_or_default(),
                quantity: e.quantity,
            })
            .collect();
        levels.sort_by(|a, b| a.sku.cmp(&b.sku).then_with(|| a.product_id.cmp(&b.product_id)));
        levels
    }

    pub fn cursor(&self) -> u64 {
        self.state.read().map(|s| s.cursor).unwrap_or_default()
    }

    /// Rows held back waiting for a missing sequence.
    pub fn pending(&self) -> usize {
        self.state.read().map(|s| s.pending.len()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockpilot_core::{Money, TransactionId};
    use stockpilot_inventory::{MovementKind, NewProduct, ProductRegistered};

    fn moved(seq: u64, product_id: ProductId, quantity: i64) -> EventEnvelope<LedgerEvent> {
        EventEnvelope::wrap(
            seq,
            LedgerEvent::StockMoved(StockMoved {
                transaction_id: TransactionId::new(),
                product_id,
                quantity,
                kind: if quantity > 0 { MovementKind::In } else { MovementKind::Out },
                unit_cost: Money::ZERO,
                reference: None,
                occurred_at: Utc::now(),
            }),
        )
    }

    fn registered(seq: u64, product_id: ProductId, initial_stock: i64) -> EventEnvelope<LedgerEvent> {
        EventEnvelope::wrap(
            seq,
            LedgerEvent::ProductRegistered(ProductRegistered {
                product_id,
                sku: "SKU-1".into(),
                initial_stock,
                occurred_at: Utc::now(),
            }),
        )
    }

    #[test]
    fn applies_baseline_and_moves() {
        let p = ProductId::new();
        let proj = StockLevelProjection::new();

        proj.apply_envelope(&registered(0, p, 10)).unwrap();
        proj.apply_envelope(&moved(1, p, -3)).unwrap();
        proj.apply_envelope(&moved(2, p, 5)).unwrap();

        assert_eq!(proj.quantity(p), Some(12));
        assert_eq!(proj.cursor(), 2);
        assert_eq!(proj.list()[0].sku, "SKU-1");
    }

    #[test]
    fn redelivery_is_ignored() {
        let p = ProductId::new();
        let proj = StockLevelProjection::new();
        let env = moved(1, p, 4);

        proj.apply_envelope(&env).unwrap();
        proj.apply_envelope(&env).unwrap();
        proj.apply_envelope(&registered(1, p, 10)).unwrap();
        proj.apply_envelope(&registered(1, p, 10)).unwrap();

        assert_eq!(proj.quantity(p), Some(14));
    }

    #[test]
    fn out_of_order_rows_wait_for_the_gap() {
        let p = ProductId::new();
        let proj = StockLevelProjection::new();

        proj.apply_envelope(&moved(2, p, 5)).unwrap();
        assert_eq!(proj.quantity(p), None);
        assert_eq!(proj.pending(), 1);

        proj.apply_envelope(&moved(1, p, 1)).unwrap();
        assert_eq!(proj.quantity(p), Some(6));
        assert_eq!(proj.cursor(), 2);
        assert_eq!(proj.pending(), 0);
    }

    #[test]
    fn sequence_zero_is_rejected() {
        let proj = StockLevelProjection::new();
        assert_eq!(
            proj.apply_envelope(&moved(0, ProductId::new(), 1)),
            Err(StockLevelProjectionError::InvalidSequence(0))
        );
    }

    #[test]
    fn rebuild_matches_log_and_moves_cursor() {
        let product = Product::register(
            ProductId::new(),
            NewProduct::new("SKU-9", "Bolt").with_initial_stock(3),
        )
        .unwrap();
        let p = product.id_typed();
        let rows: Vec<StockTransaction> = [(2u64, 4i64), (1, -1)]
            .into_iter()
            .map(|(seq, qty)| {
                stockpilot_inventory::UncommittedTransaction {
                    id: TransactionId::new(),
                    product_id: p,
                    quantity: qty,
                    kind: MovementKind::Adj,
                    reason: "manual".into(),
                    unit_cost: Money::ZERO,
                    reference: None,
                    batch: None,
                    occurred_at: Utc::now(),
                }
                .commit(seq)
            })
            .collect();

        let proj = StockLevelProjection::new();
        proj.apply_envelope(&moved(1, ProductId::new(), 99)).unwrap();
        proj.rebuild_from_log([&product], &rows).unwrap();

        assert_eq!(proj.quantity(p), Some(6));
        assert_eq!(proj.cursor(), 2);
        assert_eq!(proj.list().len(), 1);

        // Already covered by the rebuild.
        proj.apply_envelope(&moved(2, p, 4)).unwrap();
        assert_eq!(proj.quantity(p), Some(6));
    }
}
