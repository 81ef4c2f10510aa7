use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use stockpilot_core::{DomainError, ProductId};
use stockpilot_events::EventBus;
use stockpilot_inventory::{LedgerEvent, Movement, StockAdjusted, StockTransaction};

use super::{LedgerEnvelope, LedgerService};
use crate::error::LedgerError;
use crate::ledger::apply_movement;
use crate::store::{LedgerStore, UnitOfWork};

/// Command: manual stock correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub product_id: ProductId,
    /// Positive for found stock, negative for shrinkage. Never zero.
    pub quantity: i64,
    /// Defaults to `"manual"` when absent or blank.
    #[serde(default)]
    pub reason: Option<String>,
}

impl AdjustStock {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Acknowledgement of a committed adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub transaction: StockTransaction,
    pub stock_on_hand: i64,
}

impl<S, B> LedgerService<S, B>
where
    S: LedgerStore,
    B: EventBus<LedgerEnvelope>,
{
    #[instrument(skip(self, cmd), fields(product_id = %cmd.product_id, quantity = cmd.quantity))]
    pub fn adjust_stock(&self, cmd: AdjustStock) -> Result<StockAdjustment, LedgerError> {
        if cmd.quantity == 0 {
            return Err(DomainError::validation("adjustment quantity cannot be zero").into());
        }

        let movement = Movement::adjustment(cmd.product_id, cmd.quantity, cmd.reason.as_deref());
        let policy = self.cost_policy;

        let outcome = self.retry.run(&self.store, "adjust_stock", |uow| {
            let staged = apply_movement(uow, &movement, policy, Utc::now())?;
            let stock_on_hand = uow
                .product(cmd.product_id)?
                .map(|p| p.stock_on_hand())
                .unwrap_or_default();
            Ok((staged, stock_on_hand))
        });

        let ((staged, stock_on_hand), receipt) = match outcome {
            Ok(done) => done,
            Err(err) => {
                warn!(code = err.code(), error = %err, "adjustment rejected");
                return Err(err);
            }
        };

        // The adjustment is the only row of its commit.
        let transaction = staged.commit(receipt.ledger_head);
        info!(stock_on_hand, sequence = transaction.sequence, "stock adjusted");

        self.publish(
            &receipt,
            LedgerEvent::StockAdjusted(StockAdjusted {
                product_id: cmd.product_id,
                delta: cmd.quantity,
                reason: transaction.reason.clone(),
                occurred_at: transaction.occurred_at,
            }),
        );

        Ok(StockAdjustment {
            transaction,
            stock_on_hand,
        })
    }
}
