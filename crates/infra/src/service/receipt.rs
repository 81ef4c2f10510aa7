use chrono::Utc;
use tracing::{info, instrument, warn};

use stockpilot_core::{DomainError, PurchaseId};
use stockpilot_events::EventBus;
use stockpilot_inventory::{LedgerEvent, Movement, PurchaseReceived};
use stockpilot_purchasing::Purchase;

use super::{LedgerEnvelope, LedgerService};
use crate::error::LedgerError;
use crate::ledger::apply_movement;
use crate::store::{LedgerStore, UnitOfWork};

impl<S, B> LedgerService<S, B>
where
    S: LedgerStore,
    B: EventBus<LedgerEnvelope>,
{
    /// Receive a purchase: one IN movement per line plus PO → RECEIVED, in one
    /// unit of work.
    ///
    /// A second receive fails with `AlreadyReceived` and writes nothing. Two
    /// concurrent receives of the same purchase conflict on the purchase row; the
    /// loser re-reads it as RECEIVED on retry.
    #[instrument(skip(self), fields(purchase_id = %purchase_id))]
    pub fn receive_purchase(&self, purchase_id: PurchaseId) -> Result<Purchase, LedgerError> {
        let policy = self.cost_policy;

        let outcome = self.retry.run(&self.store, "receive_purchase", |uow| {
            let now = Utc::now();
            let mut purchase = uow
                .purchase(purchase_id)?
                .ok_or_else(|| DomainError::not_found("purchase", purchase_id))?;
            purchase.ensure_receivable()?;

            for line in purchase.lines() {
                apply_movement(
                    uow,
                    &Movement::receipt(
                        line.product_id,
                        line.quantity,
                        line.unit_cost,
                        purchase_id,
                        line.batch.clone(),
                    ),
                    policy,
                    now,
                )?;
            }

            purchase.mark_received(now)?;
            uow.put_purchase(purchase.clone())?;
            Ok(purchase)
        });

        let (purchase, receipt) = match outcome {
            Ok(done) => done,
            Err(err) => {
                warn!(code = err.code(), error = %err, "receipt rejected");
                return Err(err);
            }
        };

        info!(
            lines = purchase.lines().len(),
            ledger_head = receipt.ledger_head,
            "purchase received"
        );

        self.publish(
            &receipt,
            LedgerEvent::PurchaseReceived(PurchaseReceived {
                purchase_id,
                line_count: purchase.lines().len(),
                occurred_at: purchase.received_at().unwrap_or_else(Utc::now),
            }),
        );

        Ok(purchase)
    }
}
