use chrono::Utc;
use tracing::{info, instrument, warn};

use stockpilot_core::{DomainError, InvoiceId};
use stockpilot_events::EventBus;
use stockpilot_inventory::{InvoiceCreated, LedgerEvent, Movement};
use stockpilot_invoicing::{CreateInvoice, Invoice};

use super::{LedgerEnvelope, LedgerService};
use crate::error::LedgerError;
use crate::ledger::apply_movement;
use crate::store::{LedgerStore, UnitOfWork};

impl<S, B> LedgerService<S, B>
where
    S: LedgerStore,
    B: EventBus<LedgerEnvelope>,
{
    /// Sell stock: store the invoice and deplete every line, all or nothing.
    ///
    /// Availability is checked per product against the sum of its lines before
    /// anything is staged, then enforced again by each movement.
    #[instrument(skip(self, cmd), fields(invoice_id = tracing::field::Empty, lines = cmd.lines.len()))]
    pub fn create_invoice(&self, cmd: CreateInvoice) -> Result<Invoice, LedgerError> {
        cmd.validate()?;
        let requested_by_product = cmd.requested_by_product()?;

        let invoice_id = InvoiceId::new();
        tracing::Span::current().record("invoice_id", tracing::field::display(invoice_id));
        let policy = self.cost_policy;

        let outcome = self.retry.run(&self.store, "create_invoice", |uow| {
            let now = Utc::now();

            for (&product_id, &requested) in &requested_by_product {
                let product = uow
                    .product(product_id)?
                    .ok_or_else(|| DomainError::not_found("product", product_id))?;
                if product.stock_on_hand() < requested {
                    return Err(DomainError::InsufficientStock {
                        product_id,
                        sku: product.sku().to_string(),
                        requested,
                        available: product.stock_on_hand(),
                        shortfall: requested - product.stock_on_hand(),
                    }
                    .into());
                }
            }

            let invoice = Invoice::issue(invoice_id, &cmd, now)?;
            uow.insert_invoice(invoice.clone())?;

            for line in invoice.lines() {
                apply_movement(
                    uow,
                    &Movement::sale(line.product_id, line.quantity, invoice_id),
                    policy,
                    now,
                )?;
            }

            Ok(invoice)
        });

        let (invoice, receipt) = match outcome {
            Ok(done) => done,
            Err(err) => {
                warn!(code = err.code(), error = %err, "sale rejected");
                return Err(err);
            }
        };

        info!(
            total = %invoice.total(),
            ledger_head = receipt.ledger_head,
            "invoice created"
        );

        self.publish(
            &receipt,
            LedgerEvent::InvoiceCreated(InvoiceCreated {
                invoice_id,
                total: invoice.total(),
                line_count: invoice.lines().len(),
                occurred_at: invoice.created_at(),
            }),
        );

        Ok(invoice)
    }
}
