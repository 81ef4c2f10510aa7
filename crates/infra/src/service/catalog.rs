//! Product registration, purchase bookkeeping and read-side queries.

use chrono::Utc;
use tracing::{info, instrument, warn};

use stockpilot_core::{DomainError, InvoiceId, Money, ProductId, PurchaseId};
use stockpilot_events::EventBus;
use stockpilot_inventory::{
    LedgerEvent, NewProduct, Product, ProductRegistered, PurchaseCancelled, ReconciliationReport,
    StockTransaction, low_stock, reconcile, stock_valuation,
};
use stockpilot_invoicing::Invoice;
use stockpilot_purchasing::{CreatePurchase, Purchase};

use super::{LISTING_LIMIT, LedgerEnvelope, LedgerService};
use crate::error::LedgerError;
use crate::store::{LedgerStore, UnitOfWork};

impl<S, B> LedgerService<S, B>
where
    S: LedgerStore,
    B: EventBus<LedgerEnvelope>,
{
    /// Add a product to the catalog. Its initial stock is the reconciliation
    /// baseline; no ledger row is written for it.
    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub fn register_product(&self, input: NewProduct) -> Result<Product, LedgerError> {
        let product = Product::register(ProductId::new(), input)?;

        let (product, receipt) = self.retry.run(&self.store, "register_product", |uow| {
            uow.insert_product(product.clone())?;
            Ok(product.clone())
        })?;

        info!(product_id = %product.id_typed(), initial_stock = product.initial_stock(), "product registered");

        self.publish(
            &receipt,
            LedgerEvent::ProductRegistered(ProductRegistered {
                product_id: product.id_typed(),
                sku: product.sku().to_string(),
                initial_stock: product.initial_stock(),
                occurred_at: Utc::now(),
            }),
        );

        Ok(product)
    }

    /// Record a purchase order. Stock is untouched until it is received.
    #[instrument(skip(self, cmd), fields(supplier_id = %cmd.supplier_id, lines = cmd.lines.len()))]
    pub fn create_purchase(&self, cmd: CreatePurchase) -> Result<Purchase, LedgerError> {
        let purchase = Purchase::create(PurchaseId::new(), &cmd, Utc::now())?;

        let (purchase, _) = self.retry.run(&self.store, "create_purchase", |uow| {
            for line in purchase.lines() {
                if uow.product(line.product_id)?.is_none() {
                    return Err(DomainError::not_found("product", line.product_id).into());
                }
            }
            uow.insert_purchase(purchase.clone())?;
            Ok(purchase.clone())
        })?;

        info!(
            purchase_id = %purchase.id_typed(),
            total_cost = %purchase.total_cost(),
            "purchase order created"
        );
        Ok(purchase)
    }

    /// PO → CANCELLED.
    #[instrument(skip(self), fields(purchase_id = %purchase_id))]
    pub fn cancel_purchase(&self, purchase_id: PurchaseId) -> Result<Purchase, LedgerError> {
        let outcome = self.retry.run(&self.store, "cancel_purchase", |uow| {
            let mut purchase = uow
                .purchase(purchase_id)?
                .ok_or_else(|| DomainError::not_found("purchase", purchase_id))?;
            purchase.cancel()?;
            uow.put_purchase(purchase.clone())?;
            Ok(purchase)
        });

        let (purchase, receipt) = outcome.inspect_err(|err| {
            warn!(code = err.code(), error = %err, "cancellation rejected");
        })?;

        info!("purchase cancelled");
        self.publish(
            &receipt,
            LedgerEvent::PurchaseCancelled(PurchaseCancelled {
                purchase_id,
                occurred_at: Utc::now(),
            }),
        );

        Ok(purchase)
    }

    pub fn product(&self, id: ProductId) -> Result<Product, LedgerError> {
        self.store
            .product(id)?
            .ok_or_else(|| DomainError::not_found("product", id).into())
    }

    /// All products, ordered by SKU.
    pub fn products(&self) -> Result<Vec<Product>, LedgerError> {
        Ok(self.store.products()?)
    }

    pub fn purchase(&self, id: PurchaseId) -> Result<Purchase, LedgerError> {
        self.store
            .purchase(id)?
            .ok_or_else(|| DomainError::not_found("purchase", id).into())
    }

    /// The latest purchases, newest first, at most [`LISTING_LIMIT`].
    pub fn purchases(&self) -> Result<Vec<Purchase>, LedgerError> {
        let mut purchases = self.store.purchases()?;
        purchases.truncate(LISTING_LIMIT);
        Ok(purchases)
    }

    pub fn invoice(&self, id: InvoiceId) -> Result<Invoice, LedgerError> {
        self.store
            .invoice(id)?
            .ok_or_else(|| DomainError::not_found("invoice", id).into())
    }

    /// The latest invoices, newest first, at most [`LISTING_LIMIT`].
    pub fn invoices(&self) -> Result<Vec<Invoice>, LedgerError> {
        let mut invoices = self.store.invoices()?;
        invoices.truncate(LISTING_LIMIT);
        Ok(invoices)
    }

    /// Products below their low-stock threshold, lowest stock first.
    /// `None` uses the configured limit.
    pub fn low_stock(&self, limit: Option<usize>) -> Result<Vec<Product>, LedgerError> {
        let products = self.store.products()?;
        Ok(low_stock(&products, limit.unwrap_or(self.low_stock_limit)))
    }

    /// Audit one product: `stock_on_hand == initial_stock + Σ ledger quantity`.
    pub fn reconcile(&self, product_id: ProductId) -> Result<ReconciliationReport, LedgerError> {
        let product = self.product(product_id)?;
        let transactions = self.store.transactions_for(product_id)?;
        Ok(reconcile(&product, &transactions))
    }

    /// Audit every product.
    pub fn reconcile_all(&self) -> Result<Vec<ReconciliationReport>, LedgerError> {
        let transactions = self.store.transactions()?;
        let reports: Vec<ReconciliationReport> = self
            .store
            .products()?
            .iter()
            .map(|p| reconcile(p, &transactions))
            .collect();

        for report in reports.iter().filter(|r| !r.balanced) {
            warn!(product_id = %report.product_id, drift = report.drift(), "ledger out of balance");
        }
        Ok(reports)
    }

    /// Total inventory value at current cost.
    pub fn stock_valuation(&self) -> Result<Money, LedgerError> {
        let products = self.store.products()?;
        stock_valuation(&products).ok_or_else(|| LedgerError::InvalidInput("stock valuation overflow".to_string()))
    }

    /// Ledger rows of one product, ordered by sequence.
    pub fn transactions_for(&self, product_id: ProductId) -> Result<Vec<StockTransaction>, LedgerError> {
        Ok(self.store.transactions_for(product_id)?)
    }

    /// The full ledger, ordered by sequence.
    pub fn transactions(&self) -> Result<Vec<StockTransaction>, LedgerError> {
        Ok(self.store.transactions()?)
    }
}
