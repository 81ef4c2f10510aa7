use std::sync::Arc;

use thiserror::Error;

use stockpilot_core::{InvoiceId, ProductId, PurchaseId};
use stockpilot_inventory::{Product, StockTransaction, UncommittedTransaction};
use stockpilot_invoicing::Invoice;
use stockpilot_purchasing::Purchase;

/// Storage-level failure.
///
/// These are infrastructure errors as opposed to domain errors (validation,
/// invariants). `Conflict` is the only retryable one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A row read by the unit of work changed before it could commit.
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    /// An insert collided with an existing key (product id/SKU, purchase id, invoice id).
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// The store's internal lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// What a successful commit wrote to the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Appended rows with their assigned sequence numbers, in append order.
    pub transactions: Vec<StockTransaction>,
    /// Ledger head after the commit (sequence of the last row ever appended).
    pub ledger_head: u64,
}

/// One all-or-nothing scope over the ledger's rows.
///
/// Reads inside the scope observe the scope's own staged writes. Nothing becomes
/// visible to other scopes until [`UnitOfWork::commit`] succeeds. Dropping a
/// scope without committing discards everything it staged.
pub trait UnitOfWork {
    /// Read a product row (staged version first, then committed).
    fn product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Stage a new product row.
    fn insert_product(&mut self, product: Product) -> Result<(), StoreError>;

    /// Stage an update of an existing product row.
    fn put_product(&mut self, product: Product) -> Result<(), StoreError>;

    /// Stage an append-only ledger row.
    fn append_transaction(&mut self, transaction: UncommittedTransaction) -> Result<(), StoreError>;

    fn purchase(&mut self, id: PurchaseId) -> Result<Option<Purchase>, StoreError>;

    fn insert_purchase(&mut self, purchase: Purchase) -> Result<(), StoreError>;

    fn put_purchase(&mut self, purchase: Purchase) -> Result<(), StoreError>;

    fn insert_invoice(&mut self, invoice: Invoice) -> Result<(), StoreError>;

    /// Atomically publish every staged write, or none of them.
    fn commit(self) -> Result<CommitReceipt, StoreError>;

    /// Discard every staged write.
    fn abort(self);
}

/// A ledger store: opens units of work and serves committed reads.
pub trait LedgerStore: Send + Sync {
    type Scope: UnitOfWork;

    fn begin(&self) -> Result<Self::Scope, StoreError>;

    fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// All products, ordered by SKU.
    fn products(&self) -> Result<Vec<Product>, StoreError>;

    fn purchase(&self, id: PurchaseId) -> Result<Option<Purchase>, StoreError>;

    /// All purchases, newest first.
    fn purchases(&self) -> Result<Vec<Purchase>, StoreError>;

    fn invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError>;

    /// All invoices, newest first.
    fn invoices(&self) -> Result<Vec<Invoice>, StoreError>;

    /// The full ledger, ordered by sequence.
    fn transactions(&self) -> Result<Vec<StockTransaction>, StoreError>;

    /// Ledger rows of one product, ordered by sequence.
    fn transactions_for(&self, product_id: ProductId) -> Result<Vec<StockTransaction>, StoreError> {
        Ok(self
            .transactions()?
            .into_iter()
            .filter(|t| t.product_id == product_id)
            .collect())
    }
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    type Scope = S::Scope;

    fn begin(&self) -> Result<Self::Scope, StoreError> {
        (**self).begin()
    }

    fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).product(id)
    }

    fn products(&self) -> Result<Vec<Product>, StoreError> {
        (**self).products()
    }

    fn purchase(&self, id: PurchaseId) -> Result<Option<Purchase>, StoreError> {
        (**self).purchase(id)
    }

    fn purchases(&self) -> Result<Vec<Purchase>, StoreError> {
        (**self).purchases()
    }

    fn invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        (**self).invoice(id)
    }

    fn invoices(&self) -> Result<Vec<Invoice>, StoreError> {
        (**self).invoices()
    }

    fn transactions(&self) -> Result<Vec<StockTransaction>, StoreError> {
        (**self).transactions()
    }

    fn transactions_for(&self, product_id: ProductId) -> Result<Vec<StockTransaction>, StoreError> {
        (**self).transactions_for(product_id)
    }
}
