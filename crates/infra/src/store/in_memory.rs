use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard};

use tracing::{debug, trace};

use stockpilot_core::{Entity, ExpectedVersion, InvoiceId, ProductId, PurchaseId};
use stockpilot_inventory::{Product, StockTransaction, UncommittedTransaction};
use stockpilot_invoicing::Invoice;
use stockpilot_purchasing::Purchase;

use super::r#trait::{CommitReceipt, LedgerStore, StoreError, UnitOfWork};

#[derive(Debug, Clone)]
struct Row<T> {
    value: T,
    version: u64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum RowKey {
    Product(ProductId),
    Purchase(PurchaseId),
}

#[derive(Debug, Default)]
struct State {
    products: HashMap<ProductId, Row<Product>>,
    skus: HashMap<String, ProductId>,
    purchases: HashMap<PurchaseId, Row<Purchase>>,
    invoices: HashMap<InvoiceId, Invoice>,
    transactions: Vec<StockTransaction>,
}

impl State {
    fn version_of(&self, key: RowKey) -> u64 {
        match key {
            RowKey::Product(id) => self.products.get(&id).map(|r| r.version).unwrap_or(0),
            RowKey::Purchase(id) => self.purchases.get(&id).map(|r| r.version).unwrap_or(0),
        }
    }

    fn ledger_head(&self) -> u64 {
        self.transactions.last().map(|t| t.sequence).unwrap_or(0)
    }
}

/// In-memory ledger store with optimistic concurrency.
///
/// Every product and purchase row carries a version (0 = absent). A unit of work
/// remembers the version of each row the first time it reads it and stages its
/// writes privately. `commit` takes the write lock once, verifies that none of
/// those rows moved, and then applies everything; otherwise it fails with
/// [`StoreError::Conflict`] and applies nothing.
///
/// No lock is held between `begin` and `commit`, so concurrent events against
/// unrelated products never wait on each other.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }
}

impl LedgerStore for InMemoryLedgerStore {
    type Scope = InMemoryUnitOfWork;

    fn begin(&self) -> Result<Self::Scope, StoreError> {
        Ok(InMemoryUnitOfWork::new(self.state.clone()))
    }

    fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.read()?.products.get(&id).map(|r| r.value.clone()))
    }

    fn products(&self) -> Result<Vec<Product>, StoreError> {
        let state = self.read()?;
        let mut products: Vec<Product> = state.products.values().map(|r| r.value.clone()).collect();
        products.sort_by(|a, b| a.sku().cmp(b.sku()));
        Ok(products)
    }

    fn purchase(&self, id: PurchaseId) -> Result<Option<Purchase>, StoreError> {
        Ok(self.read()?.purchases.get(&id).map(|r| r.value.clone()))
    }

    fn purchases(&self) -> Result<Vec<Purchase>, StoreError> {
        let state = self.read()?;
        let mut purchases: Vec<Purchase> = state.purchases.values().map(|r| r.value.clone()).collect();
        purchases.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id_typed().cmp(&a.id_typed()))
        });
        Ok(purchases)
    }

    fn invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        Ok(self.read()?.invoices.get(&id).cloned())
    }

    fn invoices(&self) -> Result<Vec<Invoice>, StoreError> {
        let state = self.read()?;
        let mut invoices: Vec<Invoice> = state.invoices.values().cloned().collect();
        invoices.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id_typed().cmp(&a.id_typed()))
        });
        Ok(invoices)
    }

    fn transactions(&self) -> Result<Vec<StockTransaction>, StoreError> {
        Ok(self.read()?.transactions.clone())
    }

    fn transactions_for(&self, product_id: ProductId) -> Result<Vec<StockTransaction>, StoreError> {
        Ok(self
            .read()?
            .transactions
            .iter()
            .filter(|t| t.product_id == product_id)
            .cloned()
            .collect())
    }
}

/// A unit of work over [`InMemoryLedgerStore`].
#[derive(Debug)]
pub struct InMemoryUnitOfWork {
    state: Arc<RwLock<State>>,
    read_versions: HashMap<RowKey, u64>,
    inserted: HashSet<RowKey>,
    products: HashMap<ProductId, Product>,
    purchases: HashMap<PurchaseId, Purchase>,
    invoices: Vec<Invoice>,
    transactions: Vec<UncommittedTransaction>,
    finished: bool,
}

impl InMemoryUnitOfWork {
    fn new(state: Arc<RwLock<State>>) -> Self {
        Self {
            state,
            read_versions: HashMap::new(),
            inserted: HashSet::new(),
            products: HashMap::new(),
            purchases: HashMap::new(),
            invoices: Vec::new(),
            transactions: Vec::new(),
            finished: false,
        }
    }

    fn has_staged_writes(&self) -> bool {
        !(self.products.is_empty()
            && self.purchases.is_empty()
            && self.invoices.is_empty()
            && self.transactions.is_empty())
    }

    /// Remember the committed version of `key` the first time the scope touches it.
    fn track(&mut self, key: RowKey, state: &State) {
        self.read_versions
            .entry(key)
            .or_insert_with(|| state.version_of(key));
    }

    fn track_current(&mut self, key: RowKey) -> Result<(), StoreError> {
        if self.read_versions.contains_key(&key) {
            return Ok(());
        }
        let state = self.state.clone();
        let guard = state.read().map_err(|_| StoreError::Poisoned)?;
        self.track(key, &guard);
        Ok(())
    }
}

impl UnitOfWork for InMemoryUnitOfWork {
    fn product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        if let Some(staged) = self.products.get(&id) {
            return Ok(Some(staged.clone()));
        }

        let state = self.state.clone();
        let guard = state.read().map_err(|_| StoreError::Poisoned)?;
        self.track(RowKey::Product(id), &guard);
        Ok(guard.products.get(&id).map(|r| r.value.clone()))
    }

    fn insert_product(&mut self, product: Product) -> Result<(), StoreError> {
        let id = product.id_typed();
        if self.products.contains_key(&id) {
            return Err(StoreError::DuplicateKey(format!("product {id}")));
        }
        let key = RowKey::Product(id);
        self.track_current(key)?;
        self.inserted.insert(key);
        self.products.insert(id, product);
        Ok(())
    }

    fn put_product(&mut self, product: Product) -> Result<(), StoreError> {
        self.track_current(RowKey::Product(product.id_typed()))?;
        self.products.insert(product.id_typed(), product);
        Ok(())
    }

    fn append_transaction(&mut self, transaction: UncommittedTransaction) -> Result<(), StoreError> {
        self.transactions.push(transaction);
        Ok(())
    }

    fn purchase(&mut self, id: PurchaseId) -> Result<Option<Purchase>, StoreError> {
        if let Some(staged) = self.purchases.get(&id) {
            return Ok(Some(staged.clone()));
        }

        let state = self.state.clone();
        let guard = state.read().map_err(|_| StoreError::Poisoned)?;
        self.track(RowKey::Purchase(id), &guard);
        Ok(guard.purchases.get(&id).map(|r| r.value.clone()))
    }

    fn insert_purchase(&mut self, purchase: Purchase) -> Result<(), StoreError> {
        let id = purchase.id_typed();
        if self.purchases.contains_key(&id) {
            return Err(StoreError::DuplicateKey(format!("purchase {id}")));
        }
        let key = RowKey::Purchase(id);
        self.track_current(key)?;
        self.inserted.insert(key);
        self.purchases.insert(id, purchase);
        Ok(())
    }

    fn put_purchase(&mut self, purchase: Purchase) -> Result<(), StoreError> {
        self.track_current(RowKey::Purchase(purchase.id_typed()))?;
        self.purchases.insert(purchase.id_typed(), purchase);
        Ok(())
    }

    fn insert_invoice(&mut self, invoice: Invoice) -> Result<(), StoreError> {
        if self.invoices.iter().any(|i| i.id() == invoice.id()) {
            return Err(StoreError::DuplicateKey(format!("invoice {}", invoice.id())));
        }
        self.invoices.push(invoice);
        Ok(())
    }

    fn commit(mut self) -> Result<CommitReceipt, StoreError> {
        self.finished = true;

        let state_handle = self.state.clone();
        let mut state = state_handle.write().map_err(|_| StoreError::Poisoned)?;

        // 1) Validate everything before touching anything.
        for (key, read) in &self.read_versions {
            ExpectedVersion::Exact(*read)
                .check(state.version_of(*key))
                .map_err(|err| StoreError::Conflict(format!("{key:?}: {err}")))?;
        }

        for key in &self.inserted {
            if state.version_of(*key) != 0 {
                return Err(StoreError::DuplicateKey(format!("{key:?} already exists")));
            }
            if let RowKey::Product(id) = key {
                if let Some(product) = self.products.get(id) {
                    if let Some(owner) = state.skus.get(product.sku()) {
                        if owner != id {
                            return Err(StoreError::DuplicateKey(format!("sku {}", product.sku())));
                        }
                    }
                }
            }
        }

        let mut new_skus = HashSet::new();
        for key in &self.inserted {
            if let RowKey::Product(id) = key {
                if let Some(product) = self.products.get(id) {
                    if !new_skus.insert(product.sku().to_string()) {
                        return Err(StoreError::DuplicateKey(format!("sku {}", product.sku())));
                    }
                }
            }
        }

        for invoice in &self.invoices {
            if state.invoices.contains_key(&invoice.id_typed()) {
                return Err(StoreError::DuplicateKey(format!("invoice {}", invoice.id_typed())));
            }
        }

        // 2) Apply (cannot fail from here on).
        for (id, product) in self.products.drain() {
            if self.inserted.contains(&RowKey::Product(id)) {
                state.skus.insert(product.sku().to_string(), id);
            }
            let version = state.version_of(RowKey::Product(id)) + 1;
            state.products.insert(id, Row { value: product, version });
        }

        for (id, purchase) in self.purchases.drain() {
            let version = state.version_of(RowKey::Purchase(id)) + 1;
            state.purchases.insert(id, Row { value: purchase, version });
        }

        for invoice in self.invoices.drain(..) {
            state.invoices.insert(invoice.id_typed(), invoice);
        }

        let mut next = state.ledger_head() + 1;
        let mut committed = Vec::with_capacity(self.transactions.len());
        for pending in self.transactions.drain(..) {
            let stored = pending.commit(next);
            next += 1;
            state.transactions.push(stored.clone());
            committed.push(stored);
        }

        let ledger_head = state.ledger_head();
        trace!(
            rows = committed.len(),
            ledger_head,
            "unit of work committed"
        );

        Ok(CommitReceipt {
            transactions: committed,
            ledger_head,
        })
    }

    fn abort(mut self) {
        self.finished = true;
        debug!(
            staged_transactions = self.transactions.len(),
            "unit of work aborted"
        );
    }
}

impl Drop for InMemoryUnitOfWork {
    fn drop(&mut self) {
        if !self.finished && self.has_staged_writes() {
            debug!(
                staged_transactions = self.transactions.len(),
                "unit of work dropped without commit; staged writes discarded"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockpilot_core::{Money, SupplierId};
    use stockpilot_inventory::{CostPolicy, Movement, NewProduct};
    use stockpilot_purchasing::{CreatePurchase, PurchaseLine};

    fn seed(store: &InMemoryLedgerStore, sku: &str, stock: i64) -> ProductId {
        let id = ProductId::new();
        let product = Product::register(id, NewProduct::new(sku, sku).with_initial_stock(stock)).unwrap();
        let mut uow = store.begin().unwrap();
        uow.insert_product(product).unwrap();
        uow.commit().unwrap();
        id
    }

    fn adjust(uow: &mut InMemoryUnitOfWork, id: ProductId, delta: i64) {
        let mut product = uow.product(id).unwrap().unwrap();
        let plan = product
            .plan_movement(&Movement::adjustment(id, delta, None), CostPolicy::Latest, Utc::now())
            .unwrap();
        product.apply_plan(&plan).unwrap();
        uow.put_product(product).unwrap();
        uow.append_transaction(plan.transaction).unwrap();
    }

    #[test]
    fn staged_writes_are_invisible_until_commit() {
        let store = InMemoryLedgerStore::new();
        let id = seed(&store, "A", 10);

        let mut uow = store.begin().unwrap();
        adjust(&mut uow, id, -4);
        assert_eq!(uow.product(id).unwrap().unwrap().stock_on_hand(), 6);
        assert_eq!(store.product(id).unwrap().unwrap().stock_on_hand(), 10);
        assert!(store.transactions().unwrap().is_empty());

        let receipt = uow.commit().unwrap();
        assert_eq!(receipt.transactions.len(), 1);
        assert_eq!(receipt.transactions[0].sequence, 1);
        assert_eq!(receipt.ledger_head, 1);
        assert_eq!(store.product(id).unwrap().unwrap().stock_on_hand(), 6);
    }

    #[test]
    fn dropped_scope_rolls_back() {
        let store = InMemoryLedgerStore::new();
        let id = seed(&store, "A", 10);

        {
            let mut uow = store.begin().unwrap();
            adjust(&mut uow, id, -4);
        }

        let mut uow = store.begin().unwrap();
        adjust(&mut uow, id, 1);
        uow.abort();

        assert_eq!(store.product(id).unwrap().unwrap().stock_on_hand(), 10);
        assert!(store.transactions().unwrap().is_empty());
    }

    #[test]
    fn second_writer_on_same_row_conflicts() {
        let store = InMemoryLedgerStore::new();
        let id = seed(&store, "A", 10);

        let mut first = store.begin().unwrap();
        let mut second = store.begin().unwrap();
        adjust(&mut first, id, -6);
        adjust(&mut second, id, -6);

        first.commit().unwrap();
        let err = second.commit().unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        assert_eq!(store.product(id).unwrap().unwrap().stock_on_hand(), 4);
        assert_eq!(store.transactions().unwrap().len(), 1);
    }

    #[test]
    fn unrelated_rows_commit_independently() {
        let store = InMemoryLedgerStore::new();
        let a = seed(&store, "A", 10);
        let b = seed(&store, "B", 10);

        let mut first = store.begin().unwrap();
        let mut second = store.begin().unwrap();
        adjust(&mut first, a, -1);
        adjust(&mut second, b, -1);

        first.commit().unwrap();
        let receipt = second.commit().unwrap();
        assert_eq!(receipt.transactions[0].sequence, 2);
    }

    #[test]
    fn duplicate_sku_is_rejected_at_commit() {
        let store = InMemoryLedgerStore::new();
        seed(&store, "SKU-1", 0);

        let product = Product::register(ProductId::new(), NewProduct::new("SKU-1", "again")).unwrap();
        let mut uow = store.begin().unwrap();
        uow.insert_product(product).unwrap();
        assert!(matches!(uow.commit(), Err(StoreError::DuplicateKey(_))));
        assert_eq!(store.products().unwrap().len(), 1);
    }

    #[test]
    fn purchase_rows_are_versioned_too() {
        let store = InMemoryLedgerStore::new();
        let purchase = Purchase::create(
            PurchaseId::new(),
            &CreatePurchase {
                supplier_id: SupplierId::new(),
                lines: vec![PurchaseLine::new(ProductId::new(), 1, Money::ZERO)],
            },
            Utc::now(),
        )
        .unwrap();
        let id = purchase.id_typed();

        let mut uow = store.begin().unwrap();
        uow.insert_purchase(purchase).unwrap();
        uow.commit().unwrap();

        let mut first = store.begin().unwrap();
        let mut second = store.begin().unwrap();
        let mut p1 = first.purchase(id).unwrap().unwrap();
        let mut p2 = second.purchase(id).unwrap().unwrap();
        p1.mark_received(Utc::now()).unwrap();
        p2.cancel().unwrap();
        first.put_purchase(p1).unwrap();
        second.put_purchase(p2).unwrap();

        first.commit().unwrap();
        assert!(matches!(second.commit(), Err(StoreError::Conflict(_))));
    }
}
