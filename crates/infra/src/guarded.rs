//! Permission-checked view of a [`LedgerService`].
//!
//! The ledger itself never authorizes; callers that want the role gate applied
//! in-process go through `service.as_principal(&principal)`.

use tracing::warn;

use stockpilot_auth::{Permission, Principal, authorize, ensure_active};
use stockpilot_core::{InvoiceId, Money, ProductId, PurchaseId};
use stockpilot_events::EventBus;
use stockpilot_inventory::{NewProduct, Product, ReconciliationReport, StockTransaction};
use stockpilot_invoicing::{CreateInvoice, Invoice};
use stockpilot_purchasing::{CreatePurchase, Purchase};

use crate::error::LedgerError;
use crate::service::{AdjustStock, LedgerEnvelope, LedgerService, StockAdjustment};
use crate::store::LedgerStore;

#[derive(Debug)]
pub struct Guarded<'a, S, B> {
    service: &'a LedgerService<S, B>,
    principal: &'a Principal,
}

impl<S, B> LedgerService<S, B>
where
    S: LedgerStore,
    B: EventBus<LedgerEnvelope>,
{
    pub fn as_principal<'a>(&'a self, principal: &'a Principal) -> Guarded<'a, S, B> {
        Guarded {
            service: self,
            principal,
        }
    }
}

impl<S, B> Guarded<'_, S, B>
where
    S: LedgerStore,
    B: EventBus<LedgerEnvelope>,
{
    fn check(&self, permission: Permission) -> Result<(), LedgerError> {
        authorize(self.principal, permission).map_err(|err| {
            warn!(user_id = %self.principal.user_id, %permission, "permission denied");
            LedgerError::from(err)
        })
    }

    fn check_active(&self) -> Result<(), LedgerError> {
        ensure_active(self.principal).map_err(|err| {
            warn!(user_id = %self.principal.user_id, "inactive account");
            LedgerError::from(err)
        })
    }

    pub fn principal(&self) -> &Principal {
        self.principal
    }

    pub fn create_invoice(&self, cmd: CreateInvoice) -> Result<Invoice, LedgerError> {
        self.check(Permission::CreateInvoice)?;
        self.service.create_invoice(cmd)
    }

    pub fn invoice(&self, id: InvoiceId) -> Result<Invoice, LedgerError> {
        self.check(Permission::ViewInvoices)?;
        self.service.invoice(id)
    }

    pub fn invoices(&self) -> Result<Vec<Invoice>, LedgerError> {
        self.check(Permission::ViewInvoices)?;
        self.service.invoices()
    }

    pub fn create_purchase(&self, cmd: CreatePurchase) -> Result<Purchase, LedgerError> {
        self.check(Permission::CreatePurchase)?;
        self.service.create_purchase(cmd)
    }

    pub fn purchase(&self, id: PurchaseId) -> Result<Purchase, LedgerError> {
        self.check(Permission::ViewPurchases)?;
        self.service.purchase(id)
    }

    pub fn purchases(&self) -> Result<Vec<Purchase>, LedgerError> {
        self.check(Permission::ViewPurchases)?;
        self.service.purchases()
    }

    pub fn receive_purchase(&self, id: PurchaseId) -> Result<Purchase, LedgerError> {
        self.check(Permission::ReceivePurchase)?;
        self.service.receive_purchase(id)
    }

    pub fn cancel_purchase(&self, id: PurchaseId) -> Result<Purchase, LedgerError> {
        self.check(Permission::CancelPurchase)?;
        self.service.cancel_purchase(id)
    }

    pub fn adjust_stock(&self, cmd: AdjustStock) -> Result<StockAdjustment, LedgerError> {
        self.check(Permission::AdjustStock)?;
        self.service.adjust_stock(cmd)
    }

    pub fn register_product(&self, input: NewProduct) -> Result<Product, LedgerError> {
        self.check(Permission::ManageProducts)?;
        self.service.register_product(input)
    }

    /// Catalog reads are open to every active account.
    pub fn product(&self, id: ProductId) -> Result<Product, LedgerError> {
        self.check_active()?;
        self.service.product(id)
    }

    pub fn products(&self) -> Result<Vec<Product>, LedgerError> {
        self.check_active()?;
        self.service.products()
    }

    pub fn low_stock(&self, limit: Option<usize>) -> Result<Vec<Product>, LedgerError> {
        self.check(Permission::ViewLowStock)?;
        self.service.low_stock(limit)
    }

    pub fn reconcile(&self, product_id: ProductId) -> Result<ReconciliationReport, LedgerError> {
        self.check(Permission::ViewReports)?;
        self.service.reconcile(product_id)
    }

    pub fn reconcile_all(&self) -> Result<Vec<ReconciliationReport>, LedgerError> {
        self.check(Permission::ViewReports)?;
        self.service.reconcile_all()
    }

    pub fn stock_valuation(&self) -> Result<Money, LedgerError> {
        self.check(Permission::ViewReports)?;
        self.service.stock_valuation()
    }

    pub fn transactions_for(&self, product_id: ProductId) -> Result<Vec<StockTransaction>, LedgerError> {
        self.check(Permission::ViewReports)?;
        self.service.transactions_for(product_id)
    }

    pub fn transactions(&self) -> Result<Vec<StockTransaction>, LedgerError> {
        self.check(Permission::ViewReports)?;
        self.service.transactions()
    }
}
