//! Events published after a ledger unit of work commits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockpilot_core::{InvoiceId, Money, ProductId, PurchaseId, TransactionId};
use stockpilot_events::Event;

use crate::transaction::{EventRef, MovementKind, StockTransaction};

/// One committed ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMoved {
    pub transaction_id: TransactionId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub kind: MovementKind,
    pub unit_cost: Money,
    pub reference: Option<EventRef>,
    pub occurred_at: DateTime<Utc>,
}

impl From<&StockTransaction> for StockMoved {
    fn from(t: &StockTransaction) -> Self {
        Self {
            transaction_id: t.id,
            product_id: t.product_id,
            quantity: t.quantity,
            kind: t.kind,
            unit_cost: t.unit_cost,
            reference: t.reference,
            occurred_at: t.occurred_at,
        }
    }
}

/// A product joined the catalog with its opening quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRegistered {
    pub product_id: ProductId,
    pub sku: String,
    pub initial_stock: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceCreated {
    pub invoice_id: InvoiceId,
    pub total: Money,
    pub line_count: usize,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceived {
    pub purchase_id: PurchaseId,
    pub line_count: usize,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseCancelled {
    pub purchase_id: PurchaseId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjusted {
    pub product_id: ProductId,
    pub delta: i64,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    StockMoved(StockMoved),
    ProductRegistered(ProductRegistered),
    InvoiceCreated(InvoiceCreated),
    PurchaseReceived(PurchaseReceived),
    PurchaseCancelled(PurchaseCancelled),
    StockAdjusted(StockAdjusted),
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::StockMoved(_) => "inventory.stock.moved",
            LedgerEvent::ProductRegistered(_) => "inventory.product.registered",
            LedgerEvent::InvoiceCreated(_) => "invoicing.invoice.created",
            LedgerEvent::PurchaseReceived(_) => "purchasing.purchase.received",
            LedgerEvent::PurchaseCancelled(_) => "purchasing.purchase.cancelled",
            LedgerEvent::StockAdjusted(_) => "inventory.stock.adjusted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::StockMoved(e) => e.occurred_at,
            LedgerEvent::ProductRegistered(e) => e.occurred_at,
            LedgerEvent::InvoiceCreated(e) => e.occurred_at,
            LedgerEvent::PurchaseReceived(e) => e.occurred_at,
            LedgerEvent::PurchaseCancelled(e) => e.occurred_at,
            LedgerEvent::StockAdjusted(e) => e.occurred_at,
        }
    }
}
