//! Inventory domain: products, the stock ledger record, and movement rules.
//!
//! Everything here is deterministic domain logic (no IO, no storage). Deciding
//! whether a movement is allowed and what it writes happens in
//! [`Product::plan_movement`]; persisting the outcome atomically is the job of
//! the infrastructure layer's unit of work.

pub mod events;
pub mod movement;
pub mod product;
pub mod reconcile;
pub mod transaction;

pub use events::{
    InvoiceCreated, LedgerEvent, ProductRegistered, PurchaseCancelled, PurchaseReceived, StockAdjusted,
    StockMoved,
};
pub use movement::{CostPolicy, Movement, MovementPlan};
pub use product::{NewProduct, Product};
pub use reconcile::{ReconciliationReport, low_stock, reconcile, stock_valuation};
pub use transaction::{
    BatchTag, EventRef, MovementKind, StockTransaction, UncommittedTransaction,
};
