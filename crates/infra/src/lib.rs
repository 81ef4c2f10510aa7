//! Infrastructure layer: unit-of-work storage, the stock ledger primitive, the
//! event orchestrators that drive it, and read-side projections.

pub mod config;
pub mod error;
pub mod guarded;
pub mod ledger;
pub mod projections;
pub mod retry;
pub mod service;
pub mod store;


pub use crate::config::{LedgerSettings, LoggingSettings, ReportSettings, StockpilotConfig};
pub use error::LedgerError;
pub use guarded::Guarded;
pub use ledger::apply_movement;
pub use projections::{StockLevel, StockLevelProjection, StockLevelProjectionError};
pub use retry::RetryPolicy;
pub use service::{AdjustStock, LISTING_LIMIT, LedgerEnvelope, LedgerService, StockAdjustment};
pub use store::{
    CommitReceipt, InMemoryLedgerStore, InMemoryUnitOfWork, LedgerStore, StoreError, UnitOfWork,
};
