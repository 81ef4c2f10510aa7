//! Read-side projections.
//!
//! Projections consume published ledger envelopes and build query-optimized
//! views. They are:
//! - **Rebuildable**: reconstructed from the store's transaction log
//! - **Idempotent**: safe for at-least-once delivery
//! - **Never authoritative**: invariants are enforced against store rows only

pub mod stock_levels;

pub use stock_levels::{StockLevel, StockLevelProjection, StockLevelProjectionError};
