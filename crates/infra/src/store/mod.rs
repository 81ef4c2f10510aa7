//! Ledger persistence boundary.
//!
//! Storage is reached only through a [`UnitOfWork`]: an all-or-nothing scope
//! with row-level product/purchase access and append-only transaction inserts.
//! Committed state can be read outside a scope for reports.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::{InMemoryLedgerStore, InMemoryUnitOfWork};
pub use r#trait::{CommitReceipt, LedgerStore, StoreError, UnitOfWork};
