//! Domain error model.

use thiserror::Error;

use crate::id::{ProductId, PurchaseId};

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, conflicts). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. zero quantity, empty SKU).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced product, purchase or invoice does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Applying the movement would drive `stock_on_hand` below zero.
    #[error(
        "insufficient stock for {sku} ({product_id}): requested {requested}, available {available}, short by {shortfall}"
    )]
    InsufficientStock {
        product_id: ProductId,
        sku: String,
        requested: i64,
        available: i64,
        shortfall: i64,
    },

    /// The purchase already went through receipt.
    #[error("purchase {purchase_id} already received")]
    AlreadyReceived { purchase_id: PurchaseId },

    /// The entity is in a lifecycle state that does not allow the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A conflict occurred (e.g. stale version / optimistic concurrency).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Authorization failure at the domain boundary.
    #[error("unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl core::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn already_received(purchase_id: PurchaseId) -> Self {
        Self::AlreadyReceived { purchase_id }
    }
}
