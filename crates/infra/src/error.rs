//! Error surface of the ledger orchestrators.
//!
//! Domain failures, store failures and authorization failures are folded into
//! one enum so callers get a single, stable set of outcomes per operation.

use thiserror::Error;

use stockpilot_auth::AuthzError;
use stockpilot_core::{DomainError, ProductId, PurchaseId};

use crate::store::StoreError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A referenced product, purchase or invoice does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A sale (or negative adjustment) would drive stock below zero.
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

    /// The purchase was already received; nothing was changed.
    #[error("purchase {purchase_id} already received")]
    AlreadyReceived { purchase_id: PurchaseId },

    /// Malformed or contradictory input (zero quantity, empty lines, duplicate SKU, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Every attempt lost an optimistic concurrency race.
    #[error("gave up after {attempts} conflicting attempts")]
    ConflictRetryExhausted { attempts: u32 },

    /// The acting principal may not perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Store(StoreError),
}

impl LedgerError {
    /// Stable machine-readable code, e.g. for an HTTP or CLI adapter.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::NotFound { .. } => "not_found",
            LedgerError::InsufficientStock { .. } => "insufficient_stock",
            LedgerError::AlreadyReceived { .. } => "already_received",
            LedgerError::InvalidInput(_) => "invalid_input",
            LedgerError::ConflictRetryExhausted { .. } => "conflict_retry_exhausted",
            LedgerError::Forbidden(_) => "forbidden",
            LedgerError::Store(StoreError::Conflict(_)) => "conflict",
            LedgerError::Store(_) => "store",
        }
    }

    /// Whether the whole unit of work may be re-run from scratch.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Store(StoreError::Conflict(_)))
    }
}

impl From<DomainError> for LedgerError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) | DomainError::InvalidState(msg) => {
                LedgerError::InvalidInput(msg)
            }
            DomainError::NotFound { entity, id } => LedgerError::NotFound { entity, id },
            DomainError::InsufficientStock {
                product_id,
                sku,
                requested,
                available,
                shortfall,
            } => LedgerError::InsufficientStock {
                product_id,
                sku,
                requested,
                available,
                shortfall,
            },
            DomainError::AlreadyReceived { purchase_id } => LedgerError::AlreadyReceived { purchase_id },
            DomainError::Conflict(msg) => LedgerError::Store(StoreError::Conflict(msg)),
            DomainError::Unauthorized => LedgerError::Forbidden("unauthorized".to_string()),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateKey(msg) => LedgerError::InvalidInput(format!("duplicate key: {msg}")),
            other => LedgerError::Store(other),
        }
    }
}

impl From<AuthzError> for LedgerError {
    fn from(value: AuthzError) -> Self {
        LedgerError::Forbidden(value.to_string())
    }
}
