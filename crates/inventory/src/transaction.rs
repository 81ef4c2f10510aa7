use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockpilot_core::{InvoiceId, Money, ProductId, PurchaseId, TransactionId, ValueObject};

/// Classification of a stock change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementKind {
    /// Goods received.
    In,
    /// Goods sold or consumed.
    Out,
    /// Manual correction (found stock, shrinkage, count fixes).
    Adj,
}

impl MovementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MovementKind::In => "IN",
            MovementKind::Out => "OUT",
            MovementKind::Adj => "ADJ",
        }
    }
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The business event that caused a movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "model", content = "id", rename_all = "snake_case")]
pub enum EventRef {
    Invoice(InvoiceId),
    Purchase(PurchaseId),
    Adjustment,
}

/// Batch/lot tag recorded on received goods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchTag {
    pub code: Option<String>,
    pub expiry: Option<NaiveDate>,
}

impl ValueObject for BatchTag {}

impl BatchTag {
    pub fn new(code: impl Into<String>, expiry: Option<NaiveDate>) -> Self {
        Self {
            code: Some(code.into()),
            expiry,
        }
    }

    /// A tag with neither code nor expiry carries no information.
    pub fn is_empty(&self) -> bool {
        self.code.as_deref().map(str::trim).unwrap_or_default().is_empty() && self.expiry.is_none()
    }
}

/// A stock transaction decided inside a unit of work but not yet committed.
///
/// The store assigns the ledger `sequence` on commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncommittedTransaction {
    pub id: TransactionId,
    pub product_id: ProductId,
    /// Signed quantity delta (IN positive, OUT negative, ADJ either).
    pub quantity: i64,
    pub kind: MovementKind,
    pub reason: String,
    /// Unit cost snapshot at the time of the movement.
    pub unit_cost: Money,
    pub reference: Option<EventRef>,
    pub batch: Option<BatchTag>,
    pub occurred_at: DateTime<Utc>,
}

impl UncommittedTransaction {
    pub fn commit(self, sequence: u64) -> StockTransaction {
        StockTransaction {
            id: self.id,
            sequence,
            product_id: self.product_id,
            quantity: self.quantity,
            kind: self.kind,
            reason: self.reason,
            unit_cost: self.unit_cost,
            reference: self.reference,
            batch: self.batch,
            occurred_at: self.occurred_at,
        }
    }
}

/// An immutable, committed ledger row.
///
/// Rows are never updated or deleted. Ordering is by `sequence`, which is
/// strictly increasing across the whole ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTransaction {
    pub id: TransactionId,
    pub sequence: u64,
    pub product_id: ProductId,
    pub quantity: i64,
    pub kind: MovementKind,
    pub reason: String,
    pub unit_cost: Money,
    pub reference: Option<EventRef>,
    pub batch: Option<BatchTag>,
    pub occurred_at: DateTime<Utc>,
}
