use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockpilot_core::{DomainError, DomainResult, Entity, Money, ProductId, PurchaseId, SupplierId};
use stockpilot_inventory::BatchTag;

/// Purchase lifecycle.
///
/// ```text
/// PO ──receive──▶ RECEIVED
///  └──cancel───▶ CANCELLED
/// ```
///
/// Both transitions are one-way; RECEIVED and CANCELLED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PurchaseStatus {
    Po,
    Received,
    Cancelled,
}

/// Purchase line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub product_id: ProductId,
    pub quantity: i64,
    /// Unit cost in minor units.
    pub unit_cost: Money,
    pub batch: Option<BatchTag>,
}

impl PurchaseLine {
    pub fn new(product_id: ProductId, quantity: i64, unit_cost: Money) -> Self {
        Self {
            product_id,
            quantity,
            unit_cost,
            batch: None,
        }
    }

    pub fn with_batch(mut self, batch: BatchTag) -> Self {
        self.batch = Some(batch);
        self
    }
}

/// Command: CreatePurchase (records a PO; no stock changes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePurchase {
    pub supplier_id: SupplierId,
    pub lines: Vec<PurchaseLine>,
}

/// A purchase order and, once received, its receipt stamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    id: PurchaseId,
    supplier_id: SupplierId,
    status: PurchaseStatus,
    lines: Vec<PurchaseLine>,
    total_cost: Money,
    created_at: DateTime<Utc>,
    received_at: Option<DateTime<Utc>>,
}

impl Purchase {
    pub fn create(id: PurchaseId, cmd: &CreatePurchase, created_at: DateTime<Utc>) -> DomainResult<Self> {
        if cmd.lines.is_empty() {
            return Err(DomainError::validation("purchase must have at least one line"));
        }
        if let Some(line) = cmd.lines.iter().find(|l| l.quantity <= 0) {
            return Err(DomainError::validation(format!(
                "quantity for product {} must be positive (got {})",
                line.product_id, line.quantity
            )));
        }

        let total_cost = cmd
            .lines
            .iter()
            .map(|l| l.unit_cost.checked_mul_qty(l.quantity))
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(m?))
            .ok_or_else(|| DomainError::validation("purchase total overflow"))?;

        Ok(Self {
            id,
            supplier_id: cmd.supplier_id,
            status: PurchaseStatus::Po,
            lines: cmd.lines.clone(),
            total_cost,
            created_at,
            received_at: None,
        })
    }

    pub fn id_typed(&self) -> PurchaseId {
        self.id
    }

    pub fn supplier_id(&self) -> SupplierId {
        self.supplier_id
    }

    pub fn status(&self) -> PurchaseStatus {
        self.status
    }

    pub fn lines(&self) -> &[PurchaseLine] {
        &self.lines
    }

    pub fn total_cost(&self) -> Money {
        self.total_cost
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.received_at
    }

    /// Invariant: a purchase is received at most once, and never after cancellation.
    pub fn ensure_receivable(&self) -> DomainResult<()> {
        match self.status {
            PurchaseStatus::Po => Ok(()),
            PurchaseStatus::Received => Err(DomainError::already_received(self.id)),
            PurchaseStatus::Cancelled => Err(DomainError::invalid_state(format!(
                "purchase {} is cancelled",
                self.id
            ))),
        }
    }

    /// PO → RECEIVED. Stock movements for the lines must be applied in the same unit of work.
    pub fn mark_received(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_receivable()?;
        self.status = PurchaseStatus::Received;
        self.received_at = Some(at);
        Ok(())
    }

    /// PO → CANCELLED.
    pub fn cancel(&mut self) -> DomainResult<()> {
        match self.status {
            PurchaseStatus::Po => {
                self.status = PurchaseStatus::Cancelled;
                Ok(())
            }
            PurchaseStatus::Received => Err(DomainError::already_received(self.id)),
            PurchaseStatus::Cancelled => Err(DomainError::invalid_state(format!(
                "purchase {} is already cancelled",
                self.id
            ))),
        }
    }
}

impl Entity for Purchase {
    type Id = PurchaseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn po(lines: Vec<PurchaseLine>) -> Purchase {
        Purchase::create(
            PurchaseId::new(),
            &CreatePurchase {
                supplier_id: SupplierId::new(),
                lines,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn create_computes_total_cost() {
        let p = po(vec![
            PurchaseLine::new(ProductId::new(), 50, Money::from_minor(120)),
            PurchaseLine::new(ProductId::new(), 30, Money::from_minor(80)),
        ]);
        assert_eq!(p.total_cost(), Money::from_minor(8400));
        assert_eq!(p.status(), PurchaseStatus::Po);
        assert_eq!(p.received_at(), None);
    }

    #[test]
    fn create_rejects_non_positive_quantity() {
        let err = Purchase::create(
            PurchaseId::new(),
            &CreatePurchase {
                supplier_id: SupplierId::new(),
                lines: vec![PurchaseLine::new(ProductId::new(), 0, Money::ZERO)],
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn receive_is_one_way() {
        let mut p = po(vec![PurchaseLine::new(ProductId::new(), 1, Money::ZERO)]);
        p.mark_received(Utc::now()).unwrap();
        assert_eq!(p.status(), PurchaseStatus::Received);
        assert!(p.received_at().is_some());

        let err = p.mark_received(Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::already_received(p.id_typed()));
        assert!(matches!(p.cancel(), Err(DomainError::AlreadyReceived { .. })));
    }

    #[test]
    fn cancelled_purchase_cannot_be_received() {
        let mut p = po(vec![PurchaseLine::new(ProductId::new(), 1, Money::ZERO)]);
        p.cancel().unwrap();
        assert!(matches!(p.ensure_receivable(), Err(DomainError::InvalidState(_))));
        assert!(matches!(p.cancel(), Err(DomainError::InvalidState(_))));
    }

    #[test]
    fn status_serializes_like_the_wire_enum() {
        assert_eq!(serde_json::to_string(&PurchaseStatus::Po).unwrap(), "\"PO\"");
        assert_eq!(
            serde_json::to_string(&PurchaseStatus::Received).unwrap(),
            "\"RECEIVED\""
        );
    }
}
