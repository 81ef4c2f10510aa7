use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockpilot_core::{DomainError, DomainResult, Entity, InvoiceId, Money, ProductId};

/// Optional customer details printed on the invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub phone: Option<String>,
}

/// One sold line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub product_id: ProductId,
    pub quantity: i64,
    /// Unit selling price in minor units.
    pub unit_price: Money,
}

impl InvoiceLine {
    pub fn new(product_id: ProductId, quantity: i64, unit_price: Money) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
        }
    }

    pub fn extended(&self) -> DomainResult<Money> {
        self.unit_price
            .checked_mul_qty(self.quantity)
            .ok_or_else(|| DomainError::validation("line amount overflow"))
    }
}

/// Command: create an invoice (sell stock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInvoice {
    pub customer: Option<Customer>,
    pub lines: Vec<InvoiceLine>,
    #[serde(default)]
    pub tax: Money,
    #[serde(default)]
    pub discount: Money,
    #[serde(default = "default_paid")]
    pub paid: bool,
}

fn default_paid() -> bool {
    true
}

impl CreateInvoice {
    pub fn new(lines: Vec<InvoiceLine>) -> Self {
        Self {
            customer: None,
            lines,
            tax: Money::ZERO,
            discount: Money::ZERO,
            paid: true,
        }
    }

    pub fn with_customer(mut self, name: impl Into<String>, phone: Option<String>) -> Self {
        self.customer = Some(Customer {
            name: name.into(),
            phone,
        });
        self
    }

    pub fn with_tax(mut self, tax: Money) -> Self {
        self.tax = tax;
        self
    }

    pub fn with_discount(mut self, discount: Money) -> Self {
        self.discount = discount;
        self
    }

    /// Shape checks that need no stock data: at least one line, positive quantities.
    pub fn validate(&self) -> DomainResult<()> {
        if self.lines.is_empty() {
            return Err(DomainError::validation("invoice must have at least one line"));
        }
        if let Some(line) = self.lines.iter().find(|l| l.quantity <= 0) {
            return Err(DomainError::validation(format!(
                "quantity for product {} must be positive (got {})",
                line.product_id, line.quantity
            )));
        }
        if let Some(customer) = &self.customer {
            if customer.name.trim().is_empty() {
                return Err(DomainError::validation("customer name cannot be empty"));
            }
        }
        Ok(())
    }

    /// Total quantity requested per product, across lines.
    pub fn requested_by_product(&self) -> DomainResult<BTreeMap<ProductId, i64>> {
        let mut requested = BTreeMap::new();
        for line in &self.lines {
            let total = requested.entry(line.product_id).or_insert(0i64);
            *total = total.checked_add(line.quantity).ok_or_else(|| {
                DomainError::validation(format!(
                    "requested quantity for product {} overflows",
                    line.product_id
                ))
            })?;
        }
        Ok(requested)
    }
}

/// Computed invoice amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
}

impl InvoiceTotals {
    /// `subtotal = Σ quantity × unit_price`; `total = max(0, subtotal + tax − discount)`.
    ///
    /// A discount larger than subtotal + tax clamps the total to zero.
    pub fn compute(lines: &[InvoiceLine], tax: Money, discount: Money) -> DomainResult<Self> {
        let extended = lines
            .iter()
            .map(InvoiceLine::extended)
            .collect::<DomainResult<Vec<_>>>()?;
        let subtotal = Money::checked_sum(extended)
            .ok_or_else(|| DomainError::validation("invoice subtotal overflow"))?;
        let gross = subtotal
            .checked_add(tax)
            .ok_or_else(|| DomainError::validation("invoice total overflow"))?;

        Ok(Self {
            subtotal,
            tax,
            discount,
            total: gross.saturating_sub(discount),
        })
    }
}

/// A stored invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,
    customer: Option<Customer>,
    lines: Vec<InvoiceLine>,
    totals: InvoiceTotals,
    paid: bool,
    created_at: DateTime<Utc>,
}

impl Invoice {
    pub fn issue(id: InvoiceId, cmd: &CreateInvoice, created_at: DateTime<Utc>) -> DomainResult<Self> {
        cmd.validate()?;
        let totals = InvoiceTotals::compute(&cmd.lines, cmd.tax, cmd.discount)?;

        Ok(Self {
            id,
            customer: cmd.customer.clone(),
            lines: cmd.lines.clone(),
            totals,
            paid: cmd.paid,
            created_at,
        })
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn lines(&self) -> &[InvoiceLine] {
        &self.lines
    }

    pub fn totals(&self) -> InvoiceTotals {
        self.totals
    }

    pub fn subtotal(&self) -> Money {
        self.totals.subtotal
    }

    pub fn total(&self) -> Money {
        self.totals.total
    }

    pub fn paid(&self) -> bool {
        self.paid
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
