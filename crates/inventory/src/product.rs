use serde::{Deserialize, Serialize};

use stockpilot_core::{DomainError, DomainResult, Entity, Money, ProductId};

/// Catalog input for registering a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub cost_price: Money,
    pub selling_price: Money,
    pub low_stock_threshold: i64,
    /// Opening quantity. This is the reconciliation baseline, not a ledger movement.
    pub initial_stock: i64,
}

impl NewProduct {
    pub fn new(sku: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            cost_price: Money::ZERO,
            selling_price: Money::ZERO,
            low_stock_threshold: 0,
            initial_stock: 0,
        }
    }

    pub fn with_cost_price(mut self, cost: Money) -> Self {
        self.cost_price = cost;
        self
    }

    pub fn with_selling_price(mut self, price: Money) -> Self {
        self.selling_price = price;
        self
    }

    pub fn with_low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    pub fn with_initial_stock(mut self, quantity: i64) -> Self {
        self.initial_stock = quantity;
        self
    }
}

/// A product row as seen by the ledger.
///
/// Only `stock_on_hand` and `cost_price` ever change after registration, and only
/// through [`Product::apply_plan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    sku: String,
    name: String,
    stock_on_hand: i64,
    cost_price: Money,
    selling_price: Money,
    low_stock_threshold: i64,
    initial_stock: i64,
}

impl Product {
    pub fn register(id: ProductId, input: NewProduct) -> DomainResult<Self> {
        let sku = input.sku.trim();
        if sku.is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if input.initial_stock < 0 {
            return Err(DomainError::validation("initial stock cannot be negative"));
        }
        if input.low_stock_threshold < 0 {
            return Err(DomainError::validation("low stock threshold cannot be negative"));
        }

        Ok(Self {
            id,
            sku: sku.to_string(),
            name: input.name.trim().to_string(),
            stock_on_hand: input.initial_stock,
            cost_price: input.cost_price,
            selling_price: input.selling_price,
            low_stock_threshold: input.low_stock_threshold,
            initial_stock: input.initial_stock,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stock_on_hand(&self) -> i64 {
        self.stock_on_hand
    }

    pub fn cost_price(&self) -> Money {
        self.cost_price
    }

    pub fn selling_price(&self) -> Money {
        self.selling_price
    }

    pub fn low_stock_threshold(&self) -> i64 {
        self.low_stock_threshold
    }

    pub fn initial_stock(&self) -> i64 {
        self.initial_stock
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock_on_hand < self.low_stock_threshold
    }

    /// `stock_on_hand × cost_price`, `None` on overflow.
    pub fn stock_value(&self) -> Option<Money> {
        self.cost_price.checked_mul_qty(self.stock_on_hand)
    }

    pub(crate) fn set_stock_and_cost(&mut self, stock_on_hand: i64, cost_price: Money) {
        self.stock_on_hand = stock_on_hand;
        self.cost_price = cost_price;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
