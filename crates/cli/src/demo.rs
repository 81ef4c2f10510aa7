//! Scripted demo session against the in-memory ledger.
//!
//! Mirrors the sample data a fresh install ships with: fifteen products, two
//! purchase orders (one received), three invoices, plus one adjustment and a
//! couple of requests that are expected to be refused.

use anyhow::Context;
use serde::Serialize;
use tracing::info;

use stockpilot_auth::{Principal, Role};
use stockpilot_core::{Money, ProductId, SupplierId, UserId};
use stockpilot_events::{EventBus, InMemoryEventBus};
use stockpilot_infra::{
    AdjustStock, InMemoryLedgerStore, LedgerEnvelope, LedgerError, LedgerService, StockLevelProjection,
};
use stockpilot_inventory::{NewProduct, Product};
use stockpilot_invoicing::{CreateInvoice, InvoiceLine};
use stockpilot_purchasing::{CreatePurchase, PurchaseLine};

type Service = LedgerService<InMemoryLedgerStore, std::sync::Arc<InMemoryEventBus<LedgerEnvelope>>>;

#[derive(Debug, Serialize)]
pub struct ProductRow {
    pub sku: String,
    pub name: String,
    pub stock_on_hand: i64,
    pub cost_price: Money,
    pub low_stock: bool,
}

#[derive(Debug, Serialize)]
pub struct Rejection {
    pub operation: &'static str,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub products: Vec<ProductRow>,
    pub low_stock: Vec<String>,
    pub stock_valuation: Money,
    pub invoice_count: usize,
    pub transaction_count: usize,
    pub ledger_balanced: bool,
    pub projection_consistent: bool,
    pub rejected: Vec<Rejection>,
}

fn seed_product(i: u64) -> NewProduct {
    NewProduct::new(format!("SKU-{}", 1000 + i), format!("Demo Product {i}"))
        .with_cost_price(Money::from_minor(50 + (i * 37) % 500))
        .with_selling_price(Money::from_minor(100 + (i * 73) % 1000))
        .with_low_stock_threshold(5 + (i as i64 * 7) % 20)
        .with_initial_stock((i as i64 * 29) % 120)
}

fn expect_refusal(rejected: &mut Vec<Rejection>, operation: &'static str, outcome: Result<impl Sized, LedgerError>) {
    match outcome {
        Ok(_) => tracing::warn!(operation, "expected refusal but the request succeeded"),
        Err(err) => rejected.push(Rejection {
            operation,
            code: err.code(),
            message: err.to_string(),
        }),
    }
}

pub fn run(service: &Service, bus: &std::sync::Arc<InMemoryEventBus<LedgerEnvelope>>) -> anyhow::Result<Summary> {
    let subscription = bus.subscribe();

    let manager = Principal::new(UserId::new(), Role::Manager);
    let staff = Principal::new(UserId::new(), Role::Staff);
    let as_manager = service.as_principal(&manager);
    let as_staff = service.as_principal(&staff);

    let products: Vec<ProductId> = (1..=15)
        .map(|i| as_manager.register_product(seed_product(i)).map(|p| p.id_typed()))
        .collect::<Result<_, _>>()
        .context("seeding catalog")?;

    let unit_price = |id: ProductId| service.product(id).map(|p| p.selling_price());

    let po1 = as_staff.create_purchase(CreatePurchase {
        supplier_id: SupplierId::new(),
        lines: vec![PurchaseLine::new(products[0], 50, Money::from_minor(120))],
    })?;
    let po2 = as_staff.create_purchase(CreatePurchase {
        supplier_id: SupplierId::new(),
        lines: vec![PurchaseLine::new(products[1], 30, Money::from_minor(80))],
    })?;
    as_manager.receive_purchase(po2.id_typed()).context("receiving purchase")?;
    info!(open_po = %po1.id_typed(), "left one purchase order open");

    for (customer, product, quantity) in [("Walk-in", products[0], 2), ("Walk-in", products[1], 1), ("Online", products[2], 3)] {
        as_staff
            .create_invoice(
                CreateInvoice::new(vec![InvoiceLine::new(product, quantity, unit_price(product)?)])
                    .with_customer(customer, None),
            )
            .context("creating invoice")?;
    }

    as_manager
        .adjust_stock(AdjustStock::new(products[3], -1).with_reason("damaged"))
        .context("adjusting stock")?;

    let mut rejected = Vec::new();
    expect_refusal(
        &mut rejected,
        "adjust_stock",
        as_staff.adjust_stock(AdjustStock::new(products[3], 5)),
    );
    let available = service.product(products[4])?.stock_on_hand();
    expect_refusal(
        &mut rejected,
        "create_invoice",
        as_staff.create_invoice(CreateInvoice::new(vec![InvoiceLine::new(
            products[4],
            available + 1,
            unit_price(products[4])?,
        )])),
    );
    expect_refusal(&mut rejected, "receive_purchase", as_manager.receive_purchase(po2.id_typed()));

    let projection = StockLevelProjection::new();
    for envelope in subscription.drain() {
        projection.apply_envelope(&envelope)?;
    }

    let catalog = service.products()?;
    let projection_consistent = catalog
        .iter()
        .all(|p| projection.quantity(p.id_typed()) == Some(p.stock_on_hand()));

    Ok(Summary {
        products: catalog.iter().map(row).collect(),
        low_stock: service.low_stock(None)?.iter().map(|p| p.sku().to_string()).collect(),
        stock_valuation: service.stock_valuation()?,
        invoice_count: service.invoices()?.len(),
        transaction_count: service.transactions()?.len(),
        ledger_balanced: service.reconcile_all()?.iter().all(|r| r.balanced),
        projection_consistent,
        rejected,
    })
}

fn row(p: &Product) -> ProductRow {
    ProductRow {
        sku: p.sku().to_string(),
        name: p.name().to_string(),
        stock_on_hand: p.stock_on_hand(),
        cost_price: p.cost_price(),
        low_stock: p.is_low_stock(),
    }
}
