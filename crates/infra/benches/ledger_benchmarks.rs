use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use stockpilot_core::{Money, ProductId};
use stockpilot_events::InMemoryEventBus;
use stockpilot_infra::projections::StockLevelProjection;
use stockpilot_infra::{AdjustStock, InMemoryLedgerStore, LedgerEnvelope, LedgerService};
use stockpilot_inventory::NewProduct;
use stockpilot_invoicing::{CreateInvoice, InvoiceLine};

type Service = LedgerService<InMemoryLedgerStore, InMemoryEventBus<LedgerEnvelope>>;

const DEEP_STOCK: i64 = 1_000_000_000;

fn catalog(products: usize) -> (Service, Vec<ProductId>) {
    let svc = LedgerService::new(InMemoryLedgerStore::new(), InMemoryEventBus::new());
    let ids = (0..products)
        .map(|i| {
            svc.register_product(
                NewProduct::new(format!("SKU-{}", 1001 + i), format!("Demo Product {}", i + 1))
                    .with_cost_price(Money::from_minor(120))
                    .with_selling_price(Money::from_minor(250))
                    .with_initial_stock(DEEP_STOCK),
            )
            .expect("register product")
            .id_typed()
        })
        .collect();
    (svc, ids)
}

fn sale(ids: &[ProductId]) -> CreateInvoice {
    CreateInvoice::new(
        ids.iter()
            .map(|&p| InvoiceLine::new(p, 1, Money::from_minor(250)))
            .collect(),
    )
}

fn bench_sale_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("sale_latency");

    group.bench_function("single_line_sale", |b| {
        let (svc, ids) = catalog(1);
        b.iter(|| black_box(svc.create_invoice(sale(&ids)).expect("sale")));
    });

    group.bench_function("manual_adjustment", |b| {
        let (svc, ids) = catalog(1);
        b.iter(|| black_box(svc.adjust_stock(AdjustStock::new(ids[0], 1)).expect("adjust")));
    });

    group.finish();
}

fn bench_multi_line_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_line_sale");

    for lines in [1usize, 5, 20].iter() {
        group.throughput(Throughput::Elements(*lines as u64));
        group.bench_with_input(BenchmarkId::new("lines", lines), lines, |b, &lines| {
            let (svc, ids) = catalog(lines);
            b.iter(|| black_box(svc.create_invoice(sale(&ids)).expect("sale")));
        });
    }

    group.finish();
}

fn bench_projection_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection_rebuild");
    group.sample_size(20);

    for rows in [100usize, 1_000, 10_000].iter() {
        let (svc, ids) = catalog(10);
        for i in 0..*rows {
            svc.create_invoice(sale(&ids[i % ids.len()..=i % ids.len()]))
                .expect("sale");
        }
        let products = svc.products().expect("products");
        let transactions = svc.transactions().expect("transactions");

        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), rows, |b, _| {
            b.iter(|| {
                let projection = StockLevelProjection::new();
                projection
                    .rebuild_from_log(&products, &transactions)
                    .expect("rebuild");
                black_box(projection.cursor())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_sale_latency,
    bench_multi_line_throughput,
    bench_projection_rebuild
);
criterion_main!(benches);
