use common::{ProductId, UserId};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use domain::{Money, Order, OrderItem, OrderNumber, OrderStatus};

fn order_with_items(count: usize) -> Order {
    let mut order = Order::builder(OrderNumber::generate(), UserId::new(1)).build();
    for i in 0..count {
        let item = OrderItem::new(
            ProductId::new(i as i64),
            "Benchmark Widget",
            "SKU-BENCH",
            (i % 5 + 1) as u32,
            Money::from_cents(1999),
        )
        .unwrap();
        order.add_item(item);
    }
    order
}

fn bench_recompute_total(c: &mut Criterion) {
    let mut group = c.benchmark_group("domain/recompute_total");

    for count in [1, 10, 100] {
        let mut order = order_with_items(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                order.recompute_total().unwrap();
                std::hint::black_box(order.total_amount());
            });
        });
    }

    group.finish();
}

fn bench_build_order(c: &mut Criterion) {
    c.bench_function("domain/build_order_10_items", |b| {
        b.iter(|| {
            let mut order = order_with_items(10);
            order.recompute_total().unwrap();
            std::hint::black_box(order);
        });
    });
}

fn bench_transition_table(c: &mut Criterion) {
    c.bench_function("domain/transition_table_full_scan", |b| {
        b.iter(|| {
            let mut allowed = 0;
            for from in OrderStatus::ALL {
                for to in OrderStatus::ALL {
                    if from.can_transition_to(to) {
                        allowed += 1;
                    }
                }
            }
            std::hint::black_box(allowed);
        });
    });
}

criterion_group!(
    benches,
    bench_recompute_total,
    bench_build_order,
    bench_transition_table
);
criterion_main!(benches);
