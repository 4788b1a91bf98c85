use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hpp_core::{CostingContext, FixedCostItem, UsageBasis, VariableCostItem};
use rust_decimal::Decimal;

fn build_context(n_items: usize) -> CostingContext {
    let mut variable_costs = Vec::with_capacity(n_items);
    for i in 0..n_items {
        if i % 2 == 0 {
            variable_costs.push(VariableCostItem::direct(
                format!("Bahan {i}"),
                Decimal::from(500 + i as i64),
            ));
        } else {
            variable_costs.push(VariableCostItem::derived(
                format!("Bahan {i}"),
                UsageBasis {
                    usage_amount: Decimal::from(25),
                    usage_unit: "g".into(),
                    purchase_price: Decimal::from(45_000),
                    purchase_quantity: Decimal::ONE,
                    purchase_unit: "kg".into(),
                },
            ));
        }
    }
    let fixed_costs = (0..n_items)
        .map(|i| FixedCostItem::monthly(format!("Biaya {i}"), Decimal::from(250_000)))
        .collect();
    CostingContext {
        variable_costs,
        fixed_costs,
        target_sales_per_month: Decimal::from(1_000),
    }
}

fn bench_evaluate(c: &mut Criterion) {
    let ctx = build_context(12);
    c.bench_function("evaluate 12 items", |b| {
        b.iter(|| {
            let input = hpp_econ::Evaluation::new(black_box(&ctx))
                .target_profit(Some(Decimal::from(5_000_000)))
                .daily_sales(Some(Decimal::from(40)));
            black_box(hpp_econ::evaluate(&input))
        })
    });
}

fn bench_simulate(c: &mut Criterion) {
    c.bench_function("simulate 1500 units", |b| {
        b.iter(|| {
            black_box(hpp_econ::simulate_with_total(
                Decimal::from(15_500),
                Decimal::from(5_000),
                Decimal::from(3_000_000),
                black_box(hpp_econ::DEFAULT_MAX_UNITS),
            ))
        })
    });
}

criterion_group!(benches, bench_evaluate, bench_simulate);
criterion_main!(benches);
