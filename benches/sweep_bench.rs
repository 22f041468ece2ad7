use contractlab::contracts::{QuantityFlexibilityContract, WholesaleContract};
use contractlab::core::{Contract, CostStructure};
use contractlab::curves::{ORDER_SWEEP_POINTS, order_quantity_axis};
use contractlab::demand::DemandModel;
use contractlab::math::{QuadratureSettings, integrate_to_infinity, normal_pdf};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

// Target guideline:
// - a full 70-point expected-profit sweep under normal demand well below 10ms once cached.

fn bench_wholesale_sweep(c: &mut Criterion) {
    let demand = DemandModel::normal(100.0, 20.0).unwrap();
    let contract = WholesaleContract::default();
    let costs = CostStructure::none().with_salvage(10.0);
    let quantities = order_quantity_axis(contract.order_qty, &demand);

    let mut group = c.benchmark_group("wholesale_expected_sweep");
    group.throughput(Throughput::Elements(ORDER_SWEEP_POINTS as u64));
    group.bench_function("normal_cached", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for q in &quantities {
                acc += contract
                    .expected_profit(black_box(*q), &demand, &costs)
                    .unwrap();
            }
            black_box(acc)
        })
    });
    group.finish();
}

fn bench_uncached_quadrature(c: &mut Criterion) {
    let settings = QuadratureSettings::default();
    let mut group = c.benchmark_group("normal_tail_quadrature");
    group.bench_function("expected_min", |b| {
        b.iter(|| {
            let q = black_box(100.0);
            let r = integrate_to_infinity(
                |d| q.min(d) * normal_pdf((d - 100.0) / 20.0) / 20.0,
                0.0,
                &settings,
            )
            .unwrap();
            black_box(r.value)
        })
    });
    group.finish();
}

fn bench_full_report(c: &mut Criterion) {
    let demand = DemandModel::uniform(60.0, 140.0).unwrap();
    let costs = CostStructure::none().with_holding(2.0).with_penalty(5.0);
    let wholesale = WholesaleContract::default();
    let flex = QuantityFlexibilityContract::default();

    let mut group = c.benchmark_group("contract_report");
    group.bench_function("wholesale_uniform", |b| {
        b.iter(|| black_box(wholesale.evaluate(&demand, &costs).unwrap()))
    });
    group.bench_function("quantity_flexibility_uniform", |b| {
        b.iter(|| black_box(flex.evaluate(&demand, &costs).unwrap()))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_wholesale_sweep,
    bench_uncached_quadrature,
    bench_full_report
);
criterion_main!(benches);
