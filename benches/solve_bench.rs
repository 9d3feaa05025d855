use criterion::{criterion_group, criterion_main, Criterion};
use hhspec::solving::{solve_continuous, solve_discrete};
use hhspec::{ContinuousOptions, DiscreteOptions, HouseholdParams};
use std::hint::black_box;

fn bench_discrete_grid(c: &mut Criterion) {
    let params = HouseholdParams::default().with_structural(0.6, 0.5);
    let mut group = c.benchmark_group("discrete_grid");
    group.sample_size(10);
    for parallel in [false, true] {
        let options = DiscreteOptions {
            grid_points: 49,
            parallel,
        };
        let name = if parallel { "rayon" } else { "serial" };
        group.bench_function(name, |b| {
            b.iter(|| solve_discrete(black_box(&params), &options, false))
        });
    }
    group.finish();
}

fn bench_continuous(c: &mut Criterion) {
    let params = HouseholdParams::default().with_structural(0.6, 0.5);
    let options = ContinuousOptions::default();
    c.bench_function("continuous_cobyla", |b| {
        b.iter(|| solve_continuous(black_box(&params), &options, false))
    });
}

criterion_group!(benches, bench_discrete_grid, bench_continuous);
criterion_main!(benches);
