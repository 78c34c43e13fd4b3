//! Benchmarks for mapping builds and cached translation.
//!
//! Run with: cargo bench -p sortview-proxy

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use sortview_model::{Model, ModelIndex, TreeModel, TreeRow, Variant};
use sortview_proxy::{ProxyConfig, SortOrder, SortingProxyModel, TieBreak};
use std::hint::black_box;
use std::rc::Rc;

/// Flat model with `n` rows of pseudo-random text and numbers.
fn make_source(n: usize) -> Rc<TreeModel> {
    let model = Rc::new(TreeModel::new(["name", "size"]));
    let root = ModelIndex::invalid();
    let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
    for _ in 0..n {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        let name = format!("item-{:06}", seed % 1_000_000);
        let size = (seed >> 20) as i64 % 100_000;
        model
            .append_row(&root, TreeRow::new([Variant::from(name), Variant::from(size)]))
            .expect("append");
    }
    model
}

fn sorted_proxy(source: &Rc<TreeModel>, column: usize, tie_break: TieBreak) -> SortingProxyModel {
    let config = ProxyConfig::default()
        .with_tie_break(tie_break)
        .with_initial_sort(column, SortOrder::Ascending);
    SortingProxyModel::with_config(source.clone() as Rc<dyn Model>, config).expect("valid sort")
}

fn bench_cold_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_proxy/cold_build");
    for n in [100, 1_000, 10_000] {
        let source = make_source(n);
        for (label, column) in [("text", 0), ("int", 1)] {
            group.bench_with_input(BenchmarkId::new(label, n), &source, |b, source| {
                let proxy = sorted_proxy(source, column, TieBreak::Unspecified);
                b.iter(|| {
                    proxy.invalidate();
                    black_box(proxy.build_mapping(&ModelIndex::invalid()))
                })
            });
        }
        group.bench_with_input(BenchmarkId::new("stable_text", n), &source, |b, source| {
            let proxy = sorted_proxy(source, 0, TieBreak::SourceOrder);
            b.iter(|| {
                proxy.invalidate();
                black_box(proxy.build_mapping(&ModelIndex::invalid()))
            })
        });
    }
    group.finish();
}

fn bench_cached_translation(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_proxy/cached_index");
    for n in [1_000, 10_000] {
        let source = make_source(n);
        let proxy = sorted_proxy(&source, 0, TieBreak::Unspecified);
        let root = ModelIndex::invalid();
        proxy.build_mapping(&root);
        group.bench_with_input(BenchmarkId::new("index_and_map", n), &n, |b, &n| {
            let mut row = 0;
            b.iter(|| {
                row = (row + 7919) % n;
                let index = proxy.index(row, 0, &root);
                black_box(proxy.map_to_source(&index))
            })
        });
    }
    group.finish();
}

fn bench_resort_after_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_proxy/resort_after_update");
    let n = 1_000;
    group.bench_function(BenchmarkId::new("append_then_build", n), |b| {
        b.iter_batched(
            || {
                let source = make_source(n);
                let proxy = sorted_proxy(&source, 0, TieBreak::Unspecified);
                proxy.build_mapping(&ModelIndex::invalid());
                (source, proxy)
            },
            |(source, proxy)| {
                source
                    .append_row(&ModelIndex::invalid(), TreeRow::new(["item-000000"]))
                    .expect("append");
                black_box(proxy.build_mapping(&ModelIndex::invalid()))
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_cold_build,
    bench_cached_translation,
    bench_resort_after_update
);
criterion_main!(benches);
