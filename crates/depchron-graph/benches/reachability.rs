use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use depchron_core::ArtifactTag;
use depchron_graph::graph::{GraphStore, transitive_dependencies, transitive_dependents};
use depchron_graph::metrics::influence_score;

/// Layered graph: every node in layer `l` depends on `fanout` nodes of layer
/// `l + 1`, chosen by a fixed stride so the shape is reproducible.
fn layered(layers: usize, width: usize, fanout: usize) -> GraphStore {
    let node = |layer: usize, i: usize| ArtifactTag::new(format!("bench.l{layer}:n{i}:1.0"));
    let mut edges = Vec::with_capacity(layers * width * fanout);
    for layer in 0..layers.saturating_sub(1) {
        for i in 0..width {
            for k in 0..fanout {
                let j = (i * 7 + k * 13) % width;
                edges.push((node(layer, i), node(layer + 1, j)));
            }
        }
    }
    GraphStore::from_edges(edges)
}

fn bench_reachability(c: &mut Criterion) {
    let mut group = c.benchmark_group("reachability.layered");

    for &(layers, width) in &[(8_usize, 100_usize), (12, 500), (16, 2_000)] {
        let store = layered(layers, width, 4);
        let label = format!("{layers}x{width}");
        let top = "bench.l0:n0:1.0";
        let bottom = format!("bench.l{}:n0:1.0", layers - 1);
        group.throughput(Throughput::Elements(store.edge_count() as u64));

        group.bench_with_input(
            BenchmarkId::new("transitive_dependencies", &label),
            &store,
            |b, store| b.iter(|| black_box(transitive_dependencies(store, top).len())),
        );

        group.bench_with_input(
            BenchmarkId::new("transitive_dependents", &label),
            &store,
            |b, store| b.iter(|| black_box(transitive_dependents(store, &bottom).len())),
        );

        group.bench_with_input(BenchmarkId::new("influence", &label), &store, |b, store| {
            b.iter(|| black_box(influence_score(store, top)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reachability);
criterion_main!(benches);
