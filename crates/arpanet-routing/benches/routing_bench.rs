//! Benchmarks for the routing table
//!
//! Measures performance of:
//! - Relaxation against advertisements of growing size
//! - Table wipe and notice fan-out on invalidation
//! - Destination listing

use arpanet_routing::{AdvertisedRoute, Advertisement, HopCount, NodeId, RoutingConfig, RoutingTable};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Advertisement from `sender` covering `size` destinations.
fn advertisement(sender: &str, size: usize, offset: u32) -> Advertisement {
    let routes = (0..size)
        .map(|i| AdvertisedRoute {
            destination: NodeId::new(format!("D{}", i)),
            hop_count: HopCount::Finite(i as u32 % 16 + offset),
            next_hop: Some(NodeId::new(format!("N{}", i % 8))),
        })
        .collect();
    Advertisement::new(NodeId::from(sender), routes)
}

/// Benchmark relaxation against a fresh table and a converged one
fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");

    for &size in &[10usize, 100, 1_000, 10_000] {
        let adv = advertisement("B", size, 0);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("fresh", size), &adv, |b, adv| {
            b.iter(|| {
                let mut table = RoutingTable::new("A");
                table.update(black_box(adv))
            })
        });

        group.bench_with_input(BenchmarkId::new("converged", size), &adv, |b, adv| {
            // B must not go stale while C keeps advertising.
            let config = RoutingConfig::with_stale_threshold(u64::MAX);
            let mut table = RoutingTable::with_config("A", config).unwrap();
            table.update(adv);
            let worse = advertisement("C", size, 4);
            b.iter(|| table.update(black_box(&worse)))
        });
    }
    group.finish();
}

/// Benchmark invalidation of a populated table
fn bench_invalidation(c: &mut Criterion) {
    let mut group = c.benchmark_group("invalidation");

    for &neighbors in &[2usize, 8, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(neighbors), &neighbors, |b, &n| {
            let mut table = RoutingTable::new("A");
            for i in 0..n {
                table.update(&advertisement(&format!("N{}", i), 1_000, 0));
            }
            b.iter(|| table.start_invalidation(black_box(NodeId::from("N0"))))
        });
    }
    group.finish();
}

/// Benchmark destination listing
fn bench_list_destinations(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_destinations");

    for &size in &[100usize, 1_000, 10_000] {
        let mut table = RoutingTable::new("A");
        table.update(&advertisement("B", size, 0));
        group.bench_with_input(BenchmarkId::from_parameter(size), &table, |b, table| {
            b.iter(|| black_box(table).list_destinations())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_update, bench_invalidation, bench_list_destinations);
criterion_main!(benches);
