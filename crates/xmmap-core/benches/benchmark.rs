//! Performance benchmarks for xmmap
//!
//! Run with: cargo bench --package xmmap-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Write;
use xmmap_core::{page_size, RegionConf};

fn bench_anonymous_create_teardown(c: &mut Criterion) {
    let mut group = c.benchmark_group("anonymous_create_teardown");

    for size in [4096, 65536, 1048576].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut region = RegionConf::new().len(size).create().unwrap();
                region.teardown().unwrap();
                black_box(region);
            });
        });
    }
    group.finish();
}

fn bench_file_create_teardown(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_create_teardown");

    for pages in [1usize, 16, 256].iter() {
        let size = pages * page_size().unwrap();
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(&vec![1u8; size]).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &file, |b, file| {
            b.iter(|| {
                let mut region = RegionConf::new().file(file).create().unwrap();
                region.teardown().unwrap();
                black_box(region);
            });
        });
    }
    group.finish();
}

fn bench_repeated_teardown(c: &mut Criterion) {
    c.bench_function("repeated_teardown", |b| {
        let mut region = RegionConf::new().len(4096).create().unwrap();
        region.teardown().unwrap();
        b.iter(|| {
            black_box(region.teardown()).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_anonymous_create_teardown,
    bench_file_create_teardown,
    bench_repeated_teardown,
);
criterion_main!(benches);
