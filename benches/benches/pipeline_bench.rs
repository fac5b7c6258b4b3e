//! Criterion-бенчмарки горячих стадий конвертации.
//!
//! Запуск: cargo bench -p bf2fil-benchmark

use std::hint::black_box;

use bf2fil_core::{
    compute_mask, compute_sk_thresholds, quantize_block, BlockGeometry, BlockStats,
    ChannelTransform, MaskParams, QuantLevels,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};

const M: usize = 256;
const SUB_BLOCKS: usize = 8;
const SHAPE: f64 = 12.0;

fn noise_block(geom: &BlockGeometry) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    (0..geom.len()).map(|_| rng.gen_range(0.5f32..1.5)).collect()
}

fn bench_mask(c: &mut Criterion) {
    let mut group = c.benchmark_group("mask");

    for nx in [64usize, 512] {
        let geom = BlockGeometry::new(nx, M, SUB_BLOCKS).unwrap();
        let block = noise_block(&geom);
        let params = MaskParams {
            shape: SHAPE,
            limits: compute_sk_thresholds(M, 4.0, SHAPE).unwrap(),
            tail_limits: None,
        };
        let mut stats = BlockStats::new(&geom);

        group.throughput(Throughput::Elements(geom.len() as u64));
        group.bench_with_input(BenchmarkId::new("compute_mask", nx), &block, |b, block| {
            b.iter(|| compute_mask(black_box(block), &geom, &params, &mut stats).unwrap())
        });
    }

    group.finish();
}

fn bench_quantize(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantize");

    for nx in [64usize, 512] {
        let geom = BlockGeometry::new(nx, M, SUB_BLOCKS).unwrap();
        let block = noise_block(&geom);
        let mut transform = ChannelTransform::new(nx);
        transform.update(&vec![1.0; nx], &vec![0.3; nx], QuantLevels::default());
        let mut out = vec![0u8; geom.len()];

        group.throughput(Throughput::Elements(geom.len() as u64));
        group.bench_with_input(BenchmarkId::new("quantize_block", nx), &block, |b, block| {
            b.iter(|| quantize_block(black_box(block), nx, geom.ny, &transform, &mut out).unwrap())
        });
    }

    group.finish();
}

fn bench_thresholds(c: &mut Criterion) {
    c.bench_function("sk_thresholds_m1024", |b| {
        b.iter(|| compute_sk_thresholds(black_box(1024), black_box(4.0), black_box(SHAPE)).unwrap())
    });
}

criterion_group!(benches, bench_mask, bench_quantize, bench_thresholds);
criterion_main!(benches);
