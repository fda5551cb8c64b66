//! Benchmarks for the pxl engines.
//!
//! Run with: `cargo bench -p pxl-bench`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use pxl_core::{Buffer2D, ExecutionSettings, Rgba8};
use pxl_math::{ProjectiveTransformBuilder, TaperCorner, TaperSide};
use pxl_ops::parallel::iterate_rows;
use pxl_ops::{quantize, transform_with_filter, Filter, MedianCutQuantizer, PaletteQuantizer, QuantizerOptions};

fn card(width: u32, height: u32) -> Buffer2D<Rgba8> {
    let mut buf = Buffer2D::new(width, height);
    for y in 0..height {
        for x in 0..width {
            buf.set(x, y, [(x ^ y) as u8, (x * 3) as u8, (y * 5) as u8, 255]);
        }
    }
    buf
}

/// Benchmark scheduler overhead with a trivial per-row operation.
fn bench_scheduler(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler");

    for size in [256u32, 1024, 2048] {
        let mut buf: Buffer2D<u32> = Buffer2D::new(size, size);
        group.throughput(Throughput::Elements(size as u64 * size as u64));

        for (name, settings) in [
            ("single", ExecutionSettings::single_threaded()),
            ("parallel", ExecutionSettings::default()),
        ] {
            group.bench_with_input(BenchmarkId::new(name, size), &settings, |b, s| {
                b.iter(|| {
                    iterate_rows(s, 0..size, &mut buf, |_, mut rows| {
                        for (y, row) in rows.iter_mut() {
                            row.fill(black_box(y));
                        }
                        Ok(())
                    })
                })
            });
        }
    }

    group.finish();
}

/// Benchmark the projective transform per filter.
fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("projective_transform");
    group.sample_size(20);

    let (w, h) = (512u32, 384u32);
    let src = card(w, h);
    let matrix = ProjectiveTransformBuilder::new()
        .append_taper(TaperSide::Right, TaperCorner::Both, 0.7)
        .append_rotation_degrees(12.0)
        .build(w, h)
        .unwrap_or_default();
    let settings = ExecutionSettings::default();
    let mut dst: Buffer2D<Rgba8> = Buffer2D::new(w, h);
    group.throughput(Throughput::Elements(w as u64 * h as u64));

    for filter in Filter::ALL {
        group.bench_with_input(BenchmarkId::new(filter.name(), w), &filter, |b, &f| {
            b.iter(|| transform_with_filter(&settings, f, black_box(&src), &mut dst, matrix))
        });
    }

    group.finish();
}

/// Benchmark palette quantization.
fn bench_quantize(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantize");
    group.sample_size(20);

    let src = card(256, 256);
    let region = src.bounds();
    let settings = ExecutionSettings::default();
    group.throughput(Throughput::Elements(256 * 256));

    let fixed = PaletteQuantizer::new((0..16u8).map(|i| [i * 16, i * 8, 255 - i * 16, 255]).collect());
    if let Ok(fixed) = fixed {
        group.bench_function("palette_16", |b| {
            b.iter(|| {
                let mut img = src.clone();
                quantize(&settings, &fixed, &mut img, region)
            })
        });
    }

    for max in [16usize, 256] {
        let Ok(options) = QuantizerOptions::new(max) else {
            continue;
        };
        let q = MedianCutQuantizer::new(options);
        group.bench_with_input(BenchmarkId::new("median_cut", max), &q, |b, q| {
            b.iter(|| {
                let mut img = src.clone();
                quantize(&settings, q, &mut img, region)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scheduler, bench_transform, bench_quantize);
criterion_main!(benches);
