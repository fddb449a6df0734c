//! Benchmarks for the timecode decoder hot path
//!
//! Run with: cargo bench -p waxcode-core --bench decoder_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::f64::consts::TAU;
use std::sync::Arc;
use waxcode_core::prelude::*;

/// A plain quadrature tone at the timecode frequency; amplitude keying
/// does not change the per-sample cost.
fn tone_frames(frames: usize, rate: u32, resolution: u32) -> Vec<i16> {
    let step = TAU * resolution as f64 / rate as f64;
    let mut pcm = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        let phase = step * i as f64;
        pcm.push((8000.0 * phase.sin()) as i16);
        pcm.push((8000.0 * phase.cos()) as i16);
    }
    pcm
}

fn bench_submit(c: &mut Criterion) {
    let code = Arc::new(Timecode::build("serato_2a").unwrap());
    let pcm = tone_frames(4096, 44100, code.resolution());

    let mut group = c.benchmark_group("submit");
    group.throughput(Throughput::Elements(4096));

    group.bench_function("serato_2a_4096_frames", |b| {
        let mut dec = TimecodeDecoder::new(code.clone());
        b.iter(|| dec.submit(black_box(&pcm), 44100));
    });

    group.bench_function("serato_2a_4096_frames_with_monitor", |b| {
        let mut dec = TimecodeDecoder::new(code.clone());
        dec.monitor_init(128).unwrap();
        b.iter(|| dec.submit(black_box(&pcm), 44100));
    });

    group.finish();
}

fn bench_build_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_lookup");
    group.sample_size(20);

    for name in ["serato_2a", "traktor_b"] {
        group.bench_function(name, |b| {
            b.iter(|| Timecode::build(black_box(name)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_submit, bench_build_lookup);
criterion_main!(benches);
