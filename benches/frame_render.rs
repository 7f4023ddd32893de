// SPDX-License-Identifier: MPL-2.0
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use iced_preview::video_player::waveform::bucket_peaks;
use iced_preview::video_player::{DecodedFrame, RenderSurface, SURFACE_HEIGHT, SURFACE_WIDTH};
use std::hint::black_box;
use std::sync::Arc;

fn frame(width: u32, height: u32) -> DecodedFrame {
    DecodedFrame {
        rgba_data: Arc::new(vec![128; (width * height * 4) as usize]),
        width,
        height,
        pts_secs: 0.0,
    }
}

fn surface_draw_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("surface_draw");

    // Native size is a straight copy, the others go through the resampler.
    for (width, height) in [(SURFACE_WIDTH, SURFACE_HEIGHT), (640, 360), (1920, 1080)] {
        let source = frame(width, height);
        let mut surface = RenderSurface::default();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &source,
            |b, source| {
                b.iter(|| black_box(surface.draw(black_box(source))));
            },
        );
    }

    group.finish();
}

fn peak_bucketing_benchmark(c: &mut Criterion) {
    // One minute of mono audio at the analysis rate.
    let samples: Vec<f32> = (0..8_000 * 60)
        .map(|i| ((i as f32) * 0.01).sin())
        .collect();

    c.bench_function("bucket_peaks_480", |b| {
        b.iter(|| black_box(bucket_peaks(black_box(&samples), 480)));
    });
}

criterion_group!(benches, surface_draw_benchmark, peak_bucketing_benchmark);
criterion_main!(benches);
