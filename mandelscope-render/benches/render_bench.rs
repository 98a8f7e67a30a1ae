use std::time::{Duration, Instant};

use criterion::{criterion_group, criterion_main, Criterion};

use mandelscope_core::{Mandelbrot, Viewport};
use mandelscope_render::{
    compute_segment, FrameOrchestrator, Palette, PassState, RenderCancel, Segment,
    SoftwareSurface, WorkerPool,
};

fn whole(height: u32, block_size: u32) -> Segment {
    Segment {
        worker_id: 0,
        y_start: 0,
        height,
        block_size,
    }
}

fn bench_compute_segment(c: &mut Criterion) {
    let view = Viewport::new(-0.5, 0.0, 200.0, 200, true);
    let transform = view.transform(640, 480).unwrap();
    let mandelbrot = Mandelbrot::new(view.params());
    let cancel = RenderCancel::new();

    c.bench_function("segment_640x480_block1", |b| {
        b.iter(|| compute_segment(&mandelbrot, &transform, &whole(480, 1), &cancel, 0, |_| {}));
    });
    c.bench_function("segment_640x480_block16", |b| {
        b.iter(|| compute_segment(&mandelbrot, &transform, &whole(480, 16), &cancel, 0, |_| {}));
    });
}

fn bench_deep_iterations(c: &mut Criterion) {
    let view = Viewport::new(-0.743517833, 0.127094578, 113388.0, 1500, true);
    let transform = view.transform(256, 256).unwrap();
    let mandelbrot = Mandelbrot::new(view.params());
    let cancel = RenderCancel::new();

    c.bench_function("seahorse_256x256_1500iter", |b| {
        b.iter(|| compute_segment(&mandelbrot, &transform, &whole(256, 1), &cancel, 0, |_| {}));
    });
}

fn bench_colorize(c: &mut Criterion) {
    let view = Viewport::new(-0.5, 0.0, 200.0, 200, true);
    let transform = view.transform(640, 480).unwrap();
    let mandelbrot = Mandelbrot::new(view.params());
    let (iterations, smooth) = compute_segment(
        &mandelbrot,
        &transform,
        &whole(480, 1),
        &RenderCancel::new(),
        0,
        |_| {},
    )
    .unwrap();
    let palette = Palette::default();

    c.bench_function("colorize_640x480_smooth", |b| {
        b.iter(|| palette.colorize_segment(&iterations, smooth.as_ref()));
    });
}

fn bench_progressive_frame(c: &mut Criterion) {
    let view = Viewport::new(-0.5, 0.0, 200.0, 200, true);
    let palette = Palette::default();
    let pool = WorkerPool::new(None).unwrap();
    let mut orchestrator = FrameOrchestrator::new(pool, 640, 480, view, 8).unwrap();
    orchestrator.set_refine_delay(Duration::ZERO);
    let mut surface = SoftwareSurface::new(640, 480);

    c.bench_function("progressive_frame_640x480", |b| {
        b.iter(|| {
            orchestrator.request_recompute(view);
            while !(orchestrator.is_complete() && orchestrator.pass_state() == PassState::Idle) {
                orchestrator.tick(Instant::now(), &palette, &mut surface);
                std::thread::yield_now();
            }
        });
    });
}

criterion_group!(
    benches,
    bench_compute_segment,
    bench_deep_iterations,
    bench_colorize,
    bench_progressive_frame
);
criterion_main!(benches);
