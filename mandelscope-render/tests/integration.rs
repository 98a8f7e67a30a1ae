use std::time::{Duration, Instant};

use mandelscope_core::{Mandelbrot, Viewport, INTERIOR_INDEX};
use mandelscope_render::{
    compute_segment, partition_segments, FrameEvent, FrameOrchestrator, Palette, PassState,
    RenderCancel, RenderConfig, RenderContext, RenderError, Segment, SoftwareSurface,
    SurfaceRenderer, WorkerPool,
};

fn scenario_view() -> Viewport {
    Viewport::new(-0.5, 0.0, 200.0, 100, false)
}

fn run_to_completion(
    orchestrator: &mut FrameOrchestrator,
    palette: &Palette,
    surface: &mut SoftwareSurface,
) -> Vec<FrameEvent> {
    let deadline = Instant::now() + Duration::from_secs(20);
    let mut events = Vec::new();
    while !(orchestrator.is_complete() && orchestrator.pass_state() == PassState::Idle) {
        assert!(Instant::now() < deadline, "render did not complete");
        events.extend(orchestrator.tick(Instant::now(), palette, surface));
        std::thread::sleep(Duration::from_millis(1));
    }
    events
}

#[test]
fn end_to_end_scenario_classifies_centre_and_edge() {
    let view = scenario_view();
    let transform = view.transform(600, 600).unwrap();
    let fractal = Mandelbrot::new(view.params());
    let cancel = RenderCancel::new();

    let segments = partition_segments(600, 4, 1);
    let mut centre = None;
    let mut edge = None;
    for segment in &segments {
        let (iterations, smooth) =
            compute_segment(&fractal, &transform, segment, &cancel, 0, |_| {}).unwrap();
        assert!(smooth.is_none());
        if (segment.y_start..segment.y_end()).contains(&300) {
            let row = 300 - segment.y_start;
            centre = Some(iterations.get(300, row));
            edge = Some(iterations.get(0, row));
        }
    }
    // (300, 300) is c = -0.5: interior.
    assert_eq!(centre, Some(INTERIOR_INDEX));
    // (0, 300) is c = -2: escapes on the first step.
    assert_eq!(edge, Some(1));
}

#[test]
fn progressive_render_equals_single_pass() {
    let view = scenario_view();
    let palette = Palette::by_id(2).unwrap();
    let pool = WorkerPool::new(Some(4)).unwrap();
    let mut orchestrator = FrameOrchestrator::new(pool, 600, 600, view, 16).unwrap();
    orchestrator.set_refine_delay(Duration::ZERO);
    let mut surface = SoftwareSurface::new(600, 600);

    orchestrator.request_recompute(view);
    let events = run_to_completion(&mut orchestrator, &palette, &mut surface);
    let coarse = events
        .iter()
        .filter(|e| matches!(e, FrameEvent::SegmentPresented { block_size: 16, .. }))
        .count();
    assert_eq!(coarse, 4);

    let transform = view.transform(600, 600).unwrap();
    let whole = Segment {
        worker_id: 0,
        y_start: 0,
        height: 600,
        block_size: 1,
    };
    let (iterations, smooth) = compute_segment(
        &Mandelbrot::new(view.params()),
        &transform,
        &whole,
        &RenderCancel::new(),
        0,
        |_| {},
    )
    .unwrap();
    let direct = palette.colorize_segment(&iterations, smooth.as_ref());
    assert_eq!(surface.frame(), &direct);
}

#[test]
fn superseded_generation_never_overwrites_surface() {
    let view = scenario_view();
    let palette = Palette::default();
    let pool = WorkerPool::new(Some(2)).unwrap();
    let mut orchestrator = FrameOrchestrator::new(pool, 600, 600, view, 1).unwrap();
    let mut surface = SoftwareSurface::new(600, 600);

    orchestrator.request_recompute(view);
    let stale = orchestrator.generation();
    orchestrator.tick(Instant::now(), &palette, &mut surface);
    orchestrator.flush();
    assert!(orchestrator.generation() > stale);

    let deadline = Instant::now() + Duration::from_secs(20);
    while orchestrator.pass_state() != PassState::Idle {
        assert!(Instant::now() < deadline);
        let events = orchestrator.tick(Instant::now(), &palette, &mut surface);
        assert!(events
            .iter()
            .all(|e| !matches!(e, FrameEvent::SegmentPresented { .. })));
        std::thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(surface.revision(), 0);
}

#[test]
fn context_renders_and_exports_poster() {
    let config = RenderConfig {
        width: 120,
        height: 90,
        workers: Some(3),
        startup_animation: false,
        refine_delay_ms: 0,
        poster: mandelscope_render::PosterConfig {
            width: 160,
            height: 120,
            downsample: 2,
        },
        ..RenderConfig::default()
    };
    let mut ctx = RenderContext::new(config).unwrap();
    ctx.start_poster().unwrap();

    let deadline = Instant::now() + Duration::from_secs(20);
    let poster = loop {
        ctx.tick(Instant::now());
        if let Some(result) = ctx.take_poster() {
            break result.unwrap();
        }
        assert!(Instant::now() < deadline, "poster did not finish");
        std::thread::sleep(Duration::from_millis(1));
    };

    let dir = std::env::temp_dir().join("mandelscope_it_poster");
    let _ = std::fs::create_dir_all(&dir);
    let path = dir.join(mandelscope_render::poster_file_name(0));
    mandelscope_render::export_png(&poster.raster, &path, Some(&ctx.save_permalink())).unwrap();
    assert!(path.exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn zero_sized_canvas_handling() {
    let config = RenderConfig {
        width: 0,
        startup_animation: false,
        ..RenderConfig::default()
    };
    // The navigator lifts the canvas to 1 pixel, so this still builds.
    let ctx = RenderContext::new(config).unwrap();
    assert_eq!(ctx.canvas_size().0, 1);

    let pool = WorkerPool::new(Some(1)).unwrap();
    let err = FrameOrchestrator::new(pool, 0, 10, scenario_view(), 4).err();
    assert!(matches!(err, Some(RenderError::Core(_))));
}
