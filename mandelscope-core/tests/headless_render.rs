use mandelscope_core::{
    Complex, Fractal, FractalParams, IterationResult, Julia, Mandelbrot, ScreenTransform, Viewport,
    INTERIOR_INDEX,
};

/// Iterate every pixel of a canvas and collect results into a flat Vec.
fn render_grid<F: Fractal>(fractal: &F, t: &ScreenTransform) -> Vec<IterationResult> {
    let mut results = Vec::with_capacity((t.width() * t.height()) as usize);
    for py in 0..t.height() {
        for px in 0..t.width() {
            results.push(fractal.iterate(t.pixel_to_complex(px, py)));
        }
    }
    results
}

#[test]
fn headless_mandelbrot_render() {
    let viewport = Viewport::new(-0.5, 0.0, 40.0, 256, false);
    let mandelbrot = Mandelbrot::new(viewport.params());
    let t = viewport.transform(100, 100).unwrap();

    let results = render_grid(&mandelbrot, &t);
    assert_eq!(results.len(), 100 * 100);

    let escaped = results.iter().filter(|r| r.escaped()).count();
    let interior = results.len() - escaped;
    assert!(escaped > 0, "should have some escaped points");
    assert!(interior > 0, "should have some interior points");
}

#[test]
fn screen_centre_and_left_edge_of_default_scene() {
    let viewport = Viewport::new(-0.5, 0.0, 200.0, 100, false);
    let mandelbrot = Mandelbrot::new(viewport.params());
    let t = viewport.transform(600, 600).unwrap();

    let centre = mandelbrot.iterate(t.pixel_to_complex(300, 300));
    assert_eq!(centre, IterationResult::Interior);
    assert_eq!(centre.encode(100), INTERIOR_INDEX);

    let edge = t.pixel_to_complex(0, 300);
    assert_eq!(edge, Complex::new(-2.0, 0.0));
    let r = mandelbrot.iterate(edge);
    assert_eq!(r.iteration_count(100), 1);
    assert_eq!(r.encode(100), 1);
}

#[test]
fn headless_render_is_deterministic() {
    let viewport = Viewport::default();
    let mandelbrot = Mandelbrot::new(viewport.params());
    let t = viewport.transform(80, 60).unwrap();

    let run1 = render_grid(&mandelbrot, &t);
    let run2 = render_grid(&mandelbrot, &t);
    assert_eq!(run1, run2, "two identical renders must produce identical results");
}

#[test]
fn headless_julia_render() {
    let julia = Julia::new(Complex::new(-0.7, 0.27015), FractalParams::default());
    let t = Viewport::new(0.0, 0.0, 33.0, 200, true)
        .transform(100, 100)
        .unwrap();

    let results = render_grid(&julia, &t);
    assert_eq!(results.len(), 10_000);

    let escaped = results.iter().filter(|r| r.escaped()).count();
    assert!(escaped > 0, "should have some escaped points");
    assert!(escaped < 10_000, "should have some interior points");
}

#[test]
fn smooth_encoding_stays_in_byte_range() {
    let viewport = Viewport::new(-0.75, 0.1, 500.0, 300, true);
    let mandelbrot = Mandelbrot::new(viewport.params());
    let r2 = viewport.params().escape_radius_sq();
    let t = viewport.transform(64, 64).unwrap();
    for r in render_grid(&mandelbrot, &t) {
        if let Some(f) = r.smooth_fraction(r2) {
            // The last step can overshoot R⁴ by |c|, never by more than a hair.
            assert!((0.0..1.01).contains(&f), "fraction {f} out of range");
        }
    }
}
