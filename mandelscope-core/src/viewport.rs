use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::complex::Complex;
use crate::error::CoreError;
use crate::fractal::FractalParams;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Bounds every [`Viewport`] is clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewLimits {
    /// Smallest zoom, in pixels per unit.
    pub min_zoom: f64,
    /// Largest zoom. Past ~1e15 `f64` runs out of mantissa.
    pub max_zoom: f64,
    /// Upper bound for `max_iterations`.
    pub iteration_cap: u32,
    /// Both centre coordinates are clamped into `±center_bound`.
    pub center_bound: f64,
}

impl Default for ViewLimits {
    fn default() -> Self {
        Self {
            min_zoom: 100.0,
            max_zoom: 2e15,
            iteration_cap: 1500,
            center_bound: 8.0,
        }
    }
}

impl ViewLimits {
    /// Repair limits read from a config file so the clamps below cannot
    /// panic: non-positive or non-finite zooms fall back to the defaults,
    /// inverted zoom bounds are swapped and the centre bound is made
    /// non-negative.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let valid_zoom = |z: f64| z.is_finite() && z > 0.0;
        let mut min_zoom = if valid_zoom(self.min_zoom) {
            self.min_zoom
        } else {
            defaults.min_zoom
        };
        let mut max_zoom = if valid_zoom(self.max_zoom) {
            self.max_zoom
        } else {
            defaults.max_zoom
        };
        if min_zoom > max_zoom {
            std::mem::swap(&mut min_zoom, &mut max_zoom);
        }
        let center_bound = if self.center_bound.is_nan() {
            defaults.center_bound
        } else {
            self.center_bound.abs()
        };
        let limits = Self {
            min_zoom,
            max_zoom,
            iteration_cap: self.iteration_cap.max(1),
            center_bound,
        };
        if limits != self {
            warn!(given = ?self, repaired = ?limits, "View limits repaired");
        }
        limits
    }

    #[inline]
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return self.min_zoom;
        }
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    #[inline]
    pub fn clamp_iterations(&self, iterations: u32) -> u32 {
        iterations.clamp(1, self.iteration_cap.max(1))
    }

    #[inline]
    pub fn clamp_center(&self, v: f64) -> f64 {
        if v.is_nan() {
            return 0.0;
        }
        v.clamp(-self.center_bound, self.center_bound)
    }
}

/// Zoom-driven iteration count: `clamp(base + log10(zoom) · per_decade, base, cap)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IterationTuning {
    pub base: u32,
    pub per_decade: f64,
}

impl Default for IterationTuning {
    fn default() -> Self {
        Self {
            base: 128,
            per_decade: 32.0,
        }
    }
}

impl IterationTuning {
    pub fn iterations_for(&self, zoom: f64, cap: u32) -> u32 {
        let raw = (self.base as f64 + zoom.max(1.0).log10() * self.per_decade).floor();
        let cap = cap.max(1);
        let base = self.base.min(cap).max(1);
        (raw as u32).clamp(base, cap)
    }
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// The visible region of the complex plane plus iteration settings.
///
/// `zoom` is in pixels per unit, so a larger zoom shows a smaller region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center_x: f64,
    pub center_y: f64,
    pub zoom: f64,
    pub max_iterations: u32,
    pub smooth: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center_x: -1.34228,
            center_y: 0.0,
            zoom: 300.0,
            max_iterations: FractalParams::DEFAULT_MAX_ITERATIONS,
            smooth: true,
        }
    }
}

impl Viewport {
    pub fn new(center_x: f64, center_y: f64, zoom: f64, max_iterations: u32, smooth: bool) -> Self {
        Self {
            center_x,
            center_y,
            zoom,
            max_iterations,
            smooth,
        }
    }

    #[inline]
    pub fn center(&self) -> Complex {
        Complex::new(self.center_x, self.center_y)
    }

    /// Pull every field back inside `limits`. Out-of-range input is never an
    /// error; it is clamped and logged.
    pub fn clamped(self, limits: &ViewLimits) -> Self {
        let clamped = Self {
            center_x: limits.clamp_center(self.center_x),
            center_y: limits.clamp_center(self.center_y),
            zoom: limits.clamp_zoom(self.zoom),
            max_iterations: limits.clamp_iterations(self.max_iterations),
            smooth: self.smooth,
        };
        if clamped != self {
            warn!(
                zoom = self.zoom,
                max_iterations = self.max_iterations,
                center_x = self.center_x,
                center_y = self.center_y,
                "Viewport clamped into limits"
            );
        }
        clamped
    }

    /// Iteration parameters for this view. `max_iterations` of 0 is lifted to 1.
    pub fn params(&self) -> FractalParams {
        FractalParams {
            max_iterations: self.max_iterations.max(1),
            smooth: self.smooth,
        }
    }

    /// Screen transform for a canvas of `width × height` pixels.
    pub fn transform(&self, width: u32, height: u32) -> crate::Result<ScreenTransform> {
        ScreenTransform::new(self, width, height)
    }
}

// ---------------------------------------------------------------------------
// Screen transform
// ---------------------------------------------------------------------------

/// Maps canvas pixels to the complex plane for one frame.
///
/// `(0, 0)` is the top-left pixel. The y-axis is flipped so that increasing
/// pixel-y moves downward (decreasing imaginary part).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTransform {
    center: Complex,
    zoom: f64,
    width: u32,
    height: u32,
}

impl ScreenTransform {
    pub fn new(viewport: &Viewport, width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidCanvas { width, height });
        }
        if viewport.zoom <= 0.0 || !viewport.zoom.is_finite() {
            return Err(CoreError::InvalidZoom(viewport.zoom));
        }
        Ok(Self {
            center: viewport.center(),
            zoom: viewport.zoom,
            width,
            height,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    #[inline]
    pub fn center(&self) -> Complex {
        self.center
    }

    /// Map a pixel coordinate to a point on the complex plane.
    #[inline]
    pub fn pixel_to_complex(&self, px: u32, py: u32) -> Complex {
        self.subpixel_to_complex(px as f64, py as f64)
    }

    /// Like [`pixel_to_complex`](Self::pixel_to_complex) for fractional
    /// coordinates (pointer positions).
    #[inline]
    pub fn subpixel_to_complex(&self, px: f64, py: f64) -> Complex {
        let half_w = self.width as f64 / 2.0;
        let half_h = self.height as f64 / 2.0;
        Complex::new(
            self.center.re + (px - half_w) / self.zoom,
            self.center.im - (py - half_h) / self.zoom,
        )
    }

    /// Inverse of [`subpixel_to_complex`](Self::subpixel_to_complex).
    #[inline]
    pub fn complex_to_pixel(&self, c: Complex) -> (f64, f64) {
        (
            (c.re - self.center.re) * self.zoom + self.width as f64 / 2.0,
            (self.center.im - c.im) * self.zoom + self.height as f64 / 2.0,
        )
    }

    /// `true` when `c` maps inside the canvas.
    pub fn contains(&self, c: Complex) -> bool {
        let (x, y) = self.complex_to_pixel(c);
        x >= 0.0 && y >= 0.0 && x < self.width as f64 && y < self.height as f64
    }

    /// Same view on a canvas of different resolution.
    ///
    /// Zoom scales with the height ratio so the vertical extent is preserved;
    /// a wider target shows more of the plane horizontally.
    pub fn scaled(&self, width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidCanvas { width, height });
        }
        Ok(Self {
            center: self.center,
            zoom: self.zoom * height as f64 / self.height as f64,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    fn view(zoom: f64) -> Viewport {
        Viewport::new(-0.5, 0.0, zoom, 100, false)
    }

    #[test]
    fn pixel_to_complex_center() {
        let t = view(200.0).transform(600, 600).unwrap();
        let c = t.pixel_to_complex(300, 300);
        assert!((c.re + 0.5).abs() < EPSILON);
        assert!(c.im.abs() < EPSILON);
    }

    #[test]
    fn pixel_to_complex_left_edge() {
        let t = view(200.0).transform(600, 600).unwrap();
        let c = t.pixel_to_complex(0, 300);
        assert!((c.re + 2.0).abs() < EPSILON);
    }

    #[test]
    fn y_axis_points_up() {
        let t = Viewport::new(0.0, 0.0, 1.0, 10, false).transform(100, 100).unwrap();
        let tl = t.pixel_to_complex(0, 0);
        assert!((tl.re + 50.0).abs() < EPSILON);
        assert!((tl.im - 50.0).abs() < EPSILON);
        let br = t.pixel_to_complex(99, 99);
        assert!((br.re - 49.0).abs() < EPSILON);
        assert!((br.im + 49.0).abs() < EPSILON);
    }

    #[test]
    fn complex_to_pixel_inverts_transform() {
        let t = Viewport::new(-0.743, 0.127, 11338.0, 10, false)
            .transform(1200, 900)
            .unwrap();
        let c = t.subpixel_to_complex(123.5, 456.25);
        let (x, y) = t.complex_to_pixel(c);
        assert!((x - 123.5).abs() < 1e-6);
        assert!((y - 456.25).abs() < 1e-6);
        assert!(t.contains(c));
        assert!(!t.contains(Complex::new(5.0, 5.0)));
    }

    #[test]
    fn invalid_canvas_and_zoom() {
        assert!(view(200.0).transform(0, 10).is_err());
        assert!(view(200.0).transform(10, 0).is_err());
        assert!(view(0.0).transform(10, 10).is_err());
        assert!(view(f64::INFINITY).transform(10, 10).is_err());
    }

    #[test]
    fn scaled_preserves_vertical_extent() {
        let t = view(300.0).transform(1200, 1200).unwrap();
        let big = t.scaled(8000, 6000).unwrap();
        assert!((big.zoom() - 1500.0).abs() < EPSILON);
        let top = t.pixel_to_complex(600, 0);
        let big_top = big.pixel_to_complex(4000, 0);
        assert!((top.im - big_top.im).abs() < EPSILON);
        assert_eq!(big.center(), t.center());
    }

    #[test]
    fn clamping_never_fails() {
        let limits = ViewLimits::default();
        let wild = Viewport::new(-100.0, f64::NAN, 1e30, 0, true).clamped(&limits);
        assert_eq!(wild.center_x, -8.0);
        assert_eq!(wild.center_y, 0.0);
        assert_eq!(wild.zoom, 2e15);
        assert_eq!(wild.max_iterations, 1);

        let low = Viewport::new(0.0, 0.0, 1.0, 99_999, true).clamped(&limits);
        assert_eq!(low.zoom, 100.0);
        assert_eq!(low.max_iterations, 1500);
    }

    #[test]
    fn iteration_tuning_grows_with_zoom() {
        let tuning = IterationTuning::default();
        assert_eq!(tuning.iterations_for(0.5, 1500), 128);
        assert_eq!(tuning.iterations_for(100.0, 1500), 192);
        assert_eq!(tuning.iterations_for(1e6, 1500), 320);
        assert_eq!(tuning.iterations_for(2e15, 1500), 617);
        assert_eq!(tuning.iterations_for(1e300, 1500), 1500);
    }

    #[test]
    fn iteration_tuning_never_exceeds_cap() {
        let tuning = IterationTuning {
            base: 2000,
            per_decade: 32.0,
        };
        assert_eq!(tuning.iterations_for(300.0, 1500), 1500);
        assert_eq!(tuning.iterations_for(1e300, 1500), 1500);

        let zero = IterationTuning {
            base: 0,
            per_decade: 0.0,
        };
        assert_eq!(zero.iterations_for(300.0, 0), 1);
    }

    #[test]
    fn sanitized_limits_never_panic() {
        let inverted: ViewLimits = serde_json::from_str(r#"{"min_zoom": 1e16}"#).unwrap();
        let limits = inverted.sanitized();
        assert_eq!(limits.min_zoom, 2e15);
        assert_eq!(limits.max_zoom, 1e16);
        assert_eq!(limits.clamp_zoom(1.0), 2e15);

        let odd = ViewLimits {
            min_zoom: f64::NAN,
            max_zoom: -5.0,
            iteration_cap: 0,
            center_bound: -3.0,
        }
        .sanitized();
        assert_eq!(odd.min_zoom, 100.0);
        assert_eq!(odd.max_zoom, 2e15);
        assert_eq!(odd.iteration_cap, 1);
        assert_eq!(odd.center_bound, 3.0);
        assert_eq!(odd.clamp_center(10.0), 3.0);

        let nan_bound = ViewLimits {
            center_bound: f64::NAN,
            ..ViewLimits::default()
        }
        .sanitized();
        assert_eq!(nan_bound.center_bound, 8.0);

        assert_eq!(ViewLimits::default().sanitized(), ViewLimits::default());
    }

    #[test]
    fn limits_deserialize_with_defaults() {
        let limits: ViewLimits = serde_json::from_str(r#"{"iteration_cap": 5000}"#).unwrap();
        assert_eq!(limits.iteration_cap, 5000);
        assert_eq!(limits.min_zoom, 100.0);
    }
}
