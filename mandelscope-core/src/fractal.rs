use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;

/// Palette index reserved for points that never escaped.
pub const INTERIOR_INDEX: u8 = 255;

/// Bailout `|z|²` for plain escape-time colouring (radius 2).
pub const ESCAPE_RADIUS_SQ: f64 = 4.0;

/// Bailout `|z|²` when smooth colouring is on (radius 16). The larger
/// radius keeps the continuous escape fraction free of banding.
pub const SMOOTH_ESCAPE_RADIUS_SQ: f64 = 256.0;

/// The result of iterating a single point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IterationResult {
    /// The orbit left the bailout disc on step `iterations` (1-based).
    /// `norm_sq` is `|z|²` at that moment.
    Escaped { iterations: u32, norm_sq: f64 },

    /// The orbit stayed bounded for `max_iterations` steps, or the point
    /// was classified interior by the cardioid / bulb test.
    Interior,
}

impl IterationResult {
    #[inline]
    pub fn escaped(&self) -> bool {
        matches!(self, Self::Escaped { .. })
    }

    /// Iteration count with interior points reported as `max_iterations`.
    #[inline]
    pub fn iteration_count(&self, max_iterations: u32) -> u32 {
        match *self {
            Self::Escaped { iterations, .. } => iterations,
            Self::Interior => max_iterations,
        }
    }

    /// Continuous escape fraction `log2(log2|z| / log2 R)`, in `[0, 1)` for
    /// any orbit that escaped against `escape_radius_sq`.
    pub fn smooth_fraction(&self, escape_radius_sq: f64) -> Option<f64> {
        match *self {
            // log2|z| / log2 R == log2|z|² / log2 R²
            Self::Escaped { norm_sq, .. } => {
                Some((norm_sq.log2() / escape_radius_sq.log2()).log2())
            }
            Self::Interior => None,
        }
    }

    /// 8-bit palette index: `255` for anything that reached the iteration
    /// bound, otherwise the count modulo 255.
    ///
    /// Counts 255 apart alias onto the same index. The palette only has
    /// 255 colours, so this loss is accepted.
    #[inline]
    pub fn encode(&self, max_iterations: u32) -> u8 {
        match *self {
            Self::Escaped { iterations, .. } if iterations < max_iterations => {
                (iterations % 255) as u8
            }
            _ => INTERIOR_INDEX,
        }
    }

    /// 8-bit smooth offset: `floor(fraction · 255)` clamped to `0..=255`.
    /// Interior points encode as 0.
    #[inline]
    pub fn encode_smooth(&self, escape_radius_sq: f64) -> u8 {
        self.smooth_fraction(escape_radius_sq)
            .map(|f| (f * 255.0).floor().clamp(0.0, 255.0) as u8)
            .unwrap_or(0)
    }
}

/// Parameters controlling fractal iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FractalParams {
    /// Maximum number of iterations before declaring a point interior.
    pub max_iterations: u32,

    /// Continuous colouring: widens the bailout radius and produces a
    /// per-pixel escape fraction.
    pub smooth: bool,
}

impl FractalParams {
    pub const DEFAULT_MAX_ITERATIONS: u32 = 200;

    pub fn new(max_iterations: u32, smooth: bool) -> crate::Result<Self> {
        if max_iterations < 1 {
            return Err(CoreError::InvalidMaxIterations(max_iterations));
        }
        Ok(Self {
            max_iterations,
            smooth,
        })
    }

    /// Squared bailout radius for the inner loop.
    #[inline]
    pub fn escape_radius_sq(&self) -> f64 {
        if self.smooth {
            SMOOTH_ESCAPE_RADIUS_SQ
        } else {
            ESCAPE_RADIUS_SQ
        }
    }

    /// Return a copy with a different `max_iterations` value.
    pub fn with_max_iterations(self, max_iterations: u32) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            smooth: true,
        }
    }
}

/// Trait implemented by all fractal types.
///
/// Designed for **static dispatch**: segment compute is generic over
/// `F: Fractal` so the compiler can inline the hot iteration loop.
pub trait Fractal {
    /// Iterate a single point and return the result.
    ///
    /// `point` is the coordinate from [`ScreenTransform::pixel_to_complex`](crate::ScreenTransform::pixel_to_complex).
    fn iterate(&self, point: Complex) -> IterationResult;

    /// Access the iteration parameters.
    fn params(&self) -> &FractalParams;
}

/// Shared escape loop for both variants: iterate `z ← z² + c` from `z`
/// until `|z|² >= bailout` or `max_iterations` steps have been taken.
#[inline]
pub(crate) fn escape_loop(mut z: Complex, c: Complex, params: &FractalParams) -> IterationResult {
    let bailout = params.escape_radius_sq();
    for n in 1..=params.max_iterations {
        z = z.square_add(c);
        let norm_sq = z.norm_sq();
        if norm_sq >= bailout {
            return IterationResult::Escaped {
                iterations: n,
                norm_sq,
            };
        }
    }
    IterationResult::Interior
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params() {
        let p = FractalParams::default();
        assert_eq!(p.max_iterations, 200);
        assert!(p.smooth);
    }

    #[test]
    fn invalid_max_iterations() {
        assert_eq!(
            FractalParams::new(0, false),
            Err(CoreError::InvalidMaxIterations(0))
        );
    }

    #[test]
    fn bailout_depends_on_smooth() {
        assert_eq!(FractalParams::new(10, false).unwrap().escape_radius_sq(), 4.0);
        assert_eq!(FractalParams::new(10, true).unwrap().escape_radius_sq(), 256.0);
    }

    #[test]
    fn interior_encodes_as_sentinel() {
        assert_eq!(IterationResult::Interior.encode(100), INTERIOR_INDEX);
        assert_eq!(IterationResult::Interior.iteration_count(100), 100);
        assert!(!IterationResult::Interior.escaped());
    }

    #[test]
    fn escape_at_bound_encodes_as_interior() {
        let r = IterationResult::Escaped {
            iterations: 100,
            norm_sq: 5.0,
        };
        assert_eq!(r.encode(100), INTERIOR_INDEX);
    }

    #[test]
    fn escaped_counts_wrap_modulo_255() {
        for n in [1u32, 7, 254, 255, 256, 509, 510, 1499] {
            let r = IterationResult::Escaped {
                iterations: n,
                norm_sq: 5.0,
            };
            assert_eq!(r.encode(1500), (n % 255) as u8, "count {n}");
            assert_ne!(r.encode(1500), INTERIOR_INDEX);
        }
    }

    #[test]
    fn smooth_fraction_bounds() {
        // Exactly on the bailout circle: fraction 0.
        let on_circle = IterationResult::Escaped {
            iterations: 3,
            norm_sq: SMOOTH_ESCAPE_RADIUS_SQ,
        };
        assert_eq!(on_circle.smooth_fraction(SMOOTH_ESCAPE_RADIUS_SQ), Some(0.0));
        assert_eq!(on_circle.encode_smooth(SMOOTH_ESCAPE_RADIUS_SQ), 0);

        // |z| = R² is the furthest a single step can throw a point: fraction 1.
        let far = IterationResult::Escaped {
            iterations: 3,
            norm_sq: SMOOTH_ESCAPE_RADIUS_SQ * SMOOTH_ESCAPE_RADIUS_SQ,
        };
        let f = far.smooth_fraction(SMOOTH_ESCAPE_RADIUS_SQ).unwrap();
        assert!((f - 1.0).abs() < 1e-12);
        assert_eq!(far.encode_smooth(SMOOTH_ESCAPE_RADIUS_SQ), 255);

        assert_eq!(IterationResult::Interior.encode_smooth(SMOOTH_ESCAPE_RADIUS_SQ), 0);
    }

    #[test]
    fn escape_loop_counts_steps() {
        // c = 1: z1 = 1, z2 = 2 (|z|² = 4 reaches the bailout).
        let params = FractalParams::new(50, false).unwrap();
        let r = escape_loop(Complex::ZERO, Complex::new(1.0, 0.0), &params);
        assert_eq!(
            r,
            IterationResult::Escaped {
                iterations: 2,
                norm_sq: 4.0
            }
        );
    }

    #[test]
    fn params_roundtrip_json() {
        let p = FractalParams::new(321, false).unwrap();
        let json = serde_json::to_string(&p).unwrap();
        let back: FractalParams = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
