use crate::complex::Complex;
use crate::fractal::{escape_loop, Fractal, FractalParams, IterationResult};
use crate::viewport::Viewport;

/// The Mandelbrot set: `z_{n+1} = z_n² + c`, starting from `z₀ = 0`.
///
/// The point `c` is the coordinate on the complex plane.
#[derive(Debug, Clone)]
pub struct Mandelbrot {
    params: FractalParams,
}

impl Mandelbrot {
    pub fn new(params: FractalParams) -> Self {
        Self { params }
    }
}

impl Default for Mandelbrot {
    fn default() -> Self {
        Self::new(FractalParams::default())
    }
}

/// Returns `true` if `c` lies inside the main cardioid.
///
/// Closed form of `|1 − √(1 − 4c)| <= 1`.
#[inline]
pub(crate) fn in_cardioid(re: f64, im: f64) -> bool {
    let im2 = im * im;
    let q = (re - 0.25) * (re - 0.25) + im2;
    q * (q + (re - 0.25)) <= 0.25 * im2
}

/// Returns `true` if `c` lies inside the period-2 bulb.
#[inline]
pub(crate) fn in_period2_bulb(re: f64, im: f64) -> bool {
    (re + 1.0) * (re + 1.0) + im * im <= 0.0625
}

impl Fractal for Mandelbrot {
    #[inline]
    fn iterate(&self, c: Complex) -> IterationResult {
        if in_cardioid(c.re, c.im) || in_period2_bulb(c.re, c.im) {
            return IterationResult::Interior;
        }
        escape_loop(Complex::ZERO, c, &self.params)
    }

    fn params(&self) -> &FractalParams {
        &self.params
    }
}

/// Iterate the single point under pixel `(px, py)` of a `width × height`
/// canvas. Used for cursor readouts; bypasses the segment engine.
pub fn query_point(
    viewport: &Viewport,
    width: u32,
    height: u32,
    px: f64,
    py: f64,
) -> crate::Result<IterationResult> {
    let c = viewport.transform(width, height)?.subpixel_to_complex(px, py);
    Ok(Mandelbrot::new(viewport.params()).iterate(c))
}
