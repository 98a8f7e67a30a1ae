use crate::complex::Complex;
use crate::fractal::{escape_loop, Fractal, FractalParams, IterationResult};

/// A Julia set: `z_{n+1} = z_n² + c`, where `c` is a fixed constant
/// and `z₀` is the point on the complex plane.
#[derive(Debug, Clone)]
pub struct Julia {
    params: FractalParams,

    /// The fixed constant `c` that defines this Julia set.
    c: Complex,
}

impl Julia {
    pub fn new(c: Complex, params: FractalParams) -> Self {
        Self { params, c }
    }

    /// The constant `c` defining this Julia set.
    pub fn c(&self) -> Complex {
        self.c
    }
}

impl Fractal for Julia {
    #[inline]
    fn iterate(&self, point: Complex) -> IterationResult {
        escape_loop(point, self.c, &self.params)
    }

    fn params(&self) -> &FractalParams {
        &self.params
    }
}
