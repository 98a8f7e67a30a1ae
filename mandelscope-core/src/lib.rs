pub mod complex;
pub mod error;
pub mod fractal;
pub mod julia;
pub mod mandelbrot;
pub mod navigation;
pub mod permalink;
pub mod viewport;

// Re-export primary types for convenience.
pub use complex::Complex;
pub use error::CoreError;
pub use fractal::{Fractal, FractalParams, IterationResult, INTERIOR_INDEX};
pub use julia::Julia;
pub use mandelbrot::{query_point, Mandelbrot};
pub use navigation::{Benchmark, Destination, NavMode, NavUpdate, Navigator, TravelKind};
pub use permalink::{ParsedPermalink, Permalink};
pub use viewport::{IterationTuning, ScreenTransform, ViewLimits, Viewport};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
