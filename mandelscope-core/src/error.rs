use thiserror::Error;

/// Errors originating from the core fractal engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid max iterations: {0} (must be >= 1)")]
    InvalidMaxIterations(u32),

    #[error("invalid canvas: {width}×{height} (both sides must be > 0)")]
    InvalidCanvas { width: u32, height: u32 },

    #[error("invalid zoom: {0} (must be positive and finite)")]
    InvalidZoom(f64),

    #[error("permalink field `{key}` rejected: {value:?}")]
    InvalidPermalinkField { key: String, value: String },
}
