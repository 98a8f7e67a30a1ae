use thiserror::Error;

/// Errors originating from the rendering pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid image dimensions: {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("failed to build worker pool: {0}")]
    PoolBuild(String),

    #[error("render cancelled")]
    Cancelled,

    #[error("worker {origin:?} panicked: {message}")]
    WorkerPanic { origin: Option<u32>, message: String },

    #[error("failed to export image: {0}")]
    Export(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] mandelscope_core::CoreError),
}
