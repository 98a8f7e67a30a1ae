pub mod buffer;
pub mod compute;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod iteration_buffer;
pub mod orchestrator;
pub mod palette;
pub mod pool;
pub mod poster;
pub mod segment;
pub mod surface;

pub use buffer::RenderBuffer;
pub use compute::compute_segment;
pub use config::RenderConfig;
pub use context::RenderContext;
pub use error::RenderError;
pub use export::{export_png, poster_file_name};
pub use iteration_buffer::{ComputeKey, IterationBuffer, SegmentData, SmoothBuffer};
pub use orchestrator::{FrameEvent, FrameOrchestrator, PassState};
pub use palette::{builtin_palettes, Palette, PALETTE_COUNT};
pub use pool::{RenderCancel, Stage, TaskOrigin, TaskOutcome, WorkerPool};
pub use poster::{downsample, render_poster, PosterConfig, PosterImage, PosterJob};
pub use segment::{partition_segments, Segment};
pub use surface::{SoftwareSurface, SurfaceBackend, SurfaceRenderer};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
