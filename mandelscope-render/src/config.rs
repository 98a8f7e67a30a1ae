use std::time::Duration;

use serde::{Deserialize, Serialize};

use mandelscope_core::{IterationTuning, ViewLimits, Viewport};

use crate::poster::PosterConfig;
use crate::surface::SurfaceBackend;

/// Everything a [`RenderContext`](crate::RenderContext) is built from.
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Worker count override. `None` uses the hardware parallelism,
    /// clamped to 2..=16.
    pub workers: Option<usize>,
    pub limits: ViewLimits,
    pub tuning: IterationTuning,
    /// Run the calibration sweep on startup.
    pub startup_animation: bool,
    pub backend: SurfaceBackend,
    pub poster: PosterConfig,
    /// Quiet period after the last view change before refinement begins.
    pub refine_delay_ms: u64,
    /// View shown before any input.
    pub initial_view: Viewport,
    pub palette_id: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 1200,
            workers: None,
            limits: ViewLimits::default(),
            tuning: IterationTuning::default(),
            startup_animation: true,
            backend: SurfaceBackend::default(),
            poster: PosterConfig::default(),
            refine_delay_ms: 200,
            initial_view: Viewport::default(),
            palette_id: 0,
        }
    }
}

impl RenderConfig {
    pub fn refine_delay(&self) -> Duration {
        Duration::from_millis(self.refine_delay_ms)
    }
}
