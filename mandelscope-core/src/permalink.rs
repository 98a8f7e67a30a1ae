//! Shareable view state, serialised as URL query parameters.
//!
//! `?Re=-0.743517833&Im=0.127094578&iters=400&zoom=113388&colourmap=3&maprotation=0&axes=0&smooth=1`

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::viewport::{ViewLimits, Viewport};

/// Highest valid palette id.
pub const PALETTE_ID_MAX: u8 = 13;

/// Highest valid palette rotation. Rotation is taken modulo 255.
pub const ROTATION_MAX: u8 = 254;

/// Decimal places kept for `Re` / `Im`.
const COORD_DECIMALS: f64 = 1e13;

/// Everything a permalink carries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Permalink {
    pub real: f64,
    pub imag: f64,
    pub iterations: u32,
    pub zoom: f64,
    pub palette_id: u8,
    pub palette_rotation: u8,
    pub show_axes: bool,
    pub smooth: bool,
}

/// Result of [`Permalink::parse`]: the merged tuple and every field that
/// was present but unusable.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPermalink {
    pub permalink: Permalink,
    pub rejected: Vec<CoreError>,
}

impl Permalink {
    pub fn from_view(
        viewport: &Viewport,
        palette_id: u8,
        palette_rotation: u8,
        show_axes: bool,
    ) -> Self {
        Self {
            real: viewport.center_x,
            imag: viewport.center_y,
            iterations: viewport.max_iterations,
            zoom: viewport.zoom,
            palette_id,
            palette_rotation,
            show_axes,
            smooth: viewport.smooth,
        }
    }

    /// The view part of the tuple.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.real, self.imag, self.zoom, self.iterations, self.smooth)
    }

    /// Serialise as a query string (without the leading `?`).
    pub fn to_query(&self) -> String {
        format!(
            "Re={}&Im={}&iters={}&zoom={}&colourmap={}&maprotation={}&axes={}&smooth={}",
            truncate_coord(self.real),
            truncate_coord(self.imag),
            self.iterations,
            self.zoom.floor(),
            self.palette_id,
            self.palette_rotation,
            u8::from(self.show_axes),
            u8::from(self.smooth),
        )
    }

    /// Parse a query string (a full URL is accepted too).
    ///
    /// Each field is validated on its own. Missing, malformed and
    /// out-of-range fields keep the value from `fallback`; the malformed
    /// and out-of-range ones are also listed in
    /// [`ParsedPermalink::rejected`]. Parsing never fails as a whole.
    pub fn parse(query: &str, fallback: &Permalink, limits: &ViewLimits) -> ParsedPermalink {
        let mut permalink = *fallback;
        let mut rejected = Vec::new();

        let query = query.split_once('?').map_or(query, |(_, q)| q);
        let query = query.split('#').next().unwrap_or_default();

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let accepted = match key {
                "Re" => parse_float(value)
                    .filter(|v| v.abs() < limits.center_bound)
                    .map(|v| permalink.real = v),
                "Im" => parse_float(value)
                    .filter(|v| v.abs() < limits.center_bound)
                    .map(|v| permalink.imag = v),
                "iters" => parse_int(value)
                    .filter(|v| (1..=i64::from(limits.iteration_cap)).contains(v))
                    .map(|v| permalink.iterations = v as u32),
                "zoom" => parse_float(value)
                    .filter(|v| (limits.min_zoom..=limits.max_zoom).contains(v))
                    .map(|v| permalink.zoom = v),
                "colourmap" => parse_int(value)
                    .filter(|v| (0..=i64::from(PALETTE_ID_MAX)).contains(v))
                    .map(|v| permalink.palette_id = v as u8),
                "maprotation" => parse_int(value)
                    .filter(|v| (0..=i64::from(ROTATION_MAX)).contains(v))
                    .map(|v| permalink.palette_rotation = v as u8),
                "axes" => parse_int(value).map(|v| permalink.show_axes = v > 0),
                "smooth" => parse_int(value).map(|v| permalink.smooth = v > 0),
                _ => {
                    debug!(key, "Ignoring unknown permalink key");
                    continue;
                }
            };
            if accepted.is_none() {
                warn!(key, value, "Permalink field rejected, keeping previous value");
                rejected.push(CoreError::InvalidPermalinkField {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
        }

        ParsedPermalink {
            permalink,
            rejected,
        }
    }
}

fn truncate_coord(v: f64) -> f64 {
    (v * COORD_DECIMALS).floor() / COORD_DECIMALS
}

fn parse_float(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integers, with a trailing fraction truncated (`"200.7"` is 200).
fn parse_int(value: &str) -> Option<i64> {
    let value = value.trim();
    value
        .parse::<i64>()
        .ok()
        .or_else(|| parse_float(value).map(|v| v.trunc() as i64))
}
