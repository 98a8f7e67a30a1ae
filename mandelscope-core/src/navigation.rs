//! Viewport state machine: startup calibration, interactive input, animated
//! travel to a destination, and the palette-rotation sub-mode.
//!
//! The navigator owns the [`Viewport`]. Every mutation goes through it, and
//! [`Navigator::tick`] advances animations once per display refresh.

use std::time::Instant;

use tracing::{debug, info};

use crate::complex::Complex;
use crate::viewport::{IterationTuning, ScreenTransform, ViewLimits, Viewport};

/// Zoom of the home view; travel zooms out to here before crossing the plane.
pub const HOME_ZOOM: f64 = 300.0;

/// Number of animation steps in the startup sweep.
pub const STARTUP_STEPS: u32 = 50;

/// Steps after this one contribute a frame-time sample (20 samples in total).
const STARTUP_SAMPLE_AFTER: u32 = 30;

/// The sweep follows `sin(step / 70 · π)`.
const STARTUP_PERIOD: f64 = 70.0;

/// During the sweep the complex origin sits this many pixels right of centre.
const STARTUP_ORIGIN_OFFSET: f64 = 400.0;

/// Zoom out: stop this close to [`HOME_ZOOM`].
const ZOOM_OUT_SNAP: f64 = 5.0;

/// Approach: zoom snaps when within this percentage of the target.
const ZOOM_SNAP_PERCENT: f64 = 3.0;

/// Wheel zoom changes zoom by `zoom / WHEEL_DIVISOR` per notch.
const WHEEL_DIVISOR: f64 = 5.0;

/// Pinch zoom changes zoom by `ratio · zoom / PINCH_DIVISOR`.
const PINCH_DIVISOR: f64 = 50.0;

// ---------------------------------------------------------------------------
// Destinations
// ---------------------------------------------------------------------------

/// Target of a travel animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Destination {
    pub center_x: f64,
    pub center_y: f64,
    pub zoom: f64,
    pub iterations: u32,
}

impl Destination {
    pub const fn new(center_x: f64, center_y: f64, zoom: f64, iterations: u32) -> Self {
        Self {
            center_x,
            center_y,
            zoom,
            iterations,
        }
    }

    fn center(&self) -> Complex {
        Complex::new(self.center_x, self.center_y)
    }
}

/// Named places worth flying to.
pub const DESTINATIONS: [(&str, Destination); 10] = [
    ("home", Destination::new(-1.34228, 0.0, 300.0, 200)),
    ("flower", Destination::new(-1.9999858812, 0.0, 276_637_121_362.0, 200)),
    ("julia", Destination::new(-1.768778832, 0.001738995, 1_585_714_676.0, 800)),
    ("elephant", Destination::new(-0.071875677, 0.649981301, 203_212.0, 400)),
    ("seahorse", Destination::new(-0.743517833, 0.127094578, 113_388.0, 400)),
    ("spirals", Destination::new(-0.343806077, -0.61127804, 2_097_031.0, 1500)),
    ("starfish", Destination::new(-0.374004139, -0.659792175, 484_254.0, 160)),
    ("sun", Destination::new(-0.776592852, 0.13664085, 58_282_440.0, 400)),
    ("tendrils", Destination::new(-0.226266647, -1.11617444, 743_786_806.0, 300)),
    ("tree", Destination::new(-1.940157342, 0.0000008, 799_366_122.0, 300)),
];

/// Look up a named destination.
pub fn destination(name: &str) -> Option<Destination> {
    DESTINATIONS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, d)| *d)
}

// ---------------------------------------------------------------------------
// Benchmark
// ---------------------------------------------------------------------------

/// Frame-time calibration measured by the startup sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Benchmark {
    /// Typical milliseconds per coarse frame, clamped to `2..=20`.
    pub frame_ms: f64,
    /// Block size for the first pass after a viewport change.
    pub max_block_size: u32,
}

impl Benchmark {
    pub fn from_frame_ms(frame_ms: f64) -> Self {
        let frame_ms = if frame_ms.is_nan() {
            2.0
        } else {
            frame_ms.clamp(2.0, 20.0)
        };
        let max_block_size = if frame_ms < 7.0 { 8 } else { 16 };
        Self {
            frame_ms,
            max_block_size,
        }
    }

    /// Average of the 6th–8th fastest samples, ignoring outliers at both ends.
    pub fn from_samples(samples: &[f64]) -> Self {
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let window = if sorted.len() >= 8 {
            &sorted[5..8]
        } else {
            &sorted[..]
        };
        if window.is_empty() {
            return Self::default();
        }
        Self::from_frame_ms(window.iter().sum::<f64>() / window.len() as f64)
    }
}

impl Default for Benchmark {
    fn default() -> Self {
        Self::from_frame_ms(2.0)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// What the navigator is doing, as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavMode {
    Startup,
    Interactive,
    /// Interactive with the palette cycling.
    Rotating,
    Travelling,
}

/// How a travel was started. Permalink travel skips the zoom-out leg and
/// moves faster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelKind {
    Jump,
    Permalink,
}

/// What changed during a [`Navigator::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavUpdate {
    pub view_changed: bool,
    pub startup_finished: bool,
    pub travel_finished: bool,
}

#[derive(Debug)]
struct Startup {
    step: u32,
    last_step: Option<Instant>,
    samples: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TravelPhase {
    ZoomOut,
    Approach,
}

#[derive(Debug)]
struct Travel {
    dest: Destination,
    kind: TravelKind,
    phase: TravelPhase,
    dir_x: i8,
    dir_y: i8,
    dir_zoom: i8,
}

#[derive(Debug)]
enum State {
    Startup(Startup),
    Interactive,
    Travelling(Travel),
}

/// Owner of the live [`Viewport`].
#[derive(Debug)]
pub struct Navigator {
    viewport: Viewport,
    limits: ViewLimits,
    tuning: IterationTuning,
    width: u32,
    height: u32,
    state: State,
    benchmark: Benchmark,
    auto_iterations: bool,
    rotating: bool,
    queued: Option<(Destination, TravelKind)>,
}

impl Navigator {
    /// `startup_animation == false` skips calibration and starts interactive
    /// with the default benchmark.
    pub fn new(
        viewport: Viewport,
        limits: ViewLimits,
        tuning: IterationTuning,
        width: u32,
        height: u32,
        startup_animation: bool,
    ) -> Self {
        let state = if startup_animation {
            State::Startup(Startup {
                step: 0,
                last_step: None,
                samples: Vec::with_capacity((STARTUP_STEPS - STARTUP_SAMPLE_AFTER) as usize),
            })
        } else {
            State::Interactive
        };
        let limits = limits.sanitized();
        Self {
            viewport: viewport.clamped(&limits),
            limits,
            tuning,
            width: width.max(1),
            height: height.max(1),
            state,
            benchmark: Benchmark::default(),
            auto_iterations: true,
            rotating: false,
            queued: None,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn limits(&self) -> &ViewLimits {
        &self.limits
    }

    pub fn benchmark(&self) -> Benchmark {
        self.benchmark
    }

    pub fn auto_iterations(&self) -> bool {
        self.auto_iterations
    }

    pub fn mode(&self) -> NavMode {
        match self.state {
            State::Startup(_) => NavMode::Startup,
            State::Travelling(_) => NavMode::Travelling,
            State::Interactive if self.rotating => NavMode::Rotating,
            State::Interactive => NavMode::Interactive,
        }
    }

    pub fn is_rotating(&self) -> bool {
        self.rotating && matches!(self.state, State::Interactive)
    }

    /// Screen transform of the current view.
    pub fn transform(&self) -> ScreenTransform {
        // Zoom is clamped positive and the canvas is at least 1×1.
        ScreenTransform::new(&self.viewport, self.width, self.height)
            .unwrap_or_else(|_| unreachable!("navigator keeps a valid view"))
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance animations by one step.
    ///
    /// `frame_ready` is true once every segment of the current pass has been
    /// drawn at least once; startup and travel only step on such ticks so
    /// they never outrun the renderer.
    pub fn tick(&mut self, now: Instant, frame_ready: bool) -> NavUpdate {
        match self.state {
            State::Startup(_) => self.tick_startup(now, frame_ready),
            State::Travelling(_) if frame_ready => self.tick_travel(),
            _ => NavUpdate::default(),
        }
    }

    fn tick_startup(&mut self, now: Instant, frame_ready: bool) -> NavUpdate {
        let State::Startup(startup) = &mut self.state else {
            return NavUpdate::default();
        };
        if startup.step > 0 && !frame_ready {
            return NavUpdate::default();
        }

        if startup.step < STARTUP_STEPS {
            startup.step += 1;
            let step = startup.step;
            if step >= STARTUP_SAMPLE_AFTER {
                if let (true, Some(last)) = (step > STARTUP_SAMPLE_AFTER, startup.last_step) {
                    startup
                        .samples
                        .push(now.saturating_duration_since(last).as_secs_f64() * 1000.0);
                }
                startup.last_step = Some(now);
            }

            let sweep = (step as f64 / STARTUP_PERIOD * std::f64::consts::PI).sin();
            let zoom = self
                .limits
                .clamp_zoom((sweep * (HOME_ZOOM + 80.0)).ceil());
            self.viewport.zoom = zoom;
            self.viewport.center_x = self.limits.clamp_center(-STARTUP_ORIGIN_OFFSET / zoom);
            self.viewport.center_y = 0.0;
            return NavUpdate {
                view_changed: true,
                ..NavUpdate::default()
            };
        }

        self.benchmark = Benchmark::from_samples(&startup.samples);
        info!(
            frame_ms = self.benchmark.frame_ms,
            max_block_size = self.benchmark.max_block_size,
            "Startup calibration complete"
        );
        self.state = State::Interactive;

        let mut update = NavUpdate {
            startup_finished: true,
            ..NavUpdate::default()
        };
        if let Some((dest, kind)) = self.queued.take() {
            self.begin_travel(dest, kind);
            update.view_changed = true;
        }
        update
    }

    fn tick_travel(&mut self) -> NavUpdate {
        let on_screen = {
            let State::Travelling(travel) = &self.state else {
                return NavUpdate::default();
            };
            self.transform().contains(travel.dest.center())
        };
        let bench = self.benchmark.frame_ms;
        let v = &mut self.viewport;
        let limits = &self.limits;
        let State::Travelling(travel) = &mut self.state else {
            return NavUpdate::default();
        };
        let dest = travel.dest;

        if travel.phase == TravelPhase::ZoomOut {
            if v.zoom > HOME_ZOOM && (!on_screen || v.zoom > dest.zoom) {
                v.zoom += ((HOME_ZOOM - v.zoom) / 10.0 * (bench / 4.0 + 2.0)).ceil();
                if (v.zoom - HOME_ZOOM).abs() < ZOOM_OUT_SNAP {
                    v.zoom = HOME_ZOOM;
                }
                v.zoom = limits.clamp_zoom(v.zoom);
                return NavUpdate {
                    view_changed: true,
                    ..NavUpdate::default()
                };
            }
            travel.phase = TravelPhase::Approach;
            travel.dir_x = direction(dest.center_x - v.center_x);
            travel.dir_y = direction(dest.center_y - v.center_y);
            travel.dir_zoom = direction(dest.zoom - v.zoom);
            return NavUpdate::default();
        }

        if v.center_x == dest.center_x
            && v.center_y == dest.center_y
            && v.zoom == dest.zoom
            && v.max_iterations == dest.iterations
        {
            debug!(zoom = v.zoom, "Travel complete");
            self.state = State::Interactive;
            return NavUpdate {
                travel_finished: true,
                ..NavUpdate::default()
            };
        }

        let (pos_speed, zoom_speed) = match travel.kind {
            TravelKind::Jump => (1.0, 1.0),
            TravelKind::Permalink => (3.0, 5.0),
        };

        // Iterations ramp up slowly and come down twice as fast.
        let iter_step = bench.round().max(1.0) as u32;
        if v.max_iterations < dest.iterations {
            v.max_iterations = (v.max_iterations + iter_step).min(dest.iterations);
        } else if v.max_iterations > dest.iterations {
            v.max_iterations = v
                .max_iterations
                .saturating_sub(iter_step * 2)
                .max(dest.iterations);
        }

        let ln_zoom = v.zoom.ln();
        v.center_x = approach_axis(v.center_x, dest.center_x, travel.dir_x, v.zoom, ln_zoom, bench * pos_speed);
        v.center_y = approach_axis(v.center_y, dest.center_y, travel.dir_y, v.zoom, ln_zoom, bench * pos_speed);

        let dz = dest.zoom - v.zoom;
        if (dz / dest.zoom * 100.0).abs() < ZOOM_SNAP_PERCENT || direction(dz) != travel.dir_zoom {
            v.zoom = dest.zoom;
        } else {
            let step = (dz.abs().ln() * (v.zoom / 2000.0) * bench * zoom_speed)
                .ceil()
                .max(1.0);
            v.zoom = limits.clamp_zoom(v.zoom + step.copysign(dz));
        }

        NavUpdate {
            view_changed: true,
            ..NavUpdate::default()
        }
    }

    // -----------------------------------------------------------------------
    // Travel
    // -----------------------------------------------------------------------

    /// Start an animated flight. Queued until calibration finishes when
    /// called during startup.
    pub fn travel_to(&mut self, dest: Destination, kind: TravelKind) {
        let dest = Destination {
            center_x: self.limits.clamp_center(dest.center_x),
            center_y: self.limits.clamp_center(dest.center_y),
            zoom: self.limits.clamp_zoom(dest.zoom).floor(),
            iterations: self.limits.clamp_iterations(dest.iterations),
        };
        if matches!(self.state, State::Startup(_)) {
            debug!(?dest, "Travel queued until startup completes");
            self.queued = Some((dest, kind));
            return;
        }
        self.begin_travel(dest, kind);
    }

    /// Fly to one of [`DESTINATIONS`]. Returns `false` for unknown names.
    pub fn jump_to(&mut self, name: &str) -> bool {
        match destination(name) {
            Some(dest) => {
                self.travel_to(dest, TravelKind::Jump);
                true
            }
            None => false,
        }
    }

    fn begin_travel(&mut self, dest: Destination, kind: TravelKind) {
        self.rotating = false;
        let v = &self.viewport;
        let phase = match kind {
            TravelKind::Jump => TravelPhase::ZoomOut,
            TravelKind::Permalink => TravelPhase::Approach,
        };
        self.state = State::Travelling(Travel {
            dest,
            kind,
            phase,
            dir_x: direction(dest.center_x - v.center_x),
            dir_y: direction(dest.center_y - v.center_y),
            dir_zoom: direction(dest.zoom - v.zoom),
        });
    }

    // -----------------------------------------------------------------------
    // Interactive input
    // -----------------------------------------------------------------------

    /// Input is ignored during startup and interrupts any travel.
    fn accept_input(&mut self) -> bool {
        match self.state {
            State::Startup(_) => false,
            State::Travelling(_) => {
                debug!("Travel interrupted by input");
                self.state = State::Interactive;
                true
            }
            State::Interactive => true,
        }
    }

    /// Replace the view outright. Returns `false` when ignored.
    pub fn set_viewport(&mut self, viewport: Viewport) -> bool {
        if !self.accept_input() {
            return false;
        }
        self.viewport = viewport.clamped(&self.limits);
        true
    }

    /// Drag by `(dx, dy)` pixels; content follows the pointer.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> bool {
        if !self.accept_input() || (dx == 0.0 && dy == 0.0) {
            return false;
        }
        let v = &mut self.viewport;
        v.center_x = self.limits.clamp_center(v.center_x - dx / v.zoom);
        v.center_y = self.limits.clamp_center(v.center_y + dy / v.zoom);
        true
    }

    /// One wheel notch at pixel `(px, py)`, keeping the point under the
    /// cursor fixed.
    pub fn zoom_at(&mut self, px: f64, py: f64, zoom_in: bool) -> bool {
        let zoom = self.viewport.zoom;
        if (zoom_in && zoom >= self.limits.max_zoom) || (!zoom_in && zoom <= self.limits.min_zoom) {
            return false;
        }
        if !self.accept_input() {
            return false;
        }
        let step = zoom / WHEEL_DIVISOR;
        let target = if zoom_in { zoom + step } else { zoom - step };
        self.zoom_around(px, py, target);
        true
    }

    /// Pinch gesture: positive `ratio` spreads (zooms in).
    pub fn pinch(&mut self, ratio: f64, px: f64, py: f64) -> bool {
        if !ratio.is_finite() || ratio == 0.0 || !self.accept_input() {
            return false;
        }
        let zoom = self.viewport.zoom;
        self.zoom_around(px, py, zoom + (ratio * zoom / PINCH_DIVISOR).floor());
        true
    }

    fn zoom_around(&mut self, px: f64, py: f64, target: f64) {
        let anchor = self.transform().subpixel_to_complex(px, py);
        let zoom = self.limits.clamp_zoom(target).floor();
        let v = &mut self.viewport;
        v.zoom = zoom;
        v.center_x = self
            .limits
            .clamp_center(anchor.re - (px - self.width as f64 / 2.0) / zoom);
        v.center_y = self
            .limits
            .clamp_center(anchor.im + (py - self.height as f64 / 2.0) / zoom);
        if self.auto_iterations {
            v.max_iterations = self.tuning.iterations_for(zoom, self.limits.iteration_cap);
        }
    }

    /// Fix the iteration bound; turns off zoom-driven tuning.
    pub fn set_iterations(&mut self, iterations: u32) -> bool {
        if !self.accept_input() {
            return false;
        }
        self.auto_iterations = false;
        let iterations = self.limits.clamp_iterations(iterations);
        let changed = iterations != self.viewport.max_iterations;
        self.viewport.max_iterations = iterations;
        changed
    }

    /// Turn zoom-driven iteration tuning on or off. Turning it on re-tunes
    /// immediately.
    pub fn set_auto_iterations(&mut self, auto: bool) -> bool {
        self.auto_iterations = auto;
        if !auto || !self.accept_input() {
            return false;
        }
        let tuned = self
            .tuning
            .iterations_for(self.viewport.zoom, self.limits.iteration_cap);
        let changed = tuned != self.viewport.max_iterations;
        self.viewport.max_iterations = tuned;
        changed
    }

    /// Smooth colouring changes the bailout radius, so it is part of the view.
    pub fn set_smooth(&mut self, smooth: bool) -> bool {
        let changed = self.viewport.smooth != smooth;
        self.viewport.smooth = smooth;
        changed
    }

    /// Toggle palette cycling. Ignored while travelling or starting up.
    /// Returns whether cycling is now on.
    pub fn toggle_rotation(&mut self) -> bool {
        if matches!(self.state, State::Interactive) {
            self.rotating = !self.rotating;
        }
        self.is_rotating()
    }

    pub fn stop_rotation(&mut self) {
        self.rotating = false;
    }
}

/// Sign of `d` as -1, 0 or 1.
fn direction(d: f64) -> i8 {
    if d > 0.0 {
        1
    } else if d < 0.0 {
        -1
    } else {
        0
    }
}

/// One travel step along a centre axis. Snaps once within a pixel or after
/// overshooting.
fn approach_axis(current: f64, target: f64, dir: i8, zoom: f64, ln_zoom: f64, speed: f64) -> f64 {
    let delta = target - current;
    if (delta * zoom).abs() < 1.0 || direction(delta) != dir {
        target
    } else {
        current + delta / ln_zoom / 4.0 * speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn interactive() -> Navigator {
        Navigator::new(
            Viewport::default(),
            ViewLimits::default(),
            IterationTuning::default(),
            1200,
            1200,
            false,
        )
    }

    fn run_until_interactive(nav: &mut Navigator, max_ticks: usize) -> usize {
        let now = Instant::now();
        for i in 0..max_ticks {
            nav.tick(now, true);
            if nav.mode() == NavMode::Interactive {
                return i;
            }
        }
        panic!("travel did not finish within {max_ticks} ticks");
    }

    #[test]
    fn inverted_limits_from_config_are_repaired() {
        let limits: ViewLimits = serde_json::from_str(r#"{"min_zoom": 1e16}"#).unwrap();
        let nav = Navigator::new(
            Viewport::default(),
            limits,
            IterationTuning::default(),
            200,
            200,
            false,
        );
        assert!(nav.limits().min_zoom <= nav.limits().max_zoom);
        assert_eq!(nav.viewport().zoom, 2e15);
    }

    #[test]
    fn destination_lookup() {
        assert_eq!(destination("Seahorse").unwrap().zoom, 113_388.0);
        assert!(destination("atlantis").is_none());
    }

    #[test]
    fn benchmark_uses_middle_of_sorted_samples() {
        let samples: Vec<f64> = (1..=20).rev().map(|v| v as f64).collect();
        // Sorted: 1..=20, window [6, 7, 8] → 7 ms.
        let b = Benchmark::from_samples(&samples);
        assert_eq!(b.frame_ms, 7.0);
        assert_eq!(b.max_block_size, 16);

        let fast = Benchmark::from_samples(&[0.5; 20]);
        assert_eq!(fast.frame_ms, 2.0);
        assert_eq!(fast.max_block_size, 8);

        let slow = Benchmark::from_samples(&[100.0; 20]);
        assert_eq!(slow.frame_ms, 20.0);
    }

    #[test]
    fn startup_sweeps_then_calibrates() {
        let mut nav = Navigator::new(
            Viewport::default(),
            ViewLimits::default(),
            IterationTuning::default(),
            1200,
            1200,
            true,
        );
        assert_eq!(nav.mode(), NavMode::Startup);
        assert!(!nav.pan_by(10.0, 0.0), "input is ignored during startup");

        let start = Instant::now();
        let mut t = start;
        let first = nav.tick(t, false);
        assert!(first.view_changed, "first step does not wait for a frame");

        // Without a presented frame the sweep holds.
        assert_eq!(nav.tick(t, false), NavUpdate::default());

        for _ in 1..STARTUP_STEPS {
            t += Duration::from_millis(10);
            assert!(nav.tick(t, true).view_changed);
        }
        assert!((nav.viewport().zoom - 298.0).abs() < 1e-9);
        assert!((nav.viewport().center_x + 400.0 / 298.0).abs() < 1e-12);

        let done = nav.tick(t, true);
        assert!(done.startup_finished);
        assert_eq!(nav.mode(), NavMode::Interactive);
        assert_eq!(nav.benchmark().frame_ms, 10.0);
        assert_eq!(nav.benchmark().max_block_size, 16);
    }

    #[test]
    fn startup_zoom_stays_within_limits() {
        let mut nav = Navigator::new(
            Viewport::default(),
            ViewLimits::default(),
            IterationTuning::default(),
            1200,
            1200,
            true,
        );
        let now = Instant::now();
        for _ in 0..STARTUP_STEPS {
            nav.tick(now, true);
            assert!(nav.viewport().zoom >= 100.0);
        }
    }

    #[test]
    fn travel_queued_during_startup() {
        let mut nav = Navigator::new(
            Viewport::default(),
            ViewLimits::default(),
            IterationTuning::default(),
            1200,
            1200,
            true,
        );
        nav.travel_to(destination("elephant").unwrap(), TravelKind::Permalink);
        let now = Instant::now();
        for _ in 0..=STARTUP_STEPS {
            nav.tick(now, true);
        }
        assert_eq!(nav.mode(), NavMode::Travelling);
    }

    #[test]
    fn jump_reaches_destination_exactly() {
        for (name, dest) in DESTINATIONS {
            let mut nav = interactive();
            assert!(nav.jump_to(name));
            run_until_interactive(&mut nav, 200_000);
            let v = nav.viewport();
            assert_eq!(v.center_x, dest.center_x, "{name}");
            assert_eq!(v.center_y, dest.center_y, "{name}");
            assert_eq!(v.zoom, dest.zoom, "{name}");
            assert_eq!(v.max_iterations, dest.iterations, "{name}");
        }
    }

    #[test]
    fn deep_jump_zooms_out_before_crossing() {
        let mut nav = interactive();
        nav.set_viewport(Viewport::new(-1.768778832, 0.001738995, 1e9, 800, true));
        nav.jump_to("elephant");
        let now = Instant::now();
        nav.tick(now, true);
        assert!(nav.viewport().zoom < 1e9, "first leg zooms out");
        assert_eq!(nav.viewport().center_x, -1.768778832, "centre holds while zooming out");
        run_until_interactive(&mut nav, 200_000);
        assert_eq!(nav.viewport().zoom, 203_212.0);
    }

    #[test]
    fn travel_waits_for_frames() {
        let mut nav = interactive();
        nav.jump_to("seahorse");
        let before = *nav.viewport();
        assert_eq!(nav.tick(Instant::now(), false), NavUpdate::default());
        assert_eq!(*nav.viewport(), before);
    }

    #[test]
    fn input_interrupts_travel() {
        let mut nav = interactive();
        nav.jump_to("sun");
        assert!(nav.pan_by(5.0, 0.0));
        assert_eq!(nav.mode(), NavMode::Interactive);
    }

    #[test]
    fn wheel_zoom_keeps_cursor_point_fixed() {
        let mut nav = interactive();
        let before = nav.transform().subpixel_to_complex(200.0, 900.0);
        assert!(nav.zoom_at(200.0, 900.0, true));
        assert_eq!(nav.viewport().zoom, 360.0);
        let after = nav.transform().subpixel_to_complex(200.0, 900.0);
        assert!((before.re - after.re).abs() < 1e-12);
        assert!((before.im - after.im).abs() < 1e-12);
        // log10(360) · 32 + 128 = 209.8
        assert_eq!(nav.viewport().max_iterations, 209);
    }

    #[test]
    fn wheel_zoom_respects_limits() {
        let mut nav = interactive();
        nav.set_viewport(Viewport::new(0.0, 0.0, 100.0, 200, true));
        assert!(!nav.zoom_at(600.0, 600.0, false));
        nav.set_viewport(Viewport::new(0.0, 0.0, 1.9e15, 200, true));
        assert!(nav.zoom_at(600.0, 600.0, true));
        assert_eq!(nav.viewport().zoom, 2e15);
        assert!(!nav.zoom_at(600.0, 600.0, true));
    }

    #[test]
    fn manual_iterations_disable_auto_tuning() {
        let mut nav = interactive();
        assert!(nav.set_iterations(777));
        nav.zoom_at(600.0, 600.0, true);
        assert_eq!(nav.viewport().max_iterations, 777);
        assert!(nav.set_auto_iterations(true));
        assert_eq!(nav.viewport().max_iterations, 209);
    }

    #[test]
    fn pan_moves_centre_against_drag() {
        let mut nav = interactive();
        let x = nav.viewport().center_x;
        nav.pan_by(30.0, -60.0);
        assert!((nav.viewport().center_x - (x - 0.1)).abs() < 1e-12);
        assert!((nav.viewport().center_y + 0.2).abs() < 1e-12);
    }

    #[test]
    fn pinch_scales_zoom() {
        let mut nav = interactive();
        nav.pinch(2.0, 600.0, 600.0);
        assert_eq!(nav.viewport().zoom, 312.0);
        nav.pinch(-2.0, 600.0, 600.0);
        assert!(nav.viewport().zoom < 312.0);
    }

    #[test]
    fn rotation_only_toggles_when_interactive() {
        let mut nav = interactive();
        assert!(nav.toggle_rotation());
        assert_eq!(nav.mode(), NavMode::Rotating);
        nav.jump_to("home");
        assert!(!nav.is_rotating(), "travel stops rotation");
        assert!(!nav.toggle_rotation());
    }
}
