use std::sync::mpsc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use eframe::egui;
use tracing::{error, info, warn};

use mandelscope_core::{Complex, IterationResult, NavMode};
use mandelscope_render::{
    export_png, poster_file_name, FrameEvent, PassState, PosterImage, RenderContext,
    RenderError,
};

use crate::preferences::AppPreferences;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Arrow keys pan by this fraction of the canvas.
pub(crate) const PAN_FRACTION: f64 = 0.1;
pub(crate) const HUD_MARGIN: f32 = 8.0;
pub(crate) const HUD_CORNER_RADIUS: f32 = 6.0;

/// What the pointer is over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CursorReadout {
    pub(crate) c: Complex,
    pub(crate) result: IterationResult,
}

pub(crate) struct MandelscopeApp {
    pub(crate) render: RenderContext,
    pub(crate) preferences: AppPreferences,
    frame_events: mpsc::Receiver<FrameEvent>,

    texture: Option<egui::TextureHandle>,
    texture_revision: u64,

    pub(crate) show_hud: bool,
    pub(crate) show_julia_preview: bool,
    pub(crate) drag_active: bool,
    pub(crate) cursor: Option<CursorReadout>,
    pub(crate) julia_texture: Option<(egui::TextureHandle, Complex)>,

    pub(crate) last_render_ms: Option<f64>,
    pub(crate) progress: u32,
    pub(crate) status: Option<String>,
}

impl MandelscopeApp {
    pub(crate) fn new(
        preferences: AppPreferences,
        permalink: Option<String>,
    ) -> mandelscope_render::Result<Self> {
        let render = RenderContext::new(preferences.render.clone())?;
        let mut app = Self::with_context(render, preferences);

        let startup_link = permalink.or_else(|| {
            app.preferences
                .restore_last_view
                .then(|| app.preferences.last_permalink.clone())
                .flatten()
        });
        if let Some(query) = startup_link {
            app.load_permalink(&query);
        }
        Ok(app)
    }

    pub(crate) fn with_context(mut render: RenderContext, preferences: AppPreferences) -> Self {
        let frame_events = render.subscribe();
        Self {
            render,
            show_hud: preferences.show_hud,
            preferences,
            frame_events,
            texture: None,
            texture_revision: 0,
            show_julia_preview: false,
            drag_active: false,
            cursor: None,
            julia_texture: None,
            last_render_ms: None,
            progress: 0,
            status: None,
        }
    }

    // -- Permalinks -----------------------------------------------------------

    pub(crate) fn load_permalink(&mut self, query: &str) {
        let parsed = self.render.load_permalink(query);
        if !parsed.rejected.is_empty() {
            let fields: Vec<String> = parsed.rejected.iter().map(ToString::to_string).collect();
            warn!(?fields, "Permalink fields ignored");
            self.status = Some(format!("Ignored {} permalink field(s)", fields.len()));
        }
    }

    pub(crate) fn copy_permalink(&mut self, ctx: &egui::Context) {
        let query = format!("?{}", self.render.save_permalink().to_query());
        ctx.copy_text(query.clone());
        info!(%query, "Permalink copied");
        self.status = Some("Permalink copied to clipboard".into());
    }

    // -- Poster ---------------------------------------------------------------

    pub(crate) fn start_poster(&mut self) {
        match self.render.start_poster() {
            Ok(()) => self.status = Some("Rendering poster…".into()),
            Err(e) => {
                error!("Could not start poster: {e}");
                self.status = Some(format!("Poster failed: {e}"));
            }
        }
    }

    fn poll_poster(&mut self) {
        let Some(result) = self.render.take_poster() else {
            return;
        };
        let message = match result.and_then(|poster| self.save_poster(&poster)) {
            Ok(name) => format!("Saved {name}"),
            Err(RenderError::Cancelled) => "Poster cancelled".into(),
            Err(e) => {
                error!("Poster export failed: {e}");
                format!("Poster failed: {e}")
            }
        };
        self.status = Some(message);
    }

    fn save_poster(&self, poster: &PosterImage) -> mandelscope_render::Result<String> {
        let dir = crate::app_dir::images_directory();
        std::fs::create_dir_all(&dir)?;
        let epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let name = poster_file_name(epoch);
        let link = self.render.save_permalink();
        export_png(&poster.raster, &dir.join(&name), Some(&link))?;
        info!("Poster saved to {}", dir.join(&name).display());
        Ok(name)
    }

    // -- Frame events ---------------------------------------------------------

    fn poll_frame_events(&mut self) {
        for event in self.frame_events.try_iter() {
            match event {
                FrameEvent::Progress { percent, .. } => self.progress = percent,
                FrameEvent::PassComplete { elapsed, .. } => {
                    self.progress = 100;
                    self.last_render_ms = Some(elapsed.as_secs_f64() * 1000.0);
                }
                FrameEvent::Failed { worker_id, message, .. } => {
                    self.status = Some(format!("Segment {worker_id} failed: {message}"));
                }
                FrameEvent::SegmentPresented { .. } => {}
            }
        }
    }

    fn upload_texture(&mut self, ctx: &egui::Context) {
        let revision = self.render.frame_revision();
        if self.texture.is_some() && revision == self.texture_revision {
            return;
        }
        let buffer = self.render.frame();
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [buffer.width as usize, buffer.height as usize],
            &buffer.pixels,
        );
        match self.texture.as_mut() {
            Some(tex) => tex.set(image, egui::TextureOptions::NEAREST),
            None => {
                self.texture =
                    Some(ctx.load_texture("fractal", image, egui::TextureOptions::NEAREST));
            }
        }
        self.texture_revision = revision;
    }

    /// Re-render the Julia preview when the point under the cursor moved.
    pub(crate) fn refresh_julia_preview(&mut self, ctx: &egui::Context) {
        if !self.show_julia_preview {
            return;
        }
        let Some(cursor) = self.cursor else {
            return;
        };
        if self.julia_texture.as_ref().is_some_and(|(_, c)| *c == cursor.c) {
            return;
        }
        let size = self.preferences.julia_preview_size;
        match self.render.julia_preview(cursor.c, size) {
            Ok(buffer) => {
                let image = egui::ColorImage::from_rgba_unmultiplied(
                    [buffer.width as usize, buffer.height as usize],
                    &buffer.pixels,
                );
                let handle = ctx.load_texture("julia_preview", image, egui::TextureOptions::LINEAR);
                self.julia_texture = Some((handle, cursor.c));
            }
            Err(e) => warn!("Julia preview failed: {e}"),
        }
    }

    fn needs_repaint(&self) -> bool {
        self.drag_active
            || self.render.pass_state() != PassState::Idle
            || !matches!(self.render.mode(), NavMode::Interactive)
            || self.render.poster_progress().is_some()
    }
}

impl eframe::App for MandelscopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        self.render.tick(Instant::now());
        self.poll_frame_events();
        self.poll_poster();

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let available = ui.available_size();
                let width = available.x.max(1.0) as u32;
                let height = available.y.max(1.0) as u32;
                if let Err(e) = self.render.resize(width, height) {
                    warn!("Resize to {width}x{height} rejected: {e}");
                }

                self.upload_texture(ctx);
                let (response, painter) =
                    ui.allocate_painter(available, egui::Sense::click_and_drag());
                if let Some(tex) = &self.texture {
                    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                    painter.image(tex.id(), response.rect, uv, egui::Color32::WHITE);
                }

                self.handle_canvas_input(ctx, &response);
            });

        self.handle_keyboard(ctx);
        self.refresh_julia_preview(ctx);
        self.show_hud(ctx);

        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.preferences.window_width = rect.width();
            self.preferences.window_height = rect.height();
        }

        if self.needs_repaint() {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.preferences.show_hud = self.show_hud;
        self.preferences.last_permalink = Some(self.render.save_permalink().to_query());
        self.preferences.save();
        info!("Saved preferences on exit");
    }
}
