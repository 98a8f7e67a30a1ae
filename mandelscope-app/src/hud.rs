use eframe::egui;

use mandelscope_core::{IterationResult, NavMode};
use mandelscope_render::PassState;

use crate::app::{MandelscopeApp, HUD_CORNER_RADIUS, HUD_MARGIN};

const HUD_ALPHA: u8 = 166;

fn panel_frame() -> egui::Frame {
    egui::Frame::NONE
        .fill(egui::Color32::from_black_alpha(HUD_ALPHA))
        .inner_margin(egui::Margin::same(8))
        .corner_radius(HUD_CORNER_RADIUS)
}

fn pass_label(state: PassState) -> (String, egui::Color32) {
    match state {
        PassState::Idle => ("Done".into(), egui::Color32::from_rgb(100, 255, 100)),
        PassState::ComputePending | PassState::RenderPending => {
            ("Queued".into(), egui::Color32::YELLOW)
        }
        PassState::Computing(n) => (format!("Computing ({n})"), egui::Color32::YELLOW),
        PassState::Rendering(n) => (format!("Colouring ({n})"), egui::Color32::YELLOW),
    }
}

fn mode_label(mode: NavMode) -> &'static str {
    match mode {
        NavMode::Startup => "Calibrating",
        NavMode::Interactive => "Interactive",
        NavMode::Rotating => "Cycling colours",
        NavMode::Travelling => "Travelling",
    }
}

impl MandelscopeApp {
    pub(crate) fn show_hud(&mut self, ctx: &egui::Context) {
        if !self.show_hud {
            return;
        }

        // -- Top-left: view --
        egui::Area::new(egui::Id::new("hud_params"))
            .anchor(egui::Align2::LEFT_TOP, [HUD_MARGIN, HUD_MARGIN])
            .show(ctx, |ui| {
                panel_frame().show(ui, |ui| {
                    ui.style_mut().visuals.override_text_color =
                        Some(egui::Color32::from_rgb(220, 220, 220));

                    let view = self.render.viewport();
                    ui.label(format!(
                        "Center: {:.13} {:+.13}i",
                        view.center_x, view.center_y
                    ));
                    ui.label(format!("Zoom: {:.0}", view.zoom));
                    ui.label(format!(
                        "Iterations: {} ({})",
                        view.max_iterations,
                        if self.render.navigator().auto_iterations() {
                            "auto"
                        } else {
                            "fixed"
                        }
                    ));
                    let palette = self.render.palette();
                    ui.label(format!(
                        "Palette: {} +{} ({})",
                        palette.name(),
                        palette.rotation(),
                        if view.smooth { "smooth" } else { "banded" }
                    ));
                    ui.label(mode_label(self.render.mode()));

                    if let Some(cursor) = self.cursor {
                        ui.separator();
                        ui.label(format!("Cursor: {:.10} {:+.10}i", cursor.c.re, cursor.c.im));
                        ui.label(match cursor.result {
                            IterationResult::Interior => "Interior".to_string(),
                            IterationResult::Escaped { iterations, .. } => {
                                format!("Escaped after {iterations}")
                            }
                        });
                    }
                });
            });

        // -- Bottom-centre: render stats --
        egui::Area::new(egui::Id::new("hud_render"))
            .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -HUD_MARGIN])
            .show(ctx, |ui| {
                panel_frame().show(ui, |ui| {
                    ui.set_min_width(180.0);
                    ui.style_mut().visuals.override_text_color =
                        Some(egui::Color32::from_rgb(200, 200, 200));
                    ui.style_mut().spacing.item_spacing.y = 2.0;

                    let state = self.render.pass_state();
                    let (label, colour) = pass_label(state);
                    ui.colored_label(colour, label);
                    if state != PassState::Idle {
                        ui.add(
                            egui::ProgressBar::new(self.progress as f32 / 100.0)
                                .desired_width(160.0),
                        );
                    }
                    if let Some(ms) = self.last_render_ms {
                        ui.label(format!("{ms:.1} ms"));
                    }
                    if let Some(percent) = self.render.poster_progress() {
                        ui.label(format!("Poster {percent}%"));
                    }
                    if let Some(status) = &self.status {
                        ui.label(status.as_str());
                    }
                });
            });

        // -- Bottom-right: Julia preview --
        if self.show_julia_preview {
            if let Some((texture, c)) = &self.julia_texture {
                egui::Area::new(egui::Id::new("hud_julia"))
                    .anchor(egui::Align2::RIGHT_BOTTOM, [-HUD_MARGIN, -HUD_MARGIN])
                    .show(ctx, |ui| {
                        panel_frame().show(ui, |ui| {
                            let side = self.preferences.julia_preview_size as f32;
                            ui.image((texture.id(), egui::vec2(side, side)));
                            ui.label(format!("c = {:.6} {:+.6}i", c.re, c.im));
                        });
                    });
            }
        }
    }
}
