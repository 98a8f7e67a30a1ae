use eframe::egui;

use mandelscope_core::navigation::DESTINATIONS;

use crate::app::{CursorReadout, MandelscopeApp, PAN_FRACTION};

/// Digit keys, in the order of [`DESTINATIONS`].
const DESTINATION_KEYS: [egui::Key; 10] = [
    egui::Key::Num0,
    egui::Key::Num1,
    egui::Key::Num2,
    egui::Key::Num3,
    egui::Key::Num4,
    egui::Key::Num5,
    egui::Key::Num6,
    egui::Key::Num7,
    egui::Key::Num8,
    egui::Key::Num9,
];

/// egui reports pinch as a multiplicative factor; the navigator takes a
/// ratio where `ratio · zoom / 50` is added to the zoom.
const PINCH_RATIO_SCALE: f64 = 50.0;

impl MandelscopeApp {
    pub(crate) fn handle_canvas_input(&mut self, ctx: &egui::Context, response: &egui::Response) {
        let origin = response.rect.min;
        let hover = response
            .hover_pos()
            .map(|pos| ((pos.x - origin.x) as f64, (pos.y - origin.y) as f64));

        self.cursor = hover.and_then(|(px, py)| {
            let result = self.render.point_query(px, py).ok()?;
            Some(CursorReadout {
                c: self.render.complex_at(px, py),
                result,
            })
        });

        if let Some((px, py)) = hover {
            let scroll_y = ctx.input(|i| i.raw_scroll_delta.y);
            if scroll_y != 0.0 {
                self.render.zoom_at(px, py, scroll_y > 0.0);
            }

            let zoom_delta = ctx.input(|i| i.zoom_delta()) as f64;
            if zoom_delta != 1.0 {
                self.render
                    .pinch((zoom_delta - 1.0) * PINCH_RATIO_SCALE, px, py);
            }
        }

        if response.drag_started_by(egui::PointerButton::Primary) {
            self.drag_active = true;
            self.render.set_interacting(true);
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            let delta = response.drag_delta();
            self.render.pan_by(delta.x as f64, delta.y as f64);
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            self.drag_active = false;
            self.render.set_interacting(false);
        }
    }

    pub(crate) fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if ctx.memory(|m| m.focused().is_some()) {
            return;
        }
        let (width, height) = self.render.canvas_size();
        let (w, h) = (width as f64, height as f64);

        ctx.input(|input| {
            if input.key_pressed(egui::Key::ArrowLeft) {
                self.render.pan_by(w * PAN_FRACTION, 0.0);
            }
            if input.key_pressed(egui::Key::ArrowRight) {
                self.render.pan_by(-w * PAN_FRACTION, 0.0);
            }
            if input.key_pressed(egui::Key::ArrowUp) {
                self.render.pan_by(0.0, h * PAN_FRACTION);
            }
            if input.key_pressed(egui::Key::ArrowDown) {
                self.render.pan_by(0.0, -h * PAN_FRACTION);
            }

            if input.key_pressed(egui::Key::Plus) || input.key_pressed(egui::Key::Equals) {
                self.render.zoom_at(w / 2.0, h / 2.0, true);
            }
            if input.key_pressed(egui::Key::Minus) {
                self.render.zoom_at(w / 2.0, h / 2.0, false);
            }

            if input.key_pressed(egui::Key::Escape) {
                self.render.flush();
                self.render.cancel_poster();
            }

            if input.key_pressed(egui::Key::P) {
                if input.modifiers.shift {
                    self.render.previous_palette();
                } else {
                    self.render.next_palette();
                }
            }
            if input.key_pressed(egui::Key::R) {
                self.render.toggle_rotation();
            }
            if input.key_pressed(egui::Key::X) {
                let show = !self.render.show_axes();
                self.render.set_show_axes(show);
            }
            if input.key_pressed(egui::Key::S) && !input.modifiers.ctrl {
                let smooth = !self.render.viewport().smooth;
                self.render.set_smooth(smooth);
            }
            if input.key_pressed(egui::Key::I) {
                let auto = !self.render.navigator().auto_iterations();
                self.render.set_auto_iterations(auto);
            }
            if input.key_pressed(egui::Key::CloseBracket) {
                let iterations = self.render.viewport().max_iterations;
                self.render.set_iterations(iterations.saturating_add(50));
            }
            if input.key_pressed(egui::Key::OpenBracket) {
                let iterations = self.render.viewport().max_iterations;
                self.render.set_iterations(iterations.saturating_sub(50));
            }
            if input.key_pressed(egui::Key::H) {
                self.show_hud = !self.show_hud;
            }
            if input.key_pressed(egui::Key::J) {
                self.show_julia_preview = !self.show_julia_preview;
                self.julia_texture = None;
            }

            for (key, (name, _)) in DESTINATION_KEYS.iter().zip(DESTINATIONS.iter()) {
                if input.key_pressed(*key) {
                    self.render.jump_to(name);
                }
            }
        });

        if ctx.input(|i| i.key_pressed(egui::Key::L)) {
            self.copy_permalink(ctx);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::E)) {
            self.start_poster();
        }
    }
}
