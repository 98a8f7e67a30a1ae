mod app;
mod app_dir;
mod hud;
mod input;
mod preferences;

use eframe::egui;
use tracing::info;

use app::MandelscopeApp;
use preferences::AppPreferences;

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Mandelscope");

    // Optional permalink query, e.g. `Re=-0.74&Im=0.12&zoom=113388`.
    let permalink = std::env::args().nth(1);
    let prefs = AppPreferences::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Mandelscope")
            .with_inner_size([prefs.window_width, prefs.window_height]),
        ..Default::default()
    };

    eframe::run_native(
        "Mandelscope",
        options,
        Box::new(move |_cc| Ok(Box::new(MandelscopeApp::new(prefs, permalink)?))),
    )
}
