//! TránsitoBot Desktop: application entry.

mod app;

use eframe::egui;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([480.0, 760.0])
            .with_min_inner_size([360.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        transito::suggestions::TITLE,
        options,
        Box::new(|cc| Box::new(app::TransitoApp::new(cc))),
    )
}
