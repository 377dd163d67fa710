#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use stickerlab::{CanvasConfig, Material, StickerLabApp};

fn main() -> eframe::Result {
    env_logger::init();

    // Stand-in for the product configurator handoff.
    let mut config = CanvasConfig::new(100.0, 50.0);
    config.corner_radius_mm = 3.0;
    config.material = Material::White;
    config.quantity = 100;
    config.product_name = "Rectangular labels".to_owned();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Sticker Lab",
        options,
        Box::new(|cc| Ok(Box::new(StickerLabApp::new(cc, config)))),
    )
}
