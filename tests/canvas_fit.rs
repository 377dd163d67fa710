use egui::Vec2;
use stickerlab::units;

#[test]
fn label_in_storefront_container() {
    // 100x50mm label in an 800x600px host with 40px padding.
    let fit = units::fit(Vec2::new(100.0, 50.0), Vec2::new(800.0, 600.0), 40.0);
    assert!((fit.scale - 7.2).abs() < 1e-4);
    assert!((fit.visible_px.x - 720.0).abs() < 1e-3);
    assert!((fit.visible_px.y - 360.0).abs() < 1e-3);
}

#[test]
fn resize_of_container_rescales_uniformly() {
    let canvas = Vec2::new(100.0, 50.0);
    let small = units::fit(canvas, Vec2::new(400.0, 300.0), 40.0);
    let large = units::fit(canvas, Vec2::new(1600.0, 1200.0), 40.0);
    // Same aspect at any container size.
    let aspect_small = small.visible_px.x / small.visible_px.y;
    let aspect_large = large.visible_px.x / large.visible_px.y;
    assert!((aspect_small - aspect_large).abs() < 1e-4);
    assert!(large.scale > small.scale);
}

#[test]
fn square_label_in_wide_container_is_height_constrained() {
    let fit = units::fit(Vec2::new(60.0, 60.0), Vec2::new(1000.0, 500.0), 50.0);
    assert!((fit.scale - 400.0 / 60.0).abs() < 1e-4);
    assert!((fit.visible_px.y - 400.0).abs() < 1e-3);
}
