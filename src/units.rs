//! Millimeter to pixel conversion for the scaled canvas.
//!
//! A single scale factor drives every conversion in a frame (element
//! geometry, stroke widths, shadow offsets, guides), so zooming the
//! container can never distort relative proportions. The fit is
//! recomputed every frame from the currently available space.

use egui::Vec2;

/// Result of fitting a physical canvas into a pixel container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasFit {
    /// Pixels per millimeter.
    pub scale: f32,
    /// On-screen canvas size in pixels.
    pub visible_px: Vec2,
}

/// Fit a `canvas_mm` sized label into `available_px` of screen space,
/// keeping `padding_px` clear on every side.
///
/// The smaller of the width-constrained and height-constrained scales
/// wins, so the canvas always fits both axes and never stretches.
pub fn fit(canvas_mm: Vec2, available_px: Vec2, padding_px: f32) -> CanvasFit {
    let usable = Vec2::new(
        (available_px.x - 2.0 * padding_px).max(1.0),
        (available_px.y - 2.0 * padding_px).max(1.0),
    );
    let width_mm = canvas_mm.x.max(0.001);
    let height_mm = canvas_mm.y.max(0.001);
    let scale = (usable.x / width_mm).min(usable.y / height_mm);
    CanvasFit {
        scale,
        visible_px: Vec2::new(width_mm * scale, height_mm * scale),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_constrained_fit() {
        let fit = fit(Vec2::new(100.0, 50.0), Vec2::new(800.0, 600.0), 40.0);
        assert!((fit.scale - 7.2).abs() < 1e-4);
        assert!((fit.visible_px.x - 720.0).abs() < 1e-3);
        assert!((fit.visible_px.y - 360.0).abs() < 1e-3);
    }

    #[test]
    fn height_constrained_fit() {
        // Tall label in a wide container: height decides.
        let fit = fit(Vec2::new(50.0, 100.0), Vec2::new(800.0, 600.0), 40.0);
        assert!((fit.scale - 5.2).abs() < 1e-4);
        assert!((fit.visible_px.y - 520.0).abs() < 1e-3);
    }

    #[test]
    fn canvas_always_fits_and_touches_one_axis() {
        let cases = [
            (Vec2::new(30.0, 30.0), Vec2::new(1000.0, 400.0), 20.0),
            (Vec2::new(200.0, 20.0), Vec2::new(640.0, 480.0), 16.0),
            (Vec2::new(10.0, 300.0), Vec2::new(300.0, 300.0), 0.0),
        ];
        for (canvas, container, padding) in cases {
            let fit = fit(canvas, container, padding);
            let usable = container - Vec2::splat(2.0 * padding);
            assert!(fit.visible_px.x <= usable.x + 1e-3);
            assert!(fit.visible_px.y <= usable.y + 1e-3);
            let touches = (fit.visible_px.x - usable.x).abs() < 1e-3
                || (fit.visible_px.y - usable.y).abs() < 1e-3;
            assert!(touches, "fit should use all of one axis");
        }
    }

    #[test]
    fn aspect_is_preserved() {
        let canvas = Vec2::new(120.0, 45.0);
        let fit = fit(canvas, Vec2::new(777.0, 333.0), 12.0);
        let aspect_in = canvas.x / canvas.y;
        let aspect_out = fit.visible_px.x / fit.visible_px.y;
        assert!((aspect_in - aspect_out).abs() < 1e-4);
    }

    #[test]
    fn degenerate_container_still_positive() {
        let fit = fit(Vec2::new(100.0, 50.0), Vec2::new(30.0, 30.0), 40.0);
        assert!(fit.scale > 0.0);
        assert!(fit.visible_px.x > 0.0);
    }
}
