//! Outline generation for the path-based shape primitives.
//!
//! Outlines are produced in a unit coordinate space ([0, 1] × [0, 1],
//! y pointing down) and scaled into the element box at raster time.

use egui::{Pos2, Vec2, pos2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Triangle,
    Heart,
    Star,
    Hexagon,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::Rectangle,
        ShapeKind::Circle,
        ShapeKind::Triangle,
        ShapeKind::Heart,
        ShapeKind::Star,
        ShapeKind::Hexagon,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Circle => "Circle",
            ShapeKind::Triangle => "Triangle",
            ShapeKind::Heart => "Heart",
            ShapeKind::Star => "Star",
            ShapeKind::Hexagon => "Hexagon",
        }
    }

    /// Closed outline in unit space. Curved shapes are flattened into
    /// polylines dense enough for the supersampled rasterizer.
    pub fn unit_outline(&self) -> Vec<Pos2> {
        match self {
            ShapeKind::Rectangle => vec![
                pos2(0.0, 0.0),
                pos2(1.0, 0.0),
                pos2(1.0, 1.0),
                pos2(0.0, 1.0),
            ],
            ShapeKind::Circle => regular_polygon(64, 0.5, -90.0),
            ShapeKind::Triangle => vec![pos2(0.5, 0.0), pos2(1.0, 1.0), pos2(0.0, 1.0)],
            ShapeKind::Heart => heart_outline(64),
            ShapeKind::Star => star_outline(5, 0.5, 0.2),
            ShapeKind::Hexagon => regular_polygon(6, 0.5, -90.0),
        }
    }
}

/// Regular n-gon centered at (0.5, 0.5), phase in degrees measured from
/// the +x axis (screen coordinates, y down).
fn regular_polygon(sides: usize, radius: f32, phase_deg: f32) -> Vec<Pos2> {
    let center = pos2(0.5, 0.5);
    (0..sides)
        .map(|i| {
            let angle = (phase_deg + 360.0 * i as f32 / sides as f32).to_radians();
            center + Vec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// Five-pointed star: alternate between outer and inner radius, tip up.
fn star_outline(points: usize, outer: f32, inner: f32) -> Vec<Pos2> {
    let center = pos2(0.5, 0.5);
    (0..points * 2)
        .map(|i| {
            let radius = if i % 2 == 0 { outer } else { inner };
            let angle = (-90.0 + 180.0 * i as f32 / points as f32).to_radians();
            center + Vec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// Classic parametric heart curve, normalized into unit space.
///
/// x(t) = 16 sin³ t, y(t) = 13 cos t − 5 cos 2t − 2 cos 3t − cos 4t,
/// with y flipped for screen coordinates.
fn heart_outline(segments: usize) -> Vec<Pos2> {
    // Curve extents: x ∈ [-16, 16], y ∈ [-17, 13].
    const X_SPAN: f32 = 32.0;
    const Y_SPAN: f32 = 30.0;
    const Y_MAX: f32 = 13.0;

    (0..segments)
        .map(|i| {
            let t = std::f32::consts::TAU * i as f32 / segments as f32;
            let x = 16.0 * t.sin().powi(3);
            let y = 13.0 * t.cos()
                - 5.0 * (2.0 * t).cos()
                - 2.0 * (3.0 * t).cos()
                - (4.0 * t).cos();
            pos2((x + X_SPAN / 2.0) / X_SPAN, (Y_MAX - y) / Y_SPAN)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_unit_space(points: &[Pos2]) -> bool {
        points
            .iter()
            .all(|p| (-0.001..=1.001).contains(&p.x) && (-0.001..=1.001).contains(&p.y))
    }

    #[test]
    fn all_outlines_stay_in_unit_space() {
        for kind in ShapeKind::ALL {
            let outline = kind.unit_outline();
            assert!(outline.len() >= 3, "{:?} outline too short", kind);
            assert!(in_unit_space(&outline), "{:?} leaves unit space", kind);
        }
    }

    #[test]
    fn star_alternates_radii() {
        let outline = star_outline(5, 0.5, 0.2);
        assert_eq!(outline.len(), 10);
        let center = pos2(0.5, 0.5);
        for (i, p) in outline.iter().enumerate() {
            let r = (*p - center).length();
            let expected = if i % 2 == 0 { 0.5 } else { 0.2 };
            assert!((r - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn star_tip_points_up() {
        let outline = ShapeKind::Star.unit_outline();
        // First vertex is the top tip in screen coordinates.
        assert!((outline[0].x - 0.5).abs() < 1e-4);
        assert!(outline[0].y < 0.1);
    }

    #[test]
    fn heart_is_symmetric() {
        let outline = heart_outline(128);
        // Mirror every point across x = 0.5 and expect a close match
        // somewhere on the outline.
        for p in &outline {
            let mirrored = pos2(1.0 - p.x, p.y);
            let nearest = outline
                .iter()
                .map(|q| (*q - mirrored).length())
                .fold(f32::INFINITY, f32::min);
            assert!(nearest < 0.05, "asymmetric at {:?}", p);
        }
    }
}
