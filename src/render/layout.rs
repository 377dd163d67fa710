//! Screen-space geometry shared by the painter and the pointer router:
//! millimeter/pixel mapping, rotated element boxes, and handle
//! placement.

use egui::{Context, FontFamily, FontId, Pos2, Rect, Vec2};

use crate::element::{DesignElement, ElementKind, FontChoice, TextPayload};

/// Visual radius of a drag handle.
pub const HANDLE_RADIUS_PX: f32 = 6.0;
/// Pointer hit radius around a handle, a little forgiving.
pub const HANDLE_HIT_RADIUS_PX: f32 = 10.0;
/// Distance of the rotation handle above the element's top edge.
pub const ROTATE_HANDLE_OFFSET_PX: f32 = 24.0;

/// Frame-local mapping between label millimeters and screen pixels.
#[derive(Debug, Clone, Copy)]
pub struct ScreenMap {
    /// Screen position of the canvas's top-left corner.
    pub origin_px: Pos2,
    /// Pixels per millimeter.
    pub scale: f32,
}

impl ScreenMap {
    pub fn to_px(&self, mm: Pos2) -> Pos2 {
        self.origin_px + mm.to_vec2() * self.scale
    }

    pub fn to_mm(&self, px: Pos2) -> Pos2 {
        ((px - self.origin_px) / self.scale).to_pos2()
    }

    pub fn len_px(&self, mm: f32) -> f32 {
        mm * self.scale
    }
}

/// An element's oriented bounding box in screen space.
#[derive(Debug, Clone, Copy)]
pub struct ElementBox {
    pub center_px: Pos2,
    pub size_px: Vec2,
    pub rotation_rad: f32,
}

impl ElementBox {
    /// Axis-aligned rect before rotation is applied.
    pub fn unrotated_rect(&self) -> Rect {
        Rect::from_center_size(self.center_px, self.size_px)
    }

    /// Corner positions after rotation, clockwise from top-left.
    pub fn corners(&self) -> [Pos2; 4] {
        let rect = self.unrotated_rect();
        [
            self.rotate_point(rect.left_top()),
            self.rotate_point(rect.right_top()),
            self.rotate_point(rect.right_bottom()),
            self.rotate_point(rect.left_bottom()),
        ]
    }

    /// Whether a screen point falls inside the rotated box. The point
    /// is rotated back into the box's local frame and tested against
    /// the axis-aligned rect.
    pub fn contains(&self, point: Pos2) -> bool {
        self.unrotated_rect().contains(self.unrotate_point(point))
    }

    /// Bottom-right resize handle, in rotated screen space.
    pub fn resize_handle(&self) -> Pos2 {
        self.rotate_point(self.unrotated_rect().right_bottom())
    }

    /// Rotation handle floating above the top edge.
    pub fn rotate_handle(&self) -> Pos2 {
        let top = self.unrotated_rect().center_top() - Vec2::new(0.0, ROTATE_HANDLE_OFFSET_PX);
        self.rotate_point(top)
    }

    pub fn hits_resize_handle(&self, point: Pos2) -> bool {
        (point - self.resize_handle()).length() <= HANDLE_HIT_RADIUS_PX
    }

    pub fn hits_rotate_handle(&self, point: Pos2) -> bool {
        (point - self.rotate_handle()).length() <= HANDLE_HIT_RADIUS_PX
    }

    fn rotate_point(&self, point: Pos2) -> Pos2 {
        rotate_around(point, self.center_px, self.rotation_rad)
    }

    fn unrotate_point(&self, point: Pos2) -> Pos2 {
        rotate_around(point, self.center_px, -self.rotation_rad)
    }
}

pub fn rotate_around(point: Pos2, center: Pos2, radians: f32) -> Pos2 {
    let (sin, cos) = radians.sin_cos();
    let v = point - center;
    center + Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// egui font for a stored font choice at a screen pixel size.
pub fn font_id(payload: &TextPayload, scale: f32) -> FontId {
    let family = match payload.font {
        FontChoice::Sans => FontFamily::Proportional,
        FontChoice::Serif => crate::fonts::serif_family(),
        FontChoice::Mono => FontFamily::Monospace,
    };
    FontId::new(payload.font_size_mm * scale, family)
}

/// Measure a text payload's on-screen extent at the current scale.
pub fn measure_text(ctx: &Context, payload: &TextPayload, scale: f32) -> Vec2 {
    let font = font_id(payload, scale);
    ctx.fonts(|fonts| {
        fonts
            .layout(
                payload.content.clone(),
                font,
                payload.color,
                f32::INFINITY,
            )
            .size()
    })
}

/// Screen-space box for any element. Text boxes are intrinsic to the
/// laid-out content; everything else carries an explicit size.
pub fn element_box(ctx: &Context, element: &DesignElement, map: &ScreenMap) -> ElementBox {
    let size_px = match (&element.kind, element.box_size_mm()) {
        (ElementKind::Text(payload), _) => measure_text(ctx, payload, map.scale),
        (_, Some(size_mm)) => size_mm * map.scale,
        (_, None) => Vec2::ZERO,
    };
    ElementBox {
        center_px: map.to_px(element.position_mm),
        size_px,
        rotation_rad: element.rotation_deg.to_radians(),
    }
}
