//! Per-frame canvas painting: material background, elements by kind,
//! selection chrome, snap guides, and the safe-margin overlay.
//!
//! Everything is expressed in millimeters and multiplied by the frame's
//! single scale factor at the last moment, so zoom changes never warp
//! proportions.

pub mod layout;
pub mod snapshot;
pub mod texture;

use egui::emath::Rot2;
use egui::epaint::TextShape;
use egui::{
    Align, Color32, Context, Mesh, Painter, Pos2, Rect, Rounding, Shape, Stroke, Vec2, pos2,
};
use log::trace;

use crate::config::{CanvasConfig, LabelShape, Material};
use crate::element::{
    Bitmap, DesignElement, ElementId, ElementKind, FontWeight, TablePayload, TextDecoration,
    TextPayload,
};
use crate::interaction::SnapGuides;
use crate::store::ElementStore;

use layout::{ElementBox, HANDLE_RADIUS_PX, ScreenMap, element_box, font_id, rotate_around};
use texture::TextureCache;

/// Advisory print-safe inset from every canvas edge.
pub const SAFE_MARGIN_MM: f32 = 2.0;

const SELECTION_COLOR: Color32 = Color32::from_rgb(0, 145, 255);
const GUIDE_COLOR: Color32 = Color32::from_rgb(255, 64, 160);

pub struct CanvasPainter {
    textures: TextureCache,
}

impl CanvasPainter {
    pub fn new() -> Self {
        Self {
            textures: TextureCache::default(),
        }
    }

    pub fn begin_frame(&mut self) {
        self.textures.begin_frame();
    }

    /// Drop cached textures for a removed element.
    pub fn invalidate(&mut self, id: ElementId) {
        self.textures.invalidate(id);
    }

    /// Paint one full frame of the canvas.
    pub fn paint(
        &mut self,
        ctx: &Context,
        painter: &Painter,
        map: &ScreenMap,
        config: &CanvasConfig,
        background_override: Option<Color32>,
        store: &ElementStore,
        guides: SnapGuides,
    ) {
        let canvas_rect = Rect::from_min_size(
            map.origin_px,
            Vec2::new(map.len_px(config.width_mm), map.len_px(config.height_mm)),
        );
        self.paint_background(painter, canvas_rect, map, config, background_override);

        for element in store.elements() {
            self.paint_element(ctx, painter, map, element);
        }

        if store.selected().is_some_and(DesignElement::is_text) {
            paint_safe_margin(painter, canvas_rect, map, config);
        }
        if let Some(selected) = store.selected() {
            let screen_box = element_box(ctx, selected, map);
            paint_selection(painter, &screen_box);
        }
        paint_snap_guides(painter, canvas_rect, guides);
    }

    fn paint_background(
        &self,
        painter: &Painter,
        canvas_rect: Rect,
        map: &ScreenMap,
        config: &CanvasConfig,
        background_override: Option<Color32>,
    ) {
        let rounding = match config.shape {
            LabelShape::Circle => Rounding::same(canvas_rect.size().min_elem() / 2.0),
            _ => Rounding::same(map.len_px(config.corner_radius_mm)),
        };

        if let Some(color) = background_override {
            painter.rect_filled(canvas_rect, rounding, color);
            return;
        }

        match config.material {
            Material::White => {
                painter.rect_filled(canvas_rect, rounding, Color32::WHITE);
            }
            Material::Gold => {
                painter.rect_filled(canvas_rect, rounding, Color32::from_rgb(212, 175, 55));
            }
            Material::Silver => {
                painter.rect_filled(canvas_rect, rounding, Color32::from_rgb(196, 199, 206));
            }
            Material::Eco => {
                painter.rect_filled(canvas_rect, rounding, Color32::from_rgb(193, 154, 107));
            }
            Material::Transparent => {
                painter.rect_filled(canvas_rect, rounding, Color32::WHITE);
                paint_checkerboard(painter, canvas_rect);
            }
            Material::Holographic => paint_holographic(painter, canvas_rect),
        }
    }

    fn paint_element(
        &mut self,
        ctx: &Context,
        painter: &Painter,
        map: &ScreenMap,
        element: &DesignElement,
    ) {
        let screen_box = element_box(ctx, element, map);
        match &element.kind {
            ElementKind::Text(payload) => paint_text(ctx, painter, map, &screen_box, payload),
            ElementKind::Image(payload) | ElementKind::Document(payload) => {
                self.paint_bitmap(ctx, painter, element, &screen_box, &payload.bitmap);
            }
            ElementKind::QrCode(payload) => {
                self.paint_cached(ctx, painter, element, &screen_box, payload.cache.as_ref());
            }
            ElementKind::Barcode(payload) => {
                self.paint_cached(ctx, painter, element, &screen_box, payload.cache.as_ref());
            }
            ElementKind::Table(payload) => paint_table(painter, map, &screen_box, payload),
            ElementKind::Shape(payload) => {
                self.paint_cached(ctx, painter, element, &screen_box, payload.cache.as_ref());
            }
        }
    }

    fn paint_cached(
        &mut self,
        ctx: &Context,
        painter: &Painter,
        element: &DesignElement,
        screen_box: &ElementBox,
        cache: Option<&Bitmap>,
    ) {
        match cache {
            Some(bitmap) => self.paint_bitmap(ctx, painter, element, screen_box, bitmap),
            None => paint_placeholder(painter, screen_box),
        }
    }

    fn paint_bitmap(
        &mut self,
        ctx: &Context,
        painter: &Painter,
        element: &DesignElement,
        screen_box: &ElementBox,
        bitmap: &Bitmap,
    ) {
        let texture =
            self.textures
                .get_or_upload(ctx, element.id, element.cache_version, bitmap);
        let Ok(texture_id) = texture else {
            trace!("skipping empty bitmap for {}", element.id);
            paint_placeholder(painter, screen_box);
            return;
        };

        let mut mesh = Mesh::with_texture(texture_id);
        mesh.add_rect_with_uv(
            screen_box.unrotated_rect(),
            Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
            Color32::WHITE,
        );
        if screen_box.rotation_rad != 0.0 {
            mesh.rotate(Rot2::from_angle(screen_box.rotation_rad), screen_box.center_px);
        }
        painter.add(Shape::mesh(mesh));
    }
}

impl Default for CanvasPainter {
    fn default() -> Self {
        Self::new()
    }
}

/// Gray/white tile pattern standing in for see-through stock.
fn paint_checkerboard(painter: &Painter, canvas_rect: Rect) {
    const TILE: f32 = 8.0;
    let clipped = painter.with_clip_rect(canvas_rect);
    let mut y = canvas_rect.top();
    let mut row = 0;
    while y < canvas_rect.bottom() {
        let mut col = row % 2;
        let mut x = canvas_rect.left();
        while x < canvas_rect.right() {
            if col % 2 == 0 {
                let tile = Rect::from_min_size(pos2(x, y), Vec2::splat(TILE));
                clipped.rect_filled(tile, 0.0, Color32::from_gray(220));
            }
            col += 1;
            x += TILE;
        }
        row += 1;
        y += TILE;
    }
}

/// Corner-tinted gradient approximating the foil sheen.
fn paint_holographic(painter: &Painter, canvas_rect: Rect) {
    let mut mesh = Mesh::default();
    let colors = [
        Color32::from_rgb(255, 205, 235),
        Color32::from_rgb(200, 235, 255),
        Color32::from_rgb(215, 255, 215),
        Color32::from_rgb(235, 215, 255),
    ];
    let corners = [
        canvas_rect.left_top(),
        canvas_rect.right_top(),
        canvas_rect.right_bottom(),
        canvas_rect.left_bottom(),
    ];
    for (pos, color) in corners.into_iter().zip(colors) {
        mesh.colored_vertex(pos, color);
    }
    mesh.add_triangle(0, 1, 2);
    mesh.add_triangle(0, 2, 3);
    painter.add(Shape::mesh(mesh));
}

fn paint_text(
    ctx: &Context,
    painter: &Painter,
    map: &ScreenMap,
    screen_box: &ElementBox,
    payload: &TextPayload,
) {
    let anchor = anchor_for(screen_box, payload);
    let angle = screen_box.rotation_rad;

    if let Some(shadow) = &payload.shadow {
        let offset = shadow.offset_mm * map.scale;
        let spread = shadow_spread(shadow.blur_mm * map.scale);
        let alpha = (shadow.color.a() as usize / spread.len()).max(1) as u8;
        let color = Color32::from_rgba_unmultiplied(
            shadow.color.r(),
            shadow.color.g(),
            shadow.color.b(),
            alpha,
        );
        let galley = layout_galley(ctx, payload, map.scale, color);
        for jitter in spread {
            let pos = rotate_around(anchor + offset + jitter, screen_box.center_px, angle);
            painter.add(TextShape::new(pos, galley.clone(), color).with_angle(angle));
        }
    }

    let galley = layout_galley(ctx, payload, map.scale, payload.color);
    let pos = rotate_around(anchor, screen_box.center_px, angle);
    painter.add(TextShape::new(pos, galley.clone(), payload.color).with_angle(angle));
    if payload.weight == FontWeight::Bold {
        // Second pass half a pixel over; the embedded faces have no
        // true bold variant.
        let pos = rotate_around(anchor + Vec2::new(0.5, 0.0), screen_box.center_px, angle);
        painter.add(TextShape::new(pos, galley, payload.color).with_angle(angle));
    }

    if payload.decoration == TextDecoration::Underline {
        let rect = screen_box.unrotated_rect();
        let y = rect.bottom() - map.scale * 0.2;
        let a = rotate_around(pos2(rect.left(), y), screen_box.center_px, angle);
        let b = rotate_around(pos2(rect.right(), y), screen_box.center_px, angle);
        let width = (payload.font_size_mm * map.scale / 16.0).max(1.0);
        painter.line_segment([a, b], Stroke::new(width, payload.color));
    }
}

/// Jitter offsets approximating the shadow blur radius; epaint has no
/// gaussian pass, so the shadow galley is stacked at reduced alpha.
pub(crate) fn shadow_spread(blur_px: f32) -> Vec<Vec2> {
    if blur_px < 0.5 {
        return vec![Vec2::ZERO];
    }
    let r = blur_px / 2.0;
    vec![
        Vec2::ZERO,
        Vec2::new(r, 0.0),
        Vec2::new(-r, 0.0),
        Vec2::new(0.0, r),
        Vec2::new(0.0, -r),
    ]
}

/// Galley anchor before rotation. The galley's horizontal alignment
/// moves the anchor between the box's left edge, center, and right
/// edge.
fn anchor_for(screen_box: &ElementBox, payload: &TextPayload) -> Pos2 {
    let rect = screen_box.unrotated_rect();
    let x = match payload.align {
        crate::element::TextAlign::Left => rect.left(),
        crate::element::TextAlign::Center => rect.center().x,
        crate::element::TextAlign::Right => rect.right(),
    };
    pos2(x, rect.top())
}

fn layout_galley(
    ctx: &Context,
    payload: &TextPayload,
    scale: f32,
    color: Color32,
) -> std::sync::Arc<egui::Galley> {
    let mut job = egui::text::LayoutJob::simple(
        payload.content.clone(),
        font_id(payload, scale),
        color,
        f32::INFINITY,
    );
    job.halign = match payload.align {
        crate::element::TextAlign::Left => Align::LEFT,
        crate::element::TextAlign::Center => Align::Center,
        crate::element::TextAlign::Right => Align::RIGHT,
    };
    ctx.fonts(|fonts| fonts.layout_job(job))
}

fn paint_table(painter: &Painter, map: &ScreenMap, screen_box: &ElementBox, payload: &TablePayload) {
    let rect = screen_box.unrotated_rect();
    let stroke = Stroke::new(map.len_px(payload.border_mm).max(0.5), Color32::BLACK);
    let angle = screen_box.rotation_rad;
    let center = screen_box.center_px;

    for col in 0..=payload.cols {
        let x = rect.left() + rect.width() * col as f32 / payload.cols.max(1) as f32;
        let a = rotate_around(pos2(x, rect.top()), center, angle);
        let b = rotate_around(pos2(x, rect.bottom()), center, angle);
        painter.line_segment([a, b], stroke);
    }
    for row in 0..=payload.rows {
        let y = rect.top() + rect.height() * row as f32 / payload.rows.max(1) as f32;
        let a = rotate_around(pos2(rect.left(), y), center, angle);
        let b = rotate_around(pos2(rect.right(), y), center, angle);
        painter.line_segment([a, b], stroke);
    }
}

fn paint_placeholder(painter: &Painter, screen_box: &ElementBox) {
    let corners = screen_box.corners();
    let stroke = Stroke::new(1.0, Color32::GRAY);
    for i in 0..4 {
        painter.line_segment([corners[i], corners[(i + 1) % 4]], stroke);
    }
    painter.line_segment([corners[0], corners[2]], stroke);
    painter.line_segment([corners[1], corners[3]], stroke);
}

fn paint_selection(painter: &Painter, screen_box: &ElementBox) {
    let corners = screen_box.corners();
    let stroke = Stroke::new(1.5, SELECTION_COLOR);
    for i in 0..4 {
        painter.line_segment([corners[i], corners[(i + 1) % 4]], stroke);
    }

    // Tether from the top edge to the rotation handle.
    let top_center = rotate_around(
        screen_box.unrotated_rect().center_top(),
        screen_box.center_px,
        screen_box.rotation_rad,
    );
    let rotate = screen_box.rotate_handle();
    painter.line_segment([top_center, rotate], Stroke::new(1.0, SELECTION_COLOR));

    for (pos, filled) in [(screen_box.resize_handle(), true), (rotate, false)] {
        if filled {
            painter.circle_filled(pos, HANDLE_RADIUS_PX, SELECTION_COLOR);
            painter.circle_stroke(pos, HANDLE_RADIUS_PX, Stroke::new(1.5, Color32::WHITE));
        } else {
            painter.circle_filled(pos, HANDLE_RADIUS_PX, Color32::WHITE);
            painter.circle_stroke(pos, HANDLE_RADIUS_PX, Stroke::new(1.5, SELECTION_COLOR));
        }
    }
}

fn paint_snap_guides(painter: &Painter, canvas_rect: Rect, guides: SnapGuides) {
    let stroke = Stroke::new(1.0, GUIDE_COLOR);
    if guides.vertical {
        let x = canvas_rect.center().x;
        painter.extend(Shape::dashed_line(
            &[pos2(x, canvas_rect.top()), pos2(x, canvas_rect.bottom())],
            stroke,
            6.0,
            4.0,
        ));
    }
    if guides.horizontal {
        let y = canvas_rect.center().y;
        painter.extend(Shape::dashed_line(
            &[pos2(canvas_rect.left(), y), pos2(canvas_rect.right(), y)],
            stroke,
            6.0,
            4.0,
        ));
    }
}

/// Dashed advisory inset, following the canvas outline. Shown only
/// while a text element is selected; never enforced.
fn paint_safe_margin(painter: &Painter, canvas_rect: Rect, map: &ScreenMap, config: &CanvasConfig) {
    let inset = map.len_px(SAFE_MARGIN_MM);
    let rect = canvas_rect.shrink(inset);
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return;
    }
    let stroke = Stroke::new(1.0, Color32::from_rgb(120, 190, 120));

    let points = match config.shape {
        LabelShape::Circle => circle_points(rect),
        _ => {
            let radius = (map.len_px(config.corner_radius_mm) * 0.8)
                .min(rect.size().min_elem() / 2.0);
            rounded_rect_points(rect, radius)
        }
    };
    painter.extend(Shape::dashed_line(&points, stroke, 5.0, 4.0));
}

fn circle_points(rect: Rect) -> Vec<Pos2> {
    let center = rect.center();
    let radius = rect.size().min_elem() / 2.0;
    let mut points: Vec<Pos2> = (0..=64)
        .map(|i| {
            let angle = std::f32::consts::TAU * i as f32 / 64.0;
            center + Vec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect();
    points.push(points[0]);
    points
}

fn rounded_rect_points(rect: Rect, radius: f32) -> Vec<Pos2> {
    if radius <= 0.5 {
        return vec![
            rect.left_top(),
            rect.right_top(),
            rect.right_bottom(),
            rect.left_bottom(),
            rect.left_top(),
        ];
    }

    // Arc centers, starting from the top-left corner, clockwise.
    let arcs = [
        (rect.left_top() + Vec2::splat(radius), 180.0),
        (pos2(rect.right() - radius, rect.top() + radius), 270.0),
        (rect.right_bottom() - Vec2::splat(radius), 0.0),
        (pos2(rect.left() + radius, rect.bottom() - radius), 90.0),
    ];
    let mut points = Vec::new();
    for (center, start_deg) in arcs {
        for i in 0..=8 {
            let angle = (start_deg + 90.0 * i as f32 / 8.0).to_radians();
            points.push(center + Vec2::new(angle.cos(), angle.sin()) * radius);
        }
    }
    points.push(points[0]);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ShapeKind;
    use crate::generator;
    use egui::{LayerId, RawInput};

    #[test]
    fn paints_every_material_with_rotated_elements() {
        let base = CanvasConfig::new(100.0, 50.0);
        let mut store = ElementStore::new();
        let qr = store.add(generator::new_qrcode("smoke", &base).unwrap());
        store.update(qr, |el| el.rotation_deg = 30.0).unwrap();
        store.add(generator::new_text(&base));
        store.add(generator::new_shape(ShapeKind::Star, &base).unwrap());

        let mut canvas = CanvasPainter::new();
        for material in Material::ALL {
            let mut config = CanvasConfig::new(100.0, 50.0);
            config.material = material;
            let ctx = Context::default();
            let _ = ctx.run(RawInput::default(), |ctx| {
                let clip = Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0));
                let painter = Painter::new(ctx.clone(), LayerId::background(), clip);
                let map = ScreenMap {
                    origin_px: pos2(40.0, 120.0),
                    scale: 7.2,
                };
                canvas.begin_frame();
                canvas.paint(
                    ctx,
                    &painter,
                    &map,
                    &config,
                    None,
                    &store,
                    SnapGuides {
                        vertical: true,
                        horizontal: true,
                    },
                );
            });
        }
    }

    #[test]
    fn rounded_outline_stays_inside_rect() {
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(100.0, 60.0));
        for p in rounded_rect_points(rect, 10.0) {
            assert!(rect.expand(0.01).contains(p), "{p:?} escapes the rect");
        }
    }

    #[test]
    fn zero_radius_outline_is_the_rect() {
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(10.0, 10.0));
        let points = rounded_rect_points(rect, 0.0);
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], points[4]);
    }

    #[test]
    fn circle_outline_is_closed_and_centered() {
        let rect = Rect::from_center_size(Pos2::new(50.0, 50.0), Vec2::splat(40.0));
        let points = circle_points(rect);
        assert_eq!(points.first(), points.last());
        for p in &points {
            assert!(((*p - Pos2::new(50.0, 50.0)).length() - 20.0).abs() < 1e-3);
        }
    }
}
