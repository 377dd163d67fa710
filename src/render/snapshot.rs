//! CPU flattening of the finished design into a PNG data URI.
//!
//! The capture runs off the UI thread and must not touch the GPU, so
//! everything is composited with tiny-skia and text is rasterized with
//! ab_glyph from the same embedded faces the on-screen fonts use.

use std::sync::OnceLock;

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use base64::Engine as _;
use log::warn;
use thiserror::Error;
use tiny_skia::{
    FillRule, IntSize, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, Rect as SkRect, Transform,
};

use crate::config::{CanvasConfig, LabelShape, Material};
use crate::element::{
    Bitmap, DesignElement, ElementKind, FontChoice, FontStyle, FontWeight, TablePayload,
    TextAlign, TextDecoration, TextPayload,
};

/// Export density. 8 px/mm is just above 200 DPI, enough for an order
/// preview without inflating the payload.
const EXPORT_PX_PER_MM: f32 = 8.0;

/// Synthetic italic slant applied in the export only.
const ITALIC_SKEW: f32 = -0.2;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot buffer allocation failed ({width}x{height})")]
    PixmapAlloc { width: u32, height: u32 },

    #[error("embedded font unavailable")]
    FontLoad,

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// Flatten the whole design into `data:image/png;base64,...`.
///
/// Elements render in store order; the canvas outline (rounded rect or
/// circle) clips everything, matching what the cutter will keep.
pub fn capture(
    config: &CanvasConfig,
    background_override: Option<egui::Color32>,
    elements: &[DesignElement],
) -> Result<String, SnapshotError> {
    let width = (config.width_mm * EXPORT_PX_PER_MM).round().max(1.0) as u32;
    let height = (config.height_mm * EXPORT_PX_PER_MM).round().max(1.0) as u32;
    let mut pixmap =
        Pixmap::new(width, height).ok_or(SnapshotError::PixmapAlloc { width, height })?;

    let mask = outline_mask(config, width, height)?;
    paint_background(&mut pixmap, config, background_override, &mask);

    for element in elements {
        if let Err(err) = composite_element(&mut pixmap, element, &mask) {
            warn!("snapshot skipped element {}: {}", element.id, err);
        }
    }

    let png = pixmap
        .encode_png()
        .map_err(|e| SnapshotError::Encode(e.to_string()))?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(png);
    Ok(format!("data:image/png;base64,{encoded}"))
}

fn outline_mask(config: &CanvasConfig, width: u32, height: u32) -> Result<Mask, SnapshotError> {
    let mut mask =
        Mask::new(width, height).ok_or(SnapshotError::PixmapAlloc { width, height })?;
    let mut builder = PathBuilder::new();
    let w = width as f32;
    let h = height as f32;
    match config.shape {
        LabelShape::Circle => {
            builder.push_circle(w / 2.0, h / 2.0, w.min(h) / 2.0);
        }
        _ => {
            let radius = (config.corner_radius_mm * EXPORT_PX_PER_MM)
                .clamp(0.0, w.min(h) / 2.0);
            push_rounded_rect(&mut builder, w, h, radius);
        }
    }
    let path = builder.finish().ok_or(SnapshotError::PixmapAlloc { width, height })?;
    mask.fill_path(&path, FillRule::Winding, true, Transform::identity());
    Ok(mask)
}

fn push_rounded_rect(builder: &mut PathBuilder, w: f32, h: f32, radius: f32) {
    if radius <= 0.5 {
        builder.push_rect(SkRect::from_xywh(0.0, 0.0, w, h).expect("positive extent"));
        return;
    }
    // Flattened corner arcs; 16 segments per corner is invisible at
    // export density.
    let arcs = [
        (radius, radius, 180.0),
        (w - radius, radius, 270.0),
        (w - radius, h - radius, 0.0),
        (radius, h - radius, 90.0),
    ];
    for (i, (cx, cy, start_deg)) in arcs.into_iter().enumerate() {
        for step in 0..=16 {
            let angle = (start_deg + 90.0 * step as f32 / 16.0).to_radians();
            let x = cx + radius * angle.cos();
            let y = cy + radius * angle.sin();
            if i == 0 && step == 0 {
                builder.move_to(x, y);
            } else {
                builder.line_to(x, y);
            }
        }
    }
    builder.close();
}

fn paint_background(
    pixmap: &mut Pixmap,
    config: &CanvasConfig,
    background_override: Option<egui::Color32>,
    mask: &Mask,
) {
    let color = background_override.unwrap_or(match config.material {
        Material::White => egui::Color32::WHITE,
        Material::Gold => egui::Color32::from_rgb(212, 175, 55),
        Material::Silver => egui::Color32::from_rgb(196, 199, 206),
        Material::Eco => egui::Color32::from_rgb(193, 154, 107),
        // See-through stock exports with a transparent background.
        Material::Transparent => egui::Color32::TRANSPARENT,
        Material::Holographic => egui::Color32::from_rgb(225, 220, 250),
    });
    if color.a() == 0 {
        return;
    }
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r(), color.g(), color.b(), color.a());
    let full = SkRect::from_xywh(0.0, 0.0, pixmap.width() as f32, pixmap.height() as f32)
        .expect("positive extent");
    pixmap.fill_rect(full, &paint, Transform::identity(), Some(mask));
}

fn composite_element(
    pixmap: &mut Pixmap,
    element: &DesignElement,
    mask: &Mask,
) -> Result<(), SnapshotError> {
    let (layer, size_px) = match &element.kind {
        ElementKind::Text(payload) => {
            let Some(layer) = rasterize_text(payload)? else {
                return Ok(());
            };
            let size = egui::Vec2::new(layer.width() as f32, layer.height() as f32);
            (layer, size)
        }
        ElementKind::Image(payload) | ElementKind::Document(payload) => (
            bitmap_to_pixmap(&payload.bitmap)?,
            payload.size_mm * EXPORT_PX_PER_MM,
        ),
        ElementKind::QrCode(payload) => {
            let Some(bitmap) = &payload.cache else {
                return Ok(());
            };
            (bitmap_to_pixmap(bitmap)?, payload.size_mm * EXPORT_PX_PER_MM)
        }
        ElementKind::Barcode(payload) => {
            let Some(bitmap) = &payload.cache else {
                return Ok(());
            };
            (bitmap_to_pixmap(bitmap)?, payload.size_mm * EXPORT_PX_PER_MM)
        }
        ElementKind::Table(payload) => (
            rasterize_table(payload)?,
            payload.size_mm * EXPORT_PX_PER_MM,
        ),
        ElementKind::Shape(payload) => {
            let Some(bitmap) = &payload.cache else {
                return Ok(());
            };
            (bitmap_to_pixmap(bitmap)?, payload.size_mm * EXPORT_PX_PER_MM)
        }
    };

    let center = element.position_mm.to_vec2() * EXPORT_PX_PER_MM;
    let sx = size_px.x / layer.width() as f32;
    let sy = size_px.y / layer.height() as f32;
    let place = Transform::from_scale(sx, sy)
        .post_translate(center.x - size_px.x / 2.0, center.y - size_px.y / 2.0)
        .post_concat(Transform::from_rotate_at(
            element.rotation_deg,
            center.x,
            center.y,
        ));
    pixmap.draw_pixmap(
        0,
        0,
        layer.as_ref(),
        &PixmapPaint::default(),
        place,
        Some(mask),
    );
    Ok(())
}

fn bitmap_to_pixmap(bitmap: &Bitmap) -> Result<Pixmap, SnapshotError> {
    let size = IntSize::from_wh(bitmap.width, bitmap.height).ok_or(
        SnapshotError::PixmapAlloc {
            width: bitmap.width,
            height: bitmap.height,
        },
    )?;
    let mut data = Vec::with_capacity(bitmap.pixels.len());
    for chunk in bitmap.pixels.chunks_exact(4) {
        let a = chunk[3] as u16;
        data.push((chunk[0] as u16 * a / 255) as u8);
        data.push((chunk[1] as u16 * a / 255) as u8);
        data.push((chunk[2] as u16 * a / 255) as u8);
        data.push(chunk[3]);
    }
    Pixmap::from_vec(data, size).ok_or(SnapshotError::PixmapAlloc {
        width: bitmap.width,
        height: bitmap.height,
    })
}

fn rasterize_table(payload: &TablePayload) -> Result<Pixmap, SnapshotError> {
    let width = (payload.size_mm.x * EXPORT_PX_PER_MM).round().max(2.0) as u32;
    let height = (payload.size_mm.y * EXPORT_PX_PER_MM).round().max(2.0) as u32;
    let mut pixmap =
        Pixmap::new(width, height).ok_or(SnapshotError::PixmapAlloc { width, height })?;
    let line = (payload.border_mm * EXPORT_PX_PER_MM).max(1.0);
    let mut paint = Paint::default();
    paint.set_color_rgba8(0, 0, 0, 255);

    let w = width as f32;
    let h = height as f32;
    for col in 0..=payload.cols {
        let x = (w - line) * col as f32 / payload.cols.max(1) as f32;
        if let Some(rect) = SkRect::from_xywh(x, 0.0, line, h) {
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }
    for row in 0..=payload.rows {
        let y = (h - line) * row as f32 / payload.rows.max(1) as f32;
        if let Some(rect) = SkRect::from_xywh(0.0, y, w, line) {
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }
    Ok(pixmap)
}

/// Rasterize a text payload into a tight pixmap. Returns `None` for
/// whitespace-only content.
///
/// A shadow widens the pixmap symmetrically so the glyph block stays
/// centered; the shadow passes land first, the ink on top.
fn rasterize_text(payload: &TextPayload) -> Result<Option<Pixmap>, SnapshotError> {
    let font = export_font(payload.font)?;
    let scale = PxScale::from(payload.font_size_mm * EXPORT_PX_PER_MM);
    let scaled = font.as_scaled(scale);
    let line_height = scaled.ascent() - scaled.descent() + scaled.line_gap();

    let lines: Vec<&str> = payload.content.lines().collect();
    if lines.iter().all(|l| l.trim().is_empty()) {
        return Ok(None);
    }
    let line_widths: Vec<f32> = lines.iter().map(|l| line_width(&scaled, l)).collect();
    let block_width = line_widths.iter().fold(1.0f32, |a, w| a.max(*w));
    let block_height = line_height * lines.len() as f32;

    let margin = payload
        .shadow
        .map(|s| {
            ((s.offset_mm.x.abs().max(s.offset_mm.y.abs()) + s.blur_mm) * EXPORT_PX_PER_MM).ceil()
        })
        .unwrap_or(0.0);

    let width = (block_width + 2.0 * margin).ceil().max(2.0) as u32;
    let height = (block_height + 2.0 * margin).ceil().max(2.0) as u32;
    let mut pixmap =
        Pixmap::new(width, height).ok_or(SnapshotError::PixmapAlloc { width, height })?;

    if let Some(shadow) = &payload.shadow {
        let offset =
            egui::Vec2::splat(margin) + shadow.offset_mm * EXPORT_PX_PER_MM;
        let spread = super::shadow_spread(shadow.blur_mm * EXPORT_PX_PER_MM);
        let alpha = (shadow.color.a() as usize / spread.len()).max(1) as u8;
        let color = egui::Color32::from_rgba_unmultiplied(
            shadow.color.r(),
            shadow.color.g(),
            shadow.color.b(),
            alpha,
        );
        for jitter in spread {
            draw_block(
                &mut pixmap,
                &scaled,
                payload,
                &lines,
                &line_widths,
                block_width,
                offset + jitter,
                color,
                false,
            );
        }
    }
    draw_block(
        &mut pixmap,
        &scaled,
        payload,
        &lines,
        &line_widths,
        block_width,
        egui::Vec2::splat(margin),
        payload.color,
        true,
    );

    if payload.style == FontStyle::Italic {
        let sheared = shear_pixmap(&pixmap)?;
        return Ok(Some(sheared));
    }
    Ok(Some(pixmap))
}

/// One full pass over the line block at the given origin offset. The
/// underline and the bold double-draw only apply to the ink pass, not
/// the shadow ones.
#[allow(clippy::too_many_arguments)]
fn draw_block<F, SF>(
    pixmap: &mut Pixmap,
    scaled: &SF,
    payload: &TextPayload,
    lines: &[&str],
    line_widths: &[f32],
    block_width: f32,
    origin: egui::Vec2,
    color: egui::Color32,
    decorate: bool,
) where
    F: Font,
    SF: ScaleFont<F>,
{
    let passes: &[f32] = if payload.weight == FontWeight::Bold {
        &[0.0, 0.7]
    } else {
        &[0.0]
    };

    for (index, line) in lines.iter().enumerate() {
        let line_w = line_widths[index];
        let x0 = origin.x
            + match payload.align {
                TextAlign::Left => 0.0,
                TextAlign::Center => (block_width - line_w) / 2.0,
                TextAlign::Right => block_width - line_w,
            };
        let baseline =
            origin.y + scaled.ascent() + (scaled.height() + scaled.line_gap()) * index as f32;
        for pass in passes {
            draw_line(pixmap, scaled, line, x0 + pass, baseline, color);
        }
        if decorate && payload.decoration == TextDecoration::Underline {
            let y = baseline - scaled.descent() * 0.5;
            let thickness = (scaled.scale().y / 16.0).max(1.0);
            let mut paint = Paint::default();
            paint.set_color_rgba8(color.r(), color.g(), color.b(), color.a());
            if let Some(rect) = SkRect::from_xywh(x0, y, line_w, thickness) {
                pixmap.fill_rect(rect, &paint, Transform::identity(), None);
            }
        }
    }
}

fn line_width<F, SF>(scaled: &SF, line: &str) -> f32
where
    F: Font,
    SF: ScaleFont<F>,
{
    let mut width = 0.0;
    let mut prev = None;
    for ch in line.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width
}

fn draw_line<F, SF>(
    pixmap: &mut Pixmap,
    scaled: &SF,
    line: &str,
    x0: f32,
    baseline: f32,
    color: egui::Color32,
) where
    F: Font,
    SF: ScaleFont<F>,
{
    let width = pixmap.width();
    let height = pixmap.height();
    let mut caret = x0;
    let mut prev = None;
    for ch in line.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = prev {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scaled.scale(), ab_glyph::point(caret, baseline));
        caret += scaled.h_advance(id);
        prev = Some(id);

        let Some(outlined) = scaled.font().outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        let data = pixmap.data_mut();
        outlined.draw(|gx, gy, coverage| {
            let px = bounds.min.x as i32 + gx as i32;
            let py = bounds.min.y as i32 + gy as i32;
            if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                return;
            }
            let alpha = (coverage * color.a() as f32) as u16;
            if alpha == 0 {
                return;
            }
            let i = ((py as u32 * width + px as u32) * 4) as usize;
            // Premultiplied source-over onto the existing pixel.
            let src = [
                (color.r() as u16 * alpha / 255) as u8,
                (color.g() as u16 * alpha / 255) as u8,
                (color.b() as u16 * alpha / 255) as u8,
                alpha as u8,
            ];
            let inv = 255 - src[3] as u16;
            for c in 0..4 {
                data[i + c] = (src[c] as u16 + data[i + c] as u16 * inv / 255) as u8;
            }
        });
    }
}

/// Apply the synthetic italic slant by redrawing into a slightly wider
/// pixmap with a skew transform.
fn shear_pixmap(source: &Pixmap) -> Result<Pixmap, SnapshotError> {
    let extra = (source.height() as f32 * ITALIC_SKEW.abs()).ceil() as u32;
    let width = source.width() + extra;
    let height = source.height();
    let mut out =
        Pixmap::new(width, height).ok_or(SnapshotError::PixmapAlloc { width, height })?;
    let skew = Transform::from_row(1.0, 0.0, ITALIC_SKEW, 1.0, ITALIC_SKEW.abs() * height as f32, 0.0);
    out.draw_pixmap(0, 0, source.as_ref(), &PixmapPaint::default(), skew, None);
    Ok(out)
}

/// Embedded faces matching the on-screen fonts, parsed once.
fn export_font(choice: FontChoice) -> Result<&'static FontVec, SnapshotError> {
    static SANS: OnceLock<Option<FontVec>> = OnceLock::new();
    static SERIF: OnceLock<Option<FontVec>> = OnceLock::new();
    static MONO: OnceLock<Option<FontVec>> = OnceLock::new();

    if choice == FontChoice::Serif {
        return SERIF
            .get_or_init(|| FontVec::try_from_vec(crate::fonts::SERIF_BYTES.to_vec()).ok())
            .as_ref()
            .ok_or(SnapshotError::FontLoad);
    }

    let (cell, name) = match choice {
        FontChoice::Mono => (&MONO, "Hack"),
        _ => (&SANS, "Ubuntu-Light"),
    };
    cell.get_or_init(|| {
        let definitions = egui::FontDefinitions::default();
        let data = definitions.font_data.get(name)?;
        FontVec::try_from_vec(data.font.to_vec()).ok()
    })
    .as_ref()
    .ok_or(SnapshotError::FontLoad)
}
