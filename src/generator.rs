//! Factories for every element kind, plus the derived-cache refresh
//! used when generating inputs change after creation.
//!
//! All generation is synchronous and fallible; a failed generation
//! returns an error and never yields a half-built element.

use barcoders::sym::code128::Code128;
use barcoders::sym::ean13::EAN13;
use egui::{Color32, Vec2};
use log::debug;
use qrcode::{EcLevel, QrCode};
use thiserror::Error;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::config::CanvasConfig;
use crate::element::{
    BARCODE_BOX_MM, BarcodePayload, Bitmap, DesignElement, ElementKind, FontChoice, FontStyle,
    FontWeight, ImagePayload, QR_BOX_MM, QrPayload, SHAPE_BOX_MM, ShapeKind, ShapePayload,
    Symbology, TABLE_BOX_MM, TablePayload, TextAlign, TextDecoration, TextPayload,
    clamp_font_size_mm,
};

/// Long-axis resolution for rasterized shape caches. The cache is
/// resolution-independent of the element box: the texture stretches to
/// whatever size the shape is resized to, so a resize never
/// re-rasterizes.
const SHAPE_RASTER_PX: u32 = 512;

/// Supersampling factor for vector document rasterization.
const SVG_SUPERSAMPLE: f32 = 3.0;

/// Quiet zone around the QR module matrix, in modules.
const QR_QUIET_MODULES: u32 = 2;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("failed to parse vector document: {0}")]
    SvgParse(#[from] usvg::Error),

    #[error("vector document has an empty page")]
    SvgEmpty,

    #[error("QR encoding failed: {0}")]
    Qr(String),

    #[error("barcode payload is not valid for {symbology}: {reason}")]
    Barcode {
        symbology: &'static str,
        reason: String,
    },

    #[error("raster buffer allocation failed ({width}x{height})")]
    RasterAlloc { width: u32, height: u32 },
}

/// New text element at the canvas center.
///
/// The default size tracks the canvas height (an eighth of it, at least
/// 5mm) so the starter text is legible on both business-card and poster
/// sized labels.
pub fn new_text(config: &CanvasConfig) -> DesignElement {
    let size = (config.height_mm / 8.0).round().max(5.0);
    DesignElement::new(
        config.center_mm().to_pos2(),
        ElementKind::Text(TextPayload {
            content: "Your text".to_owned(),
            font_size_mm: clamp_font_size_mm(size, config.max_font_size_mm()),
            font: FontChoice::Sans,
            color: Color32::BLACK,
            weight: FontWeight::Bold,
            style: FontStyle::Normal,
            decoration: TextDecoration::None,
            align: TextAlign::Center,
            shadow: None,
        }),
    )
}

/// Decode raster image bytes and place the result centered, scaled to
/// fit within 60% of the canvas while preserving the source aspect.
pub fn new_image(
    source_name: &str,
    bytes: &[u8],
    config: &CanvasConfig,
) -> Result<DesignElement, GeneratorError> {
    let decoded = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = decoded.dimensions();
    let bitmap = Bitmap::new(width, height, decoded.into_raw());
    debug!("decoded image {source_name}: {width}x{height}");

    let size_mm = fit_into(bitmap.aspect(), config);
    Ok(DesignElement::new(
        config.center_mm().to_pos2(),
        ElementKind::Image(ImagePayload {
            source_name: source_name.to_owned(),
            bitmap,
            size_mm,
        }),
    ))
}

/// Rasterize the first (only) page of an SVG document and place it like
/// an image. Rendering happens once, supersampled; afterwards the
/// element scales like any raster.
pub fn new_document(
    source_name: &str,
    bytes: &[u8],
    config: &CanvasConfig,
) -> Result<DesignElement, GeneratorError> {
    let bitmap = rasterize_svg(bytes)?;
    debug!(
        "rasterized document {source_name}: {}x{}",
        bitmap.width, bitmap.height
    );
    Ok(document_from_bitmap(source_name, bitmap, config))
}

/// Wrap an already-rasterized document page as an element. Used when
/// rasterization happened on a worker thread.
pub fn document_from_bitmap(
    source_name: &str,
    bitmap: Bitmap,
    config: &CanvasConfig,
) -> DesignElement {
    let size_mm = fit_into(bitmap.aspect(), config);
    DesignElement::new(
        config.center_mm().to_pos2(),
        ElementKind::Document(ImagePayload {
            source_name: source_name.to_owned(),
            bitmap,
            size_mm,
        }),
    )
}

/// New QR element with the fixed 25x25mm box, encoded immediately.
pub fn new_qrcode(content: &str, config: &CanvasConfig) -> Result<DesignElement, GeneratorError> {
    let cache = encode_qr(content)?;
    Ok(DesignElement::new(
        config.center_mm().to_pos2(),
        ElementKind::QrCode(QrPayload {
            content: content.to_owned(),
            size_mm: QR_BOX_MM,
            cache: Some(cache),
        }),
    ))
}

/// New barcode element. Encoding is validated up front: an invalid
/// payload for the chosen symbology returns the error and no element.
pub fn new_barcode(
    content: &str,
    symbology: Symbology,
    config: &CanvasConfig,
) -> Result<DesignElement, GeneratorError> {
    let cache = encode_barcode(content, symbology)?;
    Ok(DesignElement::new(
        config.center_mm().to_pos2(),
        ElementKind::Barcode(BarcodePayload {
            content: content.to_owned(),
            symbology,
            size_mm: BARCODE_BOX_MM,
            cache: Some(cache),
        }),
    ))
}

/// New 3x3 table with hairline borders.
pub fn new_table(config: &CanvasConfig) -> DesignElement {
    DesignElement::new(
        config.center_mm().to_pos2(),
        ElementKind::Table(TablePayload {
            rows: 3,
            cols: 3,
            border_mm: 0.5,
            size_mm: TABLE_BOX_MM,
        }),
    )
}

/// New filled shape with the fixed 40x40mm box.
pub fn new_shape(kind: ShapeKind, config: &CanvasConfig) -> Result<DesignElement, GeneratorError> {
    let payload = ShapePayload {
        kind,
        fill: Some(Color32::BLACK),
        stroke: None,
        stroke_width_mm: 1.0,
        size_mm: SHAPE_BOX_MM,
        cache: None,
    };
    let cache = rasterize_shape(&payload)?;
    Ok(DesignElement::new(
        config.center_mm().to_pos2(),
        ElementKind::Shape(ShapePayload {
            cache: Some(cache),
            ..payload
        }),
    ))
}

/// Inputs that feed a derived cache, compared before and after a store
/// update to decide whether regeneration is due. Kinds without derived
/// caches return `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheInputs {
    Qr(String),
    Barcode(String, Symbology),
    Shape {
        kind: ShapeKind,
        fill: Option<Color32>,
        stroke: Option<Color32>,
        stroke_width_mm: f32,
        // Aspect in thousandths. The raster only depends on the box's
        // proportions, so a resize that keeps them (quantized against
        // float wobble) must not regenerate.
        aspect_milli: i32,
    },
}

pub fn cache_inputs(element: &DesignElement) -> Option<CacheInputs> {
    match &element.kind {
        ElementKind::QrCode(p) => Some(CacheInputs::Qr(p.content.clone())),
        ElementKind::Barcode(p) => Some(CacheInputs::Barcode(p.content.clone(), p.symbology)),
        ElementKind::Shape(p) => Some(CacheInputs::Shape {
            kind: p.kind,
            fill: p.fill,
            stroke: p.stroke,
            stroke_width_mm: p.stroke_width_mm,
            aspect_milli: shape_aspect_milli(p),
        }),
        _ => None,
    }
}

/// True when a kind that should carry a derived cache is missing one
/// (fresh deserialization, or a previous failed refresh).
pub fn cache_missing(element: &DesignElement) -> bool {
    match &element.kind {
        ElementKind::QrCode(p) => p.cache.is_none(),
        ElementKind::Barcode(p) => p.cache.is_none(),
        ElementKind::Shape(p) => p.cache.is_none(),
        _ => false,
    }
}

/// Regenerate the derived cache in place and bump the cache version.
///
/// On failure the stale cache is cleared rather than left showing
/// content that no longer matches the payload.
pub fn refresh_cache(element: &mut DesignElement) -> Result<(), GeneratorError> {
    let result = match &mut element.kind {
        ElementKind::QrCode(p) => match encode_qr(&p.content) {
            Ok(cache) => {
                p.cache = Some(cache);
                Ok(())
            }
            Err(err) => {
                p.cache = None;
                Err(err)
            }
        },
        ElementKind::Barcode(p) => match encode_barcode(&p.content, p.symbology) {
            Ok(cache) => {
                p.cache = Some(cache);
                Ok(())
            }
            Err(err) => {
                p.cache = None;
                Err(err)
            }
        },
        ElementKind::Shape(p) => {
            let cache = rasterize_shape(p)?;
            p.cache = Some(cache);
            Ok(())
        }
        _ => Ok(()),
    };
    element.cache_version = element.cache_version.wrapping_add(1);
    result
}

/// Fit an aspect ratio into 60% of the canvas box, preserving aspect.
fn fit_into(aspect: f32, config: &CanvasConfig) -> Vec2 {
    let max = Vec2::new(config.width_mm, config.height_mm) * 0.6;
    let mut size = Vec2::new(max.x, max.x / aspect.max(0.01));
    if size.y > max.y {
        size = Vec2::new(max.y * aspect, max.y);
    }
    size
}

fn encode_qr(content: &str) -> Result<Bitmap, GeneratorError> {
    let code = QrCode::with_error_correction_level(content, EcLevel::M)
        .map_err(|e| GeneratorError::Qr(e.to_string()))?;
    let modules = code.width() as u32;
    let total = modules + 2 * QR_QUIET_MODULES;
    const SCALE: u32 = 8;
    let side = total * SCALE;

    // White background including the quiet zone, opaque so the code
    // scans on any label material.
    let mut pixels = vec![255u8; (side * side * 4) as usize];
    for my in 0..modules {
        for mx in 0..modules {
            if code[(mx as usize, my as usize)] != qrcode::Color::Dark {
                continue;
            }
            let x0 = (QR_QUIET_MODULES + mx) * SCALE;
            let y0 = (QR_QUIET_MODULES + my) * SCALE;
            for py in y0..y0 + SCALE {
                for px in x0..x0 + SCALE {
                    let i = ((py * side + px) * 4) as usize;
                    pixels[i..i + 3].fill(0);
                }
            }
        }
    }
    Ok(Bitmap::new(side, side, pixels))
}

fn encode_barcode(content: &str, symbology: Symbology) -> Result<Bitmap, GeneratorError> {
    let bars: Vec<u8> = match symbology {
        // Charset B prefix covers the full printable ASCII range.
        Symbology::Code128 => Code128::new(format!("\u{0181}{content}"))
            .map_err(|e| GeneratorError::Barcode {
                symbology: symbology.as_str(),
                reason: e.to_string(),
            })?
            .encode(),
        Symbology::Ean13 => EAN13::new(content)
            .map_err(|e| GeneratorError::Barcode {
                symbology: symbology.as_str(),
                reason: e.to_string(),
            })?
            .encode(),
    };

    // One module column per encoded unit; the draw path stretches this
    // strip to the element box, so height stays minimal.
    const UNIT_PX: u32 = 2;
    const HEIGHT_PX: u32 = 48;
    let width = bars.len() as u32 * UNIT_PX;
    let mut pixels = vec![255u8; (width * HEIGHT_PX * 4) as usize];
    for (i, bar) in bars.iter().enumerate() {
        if *bar == 0 {
            continue;
        }
        for py in 0..HEIGHT_PX {
            for dx in 0..UNIT_PX {
                let px = i as u32 * UNIT_PX + dx;
                let at = ((py * width + px) * 4) as usize;
                pixels[at..at + 3].fill(0);
            }
        }
    }
    Ok(Bitmap::new(width, HEIGHT_PX, pixels))
}

fn shape_aspect_milli(payload: &ShapePayload) -> i32 {
    let aspect = payload.size_mm.x / payload.size_mm.y.max(0.01);
    (aspect * 1000.0).round() as i32
}

/// Rasterize a shape outline into an RGBA cache at a fixed long-axis
/// resolution; only the box's proportions matter, so resizing stretches
/// the existing texture instead of regenerating. Concave outlines
/// (star, heart) fill correctly here where a convex mesh tessellation
/// would not.
pub fn rasterize_shape(payload: &ShapePayload) -> Result<Bitmap, GeneratorError> {
    let aspect = (payload.size_mm.x / payload.size_mm.y.max(0.01)).max(0.01);
    let (width, height) = if aspect >= 1.0 {
        (
            SHAPE_RASTER_PX,
            ((SHAPE_RASTER_PX as f32 / aspect).round() as u32).max(2),
        )
    } else {
        (
            ((SHAPE_RASTER_PX as f32 * aspect).round() as u32).max(2),
            SHAPE_RASTER_PX,
        )
    };
    let mut pixmap =
        Pixmap::new(width, height).ok_or(GeneratorError::RasterAlloc { width, height })?;

    let outline = payload.kind.unit_outline();
    let mut builder = PathBuilder::new();
    for (i, point) in outline.iter().enumerate() {
        let x = point.x * width as f32;
        let y = point.y * height as f32;
        if i == 0 {
            builder.move_to(x, y);
        } else {
            builder.line_to(x, y);
        }
    }
    builder.close();
    let Some(path) = builder.finish() else {
        return Ok(Bitmap::new(0, 0, Vec::new()));
    };

    let mut paint = Paint::default();
    paint.anti_alias = true;

    if let Some(fill) = payload.fill {
        paint.set_color_rgba8(fill.r(), fill.g(), fill.b(), fill.a());
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
    if let Some(stroke_color) = payload.stroke {
        paint.set_color_rgba8(
            stroke_color.r(),
            stroke_color.g(),
            stroke_color.b(),
            stroke_color.a(),
        );
        // Stroke width in raster pixels tracks its share of the box
        // width so the stroke scales with the element on screen.
        let stroke = Stroke {
            width: (payload.stroke_width_mm / payload.size_mm.x.max(0.01)) * width as f32,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    Ok(pixmap_to_bitmap(&pixmap))
}

/// Rasterize SVG bytes at their intrinsic size, supersampled.
pub fn rasterize_svg(bytes: &[u8]) -> Result<Bitmap, GeneratorError> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &options)?;
    let size = tree.size();
    let width = ((size.width() * SVG_SUPERSAMPLE).round() as u32).clamp(1, 4096);
    let height = ((size.height() * SVG_SUPERSAMPLE).round() as u32).clamp(1, 4096);
    if size.width() <= 0.0 || size.height() <= 0.0 {
        return Err(GeneratorError::SvgEmpty);
    }

    let mut pixmap =
        Pixmap::new(width, height).ok_or(GeneratorError::RasterAlloc { width, height })?;
    let scale = width as f32 / size.width();
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
    Ok(pixmap_to_bitmap(&pixmap))
}

/// Convert a premultiplied tiny-skia pixmap to straight RGBA.
pub fn pixmap_to_bitmap(pixmap: &Pixmap) -> Bitmap {
    let mut pixels = Vec::with_capacity(pixmap.pixels().len() * 4);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        pixels.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Bitmap::new(pixmap.width(), pixmap.height(), pixels)
}
