use std::sync::Arc;

use egui::{Color32, Pos2, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod shape;

pub use shape::ShapeKind;

/// Smallest legal font size in millimeters.
pub const MIN_FONT_SIZE_MM: f32 = 2.0;
/// Smallest legal box height for resizable elements, in millimeters.
pub const MIN_BOX_SIZE_MM: f32 = 5.0;

/// Fixed default boxes for generated content, in millimeters.
pub const QR_BOX_MM: Vec2 = Vec2::new(25.0, 25.0);
pub const BARCODE_BOX_MM: Vec2 = Vec2::new(40.0, 15.0);
pub const TABLE_BOX_MM: Vec2 = Vec2::new(40.0, 30.0);
pub const SHAPE_BOX_MM: Vec2 = Vec2::new(40.0, 40.0);

pub type ElementId = Uuid;

/// Decoded RGBA8 bitmap, row-major, shared between the element, the
/// texture cache, and the snapshot compositor. Dropped together with
/// the last element that references it.
#[derive(Clone, Default)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<Vec<u8>>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height * 4) as usize);
        Self {
            width,
            height,
            pixels: Arc::new(pixels),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Natural aspect ratio (width / height).
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontChoice {
    /// Default proportional UI face.
    Sans,
    /// Bundled serif face.
    Serif,
    /// Monospace face.
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDecoration {
    None,
    Underline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Structured drop shadow, stored in millimeters and scaled only at
/// draw time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextShadow {
    pub offset_mm: Vec2,
    pub blur_mm: f32,
    pub color: Color32,
}

impl Default for TextShadow {
    fn default() -> Self {
        Self {
            offset_mm: Vec2::new(0.7, 0.7),
            blur_mm: 1.4,
            color: Color32::from_black_alpha(128),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPayload {
    pub content: String,
    /// Font size in millimeters; the box width is intrinsic to the
    /// content at this size.
    pub font_size_mm: f32,
    pub font: FontChoice,
    pub color: Color32,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub decoration: TextDecoration,
    pub align: TextAlign,
    pub shadow: Option<TextShadow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePayload {
    /// Original file name, shown in the layers panel and serialized in
    /// place of the pixel data.
    pub source_name: String,
    #[serde(skip)]
    pub bitmap: Bitmap,
    pub size_mm: Vec2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrPayload {
    pub content: String,
    pub size_mm: Vec2,
    /// Encoded module bitmap; regenerated whenever `content` changes.
    #[serde(skip)]
    pub cache: Option<Bitmap>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Symbology {
    #[serde(rename = "CODE128")]
    Code128,
    #[serde(rename = "EAN13")]
    Ean13,
}

impl Symbology {
    pub fn as_str(&self) -> &'static str {
        match self {
            Symbology::Code128 => "CODE128",
            Symbology::Ean13 => "EAN13",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarcodePayload {
    pub content: String,
    pub symbology: Symbology,
    pub size_mm: Vec2,
    /// Encoded bar bitmap; regenerated whenever `content` or
    /// `symbology` changes.
    #[serde(skip)]
    pub cache: Option<Bitmap>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TablePayload {
    pub rows: u32,
    pub cols: u32,
    /// Uniform border width for all cells, in millimeters.
    pub border_mm: f32,
    pub size_mm: Vec2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapePayload {
    pub kind: ShapeKind,
    /// None renders as transparent fill.
    pub fill: Option<Color32>,
    pub stroke: Option<Color32>,
    /// Stroke width in millimeters, kept proportional to the element
    /// width so outlines stay dimensionally correct at any size.
    pub stroke_width_mm: f32,
    pub size_mm: Vec2,
    #[serde(skip)]
    pub cache: Option<Bitmap>,
}

/// Closed set of element kinds. Rendering, resize semantics, and the
/// property panels all dispatch on this tag exhaustively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Text(TextPayload),
    Image(ImagePayload),
    /// A rasterized vector document; behaves like `Image` after
    /// generation but keeps its own tag for the panels.
    Document(ImagePayload),
    QrCode(QrPayload),
    Barcode(BarcodePayload),
    Table(TablePayload),
    Shape(ShapePayload),
}

impl ElementKind {
    pub fn kind_str(&self) -> &'static str {
        match self {
            ElementKind::Text(_) => "text",
            ElementKind::Image(_) => "image",
            ElementKind::Document(_) => "document",
            ElementKind::QrCode(_) => "qrcode",
            ElementKind::Barcode(_) => "barcode",
            ElementKind::Table(_) => "table",
            ElementKind::Shape(_) => "shape",
        }
    }
}

/// One placed design object on the canvas.
///
/// Geometry lives in millimeters; `position_mm` is always the element's
/// center. Rotation is clockwise degrees and intentionally unbounded;
/// it is normalized for display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignElement {
    pub id: ElementId,
    pub position_mm: Pos2,
    pub rotation_deg: f32,
    #[serde(flatten)]
    pub kind: ElementKind,
    /// Bumped whenever cached pixel content changes, so the texture
    /// cache can tell stale uploads apart.
    #[serde(skip)]
    pub cache_version: u64,
}

impl DesignElement {
    pub fn new(position_mm: Pos2, kind: ElementKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            position_mm,
            rotation_deg: 0.0,
            kind,
            cache_version: 0,
        }
    }

    /// Explicit box size in millimeters. Text elements have no stored
    /// box; their extent is intrinsic to content and font size, so this
    /// returns `None` for them.
    pub fn box_size_mm(&self) -> Option<Vec2> {
        match &self.kind {
            ElementKind::Text(_) => None,
            ElementKind::Image(p) | ElementKind::Document(p) => Some(p.size_mm),
            ElementKind::QrCode(p) => Some(p.size_mm),
            ElementKind::Barcode(p) => Some(p.size_mm),
            ElementKind::Table(p) => Some(p.size_mm),
            ElementKind::Shape(p) => Some(p.size_mm),
        }
    }

    /// Mutable access to the stored box, `None` for text.
    pub fn box_size_mm_mut(&mut self) -> Option<&mut Vec2> {
        match &mut self.kind {
            ElementKind::Text(_) => None,
            ElementKind::Image(p) | ElementKind::Document(p) => Some(&mut p.size_mm),
            ElementKind::QrCode(p) => Some(&mut p.size_mm),
            ElementKind::Barcode(p) => Some(&mut p.size_mm),
            ElementKind::Table(p) => Some(&mut p.size_mm),
            ElementKind::Shape(p) => Some(&mut p.size_mm),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, ElementKind::Text(_))
    }

    /// Rotation folded into [0, 360) for display purposes only; the
    /// stored value stays unbounded.
    pub fn display_rotation_deg(&self) -> f32 {
        self.rotation_deg.rem_euclid(360.0)
    }

    /// Short human-readable label for the layers panel.
    pub fn display_name(&self) -> String {
        match &self.kind {
            ElementKind::Text(p) => {
                let line = p.content.lines().next().unwrap_or("");
                let mut name: String = line.chars().take(18).collect();
                if name.len() < line.len() {
                    name.push('…');
                }
                name
            }
            ElementKind::Image(p) | ElementKind::Document(p) => p.source_name.clone(),
            ElementKind::QrCode(_) => "QR code".to_owned(),
            ElementKind::Barcode(p) => format!("Barcode ({})", p.symbology.as_str()),
            ElementKind::Table(p) => format!("Table {}×{}", p.rows, p.cols),
            ElementKind::Shape(p) => p.kind.label().to_owned(),
        }
    }
}

/// Clamp a font size to the legal range for the given canvas maximum.
pub fn clamp_font_size_mm(value: f32, max_mm: f32) -> f32 {
    value.clamp(MIN_FONT_SIZE_MM, max_mm.max(MIN_FONT_SIZE_MM))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_size_clamps_to_range() {
        assert_eq!(clamp_font_size_mm(1.0, 100.0), MIN_FONT_SIZE_MM);
        assert_eq!(clamp_font_size_mm(150.0, 100.0), 100.0);
        assert_eq!(clamp_font_size_mm(42.0, 100.0), 42.0);
    }

    #[test]
    fn display_rotation_wraps_but_storage_does_not() {
        let mut el = DesignElement::new(
            Pos2::new(10.0, 10.0),
            ElementKind::Table(TablePayload {
                rows: 3,
                cols: 3,
                border_mm: 0.5,
                size_mm: TABLE_BOX_MM,
            }),
        );
        el.rotation_deg = 725.0;
        assert!((el.display_rotation_deg() - 5.0).abs() < 1e-4);
        assert_eq!(el.rotation_deg, 725.0);

        el.rotation_deg = -90.0;
        assert!((el.display_rotation_deg() - 270.0).abs() < 1e-4);
    }

    #[test]
    fn text_has_no_stored_box() {
        let el = DesignElement::new(
            Pos2::ZERO,
            ElementKind::Text(TextPayload {
                content: "hello".into(),
                font_size_mm: 6.0,
                font: FontChoice::Sans,
                color: Color32::BLACK,
                weight: FontWeight::Bold,
                style: FontStyle::Normal,
                decoration: TextDecoration::None,
                align: TextAlign::Center,
                shadow: None,
            }),
        );
        assert!(el.box_size_mm().is_none());
    }

    #[test]
    fn bitmap_aspect() {
        let bitmap = Bitmap::new(200, 100, vec![0; 200 * 100 * 4]);
        assert_eq!(bitmap.aspect(), 2.0);
        assert_eq!(Bitmap::default().aspect(), 1.0);
    }
}
