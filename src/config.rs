use egui::Vec2;
use serde::{Deserialize, Serialize};

/// Physical outline of the label die-cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelShape {
    #[default]
    Rectangle,
    Circle,
    Custom,
}

/// Label stock. Affects only the background visual, never geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    #[default]
    White,
    Gold,
    Silver,
    Transparent,
    Eco,
    Holographic,
}

impl Material {
    pub const ALL: [Material; 6] = [
        Material::White,
        Material::Gold,
        Material::Silver,
        Material::Transparent,
        Material::Eco,
        Material::Holographic,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Material::White => "White",
            Material::Gold => "Gold foil",
            Material::Silver => "Silver foil",
            Material::Transparent => "Transparent",
            Material::Eco => "Eco kraft",
            Material::Holographic => "Holographic",
        }
    }
}

/// Physical parameters of the label being designed. Comes from the
/// product configurator and is read-only for the editor's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub width_mm: f32,
    pub height_mm: f32,
    pub shape: LabelShape,
    pub corner_radius_mm: f32,
    pub material: Material,
    /// Ordered print run size. Carried through save payloads for the
    /// storefront; nothing in the editor interprets it.
    #[serde(default)]
    pub quantity: u32,
    /// Storefront product name, shown in the header and carried
    /// through save payloads uninterpreted.
    #[serde(default)]
    pub product_name: String,
}

impl CanvasConfig {
    /// Rectangular white label with square corners. Dimensions must be
    /// positive; zero or negative values are nudged to 1mm.
    pub fn new(width_mm: f32, height_mm: f32) -> Self {
        Self {
            width_mm: width_mm.max(1.0),
            height_mm: height_mm.max(1.0),
            shape: LabelShape::Rectangle,
            corner_radius_mm: 0.0,
            material: Material::White,
            quantity: 1,
            product_name: String::new(),
        }
    }

    /// Canvas center in millimeters.
    pub fn center_mm(&self) -> Vec2 {
        Vec2::new(self.width_mm / 2.0, self.height_mm / 2.0)
    }

    /// Largest legal font size: the longer canvas side.
    pub fn max_font_size_mm(&self) -> f32 {
        self.width_mm.max(self.height_mm)
    }
}
