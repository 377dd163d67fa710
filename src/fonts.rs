//! Bundled typefaces beyond egui's embedded defaults.
//!
//! The serif face ships with the binary (DejaVu Serif, free license,
//! see assets/) and is registered under its own named family so the
//! default proportional and monospace stacks stay untouched.

use std::sync::Arc;

use egui::{Context, FontData, FontDefinitions, FontFamily};

/// Family name the serif face registers under.
pub const SERIF_NAME: &str = "DejaVuSerif";

/// Raw TTF bytes, shared with the snapshot rasterizer.
pub const SERIF_BYTES: &[u8] = include_bytes!("../assets/DejaVuSerif.ttf");

/// egui family handle for the bundled serif face.
pub fn serif_family() -> FontFamily {
    FontFamily::Name(SERIF_NAME.into())
}

/// Register the bundled faces on top of egui's defaults. Call once at
/// startup, before the first frame.
pub fn install(ctx: &Context) {
    let mut definitions = FontDefinitions::default();
    definitions.font_data.insert(
        SERIF_NAME.to_owned(),
        Arc::new(FontData::from_static(SERIF_BYTES)),
    );
    definitions
        .families
        .insert(serif_family(), vec![SERIF_NAME.to_owned()]);
    ctx.set_fonts(definitions);
}
