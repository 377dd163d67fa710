#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod config;
pub mod element;
pub mod fonts;
pub mod generator;
pub mod interaction;
pub mod jobs;
pub mod panels;
pub mod render;
pub mod store;
pub mod units;

pub use app::{SaveResult, StickerLabApp};
pub use config::{CanvasConfig, LabelShape, Material};
pub use element::{DesignElement, ElementId, ElementKind, ShapeKind, Symbology};
pub use generator::GeneratorError;
pub use interaction::{InteractionController, SnapGuides};
pub use render::CanvasPainter;
pub use store::{ElementStore, ZDirection};
pub use units::{CanvasFit, fit};
