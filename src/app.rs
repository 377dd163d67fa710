//! Top-level eframe application: owns the store, the gesture
//! controller, the painter, and the background job queue, and wires
//! them to the panels every frame.

use egui::Color32;
use log::{info, warn};

use crate::config::CanvasConfig;
use crate::element::{DesignElement, ElementId, Symbology};
use crate::generator;
use crate::interaction::InteractionController;
use crate::jobs::{JobOutcome, JobQueue};
use crate::panels::{self, SidebarTab};
use crate::render::CanvasPainter;
use crate::store::ElementStore;

/// Everything the storefront needs back from a finished design.
#[derive(Debug, Clone)]
pub struct SaveResult {
    /// The element list as JSON, for re-editing later.
    pub design_json: String,
    /// Flattened PNG preview as a data URI; empty when the capture
    /// failed (the design JSON is still usable).
    pub preview_uri: String,
}

/// Invoked on the UI thread when a requested save completes.
pub type SaveCallback = Box<dyn FnMut(&SaveResult)>;

pub struct StickerLabApp {
    pub config: CanvasConfig,
    pub store: ElementStore,
    pub controller: InteractionController,
    pub painter: CanvasPainter,
    pub jobs: JobQueue,
    pub background_override: Option<Color32>,
    pub active_tab: SidebarTab,
    pub qr_input: String,
    pub barcode_input: String,
    pub barcode_symbology: Symbology,
    pub status: Option<String>,
    /// Frames to wait after clearing selection before capturing, so no
    /// selection chrome can land in the snapshot.
    save_countdown: Option<u8>,
    pub last_save: Option<SaveResult>,
    on_save: Option<SaveCallback>,
}

impl StickerLabApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: CanvasConfig) -> Self {
        crate::fonts::install(&cc.egui_ctx);
        info!(
            "editor opened for {}x{}mm {:?} label",
            config.width_mm, config.height_mm, config.material
        );
        Self {
            config,
            store: ElementStore::new(),
            controller: InteractionController::new(),
            painter: CanvasPainter::new(),
            jobs: JobQueue::new(cc.egui_ctx.clone()),
            background_override: None,
            active_tab: SidebarTab::default(),
            qr_input: String::new(),
            barcode_input: String::new(),
            barcode_symbology: Symbology::Code128,
            status: None,
            save_countdown: None,
            last_save: None,
            on_save: None,
        }
    }

    /// Register the storefront's completion hook.
    pub fn set_on_save(&mut self, callback: SaveCallback) {
        self.on_save = Some(callback);
    }

    pub fn delete_selected(&mut self) {
        if let Some(id) = self.store.selected_id() {
            self.remove_element(id);
        }
    }

    pub fn remove_element(&mut self, id: ElementId) {
        if self.store.remove(id).is_some() {
            self.painter.invalidate(id);
        }
    }

    /// Kick off the save flow: drop the selection, let a frame render
    /// without chrome, then flatten on a worker.
    pub fn request_save(&mut self) {
        self.store.clear_selection();
        self.controller.end();
        self.save_countdown = Some(1);
    }

    fn tick_save(&mut self, ctx: &egui::Context) {
        let Some(countdown) = self.save_countdown else {
            return;
        };
        if countdown > 0 {
            self.save_countdown = Some(countdown - 1);
            ctx.request_repaint();
            return;
        }
        self.save_countdown = None;
        let elements: Vec<DesignElement> = self.store.elements().to_vec();
        self.jobs
            .spawn_snapshot(self.config.clone(), self.background_override, elements);
    }

    fn drain_jobs(&mut self) {
        for outcome in self.jobs.drain() {
            match outcome {
                JobOutcome::Document {
                    source_name,
                    result,
                } => match result {
                    Ok(bitmap) => {
                        let element =
                            generator::document_from_bitmap(&source_name, bitmap, &self.config);
                        self.store.add(element);
                        self.status = None;
                    }
                    Err(err) => {
                        self.status = Some(format!("{source_name}: {err}"));
                    }
                },
                JobOutcome::Snapshot { result } => self.finish_save(result),
            }
        }
    }

    fn finish_save(&mut self, result: Result<String, String>) {
        let preview_uri = match result {
            Ok(uri) => uri,
            Err(err) => {
                warn!("save preview unavailable: {err}");
                String::new()
            }
        };
        let design_json = match serde_json::to_string(self.store.elements()) {
            Ok(json) => json,
            Err(err) => {
                // Should not happen for our own model; surface it
                // instead of handing the storefront a broken design.
                self.status = Some(format!("design serialization failed: {err}"));
                return;
            }
        };
        let save = SaveResult {
            design_json,
            preview_uri,
        };
        if let Some(callback) = &mut self.on_save {
            callback(&save);
        }
        info!("design saved ({} elements)", self.store.len());
        self.last_save = Some(save);
    }
}

impl eframe::App for StickerLabApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_jobs();
        self.tick_save(ctx);

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Sticker Lab");
                ui.separator();
                if !self.config.product_name.is_empty() {
                    ui.label(&self.config.product_name);
                    ui.separator();
                }
                let mut summary = format!(
                    "{:.0}×{:.0} mm · {}",
                    self.config.width_mm,
                    self.config.height_mm,
                    self.config.material.label()
                );
                if self.config.quantity > 1 {
                    summary.push_str(&format!(" · {} pcs", self.config.quantity));
                }
                ui.label(summary);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let saving = self.save_countdown.is_some() || self.jobs.is_busy();
                    if ui
                        .add_enabled(!saving, egui::Button::new("💾 Save design"))
                        .clicked()
                    {
                        self.request_save();
                    }
                    if saving {
                        ui.spinner();
                    }
                });
            });
        });

        panels::side_panel(self, ctx);
        panels::canvas_panel(self, ctx);
    }
}
