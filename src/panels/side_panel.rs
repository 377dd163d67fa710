//! Sidebar property editors. Widgets edit a clone of the selected
//! element's payload and write changes back through the store, so the
//! clamping rules live in one place and corrected values reflect back
//! into the controls on the next frame.

use egui::{Color32, Slider};
use log::info;

use crate::app::StickerLabApp;
use crate::element::{
    ElementKind, FontChoice, FontStyle, FontWeight, MIN_FONT_SIZE_MM, ShapeKind, Symbology,
    TextAlign, TextDecoration, TextShadow, clamp_font_size_mm,
};
use crate::generator;
use crate::panels::SidebarTab;
use crate::store::ZDirection;

/// Preset swatches offered for text and backgrounds.
const PALETTE: [Color32; 8] = [
    Color32::BLACK,
    Color32::WHITE,
    Color32::from_rgb(220, 50, 47),
    Color32::from_rgb(203, 75, 22),
    Color32::from_rgb(181, 137, 0),
    Color32::from_rgb(133, 153, 0),
    Color32::from_rgb(38, 139, 210),
    Color32::from_rgb(108, 113, 196),
];

pub fn side_panel(app: &mut StickerLabApp, ctx: &egui::Context) {
    egui::SidePanel::left("properties_panel")
        .resizable(true)
        .default_width(260.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                for (tab, label) in [
                    (SidebarTab::Text, "Text"),
                    (SidebarTab::Graphics, "Graphics"),
                    (SidebarTab::Background, "Background"),
                    (SidebarTab::Layers, "Layers"),
                ] {
                    if ui.selectable_label(app.active_tab == tab, label).clicked() {
                        app.active_tab = tab;
                    }
                }
            });
            ui.separator();

            match app.active_tab {
                SidebarTab::Text => text_tab(app, ui),
                SidebarTab::Graphics => graphics_tab(app, ui),
                SidebarTab::Background => background_tab(app, ui),
                SidebarTab::Layers => layers_tab(app, ui),
            }

            if let Some(status) = &app.status {
                ui.separator();
                ui.colored_label(Color32::from_rgb(200, 80, 60), status);
            }
        });
}

fn text_tab(app: &mut StickerLabApp, ui: &mut egui::Ui) {
    if ui.button("➕ Add text").clicked() {
        let element = generator::new_text(&app.config);
        app.store.add(element);
        app.status = None;
    }
    ui.separator();

    let Some(selected) = app.store.selected() else {
        ui.weak("Select a text element to edit it.");
        return;
    };
    let id = selected.id;
    let ElementKind::Text(original) = &selected.kind else {
        ui.weak("The selected element is not text.");
        return;
    };
    let original = original.clone();
    let mut payload = original.clone();

    ui.label("Content");
    ui.text_edit_multiline(&mut payload.content);

    ui.horizontal(|ui| {
        ui.label("Font");
        egui::ComboBox::from_id_salt("font_family")
            .selected_text(match payload.font {
                FontChoice::Sans => "Sans",
                FontChoice::Serif => "Serif",
                FontChoice::Mono => "Mono",
            })
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut payload.font, FontChoice::Sans, "Sans");
                ui.selectable_value(&mut payload.font, FontChoice::Serif, "Serif");
                ui.selectable_value(&mut payload.font, FontChoice::Mono, "Mono");
            });
    });

    let max_font = app.config.max_font_size_mm();
    ui.horizontal(|ui| {
        ui.label("Size (mm)");
        ui.add(Slider::new(&mut payload.font_size_mm, MIN_FONT_SIZE_MM..=max_font));
    });

    ui.horizontal(|ui| {
        let bold = payload.weight == FontWeight::Bold;
        if ui.selectable_label(bold, "B").clicked() {
            payload.weight = if bold {
                FontWeight::Normal
            } else {
                FontWeight::Bold
            };
        }
        let italic = payload.style == FontStyle::Italic;
        if ui.selectable_label(italic, "I").clicked() {
            payload.style = if italic {
                FontStyle::Normal
            } else {
                FontStyle::Italic
            };
        }
        let underline = payload.decoration == TextDecoration::Underline;
        if ui.selectable_label(underline, "U").clicked() {
            payload.decoration = if underline {
                TextDecoration::None
            } else {
                TextDecoration::Underline
            };
        }
        ui.separator();
        for (align, label) in [
            (TextAlign::Left, "⬅"),
            (TextAlign::Center, "↔"),
            (TextAlign::Right, "➡"),
        ] {
            if ui.selectable_label(payload.align == align, label).clicked() {
                payload.align = align;
            }
        }
    });

    ui.horizontal(|ui| {
        ui.label("Color");
        for swatch in PALETTE {
            if color_swatch(ui, swatch, payload.color == swatch) {
                payload.color = swatch;
            }
        }
    });
    ui.horizontal(|ui| {
        ui.label("Custom");
        egui::color_picker::color_edit_button_srgba(
            ui,
            &mut payload.color,
            egui::color_picker::Alpha::Opaque,
        );
    });

    let mut shadow = payload.shadow.is_some();
    if ui.checkbox(&mut shadow, "Drop shadow").changed() {
        payload.shadow = shadow.then(TextShadow::default);
    }

    if payload != original {
        let max = app.config.max_font_size_mm();
        let _ = app.store.update(id, move |el| {
            if let ElementKind::Text(p) = &mut el.kind {
                payload.font_size_mm = clamp_font_size_mm(payload.font_size_mm, max);
                *p = payload;
            }
        });
    }

    ui.separator();
    if ui.button("🗑 Delete element").clicked() {
        app.delete_selected();
    }
}

fn graphics_tab(app: &mut StickerLabApp, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        if ui.button("🖼 Upload image").clicked() {
            upload_image(app);
        }
        if ui.button("📄 Upload SVG").clicked() {
            upload_document(app);
        }
    });
    ui.separator();

    ui.label("QR code");
    ui.horizontal(|ui| {
        ui.text_edit_singleline(&mut app.qr_input);
        if ui.button("Add").clicked() {
            match generator::new_qrcode(&app.qr_input, &app.config) {
                Ok(element) => {
                    app.store.add(element);
                    app.status = None;
                }
                Err(err) => app.status = Some(err.to_string()),
            }
        }
    });

    ui.label("Barcode");
    ui.horizontal(|ui| {
        ui.text_edit_singleline(&mut app.barcode_input);
        egui::ComboBox::from_id_salt("symbology")
            .selected_text(app.barcode_symbology.as_str())
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut app.barcode_symbology, Symbology::Code128, "CODE128");
                ui.selectable_value(&mut app.barcode_symbology, Symbology::Ean13, "EAN13");
            });
        if ui.button("Add").clicked() {
            match generator::new_barcode(&app.barcode_input, app.barcode_symbology, &app.config) {
                Ok(element) => {
                    app.store.add(element);
                    app.status = None;
                }
                Err(err) => app.status = Some(err.to_string()),
            }
        }
    });
    ui.separator();

    if ui.button("▦ Add table").clicked() {
        let element = generator::new_table(&app.config);
        app.store.add(element);
    }

    ui.label("Shapes");
    ui.horizontal_wrapped(|ui| {
        for kind in ShapeKind::ALL {
            if ui.button(kind.label()).clicked() {
                match generator::new_shape(kind, &app.config) {
                    Ok(element) => {
                        app.store.add(element);
                        app.status = None;
                    }
                    Err(err) => app.status = Some(err.to_string()),
                }
            }
        }
    });

    shape_properties(app, ui);
    table_properties(app, ui);
}

fn shape_properties(app: &mut StickerLabApp, ui: &mut egui::Ui) {
    let Some(selected) = app.store.selected() else {
        return;
    };
    let id = selected.id;
    let ElementKind::Shape(original) = &selected.kind else {
        return;
    };
    let (original_fill, original_stroke, original_width) =
        (original.fill, original.stroke, original.stroke_width_mm);
    let mut fill = original_fill;
    let mut stroke = original_stroke;
    let mut stroke_width_mm = original_width;

    ui.separator();
    ui.strong("Shape");
    ui.horizontal(|ui| {
        let mut filled = fill.is_some();
        if ui.checkbox(&mut filled, "Fill").changed() {
            fill = filled.then_some(Color32::BLACK);
        }
        if let Some(color) = &mut fill {
            egui::color_picker::color_edit_button_srgba(
                ui,
                color,
                egui::color_picker::Alpha::Opaque,
            );
        }
    });
    ui.horizontal(|ui| {
        let mut stroked = stroke.is_some();
        if ui.checkbox(&mut stroked, "Stroke").changed() {
            stroke = stroked.then_some(Color32::BLACK);
        }
        if let Some(color) = &mut stroke {
            egui::color_picker::color_edit_button_srgba(
                ui,
                color,
                egui::color_picker::Alpha::Opaque,
            );
            ui.add(Slider::new(&mut stroke_width_mm, 0.2..=5.0).text("mm"));
        }
    });

    if fill != original_fill || stroke != original_stroke || stroke_width_mm != original_width {
        if let Err(err) = app.store.update(id, |el| {
            if let ElementKind::Shape(p) = &mut el.kind {
                p.fill = fill;
                p.stroke = stroke;
                p.stroke_width_mm = stroke_width_mm;
            }
        }) {
            app.status = Some(err.to_string());
        }
    }
}

fn table_properties(app: &mut StickerLabApp, ui: &mut egui::Ui) {
    let Some(selected) = app.store.selected() else {
        return;
    };
    let id = selected.id;
    let ElementKind::Table(original) = &selected.kind else {
        return;
    };
    let original = *original;
    let mut rows = original.rows;
    let mut cols = original.cols;
    let mut border_mm = original.border_mm;

    ui.separator();
    ui.strong("Table");
    ui.horizontal(|ui| {
        ui.label("Rows");
        ui.add(Slider::new(&mut rows, 1..=12));
        ui.label("Columns");
        ui.add(Slider::new(&mut cols, 1..=12));
    });
    ui.horizontal(|ui| {
        ui.label("Border (mm)");
        ui.add(Slider::new(&mut border_mm, 0.1..=2.0));
    });

    if rows != original.rows || cols != original.cols || border_mm != original.border_mm {
        let _ = app.store.update(id, |el| {
            if let ElementKind::Table(p) = &mut el.kind {
                p.rows = rows;
                p.cols = cols;
                p.border_mm = border_mm;
            }
        });
    }
}

fn background_tab(app: &mut StickerLabApp, ui: &mut egui::Ui) {
    ui.label(format!("Material: {}", app.config.material.label()));
    ui.separator();

    ui.label("Background color");
    ui.horizontal(|ui| {
        for swatch in PALETTE {
            if color_swatch(ui, swatch, app.background_override == Some(swatch)) {
                app.background_override = Some(swatch);
            }
        }
    });
    ui.horizontal(|ui| {
        let mut color = app.background_override.unwrap_or(Color32::WHITE);
        if egui::color_picker::color_edit_button_srgba(
            ui,
            &mut color,
            egui::color_picker::Alpha::Opaque,
        )
        .changed()
        {
            app.background_override = Some(color);
        }
        if ui.button("Use material").clicked() {
            app.background_override = None;
        }
    });
}

fn layers_tab(app: &mut StickerLabApp, ui: &mut egui::Ui) {
    if app.store.is_empty() {
        ui.weak("No elements yet.");
        return;
    }

    // Topmost first, matching what the user sees.
    let rows: Vec<_> = app
        .store
        .elements()
        .iter()
        .rev()
        .map(|el| (el.id, el.display_name(), el.display_rotation_deg()))
        .collect();

    for (id, name, rotation) in rows {
        ui.horizontal(|ui| {
            let selected = app.store.selected_id() == Some(id);
            if ui.selectable_label(selected, &name).clicked() {
                app.store.select(Some(id));
            }
            if rotation != 0.0 {
                ui.weak(format!("{rotation:.0}°"));
            }
            if ui.small_button("⬆").clicked() {
                app.store.reorder(id, ZDirection::Up);
            }
            if ui.small_button("⬇").clicked() {
                app.store.reorder(id, ZDirection::Down);
            }
            if ui.small_button("🗑").clicked() {
                app.remove_element(id);
            }
        });
    }
}

fn color_swatch(ui: &mut egui::Ui, color: Color32, selected: bool) -> bool {
    let (rect, response) = ui.allocate_exact_size(egui::Vec2::splat(18.0), egui::Sense::click());
    let rounding = 3.0;
    ui.painter().rect_filled(rect, rounding, color);
    let stroke = if selected {
        egui::Stroke::new(2.0, Color32::from_rgb(0, 145, 255))
    } else {
        egui::Stroke::new(1.0, Color32::DARK_GRAY)
    };
    ui.painter().rect_stroke(rect, rounding, stroke);
    response.clicked()
}

fn upload_image(app: &mut StickerLabApp) {
    let Some(path) = rfd::FileDialog::new()
        .add_filter("Images", &["png", "jpg", "jpeg", "gif", "webp", "bmp"])
        .pick_file()
    else {
        return;
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_owned());
    match std::fs::read(&path) {
        Ok(bytes) => match generator::new_image(&name, &bytes, &app.config) {
            Ok(element) => {
                info!("added image {name}");
                app.store.add(element);
                app.status = None;
            }
            Err(err) => app.status = Some(err.to_string()),
        },
        Err(err) => app.status = Some(format!("could not read {name}: {err}")),
    }
}

fn upload_document(app: &mut StickerLabApp) {
    let Some(path) = rfd::FileDialog::new()
        .add_filter("Vector documents", &["svg"])
        .pick_file()
    else {
        return;
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.svg".to_owned());
    match std::fs::read(&path) {
        Ok(bytes) => {
            // Rasterization can be slow for complex pages; it finishes
            // on a worker and lands via the job queue.
            app.jobs.spawn_document(name, bytes);
        }
        Err(err) => app.status = Some(format!("could not read {name}: {err}")),
    }
}
