//! Central canvas: fits the label into the available space, routes
//! pointer input to the gesture controller, and paints the frame.

use egui::{Align2, Color32, FontId, Key, Pos2, Sense, Vec2};

use crate::app::StickerLabApp;
use crate::render::layout::{ScreenMap, element_box};
use crate::units;

/// Clear space kept around the canvas inside the panel.
const CANVAS_PADDING_PX: f32 = 40.0;

pub fn canvas_panel(app: &mut StickerLabApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let available = ui.available_rect_before_wrap();
        let fit = units::fit(
            Vec2::new(app.config.width_mm, app.config.height_mm),
            available.size(),
            CANVAS_PADDING_PX,
        );
        let map = ScreenMap {
            origin_px: available.center() - fit.visible_px / 2.0,
            scale: fit.scale,
        };

        let response = ui.allocate_rect(available, Sense::click_and_drag());
        route_pointer(app, ctx, &response, &map);
        handle_keys(app, ctx);

        app.painter.begin_frame();
        let painter = ui.painter_at(available);
        app.painter.paint(
            ctx,
            &painter,
            &map,
            &app.config,
            app.background_override,
            &app.store,
            app.controller.guides(),
        );

        // Physical dimension caption under the canvas.
        painter.text(
            Pos2::new(
                available.center().x,
                map.origin_px.y + fit.visible_px.y + 18.0,
            ),
            Align2::CENTER_CENTER,
            format!("{:.0} mm × {:.0} mm", app.config.width_mm, app.config.height_mm),
            FontId::proportional(13.0),
            Color32::GRAY,
        );

        if app.jobs.is_busy() {
            ui.put(
                egui::Rect::from_min_size(available.left_top(), Vec2::new(160.0, 24.0)),
                egui::Spinner::new(),
            );
        }
    });
}

fn route_pointer(
    app: &mut StickerLabApp,
    ctx: &egui::Context,
    response: &egui::Response,
    map: &ScreenMap,
) {
    if response.drag_started() {
        if let Some(pointer) = response.interact_pointer_pos() {
            begin_gesture(app, ctx, pointer, map);
        }
    }
    if app.controller.is_active() {
        if let Some(pointer) = response.interact_pointer_pos() {
            app.controller
                .pointer_moved(&mut app.store, pointer, map.scale, &app.config);
        }
    }
    // End on release, on cancel, and when the pointer leaves the
    // window; a gesture must never outlive its pointer.
    let released = response.drag_stopped()
        || ctx.input(|i| i.pointer.any_released() || !i.pointer.has_pointer());
    if app.controller.is_active() && released {
        app.controller.end();
    }

    if response.clicked() {
        if let Some(pointer) = response.interact_pointer_pos() {
            app.store.select(hit_test(app, ctx, pointer, map));
        }
    }
}

/// Decide what a fresh press means: a handle on the selected element,
/// a body hit (select and start moving), or empty canvas.
fn begin_gesture(app: &mut StickerLabApp, ctx: &egui::Context, pointer: Pos2, map: &ScreenMap) {
    if let Some(selected) = app.store.selected() {
        let screen_box = element_box(ctx, selected, map);
        let id = selected.id;
        if screen_box.hits_rotate_handle(pointer) {
            app.controller
                .begin_rotate(&app.store, id, pointer, screen_box.center_px);
            return;
        }
        if screen_box.hits_resize_handle(pointer) {
            app.controller.begin_resize(&app.store, id, pointer);
            return;
        }
    }

    match hit_test(app, ctx, pointer, map) {
        Some(id) => {
            app.store.select(Some(id));
            app.controller.begin_drag(&app.store, id, pointer);
        }
        None => app.store.select(None),
    }
}

/// Topmost element whose rotated box contains the point.
fn hit_test(
    app: &StickerLabApp,
    ctx: &egui::Context,
    pointer: Pos2,
    map: &ScreenMap,
) -> Option<crate::element::ElementId> {
    app.store
        .hit_test_order()
        .find(|el| element_box(ctx, el, map).contains(pointer))
        .map(|el| el.id)
}

fn handle_keys(app: &mut StickerLabApp, ctx: &egui::Context) {
    // Don't steal Backspace from a focused text field.
    if ctx.wants_keyboard_input() {
        return;
    }
    let delete = ctx.input(|i| i.key_pressed(Key::Delete) || i.key_pressed(Key::Backspace));
    if delete {
        app.delete_selected();
    }
}
