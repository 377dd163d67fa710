//! Pointer gesture state machine for the canvas.
//!
//! At most one gesture is live at a time. Every gesture captures its
//! baseline (element position, font size, box size, pointer angle) when
//! it begins and recomputes the target value from that baseline on each
//! move, so long drags accumulate no rounding drift.

use egui::{Pos2, Vec2};
use log::debug;

use crate::config::CanvasConfig;
use crate::element::{ElementId, ElementKind, MIN_BOX_SIZE_MM, clamp_font_size_mm};
use crate::store::ElementStore;

/// Snap distance to the canvas center, in millimeters, applied per axis.
pub const SNAP_TOLERANCE_MM: f32 = 1.5;

/// Which center guides are live during a drag. Drawn by the renderer,
/// cleared when the gesture ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapGuides {
    pub vertical: bool,
    pub horizontal: bool,
}

/// Size baseline captured when a resize begins.
#[derive(Debug, Clone, Copy)]
enum ResizeBaseline {
    /// Text scales by font size; the box is intrinsic.
    Font(f32),
    /// Boxed elements scale by height with the aspect locked at
    /// gesture start.
    Box { size_mm: Vec2, aspect: f32 },
}

#[derive(Debug, Clone, Copy, Default)]
enum Gesture {
    #[default]
    Idle,
    Dragging {
        id: ElementId,
        start_pointer_px: Pos2,
        start_position_mm: Pos2,
    },
    Resizing {
        id: ElementId,
        start_y_px: f32,
        baseline: ResizeBaseline,
    },
    Rotating {
        id: ElementId,
        center_px: Pos2,
        start_pointer_angle: f32,
        start_rotation_deg: f32,
    },
}

#[derive(Debug, Default)]
pub struct InteractionController {
    gesture: Gesture,
    guides: SnapGuides,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    pub fn guides(&self) -> SnapGuides {
        self.guides
    }

    /// Begin moving an element. No-op if the id is unknown.
    pub fn begin_drag(&mut self, store: &ElementStore, id: ElementId, pointer_px: Pos2) {
        let Some(element) = store.get(id) else {
            return;
        };
        debug!("begin drag {}", id);
        self.gesture = Gesture::Dragging {
            id,
            start_pointer_px: pointer_px,
            start_position_mm: element.position_mm,
        };
    }

    /// Begin resizing an element. Captures the font size for text and
    /// the box plus aspect for everything else.
    pub fn begin_resize(&mut self, store: &ElementStore, id: ElementId, pointer_px: Pos2) {
        let Some(element) = store.get(id) else {
            return;
        };
        let baseline = match (&element.kind, element.box_size_mm()) {
            (ElementKind::Text(p), _) => ResizeBaseline::Font(p.font_size_mm),
            (_, Some(size_mm)) => ResizeBaseline::Box {
                size_mm,
                aspect: if size_mm.y > 0.0 {
                    size_mm.x / size_mm.y
                } else {
                    1.0
                },
            },
            (_, None) => return,
        };
        debug!("begin resize {}", id);
        self.gesture = Gesture::Resizing {
            id,
            start_y_px: pointer_px.y,
            baseline,
        };
    }

    /// Begin rotating an element about its screen-space center.
    pub fn begin_rotate(
        &mut self,
        store: &ElementStore,
        id: ElementId,
        pointer_px: Pos2,
        center_px: Pos2,
    ) {
        let Some(element) = store.get(id) else {
            return;
        };
        debug!("begin rotate {}", id);
        self.gesture = Gesture::Rotating {
            id,
            center_px,
            start_pointer_angle: (pointer_px - center_px).angle(),
            start_rotation_deg: element.rotation_deg,
        };
    }

    /// Feed a pointer position. Applies the live gesture to the store;
    /// idle pointers are ignored.
    pub fn pointer_moved(
        &mut self,
        store: &mut ElementStore,
        pointer_px: Pos2,
        scale: f32,
        config: &CanvasConfig,
    ) {
        if scale <= 0.0 {
            return;
        }
        match self.gesture {
            Gesture::Idle => {}
            Gesture::Dragging {
                id,
                start_pointer_px,
                start_position_mm,
            } => {
                let delta_mm = (pointer_px - start_pointer_px) / scale;
                let mut target = start_position_mm + delta_mm;
                let center = config.center_mm();
                let mut guides = SnapGuides::default();
                if (target.x - center.x).abs() <= SNAP_TOLERANCE_MM {
                    target.x = center.x;
                    guides.vertical = true;
                }
                if (target.y - center.y).abs() <= SNAP_TOLERANCE_MM {
                    target.y = center.y;
                    guides.horizontal = true;
                }
                self.guides = guides;
                let _ = store.update(id, |el| el.position_mm = target);
            }
            Gesture::Resizing {
                id,
                start_y_px,
                baseline,
            } => {
                let delta_mm = (pointer_px.y - start_y_px) / scale;
                match baseline {
                    ResizeBaseline::Font(start_font_mm) => {
                        let next = clamp_font_size_mm(
                            start_font_mm + delta_mm,
                            config.max_font_size_mm(),
                        );
                        let _ = store.update(id, |el| {
                            if let ElementKind::Text(p) = &mut el.kind {
                                p.font_size_mm = next;
                            }
                        });
                    }
                    ResizeBaseline::Box { size_mm, aspect } => {
                        let height = (size_mm.y + delta_mm).max(MIN_BOX_SIZE_MM);
                        let next = Vec2::new(height * aspect, height);
                        let _ = store.update(id, |el| {
                            if let Some(size) = el.box_size_mm_mut() {
                                *size = next;
                            }
                        });
                    }
                }
            }
            Gesture::Rotating {
                id,
                center_px,
                start_pointer_angle,
                start_rotation_deg,
            } => {
                let angle = (pointer_px - center_px).angle();
                let delta_deg = (angle - start_pointer_angle).to_degrees();
                let _ = store.update(id, |el| {
                    el.rotation_deg = start_rotation_deg + delta_deg;
                });
            }
        }
    }

    /// End the live gesture and clear the guides.
    pub fn end(&mut self) {
        if self.is_active() {
            debug!("gesture ended");
        }
        self.gesture = Gesture::Idle;
        self.guides = SnapGuides::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator;

    fn setup() -> (CanvasConfig, ElementStore, ElementId) {
        let config = CanvasConfig::new(100.0, 50.0);
        let mut store = ElementStore::new();
        let id = store.add(generator::new_table(&config));
        (config, store, id)
    }

    #[test]
    fn drag_is_drift_free() {
        let (config, mut store, id) = setup();
        let mut controller = InteractionController::new();
        let scale = 4.0;

        controller.begin_drag(&store, id, Pos2::new(200.0, 100.0));
        // Many intermediate moves; only the final pointer matters.
        for step in 1..=10 {
            let pointer = Pos2::new(200.0 + step as f32 * 4.0, 100.0 + step as f32 * 8.0);
            controller.pointer_moved(&mut store, pointer, scale, &config);
        }
        controller.end();

        // Total pointer delta (40, 80) px at scale 4 is (10, 20) mm.
        let position = store.get(id).unwrap().position_mm;
        assert!((position.x - 60.0).abs() < 1e-3);
        assert!((position.y - 45.0).abs() < 1e-3);
    }

    #[test]
    fn drag_snaps_within_tolerance_only() {
        let (config, mut store, id) = setup();
        let mut controller = InteractionController::new();
        let scale = 1.0;

        // Start at center; a 1.4mm offset snaps back.
        controller.begin_drag(&store, id, Pos2::ZERO);
        controller.pointer_moved(&mut store, Pos2::new(1.4, 0.0), scale, &config);
        assert_eq!(store.get(id).unwrap().position_mm.x, 50.0);
        assert!(controller.guides().vertical);
        assert!(controller.guides().horizontal);
        controller.end();
        assert_eq!(controller.guides(), SnapGuides::default());

        // A 1.6mm offset does not snap.
        controller.begin_drag(&store, id, Pos2::ZERO);
        controller.pointer_moved(&mut store, Pos2::new(1.6, 0.0), scale, &config);
        assert!((store.get(id).unwrap().position_mm.x - 51.6).abs() < 1e-3);
        assert!(!controller.guides().vertical);
        controller.end();
    }

    #[test]
    fn snap_boundary_is_inclusive() {
        let (config, mut store, id) = setup();
        let mut controller = InteractionController::new();

        controller.begin_drag(&store, id, Pos2::ZERO);
        controller.pointer_moved(&mut store, Pos2::new(1.5, 0.0), 1.0, &config);
        assert_eq!(store.get(id).unwrap().position_mm.x, 50.0);
        controller.end();
    }

    #[test]
    fn box_resize_locks_aspect() {
        let (config, mut store, id) = setup();
        let mut controller = InteractionController::new();
        let scale = 2.0;

        // Table starts at 40x30mm, aspect 4:3.
        controller.begin_resize(&store, id, Pos2::new(0.0, 100.0));
        controller.pointer_moved(&mut store, Pos2::new(0.0, 130.0), scale, &config);
        controller.end();

        // +30px at scale 2 is +15mm of height.
        let size = store.get(id).unwrap().box_size_mm().unwrap();
        assert!((size.y - 45.0).abs() < 1e-3);
        assert!((size.x - 60.0).abs() < 1e-3);
    }

    #[test]
    fn box_resize_clamps_to_minimum() {
        let (config, mut store, id) = setup();
        let mut controller = InteractionController::new();

        controller.begin_resize(&store, id, Pos2::new(0.0, 0.0));
        controller.pointer_moved(&mut store, Pos2::new(0.0, -500.0), 1.0, &config);
        controller.end();

        let size = store.get(id).unwrap().box_size_mm().unwrap();
        assert_eq!(size.y, MIN_BOX_SIZE_MM);
        // Width follows the locked 4:3 aspect.
        assert!((size.x - MIN_BOX_SIZE_MM * 40.0 / 30.0).abs() < 1e-3);
    }

    #[test]
    fn text_resize_clamps_font() {
        let config = CanvasConfig::new(100.0, 50.0);
        let mut store = ElementStore::new();
        let id = store.add(generator::new_text(&config));
        let mut controller = InteractionController::new();

        // Drag far upward: font bottoms out at the minimum.
        controller.begin_resize(&store, id, Pos2::new(0.0, 0.0));
        controller.pointer_moved(&mut store, Pos2::new(0.0, -1000.0), 1.0, &config);
        controller.end();
        let ElementKind::Text(p) = &store.get(id).unwrap().kind else {
            panic!("expected text");
        };
        assert_eq!(p.font_size_mm, crate::element::MIN_FONT_SIZE_MM);

        // Drag far downward: font tops out at max(canvas side).
        controller.begin_resize(&store, id, Pos2::new(0.0, 0.0));
        controller.pointer_moved(&mut store, Pos2::new(0.0, 1000.0), 1.0, &config);
        controller.end();
        let ElementKind::Text(p) = &store.get(id).unwrap().kind else {
            panic!("expected text");
        };
        assert_eq!(p.font_size_mm, 100.0);
    }

    #[test]
    fn rotation_is_clockwise_positive() {
        let (config, mut store, id) = setup();
        let mut controller = InteractionController::new();
        let center = Pos2::new(400.0, 300.0);

        // Pointer starts to the right of the center and sweeps to
        // below it: a quarter turn clockwise in screen coordinates.
        controller.begin_rotate(&store, id, Pos2::new(500.0, 300.0), center);
        controller.pointer_moved(&mut store, Pos2::new(400.0, 400.0), 4.0, &config);
        controller.end();

        let rotation = store.get(id).unwrap().rotation_deg;
        assert!((rotation - 90.0).abs() < 1e-3);
    }

    #[test]
    fn rotation_accumulates_unbounded() {
        let (config, mut store, id) = setup();
        let mut controller = InteractionController::new();
        let center = Pos2::new(0.0, 0.0);

        store.update(id, |el| el.rotation_deg = 350.0).unwrap();
        controller.begin_rotate(&store, id, Pos2::new(100.0, 0.0), center);
        controller.pointer_moved(&mut store, Pos2::new(0.0, 100.0), 4.0, &config);
        controller.end();

        let el = store.get(id).unwrap();
        assert!((el.rotation_deg - 440.0).abs() < 1e-3);
        assert!((el.display_rotation_deg() - 80.0).abs() < 1e-3);
    }

    #[test]
    fn gestures_on_unknown_ids_are_noops() {
        let (config, mut store, _) = setup();
        let mut controller = InteractionController::new();
        controller.begin_drag(&store, uuid::Uuid::new_v4(), Pos2::ZERO);
        assert!(!controller.is_active());
        controller.pointer_moved(&mut store, Pos2::new(10.0, 10.0), 1.0, &config);
    }
}
