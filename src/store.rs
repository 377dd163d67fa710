use log::{debug, warn};

use crate::element::{DesignElement, ElementId};
use crate::generator::{self, GeneratorError};

/// Direction for z-order moves. `Up` is toward the end of the sequence,
/// i.e. toward the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZDirection {
    Up,
    Down,
}

/// Ordered collection of design elements plus the single-selection
/// cursor.
///
/// Z-order is array order: later elements render on top and win hit
/// tests. All operations are synchronous and total: unknown ids and
/// boundary reorders are safe no-ops.
#[derive(Debug, Default)]
pub struct ElementStore {
    elements: Vec<DesignElement>,
    selected: Option<ElementId>,
}

impl ElementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elements in z-order, bottom first.
    pub fn elements(&self) -> &[DesignElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, id: ElementId) -> Option<&DesignElement> {
        self.elements.iter().find(|el| el.id == id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.get(id).is_some()
    }

    pub fn selected_id(&self) -> Option<ElementId> {
        self.selected
    }

    pub fn selected(&self) -> Option<&DesignElement> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Set or clear the selection. Selecting an unknown id clears it.
    pub fn select(&mut self, id: Option<ElementId>) {
        self.selected = id.filter(|id| self.contains(*id));
    }

    /// Append an element (topmost) and select it.
    pub fn add(&mut self, element: DesignElement) -> ElementId {
        let id = element.id;
        debug!("add element {} ({})", id, element.kind.kind_str());
        self.elements.push(element);
        self.selected = Some(id);
        id
    }

    /// Apply a mutation to the element with the given id, then refresh
    /// derived state (encoded QR/barcode bitmaps, shape rasters) if the
    /// generating inputs changed.
    ///
    /// A missing id is a no-op. The returned error only reports a
    /// failed derived-state refresh (e.g. the payload was edited into
    /// something the symbology cannot encode); the mutation itself has
    /// still been applied, with the stale cache cleared rather than
    /// left lying.
    pub fn update<F>(&mut self, id: ElementId, f: F) -> Result<(), GeneratorError>
    where
        F: FnOnce(&mut DesignElement),
    {
        let Some(element) = self.elements.iter_mut().find(|el| el.id == id) else {
            return Ok(());
        };

        let inputs_before = generator::cache_inputs(element);
        f(element);
        let inputs_after = generator::cache_inputs(element);

        if inputs_before != inputs_after || generator::cache_missing(element) {
            if let Err(err) = generator::refresh_cache(element) {
                warn!("cache refresh failed for {}: {}", id, err);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Remove an element; clears the selection if it was the target.
    /// Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: ElementId) -> Option<DesignElement> {
        let index = self.elements.iter().position(|el| el.id == id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        debug!("remove element {}", id);
        Some(self.elements.remove(index))
    }

    /// Swap the element with its neighbor toward the top (`Up`) or the
    /// bottom (`Down`) of the stack. No-op at either boundary or for an
    /// unknown id. Returns whether anything moved.
    pub fn reorder(&mut self, id: ElementId, direction: ZDirection) -> bool {
        let Some(index) = self.elements.iter().position(|el| el.id == id) else {
            return false;
        };
        match direction {
            ZDirection::Up if index + 1 < self.elements.len() => {
                self.elements.swap(index, index + 1);
                true
            }
            ZDirection::Down if index > 0 => {
                self.elements.swap(index, index - 1);
                true
            }
            _ => false,
        }
    }

    /// Elements in hit-test order, topmost first.
    pub fn hit_test_order(&self) -> impl Iterator<Item = &DesignElement> {
        self.elements.iter().rev()
    }

    /// Clear selection, e.g. before capturing the save snapshot so no
    /// selection chrome leaks into it.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }
}
