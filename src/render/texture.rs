use std::collections::HashMap;

use egui::{ColorImage, Context, TextureHandle, TextureId, TextureOptions};
use thiserror::Error;

use crate::element::{Bitmap, ElementId};

#[derive(Error, Debug)]
pub enum TextureError {
    #[error("element has no pixel content to upload")]
    EmptyBitmap,
}

/// GPU texture cache for element bitmaps, keyed by (element id, cache
/// version). A changed version is a miss, so edited content re-uploads
/// exactly once; stale versions age out via LRU.
pub struct TextureCache {
    textures: HashMap<(ElementId, u64), TextureHandle>,
    last_used: HashMap<(ElementId, u64), u64>,
    current_frame: u64,
    max_entries: usize,
}

impl TextureCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            textures: HashMap::new(),
            last_used: HashMap::new(),
            current_frame: 0,
            max_entries,
        }
    }

    /// Advance the LRU clock; call once per frame.
    pub fn begin_frame(&mut self) {
        self.current_frame += 1;
    }

    /// Fetch the texture for an element bitmap, uploading on miss.
    pub fn get_or_upload(
        &mut self,
        ctx: &Context,
        id: ElementId,
        version: u64,
        bitmap: &Bitmap,
    ) -> Result<TextureId, TextureError> {
        let key = (id, version);
        if let Some(handle) = self.textures.get(&key) {
            self.last_used.insert(key, self.current_frame);
            return Ok(handle.id());
        }
        if bitmap.is_empty() {
            return Err(TextureError::EmptyBitmap);
        }

        self.evict_if_needed();

        let image = ColorImage::from_rgba_unmultiplied(
            [bitmap.width as usize, bitmap.height as usize],
            &bitmap.pixels,
        );
        let name = format!("element_{id}_v{version}");
        let handle = ctx.load_texture(&name, image, TextureOptions::LINEAR);
        let texture_id = handle.id();
        self.textures.insert(key, handle);
        self.last_used.insert(key, self.current_frame);
        Ok(texture_id)
    }

    /// Drop every cached version for an element, e.g. on removal.
    pub fn invalidate(&mut self, id: ElementId) {
        self.textures.retain(|(key_id, _), _| *key_id != id);
        self.last_used.retain(|(key_id, _), _| *key_id != id);
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    fn evict_if_needed(&mut self) {
        if self.textures.len() < self.max_entries {
            return;
        }
        let mut entries: Vec<((ElementId, u64), u64)> =
            self.last_used.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(_, frame)| *frame);

        let to_remove = entries.len() + 1 - self.max_entries;
        for (key, _) in entries.into_iter().take(to_remove) {
            self.textures.remove(&key);
            self.last_used.remove(&key);
        }
    }
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn bitmap() -> Bitmap {
        Bitmap::new(4, 4, vec![255; 4 * 4 * 4])
    }

    #[test]
    fn same_version_hits_cache() {
        let ctx = Context::default();
        let mut cache = TextureCache::new(8);
        let id = Uuid::new_v4();
        let first = cache.get_or_upload(&ctx, id, 1, &bitmap()).unwrap();
        let second = cache.get_or_upload(&ctx, id, 1, &bitmap()).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn version_bump_is_a_miss() {
        let ctx = Context::default();
        let mut cache = TextureCache::new(8);
        let id = Uuid::new_v4();
        cache.get_or_upload(&ctx, id, 1, &bitmap()).unwrap();
        cache.get_or_upload(&ctx, id, 2, &bitmap()).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn invalidate_drops_all_versions() {
        let ctx = Context::default();
        let mut cache = TextureCache::new(8);
        let id = Uuid::new_v4();
        cache.get_or_upload(&ctx, id, 1, &bitmap()).unwrap();
        cache.get_or_upload(&ctx, id, 2, &bitmap()).unwrap();
        cache.invalidate(id);
        assert!(cache.is_empty());
    }

    #[test]
    fn lru_evicts_oldest() {
        let ctx = Context::default();
        let mut cache = TextureCache::new(2);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        cache.get_or_upload(&ctx, a, 1, &bitmap()).unwrap();
        cache.begin_frame();
        cache.get_or_upload(&ctx, b, 1, &bitmap()).unwrap();
        cache.begin_frame();
        cache.get_or_upload(&ctx, c, 1, &bitmap()).unwrap();
        assert!(cache.len() <= 2);
    }

    #[test]
    fn empty_bitmap_is_rejected() {
        let ctx = Context::default();
        let mut cache = TextureCache::new(8);
        let err = cache.get_or_upload(&ctx, Uuid::new_v4(), 1, &Bitmap::default());
        assert!(err.is_err());
    }
}
