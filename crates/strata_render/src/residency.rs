//! Texture residency tracking.
//!
//! Keeps a shared reference to every texture a material has bound, keyed by
//! texture uuid, with the number of outstanding binds. The tracker never
//! destroys anything: unloading the last bind only drops its own handle, and
//! the texture lives on as long as any material still holds it.

use rustc_hash::FxHashMap;
use strata_resources::{SamplerHandle, TextureHandle, TextureResidency};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ResidentTexture {
    pub texture: TextureHandle,
    /// Sampler override from the most recent bind.
    pub sampler: Option<SamplerHandle>,
    pub bind_count: u32,
}

#[derive(Debug, Default)]
pub struct TextureResidencyTracker {
    resident: FxHashMap<Uuid, ResidentTexture>,
}

impl TextureResidencyTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_resident(&self, texture: &TextureHandle) -> bool {
        self.resident.contains_key(&texture.uuid())
    }

    #[must_use]
    pub fn bind_count(&self, texture: &TextureHandle) -> u32 {
        self.resident.get(&texture.uuid()).map_or(0, |r| r.bind_count)
    }

    #[must_use]
    pub fn get(&self, texture: &TextureHandle) -> Option<&ResidentTexture> {
        self.resident.get(&texture.uuid())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.resident.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resident.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResidentTexture> {
        self.resident.values()
    }

    pub fn clear(&mut self) {
        self.resident.clear();
    }
}

impl TextureResidency for TextureResidencyTracker {
    fn bind_texture(&mut self, texture: &TextureHandle, sampler: Option<&SamplerHandle>) {
        let entry = self.resident.entry(texture.uuid()).or_insert_with(|| {
            log::trace!("Texture '{}' resident", texture.name);
            ResidentTexture { texture: texture.clone(), sampler: None, bind_count: 0 }
        });
        entry.bind_count += 1;
        entry.sampler = sampler.cloned();
    }

    fn unload_texture(&mut self, texture: &TextureHandle) {
        let uuid = texture.uuid();
        let Some(entry) = self.resident.get_mut(&uuid) else {
            log::warn!("Unload of non-resident texture '{}'", texture.name);
            return;
        };
        entry.bind_count -= 1;
        if entry.bind_count == 0 {
            self.resident.remove(&uuid);
            log::trace!("Texture '{}' evicted", texture.name);
        }
    }
}
