use std::ops::Deref;
use std::sync::Arc;

use uuid::Uuid;
use wgpu::{AddressMode, FilterMode, MipmapFilterMode, TextureFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureSampler {
    pub address_mode_u: AddressMode,
    pub address_mode_v: AddressMode,
    pub address_mode_w: AddressMode,
    pub mag_filter: FilterMode,
    pub min_filter: FilterMode,
    pub mipmap_filter: MipmapFilterMode,
    // 1 = anisotropic filtering off
    pub anisotropy_clamp: u16,
}

impl Default for TextureSampler {
    fn default() -> Self {
        Self {
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            address_mode_w: AddressMode::Repeat,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: MipmapFilterMode::Linear,
            anisotropy_clamp: 1,
        }
    }
}

impl TextureSampler {
    /// Nearest-neighbour sampling, used by viewers to inspect texel data.
    #[must_use]
    pub fn point() -> Self {
        Self {
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            mipmap_filter: MipmapFilterMode::Nearest,
            ..Default::default()
        }
    }
}

/// Shared sampler, used to override the per-texture samplers of a material.
pub type SamplerHandle = Arc<TextureSampler>;

// ============================================================================
// Texture Asset
// ============================================================================

#[derive(Debug)]
pub struct Texture {
    pub uuid: Uuid,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub sampler: TextureSampler,
}

impl Texture {
    pub fn new_2d(name: &str, width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            width,
            height,
            format,
            sampler: TextureSampler::default(),
        }
    }

    /// 1x1 placeholder texture
    pub fn solid_color(name: &str) -> Self {
        Self::new_2d(name, 1, 1, TextureFormat::Rgba8UnormSrgb)
    }

    /// Material textures are combined with an RGB constant, so anything with
    /// fewer than three color channels cannot back a [`MaterialValue`].
    ///
    /// [`MaterialValue`]: crate::MaterialValue
    #[must_use]
    pub fn is_rgb_sampleable(&self) -> bool {
        self.format.has_color_aspect() && self.format.components() >= 3
    }
}

/// Reference-counted texture handle.
///
/// A material and the GPU binding layer may both hold clones; the texture lives
/// as long as the longest holder. Identity is the texture uuid.
#[derive(Debug, Clone)]
pub struct TextureHandle(Arc<Texture>);

impl TextureHandle {
    pub fn new(texture: Texture) -> Self {
        Self(Arc::new(texture))
    }

    #[inline]
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0.uuid
    }

    /// Number of live handles sharing this texture.
    #[must_use]
    pub fn holder_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl From<Texture> for TextureHandle {
    fn from(texture: Texture) -> Self {
        Self::new(texture)
    }
}

impl Deref for TextureHandle {
    type Target = Texture;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for TextureHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.uuid == other.0.uuid
    }
}

impl Eq for TextureHandle {}

impl std::hash::Hash for TextureHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.uuid.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_sampleable_formats() {
        assert!(Texture::new_2d("albedo", 4, 4, TextureFormat::Rgba8UnormSrgb).is_rgb_sampleable());
        assert!(Texture::new_2d("hdr", 4, 4, TextureFormat::Rgba16Float).is_rgb_sampleable());
        assert!(!Texture::new_2d("mask", 4, 4, TextureFormat::R8Unorm).is_rgb_sampleable());
        assert!(!Texture::new_2d("depth", 4, 4, TextureFormat::Depth32Float).is_rgb_sampleable());
    }

    #[test]
    fn handles_share_identity() {
        let a = TextureHandle::new(Texture::solid_color("white"));
        let b = a.clone();
        let c = TextureHandle::new(Texture::solid_color("white"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.holder_count(), 2);
    }
}
