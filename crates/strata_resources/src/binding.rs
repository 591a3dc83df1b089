//! Texture residency seam between materials and the GPU backend.

use crate::texture::{SamplerHandle, TextureHandle};

/// Backend that makes material textures available to the GPU.
///
/// [`Material::bind_textures`](crate::Material::bind_textures) calls
/// `bind_texture` once per active texture, in visit order and without
/// deduplication, so implementations should tolerate repeated binds.
pub trait TextureResidency {
    /// `sampler` is the material's sampler override, if any.
    fn bind_texture(&mut self, texture: &TextureHandle, sampler: Option<&SamplerHandle>);

    fn unload_texture(&mut self, texture: &TextureHandle);
}
