use glam::Vec4;

use crate::texture::TextureHandle;

/// A single shading parameter slot.
///
/// The constant acts as a modulator for the texture sample (or as the value
/// itself when no texture is bound). How its components are read depends on
/// the layer type or modifier that owns the slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialValue {
    pub constant_color: Vec4,
    pub texture: Option<TextureHandle>,
}

impl MaterialValue {
    #[must_use]
    pub fn constant(constant_color: Vec4) -> Self {
        Self { constant_color, texture: None }
    }

    #[must_use]
    pub fn textured(constant_color: Vec4, texture: TextureHandle) -> Self {
        Self { constant_color, texture: Some(texture) }
    }

    /// Scalar shorthand, stored in `x`.
    #[must_use]
    pub fn scalar(value: f32) -> Self {
        Self::constant(Vec4::new(value, 0.0, 0.0, 0.0))
    }

    #[inline]
    #[must_use]
    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }
}
