//! Strata Render
//!
//! The GPU-facing side of the material system:
//!
//! - [`uniform_block`]: the [`UniformBlock`] parameter-block abstraction and
//!   its host-side [`CpuUniformBlock`]
//! - [`binder`]: [`MaterialBinder`], writing materials into parameter blocks
//! - [`residency`]: [`TextureResidencyTracker`], a [`TextureResidency`] backend
//! - [`variants`]: [`ShaderVariantCache`], one generated WGSL variant per structure
//! - [`settings`]: [`MaterialRenderSettings`]
//!
//! [`TextureResidency`]: strata_resources::TextureResidency

pub mod binder;
pub mod residency;
pub mod settings;
pub mod uniform_block;
pub mod variants;

pub use binder::{LayerTextureSlots, MaterialBinder, MaterialBindingLayout, material_uniform_block};
pub use residency::{ResidentTexture, TextureResidencyTracker};
pub use settings::MaterialRenderSettings;
pub use uniform_block::{BoundTexture, CpuUniformBlock, UNIFORM_ALIGNMENT, UniformBlock};
pub use variants::{MATERIAL_BIND_GROUP, ShaderVariant, ShaderVariantCache, VariantCacheStats};
