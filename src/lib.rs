//! # Strata
//!
//! Layered, energy-conserving materials for a real-time renderer.
//!
//! A [`Material`] stacks up to [`MAX_LAYERS`] shading layers (Lambert,
//! conductor, dielectric) plus normal, alpha, height and ambient modifiers.
//! Finalization normalizes the layers so the stack never reflects more energy
//! than it receives, and materials with the same structure share a
//! [`DescId`] so shader tooling compiles one variant per structure.
//!
//! ```rust,ignore
//! use strata::prelude::*;
//!
//! let ctx = MaterialContext::new();
//! let mut car_paint = Material::new(&ctx, "car_paint");
//! car_paint.add_layer(
//!     MaterialLayerDesc::dielectric(BlendMode::Fresnel),
//!     MaterialLayerValues::dielectric(Vec4::ONE, 0.05, 1.5),
//! );
//! car_paint.add_layer(
//!     MaterialLayerDesc::lambert(BlendMode::Additive),
//!     MaterialLayerValues::with_albedo(MaterialValue::constant(Vec4::new(0.6, 0.05, 0.05, 1.0))),
//! );
//! car_paint.finalize();
//!
//! let mut binder = MaterialBinder::default();
//! let mut block = material_uniform_block("scene", "material");
//! binder.bind(&car_paint, &mut block)?;
//! ```

pub use strata_core::interner;
pub use strata_render as render;
pub use strata_resources as resources;

pub use strata_core::{Result, StrataError};
pub use strata_render::{
    CpuUniformBlock, MaterialBinder, MaterialBindingLayout, MaterialRenderSettings, ShaderVariant,
    ShaderVariantCache, TextureResidencyTracker, UniformBlock, material_uniform_block,
};
pub use strata_resources::{
    BlendMode, DescId, DescriptorIdentityRegistry, LayerType, MAX_LAYERS, Material,
    MaterialContext, MaterialData, MaterialDesc, MaterialLayerDesc, MaterialLayerValues,
    MaterialValue, ModifierFlags, NormalDistribution, SamplerHandle, ShaderDefines, Texture,
    TextureHandle, TextureResidency, TextureSampler,
};

/// Everything needed to author and bind materials.
pub mod prelude {
    pub use glam::{Vec3, Vec4};

    pub use crate::{
        BlendMode, CpuUniformBlock, LayerType, Material, MaterialBinder, MaterialContext,
        MaterialLayerDesc, MaterialLayerValues, MaterialRenderSettings, MaterialValue,
        NormalDistribution, ShaderVariantCache, Texture, TextureHandle, TextureResidency,
        TextureResidencyTracker, TextureSampler, UniformBlock, material_uniform_block,
    };
}
