//! Strata Resources
//!
//! CPU-side definitions for the layered material model:
//!
//! - [`texture`]: texture assets, samplers and shared handles
//! - [`value`]: [`MaterialValue`], a constant with an optional texture modulator
//! - [`layer`]: layer structure ([`MaterialLayerDesc`]) and payload ([`MaterialLayerValues`])
//! - [`material`]: [`Material`], structural descriptors and their identity registry
//! - [`shader_defines`]: interned define sets for shader variant generation
//! - [`binding`]: the [`TextureResidency`] backend interface

pub mod binding;
pub mod layer;
pub mod material;
pub mod shader_defines;
pub mod texture;
pub mod value;

pub use binding::TextureResidency;
pub use layer::{BlendMode, LayerType, MaterialLayerDesc, MaterialLayerValues, NormalDistribution};
pub use material::{
    DEFAULT_IOR, DescId, DescriptorIdentityRegistry, GpuLayerValues, MAX_LAYERS, Material,
    MaterialContext, MaterialData, MaterialDesc, ModifierFlags, fresnel_f0,
};
pub use shader_defines::ShaderDefines;
pub use texture::{SamplerHandle, Texture, TextureHandle, TextureSampler};
pub use value::MaterialValue;
