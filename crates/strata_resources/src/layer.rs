//! Shading layers.
//!
//! A layer is one BRDF/BSDF term. Its [`MaterialLayerDesc`] is the structural
//! part that selects shader code; its [`MaterialLayerValues`] is the payload
//! uploaded to the GPU. Only the descriptor takes part in structural identity.
//!
//! | Type         | `albedo`                     | `roughness` | `extra_param`             |
//! |--------------|------------------------------|-------------|---------------------------|
//! | `Lambert`    | base color (rgb)             | unused      | unused                    |
//! | `Conductor`  | specular color (rgb)         | `x`         | complex IOR (`x` + i`y`)  |
//! | `Dielectric` | transmission/reflection (rgb)| `x`         | IOR (`x`)                 |

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::value::MaterialValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LayerType {
    #[default]
    Lambert,
    Conductor,
    Dielectric,
}

impl LayerType {
    /// GPU encoding. Zero is reserved for "no layer".
    #[must_use]
    pub const fn gpu_code(self) -> u32 {
        match self {
            Self::Lambert => 1,
            Self::Conductor => 2,
            Self::Dielectric => 3,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Lambert => "lambert",
            Self::Conductor => "conductor",
            Self::Dielectric => "dielectric",
        }
    }

    /// Whether the layer defines a Fresnel term.
    #[must_use]
    pub const fn has_fresnel(self) -> bool {
        matches!(self, Self::Conductor | Self::Dielectric)
    }
}

/// How a layer composites over the result of the layers beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// Weighted by the layer's own Fresnel term. Only meaningful for
    /// conductors and dielectrics.
    #[default]
    Fresnel,
    /// `weight * layer + (1 - weight) * beneath`, weight from
    /// [`MaterialLayerValues::blend_weight`].
    ConstantWeight,
    /// `layer + beneath`
    Additive,
}

impl BlendMode {
    #[must_use]
    pub const fn gpu_code(self) -> u32 {
        match self {
            Self::Fresnel => 0,
            Self::ConstantWeight => 1,
            Self::Additive => 2,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fresnel => "fresnel",
            Self::ConstantWeight => "constant",
            Self::Additive => "additive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NormalDistribution {
    #[default]
    Ggx,
    Beckmann,
}

impl NormalDistribution {
    #[must_use]
    pub const fn gpu_code(self) -> u32 {
        match self {
            Self::Ggx => 0,
            Self::Beckmann => 1,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ggx => "ggx",
            Self::Beckmann => "beckmann",
        }
    }
}

/// Structural description of a layer.
///
/// Equal iff every field matches; the distribution is compared even for layer
/// types that ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MaterialLayerDesc {
    pub layer_type: LayerType,
    pub blend_mode: BlendMode,
    #[serde(default)]
    pub normal_distribution: NormalDistribution,
}

impl MaterialLayerDesc {
    #[must_use]
    pub fn new(layer_type: LayerType, blend_mode: BlendMode) -> Self {
        Self { layer_type, blend_mode, normal_distribution: NormalDistribution::Ggx }
    }

    #[must_use]
    pub fn lambert(blend_mode: BlendMode) -> Self {
        Self::new(LayerType::Lambert, blend_mode)
    }

    #[must_use]
    pub fn conductor(blend_mode: BlendMode, normal_distribution: NormalDistribution) -> Self {
        Self { layer_type: LayerType::Conductor, blend_mode, normal_distribution }
    }

    #[must_use]
    pub fn dielectric(blend_mode: BlendMode) -> Self {
        Self::new(LayerType::Dielectric, blend_mode)
    }
}

/// Numeric and texture payload of a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialLayerValues {
    pub albedo: MaterialValue,
    pub roughness: MaterialValue,
    pub extra_param: MaterialValue,
    pub blend_weight: f32,
}

impl Default for MaterialLayerValues {
    fn default() -> Self {
        Self {
            albedo: MaterialValue::constant(Vec4::ONE),
            roughness: MaterialValue::scalar(0.5),
            extra_param: MaterialValue::default(),
            blend_weight: 1.0,
        }
    }
}

impl MaterialLayerValues {
    #[must_use]
    pub fn with_albedo(albedo: MaterialValue) -> Self {
        Self { albedo, ..Default::default() }
    }

    /// Conductor payload with a complex index of refraction `ior_real + i * ior_imag`.
    #[must_use]
    pub fn conductor(albedo: Vec4, roughness: f32, ior_real: f32, ior_imag: f32) -> Self {
        Self {
            albedo: MaterialValue::constant(albedo),
            roughness: MaterialValue::scalar(roughness),
            extra_param: MaterialValue::constant(Vec4::new(ior_real, ior_imag, 0.0, 0.0)),
            blend_weight: 1.0,
        }
    }

    #[must_use]
    pub fn dielectric(albedo: Vec4, roughness: f32, ior: f32) -> Self {
        Self {
            albedo: MaterialValue::constant(albedo),
            roughness: MaterialValue::scalar(roughness),
            extra_param: MaterialValue::scalar(ior),
            blend_weight: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality_ignores_nothing() {
        let a = MaterialLayerDesc::conductor(BlendMode::Additive, NormalDistribution::Ggx);
        let b = MaterialLayerDesc::conductor(BlendMode::Additive, NormalDistribution::Beckmann);
        assert_ne!(a, b);
        assert_eq!(a, MaterialLayerDesc::conductor(BlendMode::Additive, NormalDistribution::Ggx));
    }

    #[test]
    fn desc_deserializes_with_default_distribution() {
        let json = r#"{ "layer_type": "Dielectric", "blend_mode": "Fresnel" }"#;
        let desc: MaterialLayerDesc = serde_json::from_str(json).unwrap();
        assert_eq!(desc, MaterialLayerDesc::dielectric(BlendMode::Fresnel));
    }
}
