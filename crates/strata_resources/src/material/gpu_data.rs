//! GPU-resident material block and energy-conservation normalization.
//!
//! [`MaterialData`] is uploaded verbatim into the material parameter block.
//! Every row is a 16-byte vector so the layout matches WGSL uniform rules
//! without padding fields.
//!
//! # Normalization
//!
//! Layers are evaluated last-to-first, so layer 0 is the outermost and sees
//! all incident light. Walking from layer 0 inward with an energy budget of 1:
//!
//! - each layer's albedo is scaled so its largest RGB component fits the budget
//! - `Additive` layers spend their albedo from the budget left for deeper layers
//! - `ConstantWeight` and `Fresnel` layers are convex blends and pass the budget
//!   through unchanged
//!
//! `Fresnel` weights are not stored; they are the Fresnel reflectance at normal
//! incidence computed from the layer's index of refraction.

use bytemuck::{Pod, Zeroable};
use glam::{UVec4, Vec3, Vec4};

use super::{MAX_LAYERS, MaterialLayer, Modifiers};
use crate::layer::{BlendMode, LayerType, MaterialLayerDesc};

/// Index of refraction assumed when a layer stores a non-positive one.
pub const DEFAULT_IOR: f32 = 1.5;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuLayerValues {
    pub albedo: Vec4,
    pub roughness: Vec4,
    pub extra_param: Vec4,
    /// x: effective blend weight, y: Fresnel reflectance at normal incidence
    pub params: Vec4,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MaterialData {
    /// x: active layers, y: material id, z: double sided, w: modifier bits
    pub header: UVec4,
    /// Per layer: type, distribution, blend mode, unused
    pub layer_descs: [UVec4; MAX_LAYERS],
    pub layers: [GpuLayerValues; MAX_LAYERS],
    pub normal_map: Vec4,
    pub alpha_map: Vec4,
    pub height_map: Vec4,
    pub ambient_map: Vec4,
}

impl MaterialData {
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    #[inline]
    #[must_use]
    pub fn layer_count(&self) -> u32 {
        self.header.x
    }
}

/// Fresnel reflectance at normal incidence.
///
/// Dielectrics use `((n - 1) / (n + 1))^2`; conductors use the complex index
/// `n + ik` from `extra_param.xy`. Lambert layers have no Fresnel term.
#[must_use]
pub fn fresnel_f0(layer_type: LayerType, extra_param: Vec4) -> f32 {
    let n = if extra_param.x > 0.0 { extra_param.x } else { DEFAULT_IOR };
    match layer_type {
        LayerType::Lambert => 0.0,
        LayerType::Dielectric => {
            let r = (n - 1.0) / (n + 1.0);
            r * r
        }
        LayerType::Conductor => {
            let k2 = extra_param.y * extra_param.y;
            ((n - 1.0) * (n - 1.0) + k2) / ((n + 1.0) * (n + 1.0) + k2)
        }
    }
}

fn effective_weight(desc: &MaterialLayerDesc, blend_weight: f32, f0: f32, index: usize) -> f32 {
    match desc.blend_mode {
        BlendMode::Additive => 1.0,
        BlendMode::ConstantWeight => blend_weight.clamp(0.0, 1.0),
        BlendMode::Fresnel if desc.layer_type.has_fresnel() => f0,
        BlendMode::Fresnel => {
            log::warn!(
                "Layer {index}: Fresnel blending on a {} layer, using its constant weight",
                desc.layer_type.name()
            );
            blend_weight.clamp(0.0, 1.0)
        }
    }
}

fn pack_layer_desc(desc: &MaterialLayerDesc) -> UVec4 {
    UVec4::new(
        desc.layer_type.gpu_code(),
        desc.normal_distribution.gpu_code(),
        desc.blend_mode.gpu_code(),
        0,
    )
}

/// Builds the normalized GPU block. Pure function of its inputs.
pub(crate) fn build_material_data(
    layers: &[MaterialLayer],
    modifiers: &Modifiers,
    double_sided: bool,
    material_id: i32,
) -> MaterialData {
    let mut data = MaterialData::zeroed();
    data.header = UVec4::new(
        layers.len() as u32,
        material_id as u32,
        u32::from(double_sided),
        modifiers.flags().bits(),
    );

    let mut budget = 1.0_f32;
    for (i, layer) in layers.iter().enumerate() {
        let values = &layer.values;
        let f0 = fresnel_f0(layer.desc.layer_type, values.extra_param.constant_color);
        let weight = effective_weight(&layer.desc, values.blend_weight, f0, i);

        let source = values.albedo.constant_color;
        let mut rgb = source.truncate().max(Vec3::ZERO);
        let peak = rgb.max_element();
        if peak > budget {
            rgb *= budget / peak;
        }
        if layer.desc.blend_mode == BlendMode::Additive {
            budget = (budget - rgb.max_element()).max(0.0);
        }

        let mut roughness = values.roughness.constant_color;
        roughness.x = roughness.x.clamp(0.0, 1.0);

        data.layer_descs[i] = pack_layer_desc(&layer.desc);
        data.layers[i] = GpuLayerValues {
            albedo: rgb.extend(source.w),
            roughness,
            extra_param: values.extra_param.constant_color,
            params: Vec4::new(weight, f0, 0.0, 0.0),
        };
    }

    data.normal_map = modifiers.normal.constant_color;
    data.alpha_map = modifiers.alpha.constant_color;
    data.height_map = modifiers.height.constant_color;
    data.ambient_map = modifiers.ambient.constant_color;
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{MaterialLayerValues, NormalDistribution};
    use crate::value::MaterialValue;

    fn layer(desc: MaterialLayerDesc, albedo: Vec4) -> MaterialLayer {
        let values = MaterialLayerValues::with_albedo(MaterialValue::constant(albedo));
        MaterialLayer { desc, values }
    }

    #[test]
    fn dielectric_f0_matches_glass() {
        let f0 = fresnel_f0(LayerType::Dielectric, Vec4::new(1.5, 0.0, 0.0, 0.0));
        assert!((f0 - 0.04).abs() < 1e-6);
        // non-positive IOR falls back to the default
        assert_eq!(f0, fresnel_f0(LayerType::Dielectric, Vec4::ZERO));
    }

    #[test]
    fn conductor_f0_uses_extinction() {
        let plain = fresnel_f0(LayerType::Conductor, Vec4::new(0.2, 0.0, 0.0, 0.0));
        let gold = fresnel_f0(LayerType::Conductor, Vec4::new(0.2, 3.0, 0.0, 0.0));
        assert!(gold > plain);
        assert!(gold < 1.0);
    }

    #[test]
    fn additive_layers_share_one_budget() {
        let layers = [
            layer(
                MaterialLayerDesc::conductor(BlendMode::Additive, NormalDistribution::Ggx),
                Vec4::splat(0.75),
            ),
            layer(MaterialLayerDesc::lambert(BlendMode::Additive), Vec4::new(0.8, 0.4, 0.2, 1.0)),
        ];
        let data = build_material_data(&layers, &Modifiers::default(), false, 7);

        let total = data.layers[0].albedo.truncate().max_element()
            + data.layers[1].albedo.truncate().max_element();
        assert!(total <= 1.0 + 1e-6);
        // color ratios survive the scaling
        let base = data.layers[1].albedo;
        assert!((base.x / base.y - 2.0).abs() < 1e-5);
        assert_eq!(data.header, UVec4::new(2, 7, 0, 0));
    }

    #[test]
    fn constant_weight_is_clamped_and_keeps_budget() {
        let mut top =
            layer(MaterialLayerDesc::lambert(BlendMode::ConstantWeight), Vec4::splat(0.9));
        top.values.blend_weight = 1.7;
        let base = layer(MaterialLayerDesc::lambert(BlendMode::Additive), Vec4::splat(0.9));
        let data = build_material_data(&[top, base], &Modifiers::default(), false, 0);

        assert_eq!(data.layers[0].params.x, 1.0);
        assert_eq!(data.layers[1].albedo.truncate(), Vec3::splat(0.9));
    }

    #[test]
    fn inactive_rows_are_zero() {
        let layers = [layer(MaterialLayerDesc::lambert(BlendMode::Additive), Vec4::splat(0.5))];
        let data = build_material_data(&layers, &Modifiers::default(), true, 0);
        assert_eq!(data.layer_descs[1], UVec4::ZERO);
        assert_eq!(data.layers[2], GpuLayerValues::default());
        assert_eq!(data.header.z, 1);
    }
}
