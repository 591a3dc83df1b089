//! Material Inspector
//!
//! Builds the material presets from `presets.json`, adds a normal-mapped
//! variant of each, then reports per material:
//!
//! - the energy-normalized GPU layers
//! - the structural identifier and how many materials share it
//! - the generated shader variant
//!
//! Run with `RUST_LOG=debug` to watch registry and variant-cache activity.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use strata::prelude::*;
use strata::{DescId, MaterialData};

const PRESETS: &str = include_str!("presets.json");

#[derive(Debug, Deserialize)]
struct LayerPreset {
    desc: MaterialLayerDesc,
    albedo: [f32; 4],
    #[serde(default)]
    roughness: f32,
    #[serde(default)]
    extra: [f32; 2],
    #[serde(default = "default_weight")]
    weight: f32,
}

fn default_weight() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
struct MaterialPreset {
    name: String,
    #[serde(default)]
    double_sided: bool,
    layers: Vec<LayerPreset>,
}

impl MaterialPreset {
    fn build(&self, ctx: &MaterialContext) -> Material {
        let mut mat = Material::new(ctx, &self.name);
        mat.set_double_sided(self.double_sided);
        for layer in &self.layers {
            let [extra_x, extra_y] = layer.extra;
            let values = MaterialLayerValues {
                albedo: MaterialValue::constant(Vec4::from_array(layer.albedo)),
                roughness: MaterialValue::scalar(layer.roughness),
                extra_param: MaterialValue::constant(Vec4::new(extra_x, extra_y, 0.0, 0.0)),
                blend_weight: layer.weight,
            };
            if !mat.add_layer(layer.desc, values) {
                log::warn!("Preset '{}': dropped layers beyond the limit", self.name);
                break;
            }
        }
        mat
    }
}

fn print_layers(data: &MaterialData) {
    for (i, layer) in data.layers.iter().take(data.layer_count() as usize).enumerate() {
        let desc = data.layer_descs[i];
        println!(
            "    layer {i}: type {} blend {} | albedo ({:.3}, {:.3}, {:.3}) \
             roughness {:.2} weight {:.3} f0 {:.3}",
            desc.x,
            desc.z,
            layer.albedo.x,
            layer.albedo.y,
            layer.albedo.z,
            layer.roughness.x,
            layer.params.x,
            layer.params.y,
        );
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let presets: Vec<MaterialPreset> =
        serde_json::from_str(PRESETS).context("parsing presets.json")?;
    let ctx = MaterialContext::new();
    strata::interner::preload_material_defines();

    let normal_map = TextureHandle::new(Texture::new_2d(
        "detail_normal",
        512,
        512,
        wgpu::TextureFormat::Rgba8Unorm,
    ));
    let mut materials: Vec<Material> = presets.iter().map(|p| p.build(&ctx)).collect();
    for preset in &presets {
        let mut mat = preset.build(&ctx);
        mat.set_name(&format!("{}_detailed", preset.name));
        mat.set_normal_value(MaterialValue::textured(Vec4::ONE, normal_map.clone()));
        mat.override_all_samplers(Some(Arc::new(TextureSampler::point())));
        materials.push(mat);
    }

    let mut binder = MaterialBinder::default();
    let mut variants = ShaderVariantCache::new(MaterialRenderSettings::default())?;
    let mut residency = TextureResidencyTracker::new();
    let mut block = material_uniform_block("inspector", &binder.settings().material_var_name);

    for mat in &materials {
        mat.finalize();
        let desc_id: DescId = mat.desc_identifier();
        let data = mat.data();

        println!(
            "{} (id {}) -> {desc_id} shared by {} material(s)",
            mat.name(),
            mat.id(),
            ctx.ref_count(desc_id).unwrap_or(0)
        );
        print_layers(&data);

        binder
            .bind(mat, &mut block)
            .with_context(|| format!("binding '{}'", mat.name()))?;
        mat.bind_textures(&mut residency);

        let variant = variants.get_or_generate(mat)?;
        println!(
            "    variant: {} lines, hash {:032x}",
            variant.source.lines().count(),
            variant.source_hash
        );
    }

    let stats = variants.stats();
    println!(
        "\n{} materials, {} distinct structures, {} variants ({} hits / {} misses), \
         {} resident textures",
        materials.len(),
        ctx.distinct_descriptors(),
        variants.len(),
        stats.hits,
        stats.misses,
        residency.len()
    );

    for mat in &materials {
        mat.unload_textures(&mut residency);
    }
    drop(materials);
    variants.retain_live(&ctx);
    log::info!(
        "After unloading: {} structures, {} variants",
        ctx.distinct_descriptors(),
        variants.len()
    );

    Ok(())
}

