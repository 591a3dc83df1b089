//! Shader Variant Cache
//!
//! Generates one WGSL variant per structural descriptor. Materials sharing a
//! [`DescId`] share the variant, so the template only renders the first time a
//! structure is seen.
//!
//! Templates use a custom minijinja syntax that stays out of the way of WGSL:
//!
//! | Construct | Syntax |
//! |-----------|--------|
//! | block | `{$ ... $}` |
//! | variable | `{{ ... }}` |
//! | line statement | `$$ if ...` |

use std::borrow::Cow;
use std::collections::BTreeMap;

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, Error, ErrorKind, UndefinedBehavior};
use rust_embed::RustEmbed;
use rustc_hash::FxHashMap;
use serde::Serialize;
use strata_core::{Result, StrataError};
use strata_resources::{
    BlendMode, DescId, MAX_LAYERS, Material, MaterialContext, MaterialDesc, ModifierFlags,
    ShaderDefines,
};
use xxhash_rust::xxh3::xxh3_128;

use crate::settings::MaterialRenderSettings;

/// Bind group the generated material bindings live in.
pub const MATERIAL_BIND_GROUP: u32 = 1;

#[derive(RustEmbed)]
#[folder = "src/shaders"]
struct ShaderAssets;

fn shader_loader(name: &str) -> std::result::Result<Option<String>, Error> {
    let filename = if std::path::Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wgsl"))
    {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{name}.wgsl"))
    };

    let Some(file) = ShaderAssets::get(&filename) else {
        return Ok(None);
    };
    match std::str::from_utf8(file.data.as_ref()) {
        Ok(source) => Ok(Some(source.to_string())),
        Err(e) => Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("{filename} is not UTF-8: {e}"),
        )),
    }
}

fn template_error(template: &str, err: &Error) -> StrataError {
    if err.kind() == ErrorKind::TemplateNotFound {
        StrataError::TemplateNotFound(template.to_string())
    } else {
        StrataError::ShaderTemplate(format!("{template}: {err:#}"))
    }
}

#[derive(Serialize)]
struct LayerContext {
    index: usize,
    layer_type: &'static str,
    blend: &'static str,
    ndf: &'static str,
}

#[derive(Serialize)]
struct TextureBinding {
    ident: String,
    binding: u32,
}

#[derive(Serialize)]
struct VariantContext<'a> {
    #[serde(flatten)]
    defines: BTreeMap<String, String>,
    material_decl: &'a str,
    var_name: &'a str,
    group: u32,
    max_layers: usize,
    layers: Vec<LayerContext>,
    textures: Vec<TextureBinding>,
}

impl VariantContext<'_> {
    fn layers(desc: &MaterialDesc) -> Vec<LayerContext> {
        desc.layers
            .iter()
            .enumerate()
            .map(|(index, layer)| {
                // Lambert has no Fresnel term; its GPU weight is the constant one
                let blend = match layer.blend_mode {
                    BlendMode::Fresnel if !layer.layer_type.has_fresnel() => {
                        BlendMode::ConstantWeight
                    }
                    mode => mode,
                };
                LayerContext {
                    index,
                    layer_type: layer.layer_type.name(),
                    blend: blend.name(),
                    ndf: layer.normal_distribution.name(),
                }
            })
            .collect()
    }

    /// Texture and sampler pairs after the uniform at binding 0.
    fn textures(desc: &MaterialDesc) -> Vec<TextureBinding> {
        let modifiers = [
            (ModifierFlags::NORMAL_MAP, "normal_map"),
            (ModifierFlags::ALPHA_MAP, "alpha_map"),
            (ModifierFlags::HEIGHT_MAP, "height_map"),
            (ModifierFlags::AMBIENT_MAP, "ambient_map"),
        ];
        let mut idents: Vec<String> = modifiers
            .iter()
            .filter(|(flag, _)| desc.modifiers.contains(*flag))
            .map(|(_, name)| (*name).to_string())
            .collect();
        for i in 0..desc.layers.len() {
            let slots = ["albedo", "roughness", "extra_param"];
            idents.extend(slots.map(|slot| format!("layer{i}_{slot}")));
        }

        idents
            .into_iter()
            .zip((1u32..).step_by(2))
            .map(|(ident, binding)| TextureBinding { ident, binding })
            .collect()
    }
}

/// A generated shader variant.
#[derive(Debug, Clone)]
pub struct ShaderVariant {
    pub desc_id: DescId,
    pub defines: ShaderDefines,
    pub source: String,
    /// xxh3-128 of `source`.
    pub source_hash: u128,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VariantCacheStats {
    pub hits: u64,
    pub misses: u64,
}

pub struct ShaderVariantCache {
    env: Environment<'static>,
    settings: MaterialRenderSettings,
    variants: FxHashMap<DescId, ShaderVariant>,
    stats: VariantCacheStats,
}

impl ShaderVariantCache {
    pub fn new(settings: MaterialRenderSettings) -> Result<Self> {
        let syntax = SyntaxConfig::builder()
            .block_delimiters("{$", "$}")
            .variable_delimiters("{{", "}}")
            .line_statement_prefix("$$")
            .build()
            .map_err(|e| StrataError::ShaderTemplate(format!("invalid template syntax: {e}")))?;

        let mut env = Environment::new();
        env.set_syntax(syntax);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_undefined_behavior(UndefinedBehavior::SemiStrict);
        env.set_loader(shader_loader);

        Ok(Self {
            env,
            settings,
            variants: FxHashMap::default(),
            stats: VariantCacheStats::default(),
        })
    }

    /// Returns the variant for `material`'s structure, rendering it on first
    /// use.
    pub fn get_or_generate(&mut self, material: &Material) -> Result<&ShaderVariant> {
        let desc_id = material.desc_identifier();
        if self.variants.contains_key(&desc_id) {
            self.stats.hits += 1;
            log::trace!("Shader variant cache hit for {desc_id}");
            return Ok(&self.variants[&desc_id]);
        }

        self.stats.misses += 1;
        let variant = self.generate(material, desc_id)?;
        log::debug!(
            "Generated shader variant for {desc_id} ({} bytes, hash {:032x})",
            variant.source.len(),
            variant.source_hash
        );
        Ok(self.variants.entry(desc_id).or_insert(variant))
    }

    fn generate(&self, material: &Material, desc_id: DescId) -> Result<ShaderVariant> {
        let desc = material.desc();
        let defines = desc.shader_defines();
        let mut material_decl = String::new();
        desc.write_shader_decl(&mut material_decl);

        let ctx = VariantContext {
            defines: defines.to_map(),
            material_decl: &material_decl,
            var_name: &self.settings.material_var_name,
            group: MATERIAL_BIND_GROUP,
            max_layers: MAX_LAYERS,
            layers: VariantContext::layers(&desc),
            textures: VariantContext::textures(&desc),
        };

        let name = &self.settings.shader_template;
        let template = self.env.get_template(name).map_err(|e| template_error(name, &e))?;
        let source = template.render(&ctx).map_err(|e| template_error(name, &e))?;
        let source_hash = xxh3_128(source.as_bytes());

        Ok(ShaderVariant { desc_id, defines, source, source_hash })
    }

    #[must_use]
    pub fn get(&self, desc_id: DescId) -> Option<&ShaderVariant> {
        self.variants.get(&desc_id)
    }

    /// Drops variants whose structure no material in `context` uses anymore.
    pub fn retain_live(&mut self, context: &MaterialContext) {
        let before = self.variants.len();
        self.variants.retain(|id, _| context.ref_count(*id).is_some());
        let dropped = before - self.variants.len();
        if dropped > 0 {
            log::debug!("Dropped {dropped} unused shader variants");
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> VariantCacheStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.variants.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_resources::{
        MaterialLayerDesc, MaterialLayerValues, MaterialValue, NormalDistribution, Texture,
        TextureHandle,
    };

    fn two_layer(ctx: &MaterialContext, name: &str) -> Material {
        let mut mat = Material::new(ctx, name);
        mat.add_layer(
            MaterialLayerDesc::dielectric(BlendMode::Fresnel),
            MaterialLayerValues::dielectric(glam::Vec4::ONE, 0.1, 1.5),
        );
        mat.add_layer(
            MaterialLayerDesc::conductor(BlendMode::Additive, NormalDistribution::Beckmann),
            MaterialLayerValues::conductor(glam::Vec4::splat(0.9), 0.4, 0.2, 3.0),
        );
        mat
    }

    #[test]
    fn shared_structure_hits_cache() {
        let ctx = MaterialContext::new();
        let a = two_layer(&ctx, "a");
        let mut b = two_layer(&ctx, "b");
        b.set_layer_values(0, MaterialLayerValues::dielectric(glam::Vec4::ONE, 0.8, 1.33));

        let mut cache = ShaderVariantCache::new(MaterialRenderSettings::default()).unwrap();
        let hash = cache.get_or_generate(&a).unwrap().source_hash;
        assert_eq!(cache.get_or_generate(&b).unwrap().source_hash, hash);
        assert_eq!(cache.stats(), VariantCacheStats { hits: 1, misses: 1 });
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn generated_source_follows_structure() {
        let ctx = MaterialContext::new();
        let mut mat = two_layer(&ctx, "glass_over_metal");
        let normal = TextureHandle::new(Texture::solid_color("normal"));
        mat.set_normal_value(MaterialValue::textured(glam::Vec4::ONE, normal));

        let mut cache = ShaderVariantCache::new(MaterialRenderSettings::default()).unwrap();
        let source = &cache.get_or_generate(&mat).unwrap().source;

        assert!(source.contains("const MAT_LAYER_COUNT: u32 = 2u;"));
        assert!(source.contains("var<uniform> material: MaterialData;"));
        assert!(source.contains("var t_normal_map: texture_2d<f32>;"));
        assert!(!source.contains("t_alpha_map"));
        assert!(source.contains("ndf_beckmann(saturate"));
        assert!(source.contains("fn layer1_response"));
        assert!(!source.contains("fn layer2_response"));
    }

    #[test]
    fn missing_template_is_reported() {
        let settings = MaterialRenderSettings {
            shader_template: "no_such_template".to_string(),
            ..Default::default()
        };
        let ctx = MaterialContext::new();
        let mat = Material::new(&ctx, "empty");

        let mut cache = ShaderVariantCache::new(settings).unwrap();
        let err = cache.get_or_generate(&mat).unwrap_err();
        assert!(matches!(err, StrataError::TemplateNotFound(name) if name == "no_such_template"));
    }

    #[test]
    fn retain_live_drops_orphaned_variants() {
        let ctx = MaterialContext::new();
        let mut cache = ShaderVariantCache::new(MaterialRenderSettings::default()).unwrap();
        {
            let mat = two_layer(&ctx, "temporary");
            cache.get_or_generate(&mat).unwrap();
        }
        assert_eq!(cache.len(), 1);
        cache.retain_live(&ctx);
        assert!(cache.is_empty());
    }
}
