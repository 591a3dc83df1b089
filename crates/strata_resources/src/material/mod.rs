//! Layered materials.
//!
//! A [`Material`] stacks up to [`MAX_LAYERS`] shading layers and four modifier
//! slots applied before shading:
//!
//! - `normal`: rotates the shading frame; only the texture is used
//! - `alpha`: alpha test, threshold in `constant_color.x`
//! - `height`: `h = constant_color.x + sample.x * constant_color.y`
//! - `ambient`: ambient occlusion
//!
//! Layers are evaluated last-to-first: the layer with the highest index is
//! shaded first and every lower index composites over the accumulated result
//! according to its own [`BlendMode`](crate::BlendMode).
//!
//! Two caches hang off each material, both recomputed lazily behind `&self`:
//!
//! 1. **Structural identifier** ([`Material::desc_identifier`]): shared with every
//!    material of the same shape through the [`MaterialContext`] registry.
//! 2. **Finalized GPU block** ([`Material::data`]): the energy-normalized
//!    [`MaterialData`] uploaded to the parameter block.
//!
//! Any mutation through `&mut self` invalidates the GPU block. Structural
//! mutations also release the identifier reference on the spot.

mod context;
mod desc;
mod gpu_data;
mod macros;
mod registry;

pub use context::MaterialContext;
pub use desc::{MaterialDesc, ModifierFlags};
pub use gpu_data::{DEFAULT_IOR, GpuLayerValues, MaterialData, fresnel_f0};
pub use registry::{DescId, DescriptorIdentityRegistry};

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::binding::TextureResidency;
use crate::layer::{MaterialLayerDesc, MaterialLayerValues};
use crate::shader_defines::ShaderDefines;
use crate::texture::{SamplerHandle, TextureHandle};
use crate::value::MaterialValue;

/// Maximum number of layers per material. Sizes the GPU block.
pub const MAX_LAYERS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MaterialLayer {
    pub desc: MaterialLayerDesc,
    pub values: MaterialLayerValues,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Modifiers {
    pub normal: MaterialValue,
    pub alpha: MaterialValue,
    pub height: MaterialValue,
    pub ambient: MaterialValue,
}

impl Modifiers {
    pub fn flags(&self) -> ModifierFlags {
        let mut flags = ModifierFlags::empty();
        flags.set(ModifierFlags::NORMAL_MAP, self.normal.has_texture());
        flags.set(ModifierFlags::ALPHA_MAP, self.alpha.has_texture());
        flags.set(ModifierFlags::HEIGHT_MAP, self.height.has_texture());
        flags.set(ModifierFlags::AMBIENT_MAP, self.ambient.has_texture());
        flags
    }

    /// Slots in texture-visit order.
    fn slots(&self) -> [&MaterialValue; 4] {
        [&self.normal, &self.alpha, &self.height, &self.ambient]
    }
}

#[derive(Debug)]
struct ResolvedDesc {
    id: DescId,
    generation: u64,
    // structure the id was acquired for
    desc: MaterialDesc,
}

#[derive(Debug, Default)]
struct DescCache {
    resolved: Option<ResolvedDesc>,
}

#[derive(Debug)]
pub struct Material {
    name: String,
    id: i32,
    layers: SmallVec<[MaterialLayer; MAX_LAYERS]>,
    modifiers: Modifiers,
    double_sided: bool,
    sampler_override: Option<SamplerHandle>,

    context: MaterialContext,
    desc_cache: Mutex<DescCache>,
    gpu_data: Mutex<Option<MaterialData>>,
}

macros::impl_modifier_api!(
    (normal,  "Normal map modifier. Only the texture is used."),
    (alpha,   "Alpha test modifier. `constant_color.x` is the threshold."),
    (height,  "Height map modifier. `constant_color.xy` are bias and scale."),
    (ambient, "Ambient occlusion modifier."),
);

impl Material {
    /// Creates an empty material, taking the next id from `context`.
    pub fn new(context: &MaterialContext, name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: context.next_material_id(),
            layers: SmallVec::new(),
            modifiers: Modifiers::default(),
            double_sided: false,
            sampler_override: None,
            context: context.clone(),
            desc_cache: Mutex::new(DescCache::default()),
            gpu_data: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    #[must_use]
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn set_id(&mut self, id: i32) {
        self.id = id;
        // the id is part of the GPU block, not of the structure
        self.invalidate_data();
    }

    #[must_use]
    pub fn context(&self) -> &MaterialContext {
        &self.context
    }

    fn invalidate_data(&mut self) {
        *self.gpu_data.get_mut() = None;
    }

    /// Drops the GPU block and, when the structure no longer matches the
    /// resolved one, releases the identifier reference right away.
    fn invalidate(&mut self) {
        self.invalidate_data();
        let desc = self.desc();
        let cache = self.desc_cache.get_mut();
        if cache.resolved.as_ref().is_some_and(|r| r.desc != desc)
            && let Some(previous) = cache.resolved.take()
        {
            self.context.release(previous.id, previous.generation);
        }
    }

    // ========================================================================
    // Layers
    // ========================================================================

    #[must_use]
    pub fn num_active_layers(&self) -> usize {
        self.layers.len()
    }

    /// Appends a layer. Returns `false` without touching the material when all
    /// [`MAX_LAYERS`] slots are taken.
    pub fn add_layer(&mut self, desc: MaterialLayerDesc, values: MaterialLayerValues) -> bool {
        if self.layers.len() >= MAX_LAYERS {
            log::debug!("Material '{}': layer limit ({MAX_LAYERS}) reached", self.name);
            return false;
        }
        self.layers.push(MaterialLayer { desc, values });
        self.invalidate();
        true
    }

    /// Removes the layer at `index`, shifting the following layers down.
    /// Out-of-range indices are ignored.
    pub fn remove_layer(&mut self, index: usize) {
        if index >= self.layers.len() {
            return;
        }
        self.layers.remove(index);
        self.invalidate();
    }

    #[must_use]
    pub fn layer_desc(&self, index: usize) -> Option<&MaterialLayerDesc> {
        self.layers.get(index).map(|l| &l.desc)
    }

    #[must_use]
    pub fn layer_values(&self, index: usize) -> Option<&MaterialLayerValues> {
        self.layers.get(index).map(|l| &l.values)
    }

    /// Replaces the structure of an existing layer. Returns `false` for an
    /// out-of-range index.
    pub fn set_layer_desc(&mut self, index: usize, desc: MaterialLayerDesc) -> bool {
        let Some(layer) = self.layers.get_mut(index) else {
            return false;
        };
        layer.desc = desc;
        self.invalidate();
        true
    }

    /// Replaces the payload of an existing layer. Returns `false` for an
    /// out-of-range index.
    pub fn set_layer_values(&mut self, index: usize, values: MaterialLayerValues) -> bool {
        let Some(layer) = self.layers.get_mut(index) else {
            return false;
        };
        layer.values = values;
        self.invalidate_data();
        true
    }

    // ========================================================================
    // Render state
    // ========================================================================

    /// Double-sided materials are drawn without culling; back faces shade with
    /// the flipped normal.
    #[must_use]
    pub fn is_double_sided(&self) -> bool {
        self.double_sided
    }

    pub fn set_double_sided(&mut self, double_sided: bool) {
        self.double_sided = double_sided;
        self.invalidate();
    }

    /// Replaces the sampler of every texture this material binds.
    pub fn override_all_samplers(&mut self, sampler: Option<SamplerHandle>) {
        self.sampler_override = sampler;
    }

    #[must_use]
    pub fn sampler_override(&self) -> Option<&SamplerHandle> {
        self.sampler_override.as_ref()
    }

    // ========================================================================
    // Finalization & GPU data
    // ========================================================================

    /// Validates the layers for energy conservation and caches the normalized
    /// GPU block. Repeated calls without mutation are no-ops.
    pub fn finalize(&self) {
        let mut data = self.gpu_data.lock();
        if data.is_none() {
            *data = Some(self.build_data());
        }
    }

    /// The finalized GPU block, finalizing first if needed.
    #[must_use]
    pub fn data(&self) -> MaterialData {
        *self.gpu_data.lock().get_or_insert_with(|| self.build_data())
    }

    /// Raw bytes of [`data`](Self::data), ready for upload.
    #[must_use]
    pub fn data_bytes(&self) -> Vec<u8> {
        self.data().as_bytes().to_vec()
    }

    fn build_data(&self) -> MaterialData {
        gpu_data::build_material_data(&self.layers, &self.modifiers, self.double_sided, self.id)
    }

    // ========================================================================
    // Structural identity
    // ========================================================================

    /// The structure of this material: layer descriptors, populated modifier
    /// slots and the double-sided flag.
    #[must_use]
    pub fn desc(&self) -> MaterialDesc {
        MaterialDesc {
            layers: self.layers.iter().map(|l| l.desc).collect(),
            modifiers: self.modifiers.flags(),
            double_sided: self.double_sided,
        }
    }

    /// Identifier shared by every material with the same structure.
    ///
    /// Served from cache until the structure changes or the context is
    /// reset. A structural mutation releases the previous reference
    /// immediately; a mutation that leaves the structure as it was keeps both
    /// the reference and the id.
    pub fn desc_identifier(&self) -> DescId {
        let mut cache = self.desc_cache.lock();
        let generation = self.context.generation();
        if let Some(resolved) = &cache.resolved
            && resolved.generation == generation
        {
            return resolved.id;
        }

        let desc = self.desc();
        let (id, generation) = self.context.acquire(&desc);
        if let Some(previous) = cache.resolved.take() {
            self.context.release(previous.id, previous.generation);
        }
        cache.resolved = Some(ResolvedDesc { id, generation, desc });
        id
    }

    /// Appends the WGSL declaration that statically specializes the shading
    /// program for this material's structure.
    pub fn material_desc_str(&self, shader_decl: &mut String) {
        self.desc().write_shader_decl(shader_decl);
    }

    #[must_use]
    pub fn shader_defines(&self) -> ShaderDefines {
        self.desc().shader_defines()
    }

    // ========================================================================
    // Textures
    // ========================================================================

    /// Visits every bound texture: modifiers first (normal, alpha, height,
    /// ambient), then each layer's albedo, roughness and extra parameter from
    /// layer 0 upward.
    pub fn visit_textures(&self, visitor: &mut dyn FnMut(&TextureHandle)) {
        for slot in self.modifiers.slots() {
            if let Some(texture) = &slot.texture {
                visitor(texture);
            }
        }
        for layer in &self.layers {
            let values = &layer.values;
            for slot in [&values.albedo, &values.roughness, &values.extra_param] {
                if let Some(texture) = &slot.texture {
                    visitor(texture);
                }
            }
        }
    }

    /// Appends every bound texture to `textures`, in [`visit_textures`]
    /// order. Duplicates are kept.
    ///
    /// [`visit_textures`]: Self::visit_textures
    pub fn active_textures(&self, textures: &mut Vec<TextureHandle>) {
        self.visit_textures(&mut |texture| textures.push(texture.clone()));
    }

    /// Makes every active texture resident in `backend`, paired with the
    /// sampler override when one is set.
    pub fn bind_textures(&self, backend: &mut dyn TextureResidency) {
        let sampler = self.sampler_override.as_ref();
        self.visit_textures(&mut |texture| backend.bind_texture(texture, sampler));
    }

    pub fn unload_textures(&self, backend: &mut dyn TextureResidency) {
        self.visit_textures(&mut |texture| backend.unload_texture(texture));
    }
}

/// Payload equality: layers in order, modifiers and the double-sided flag.
/// Name and id are not compared.
impl PartialEq for Material {
    fn eq(&self, other: &Self) -> bool {
        self.layers == other.layers
            && self.modifiers == other.modifiers
            && self.double_sided == other.double_sided
    }
}

impl Drop for Material {
    fn drop(&mut self) {
        if let Some(resolved) = self.desc_cache.get_mut().resolved.take() {
            self.context.release(resolved.id, resolved.generation);
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec4;

    use super::*;
    use crate::layer::{BlendMode, NormalDistribution};
    use crate::texture::Texture;

    fn texture(name: &str) -> TextureHandle {
        TextureHandle::new(Texture::solid_color(name))
    }

    #[test]
    fn ids_increase_per_context() {
        let ctx = MaterialContext::new();
        let a = Material::new(&ctx, "a");
        let b = Material::new(&ctx, "b");
        assert_eq!(b.id(), a.id() + 1);

        let other = MaterialContext::new();
        assert_eq!(Material::new(&other, "c").id(), 0);
    }

    #[test]
    fn layer_edits_invalidate_gpu_data() {
        let ctx = MaterialContext::new();
        let mut mat = Material::new(&ctx, "edit");
        let lambert = MaterialLayerDesc::lambert(BlendMode::Additive);
        mat.add_layer(lambert, MaterialLayerValues::default());
        let before = mat.data();

        let albedo = MaterialValue::constant(Vec4::new(0.2, 0.3, 0.4, 1.0));
        let values = MaterialLayerValues::with_albedo(albedo);
        assert!(mat.set_layer_values(0, values));
        assert_ne!(before, mat.data());
        assert!(!mat.set_layer_values(5, MaterialLayerValues::default()));
    }

    #[test]
    fn set_id_keeps_structure_cached() {
        let ctx = MaterialContext::new();
        let mut mat = Material::new(&ctx, "id");
        let desc_id = mat.desc_identifier();
        mat.set_id(42);
        assert_eq!(mat.data().header.y, 42);
        assert_eq!(mat.desc_identifier(), desc_id);
        assert_eq!(ctx.ref_count(desc_id), Some(1));
    }

    #[test]
    fn texture_visit_order() {
        let ctx = MaterialContext::new();
        let mut mat = Material::new(&ctx, "order");
        let (ambient, normal) = (texture("ao"), texture("n"));
        let (albedo, extra) = (texture("a"), texture("x"));

        mat.set_ambient_value(MaterialValue::textured(Vec4::ONE, ambient.clone()));
        mat.set_normal_value(MaterialValue::textured(Vec4::ONE, normal.clone()));
        let mut values =
            MaterialLayerValues::with_albedo(MaterialValue::textured(Vec4::ONE, albedo.clone()));
        values.extra_param = MaterialValue::textured(Vec4::ONE, extra.clone());
        let conductor = MaterialLayerDesc::conductor(BlendMode::Fresnel, NormalDistribution::Ggx);
        mat.add_layer(conductor, values);

        let mut textures = Vec::new();
        mat.active_textures(&mut textures);
        assert_eq!(textures, vec![normal, ambient, albedo, extra]);
    }

    #[test]
    fn dropped_material_releases_identifier() {
        let ctx = MaterialContext::new();
        let id = {
            let mat = Material::new(&ctx, "temp");
            mat.desc_identifier()
        };
        assert_eq!(ctx.ref_count(id), None);
        assert_eq!(ctx.distinct_descriptors(), 0);
    }

    #[test]
    fn context_reset_forces_reresolution() {
        let ctx = MaterialContext::new();
        let mat = Material::new(&ctx, "reload");
        let before = mat.desc_identifier();

        ctx.reset();
        assert_eq!(ctx.distinct_descriptors(), 0);

        let after = mat.desc_identifier();
        assert_ne!(before, after);
        assert_eq!(ctx.ref_count(after), Some(1));
        assert_eq!(Material::new(&ctx, "fresh").id(), 0);
    }

    #[test]
    fn structural_edit_releases_identifier() {
        let ctx = MaterialContext::new();
        let mut mat = Material::new(&ctx, "grow");
        let lambert = MaterialLayerDesc::lambert(BlendMode::Additive);
        mat.add_layer(lambert, MaterialLayerValues::default());
        let old = mat.desc_identifier();

        mat.add_layer(lambert, MaterialLayerValues::default());
        assert_eq!(ctx.ref_count(old), None);
        assert_eq!(ctx.distinct_descriptors(), 0);

        let new = mat.desc_identifier();
        assert_ne!(new, old);
        assert_eq!(ctx.ref_count(new), Some(1));
    }

    #[test]
    fn payload_edit_holds_identifier() {
        let ctx = MaterialContext::new();
        let mut mat = Material::new(&ctx, "tint");
        let lambert = MaterialLayerDesc::lambert(BlendMode::Additive);
        mat.add_layer(lambert, MaterialLayerValues::default());
        let id = mat.desc_identifier();

        let tint = MaterialValue::constant(Vec4::new(0.5, 0.1, 0.1, 1.0));
        mat.set_layer_values(0, MaterialLayerValues::with_albedo(tint));
        mat.set_double_sided(false);
        assert_eq!(ctx.ref_count(id), Some(1));
        assert_eq!(mat.desc_identifier(), id);
    }
}
