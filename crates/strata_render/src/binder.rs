//! Material Binder
//!
//! Writes a finalized [`Material`] into a [`UniformBlock`]: the GPU block goes
//! into the `{var}.data` variable and every bound texture into its named slot.
//!
//! Slot names follow the layout of the generated shader:
//!
//! | Slot | Name |
//! |------|------|
//! | GPU block | `{var}.data` |
//! | modifiers | `{var}.{normal,alpha,height,ambient}_map` |
//! | layer `i` | `{var}.layers[i].{albedo,roughness,extra_param}` |
//!
//! Names are resolved once per block layout and variable name into a
//! [`MaterialBindingLayout`] and reused for every subsequent bind.

use rustc_hash::FxHashMap;
use strata_core::{Result, StrataError};
use strata_resources::{MAX_LAYERS, Material, MaterialData, MaterialValue, TextureHandle};

use crate::settings::MaterialRenderSettings;
use crate::uniform_block::{CpuUniformBlock, UniformBlock};

const MODIFIER_SLOTS: [&str; 4] = ["normal_map", "alpha_map", "height_map", "ambient_map"];
const LAYER_SLOTS: [&str; 3] = ["albedo", "roughness", "extra_param"];

/// Texture slots of one layer. `None` when the block does not declare the slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerTextureSlots {
    pub albedo: Option<usize>,
    pub roughness: Option<usize>,
    pub extra_param: Option<usize>,
}

/// Resolved offsets and slots for one material variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialBindingLayout {
    pub data_offset: usize,
    pub normal_map: Option<usize>,
    pub alpha_map: Option<usize>,
    pub height_map: Option<usize>,
    pub ambient_map: Option<usize>,
    pub layers: [LayerTextureSlots; MAX_LAYERS],
}

impl MaterialBindingLayout {
    /// Resolves the slots of `var_name` in `block`.
    ///
    /// The data variable is required. Texture slots are optional: a shader
    /// variant only declares the slots its structure samples.
    pub fn resolve(block: &dyn UniformBlock, var_name: &str) -> Result<Self> {
        let data_name = format!("{var_name}.data");
        let data_offset =
            block.variable_offset(&data_name).ok_or_else(|| StrataError::UnknownVariable {
                block: block.label().to_string(),
                name: data_name,
            })?;

        let modifier = |slot: &str| block.texture_slot(&format!("{var_name}.{slot}"));
        let mut layers = [LayerTextureSlots::default(); MAX_LAYERS];
        for (i, layer) in layers.iter_mut().enumerate() {
            let slot = |name: &str| block.texture_slot(&format!("{var_name}.layers[{i}].{name}"));
            *layer = LayerTextureSlots {
                albedo: slot("albedo"),
                roughness: slot("roughness"),
                extra_param: slot("extra_param"),
            };
        }

        Ok(Self {
            data_offset,
            normal_map: modifier("normal_map"),
            alpha_map: modifier("alpha_map"),
            height_map: modifier("height_map"),
            ambient_map: modifier("ambient_map"),
            layers,
        })
    }

    /// Pairs every texture of `material` with the slot it binds to, in
    /// texture visit order. Textures without a declared slot are skipped.
    fn texture_bindings<'m>(&self, material: &'m Material) -> Vec<(usize, &'m TextureHandle)> {
        let mut bindings = Vec::new();
        let mut push = |slot: Option<usize>, value: &'m MaterialValue| {
            if let (Some(slot), Some(texture)) = (slot, value.texture.as_ref()) {
                bindings.push((slot, texture));
            }
        };

        push(self.normal_map, material.normal_value());
        push(self.alpha_map, material.alpha_value());
        push(self.height_map, material.height_value());
        push(self.ambient_map, material.ambient_value());

        for (i, slots) in self.layers.iter().enumerate() {
            let Some(values) = material.layer_values(i) else {
                break;
            };
            push(slots.albedo, &values.albedo);
            push(slots.roughness, &values.roughness);
            push(slots.extra_param, &values.extra_param);
        }
        bindings
    }
}

/// Builds a [`CpuUniformBlock`] declaring every slot a material variable can
/// use.
#[must_use]
pub fn material_uniform_block(label: &str, var_name: &str) -> CpuUniformBlock {
    let mut block = CpuUniformBlock::new(label)
        .with_variable(&format!("{var_name}.data"), size_of::<MaterialData>());
    for slot in MODIFIER_SLOTS {
        block = block.with_texture_slot(&format!("{var_name}.{slot}"));
    }
    for i in 0..MAX_LAYERS {
        for slot in LAYER_SLOTS {
            block = block.with_texture_slot(&format!("{var_name}.layers[{i}].{slot}"));
        }
    }
    block
}

/// Binds materials into parameter blocks, caching resolved layouts.
#[derive(Debug, Default)]
pub struct MaterialBinder {
    settings: MaterialRenderSettings,
    // (block layout id, variable name) -> layout
    layouts: FxHashMap<(u64, String), MaterialBindingLayout>,
}

impl MaterialBinder {
    #[must_use]
    pub fn new(settings: MaterialRenderSettings) -> Self {
        Self { settings, layouts: FxHashMap::default() }
    }

    #[must_use]
    pub fn settings(&self) -> &MaterialRenderSettings {
        &self.settings
    }

    /// Number of cached layouts.
    #[must_use]
    pub fn cached_layouts(&self) -> usize {
        self.layouts.len()
    }

    /// [`set_into_uniform_buffer`](Self::set_into_uniform_buffer) with the
    /// configured variable name.
    pub fn bind(&mut self, material: &Material, block: &mut dyn UniformBlock) -> Result<()> {
        let var_name = self.settings.material_var_name.clone();
        self.set_into_uniform_buffer(material, block, &var_name)
    }

    /// Writes `material` into `block` under `var_name`.
    ///
    /// Textures are validated before anything is written, so a rejected
    /// material leaves the block untouched. Each texture is bound with the
    /// material's sampler override, or its own sampler when there is none.
    pub fn set_into_uniform_buffer(
        &mut self,
        material: &Material,
        block: &mut dyn UniformBlock,
        var_name: &str,
    ) -> Result<()> {
        let key = (block.layout_id(), var_name.to_string());
        if !self.layouts.contains_key(&key) {
            let layout = MaterialBindingLayout::resolve(block, var_name)?;
            log::debug!(
                "Resolved material layout '{var_name}' in block '{}' (layout {})",
                block.label(),
                key.0
            );
            self.layouts.insert(key.clone(), layout);
        }
        let layout = &self.layouts[&key];

        let bindings = layout.texture_bindings(material);
        if self.settings.validate_texture_formats {
            for (_, texture) in &bindings {
                if !texture.is_rgb_sampleable() {
                    return Err(StrataError::UnsupportedTextureFormat {
                        texture: texture.name.clone(),
                        format: texture.format,
                    });
                }
            }
        }

        block.set_variable(layout.data_offset, &material.data_bytes())?;
        let sampler_override = material.sampler_override();
        for (slot, texture) in bindings {
            let sampler = sampler_override.map_or(&texture.sampler, |s| &**s);
            block.set_texture(slot, texture, sampler)?;
        }
        Ok(())
    }
}
