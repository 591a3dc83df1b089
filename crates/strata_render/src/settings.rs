//! Material Render Settings
//!
//! Runtime configuration for the binding adapter and the shader variant cache.
//!
//! ```rust,ignore
//! use strata_render::MaterialRenderSettings;
//!
//! let settings = MaterialRenderSettings {
//!     material_var_name: "surface".to_string(),
//!     ..Default::default()
//! };
//! ```

/// Configuration shared by [`MaterialBinder`](crate::MaterialBinder) and
/// [`ShaderVariantCache`](crate::ShaderVariantCache).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialRenderSettings {
    /// Name of the material variable in the parameter block. Slots are
    /// resolved as `{name}.data`, `{name}.normal_map`, `{name}.layers[i].albedo`, ...
    pub material_var_name: String,

    /// Template rendered for every shader variant.
    pub shader_template: String,

    /// Reject textures that cannot be sampled as RGB when binding.
    /// Default: `true`.
    pub validate_texture_formats: bool,
}

impl Default for MaterialRenderSettings {
    fn default() -> Self {
        Self {
            material_var_name: "material".to_string(),
            shader_template: "material_layers".to_string(),
            validate_texture_formats: true,
        }
    }
}
