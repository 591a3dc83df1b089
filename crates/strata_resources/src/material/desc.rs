//! Structural material descriptors.

use std::fmt::Write as _;

use bitflags::bitflags;
use smallvec::SmallVec;

use super::MAX_LAYERS;
use crate::layer::MaterialLayerDesc;
use crate::shader_defines::ShaderDefines;

bitflags! {
    /// Which modifier slots carry a texture.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct ModifierFlags: u32 {
        const NORMAL_MAP  = 1 << 0;
        const ALPHA_MAP   = 1 << 1;
        const HEIGHT_MAP  = 1 << 2;
        const AMBIENT_MAP = 1 << 3;
    }
}

/// The shading structure of a material, independent of its numeric payload.
///
/// Two materials that produce equal descriptors can share a compiled shader
/// variant. Only equality is defined: there is no ordering or hash, and the
/// identity registry looks descriptors up by linear scan.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MaterialDesc {
    pub layers: SmallVec<[MaterialLayerDesc; MAX_LAYERS]>,
    pub modifiers: ModifierFlags,
    pub double_sided: bool,
}

impl MaterialDesc {
    /// Appends the WGSL constants that specialize the layered shading program
    /// for this structure.
    pub fn write_shader_decl(&self, out: &mut String) {
        // `write!` into a String cannot fail
        let _ = writeln!(out, "// material layers: {}", self.layers.len());
        let _ = writeln!(out, "const MAT_LAYER_COUNT: u32 = {}u;", self.layers.len());
        for (i, layer) in self.layers.iter().enumerate() {
            let _ = writeln!(
                out,
                "const MAT_LAYER{i}_TYPE: u32 = {}u; // {}",
                layer.layer_type.gpu_code(),
                layer.layer_type.name()
            );
            let _ = writeln!(
                out,
                "const MAT_LAYER{i}_BLEND: u32 = {}u; // {}",
                layer.blend_mode.gpu_code(),
                layer.blend_mode.name()
            );
            let _ = writeln!(
                out,
                "const MAT_LAYER{i}_NDF: u32 = {}u; // {}",
                layer.normal_distribution.gpu_code(),
                layer.normal_distribution.name()
            );
        }
        for (name, flag) in Self::modifier_names() {
            let _ = writeln!(out, "const {name}: bool = {};", self.modifiers.contains(flag));
        }
        let _ = writeln!(out, "const MAT_DOUBLE_SIDED: bool = {};", self.double_sided);
    }

    /// Define-set form of the structure, for template-driven generation.
    #[must_use]
    pub fn shader_defines(&self) -> ShaderDefines {
        let mut defines = ShaderDefines::with_capacity(4 + self.layers.len() * 3);
        defines.set("MAT_LAYER_COUNT", &self.layers.len().to_string());
        for (i, layer) in self.layers.iter().enumerate() {
            defines.set(&format!("MAT_LAYER{i}_TYPE"), layer.layer_type.name());
            defines.set(&format!("MAT_LAYER{i}_BLEND"), layer.blend_mode.name());
            defines.set(&format!("MAT_LAYER{i}_NDF"), layer.normal_distribution.name());
        }
        for (name, flag) in Self::modifier_names() {
            defines.set_flag(name, self.modifiers.contains(flag));
        }
        defines.set_flag("MAT_DOUBLE_SIDED", self.double_sided);
        defines
    }

    fn modifier_names() -> [(&'static str, ModifierFlags); 4] {
        [
            ("MAT_HAS_NORMAL_MAP", ModifierFlags::NORMAL_MAP),
            ("MAT_HAS_ALPHA_MAP", ModifierFlags::ALPHA_MAP),
            ("MAT_HAS_HEIGHT_MAP", ModifierFlags::HEIGHT_MAP),
            ("MAT_HAS_AMBIENT_MAP", ModifierFlags::AMBIENT_MAP),
        ]
    }
}
