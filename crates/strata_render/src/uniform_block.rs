//! Parameter block abstraction.
//!
//! A [`UniformBlock`] is the host-side view of a GPU parameter block: named
//! variables at byte offsets plus named texture slots. Offsets and slots are
//! looked up by name once and then written by index every frame.
//!
//! [`CpuUniformBlock`] is the reference implementation backed by a byte
//! buffer. Renderers upload its bytes when [`version`](CpuUniformBlock::version)
//! changes.

use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::Pod;
use rustc_hash::FxHashMap;
use strata_core::{Result, StrataError};
use strata_resources::{TextureHandle, TextureSampler};

/// Row alignment of variables in a uniform buffer.
pub const UNIFORM_ALIGNMENT: usize = 16;

static NEXT_LAYOUT_ID: AtomicU64 = AtomicU64::new(0);

fn next_layout_id() -> u64 {
    NEXT_LAYOUT_ID.fetch_add(1, Ordering::Relaxed)
}

pub trait UniformBlock {
    /// Label used in error messages.
    fn label(&self) -> &str;

    /// Identifies the variable and slot layout. Blocks sharing an id resolve
    /// every name to the same offset and slot; labels carry no such promise.
    fn layout_id(&self) -> u64;

    /// Byte offset of the variable `name`.
    fn variable_offset(&self, name: &str) -> Option<usize>;

    /// Index of the texture slot `name`.
    fn texture_slot(&self, name: &str) -> Option<usize>;

    fn set_variable(&mut self, offset: usize, bytes: &[u8]) -> Result<()>;

    fn set_texture(
        &mut self,
        slot: usize,
        texture: &TextureHandle,
        sampler: &TextureSampler,
    ) -> Result<()>;
}

#[derive(Debug, Clone, Copy)]
struct VariableEntry {
    offset: usize,
    size: usize,
}

/// A texture bound to a slot together with the sampler used for it.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundTexture {
    pub texture: TextureHandle,
    pub sampler: TextureSampler,
}

#[derive(Debug, Clone)]
pub struct CpuUniformBlock {
    label: String,
    layout_id: u64,
    data: Vec<u8>,
    variables: FxHashMap<String, VariableEntry>,
    texture_slots: FxHashMap<String, usize>,
    textures: Vec<Option<BoundTexture>>,
    version: u64,
}

impl CpuUniformBlock {
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            layout_id: next_layout_id(),
            data: Vec::new(),
            variables: FxHashMap::default(),
            texture_slots: FxHashMap::default(),
            textures: Vec::new(),
            version: 0,
        }
    }

    /// Appends a zero-initialized variable of `size` bytes, aligned to
    /// [`UNIFORM_ALIGNMENT`].
    #[must_use]
    pub fn with_variable(mut self, name: &str, size: usize) -> Self {
        let offset = self.data.len().next_multiple_of(UNIFORM_ALIGNMENT);
        self.data.resize(offset + size, 0);
        self.variables.insert(name.to_string(), VariableEntry { offset, size });
        self.layout_id = next_layout_id();
        self
    }

    #[must_use]
    pub fn with_texture_slot(mut self, name: &str) -> Self {
        self.texture_slots.insert(name.to_string(), self.textures.len());
        self.textures.push(None);
        self.layout_id = next_layout_id();
        self
    }

    /// Raw contents, ready for upload.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Incremented by every write.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn variable_bytes(&self, name: &str) -> Option<&[u8]> {
        let entry = self.variables.get(name)?;
        Some(&self.data[entry.offset..entry.offset + entry.size])
    }

    /// Reads the variable `name` as `T`. `None` when the variable is missing
    /// or its size differs from `T`.
    #[must_use]
    pub fn read_variable<T: Pod>(&self, name: &str) -> Option<T> {
        let bytes = self.variable_bytes(name)?;
        bytemuck::try_pod_read_unaligned(bytes).ok()
    }

    #[must_use]
    pub fn texture(&self, slot: usize) -> Option<&BoundTexture> {
        self.textures.get(slot)?.as_ref()
    }

    #[must_use]
    pub fn texture_by_name(&self, name: &str) -> Option<&BoundTexture> {
        self.texture(*self.texture_slots.get(name)?)
    }

    /// Number of slots currently holding a texture.
    #[must_use]
    pub fn bound_texture_count(&self) -> usize {
        self.textures.iter().filter(|t| t.is_some()).count()
    }

    fn changed(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

impl UniformBlock for CpuUniformBlock {
    fn label(&self) -> &str {
        &self.label
    }

    fn layout_id(&self) -> u64 {
        self.layout_id
    }

    fn variable_offset(&self, name: &str) -> Option<usize> {
        self.variables.get(name).map(|v| v.offset)
    }

    fn texture_slot(&self, name: &str) -> Option<usize> {
        self.texture_slots.get(name).copied()
    }

    fn set_variable(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let capacity = self.data.len();
        let Some(target) = self.data.get_mut(offset..offset + bytes.len()) else {
            return Err(StrataError::WriteOutOfBounds { offset, len: bytes.len(), capacity });
        };
        target.copy_from_slice(bytes);
        self.changed();
        Ok(())
    }

    fn set_texture(
        &mut self,
        slot: usize,
        texture: &TextureHandle,
        sampler: &TextureSampler,
    ) -> Result<()> {
        let capacity = self.textures.len();
        let Some(target) = self.textures.get_mut(slot) else {
            return Err(StrataError::WriteOutOfBounds { offset: slot, len: 1, capacity });
        };
        *target = Some(BoundTexture { texture: texture.clone(), sampler: *sampler });
        self.changed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_resources::Texture;

    #[test]
    fn variables_are_row_aligned() {
        let block = CpuUniformBlock::new("test")
            .with_variable("a", 4)
            .with_variable("b", 32);

        assert_eq!(block.variable_offset("a"), Some(0));
        assert_eq!(block.variable_offset("b"), Some(16));
        assert_eq!(block.bytes().len(), 48);
        assert_eq!(block.variable_offset("c"), None);
    }

    #[test]
    fn layout_id_follows_layout_not_label() {
        let a = CpuUniformBlock::new("scene").with_variable("x", 16);
        let b = CpuUniformBlock::new("scene").with_variable("x", 16);
        assert_ne!(a.layout_id(), b.layout_id());

        let grown = a.clone().with_texture_slot("t");
        assert_ne!(grown.layout_id(), a.layout_id());
        assert_eq!(a.clone().layout_id(), a.layout_id());
    }

    #[test]
    fn out_of_bounds_writes_fail() {
        let mut block = CpuUniformBlock::new("test").with_variable("a", 8);
        assert!(block.set_variable(0, &[1; 8]).is_ok());
        assert_eq!(block.version(), 1);

        let err = block.set_variable(4, &[0; 8]).unwrap_err();
        assert!(matches!(err, StrataError::WriteOutOfBounds { offset: 4, len: 8, capacity: 8 }));
        assert_eq!(block.version(), 1);
        assert_eq!(block.read_variable::<[u32; 2]>("a"), Some([0x0101_0101; 2]));
    }

    #[test]
    fn texture_slots() {
        let mut block =
            CpuUniformBlock::new("test").with_texture_slot("t0").with_texture_slot("t1");
        let texture = TextureHandle::new(Texture::solid_color("white"));

        let slot = block.texture_slot("t1").unwrap();
        block.set_texture(slot, &texture, &TextureSampler::point()).unwrap();

        assert_eq!(block.bound_texture_count(), 1);
        assert_eq!(block.texture_by_name("t1").unwrap().texture, texture);
        assert!(block.texture_by_name("t0").is_none());
        assert!(block.set_texture(2, &texture, &TextureSampler::default()).is_err());
    }
}
