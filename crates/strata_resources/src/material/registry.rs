//! Descriptor identity registry.
//!
//! Maps each distinct [`MaterialDesc`] to a shared [`DescId`] with a reference
//! count of the materials currently using it. Shader tooling compiles one
//! variant per id.
//!
//! Lookup is a linear scan with exact equality. Descriptors have no ordering,
//! and the number of live structures is small (tens) next to the number of
//! materials (thousands), which only touch the registry when their structure
//! changes.

use std::fmt;

use super::desc::MaterialDesc;

/// Structural descriptor identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescId(pub(crate) u64);

impl DescId {
    #[inline]
    #[must_use]
    pub fn to_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DescId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "desc#{}", self.0)
    }
}

#[derive(Debug)]
struct DescEntry {
    desc: MaterialDesc,
    id: DescId,
    ref_count: u32,
}

#[derive(Debug, Default)]
pub struct DescriptorIdentityRegistry {
    entries: Vec<DescEntry>,
    next_id: u64,
    generation: u64,
}

impl DescriptorIdentityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the entry equal to `desc` and takes a reference on it, or inserts
    /// a new entry with a fresh id.
    pub fn acquire(&mut self, desc: &MaterialDesc) -> DescId {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.desc == *desc) {
            entry.ref_count += 1;
            log::trace!("Descriptor {} adopted (refs: {})", entry.id, entry.ref_count);
            return entry.id;
        }

        let id = DescId(self.next_id);
        self.next_id += 1;
        self.entries.push(DescEntry { desc: desc.clone(), id, ref_count: 1 });
        log::debug!(
            "Registered descriptor {id} ({} layers, modifiers {:?}); {} live",
            desc.layers.len(),
            desc.modifiers,
            self.entries.len()
        );
        id
    }

    /// Drops one reference on `id`, erasing the entry when none remain.
    pub fn release(&mut self, id: DescId) {
        let Some(pos) = self.entries.iter().position(|e| e.id == id) else {
            log::warn!("Release of unknown descriptor {id}");
            return;
        };

        let entry = &mut self.entries[pos];
        entry.ref_count -= 1;
        if entry.ref_count == 0 {
            self.entries.swap_remove(pos);
            log::debug!("Retired descriptor {id}; {} live", self.entries.len());
        }
    }

    #[must_use]
    pub fn ref_count(&self, id: DescId) -> Option<u32> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.ref_count)
    }

    /// The descriptor registered under `id`.
    #[must_use]
    pub fn desc(&self, id: DescId) -> Option<&MaterialDesc> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.desc)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bumped by every [`clear`](Self::clear). Identifiers cached under an
    /// older generation are no longer backed by an entry.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drops every entry. Ids keep increasing afterwards, so an id handed out
    /// before the clear is never handed out again.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            log::debug!("Clearing {} descriptor entries", self.entries.len());
        }
        self.entries.clear();
        self.generation += 1;
    }
}
