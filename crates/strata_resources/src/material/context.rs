//! Shared material context.
//!
//! Owns the state every material of a scene shares: the descriptor identity
//! registry and the material id counter. A context is created once per
//! application or scene and passed to [`Material::new`]; independent scenes
//! (or tests) use independent contexts.
//!
//! The registry sits behind a single mutex that is held only for the duration
//! of an acquire or release.
//!
//! [`Material::new`]: super::Material::new

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};

use parking_lot::Mutex;

use super::desc::MaterialDesc;
use super::registry::{DescId, DescriptorIdentityRegistry};

#[derive(Debug, Default)]
struct ContextInner {
    registry: Mutex<DescriptorIdentityRegistry>,
    // mirrors the registry generation so cached identifiers can be checked
    // without taking the lock
    generation: AtomicU64,
    material_counter: AtomicI32,
}

/// Cheaply clonable handle to the shared material state.
#[derive(Debug, Clone, Default)]
pub struct MaterialContext {
    inner: Arc<ContextInner>,
}

impl MaterialContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn next_material_id(&self) -> i32 {
        self.inner.material_counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Resets the material id counter only. Materials created afterwards may
    /// repeat ids of live materials; descriptor identifiers are unaffected.
    pub fn reset_id_counter(&self) {
        self.inner.material_counter.store(0, Ordering::Relaxed);
    }

    /// Resets the id counter and clears the descriptor registry, for reloading
    /// a scene. Live materials re-resolve their identifier on next use instead
    /// of releasing into the cleared registry.
    pub fn reset(&self) {
        self.reset_id_counter();
        let mut registry = self.inner.registry.lock();
        registry.clear();
        self.inner.generation.store(registry.generation(), Ordering::Release);
    }

    /// Current registry generation.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    pub(crate) fn acquire(&self, desc: &MaterialDesc) -> (DescId, u64) {
        let mut registry = self.inner.registry.lock();
        (registry.acquire(desc), registry.generation())
    }

    /// Releases `id` if it was acquired under the current registry generation.
    pub(crate) fn release(&self, id: DescId, generation: u64) {
        let mut registry = self.inner.registry.lock();
        if registry.generation() == generation {
            registry.release(id);
        }
    }

    /// Runs `f` with shared access to the registry.
    pub fn with_registry<R>(&self, f: impl FnOnce(&DescriptorIdentityRegistry) -> R) -> R {
        f(&self.inner.registry.lock())
    }

    #[must_use]
    pub fn ref_count(&self, id: DescId) -> Option<u32> {
        self.with_registry(|r| r.ref_count(id))
    }

    /// Number of distinct live structures.
    #[must_use]
    pub fn distinct_descriptors(&self) -> usize {
        self.with_registry(DescriptorIdentityRegistry::len)
    }

    /// Whether two handles refer to the same context.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
