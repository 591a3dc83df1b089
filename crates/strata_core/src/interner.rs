//! Global string interner.
//!
//! Shader define keys and values are interned once and compared as integer
//! [`Symbol`]s afterwards. Define sets built for every structural variant reuse
//! the same handful of names, so the pool stays small.

use std::sync::LazyLock;

use lasso::{Spur, ThreadedRodeo};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::new);

/// Compact integer handle for an interned string.
pub type Symbol = Spur;

/// Interns `s`, returning the existing symbol if it was seen before.
#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Looks up `s` without interning it.
#[inline]
#[must_use]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

/// Resolves a symbol back to its string.
#[inline]
#[must_use]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}

/// Pre-interns the define names emitted for material variants so the first
/// variant lookup does not pay for them.
pub fn preload_material_defines() {
    let common = [
        "MAT_LAYER_COUNT",
        "MAT_DOUBLE_SIDED",
        "MAT_HAS_NORMAL_MAP",
        "MAT_HAS_ALPHA_MAP",
        "MAT_HAS_HEIGHT_MAP",
        "MAT_HAS_AMBIENT_MAP",
    ];
    for name in common {
        intern(name);
    }
    log::debug!("Preloaded {} material define names", common.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_stable() {
        let a = intern("MAT_LAYER0_TYPE");
        let b = intern("MAT_LAYER0_TYPE");
        assert_eq!(a, b);
        assert_eq!(resolve(a), "MAT_LAYER0_TYPE");
    }

    #[test]
    fn get_does_not_intern() {
        assert!(get("never_interned_symbol_name").is_none());
        preload_material_defines();
        assert!(get("MAT_HAS_NORMAL_MAP").is_some());
    }
}
