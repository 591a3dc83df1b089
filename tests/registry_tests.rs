//! Descriptor Identity Tests
//!
//! Tests for:
//! - DescriptorIdentityRegistry: dedup, reference counting, id monotonicity
//! - MaterialContext: id counter, reset semantics, isolation between contexts
//! - Concurrent identifier resolution through `&Material`

use std::sync::Arc;
use std::thread;

use strata::prelude::*;
use strata::{DescriptorIdentityRegistry, MaterialDesc, ModifierFlags};

fn lambert_desc(double_sided: bool) -> MaterialDesc {
    let mut desc = MaterialDesc { double_sided, ..Default::default() };
    desc.layers.push(MaterialLayerDesc::lambert(BlendMode::Additive));
    desc
}

fn lambert(ctx: &MaterialContext, name: &str) -> Material {
    let mut mat = Material::new(ctx, name);
    mat.add_layer(
        MaterialLayerDesc::lambert(BlendMode::Additive),
        MaterialLayerValues::default(),
    );
    mat
}

// ============================================================================
// DescriptorIdentityRegistry
// ============================================================================

#[test]
fn registry_counts_references_per_structure() {
    let mut reg = DescriptorIdentityRegistry::new();
    let single = reg.acquire(&lambert_desc(false));
    let double = reg.acquire(&lambert_desc(true));
    assert_eq!(reg.acquire(&lambert_desc(false)), single);

    assert_eq!(reg.len(), 2);
    assert_eq!(reg.ref_count(single), Some(2));
    assert_eq!(reg.ref_count(double), Some(1));
    assert_eq!(reg.desc(double), Some(&lambert_desc(true)));
}

#[test]
fn registry_ids_increase_and_are_never_reused() {
    let mut reg = DescriptorIdentityRegistry::new();
    let first = reg.acquire(&lambert_desc(false));
    reg.release(first);
    assert!(reg.is_empty());

    let second = reg.acquire(&lambert_desc(false));
    assert!(second > first);
    assert_eq!(second.to_u64(), first.to_u64() + 1);
}

#[test]
fn modifier_flags_take_part_in_identity() {
    let mut reg = DescriptorIdentityRegistry::new();
    let mut desc = lambert_desc(false);
    let plain = reg.acquire(&desc);
    desc.modifiers = ModifierFlags::NORMAL_MAP | ModifierFlags::AMBIENT_MAP;
    let mapped = reg.acquire(&desc);
    desc.modifiers = ModifierFlags::AMBIENT_MAP | ModifierFlags::NORMAL_MAP;

    assert_ne!(plain, mapped);
    assert_eq!(reg.acquire(&desc), mapped);
}

// ============================================================================
// MaterialContext
// ============================================================================

#[test]
fn contexts_are_isolated() {
    let a = MaterialContext::new();
    let b = MaterialContext::new();
    let mat_a = lambert(&a, "a");
    let mat_b = lambert(&b, "b");

    mat_a.desc_identifier();
    mat_b.desc_identifier();
    assert_eq!(a.distinct_descriptors(), 1);
    assert_eq!(b.distinct_descriptors(), 1);
    assert_eq!(mat_a.id(), mat_b.id());
    assert!(!a.ptr_eq(&b));
    assert!(mat_a.context().ptr_eq(&a));
}

#[test]
fn reset_id_counter_keeps_registry() {
    let ctx = MaterialContext::new();
    let first = lambert(&ctx, "first");
    let id = first.desc_identifier();

    ctx.reset_id_counter();
    let second = lambert(&ctx, "second");

    assert_eq!(second.id(), first.id());
    assert_eq!(second.desc_identifier(), id);
    assert_eq!(ctx.ref_count(id), Some(2));
}

#[test]
fn reset_lets_live_materials_reresolve() {
    let ctx = MaterialContext::new();
    let old = lambert(&ctx, "old");
    let stale = old.desc_identifier();
    let generation = ctx.generation();

    ctx.reset();
    assert_eq!(ctx.generation(), generation + 1);
    assert_eq!(ctx.distinct_descriptors(), 0);

    let fresh = lambert(&ctx, "fresh");
    let current = fresh.desc_identifier();
    assert_ne!(current, stale);
    assert_eq!(old.desc_identifier(), current);
    assert_eq!(ctx.ref_count(current), Some(2));

    // the stale reference must not be released into the new generation
    drop(old);
    assert_eq!(ctx.ref_count(current), Some(1));
}

#[test]
fn dropping_all_materials_empties_registry() {
    let ctx = MaterialContext::new();
    let materials: Vec<Material> = (0..8).map(|i| lambert(&ctx, &format!("m{i}"))).collect();
    for mat in &materials {
        mat.desc_identifier();
    }
    assert_eq!(ctx.distinct_descriptors(), 1);

    drop(materials);
    assert_eq!(ctx.distinct_descriptors(), 0);
}

#[test]
fn structural_mutation_releases_before_reresolution() {
    let ctx = MaterialContext::new();
    let twin = lambert(&ctx, "twin");
    let mut mat = lambert(&ctx, "grown");
    let shared = mat.desc_identifier();
    twin.desc_identifier();
    assert_eq!(ctx.ref_count(shared), Some(2));

    let top = MaterialLayerDesc::dielectric(BlendMode::Fresnel);
    mat.add_layer(top, MaterialLayerValues::default());
    assert_eq!(ctx.ref_count(shared), Some(1));

    drop(twin);
    assert_eq!(ctx.ref_count(shared), None);
    assert_eq!(ctx.distinct_descriptors(), 0);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn shared_material_resolves_from_many_threads() {
    let ctx = MaterialContext::new();
    let mat = Arc::new(lambert(&ctx, "shared"));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let mat = Arc::clone(&mat);
            thread::spawn(move || {
                mat.finalize();
                (mat.desc_identifier(), mat.data_bytes())
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(ctx.ref_count(results[0].0), Some(1));
}
