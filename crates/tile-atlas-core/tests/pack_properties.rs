use std::sync::Arc;

use rand::{Rng, SeedableRng};
use tile_atlas_core::prelude::*;

fn is_pow2(v: u32) -> bool {
    v != 0 && (v & (v - 1)) == 0
}

fn random_items(seed: u64, count: usize, max_side: u32) -> Vec<PackableItem> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let w = rng.gen_range(1..=max_side);
            let h = rng.gen_range(1..=max_side);
            let indices = (0..w * h).map(|_| rng.gen_range(0..4u16)).collect();
            let tile = IndexedTile::new(w, h, indices).expect("tile");
            PackableItem::new(Arc::new(tile)).expect("item")
        })
        .collect()
}

fn assert_sound(out: &PackOutcome, margin: u32) {
    assert!(is_pow2(out.canvas_size));
    let rects: Vec<Rect> = out
        .placements
        .iter()
        .map(|(_, r)| r.padded(margin))
        .collect();
    for r in &rects {
        assert!(
            r.x + r.w <= out.canvas_size && r.y + r.h <= out.canvas_size,
            "{:?} outside {}",
            r,
            out.canvas_size
        );
    }
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            assert!(
                !rects[i].intersects(&rects[j]),
                "padded rects overlap: {:?} vs {:?}",
                rects[i],
                rects[j]
            );
        }
    }
}

#[test]
fn random_sets_never_overlap() {
    for (seed, margin) in [(1u64, 0u32), (2, 1), (3, 2), (2024, 3)] {
        let items = random_items(seed, 120, 40);
        let out = pack(&items, &PackerConfig::builder().margin(margin).build()).expect("pack");
        assert_sound(&out, margin);
        for it in &items {
            assert!(out.placements.contains(it));
        }
    }
}

#[test]
fn integrity_checked_after_every_placement() {
    let items = random_items(99, 40, 24);
    let cfg = PackerConfig::builder()
        .margin(1)
        .check_integrity(true)
        .build();
    let out = pack(&items, &cfg).expect("pack");
    assert_sound(&out, 1);
}

#[test]
fn repeated_packs_are_identical() {
    let items = random_items(42, 80, 32);
    let cfg = PackerConfig::builder().margin(2).build();
    let a = pack(&items, &cfg).unwrap();
    let b = pack(&items, &cfg).unwrap();
    assert_eq!(a.canvas_size, b.canvas_size);
    assert_eq!(a.attempts, b.attempts);
    let ra: Vec<Rect> = a.placements.iter().map(|(_, r)| r).collect();
    let rb: Vec<Rect> = b.placements.iter().map(|(_, r)| r).collect();
    assert_eq!(ra, rb);
}

#[test]
fn duplicates_collapse_in_random_sets() {
    let base = random_items(5, 30, 16);
    // Same content, fresh allocations.
    let copies: Vec<PackableItem> = base
        .iter()
        .map(|it| {
            let src = it.source();
            let mut idx = Vec::new();
            for y in 0..src.height() {
                for x in 0..src.width() {
                    idx.push(src.tile_at(x, y));
                }
            }
            let tile = IndexedTile::new(src.width(), src.height(), idx).unwrap();
            PackableItem::new(Arc::new(tile)).unwrap()
        })
        .collect();
    let all: Vec<PackableItem> = base.iter().chain(copies.iter()).cloned().collect();
    let distinct = ItemSet::from_iter(base.iter().cloned()).len();

    let out = pack(&all, &PackerConfig::default()).unwrap();
    assert_eq!(out.placements.len(), distinct);
    for (a, b) in base.iter().zip(&copies) {
        assert_eq!(out.placements.get(a), out.placements.get(b));
    }
    let alone = pack(&base, &PackerConfig::default()).unwrap();
    assert_eq!(alone.canvas_size, out.canvas_size);
}

#[test]
fn pack_many_matches_individual_packs() {
    let batches = vec![
        random_items(10, 20, 16),
        random_items(11, 50, 8),
        random_items(12, 5, 60),
    ];
    let cfg = PackerConfig::builder().margin(1).build();
    let results = pack_many(&batches, &cfg);
    assert_eq!(results.len(), batches.len());
    for (batch, res) in batches.iter().zip(results) {
        let many = res.expect("pack");
        let single = pack(batch, &cfg).unwrap();
        assert_eq!(many.canvas_size, single.canvas_size);
        for it in batch {
            assert_eq!(many.placements.get(it), single.placements.get(it));
        }
        assert_sound(&many, 1);
    }
}
