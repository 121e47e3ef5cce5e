use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use tile_atlas_core::prelude::*;

fn generate_items(count: usize, min_size: u32, max_size: u32, colors: u16) -> Vec<PackableItem> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(count as u64);
    (0..count)
        .map(|_| {
            let w = rng.gen_range(min_size..=max_size);
            let h = rng.gen_range(min_size..=max_size);
            let indices = (0..w * h).map(|_| rng.gen_range(0..colors)).collect();
            let tile = IndexedTile::new(w, h, indices).expect("tile");
            PackableItem::new(Arc::new(tile)).expect("item")
        })
        .collect()
}

fn bench_pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("first_fit_pack");

    for count in [50, 200, 800] {
        let items = generate_items(count, 4, 32, 16);
        group.throughput(Throughput::Elements(count as u64));

        for margin in [0u32, 1] {
            let cfg = PackerConfig::builder().margin(margin).build();
            group.bench_with_input(
                BenchmarkId::new(format!("margin_{}", margin), count),
                &items,
                |b, items| b.iter(|| black_box(pack(items, &cfg).expect("pack"))),
            );
        }
    }

    group.finish();
}

fn bench_dedup(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedup");

    // Two colors on small tiles: lots of content-equal duplicates.
    let items = generate_items(2000, 2, 3, 2);
    group.throughput(Throughput::Elements(items.len() as u64));
    group.bench_function("item_set_2000", |b| {
        b.iter(|| black_box(items.iter().cloned().collect::<ItemSet>().len()))
    });
    group.bench_function("pack_2000", |b| {
        b.iter(|| black_box(pack(&items, &PackerConfig::default()).expect("pack")))
    });

    group.finish();
}

fn bench_divide(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_divide");

    for splits in [16u32, 64] {
        group.bench_with_input(BenchmarkId::new("checkerboard", splits), &splits, |b, &n| {
            b.iter(|| {
                let size = n * 4;
                let mut g = FreeSpaceGrid::new(size, size);
                let mut col = g.origin();
                for _ in 1..n {
                    col = g.divide(col, 4, Axis::Horizontal).expect("divide");
                }
                let mut row = g.origin();
                for _ in 1..n {
                    row = g.divide(row, 4, Axis::Vertical).expect("divide");
                }
                black_box(g.len())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pack, bench_dedup, bench_divide);
criterion_main!(benches);
