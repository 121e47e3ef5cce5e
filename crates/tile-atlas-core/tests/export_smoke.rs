use std::sync::Arc;

use tile_atlas_core::prelude::*;

fn sample_atlas() -> TileAtlas {
    let palette = Palette::from_colors([image::Rgba([0, 0, 0, 0]), image::Rgba([9, 9, 9, 255])])
        .expect("palette");
    let grass = Arc::new(IndexedTile::filled(8, 8, 1).unwrap());
    let mut hero = Sprite::new("hero");
    hero.push_frame(0, Arc::new(IndexedTile::filled(4, 6, 1).unwrap()));
    hero.push_frame(1, Arc::new(IndexedTile::filled(4, 6, 1).unwrap()));
    AtlasBuilder::new(palette)
        .margin(1)
        .tile("grass", grass)
        .sprite(hero)
        .build()
        .expect("build")
}

#[test]
fn export_json_array_and_hash_smoke() {
    let atlas = sample_atlas();
    let layout = atlas.layout();

    // json-array
    let ja = tile_atlas_core::to_json_array(&layout);
    let obj = ja.as_object().expect("object");
    assert!(obj.contains_key("size"));
    assert!(obj.contains_key("items"));
    assert!(obj.contains_key("meta"));
    let frames = obj["frames"].as_array().expect("frames");
    assert_eq!(frames.len(), 3);
    assert_eq!(obj["items"].as_array().unwrap().len(), 2);
    assert_eq!(frames[1]["key"], "hero/0/0");
    assert_eq!(frames[1]["shared"], true);
    assert_eq!(frames[0]["shared"], false);
    assert_eq!(obj["size"]["w"], atlas.canvas_size());

    // json-hash
    let jh = tile_atlas_core::to_json_hash(&layout);
    let obj = jh.as_object().expect("object");
    let frames = obj["frames"].as_object().expect("frames");
    assert!(frames.contains_key("grass"));
    assert!(frames.contains_key("hero/1/0"));
    assert_eq!(frames["hero/0/0"]["frame"], frames["hero/1/0"]["frame"]);
    assert_eq!(obj["meta"]["app"], "tile-atlas");
    assert_eq!(obj["meta"]["margin"], 1);
    assert_eq!(obj["meta"]["palette_len"], 2);
}

#[test]
fn export_c_table_smoke() {
    let atlas = sample_atlas();
    let layout = atlas.layout();
    let header = tile_atlas_core::to_c_table(&layout, "level1").expect("c table");
    assert!(header.contains("#ifndef LEVEL1_H"));
    assert!(header.contains(&format!("#define LEVEL1_SIZE {}", atlas.canvas_size())));
    assert!(header.contains("#define LEVEL1_COUNT 2"));
    assert!(header.contains("#define LEVEL1_GRASS "));
    assert!(header.contains("#define LEVEL1_HERO_0_0 "));
    assert!(header.contains("static const unsigned short level1[2][4] = {"));
    let g = atlas.locate("grass").unwrap();
    assert!(header.contains(&format!("{{ {}, {}, {}, {} }}", g.x, g.y, g.w, g.h)));
    assert!(header.trim_end().ends_with("#endif /* LEVEL1_H */"));

    assert!(tile_atlas_core::to_c_table(&layout, "").is_err());
}

#[test]
fn layout_round_trips_through_serde() {
    let layout = sample_atlas().layout();
    let text = serde_json::to_string(&layout).expect("serialize");
    let back: AtlasLayout = serde_json::from_str(&text).expect("deserialize");
    assert_eq!(back.size, layout.size);
    assert_eq!(back.frames.len(), layout.frames.len());
    assert_eq!(back.items, layout.items);
}

#[test]
fn stats_reflect_sharing() {
    let stats = sample_atlas().stats();
    assert_eq!(stats.num_items, 2);
    assert_eq!(stats.num_sources, 3);
    assert_eq!(stats.num_deduplicated, 1);
    assert_eq!(stats.used_area, 64 + 24);
    assert!(stats.occupancy > 0.0 && stats.occupancy <= 1.0);
    assert!(stats.summary().contains("1 deduplicated"));
    assert_eq!(stats.wasted_area() + stats.used_area, stats.canvas_area);
}
