use std::fmt::Write as _;

use serde_json::{Value, json};

use crate::error::{Result, TileAtlasError};
use crate::model::AtlasLayout;

/// Serialize the layout as `{ size, items, frames, meta }` (array style).
/// Suitable for generic tooling and simple consumption.
pub fn to_json_array(layout: &AtlasLayout) -> Value {
    let items: Vec<Value> = layout
        .items
        .iter()
        .map(|r| json!({"x": r.x, "y": r.y, "w": r.w, "h": r.h}))
        .collect();
    let frames: Vec<Value> = layout
        .frames
        .iter()
        .map(|fr| {
            json!({
                "key": fr.key,
                "item": fr.item,
                "frame": {"x": fr.frame.x, "y": fr.frame.y, "w": fr.frame.w, "h": fr.frame.h},
                "shared": fr.shared,
            })
        })
        .collect();
    json!({
        "size": {"w": layout.size, "h": layout.size},
        "items": items,
        "frames": frames,
        "meta": &layout.meta,
    })
}

/// Flatten frames keyed by source name.
/// Shape: `{ frames: { key: { frame, item, shared } }, meta }`.
pub fn to_json_hash(layout: &AtlasLayout) -> Value {
    let mut frames = serde_json::Map::new();
    for fr in &layout.frames {
        frames.insert(
            fr.key.clone(),
            json!({
                "frame": {"x": fr.frame.x, "y": fr.frame.y, "w": fr.frame.w, "h": fr.frame.h},
                "item": fr.item,
                "shared": fr.shared,
            }),
        );
    }
    json!({ "frames": frames, "meta": &layout.meta })
}

/// Turns a source key into a C identifier fragment (`hero/2/0` -> `HERO_2_0`).
fn c_ident(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for ch in key.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push('_');
        }
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Emit a C header with one `{x, y, w, h}` row per distinct item and one
/// index define per source key. `prefix` names the table and prefixes every define.
pub fn to_c_table(layout: &AtlasLayout, prefix: &str) -> Result<String> {
    let prefix = c_ident(prefix);
    if prefix.is_empty() {
        return Err(TileAtlasError::InvalidInput(
            "C table prefix must not be empty".into(),
        ));
    }
    let table = prefix.to_ascii_lowercase();
    let mut out = String::new();
    let enc = |e: std::fmt::Error| TileAtlasError::Encode(e.to_string());

    writeln!(out, "/* Generated by {} {} */", layout.meta.app, layout.meta.version).map_err(enc)?;
    writeln!(out, "#ifndef {}_H", prefix).map_err(enc)?;
    writeln!(out, "#define {}_H", prefix).map_err(enc)?;
    writeln!(out).map_err(enc)?;
    writeln!(out, "#define {}_SIZE {}", prefix, layout.size).map_err(enc)?;
    writeln!(out, "#define {}_COUNT {}", prefix, layout.items.len()).map_err(enc)?;
    writeln!(out).map_err(enc)?;
    for fr in &layout.frames {
        writeln!(out, "#define {}_{} {}", prefix, c_ident(&fr.key), fr.item).map_err(enc)?;
    }
    writeln!(out).map_err(enc)?;
    let ty = if layout.size > u16::MAX as u32 {
        "unsigned int"
    } else {
        "unsigned short"
    };
    writeln!(
        out,
        "static const {} {}[{}][4] = {{",
        ty,
        table,
        layout.items.len()
    )
    .map_err(enc)?;
    for (i, r) in layout.items.iter().enumerate() {
        writeln!(out, "    {{ {}, {}, {}, {} }}, /* {} */", r.x, r.y, r.w, r.h, i).map_err(enc)?;
    }
    writeln!(out, "}};").map_err(enc)?;
    writeln!(out).map_err(enc)?;
    writeln!(out, "#endif /* {}_H */", prefix).map_err(enc)?;
    Ok(out)
}
