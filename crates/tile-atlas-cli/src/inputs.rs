use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::{ImageReader, RgbaImage};
use tile_atlas_core::{IndexedTile, Palette, Sprite};
use tracing::{debug, error};
use walkdir::WalkDir;

/// A decoded input image and its key (path relative to the input root, no extension).
pub struct LoadedImage {
    pub key: String,
    pub rgba: RgbaImage,
}

/// Sprite frame named `<sprite>@<direction>_<frame>`.
#[derive(Debug, PartialEq, Eq)]
pub struct SpriteName<'a> {
    pub sprite: &'a str,
    pub direction: u8,
    pub frame: usize,
}

/// Parses a key of the form `units/hero@2_0`; anything else is a palette tile.
pub fn parse_sprite_name(key: &str) -> Option<SpriteName<'_>> {
    let (sprite, rest) = key.rsplit_once('@')?;
    let (dir, frame) = rest.split_once('_')?;
    if sprite.is_empty() {
        return None;
    }
    Some(SpriteName {
        sprite,
        direction: dir.parse().ok()?,
        frame: frame.parse().ok()?,
    })
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("bad glob {}", pat))?);
    }
    Ok(Some(b.build()?))
}

pub fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let inc_set = build_globset(include)?;
    let exc_set = build_globset(exclude)?;
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    Ok(list)
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(&s) {
            return true;
        }
    }
    false
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "bmp" | "gif" | "tga")
    )
}

/// Source key for `p`: relative to `root`, forward slashes, extension dropped.
fn key_for(root: &Path, p: &Path) -> String {
    let rel = p.strip_prefix(root).unwrap_or(p);
    let rel = if rel.as_os_str().is_empty() {
        Path::new(p.file_name().unwrap_or_default())
    } else {
        rel
    };
    rel.with_extension("")
        .to_string_lossy()
        .replace('\\', "/")
}

pub fn load_images_with_progress(
    root: &Path,
    paths: &[PathBuf],
    progress: bool,
) -> anyhow::Result<Vec<LoadedImage>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match load_image(p) {
            Ok(rgba) => list.push(LoadedImage {
                key: key_for(root, p),
                rgba,
            }),
            Err(e) => {
                error!(?p, error = %e, "skip image");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

fn load_image(p: &Path) -> anyhow::Result<RgbaImage> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(img.to_rgba8())
}

/// Palette tiles and sprites quantized against one shared palette.
pub struct Sources {
    pub palette: Palette,
    pub tiles: Vec<(String, Arc<IndexedTile>)>,
    pub sprites: Vec<Sprite>,
}

/// Quantizes every image into a shared palette and groups sprite frames by sprite name.
pub fn quantize(images: &[LoadedImage]) -> anyhow::Result<Sources> {
    // Index 0 is transparent so unset canvas pixels and empty tile pixels agree.
    let mut palette = Palette::from_colors([image::Rgba([0, 0, 0, 0])])?;
    let mut tiles = Vec::new();
    let mut sprites: BTreeMap<&str, Sprite> = BTreeMap::new();

    for img in images {
        let tile = IndexedTile::from_rgba(&img.rgba, &mut palette)
            .with_context(|| format!("quantize {}", img.key))?;
        let tile = Arc::new(tile);
        match parse_sprite_name(&img.key) {
            Some(name) => {
                debug!(
                    sprite = name.sprite,
                    direction = name.direction,
                    frame = name.frame,
                    "sprite frame"
                );
                sprites
                    .entry(name.sprite)
                    .or_insert_with(|| Sprite::new(name.sprite))
                    .insert_frame(name.direction, name.frame, tile);
            }
            None => tiles.push((img.key.clone(), tile)),
        }
    }

    Ok(Sources {
        palette,
        tiles,
        sprites: sprites.into_values().collect(),
    })
}
