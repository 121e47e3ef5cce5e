//! Atlas interface: collects palette tiles and sprite frames, deduplicates
//! them, packs the distinct items and exposes the result to renderers and
//! exporters.

use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::compositing::blit_indexed;
use crate::config::PackerConfig;
use crate::error::{Result, TileAtlasError};
use crate::item::{ItemId, ItemSet, PackableItem};
use crate::model::{AtlasFrame, AtlasLayout, Meta, PackStats, Rect};
use crate::pipeline::{PlacementMap, pack};
use crate::source::{IndexedTile, Palette};
use crate::sprite::Sprite;

/// Where an atlas entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceRef {
    /// Index into the builder's palette tiles.
    Tile(usize),
    /// Sprite index and frame index (into `Sprite::frames`).
    SpriteFrame { sprite: usize, frame: usize },
}

/// One packed source.
#[derive(Debug, Clone)]
pub struct AtlasEntry {
    pub key: String,
    pub source: SourceRef,
    /// Distinct item this source resolves to.
    pub item: ItemId,
    pub frame: Rect,
}

/// Collects sources for one atlas.
#[derive(Debug, Clone)]
pub struct AtlasBuilder {
    palette: Palette,
    config: PackerConfig,
    direction: Option<u8>,
    tiles: Vec<(String, Arc<IndexedTile>)>,
    sprites: Vec<Sprite>,
}

impl AtlasBuilder {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            config: PackerConfig::default(),
            direction: None,
            tiles: Vec::new(),
            sprites: Vec::new(),
        }
    }
    pub fn config(mut self, cfg: PackerConfig) -> Self {
        self.config = cfg;
        self
    }
    pub fn margin(mut self, v: u32) -> Self {
        self.config.margin = v;
        self
    }
    /// Only pack sprite frames of this direction; `None` packs every direction.
    /// Palette tiles are always packed.
    pub fn direction(mut self, v: Option<u8>) -> Self {
        self.direction = v;
        self
    }
    pub fn tile(mut self, key: impl Into<String>, tile: Arc<IndexedTile>) -> Self {
        self.tiles.push((key.into(), tile));
        self
    }
    pub fn sprite(mut self, sprite: Sprite) -> Self {
        self.sprites.push(sprite);
        self
    }

    #[instrument(skip_all, fields(tiles = self.tiles.len(), sprites = self.sprites.len()))]
    /// Deduplicates every source, packs the distinct items and returns the atlas.
    pub fn build(self) -> Result<TileAtlas> {
        let mut set = ItemSet::new();
        let mut pending: Vec<(String, SourceRef)> = Vec::new();

        for (i, (key, tile)) in self.tiles.iter().enumerate() {
            set.insert_source(tile.clone())?;
            pending.push((key.clone(), SourceRef::Tile(i)));
        }
        for (si, sprite) in self.sprites.iter().enumerate() {
            for (fi, frame) in sprite.frames().iter().enumerate() {
                if self.direction.is_some_and(|d| d != frame.direction) {
                    continue;
                }
                set.insert_source(frame.tile.clone())?;
                pending.push((
                    frame.key(&sprite.name),
                    SourceRef::SpriteFrame {
                        sprite: si,
                        frame: fi,
                    },
                ));
            }
        }
        if set.is_empty() {
            return Err(TileAtlasError::Empty);
        }

        let outcome = pack(set.items(), &self.config)?;

        let mut item_rects = Vec::with_capacity(set.len());
        for item in set.items() {
            let rect = outcome.placements.get(item).ok_or_else(|| {
                TileAtlasError::InvalidInput(format!("item {:?} was not placed", item))
            })?;
            item_rects.push(rect);
        }

        let mut by_key = HashMap::with_capacity(pending.len());
        let mut entries = Vec::with_capacity(pending.len());
        for ((key, source), &item) in pending.into_iter().zip(set.mapping()) {
            if by_key.insert(key.clone(), entries.len()).is_some() {
                return Err(TileAtlasError::InvalidInput(format!(
                    "duplicate source key: {}",
                    key
                )));
            }
            entries.push(AtlasEntry {
                key,
                source,
                item,
                frame: item_rects[item],
            });
        }

        info!(
            size = outcome.canvas_size,
            items = set.len(),
            sources = entries.len(),
            attempts = outcome.attempts,
            "atlas packed"
        );

        Ok(TileAtlas {
            palette: self.palette,
            config: self.config,
            direction: self.direction,
            tiles: self.tiles,
            sprites: self.sprites,
            items: set.items().to_vec(),
            item_rects,
            entries,
            by_key,
            canvas_size: outcome.canvas_size,
            attempts: outcome.attempts,
            placements: outcome.placements,
        })
    }
}

/// A packed atlas: placements plus everything needed to render and export it.
#[derive(Debug, Clone)]
pub struct TileAtlas {
    palette: Palette,
    config: PackerConfig,
    direction: Option<u8>,
    tiles: Vec<(String, Arc<IndexedTile>)>,
    sprites: Vec<Sprite>,
    items: Vec<PackableItem>,
    item_rects: Vec<Rect>,
    entries: Vec<AtlasEntry>,
    by_key: HashMap<String, usize>,
    canvas_size: u32,
    attempts: u32,
    placements: PlacementMap,
}

impl TileAtlas {
    /// Side of the square canvas (a power of two).
    pub fn canvas_size(&self) -> u32 {
        self.canvas_size
    }

    /// Canvas sizes tried before this one fit, plus one.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn config(&self) -> &PackerConfig {
        &self.config
    }

    pub fn placements(&self) -> &PlacementMap {
        &self.placements
    }

    /// Distinct items, indexed by `ItemId`.
    pub fn items(&self) -> &[PackableItem] {
        &self.items
    }

    pub fn item_rect(&self, id: ItemId) -> Option<Rect> {
        self.item_rects.get(id).copied()
    }

    /// One entry per packed source, palette tiles first, then sprite frames.
    pub fn entries(&self) -> &[AtlasEntry] {
        &self.entries
    }

    /// Rectangle of the source named `key`.
    pub fn locate(&self, key: &str) -> Option<Rect> {
        self.by_key.get(key).map(|&i| self.entries[i].frame)
    }

    pub fn entry(&self, key: &str) -> Option<&AtlasEntry> {
        self.by_key.get(key).map(|&i| &self.entries[i])
    }

    pub fn packed_tiles(&self) -> impl Iterator<Item = (&str, &Arc<IndexedTile>)> + '_ {
        self.tiles.iter().map(|(k, t)| (k.as_str(), t))
    }

    /// Sprites with at least one frame in the atlas (after the direction filter).
    pub fn packed_sprites(&self) -> Vec<&Sprite> {
        let mut seen = vec![false; self.sprites.len()];
        for e in &self.entries {
            if let SourceRef::SpriteFrame { sprite, .. } = e.source {
                seen[sprite] = true;
            }
        }
        self.sprites
            .iter()
            .zip(seen)
            .filter_map(|(s, packed)| packed.then_some(s))
            .collect()
    }

    /// Rasterizes the atlas: every placed item blitted through the palette.
    pub fn render(&self) -> RgbaImage {
        self.render_impl(false)
    }

    /// Like [`TileAtlas::render`], with a red outline around each item.
    pub fn render_with_outlines(&self) -> RgbaImage {
        self.render_impl(true)
    }

    fn render_impl(&self, outlines: bool) -> RgbaImage {
        let mut canvas = RgbaImage::new(self.canvas_size, self.canvas_size);
        for (item, rect) in self.placements.iter() {
            blit_indexed(
                item.source().as_ref(),
                &self.palette,
                &mut canvas,
                rect.x,
                rect.y,
                outlines,
            );
        }
        canvas
    }

    /// Serializable layout for exporters.
    pub fn layout(&self) -> AtlasLayout {
        let mut refs = vec![0usize; self.items.len()];
        for e in &self.entries {
            refs[e.item] += 1;
        }
        let frames = self
            .entries
            .iter()
            .map(|e| AtlasFrame {
                key: e.key.clone(),
                item: e.item,
                frame: e.frame,
                shared: refs[e.item] > 1,
            })
            .collect();
        AtlasLayout {
            size: self.canvas_size,
            items: self.item_rects.clone(),
            frames,
            meta: Meta {
                schema_version: "1".into(),
                app: "tile-atlas".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                format: "RGBA8888".into(),
                size: self.canvas_size,
                margin: self.config.margin,
                direction: self.direction,
                palette_len: self.palette.len(),
            },
        }
    }

    pub fn stats(&self) -> PackStats {
        self.layout().stats()
    }
}
