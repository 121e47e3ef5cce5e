//! Core library for packing indexed tiles and sprite frames into a single atlas.
//!
//! - Algorithm: first-fit over a free-space grid that subdivides as items land;
//!   the canvas is square, a power of two, and doubles until everything fits
//! - Deduplication: content-equal tiles are packed once and shared by every source
//! - Atlas interface: `AtlasBuilder` collects palette tiles and sprites, `TileAtlas`
//!   renders the sheet and feeds the exporters (JSON hash/array, C lookup table)
//!
//! Quick example:
//! ```ignore
//! use std::sync::Arc;
//! use tile_atlas_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let palette = Palette::from_colors([image::Rgba([0, 0, 0, 0]), image::Rgba([255, 255, 255, 255])])?;
//! let grass = Arc::new(IndexedTile::filled(16, 16, 1)?);
//! let atlas = AtlasBuilder::new(palette)
//!     .margin(1)
//!     .tile("grass", grass)
//!     .build()?;
//! println!("canvas: {}", atlas.canvas_size());
//! let png = atlas.render();
//! # Ok(()) }
//! ```

pub mod atlas;
pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod grid;
pub mod item;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod source;
pub mod sprite;

pub use atlas::*;
pub use config::*;
pub use error::*;
pub use export::*;
pub use item::*;
pub use model::*;
pub use packer::*;
pub use pipeline::*;
pub use source::*;
pub use sprite::*;

/// Convenience prelude for common types and functions.
/// Importing `tile_atlas_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::atlas::{AtlasBuilder, AtlasEntry, SourceRef, TileAtlas};
    pub use crate::config::{PackerConfig, PackerConfigBuilder};
    pub use crate::grid::{Axis, CellId, FreeSpaceGrid, GridError, Side};
    pub use crate::item::{ItemId, ItemSet, PackableItem};
    pub use crate::model::{AtlasFrame, AtlasLayout, Meta, PackStats, Rect};
    pub use crate::source::{IndexedTile, Palette, TileIndex, TileSource};
    pub use crate::sprite::{Sprite, SpriteFrame};
    pub use crate::{PackOutcome, PlacementMap, TileAtlasError, pack, pack_many};
}
