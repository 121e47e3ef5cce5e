//! Tile sources: the `(width, height, tile_at(x, y))` capability the packer
//! consumes, an owned indexed tile, and the palette that resolves indices to
//! colors.

use std::collections::HashMap;

use image::{Rgba, RgbaImage};

use crate::error::{Result, TileAtlasError};

/// Palette index stored per pixel.
pub type TileIndex = u16;

/// Read-only access to an indexed tile.
///
/// The packer never needs to know whether a source is a palette cell or an
/// animation frame; anything that can report its size and the index at a
/// pixel can be packed.
pub trait TileSource: Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Palette index at `(x, y)`. Callers stay within `width x height`.
    fn tile_at(&self, x: u32, y: u32) -> TileIndex;
}

/// Row-major indexed tile owned in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedTile {
    width: u32,
    height: u32,
    indices: Vec<TileIndex>,
}

impl IndexedTile {
    /// Builds a tile from row-major indices.
    pub fn new(width: u32, height: u32, indices: Vec<TileIndex>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(TileAtlasError::InvalidDimensions { width, height });
        }
        let expected = (width as usize) * (height as usize);
        if indices.len() != expected {
            return Err(TileAtlasError::InvalidInput(format!(
                "tile {}x{} needs {} indices, got {}",
                width,
                height,
                expected,
                indices.len()
            )));
        }
        Ok(Self {
            width,
            height,
            indices,
        })
    }

    /// A tile where every pixel uses `index`.
    pub fn filled(width: u32, height: u32, index: TileIndex) -> Result<Self> {
        Self::new(
            width,
            height,
            vec![index; (width as usize) * (height as usize)],
        )
    }

    /// Quantizes an RGBA image into `palette`, interning every new color.
    pub fn from_rgba(rgba: &RgbaImage, palette: &mut Palette) -> Result<Self> {
        let (w, h) = rgba.dimensions();
        let mut indices = Vec::with_capacity((w as usize) * (h as usize));
        for px in rgba.pixels() {
            indices.push(palette.intern(*px)?);
        }
        Self::new(w, h, indices)
    }

    pub fn indices(&self) -> &[TileIndex] {
        &self.indices
    }
}

impl TileSource for IndexedTile {
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }
    fn tile_at(&self, x: u32, y: u32) -> TileIndex {
        self.indices[(y as usize) * (self.width as usize) + x as usize]
    }
}

/// Ordered list of RGBA colors addressed by `TileIndex`.
#[derive(Debug, Clone, Default)]
pub struct Palette {
    colors: Vec<Rgba<u8>>,
    lookup: HashMap<[u8; 4], TileIndex>,
}

impl Palette {
    /// Largest number of colors addressable by a `TileIndex`.
    pub const MAX_COLORS: usize = TileIndex::MAX as usize + 1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a palette from a fixed color list.
    pub fn from_colors<I: IntoIterator<Item = Rgba<u8>>>(colors: I) -> Result<Self> {
        let mut palette = Self::new();
        for c in colors {
            palette.push(c)?;
        }
        Ok(palette)
    }

    /// Appends `color` unconditionally and returns its index.
    pub fn push(&mut self, color: Rgba<u8>) -> Result<TileIndex> {
        if self.colors.len() >= Self::MAX_COLORS {
            return Err(TileAtlasError::PaletteOverflow {
                max: Self::MAX_COLORS,
            });
        }
        let idx = self.colors.len() as TileIndex;
        self.colors.push(color);
        self.lookup.entry(color.0).or_insert(idx);
        Ok(idx)
    }

    /// Returns the index of `color`, appending it first if unseen.
    pub fn intern(&mut self, color: Rgba<u8>) -> Result<TileIndex> {
        match self.lookup.get(&color.0) {
            Some(&idx) => Ok(idx),
            None => self.push(color),
        }
    }

    /// Color for `index`; indices past the end resolve to transparent.
    pub fn resolve(&self, index: TileIndex) -> Rgba<u8> {
        self.colors
            .get(index as usize)
            .copied()
            .unwrap_or(Rgba([0, 0, 0, 0]))
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Rgba<u8>] {
        &self.colors
    }
}
