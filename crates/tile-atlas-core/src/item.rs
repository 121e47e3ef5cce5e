//! Packable items and content-addressed deduplication.
//!
//! Two items are the same item when their dimensions and every tile index
//! match; where the tile came from (palette cell, animation frame, which
//! direction) does not matter. Identical content is placed once.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{Result, TileAtlasError};
use crate::source::TileSource;

/// Position-indexed multipliers for the structural content hash.
const HASH_PRIMES: [u64; 8] = [31, 37, 41, 43, 47, 53, 59, 61];
const HASH_STEP: u64 = 1_000_003;

/// Index of a distinct item inside an [`ItemSet`].
pub type ItemId = usize;

/// Immutable view over one tile source, compared by content.
#[derive(Clone)]
pub struct PackableItem {
    source: Arc<dyn TileSource>,
    width: u32,
    height: u32,
    hash: u64,
}

impl PackableItem {
    /// Wraps `source`; zero-sized sources are rejected since they can never be placed.
    pub fn new(source: Arc<dyn TileSource>) -> Result<Self> {
        let (width, height) = (source.width(), source.height());
        if width == 0 || height == 0 {
            return Err(TileAtlasError::InvalidDimensions { width, height });
        }
        let hash = content_hash(source.as_ref());
        Ok(Self {
            source,
            width,
            height,
            hash,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn source(&self) -> &Arc<dyn TileSource> {
        &self.source
    }

    /// Structural hash of width, height and tile content. Stable across runs.
    pub fn content_hash(&self) -> u64 {
        self.hash
    }

    fn cmp_content(&self, other: &Self) -> Ordering {
        for y in 0..self.height {
            for x in 0..self.width {
                let o = self
                    .source
                    .tile_at(x, y)
                    .cmp(&other.source.tile_at(x, y));
                if o != Ordering::Equal {
                    return o;
                }
            }
        }
        Ordering::Equal
    }
}

fn content_hash(src: &dyn TileSource) -> u64 {
    let (w, h) = (src.width(), src.height());
    let mut acc = (w as u64)
        .wrapping_mul(HASH_PRIMES[0])
        .wrapping_add((h as u64).wrapping_mul(HASH_PRIMES[1]));
    for y in 0..h {
        for x in 0..w {
            let pos = (y as usize) * (w as usize) + x as usize;
            let prime = HASH_PRIMES[pos % HASH_PRIMES.len()];
            let v = src.tile_at(x, y) as u64 + 1;
            acc = acc.wrapping_mul(HASH_STEP).wrapping_add(v.wrapping_mul(prime));
        }
    }
    acc
}

impl PartialEq for PackableItem {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::addr_eq(Arc::as_ptr(&self.source), Arc::as_ptr(&other.source)) {
            return true;
        }
        self.width == other.width
            && self.height == other.height
            && self.hash == other.hash
            && self.cmp_content(other) == Ordering::Equal
    }
}

impl Eq for PackableItem {}

impl Hash for PackableItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

/// Placement order: tallest first, then widest, then by content hash and
/// finally by raw content, so the order is total and independent of input order.
impl Ord for PackableItem {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .height
            .cmp(&self.height)
            .then_with(|| other.width.cmp(&self.width))
            .then_with(|| self.hash.cmp(&other.hash))
            .then_with(|| self.cmp_content(other))
    }
}

impl PartialOrd for PackableItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for PackableItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackableItem")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("hash", &format_args!("{:016x}", self.hash))
            .finish()
    }
}

/// Deduplicating collection of items.
///
/// Every inserted source gets an entry in [`ItemSet::mapping`] pointing at the
/// distinct item that represents it.
#[derive(Debug, Default, Clone)]
pub struct ItemSet {
    items: Vec<PackableItem>,
    index: HashMap<PackableItem, ItemId>,
    mapping: Vec<ItemId>,
}

impl ItemSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `item`, returning the id of the content-equal item already present if any.
    pub fn insert(&mut self, item: PackableItem) -> ItemId {
        let id = match self.index.get(&item) {
            Some(&id) => id,
            None => {
                let id = self.items.len();
                self.items.push(item.clone());
                self.index.insert(item, id);
                id
            }
        };
        self.mapping.push(id);
        id
    }

    pub fn insert_source(&mut self, source: Arc<dyn TileSource>) -> Result<ItemId> {
        Ok(self.insert(PackableItem::new(source)?))
    }

    /// Distinct items in first-seen order.
    pub fn items(&self) -> &[PackableItem] {
        &self.items
    }

    /// One entry per inserted source, in insertion order.
    pub fn mapping(&self) -> &[ItemId] {
        &self.mapping
    }

    pub fn get(&self, id: ItemId) -> Option<&PackableItem> {
        self.items.get(id)
    }

    pub fn id_of(&self, item: &PackableItem) -> Option<ItemId> {
        self.index.get(item).copied()
    }

    /// Number of distinct items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<PackableItem> for ItemSet {
    fn from_iter<I: IntoIterator<Item = PackableItem>>(iter: I) -> Self {
        let mut set = ItemSet::new();
        for item in iter {
            set.insert(item);
        }
        set
    }
}
