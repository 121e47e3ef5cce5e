use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use crate::config::PackerConfig;
use crate::error::{Result, TileAtlasError};
use crate::item::{ItemSet, PackableItem};
use crate::model::Rect;
use crate::packer::{Packer, first_fit::FirstFitPacker};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Item -> placed rectangle, keyed by content.
///
/// Iteration follows placement order. Looking up any content-equal item
/// returns the one shared placement.
#[derive(Debug, Clone, Default)]
pub struct PlacementMap {
    entries: Vec<(PackableItem, Rect)>,
    index: HashMap<PackableItem, usize>,
}

impl PlacementMap {
    fn insert(&mut self, item: PackableItem, rect: Rect) {
        match self.index.get(&item) {
            Some(&i) => self.entries[i].1 = rect,
            None => {
                self.index.insert(item.clone(), self.entries.len());
                self.entries.push((item, rect));
            }
        }
    }

    /// Placed rectangle (unpadded) for `item`.
    pub fn get(&self, item: &PackableItem) -> Option<Rect> {
        self.index.get(item).map(|&i| self.entries[i].1)
    }

    /// Top-left pixel coordinate for `item`.
    pub fn position(&self, item: &PackableItem) -> Option<(u32, u32)> {
        self.get(item).map(|r| (r.x, r.y))
    }

    pub fn contains(&self, item: &PackableItem) -> bool {
        self.index.contains_key(item)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PackableItem, Rect)> + '_ {
        self.entries.iter().map(|(item, rect)| (item, *rect))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of a successful pack.
#[derive(Debug, Clone)]
pub struct PackOutcome {
    /// Side of the square, power-of-two canvas.
    pub canvas_size: u32,
    pub placements: PlacementMap,
    /// Number of canvas sizes tried, the successful one included.
    pub attempts: u32,
}

#[instrument(skip_all, fields(items = items.len()))]
/// Packs `items` into the smallest power-of-two square canvas that holds all of them.
///
/// Notes:
/// - Content-equal items are placed once.
/// - Items are placed tallest first, then widest, then in content order, so the
///   result does not depend on input order.
/// - Every canvas size starts from a brand-new grid; sizes stop at `max_canvas_size`.
pub fn pack(items: &[PackableItem], cfg: &PackerConfig) -> Result<PackOutcome> {
    cfg.validate()?;

    if items.is_empty() {
        return Err(TileAtlasError::Empty);
    }

    let set: ItemSet = items.iter().cloned().collect();
    let mut ordered: Vec<&PackableItem> = set.items().iter().collect();
    ordered.sort();

    // Any canvas smaller than the largest padded side cannot succeed.
    let largest = ordered
        .iter()
        .map(|it| it.width().max(it.height()).saturating_add(cfg.margin))
        .max()
        .unwrap_or(1);
    let limit_exceeded = || TileAtlasError::CanvasLimitExceeded {
        max_size: cfg.max_canvas_size,
        items: ordered.len(),
    };
    let mut size = match largest.checked_next_power_of_two() {
        Some(s) if s <= cfg.max_canvas_size => s,
        _ => {
            warn!(largest, max = cfg.max_canvas_size, "item larger than the canvas limit");
            return Err(limit_exceeded());
        }
    };

    let mut attempts = 0u32;
    loop {
        attempts += 1;
        debug!(size, attempt = attempts, "trying canvas size");
        if let Some(placements) = try_size(&ordered, size, cfg)? {
            debug!(size, placed = placements.len(), "all items placed");
            return Ok(PackOutcome {
                canvas_size: size,
                placements,
                attempts,
            });
        }
        match size.checked_mul(2) {
            Some(next) if next <= cfg.max_canvas_size => size = next,
            _ => break,
        }
    }
    warn!(
        max = cfg.max_canvas_size,
        items = ordered.len(),
        "items do not fit in the largest allowed canvas"
    );
    Err(limit_exceeded())
}

/// One attempt at a fixed size. `Ok(None)` means some item did not fit.
fn try_size(ordered: &[&PackableItem], size: u32, cfg: &PackerConfig) -> Result<Option<PlacementMap>> {
    let mut packer = FirstFitPacker::new(cfg, size);
    let mut placements = PlacementMap::default();
    for item in ordered {
        match packer.pack(item.width(), item.height())? {
            Some(rect) => placements.insert((*item).clone(), rect),
            None => {
                debug!(
                    size,
                    w = item.width(),
                    h = item.height(),
                    placed = placements.len(),
                    "item does not fit"
                );
                return Ok(None);
            }
        }
    }
    packer.grid().check_integrity()?;
    Ok(Some(placements))
}

/// Packs several independent item sets, e.g. a palette atlas and one atlas per sprite.
///
/// With the `parallel` feature the sets are packed concurrently; results keep input order.
pub fn pack_many(batches: &[Vec<PackableItem>], cfg: &PackerConfig) -> Vec<Result<PackOutcome>> {
    #[cfg(feature = "parallel")]
    {
        batches.par_iter().map(|b| pack(b, cfg)).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        batches.iter().map(|b| pack(b, cfg)).collect()
    }
}
