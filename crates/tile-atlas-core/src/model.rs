use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the two rectangles share at least one pixel.
    pub fn intersects(&self, r: &Rect) -> bool {
        self.w > 0
            && self.h > 0
            && r.w > 0
            && r.h > 0
            && self.x < r.x + r.w
            && r.x < self.x + self.w
            && self.y < r.y + r.h
            && r.y < self.y + self.h
    }
    /// Grows the rectangle by `margin` on its right and bottom edges.
    pub fn padded(&self, margin: u32) -> Rect {
        Rect::new(self.x, self.y, self.w + margin, self.h + margin)
    }
}

/// One source (palette tile or sprite frame) as it appears in the atlas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasFrame {
    /// Source key (tile name, or `sprite/direction/frame`).
    pub key: String,
    /// Index of the distinct packed item this source resolves to.
    pub item: usize,
    /// Placed rectangle within the canvas (unpadded).
    pub frame: Rect,
    /// True if another source resolves to the same item.
    pub shared: bool,
}

/// Atlas-level metadata (common fields used by exporters/templates).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    /// Schema version for JSON metadata formats. Current: "1".
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub format: String,
    pub size: u32,
    pub margin: u32,
    pub direction: Option<u8>,
    pub palette_len: usize,
}

/// Serializable description of a packed atlas: one rect per distinct item
/// plus one frame per source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasLayout {
    pub size: u32,
    pub items: Vec<Rect>,
    pub frames: Vec<AtlasFrame>,
    pub meta: Meta,
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    /// Side of the square canvas.
    pub canvas_size: u32,
    /// Number of distinct (deduplicated) items placed.
    pub num_items: usize,
    /// Number of sources (tiles + frames) referencing those items.
    pub num_sources: usize,
    /// Number of sources that reuse an item placed for another source.
    pub num_deduplicated: usize,
    /// Total canvas area (`size * size`).
    pub canvas_area: u64,
    /// Area covered by distinct items (unpadded).
    pub used_area: u64,
    /// Occupancy ratio: used_area / canvas_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl AtlasLayout {
    /// Computes packing statistics for this layout.
    pub fn stats(&self) -> PackStats {
        let canvas_area = (self.size as u64) * (self.size as u64);
        let used_area: u64 = self
            .items
            .iter()
            .map(|r| (r.w as u64) * (r.h as u64))
            .sum();
        let occupancy = if canvas_area > 0 {
            used_area as f64 / canvas_area as f64
        } else {
            0.0
        };
        PackStats {
            canvas_size: self.size,
            num_items: self.items.len(),
            num_sources: self.frames.len(),
            num_deduplicated: self.frames.len().saturating_sub(self.items.len()),
            canvas_area,
            used_area,
            occupancy,
        }
    }
}

impl PackStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Canvas: {}x{}, Items: {}, Sources: {} ({} deduplicated), Occupancy: {:.2}%, Used Area: {} px²",
            self.canvas_size,
            self.canvas_size,
            self.num_items,
            self.num_sources,
            self.num_deduplicated,
            self.occupancy * 100.0,
            self.used_area,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.canvas_area.saturating_sub(self.used_area)
    }

    /// Returns wasted space as a percentage (0.0 to 100.0).
    pub fn waste_percentage(&self) -> f64 {
        if self.canvas_area > 0 {
            (self.wasted_area() as f64 / self.canvas_area as f64) * 100.0
        } else {
            0.0
        }
    }
}
