use tracing::trace;

use super::Packer;
use crate::config::PackerConfig;
use crate::error::{Result, TileAtlasError};
use crate::grid::{Axis, CellId, FreeSpaceGrid, GridError, Side};
use crate::model::Rect;

/// First-fit placement over a [`FreeSpaceGrid`] for one square canvas.
///
/// Columns are scanned left to right and, inside each column, rows top to
/// bottom; the first cell whose empty block covers the padded item wins.
pub struct FirstFitPacker {
    grid: FreeSpaceGrid,
    margin: u32,
    check_integrity: bool,
}

impl FirstFitPacker {
    pub fn new(config: &PackerConfig, size: u32) -> Self {
        Self {
            grid: FreeSpaceGrid::new(size, size),
            margin: config.margin,
            check_integrity: config.check_integrity,
        }
    }

    pub fn grid(&self) -> &FreeSpaceGrid {
        &self.grid
    }

    /// Finds the first cell able to hold a `w x h` footprint, claims it and
    /// returns its pixel position.
    fn place(&mut self, w: u32, h: u32) -> std::result::Result<Option<(u32, u32)>, GridError> {
        let mut column_top = Some(self.grid.origin());
        let mut x = 0u32;
        while let Some(top) = column_top {
            let mut cur = Some(top);
            let mut y = 0u32;
            while let Some(cell) = cur {
                let rowspan = self.grid.span(cell, h, Axis::Vertical);
                if rowspan > 0 {
                    let colspan = self.grid.span(cell, w, Axis::Horizontal);
                    if colspan > 0 && self.grid.is_block_empty(cell, colspan, rowspan) {
                        self.claim(cell, colspan, rowspan, w, h)?;
                        return Ok(Some((x, y)));
                    }
                }
                y += self.grid.cell(cell).height;
                cur = self.grid.neighbor(cell, Side::Bottom);
            }
            x += self.grid.cell(top).width;
            column_top = self.grid.neighbor(top, Side::Right);
        }
        Ok(None)
    }

    /// Cuts the last column and last row of the block so it ends exactly at
    /// `w x h`, then marks it occupied. Earlier cells of the span are consumed whole.
    fn claim(
        &mut self,
        cell: CellId,
        colspan: usize,
        rowspan: usize,
        w: u32,
        h: u32,
    ) -> std::result::Result<(), GridError> {
        self.trim_span(cell, colspan, w, Axis::Horizontal)?;
        self.trim_span(cell, rowspan, h, Axis::Vertical)?;
        self.grid.mark_occupied(cell, colspan, rowspan)
    }

    fn trim_span(
        &mut self,
        cell: CellId,
        span: usize,
        need: u32,
        axis: Axis,
    ) -> std::result::Result<(), GridError> {
        let forward = match axis {
            Axis::Horizontal => Side::Right,
            Axis::Vertical => Side::Bottom,
        };
        let oob = || GridError::BlockOutOfBounds {
            colspan: span,
            rowspan: span,
        };
        let covered = self.grid.extent_of(cell, span, axis).ok_or_else(oob)?;
        let excess = covered.saturating_sub(need as u64) as u32;
        if excess > 0 {
            let last = self.grid.step(cell, forward, span - 1).ok_or_else(oob)?;
            let last_extent = self.grid.cell(last).extent(axis);
            self.grid.divide(last, last_extent - excess, axis)?;
        }
        Ok(())
    }
}

impl Packer for FirstFitPacker {
    fn canvas_size(&self) -> u32 {
        self.grid.width()
    }

    fn pack(&mut self, w: u32, h: u32) -> Result<Option<Rect>> {
        if w == 0 || h == 0 {
            return Err(TileAtlasError::InvalidDimensions {
                width: w,
                height: h,
            });
        }
        let pw = w.saturating_add(self.margin);
        let ph = h.saturating_add(self.margin);
        if pw > self.grid.width() || ph > self.grid.height() {
            return Ok(None);
        }
        let placed = self.place(pw, ph)?;
        if self.check_integrity {
            self.grid.check_integrity()?;
        }
        Ok(placed.map(|(x, y)| {
            trace!(x, y, w, h, cells = self.grid.len(), "placed");
            Rect::new(x, y, w, h)
        }))
    }
}
