//! Free-space grid: a spreadsheet-like subdivision of the canvas.
//!
//! Cells live in an arena and point at their four neighbours through
//! `Option<CellId>` handles. The grid is always rectangular: walking `c`
//! cells right from the top-left and then `r` cells down reaches cell
//! `(c, r)` for every valid pair, every cell of a column has the same width
//! and every cell of a row the same height. [`FreeSpaceGrid::divide`] keeps
//! this true by cutting the whole column (or row) the split cell belongs to.
//!
//! ```text
//! divide(b, 3, Horizontal) on a 2x2 grid with 8px wide columns:
//!
//!   +--------+--------+        +--------+---+----+
//!   |   a    |   b    |        |   a    | b | b' |
//!   +--------+--------+   ->   +--------+---+----+
//!   |   c    |   d    |        |   c    | d | d' |
//!   +--------+--------+        +--------+---+----+
//! ```

use std::collections::VecDeque;

use thiserror::Error;

use crate::model::Rect;

/// Handle of a cell inside a [`FreeSpaceGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u32);

impl CellId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Direction of a measurement or of a cut.
///
/// `Horizontal` runs left to right (widths); dividing along it cuts a column
/// in two. `Vertical` runs top to bottom (heights); dividing along it cuts a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// Side reached when moving forward along this axis.
    fn forward(self) -> Side {
        match self {
            Axis::Horizontal => Side::Right,
            Axis::Vertical => Side::Bottom,
        }
    }

    fn backward(self) -> Side {
        match self {
            Axis::Horizontal => Side::Left,
            Axis::Vertical => Side::Top,
        }
    }

    fn perpendicular(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];

    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
        }
    }

    fn slot(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
            Side::Top => 2,
            Side::Bottom => 3,
        }
    }
}

/// One rectangular region of the canvas.
#[derive(Debug, Clone)]
pub struct Cell {
    pub width: u32,
    pub height: u32,
    pub occupied: bool,
    sides: [Option<CellId>; 4],
}

impl Cell {
    fn new(width: u32, height: u32, occupied: bool) -> Self {
        Self {
            width,
            height,
            occupied,
            sides: [None; 4],
        }
    }

    /// Neighbour on `side`, `None` on the canvas edge.
    pub fn neighbor(&self, side: Side) -> Option<CellId> {
        self.sides[side.slot()]
    }

    fn set_neighbor(&mut self, side: Side, id: Option<CellId>) {
        self.sides[side.slot()] = id;
    }

    /// Width for `Horizontal`, height for `Vertical`.
    pub fn extent(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    fn set_extent(&mut self, axis: Axis, v: u32) {
        match axis {
            Axis::Horizontal => self.width = v,
            Axis::Vertical => self.height = v,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("cell ({column}, {row}) is outside the {columns}x{rows} grid")]
    OutOfBounds {
        column: usize,
        row: usize,
        columns: usize,
        rows: usize,
    },
    #[error("block of {colspan}x{rowspan} cells runs off the grid")]
    BlockOutOfBounds { colspan: usize, rowspan: usize },
    #[error("cannot split a cell of extent {extent} at offset {offset}")]
    InvalidSplit { offset: u32, extent: u32 },
    #[error("integrity violated at cell ({column}, {row}): {detail}")]
    Integrity {
        column: usize,
        row: usize,
        detail: String,
    },
}

fn integrity(column: usize, row: usize, detail: impl Into<String>) -> GridError {
    GridError::Integrity {
        column,
        row,
        detail: detail.into(),
    }
}

/// Arena-backed grid of cells covering a `width x height` canvas.
#[derive(Debug, Clone)]
pub struct FreeSpaceGrid {
    cells: Vec<Cell>,
    width: u32,
    height: u32,
    columns: usize,
    rows: usize,
}

impl FreeSpaceGrid {
    /// A grid made of one empty cell covering the whole canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            cells: vec![Cell::new(width, height, false)],
            width,
            height,
            columns: 1,
            rows: 1,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of cells in the arena (`columns * rows` while the grid is sound).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The top-left cell. Splits keep the original cell on the left/top, so it never moves.
    pub fn origin(&self) -> CellId {
        CellId(0)
    }

    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.index()]
    }

    fn cell_mut(&mut self, id: CellId) -> &mut Cell {
        &mut self.cells[id.index()]
    }

    pub fn neighbor(&self, id: CellId, side: Side) -> Option<CellId> {
        self.cell(id).neighbor(side)
    }

    /// Moves `steps` cells towards `side`; `None` when the edge comes first.
    pub fn step(&self, from: CellId, side: Side, steps: usize) -> Option<CellId> {
        let mut cur = from;
        for _ in 0..steps {
            cur = self.neighbor(cur, side)?;
        }
        Some(cur)
    }

    /// Cell `(column, row)`, reached by walking right then down from the origin.
    pub fn get(&self, column: usize, row: usize) -> Result<CellId, GridError> {
        let oob = || GridError::OutOfBounds {
            column,
            row,
            columns: self.columns,
            rows: self.rows,
        };
        let top = self.step(self.origin(), Side::Right, column).ok_or_else(oob)?;
        self.step(top, Side::Bottom, row).ok_or_else(oob)
    }

    /// Number of contiguous empty cells from `cell` along `axis` needed to cover
    /// `required` pixels, or 0 when an occupied cell or the edge comes first.
    pub fn span(&self, cell: CellId, required: u32, axis: Axis) -> usize {
        let mut covered = 0u64;
        let mut count = 0usize;
        let mut cur = Some(cell);
        while let Some(id) = cur {
            let c = self.cell(id);
            if c.occupied {
                return 0;
            }
            covered += c.extent(axis) as u64;
            count += 1;
            if covered >= required as u64 {
                return count;
            }
            cur = c.neighbor(axis.forward());
        }
        0
    }

    /// Sum of `axis` extents of `count` cells starting at `cell`.
    pub fn extent_of(&self, cell: CellId, count: usize, axis: Axis) -> Option<u64> {
        let mut total = 0u64;
        let mut cur = Some(cell);
        for _ in 0..count {
            let id = cur?;
            total += self.cell(id).extent(axis) as u64;
            cur = self.neighbor(id, axis.forward());
        }
        Some(total)
    }

    /// Splits `cell` at `offset` pixels into its `axis` extent and returns the new
    /// sibling (right of the cell for `Horizontal`, below it for `Vertical`).
    ///
    /// The cut is propagated through the perpendicular chain of neighbours, so a
    /// horizontal divide splits every cell of the column and a vertical divide
    /// every cell of the row. Siblings inherit occupancy and the perpendicular extent.
    pub fn divide(&mut self, cell: CellId, offset: u32, axis: Axis) -> Result<CellId, GridError> {
        let extent = self.cell(cell).extent(axis);
        if offset == 0 || offset >= extent {
            return Err(GridError::InvalidSplit { offset, extent });
        }

        // Breadth-first walk outward along both perpendicular directions; `chain`
        // ends up ordered from the first cell of the column/row to the last.
        let across = axis.perpendicular();
        let mut chain: VecDeque<CellId> = VecDeque::from([cell]);
        let mut before = self.neighbor(cell, across.backward());
        let mut after = self.neighbor(cell, across.forward());
        while before.is_some() || after.is_some() {
            if let Some(id) = before {
                chain.push_front(id);
                before = self.neighbor(id, across.backward());
            }
            if let Some(id) = after {
                chain.push_back(id);
                after = self.neighbor(id, across.forward());
            }
        }
        for &id in &chain {
            let e = self.cell(id).extent(axis);
            if e != extent {
                return Err(integrity(
                    0,
                    0,
                    format!("split chain holds extents {} and {}", extent, e),
                ));
            }
        }

        let (near, far) = (axis.backward(), axis.forward());
        let mut siblings = Vec::with_capacity(chain.len());
        let mut result = cell;
        for &id in &chain {
            let old = self.cell(id);
            let mut sibling = Cell::new(old.width, old.height, old.occupied);
            sibling.set_extent(axis, extent - offset);
            let outer = old.neighbor(far);
            sibling.set_neighbor(near, Some(id));
            sibling.set_neighbor(far, outer);

            let sid = CellId(self.cells.len() as u32);
            self.cells.push(sibling);
            if let Some(o) = outer {
                self.cell_mut(o).set_neighbor(near, Some(sid));
            }
            let c = self.cell_mut(id);
            c.set_neighbor(far, Some(sid));
            c.set_extent(axis, offset);

            if id == cell {
                result = sid;
            }
            siblings.push(sid);
        }
        for pair in siblings.windows(2) {
            self.cell_mut(pair[0])
                .set_neighbor(across.forward(), Some(pair[1]));
            self.cell_mut(pair[1])
                .set_neighbor(across.backward(), Some(pair[0]));
        }

        match axis {
            Axis::Horizontal => self.columns += 1,
            Axis::Vertical => self.rows += 1,
        }
        Ok(result)
    }

    fn for_each_in_block(
        &self,
        cell: CellId,
        colspan: usize,
        rowspan: usize,
        mut f: impl FnMut(CellId) -> bool,
    ) -> Result<(), GridError> {
        let oob = GridError::BlockOutOfBounds { colspan, rowspan };
        let mut row_start = Some(cell);
        for _ in 0..rowspan {
            let start = row_start.ok_or_else(|| oob.clone())?;
            let mut cur = Some(start);
            for _ in 0..colspan {
                let id = cur.ok_or_else(|| oob.clone())?;
                if !f(id) {
                    return Ok(());
                }
                cur = self.neighbor(id, Side::Right);
            }
            row_start = self.neighbor(start, Side::Bottom);
        }
        Ok(())
    }

    /// True when every cell of the `colspan x rowspan` block at `cell` is empty.
    /// A block running off the grid is never empty.
    pub fn is_block_empty(&self, cell: CellId, colspan: usize, rowspan: usize) -> bool {
        let mut empty = true;
        let walked = self.for_each_in_block(cell, colspan, rowspan, |id| {
            empty = !self.cell(id).occupied;
            empty
        });
        walked.is_ok() && empty
    }

    /// Marks every cell of the `colspan x rowspan` block at `cell` as occupied.
    pub fn mark_occupied(
        &mut self,
        cell: CellId,
        colspan: usize,
        rowspan: usize,
    ) -> Result<(), GridError> {
        let mut block = Vec::with_capacity(colspan * rowspan);
        self.for_each_in_block(cell, colspan, rowspan, |id| {
            block.push(id);
            true
        })?;
        for id in block {
            self.cell_mut(id).occupied = true;
        }
        Ok(())
    }

    /// Pixel position of the top-left corner of cell `(column, row)`.
    pub fn origin_of(&self, column: usize, row: usize) -> Result<(u32, u32), GridError> {
        self.get(column, row)?;
        let origin = self.origin();
        let x = self.extent_of(origin, column, Axis::Horizontal).unwrap_or(0);
        let y = self.extent_of(origin, row, Axis::Vertical).unwrap_or(0);
        Ok((x as u32, y as u32))
    }

    /// Pixel rectangle covered by cell `(column, row)`.
    pub fn cell_rect(&self, column: usize, row: usize) -> Result<Rect, GridError> {
        let (x, y) = self.origin_of(column, row)?;
        let c = self.cell(self.get(column, row)?);
        Ok(Rect::new(x, y, c.width, c.height))
    }

    /// Walks every row and column and verifies the rectangular-grid invariant:
    /// back-links agree, only edge cells miss neighbours (and exactly on their
    /// edge side), column widths and row heights are uniform, and extents add
    /// up to the canvas size.
    pub fn check_integrity(&self) -> Result<(), GridError> {
        if self.cells.len() != self.columns * self.rows {
            return Err(integrity(
                0,
                0,
                format!(
                    "{} cells for a {}x{} grid",
                    self.cells.len(),
                    self.columns,
                    self.rows
                ),
            ));
        }

        let mut widths: Vec<u32> = Vec::with_capacity(self.columns);
        let mut prev_row: Vec<CellId> = Vec::with_capacity(self.columns);
        let mut row_start = Some(self.origin());
        let mut total_h = 0u64;

        for r in 0..self.rows {
            let start =
                row_start.ok_or_else(|| integrity(0, r, "column 0 ends before the last row"))?;
            let row_height = self.cell(start).height;
            let mut this_row = Vec::with_capacity(self.columns);
            let mut cur = Some(start);
            let mut total_w = 0u64;

            for c in 0..self.columns {
                let id = cur.ok_or_else(|| integrity(c, r, "row ends before the last column"))?;
                let cell = self.cell(id);

                let expect_edge = [
                    (Side::Left, c == 0),
                    (Side::Right, c + 1 == self.columns),
                    (Side::Top, r == 0),
                    (Side::Bottom, r + 1 == self.rows),
                ];
                for (side, on_edge) in expect_edge {
                    if cell.neighbor(side).is_none() != on_edge {
                        return Err(integrity(
                            c,
                            r,
                            format!(
                                "{:?} neighbour is {} but the cell is {}on that edge",
                                side,
                                if on_edge { "present" } else { "missing" },
                                if on_edge { "" } else { "not " }
                            ),
                        ));
                    }
                }
                for side in Side::ALL {
                    if let Some(n) = cell.neighbor(side) {
                        if self.neighbor(n, side.opposite()) != Some(id) {
                            return Err(integrity(
                                c,
                                r,
                                format!("{:?} neighbour does not link back", side),
                            ));
                        }
                    }
                }
                if r > 0 && cell.neighbor(Side::Top) != Some(prev_row[c]) {
                    return Err(integrity(c, r, "top neighbour is not the cell above"));
                }

                if cell.height != row_height {
                    return Err(integrity(
                        c,
                        r,
                        format!("height {} differs from row height {}", cell.height, row_height),
                    ));
                }
                if r == 0 {
                    widths.push(cell.width);
                } else if cell.width != widths[c] {
                    return Err(integrity(
                        c,
                        r,
                        format!("width {} differs from column width {}", cell.width, widths[c]),
                    ));
                }
                if cell.width == 0 || cell.height == 0 {
                    return Err(integrity(c, r, "zero-sized cell"));
                }

                total_w += cell.width as u64;
                this_row.push(id);
                cur = cell.neighbor(Side::Right);
            }

            if total_w != self.width as u64 {
                return Err(integrity(
                    0,
                    r,
                    format!("row covers {} px of {}", total_w, self.width),
                ));
            }
            total_h += row_height as u64;
            row_start = self.cell(start).neighbor(Side::Bottom);
            prev_row = this_row;
        }

        if total_h != self.height as u64 {
            return Err(integrity(
                0,
                0,
                format!("columns cover {} px of {}", total_h, self.height),
            ));
        }
        Ok(())
    }
}
