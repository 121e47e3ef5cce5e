use crate::error::Result;
use crate::model::Rect;

pub mod first_fit;

/// A packer places rectangles onto one fixed-size canvas.
///
/// Implementations must ensure no overlaps between the padded footprints they
/// hand out. `pack` returns `Ok(None)` when the rectangle does not fit on this
/// canvas, and an error only when the packer's own state is found corrupt.
pub trait Packer {
    fn canvas_size(&self) -> u32;
    fn pack(&mut self, w: u32, h: u32) -> Result<Option<Rect>>;
}
