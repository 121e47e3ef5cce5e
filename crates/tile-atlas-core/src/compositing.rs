use image::{Rgba, RgbaImage};

use crate::source::{Palette, TileSource};

/// Blit an indexed tile into `canvas` at destination (dx, dy), resolving each
/// index through `palette`, then optionally draw a red 1px outline around the
/// blitted area for debugging.
///
/// Pixels falling outside the canvas are skipped.
pub fn blit_indexed(
    src: &dyn TileSource,
    palette: &Palette,
    canvas: &mut RgbaImage,
    dx: u32,
    dy: u32,
    outlines: bool,
) {
    let (cw, ch) = canvas.dimensions();
    let (rw, rh) = (src.width(), src.height());

    for yy in 0..rh {
        for xx in 0..rw {
            if dx + xx < cw && dy + yy < ch {
                let px = palette.resolve(src.tile_at(xx, yy));
                canvas.put_pixel(dx + xx, dy + yy, px);
            }
        }
    }

    if outlines {
        let red = Rgba([255, 0, 0, 255]);
        for xx in 0..rw {
            if dx + xx < cw && dy < ch {
                canvas.put_pixel(dx + xx, dy, red);
            }
            let by = dy + rh.saturating_sub(1);
            if dx + xx < cw && by < ch {
                canvas.put_pixel(dx + xx, by, red);
            }
        }
        for yy in 0..rh {
            if dx < cw && dy + yy < ch {
                canvas.put_pixel(dx, dy + yy, red);
            }
            let rx = dx + rw.saturating_sub(1);
            if rx < cw && dy + yy < ch {
                canvas.put_pixel(rx, dy + yy, red);
            }
        }
    }
}
