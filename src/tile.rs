//! Tile-parallel conversion over the 2D index space `[0, height) x [0, width)`.
//!
//! Tiles are not contiguous in the destination, so unlike the range
//! strategy they cannot be carved out with `split_at_mut`. Each tile writes
//! its rows through a shared raw pointer instead; tiles never overlap, which
//! keeps those writes disjoint.

use std::ops::Range;

use rayon::iter::ParallelIterator;

use crate::{weights::convert_span, Dimensions, Scheduler};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Tile {
    rows: Range<usize>,
    cols: Range<usize>,
}

impl Tile {
    // Splits along the longer extent, rows on ties.
    fn split(self) -> (Self, Option<Self>) {
        let Tile { rows, cols } = self;
        if rows.len() < cols.len() {
            let mid = cols.start + cols.len() / 2;
            (
                Tile {
                    rows: rows.clone(),
                    cols: cols.start..mid,
                },
                Some(Tile {
                    rows,
                    cols: mid..cols.end,
                }),
            )
        } else if rows.len() > 1 {
            let mid = rows.start + rows.len() / 2;
            (
                Tile {
                    rows: rows.start..mid,
                    cols: cols.clone(),
                },
                Some(Tile {
                    rows: mid..rows.end,
                    cols,
                }),
            )
        } else {
            (Tile { rows, cols }, None)
        }
    }
}

#[derive(Clone, Copy)]
struct LumaPtr(*mut u8);

// SAFETY: the pointer is only dereferenced for the rows of a single tile,
// and tiles partition the image, so no two threads write the same byte.
unsafe impl Send for LumaPtr {}
// SAFETY: see above.
unsafe impl Sync for LumaPtr {}

/// Tile-parallel conversion.
///
/// For every row of a tile, the source starts at
/// `(cols.start + y * width) * stride` and the destination at
/// `cols.start + y * width`; the columns of the tile are then converted like
/// any other run of pixels.
pub fn convert(scheduler: &Scheduler, source: &[u8], luma: &mut [u8], dims: Dimensions) {
    debug_assert!(dims.check_buffers(source, luma).is_ok());
    assert!(luma.len() >= dims.pixel_count());

    let width = dims.width();
    let stride = dims.stride();
    let out = LumaPtr(luma.as_mut_ptr());
    let root = Tile {
        rows: 0..dims.height(),
        cols: 0..width,
    };

    scheduler.install(|| {
        rayon::iter::split(root, Tile::split).for_each(|tile| {
            let out = out;
            for y in tile.rows {
                let offset = tile.cols.start + y * width;
                // SAFETY: `offset + cols.len() <= width * height <= luma.len()`,
                // and this tile is the only one covering these columns of row `y`.
                let row = unsafe { std::slice::from_raw_parts_mut(out.0.add(offset), tile.cols.len()) };
                convert_span(&source[offset * stride..], row, stride);
            }
        });
    });
}
