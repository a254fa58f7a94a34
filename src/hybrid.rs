use std::ops::Range;

use crate::{
    dims::{VECTOR_BYTES, VECTOR_PIXELS},
    range::parallel_for,
    vector::hadd_span,
    Dimensions, Scheduler,
};

/// Range-parallel conversion whose sub-ranges run the horizontal-add vector
/// kernel.
///
/// Sub-ranges are split on 4-pixel boundaries, so every worker sees whole
/// 16-byte blocks. Same preconditions as the vector strategies, and the same
/// bit-exact output as the serial reference.
pub fn convert(scheduler: &Scheduler, source: &[u8], luma: &mut [u8], dims: Dimensions) {
    debug_assert!(dims.check_buffers(source, luma).is_ok());
    debug_assert!(dims.check_vectorizable().is_ok());

    parallel_for(
        scheduler,
        luma,
        VECTOR_PIXELS,
        &|range: Range<usize>, out: &mut [u8]| {
            let start = range.start * dims.stride();
            let end = start + out.len() / VECTOR_PIXELS * VECTOR_BYTES;
            hadd_span(&source[start..end], out);
        },
    );
}
