use wide::i32x4;

use crate::weights::{LumaWeights, FULL_PRECISION, REDUCED_PRECISION};

/// Full-precision block kernel for targets without the x86 paths.
pub(super) fn full_span(source: &[u8], luma: &mut [u8]) {
    weighted_span(source, luma, FULL_PRECISION);
}

/// Reduced-precision block kernel. None of the S = 7 intermediates reach the
/// 16-bit saturation point, so plain 32-bit lanes give the same bytes as the
/// SSSE3 kernel.
pub(super) fn reduced_span(source: &[u8], luma: &mut [u8]) {
    weighted_span(source, luma, REDUCED_PRECISION);
}

#[inline(always)]
fn weighted_span(source: &[u8], luma: &mut [u8], weights: LumaWeights) {
    let wr = i32x4::splat(weights.red);
    let wg = i32x4::splat(weights.green);
    let wb = i32x4::splat(weights.blue);
    let bias = i32x4::splat(weights.bias());
    let max = i32x4::splat(255);
    let shift = weights.shift as i32;

    for (block, out) in source.chunks_exact(16).zip(luma.chunks_exact_mut(4)) {
        // planar view of the four pixels
        let r = i32x4::new([
            block[0].into(),
            block[4].into(),
            block[8].into(),
            block[12].into(),
        ]);
        let g = i32x4::new([
            block[1].into(),
            block[5].into(),
            block[9].into(),
            block[13].into(),
        ]);
        let b = i32x4::new([
            block[2].into(),
            block[6].into(),
            block[10].into(),
            block[14].into(),
        ]);

        let y = (r * wr + g * wg + b * wb + bias) >> shift;
        for (out, y) in out.iter_mut().zip(y.min(max).to_array()) {
            *out = y as u8;
        }
    }
}
