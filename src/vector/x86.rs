//! SSE2 / SSSE3 kernels, 4 RGBA pixels (one 128-bit register) per step.
//!
//! Loads are unaligned. Only whole 16-byte blocks are processed.

use std::arch::x86_64::*;

use crate::weights::{FULL_PRECISION as FULL, REDUCED_PRECISION as REDUCED};

const FULL_SHIFT: i32 = FULL.shift as i32;
const REDUCED_SHIFT: i32 = REDUCED.shift as i32;

#[inline(always)]
unsafe fn full_scale() -> __m128i {
    _mm_set_epi16(
        0,
        FULL.blue as i16,
        FULL.green as i16,
        FULL.red as i16,
        0,
        FULL.blue as i16,
        FULL.green as i16,
        FULL.red as i16,
    )
}

#[inline(always)]
unsafe fn store4(out: &mut [u8], y: __m128i) {
    out.copy_from_slice(&_mm_cvtsi128_si32(y).to_le_bytes());
}

/// Widening multiply-add, with the per-pixel horizontal sum done by a
/// 64-bit shift and add.
#[target_feature(enable = "sse2")]
pub(super) unsafe fn unpack_span_sse2(source: &[u8], luma: &mut [u8]) {
    let scale = full_scale();
    let bias = _mm_set1_epi32(FULL.bias());
    let zero = _mm_setzero_si128();

    for (block, out) in source.chunks_exact(16).zip(luma.chunks_exact_mut(4)) {
        let rgba = _mm_loadu_si128(block.as_ptr().cast());
        let low = _mm_unpacklo_epi8(rgba, zero);
        let high = _mm_unpackhi_epi8(rgba, zero);

        // per pixel: [R*wr + G*wg, B*wb]
        let mut low = _mm_madd_epi16(low, scale);
        let mut high = _mm_madd_epi16(high, scale);

        // upper dword of each qword becomes the full sum
        low = _mm_add_epi32(low, _mm_slli_epi64::<32>(low));
        high = _mm_add_epi32(high, _mm_slli_epi64::<32>(high));
        low = _mm_add_epi32(low, bias);
        high = _mm_add_epi32(high, bias);
        low = _mm_srli_epi64::<{ 32 + FULL_SHIFT }>(low);
        high = _mm_srli_epi64::<{ 32 + FULL_SHIFT }>(high);

        let y = _mm_packs_epi32(low, high);
        let y = _mm_packs_epi32(y, zero);
        let y = _mm_packus_epi16(y, y);
        store4(out, y);
    }
}

/// Same arithmetic as [`unpack_span_sse2`], with a native horizontal add.
#[target_feature(enable = "ssse3")]
pub(super) unsafe fn hadd_span_ssse3(source: &[u8], luma: &mut [u8]) {
    let scale = full_scale();
    let bias = _mm_set1_epi32(FULL.bias());
    let zero = _mm_setzero_si128();

    for (block, out) in source.chunks_exact(16).zip(luma.chunks_exact_mut(4)) {
        let rgba = _mm_loadu_si128(block.as_ptr().cast());
        let low = _mm_madd_epi16(_mm_unpacklo_epi8(rgba, zero), scale);
        let high = _mm_madd_epi16(_mm_unpackhi_epi8(rgba, zero), scale);

        let y = _mm_hadd_epi32(low, high);
        let y = _mm_add_epi32(y, bias);
        let y = _mm_srli_epi32::<FULL_SHIFT>(y);
        let y = _mm_packs_epi32(y, y);
        let y = _mm_packus_epi16(y, y);
        store4(out, y);
    }
}

/// 8-bit multiply-add straight on the interleaved bytes, 16-bit sums.
///
/// With S = 7 every intermediate stays below `i16::MAX`, so the saturating
/// multiply-add never clips.
#[target_feature(enable = "ssse3")]
pub(super) unsafe fn reduced_span_ssse3(source: &[u8], luma: &mut [u8]) {
    let (r, g, b) = (
        REDUCED.red as i8,
        REDUCED.green as i8,
        REDUCED.blue as i8,
    );
    let scale = _mm_set_epi8(0, b, g, r, 0, b, g, r, 0, b, g, r, 0, b, g, r);
    let bias = _mm_set1_epi16(REDUCED.bias() as i16);

    for (block, out) in source.chunks_exact(16).zip(luma.chunks_exact_mut(4)) {
        let rgba = _mm_loadu_si128(block.as_ptr().cast());
        let products = _mm_maddubs_epi16(rgba, scale);

        let y = _mm_hadd_epi16(products, products);
        let y = _mm_add_epi16(y, bias);
        let y = _mm_srli_epi16::<REDUCED_SHIFT>(y);
        let y = _mm_packus_epi16(y, y);
        store4(out, y);
    }
}
