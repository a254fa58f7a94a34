//! Vectorized conversion, 4 RGBA pixels (16 source bytes) per step.
//!
//! All three variants require `stride == 4` and a source length that is a
//! multiple of 16 bytes (see [`Dimensions::check_vectorizable`]). The source
//! may start at any address. A trailing partial block, if the precondition is
//! broken anyway, is left untouched.
//!
//! On x86-64 the kernels use SSE2 and SSSE3 intrinsics, picked at runtime.
//! Everywhere else, and on CPUs without SSSE3, a portable implementation
//! produces the same bytes.

#[cfg(target_arch = "x86_64")]
mod x86;
mod portable;


use crate::Dimensions;

/// Instruction set a vector kernel runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorPath {
    Sse2,
    Ssse3,
    Portable,
}

/// Instruction set used by the horizontal-add and reduced-precision kernels
/// on this machine.
#[must_use]
pub fn detected_path() -> VectorPath {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("ssse3") {
            return VectorPath::Ssse3;
        }
    }
    VectorPath::Portable
}

/// Instruction set used by the widening kernel: SSE2 is part of the x86-64
/// baseline, so no runtime check is needed.
#[must_use]
pub const fn unpack_path() -> VectorPath {
    if cfg!(target_arch = "x86_64") {
        VectorPath::Sse2
    } else {
        VectorPath::Portable
    }
}

/// Variant A: widen to 16-bit lanes, multiply-add pairs, then finish each
/// pixel's sum with a 64-bit shift-and-add instead of a horizontal add.
pub fn convert_unpack(source: &[u8], luma: &mut [u8], dims: Dimensions) {
    debug_assert!(dims.check_buffers(source, luma).is_ok());
    debug_assert!(dims.check_vectorizable().is_ok());

    log::trace!("unpack kernel on {:?}", unpack_path());
    unpack_span(source, luma);
}

/// Variant B: like [`convert_unpack`], with a native horizontal add.
pub fn convert_hadd(source: &[u8], luma: &mut [u8], dims: Dimensions) {
    debug_assert!(dims.check_buffers(source, luma).is_ok());
    debug_assert!(dims.check_vectorizable().is_ok());

    log::trace!("hadd kernel on {:?}", detected_path());
    hadd_span(source, luma);
}

/// Variant C: 8-bit multiply-add on the interleaved bytes with S = 7.
///
/// Faster, but **not** bit-compatible with the other strategies: results may
/// differ from the reference by up to [`REDUCED_MAX_ERROR`] luma levels.
///
/// [`REDUCED_MAX_ERROR`]: crate::REDUCED_MAX_ERROR
pub fn convert_reduced(source: &[u8], luma: &mut [u8], dims: Dimensions) {
    debug_assert!(dims.check_buffers(source, luma).is_ok());
    debug_assert!(dims.check_vectorizable().is_ok());

    log::trace!("reduced kernel on {:?}", detected_path());
    reduced_span(source, luma);
}

pub(crate) fn unpack_span(source: &[u8], luma: &mut [u8]) {
    #[cfg(target_arch = "x86_64")]
    {
        // SAFETY: SSE2 is part of the x86-64 baseline.
        unsafe { x86::unpack_span_sse2(source, luma) };
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        portable::full_span(source, luma);
    }
}

/// Full-precision block kernel shared with the hybrid strategy.
pub(crate) fn hadd_span(source: &[u8], luma: &mut [u8]) {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("ssse3") {
            // SAFETY: SSSE3 support was checked just above.
            unsafe { x86::hadd_span_ssse3(source, luma) };
            return;
        }
    }
    portable::full_span(source, luma);
}

pub(crate) fn reduced_span(source: &[u8], luma: &mut [u8]) {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("ssse3") {
            // SAFETY: SSSE3 support was checked just above.
            unsafe { x86::reduced_span_ssse3(source, luma) };
            return;
        }
    }
    portable::reduced_span(source, luma);
}
