// Ey = 0.299*Er + 0.587*Eg + 0.114*Eb, in fixed point.
const RED: f64 = 0.299;
const GREEN: f64 = 0.587;
const BLUE: f64 = 0.114;

const FULL_SHIFT: u32 = 15;
const REDUCED_SHIFT: u32 = 7;

/// Fixed-point luma weights scaled by `2^shift`.
///
/// Each weight is the truncated (not rounded) product of the real weight and
/// the scale factor. Every full-precision strategy relies on these exact
/// integers to produce identical output, so do not switch them to rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LumaWeights {
    pub shift: u32,
    pub red: i32,
    pub green: i32,
    pub blue: i32,
}

/// S = 15, shared by every bit-exact strategy.
pub const FULL_PRECISION: LumaWeights = LumaWeights::with_shift(FULL_SHIFT);

/// S = 7, small enough for the 8-bit multiply-add of the reduced vector kernel.
pub const REDUCED_PRECISION: LumaWeights = LumaWeights::with_shift(REDUCED_SHIFT);

/// Largest per-pixel difference between the reduced-precision kernel and the
/// full-precision reference, over every possible RGB triple.
pub const REDUCED_MAX_ERROR: u8 = 2;

impl LumaWeights {
    /// Weights for an arbitrary scaling shift, `1 <= shift <= 22`.
    #[must_use]
    pub const fn with_shift(shift: u32) -> Self {
        assert!(shift >= 1 && shift <= 22, "shift must be in 1..=22");
        let factor = (1u32 << shift) as f64;
        Self {
            shift,
            red: (RED * factor) as i32,
            green: (GREEN * factor) as i32,
            blue: (BLUE * factor) as i32,
        }
    }

    /// Round-to-nearest bias added before the final shift.
    #[must_use]
    #[inline(always)]
    pub const fn bias(&self) -> i32 {
        1 << (self.shift - 1)
    }

    /// Luma of a single pixel, saturated to 255.
    #[must_use]
    #[inline(always)]
    pub const fn luma(&self, r: u8, g: u8, b: u8) -> u8 {
        let y = (r as i32 * self.red + g as i32 * self.green + b as i32 * self.blue + self.bias())
            >> self.shift;
        if y > 255 {
            255
        } else {
            y as u8
        }
    }
}

/// Scalar kernel over a run of consecutive pixels: one luma byte per
/// `stride` source bytes, until `luma` is full.
#[inline]
pub(crate) fn convert_span(source: &[u8], luma: &mut [u8], stride: usize) {
    for (pix, y) in source.chunks_exact(stride).zip(luma.iter_mut()) {
        *y = FULL_PRECISION.luma(pix[0], pix[1], pix[2]);
    }
}
