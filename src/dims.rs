use crate::LumaError;

/// Number of source bytes consumed by one vector step (4 RGBA pixels).
pub const VECTOR_BYTES: usize = 16;
/// Number of pixels consumed by one vector step.
pub const VECTOR_PIXELS: usize = 4;

/// Validated kernel parameters: image width and height in pixels, and the
/// distance in bytes between two pixels of the source image.
///
/// The source image is `width * height * stride` bytes of interleaved
/// `[R, G, B]` or `[R, G, B, A]` samples, the destination `width * height`
/// luma bytes. Alpha is never read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    width: usize,
    height: usize,
    stride: usize,
}

impl Dimensions {
    /// # Errors
    /// - If `width` or `height` is zero
    /// - If `stride` is not 3 or 4
    /// - If `width * height * stride` does not fit in a `usize`
    pub fn new(width: usize, height: usize, stride: usize) -> Result<Self, LumaError> {
        if width == 0 || height == 0 {
            return Err(LumaError::ZeroDimension);
        }
        if stride != 3 && stride != 4 {
            return Err(LumaError::UnsupportedStride(stride));
        }
        width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(stride))
            .ok_or(LumaError::DimensionOverflow)?;

        Ok(Self {
            width,
            height,
            stride,
        })
    }

    /// Shorthand for an RGBA image.
    ///
    /// # Errors
    /// Same as [`Dimensions::new`].
    pub fn rgba(width: usize, height: usize) -> Result<Self, LumaError> {
        Self::new(width, height, 4)
    }

    #[must_use]
    #[inline(always)]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    #[inline(always)]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    #[inline(always)]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Length of the destination buffer.
    #[must_use]
    #[inline(always)]
    pub const fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Length of the source buffer.
    #[must_use]
    #[inline(always)]
    pub const fn source_len(&self) -> usize {
        self.width * self.height * self.stride
    }

    /// Checks that both buffers have exactly the lengths these dimensions
    /// describe.
    ///
    /// # Errors
    /// - If `source.len() != source_len()`
    /// - If `destination.len() != pixel_count()`
    pub fn check_buffers(&self, source: &[u8], destination: &[u8]) -> Result<(), LumaError> {
        if source.len() != self.source_len() {
            return Err(LumaError::SourceLength {
                expected: self.source_len(),
                actual: source.len(),
            });
        }
        if destination.len() != self.pixel_count() {
            return Err(LumaError::DestinationLength {
                expected: self.pixel_count(),
                actual: destination.len(),
            });
        }
        Ok(())
    }

    /// Checks the extra preconditions of the vector, hybrid and offload
    /// strategies: RGBA input whose byte length is a multiple of 16.
    ///
    /// # Errors
    /// - If the stride is not 4 or the source length is not a multiple of 16
    pub fn check_vectorizable(&self) -> Result<(), LumaError> {
        if self.stride != 4 || self.source_len() % VECTOR_BYTES != 0 {
            return Err(LumaError::NotVectorizable {
                stride: self.stride,
                bytes: self.source_len(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn is_vectorizable(&self) -> bool {
        self.check_vectorizable().is_ok()
    }
}
