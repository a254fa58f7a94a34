use thiserror::Error;

/// Error type for everything that can be checked before a kernel runs.
///
/// The kernels themselves never fail: once a [`Dimensions`] has been built
/// and the buffers have passed [`Dimensions::check_buffers`], every strategy
/// runs to completion. These errors exist so callers can validate up front
/// instead of paying for checks inside the hot loops.
///
/// # Example
/// ```
/// use lumabench::{Dimensions, LumaError};
///
/// // a 3x3 RGBA image is 36 bytes, which is not a whole number of 16-byte blocks
/// let dims = Dimensions::new(3, 3, 4).unwrap();
/// assert_eq!(
///     dims.check_vectorizable(),
///     Err(LumaError::NotVectorizable { stride: 4, bytes: 36 })
/// );
/// ```
///
/// [`Dimensions`]: crate::Dimensions
/// [`Dimensions::check_buffers`]: crate::Dimensions::check_buffers
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LumaError {
    #[error("Image width and height must both be non-zero.")]
    ZeroDimension,
    #[error("Unsupported channel stride {0}, expected 3 (RGB) or 4 (RGBA).")]
    UnsupportedStride(usize),
    #[error("Image dimensions overflow the addressable buffer length.")]
    DimensionOverflow,
    /// The source buffer does not hold exactly `width * height * stride` bytes.
    #[error("Source buffer holds {actual} bytes, expected {expected}.")]
    SourceLength { expected: usize, actual: usize },
    /// The destination buffer does not hold exactly `width * height` bytes.
    #[error("Destination buffer holds {actual} bytes, expected {expected}.")]
    DestinationLength { expected: usize, actual: usize },
    /// Vector and offload kernels need RGBA input made of whole 16-byte blocks.
    #[error("Vector kernels need stride 4 and a multiple of 16 bytes, got stride {stride} and {bytes} bytes.")]
    NotVectorizable { stride: usize, bytes: usize },
    #[error("Failed to build the worker pool: {0}")]
    ThreadPool(String),
    #[error("No accelerator available: {0}")]
    AcceleratorUnavailable(String),
    #[error("Accelerator failure: {0}")]
    Device(String),
}

impl From<rayon::ThreadPoolBuildError> for LumaError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool(err.to_string())
    }
}
