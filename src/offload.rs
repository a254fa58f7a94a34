//! Data-parallel conversion offloaded to an accelerator.
//!
//! The destination is viewed as packed 32-bit words. One work item reads 4
//! consecutive RGBA words (R in the low byte, alpha ignored) and writes one
//! word holding their 4 luma bytes. The destination is write-only for the
//! device: its previous contents are never uploaded. A dispatch returns only
//! once the result is visible in host memory.
//!
//! Devices implement [`Offloadable`]. [`EmulatedAccelerator`] runs the work
//! items on a CPU thread pool and is always available; with the `gpu`
//! feature, `GpuAccelerator` runs them in a `wgpu` compute shader.

mod emulated;
#[cfg(feature = "gpu")]
mod gpu;

use std::fmt;

pub use emulated::EmulatedAccelerator;
#[cfg(feature = "gpu")]
pub use gpu::GpuAccelerator;

use crate::{weights::FULL_PRECISION, Dimensions, LumaError};

/// A device able to run the luma work items.
pub trait Offloadable: Send + Sync {
    /// Capabilities of the device, for reporting.
    fn info(&self) -> AcceleratorInfo;

    /// Converts `source` into `luma`, blocking until the result is in `luma`.
    ///
    /// `dims` must pass [`Dimensions::check_vectorizable`].
    ///
    /// # Errors
    /// - If the device fails to allocate, run or read back the work
    fn dispatch(&self, source: &[u8], luma: &mut [u8], dims: Dimensions) -> Result<(), LumaError>;
}

/// What an accelerator reports about itself.
///
/// Capabilities the runtime cannot query are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceleratorInfo {
    pub description: String,
    pub device_path: String,
    pub version: String,
    pub is_debug: bool,
    pub is_emulated: bool,
    pub dedicated_memory: Option<u64>,
    pub has_display: Option<bool>,
}

fn or_unknown<T: fmt::Display>(value: Option<&T>) -> String {
    value.map_or_else(|| "unknown".to_owned(), ToString::to_string)
}

impl fmt::Display for AcceleratorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "New accelerator: {}", self.description)?;
        writeln!(f, "is_debug = {}", self.is_debug)?;
        writeln!(f, "is_emulated = {}", self.is_emulated)?;
        writeln!(
            f,
            "dedicated_memory = {}",
            or_unknown(self.dedicated_memory.as_ref())
        )?;
        writeln!(f, "device_path = {}", self.device_path)?;
        writeln!(f, "has_display = {}", or_unknown(self.has_display.as_ref()))?;
        write!(f, "version = {}", self.version)
    }
}

/// Lists the hardware accelerators visible to the offload runtime.
///
/// Never fails: without the `gpu` feature, or when no adapter can be found,
/// the list is empty. The CPU emulation is not listed.
#[must_use]
pub fn enumerate_accelerators() -> Vec<AcceleratorInfo> {
    #[cfg(feature = "gpu")]
    let accelerators = gpu::enumerate();
    #[cfg(not(feature = "gpu"))]
    let accelerators = {
        log::debug!("Built without the `gpu` feature, no accelerators to enumerate");
        Vec::new()
    };

    for info in &accelerators {
        log::info!("{info}");
    }
    accelerators
}

/// Data-parallel strategy.
///
/// Runs on `accelerator`; if the device reports an error the work is redone
/// on `fallback`, so the call always completes with the exact result.
pub fn convert(
    accelerator: &dyn Offloadable,
    fallback: &EmulatedAccelerator,
    source: &[u8],
    luma: &mut [u8],
    dims: Dimensions,
) {
    debug_assert!(dims.check_buffers(source, luma).is_ok());
    debug_assert!(dims.check_vectorizable().is_ok());

    if let Err(err) = accelerator.dispatch(source, luma, dims) {
        log::warn!(
            "{} failed ({err}), running on the CPU grid instead",
            accelerator.info().description
        );
        fallback.run(source, luma);
    }
}

const RED: u32 = FULL_PRECISION.red as u32;
const GREEN: u32 = FULL_PRECISION.green as u32;
const BLUE: u32 = FULL_PRECISION.blue as u32;
const BIAS: u32 = FULL_PRECISION.bias() as u32;
const SHIFT: u32 = FULL_PRECISION.shift;

/// One work item: four packed RGBA words in, four packed luma bytes out.
#[inline(always)]
pub(crate) fn work_item(pixels: [u32; 4]) -> u32 {
    let mut packed = 0;
    for (index, pixel) in pixels.into_iter().enumerate() {
        let y = (pixel & 0xFF) * RED + ((pixel >> 8) & 0xFF) * GREEN + ((pixel >> 16) & 0xFF) * BLUE;
        let y = (y + BIAS) >> SHIFT;
        packed |= num_traits::clamp(y, 0, 255) << (index * 8);
    }
    packed
}
