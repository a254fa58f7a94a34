use crate::{
    hybrid,
    offload::{self, EmulatedAccelerator, Offloadable},
    range, serial, tile, vector, Dimensions, LumaError, Scheduler, SchedulerConfig,
};

/// Which device the offload strategy should run on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AcceleratorPreference {
    /// Always use the CPU emulation.
    #[default]
    Emulated,
    /// Use a GPU when the `gpu` feature is enabled and an adapter exists,
    /// otherwise fall back to the CPU emulation.
    Gpu,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextConfig {
    pub scheduler: SchedulerConfig,
    pub accelerator: AcceleratorPreference,
}

/// Execution resources shared by every strategy: the work-stealing pool and
/// the offload device. Built once by the driver and reused across calls.
pub struct Context {
    scheduler: Scheduler,
    emulated: EmulatedAccelerator,
    accelerator: Option<Box<dyn Offloadable>>,
}

impl Context {
    /// # Errors
    /// - If the worker pool cannot be built
    pub fn new(config: &ContextConfig) -> Result<Self, LumaError> {
        let scheduler = Scheduler::new(&config.scheduler)?;
        let emulated = EmulatedAccelerator::new(scheduler.clone());
        let accelerator = match config.accelerator {
            AcceleratorPreference::Emulated => None,
            AcceleratorPreference::Gpu => open_gpu(),
        };

        Ok(Self {
            scheduler,
            emulated,
            accelerator,
        })
    }

    /// Replaces the offload device.
    #[must_use]
    pub fn with_accelerator(mut self, accelerator: Box<dyn Offloadable>) -> Self {
        self.accelerator = Some(accelerator);
        self
    }

    #[must_use]
    #[inline(always)]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The device the offload strategy dispatches to.
    #[must_use]
    pub fn accelerator(&self) -> &dyn Offloadable {
        self.accelerator.as_deref().unwrap_or(&self.emulated)
    }
}

#[cfg(feature = "gpu")]
fn open_gpu() -> Option<Box<dyn Offloadable>> {
    match offload::GpuAccelerator::new() {
        Ok(gpu) => {
            log::debug!("Offloading to {}", gpu.info().description);
            Some(Box::new(gpu))
        }
        Err(err) => {
            log::warn!("{err}, offloading to the CPU emulation instead");
            None
        }
    }
}

#[cfg(not(feature = "gpu"))]
fn open_gpu() -> Option<Box<dyn Offloadable>> {
    log::warn!("Built without the `gpu` feature, offloading to the CPU emulation instead");
    None
}

/// Uniform entry point shared by every strategy.
pub type KernelFn = fn(&Context, &[u8], &mut [u8], Dimensions);

/// Whether a strategy reproduces the serial reference exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Byte-identical to the serial reference.
    Exact,
    /// Within [`REDUCED_MAX_ERROR`](crate::REDUCED_MAX_ERROR) of the reference.
    Approximate,
}

/// A strategy as seen by the benchmark driver.
#[derive(Debug, Clone, Copy)]
pub struct Strategy {
    pub label: &'static str,
    pub kernel: KernelFn,
    pub precision: Precision,
    /// Needs RGBA input whose length is a multiple of 16 bytes.
    pub vector_only: bool,
}

impl Strategy {
    /// Runs the strategy.
    pub fn run(&self, context: &Context, source: &[u8], luma: &mut [u8], dims: Dimensions) {
        (self.kernel)(context, source, luma, dims);
    }

    /// Whether the strategy accepts these dimensions.
    #[must_use]
    pub fn supports(&self, dims: Dimensions) -> bool {
        !self.vector_only || dims.is_vectorizable()
    }
}

fn run_serial(_: &Context, source: &[u8], luma: &mut [u8], dims: Dimensions) {
    serial::convert(source, luma, dims);
}

fn run_range_worker(ctx: &Context, source: &[u8], luma: &mut [u8], dims: Dimensions) {
    range::convert_worker(&ctx.scheduler, source, luma, dims);
}

fn run_range_closure(ctx: &Context, source: &[u8], luma: &mut [u8], dims: Dimensions) {
    range::convert_closure(&ctx.scheduler, source, luma, dims);
}

fn run_tiles(ctx: &Context, source: &[u8], luma: &mut [u8], dims: Dimensions) {
    tile::convert(&ctx.scheduler, source, luma, dims);
}

fn run_unpack(_: &Context, source: &[u8], luma: &mut [u8], dims: Dimensions) {
    vector::convert_unpack(source, luma, dims);
}

fn run_hadd(_: &Context, source: &[u8], luma: &mut [u8], dims: Dimensions) {
    vector::convert_hadd(source, luma, dims);
}

fn run_reduced(_: &Context, source: &[u8], luma: &mut [u8], dims: Dimensions) {
    vector::convert_reduced(source, luma, dims);
}

fn run_hybrid(ctx: &Context, source: &[u8], luma: &mut [u8], dims: Dimensions) {
    hybrid::convert(&ctx.scheduler, source, luma, dims);
}

fn run_offload(ctx: &Context, source: &[u8], luma: &mut [u8], dims: Dimensions) {
    offload::convert(ctx.accelerator(), &ctx.emulated, source, luma, dims);
}

const fn exact(label: &'static str, kernel: KernelFn, vector_only: bool) -> Strategy {
    Strategy {
        label,
        kernel,
        precision: Precision::Exact,
        vector_only,
    }
}

/// Every strategy, in report order.
pub const STRATEGIES: [Strategy; 9] = [
    exact("Serial", run_serial, false),
    exact("Range worker", run_range_worker, false),
    exact("Range closure", run_range_closure, false),
    exact("Tiles", run_tiles, false),
    exact("SIMD unpack", run_unpack, true),
    exact("SIMD hadd", run_hadd, true),
    Strategy {
        label: "SIMD reduced",
        kernel: run_reduced,
        precision: Precision::Approximate,
        vector_only: true,
    },
    exact("Range SIMD", run_hybrid, true),
    exact("Offload", run_offload, true),
];

/// Looks up a strategy by label.
#[must_use]
pub fn strategy(label: &str) -> Option<Strategy> {
    STRATEGIES.iter().find(|s| s.label == label).copied()
}
