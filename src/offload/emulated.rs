use rayon::prelude::*;

use super::{work_item, AcceleratorInfo, Offloadable};
use crate::{Dimensions, LumaError, Scheduler};

/// Runs the offload work items on a CPU thread pool.
///
/// Stands in for a hardware accelerator on machines without one, and is the
/// fallback when a device dispatch fails. Produces exactly the same bytes as
/// the GPU kernel.
#[derive(Debug, Clone)]
pub struct EmulatedAccelerator {
    grid: Scheduler,
}

impl EmulatedAccelerator {
    #[must_use]
    pub const fn new(grid: Scheduler) -> Self {
        Self { grid }
    }

    /// Runs one work item per packed output word, returning when all are done.
    pub fn run(&self, source: &[u8], luma: &mut [u8]) {
        self.grid.install(|| {
            luma.par_chunks_exact_mut(4)
                .zip(source.par_chunks_exact(16))
                .for_each(|(out, words)| {
                    let pixels: [u32; 4] = std::array::from_fn(|i| {
                        u32::from_le_bytes([
                            words[4 * i],
                            words[4 * i + 1],
                            words[4 * i + 2],
                            words[4 * i + 3],
                        ])
                    });
                    out.copy_from_slice(&work_item(pixels).to_le_bytes());
                });
        });
    }
}

impl Offloadable for EmulatedAccelerator {
    fn info(&self) -> AcceleratorInfo {
        AcceleratorInfo {
            description: format!("CPU emulation ({} threads)", self.grid.num_threads()),
            device_path: "cpu".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            is_debug: cfg!(debug_assertions),
            is_emulated: true,
            dedicated_memory: None,
            has_display: Some(false),
        }
    }

    fn dispatch(&self, source: &[u8], luma: &mut [u8], dims: Dimensions) -> Result<(), LumaError> {
        debug_assert!(dims.check_vectorizable().is_ok());

        self.run(source, luma);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;
    use crate::{serial, SchedulerConfig};

    fn accelerator() -> EmulatedAccelerator {
        EmulatedAccelerator::new(
            Scheduler::new(&SchedulerConfig {
                num_threads: 3,
                ..Default::default()
            })
            .unwrap(),
        )
    }

    #[test]
    fn matches_serial() {
        let dims = Dimensions::rgba(96, 41).unwrap();
        let mut source = vec![0u8; dims.source_len()];
        rand::thread_rng().fill(&mut source[..]);

        let mut expected = vec![0u8; dims.pixel_count()];
        let mut luma = vec![0u8; dims.pixel_count()];
        serial::convert(&source, &mut expected, dims);
        accelerator().dispatch(&source, &mut luma, dims).unwrap();
        assert_eq!(expected, luma);
    }

    #[test]
    fn reports_emulated() {
        let info = accelerator().info();
        assert!(info.is_emulated);
        assert!(info.description.contains("3 threads"));
    }
}
