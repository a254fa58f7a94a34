use std::sync::mpsc;

use super::{AcceleratorInfo, Offloadable, BIAS, BLUE, GREEN, RED, SHIFT};
use crate::{dims::VECTOR_BYTES, Dimensions, LumaError};

const WORKGROUP_SIZE: u32 = 64;
const MAX_GROUPS_PER_DIMENSION: u32 = 65_535;

fn shader_source() -> String {
    include_str!("luma.wgsl")
        .replace("$RED", &RED.to_string())
        .replace("$GREEN", &GREEN.to_string())
        .replace("$BLUE", &BLUE.to_string())
        .replace("$BIAS", &BIAS.to_string())
        .replace("$SHIFT", &SHIFT.to_string())
}

fn instance_flags() -> wgpu::InstanceFlags {
    wgpu::InstanceFlags::from_build_config()
}

fn new_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        flags: instance_flags(),
        ..Default::default()
    })
}

/// Maps an adapter to the report. wgpu exposes neither the memory size nor
/// whether a display is attached, so both stay `None`; software rasterizers
/// count as emulated.
fn adapter_info(info: &wgpu::AdapterInfo) -> AcceleratorInfo {
    AcceleratorInfo {
        description: info.name.clone(),
        device_path: format!("{:?}", info.backend),
        version: format!("{} {}", info.driver, info.driver_info)
            .trim()
            .to_owned(),
        is_debug: instance_flags().contains(wgpu::InstanceFlags::DEBUG),
        is_emulated: info.device_type == wgpu::DeviceType::Cpu,
        dedicated_memory: None,
        has_display: None,
    }
}

pub(super) fn enumerate() -> Vec<AcceleratorInfo> {
    new_instance()
        .enumerate_adapters(wgpu::Backends::all())
        .iter()
        .map(|adapter| adapter_info(&adapter.get_info()))
        .collect()
}

/// Runs the offload work items in a `wgpu` compute shader.
pub struct GpuAccelerator {
    info: wgpu::AdapterInfo,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl GpuAccelerator {
    /// Opens the highest-performance adapter and compiles the kernel.
    ///
    /// # Errors
    /// - If no adapter is available
    /// - If the device cannot be opened
    pub fn new() -> Result<Self, LumaError> {
        pollster::block_on(Self::open())
    }

    async fn open() -> Result<Self, LumaError> {
        let instance = new_instance();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| LumaError::AcceleratorUnavailable("no wgpu adapter found".to_owned()))?;
        let info = adapter.get_info();
        log::debug!("Selected {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("lumabench"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| LumaError::Device(e.to_string()))?;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("luma"),
            source: wgpu::ShaderSource::Wgsl(shader_source().into()),
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("luma"),
            layout: None,
            module: &module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });
        let bind_group_layout = pipeline.get_bind_group_layout(0);

        Ok(Self {
            info,
            device,
            queue,
            pipeline,
            bind_group_layout,
        })
    }

    fn buffer(&self, label: &str, size: u64, usage: wgpu::BufferUsages) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        })
    }
}

impl Offloadable for GpuAccelerator {
    fn info(&self) -> AcceleratorInfo {
        adapter_info(&self.info)
    }

    fn dispatch(&self, source: &[u8], luma: &mut [u8], dims: Dimensions) -> Result<(), LumaError> {
        dims.check_vectorizable()?;
        let limit = u64::from(self.device.limits().max_storage_buffer_binding_size);
        if source.len() as u64 > limit {
            return Err(LumaError::Device(format!(
                "{} source bytes exceed the {limit} byte binding limit",
                source.len()
            )));
        }

        let words = (source.len() / VECTOR_BYTES) as u32;
        let source_buffer = self.buffer(
            "luma-source",
            source.len() as u64,
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        );
        self.queue.write_buffer(&source_buffer, 0, source);
        // never uploaded, the previous destination contents are discarded
        let luma_buffer = self.buffer(
            "luma-output",
            luma.len() as u64,
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        );
        let staging = self.buffer(
            "luma-readback",
            luma.len() as u64,
            wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        );

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("luma"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: source_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: luma_buffer.as_entire_binding(),
                },
            ],
        });

        let groups = words.div_ceil(WORKGROUP_SIZE);
        let groups_x = groups.min(MAX_GROUPS_PER_DIMENSION);
        let groups_y = groups.div_ceil(groups_x);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("luma"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("luma"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }
        encoder.copy_buffer_to_buffer(&luma_buffer, 0, &staging, 0, luma.len() as u64);
        self.queue.submit(std::iter::once(encoder.finish()));

        // synchronize: wait for the device, then copy back to the host
        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| LumaError::Device(e.to_string()))?
            .map_err(|e| LumaError::Device(e.to_string()))?;

        luma.copy_from_slice(&slice.get_mapped_range());
        staging.unmap();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;
    use crate::serial;

    #[test]
    fn shader_has_no_placeholders() {
        let source = shader_source();
        assert!(!source.contains('$'));
        assert!(source.contains("9797u"));
        assert!(source.contains(">> 15u"));
    }

    #[test]
    fn software_adapter_reports_emulated() {
        let software = wgpu::AdapterInfo {
            name: "llvmpipe".to_owned(),
            vendor: 0x10005,
            device: 0,
            device_type: wgpu::DeviceType::Cpu,
            driver: "Mesa".to_owned(),
            driver_info: String::new(),
            backend: wgpu::Backend::Vulkan,
        };
        let info = adapter_info(&software);
        assert_eq!(info.description, "llvmpipe");
        assert_eq!(info.device_path, "Vulkan");
        assert_eq!(info.version, "Mesa");
        assert!(info.is_emulated);
        assert_eq!(info.dedicated_memory, None);
        assert_eq!(info.has_display, None);

        let discrete = adapter_info(&wgpu::AdapterInfo {
            device_type: wgpu::DeviceType::DiscreteGpu,
            ..software
        });
        assert!(!discrete.is_emulated);
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn matches_serial() {
        let accelerator = GpuAccelerator::new().unwrap();
        let dims = Dimensions::rgba(640, 480).unwrap();
        let mut source = vec![0u8; dims.source_len()];
        rand::thread_rng().fill(&mut source[..]);

        let mut expected = vec![0u8; dims.pixel_count()];
        let mut luma = vec![0u8; dims.pixel_count()];
        serial::convert(&source, &mut expected, dims);
        accelerator.dispatch(&source, &mut luma, dims).unwrap();
        assert_eq!(expected, luma);
    }
}
