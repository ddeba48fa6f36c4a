use anyhow::{anyhow, Context, Result};
use wgpu::util::DeviceExt;

use super::batched::{BatchTarget, RenderBatch};
use super::{RenderCtx, RenderTarget};

const VERTEX_ENTRY: &str = "vs_main";
const FRAGMENT_ENTRY: &str = "fs_main";

/// Read-only storage buffers in group 0: positions, colors, transforms.
const STORAGE_BINDINGS: u32 = 3;

/// [`BatchTarget`] that encodes the batch into the current frame's command encoder.
///
/// Shader module, pipeline and buffers are created on every submission and
/// dropped with this value; nothing is cached across frames.
pub struct WgpuBatchTarget<'a, 'r> {
    ctx: &'a RenderCtx<'a>,
    target: &'a mut RenderTarget<'r>,
}

impl<'a, 'r> WgpuBatchTarget<'a, 'r> {
    #[inline]
    pub fn new(ctx: &'a RenderCtx<'a>, target: &'a mut RenderTarget<'r>) -> Self {
        Self { ctx, target }
    }

    fn create_pipeline(
        &self,
        source: &str,
    ) -> Result<(wgpu::RenderPipeline, wgpu::BindGroupLayout)> {
        validate_wgsl(source).context("instanced shader failed to compile")?;

        let device = self.ctx.device;
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("labrador instanced shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let storage_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let entries: Vec<_> = (0..STORAGE_BINDINGS).map(storage_entry).collect();
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("labrador instanced bgl"),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("labrador instanced pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("labrador instanced pipeline"),
            layout: Some(&pipeline_layout),

            // Geometry and transforms come from storage buffers, indexed by
            // vertex/instance id; no vertex buffers are bound.
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &[],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.ctx.surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Ok((pipeline, bind_group_layout))
    }

    fn storage_buffer(&self, label: &str, contents: &[u8]) -> Result<wgpu::Buffer> {
        let max = self.ctx.device.limits().max_storage_buffer_binding_size as usize;
        anyhow::ensure!(!contents.is_empty(), "{label}: empty buffer");
        anyhow::ensure!(
            contents.len() <= max,
            "{label}: {} bytes exceeds the {max}-byte storage binding limit",
            contents.len()
        );

        Ok(self.ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage: wgpu::BufferUsages::STORAGE,
        }))
    }
}

impl BatchTarget for WgpuBatchTarget<'_, '_> {
    fn submit(&mut self, batch: &RenderBatch<'_>) -> Result<()> {
        let (pipeline, bind_group) = capture_device_errors(self.ctx.device, "batch setup", || {
            let (pipeline, bgl) = self.create_pipeline(batch.shader_source)?;

            let positions = self.storage_buffer(
                "labrador positions",
                bytemuck::cast_slice(batch.positions),
            )?;
            let colors =
                self.storage_buffer("labrador colors", bytemuck::cast_slice(&batch.colors))?;
            let transforms = self.storage_buffer(
                "labrador transforms",
                bytemuck::cast_slice(&batch.transforms),
            )?;

            let bind_group = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("labrador instanced bind group"),
                layout: &bgl,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: positions.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 1, resource: colors.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 2, resource: transforms.as_entire_binding() },
                ],
            });

            Ok((pipeline, bind_group))
        })?;

        let mut rpass = self.target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("labrador instanced pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.draw(0..batch.vertex_count(), 0..batch.instance_count());

        Ok(())
    }
}

/// Runs `f` inside validation and out-of-memory error scopes.
///
/// wgpu reports resource-creation failures asynchronously; without a scope they
/// reach the device's uncaptured-error handler instead of the caller.
fn capture_device_errors<T>(
    device: &wgpu::Device,
    what: &str,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let oom = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    let validation = device.push_error_scope(wgpu::ErrorFilter::Validation);

    let value = f();

    // Scopes pop innermost first.
    let validation_err = pollster::block_on(validation.pop());
    let oom_err = pollster::block_on(oom.pop());

    let value = value?;
    match validation_err.or(oom_err) {
        Some(e) => Err(anyhow!("{what} failed: {e}")),
        None => Ok(value),
    }
}

/// Parses and validates a WGSL program against the pipeline it will be bound to.
///
/// Checks both entry points exist and that every resource binding is one of the
/// read-only storage buffers in group 0. Run before handing the source to wgpu
/// so a broken program aborts the frame with an error.
pub fn validate_wgsl(source: &str) -> Result<naga::Module> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| anyhow!("{}", e.emit_to_string(source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| anyhow!("shader validation failed: {e}"))?;

    for (name, stage) in [
        (VERTEX_ENTRY, naga::ShaderStage::Vertex),
        (FRAGMENT_ENTRY, naga::ShaderStage::Fragment),
    ] {
        anyhow::ensure!(
            module.entry_points.iter().any(|ep| ep.name == name && ep.stage == stage),
            "missing {stage:?} entry point `{name}`"
        );
    }

    for (_, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else { continue };
        let name = var.name.as_deref().unwrap_or("<unnamed>");

        anyhow::ensure!(
            binding.group == 0 && binding.binding < STORAGE_BINDINGS,
            "`{name}` is bound at @group({}) @binding({}); the pipeline provides group 0, bindings 0..{STORAGE_BINDINGS}",
            binding.group,
            binding.binding
        );

        let read_only_storage = matches!(
            var.space,
            naga::AddressSpace::Storage { access } if !access.contains(naga::StorageAccess::STORE)
        );
        anyhow::ensure!(
            read_only_storage,
            "`{name}` must be a read-only storage buffer, found {:?}",
            var.space
        );
    }

    Ok(module)
}
