use std::collections::BTreeMap;
use std::num::NonZeroU64;
use std::sync::Arc;

use voxelview_common::PrimitiveKind;
use voxelview_render::{
    BackendError, FramebufferHandle, GraphicsBackend, ProgramDesc, ProgramHandle, ShaderSources,
    UniformBlock, UniformValue, Vertex, check_framebuffer_size, check_sources, check_vertex_count,
};
use wgpu::util::DeviceExt;

use crate::framebuffer::{COLOR_FORMAT, DEPTH_FORMAT, FramebufferTexture, blit_bind_group_layout};
use crate::shaders;

const INITIAL_UNIFORM_CAPACITY: u64 = 64 * 1024;

struct GpuProgram {
    label: String,
    uniforms: UniformBlock,
    /// One pipeline per primitive kind, indexed by [`pipeline_index`].
    pipelines: [wgpu::RenderPipeline; 3],
    vertex_buffer: Option<Arc<wgpu::Buffer>>,
    vertex_count: usize,
}

/// A draw recorded by `draw_arrays`, replayed by `render_frame`.
struct QueuedDraw {
    program: ProgramHandle,
    kind: PrimitiveKind,
    vertex_count: u32,
    vertex_buffer: Arc<wgpu::Buffer>,
    uniform_offset: u32,
}

fn pipeline_index(kind: PrimitiveKind) -> usize {
    match kind {
        PrimitiveKind::Triangles => 0,
        PrimitiveKind::Lines => 1,
        PrimitiveKind::Points => 2,
    }
}

fn topology(kind: PrimitiveKind) -> wgpu::PrimitiveState {
    match kind {
        PrimitiveKind::Triangles => wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        PrimitiveKind::Lines => wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::LineList,
            ..Default::default()
        },
        PrimitiveKind::Points => wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::PointList,
            ..Default::default()
        },
    }
}

/// Round `value` up to a multiple of `alignment`.
fn align_to(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}

/// wgpu implementation of [`GraphicsBackend`].
///
/// Draw calls are queued: each one snapshots its program's uniforms into a
/// dynamic-offset slot of a shared uniform buffer. [`WgpuBackend::render_frame`]
/// replays them into an offscreen framebuffer and blits that to the target.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    uniform_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    blit_layout: wgpu::BindGroupLayout,
    blit_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_alignment: usize,
    staging: Vec<u8>,
    programs: Vec<GpuProgram>,
    framebuffers: Vec<FramebufferTexture>,
    bound: Option<ProgramHandle>,
    draws: Vec<QueuedDraw>,
}

impl WgpuBackend {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let blit_layout = blit_bind_group_layout(&device);
        let blit_pipeline = Self::create_blit_pipeline(&device, &blit_layout, surface_format);

        let uniform_buffer = Self::create_uniform_buffer(&device, INITIAL_UNIFORM_CAPACITY);
        let uniform_alignment = device.limits().min_uniform_buffer_offset_alignment as usize;

        Self {
            device,
            queue,
            uniform_layout,
            pipeline_layout,
            blit_layout,
            blit_pipeline,
            uniform_buffer,
            uniform_alignment,
            staging: Vec::new(),
            programs: Vec::new(),
            framebuffers: Vec::new(),
            bound: None,
            draws: Vec::new(),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn create_uniform_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform_buffer"),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_blit_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        surface_format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blit_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::BLIT_SHADER.into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blit_pipeline_layout"),
            bind_group_layouts: &[layout],
            push_constant_ranges: &[],
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("blit_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_blit"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_blit"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: Default::default(),
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_program_pipeline(
        &self,
        label: &str,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
        kind: PrimitiveKind,
    ) -> wgpu::RenderPipeline {
        let label = format!("{label}_{kind:?}").to_lowercase();
        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label.as_str()),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vertex,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                        ],
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: fragment,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: COLOR_FORMAT,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: topology(kind),
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
    }

    fn program(&self, program: ProgramHandle) -> Result<&GpuProgram, BackendError> {
        self.programs
            .get(program.0 as usize)
            .ok_or(BackendError::UnknownProgram(program))
    }

    fn program_mut(&mut self, program: ProgramHandle) -> Result<&mut GpuProgram, BackendError> {
        self.programs
            .get_mut(program.0 as usize)
            .ok_or(BackendError::UnknownProgram(program))
    }

    /// Grow the uniform buffer to hold this frame's snapshots.
    fn ensure_uniform_capacity(&mut self) {
        let needed = self.staging.len() as u64;
        if needed <= self.uniform_buffer.size() {
            return;
        }
        let size = needed.next_power_of_two();
        tracing::debug!(size, "growing uniform buffer");
        self.uniform_buffer = Self::create_uniform_buffer(&self.device, size);
    }

    /// Replay the queued draws into `framebuffer`, then copy its color onto
    /// `target`. Clears the queue.
    pub fn render_frame(
        &mut self,
        target: &wgpu::TextureView,
        framebuffer: FramebufferHandle,
        clear: wgpu::Color,
    ) -> Result<(), BackendError> {
        if self.framebuffers.get(framebuffer.0 as usize).is_none() {
            return Err(BackendError::UnknownFramebuffer(framebuffer));
        }
        self.ensure_uniform_capacity();
        if !self.staging.is_empty() {
            self.queue
                .write_buffer(&self.uniform_buffer, 0, &self.staging);
        }

        let mut bind_groups: BTreeMap<ProgramHandle, wgpu::BindGroup> = BTreeMap::new();
        for draw in &self.draws {
            if bind_groups.contains_key(&draw.program) {
                continue;
            }
            let program = self.program(draw.program)?;
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("uniform_bind_group"),
                layout: &self.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &self.uniform_buffer,
                        offset: 0,
                        size: NonZeroU64::new(program.uniforms.size() as u64),
                    }),
                }],
            });
            bind_groups.insert(draw.program, bind_group);
        }

        let fb = &self.framebuffers[framebuffer.0 as usize];
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: fb.color_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: fb.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            for draw in &self.draws {
                let (Some(program), Some(bind_group)) = (
                    self.programs.get(draw.program.0 as usize),
                    bind_groups.get(&draw.program),
                ) else {
                    continue;
                };
                pass.set_pipeline(&program.pipelines[pipeline_index(draw.kind)]);
                pass.set_bind_group(0, bind_group, &[draw.uniform_offset]);
                pass.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
                pass.draw(0..draw.vertex_count, 0..1);
            }
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("blit_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
            pass.set_pipeline(&self.blit_pipeline);
            pass.set_bind_group(0, fb.blit_bind_group(), &[]);
            pass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.draws.clear();
        self.staging.clear();
        Ok(())
    }
}

impl GraphicsBackend for WgpuBackend {
    fn compile(
        &mut self,
        program: &ProgramDesc,
        sources: &ShaderSources,
    ) -> Result<ProgramHandle, BackendError> {
        check_sources(&program.label, sources)?;
        if sources.geometry.is_some() {
            return Err(BackendError::Unsupported("geometry shaders".into()));
        }
        if sources.compute.is_some() {
            return Err(BackendError::Unsupported("compute shaders in a draw program".into()));
        }
        let uniforms = UniformBlock::new(&program.label, &program.uniforms)?;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let vertex = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(program.label.as_str()),
                source: wgpu::ShaderSource::Wgsl(sources.vertex.as_str().into()),
            });
        let fragment = (sources.fragment != sources.vertex).then(|| {
            self.device
                .create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(program.label.as_str()),
                    source: wgpu::ShaderSource::Wgsl(sources.fragment.as_str().into()),
                })
        });
        let fragment = fragment.as_ref().unwrap_or(&vertex);
        let pipelines = PrimitiveKind::ALL
            .map(|kind| self.create_program_pipeline(&program.label, &vertex, fragment, kind));
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(BackendError::Compile(err.to_string()));
        }

        let handle = ProgramHandle(self.programs.len() as u32);
        self.programs.push(GpuProgram {
            label: program.label.clone(),
            uniforms,
            pipelines,
            vertex_buffer: None,
            vertex_count: 0,
        });
        tracing::info!(label = %program.label, ?handle, "compiled program");
        Ok(handle)
    }

    fn bind(&mut self, program: ProgramHandle) -> Result<(), BackendError> {
        self.program(program)?;
        self.bound = Some(program);
        Ok(())
    }

    fn set_uniform(
        &mut self,
        program: ProgramHandle,
        name: &str,
        value: UniformValue,
    ) -> Result<(), BackendError> {
        self.program_mut(program)?.uniforms.set(name, value)
    }

    fn set_vertex_data(
        &mut self,
        program: ProgramHandle,
        vertices: &[Vertex],
    ) -> Result<(), BackendError> {
        let buffer = (!vertices.is_empty()).then(|| {
            Arc::new(
                self.device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("vertex_buffer"),
                        contents: bytemuck::cast_slice(vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
            )
        });
        let target = self.program_mut(program)?;
        target.vertex_buffer = buffer;
        target.vertex_count = vertices.len();
        tracing::debug!(label = %target.label, count = vertices.len(), "uploaded vertices");
        Ok(())
    }

    fn draw_arrays(
        &mut self,
        program: ProgramHandle,
        kind: PrimitiveKind,
        vertex_count: u32,
    ) -> Result<(), BackendError> {
        let target = self
            .programs
            .get(program.0 as usize)
            .ok_or(BackendError::UnknownProgram(program))?;
        if self.bound != Some(program) {
            return Err(BackendError::ProgramNotBound(program));
        }
        check_vertex_count(vertex_count, target.vertex_count)?;
        let Some(vertex_buffer) = target.vertex_buffer.clone() else {
            return Ok(());
        };
        if vertex_count == 0 {
            return Ok(());
        }

        let offset = align_to(self.staging.len(), self.uniform_alignment);
        self.staging.resize(offset, 0);
        self.staging.extend_from_slice(target.uniforms.bytes());
        let uniform_offset = u32::try_from(offset)
            .map_err(|_| BackendError::Unsupported("uniform staging beyond 4 GiB".into()))?;

        self.draws.push(QueuedDraw {
            program,
            kind,
            vertex_count,
            vertex_buffer,
            uniform_offset,
        });
        Ok(())
    }

    fn create_framebuffer_texture(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<FramebufferHandle, BackendError> {
        check_framebuffer_size(width, height)?;
        let handle = FramebufferHandle(self.framebuffers.len() as u32);
        self.framebuffers.push(FramebufferTexture::new(
            &self.device,
            &self.blit_layout,
            width,
            height,
        ));
        tracing::debug!(?handle, width, height, "created framebuffer");
        Ok(handle)
    }

    fn resize_framebuffer_texture(
        &mut self,
        framebuffer: FramebufferHandle,
        width: u32,
        height: u32,
    ) -> Result<(), BackendError> {
        check_framebuffer_size(width, height)?;
        let current = self
            .framebuffers
            .get(framebuffer.0 as usize)
            .ok_or(BackendError::UnknownFramebuffer(framebuffer))?;
        if current.size() == (width, height) {
            return Ok(());
        }
        self.framebuffers[framebuffer.0 as usize] =
            FramebufferTexture::new(&self.device, &self.blit_layout, width, height);
        tracing::debug!(?framebuffer, width, height, "resized framebuffer");
        Ok(())
    }
}
