//! `GpuBackend` on top of wgpu.
//!
//! Draw commands are immediate: every `clear` and draw records its own render pass
//! against the current target and is submitted right away, so buffer writes made
//! between draws are seen by exactly the draws that follow them.

use std::collections::HashMap;

use slotmap::SlotMap;

use crate::color::Color;
use crate::device::Gpu;

use super::program::{compile_program, ProgramInfo, FRAGMENT_ENTRY, VERTEX_ENTRY};
use super::{
    expand_to_rgba8, BufferDesc, BufferHandle, BufferType, GpuBackend, GpuError, PrimitiveType,
    ShaderDesc, ShaderHandle, TextureDesc, TextureHandle, UniformValue, VertexLayout,
};

struct ShaderEntry {
    label: String,
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    info: ProgramInfo,
    uniform_buffer: Option<wgpu::Buffer>,
    uniform_bind_group_layout: wgpu::BindGroupLayout,
    uniform_bind_group: wgpu::BindGroup,
}

struct TextureEntry {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

struct BufferEntry {
    buffer: wgpu::Buffer,
    ty: BufferType,
    size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    shader: ShaderHandle,
    primitive: PrimitiveType,
    layout: VertexLayout,
    format: wgpu::TextureFormat,
}

#[derive(Default)]
struct Bound {
    shader: Option<ShaderHandle>,
    texture: Option<TextureHandle>,
    vertex: Option<BufferHandle>,
    index: Option<BufferHandle>,
    layout: Option<VertexLayout>,
}

/// Render target of subsequent commands.
struct Target {
    view: wgpu::TextureView,
    format: wgpu::TextureFormat,
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,

    texture_bind_group_layout: wgpu::BindGroupLayout,

    shaders: SlotMap<ShaderHandle, ShaderEntry>,
    textures: SlotMap<TextureHandle, TextureEntry>,
    buffers: SlotMap<BufferHandle, BufferEntry>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    bound: Bound,
    target: Option<Target>,
}

impl WgpuBackend {
    pub fn new(gpu: &Gpu<'_>) -> Self {
        Self::from_device(gpu.device().clone(), gpu.queue().clone())
    }

    pub fn from_device(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("sprig texture bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        Self {
            device,
            queue,
            texture_bind_group_layout,
            shaders: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
            pipelines: HashMap::new(),
            bound: Bound::default(),
            target: None,
        }
    }

    /// Directs subsequent clears and draws at `view`.
    pub fn set_target(&mut self, view: wgpu::TextureView, format: wgpu::TextureFormat) {
        self.target = Some(Target { view, format });
    }

    /// Drops the current target. Commands issued without a target are skipped.
    pub fn release_target(&mut self) {
        self.target = None;
    }

    fn color_pass<'e>(
        encoder: &'e mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        load: wgpu::LoadOp<wgpu::Color>,
    ) -> wgpu::RenderPass<'e> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sprig pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }

    fn ensure_pipeline(&mut self, key: &PipelineKey) {
        if self.pipelines.contains_key(key) {
            return;
        }
        let Some(shader) = self.shaders.get(key.shader) else { return };

        let mut groups = vec![&shader.uniform_bind_group_layout];
        if shader.info.samples_texture {
            groups.push(&self.texture_bind_group_layout);
        }

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("sprig pipeline layout"),
                bind_group_layouts: &groups,
                immediate_size: 0,
            });

        let attributes: Vec<wgpu::VertexAttribute> = key
            .layout
            .attributes()
            .iter()
            .zip(key.layout.offsets())
            .enumerate()
            .map(|(location, (attr, offset))| wgpu::VertexAttribute {
                format: attr.format.to_wgpu(),
                offset,
                shader_location: location as u32,
            })
            .collect();

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(shader.label.as_str()),
                layout: Some(&pipeline_layout),

                vertex: wgpu::VertexState {
                    module: &shader.vertex,
                    entry_point: Some(VERTEX_ENTRY),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: key.layout.stride(),
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &attributes,
                    }],
                },

                fragment: Some(wgpu::FragmentState {
                    module: &shader.fragment,
                    entry_point: Some(FRAGMENT_ENTRY),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: key.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: key.primitive.to_wgpu(),
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

        log::debug!(
            "WgpuBackend: created pipeline for `{}` ({:?}, {:?})",
            shader.label,
            key.primitive,
            key.format
        );
        self.pipelines.insert(key.clone(), pipeline);
    }

    fn draw(&mut self, primitive: PrimitiveType, count: u32, indexed: bool) {
        if count == 0 {
            return;
        }
        let Some(format) = self.target.as_ref().map(|t| t.format) else {
            log::warn!("WgpuBackend: draw without a render target; skipped");
            return;
        };
        let (Some(shader), Some(layout)) = (self.bound.shader, self.bound.layout.clone()) else {
            log::warn!("WgpuBackend: draw without a bound shader and layout; skipped");
            return;
        };
        if !self.shaders.contains_key(shader) {
            log::warn!("WgpuBackend: bound shader was destroyed; draw skipped");
            return;
        }

        let key = PipelineKey {
            shader,
            primitive,
            layout,
            format,
        };
        self.ensure_pipeline(&key);

        let (Some(target), Some(pipeline), Some(entry)) = (
            self.target.as_ref(),
            self.pipelines.get(&key),
            self.shaders.get(shader),
        ) else {
            return;
        };

        let Some(vbo) = self.bound.vertex.and_then(|h| self.buffers.get(h)) else {
            log::warn!("WgpuBackend: draw without a live vertex buffer; skipped");
            return;
        };
        if !indexed && u64::from(count) * key.layout.stride() > vbo.size {
            log::warn!("WgpuBackend: draw reads past the bound vertex buffer; skipped");
            return;
        }

        let ibo = if indexed {
            let Some(ibo) = self.bound.index.and_then(|h| self.buffers.get(h)) else {
                log::warn!("WgpuBackend: indexed draw without a live index buffer; skipped");
                return;
            };
            if u64::from(count) * 2 > ibo.size {
                log::warn!("WgpuBackend: {count} indices exceed the bound index buffer; skipped");
                return;
            }
            Some(ibo)
        } else {
            None
        };

        let texture = if entry.info.samples_texture {
            let Some(texture) = self.bound.texture.and_then(|h| self.textures.get(h)) else {
                log::warn!(
                    "WgpuBackend: shader `{}` samples a texture but none is bound; skipped",
                    entry.label
                );
                return;
            };
            Some(texture)
        } else {
            None
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sprig draw encoder"),
            });

        {
            let mut rpass = Self::color_pass(&mut encoder, &target.view, wgpu::LoadOp::Load);
            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, &entry.uniform_bind_group, &[]);
            if let Some(texture) = texture {
                rpass.set_bind_group(1, &texture.bind_group, &[]);
            }
            rpass.set_vertex_buffer(0, vbo.buffer.slice(..));

            match ibo {
                Some(ibo) => {
                    rpass.set_index_buffer(ibo.buffer.slice(..), wgpu::IndexFormat::Uint16);
                    rpass.draw_indexed(0..count, 0, 0..1);
                }
                None => rpass.draw(0..count, 0..1),
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

/// Rounds `len` up to wgpu's copy alignment.
fn align_copy(len: u64) -> u64 {
    len.div_ceil(wgpu::COPY_BUFFER_ALIGNMENT) * wgpu::COPY_BUFFER_ALIGNMENT
}

fn write_padded(queue: &wgpu::Queue, buffer: &wgpu::Buffer, offset: u64, data: &[u8]) {
    if data.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT == 0 {
        queue.write_buffer(buffer, offset, data);
        return;
    }
    let mut padded = data.to_vec();
    padded.resize(align_copy(data.len() as u64) as usize, 0);
    queue.write_buffer(buffer, offset, &padded);
}

impl GpuBackend for WgpuBackend {
    fn create_shader(&mut self, desc: &ShaderDesc<'_>) -> Result<ShaderHandle, GpuError> {
        let info = compile_program(desc)?;

        let vertex = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.vertex_source.into()),
        });
        let fragment = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.fragment_source.into()),
        });

        let uniform_buffer = (info.uniform_block_size > 0).then(|| {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("sprig uniform buffer"),
                size: align_copy(u64::from(info.uniform_block_size)),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        let uniform_entries: Vec<wgpu::BindGroupLayoutEntry> = uniform_buffer
            .iter()
            .map(|_| wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect();

        let uniform_bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("sprig uniform bgl"),
                    entries: &uniform_entries,
                });

        let bind_entries: Vec<wgpu::BindGroupEntry<'_>> = uniform_buffer
            .iter()
            .map(|buffer| wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            })
            .collect();

        let uniform_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sprig uniform bind group"),
            layout: &uniform_bind_group_layout,
            entries: &bind_entries,
        });

        log::debug!(
            "WgpuBackend: shader `{}` linked ({} uniforms, textured: {})",
            desc.label,
            info.uniforms.len(),
            info.samples_texture
        );

        Ok(self.shaders.insert(ShaderEntry {
            label: desc.label.to_owned(),
            vertex,
            fragment,
            info,
            uniform_buffer,
            uniform_bind_group_layout,
            uniform_bind_group,
        }))
    }

    fn destroy_shader(&mut self, shader: ShaderHandle) {
        if self.shaders.remove(shader).is_some() {
            self.pipelines.retain(|key, _| key.shader != shader);
        }
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureHandle, GpuError> {
        desc.validate()?;

        let size = wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let rgba = expand_to_rgba8(desc.format, desc.pixels);
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * desc.width),
                rows_per_image: Some(desc.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(desc.label),
            address_mode_u: desc.wrap.to_wgpu(),
            address_mode_v: desc.wrap.to_wgpu(),
            address_mode_w: desc.wrap.to_wgpu(),
            mag_filter: desc.filter.to_wgpu(),
            min_filter: desc.filter.to_wgpu(),
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(desc.label),
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        Ok(self.textures.insert(TextureEntry {
            _texture: texture,
            bind_group,
        }))
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(texture);
    }

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferHandle, GpuError> {
        desc.validate()?;

        let usage = match desc.ty {
            BufferType::Vertex => wgpu::BufferUsages::VERTEX,
            BufferType::Index => wgpu::BufferUsages::INDEX,
        } | wgpu::BufferUsages::COPY_DST;

        let size = align_copy(desc.size);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(desc.label),
            size,
            usage,
            mapped_at_creation: false,
        });

        if let Some(data) = desc.data {
            write_padded(&self.queue, &buffer, 0, data);
        }

        Ok(self.buffers.insert(BufferEntry {
            buffer,
            ty: desc.ty,
            size: desc.size,
        }))
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(buffer);
    }

    fn bind_shader(&mut self, shader: ShaderHandle) {
        self.bound.shader = Some(shader);
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        if unit != 0 {
            log::warn!("WgpuBackend: texture unit {unit} is not supported; only unit 0 is");
            return;
        }
        self.bound.texture = Some(texture);
    }

    fn bind_buffer(&mut self, ty: BufferType, buffer: BufferHandle) {
        match ty {
            BufferType::Vertex => self.bound.vertex = Some(buffer),
            BufferType::Index => self.bound.index = Some(buffer),
        }
    }

    fn bind_layout(&mut self, layout: &VertexLayout) {
        if self.bound.layout.as_ref() != Some(layout) {
            self.bound.layout = Some(layout.clone());
        }
    }

    fn set_buffer_data(&mut self, ty: BufferType, buffer: BufferHandle, data: &[u8]) {
        let Some(entry) = self.buffers.get(buffer) else {
            log::warn!("WgpuBackend: set_buffer_data on a destroyed buffer; ignored");
            return;
        };
        if entry.ty != ty {
            log::warn!("WgpuBackend: buffer is {:?}, not {ty:?}; write ignored", entry.ty);
            return;
        }
        if data.len() as u64 > entry.size {
            log::warn!(
                "WgpuBackend: {} bytes do not fit in a {} byte buffer; write ignored",
                data.len(),
                entry.size
            );
            return;
        }
        if !data.is_empty() {
            write_padded(&self.queue, &entry.buffer, 0, data);
        }
    }

    fn set_uniform(&mut self, shader: ShaderHandle, name: &str, value: UniformValue) {
        let Some(entry) = self.shaders.get(shader) else {
            log::warn!("WgpuBackend: set_uniform on a destroyed shader; ignored");
            return;
        };
        let (Some(offset), Some(buffer)) =
            (entry.info.uniform_offset(name), entry.uniform_buffer.as_ref())
        else {
            log::warn!("WgpuBackend: shader `{}` has no uniform `{name}`", entry.label);
            return;
        };
        let bytes = value.to_bytes();
        if offset as usize + bytes.len() > entry.info.uniform_block_size as usize {
            log::warn!("WgpuBackend: uniform `{name}` of `{}` is smaller than the value", entry.label);
            return;
        }
        self.queue.write_buffer(buffer, u64::from(offset), &bytes);
    }

    fn clear(&mut self, color: Color) {
        let Some(target) = self.target.as_ref() else {
            log::warn!("WgpuBackend: clear without a render target; skipped");
            return;
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sprig clear encoder"),
            });
        drop(Self::color_pass(
            &mut encoder,
            &target.view,
            wgpu::LoadOp::Clear(color.into()),
        ));
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn draw_primitives(&mut self, primitive: PrimitiveType, count: u32) {
        self.draw(primitive, count, false);
    }

    fn draw_primitives_indexed(&mut self, primitive: PrimitiveType, count: u32) {
        self.draw(primitive, count, true);
    }
}
