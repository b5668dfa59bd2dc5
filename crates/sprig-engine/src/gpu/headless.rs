//! In-memory backend.
//!
//! `HeadlessGpu` validates every resource exactly like the wgpu backend but keeps
//! buffers and textures in host memory and records each draw instead of executing
//! it. Used for tests and for running demos without a window.

use std::collections::BTreeMap;

use slotmap::SlotMap;

use crate::color::Color;

use super::program::{compile_program, ProgramInfo};
use super::{
    expand_to_rgba8, BufferDesc, BufferHandle, BufferType, GpuBackend, GpuError,
    PrimitiveType, ShaderDesc, ShaderHandle, TextureDesc, TextureHandle, UniformValue,
    VertexLayout,
};

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub primitive: PrimitiveType,
    pub count: u32,
    pub indexed: bool,
    pub shader: ShaderHandle,
    /// Texture on unit 0, if the program samples one.
    pub texture: Option<TextureHandle>,
    /// Uniform values of the shader at draw time.
    pub uniforms: BTreeMap<String, UniformValue>,
    /// Bytes of every vertex the draw referenced; only with vertex capture enabled.
    pub vertex_bytes: Option<Vec<u8>>,
}

struct HeadlessShader {
    label: String,
    info: ProgramInfo,
    uniforms: BTreeMap<String, UniformValue>,
}

struct HeadlessTexture {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

struct HeadlessBuffer {
    ty: BufferType,
    data: Vec<u8>,
}

#[derive(Default)]
struct Bound {
    shader: Option<ShaderHandle>,
    texture: Option<TextureHandle>,
    vertex: Option<BufferHandle>,
    index: Option<BufferHandle>,
    layout: Option<VertexLayout>,
}

#[derive(Default)]
pub struct HeadlessGpu {
    shaders: SlotMap<ShaderHandle, HeadlessShader>,
    textures: SlotMap<TextureHandle, HeadlessTexture>,
    buffers: SlotMap<BufferHandle, HeadlessBuffer>,

    bound: Bound,
    capture_vertices: bool,

    clears: Vec<Color>,
    draws: Vec<DrawRecord>,
}

impl HeadlessGpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also copies the referenced vertex bytes into every [`DrawRecord`].
    pub fn with_vertex_capture(mut self) -> Self {
        self.capture_vertices = true;
        self
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn clears(&self) -> &[Color] {
        &self.clears
    }

    /// Forgets recorded draws and clears. Resources and bindings are kept.
    pub fn reset(&mut self) {
        self.draws.clear();
        self.clears.clear();
    }

    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(buffer).map(|b| b.data.as_slice())
    }

    /// Texture contents, expanded to RGBA8.
    pub fn texture_pixels(&self, texture: TextureHandle) -> Option<&[u8]> {
        self.textures.get(texture).map(|t| t.rgba.as_slice())
    }

    pub fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures.get(texture).map(|t| (t.width, t.height))
    }

    pub fn uniform(&self, shader: ShaderHandle, name: &str) -> Option<UniformValue> {
        self.shaders.get(shader)?.uniforms.get(name).copied()
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Checks bindings for a draw and returns the record to push, or `None` after
    /// logging why the draw is skipped.
    fn prepare_draw(&self, primitive: PrimitiveType, count: u32, indexed: bool) -> Option<DrawRecord> {
        let Some(shader_handle) = self.bound.shader else {
            log::warn!("HeadlessGpu: draw without a bound shader; skipped");
            return None;
        };
        let Some(shader) = self.shaders.get(shader_handle) else {
            log::warn!("HeadlessGpu: bound shader was destroyed; draw skipped");
            return None;
        };
        let Some(layout) = self.bound.layout.as_ref() else {
            log::warn!("HeadlessGpu: draw without a vertex layout; skipped");
            return None;
        };
        let Some(vertex) = self.bound.vertex.and_then(|h| self.buffers.get(h)) else {
            log::warn!("HeadlessGpu: draw without a live vertex buffer; skipped");
            return None;
        };

        let texture = if shader.info.samples_texture {
            match self.bound.texture {
                Some(t) if self.textures.contains_key(t) => Some(t),
                _ => {
                    log::warn!(
                        "HeadlessGpu: shader `{}` samples a texture but none is bound; draw skipped",
                        shader.label
                    );
                    return None;
                }
            }
        } else {
            None
        };

        let stride = layout.stride() as usize;
        let vertex_count = if indexed {
            let Some(index) = self.bound.index.and_then(|h| self.buffers.get(h)) else {
                log::warn!("HeadlessGpu: indexed draw without a live index buffer; skipped");
                return None;
            };
            let needed = count as usize * 2;
            if needed > index.data.len() {
                log::warn!(
                    "HeadlessGpu: {count} indices exceed the bound index buffer; draw skipped"
                );
                return None;
            }
            index.data[..needed]
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]) as usize + 1)
                .max()
                .unwrap_or(0)
        } else {
            count as usize
        };

        let vertex_end = vertex_count * stride;
        if vertex_end > vertex.data.len() {
            log::warn!("HeadlessGpu: draw reads past the bound vertex buffer; skipped");
            return None;
        }

        Some(DrawRecord {
            primitive,
            count,
            indexed,
            shader: shader_handle,
            texture,
            uniforms: shader.uniforms.clone(),
            vertex_bytes: self
                .capture_vertices
                .then(|| vertex.data[..vertex_end].to_vec()),
        })
    }
}

impl GpuBackend for HeadlessGpu {
    fn create_shader(&mut self, desc: &ShaderDesc<'_>) -> Result<ShaderHandle, GpuError> {
        let info = compile_program(desc)?;
        Ok(self.shaders.insert(HeadlessShader {
            label: desc.label.to_owned(),
            info,
            uniforms: BTreeMap::new(),
        }))
    }

    fn destroy_shader(&mut self, shader: ShaderHandle) {
        self.shaders.remove(shader);
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureHandle, GpuError> {
        desc.validate()?;
        Ok(self.textures.insert(HeadlessTexture {
            width: desc.width,
            height: desc.height,
            rgba: expand_to_rgba8(desc.format, desc.pixels),
        }))
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(texture);
    }

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferHandle, GpuError> {
        desc.validate()?;
        let mut data = vec![0u8; desc.size as usize];
        if let Some(init) = desc.data {
            data[..init.len()].copy_from_slice(init);
        }
        Ok(self.buffers.insert(HeadlessBuffer { ty: desc.ty, data }))
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(buffer);
    }

    fn bind_shader(&mut self, shader: ShaderHandle) {
        self.bound.shader = Some(shader);
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        if unit != 0 {
            log::warn!("HeadlessGpu: texture unit {unit} is not supported; only unit 0 is");
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
        let Some(b) = self.buffers.get_mut(buffer) else {
            log::warn!("HeadlessGpu: set_buffer_data on a destroyed buffer; ignored");
            return;
        };
        if b.ty != ty {
            log::warn!("HeadlessGpu: buffer is {:?}, not {ty:?}; write ignored", b.ty);
            return;
        }
        if data.len() > b.data.len() {
            log::warn!(
                "HeadlessGpu: {} bytes do not fit in a {} byte buffer; write ignored",
                data.len(),
                b.data.len()
            );
            return;
        }
        b.data[..data.len()].copy_from_slice(data);
    }

    fn set_uniform(&mut self, shader: ShaderHandle, name: &str, value: UniformValue) {
        let Some(s) = self.shaders.get_mut(shader) else {
            log::warn!("HeadlessGpu: set_uniform on a destroyed shader; ignored");
            return;
        };
        let Some(offset) = s.info.uniform_offset(name) else {
            log::warn!("HeadlessGpu: shader `{}` has no uniform `{name}`", s.label);
            return;
        };
        let size = value.to_bytes().len() as u32;
        if offset + size > s.info.uniform_block_size {
            log::warn!("HeadlessGpu: uniform `{name}` of `{}` is smaller than the value", s.label);
            return;
        }
        s.uniforms.insert(name.to_owned(), value);
    }

    fn clear(&mut self, color: Color) {
        self.clears.push(color);
    }

    fn draw_primitives(&mut self, primitive: PrimitiveType, count: u32) {
        if count == 0 {
            return;
        }
        if let Some(record) = self.prepare_draw(primitive, count, false) {
            self.draws.push(record);
        }
    }

    fn draw_primitives_indexed(&mut self, primitive: PrimitiveType, count: u32) {
        if count == 0 {
            return;
        }
        if let Some(record) = self.prepare_draw(primitive, count, true) {
            self.draws.push(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{BufferUsage, PixelFormat, TextureFilter, TextureWrap, VertexFormat};

    const VS: &str = r#"
struct Globals { transform: mat4x4<f32> };
@group(0) @binding(0) var<uniform> globals: Globals;

@vertex
fn vs_main(@location(0) position: vec2<f32>) -> @builtin(position) vec4<f32> {
    return globals.transform * vec4<f32>(position, 0.0, 1.0);
}
"#;

    const FS: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 1.0, 1.0);
}
"#;

    fn layout() -> VertexLayout {
        VertexLayout::new().push("position", VertexFormat::Float2)
    }

    fn setup(gpu: &mut HeadlessGpu) -> (ShaderHandle, BufferHandle) {
        let layout = layout();
        let shader = gpu
            .create_shader(&ShaderDesc {
                label: "plain",
                vertex_source: VS,
                fragment_source: FS,
                layout: &layout,
            })
            .unwrap();
        let vbo = gpu
            .create_buffer(&BufferDesc {
                label: "vbo",
                ty: BufferType::Vertex,
                usage: BufferUsage::Dynamic,
                size: 64,
                data: None,
            })
            .unwrap();
        gpu.bind_shader(shader);
        gpu.bind_buffer(BufferType::Vertex, vbo);
        gpu.bind_layout(&layout);
        (shader, vbo)
    }

    #[test]
    fn records_draw_with_uniform_snapshot() {
        let mut gpu = HeadlessGpu::new().with_vertex_capture();
        let (shader, vbo) = setup(&mut gpu);

        let verts: [f32; 4] = [1.0, 2.0, 3.0, 4.0];
        gpu.set_buffer_data(BufferType::Vertex, vbo, bytemuck::cast_slice(&verts));
        gpu.set_uniform(shader, "transform", UniformValue::Mat4(glam::Mat4::IDENTITY));
        gpu.draw_primitives(PrimitiveType::LineList, 2);

        let draw = &gpu.draws()[0];
        assert_eq!(draw.count, 2);
        assert!(!draw.indexed);
        assert_eq!(draw.texture, None);
        assert_eq!(
            draw.uniforms.get("transform"),
            Some(&UniformValue::Mat4(glam::Mat4::IDENTITY))
        );
        assert_eq!(draw.vertex_bytes.as_deref(), Some(bytemuck::cast_slice(&verts)));
    }

    #[test]
    fn unknown_uniform_is_ignored() {
        let mut gpu = HeadlessGpu::new();
        let (shader, _) = setup(&mut gpu);
        gpu.set_uniform(shader, "nope", UniformValue::Vec4(glam::Vec4::ONE));
        assert_eq!(gpu.uniform(shader, "nope"), None);
    }

    #[test]
    fn draw_past_buffer_end_is_skipped() {
        let mut gpu = HeadlessGpu::new();
        setup(&mut gpu);
        // 64 bytes hold 8 vec2 vertices.
        gpu.draw_primitives(PrimitiveType::TriangleList, 9);
        assert!(gpu.draws().is_empty());
        gpu.draw_primitives(PrimitiveType::TriangleList, 6);
        assert_eq!(gpu.draws().len(), 1);
    }

    #[test]
    fn indexed_draw_needs_index_buffer() {
        let mut gpu = HeadlessGpu::new();
        setup(&mut gpu);
        gpu.draw_primitives_indexed(PrimitiveType::TriangleList, 3);
        assert!(gpu.draws().is_empty());

        let indices: [u16; 3] = [0, 1, 2];
        let ibo = gpu
            .create_buffer(&BufferDesc {
                label: "ibo",
                ty: BufferType::Index,
                usage: BufferUsage::Static,
                size: 6,
                data: Some(bytemuck::cast_slice(&indices)),
            })
            .unwrap();
        gpu.bind_buffer(BufferType::Index, ibo);
        gpu.draw_primitives_indexed(PrimitiveType::TriangleList, 3);
        assert!(gpu.draws()[0].indexed);
    }

    #[test]
    fn oversized_write_is_ignored() {
        let mut gpu = HeadlessGpu::new();
        let (_, vbo) = setup(&mut gpu);
        gpu.set_buffer_data(BufferType::Vertex, vbo, &[1u8; 65]);
        assert!(gpu.buffer_data(vbo).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn textures_are_stored_as_rgba() {
        let mut gpu = HeadlessGpu::new();
        let tex = gpu
            .create_texture(&TextureDesc {
                label: "lum",
                filter: TextureFilter::Linear,
                wrap: TextureWrap::Repeat,
                format: PixelFormat::Luminance,
                width: 2,
                height: 1,
                pixels: &[10, 20],
            })
            .unwrap();
        assert_eq!(gpu.texture_size(tex), Some((2, 1)));
        assert_eq!(gpu.texture_pixels(tex).unwrap(), &[10, 10, 10, 255, 20, 20, 20, 255]);

        gpu.destroy_texture(tex);
        assert_eq!(gpu.texture_count(), 0);
        // Destroying twice is harmless.
        gpu.destroy_texture(tex);
    }

    #[test]
    fn destroyed_shader_is_not_drawn() {
        let mut gpu = HeadlessGpu::new();
        let (shader, _) = setup(&mut gpu);
        gpu.destroy_shader(shader);
        gpu.draw_primitives(PrimitiveType::TriangleList, 3);
        assert!(gpu.draws().is_empty());
    }
}
