use glam::{Mat4, Vec2, Vec4};

use crate::color::Color;
use crate::gpu::{
    BufferDesc, BufferHandle, BufferType, BufferUsage, GpuBackend, GpuError, PixelFormat,
    PrimitiveType, ShaderDesc, ShaderHandle, TextureDesc, TextureFilter, TextureWrap,
    UniformValue, VertexLayout,
};

use super::camera::Camera;
use super::config::RendererConfig;
use super::shaders;
use super::texture::{create_texture, Region, Texture};
use super::vertex::{self, Vertex, LINE_POSITIONS};
use super::RendererError;

/// Shape kind of a batch.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Shape {
    Quad,
    Circle,
    Line,
}

impl Shape {
    const fn indices_per_shape(self) -> usize {
        match self {
            Shape::Quad | Shape::Circle => 6,
            Shape::Line => 0,
        }
    }
}

/// The live batch. Quads additionally carry the texture they sample.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Batch {
    Idle,
    Quad { texture: Texture },
    Circle,
    Line,
}

impl Batch {
    fn shape(self) -> Option<Shape> {
        match self {
            Batch::Idle => None,
            Batch::Quad { .. } => Some(Shape::Quad),
            Batch::Circle => Some(Shape::Circle),
            Batch::Line => Some(Shape::Line),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum FlushReason {
    Capacity,
    Shape,
    Texture,
    End,
}

/// Counters for the current frame, reset by [`BatchRenderer::begin`].
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub vertices: usize,
    pub indices: usize,
    /// Flushes forced by a full vertex buffer.
    pub capacity_flushes: u32,
    /// Flushes forced by a change of shape kind.
    pub shape_flushes: u32,
    /// Flushes forced by a change of quad texture.
    pub texture_flushes: u32,
}

/// GPU objects owned by the renderer. Null handles are ignored on destroy, so a
/// partially created set can be released as is.
#[derive(Default)]
struct Resources {
    white: Texture,
    quad_shader: ShaderHandle,
    circle_shader: ShaderHandle,
    line_shader: ShaderHandle,
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
}

impl Resources {
    fn create<G: GpuBackend>(
        &mut self,
        gpu: &mut G,
        config: &RendererConfig,
        layout: &VertexLayout,
    ) -> Result<(), GpuError> {
        self.white = create_texture(
            gpu,
            &TextureDesc {
                label: "sprig white",
                filter: TextureFilter::Nearest,
                wrap: TextureWrap::Repeat,
                format: PixelFormat::Rgba,
                width: 1,
                height: 1,
                pixels: &[255, 255, 255, 255],
            },
        )?;

        self.quad_shader =
            gpu.create_shader(&shader_desc("sprig quad", shaders::QUAD_FRAGMENT, layout))?;
        self.circle_shader =
            gpu.create_shader(&shader_desc("sprig circle", shaders::CIRCLE_FRAGMENT, layout))?;
        self.line_shader =
            gpu.create_shader(&shader_desc("sprig line", shaders::LINE_FRAGMENT, layout))?;

        self.vertex_buffer = gpu.create_buffer(&BufferDesc {
            label: "sprig vertices",
            ty: BufferType::Vertex,
            usage: BufferUsage::Dynamic,
            size: (config.max_vertices() * std::mem::size_of::<Vertex>()) as u64,
            data: None,
        })?;

        let indices = vertex::quad_index_pattern(config.max_quads);
        self.index_buffer = gpu.create_buffer(&BufferDesc {
            label: "sprig indices",
            ty: BufferType::Index,
            usage: BufferUsage::Static,
            size: (indices.len() * std::mem::size_of::<u16>()) as u64,
            data: Some(bytemuck::cast_slice(&indices)),
        })?;

        Ok(())
    }

    fn destroy<G: GpuBackend>(&self, gpu: &mut G) {
        gpu.destroy_buffer(self.index_buffer);
        gpu.destroy_buffer(self.vertex_buffer);
        gpu.destroy_shader(self.line_shader);
        gpu.destroy_shader(self.circle_shader);
        gpu.destroy_shader(self.quad_shader);
        gpu.destroy_texture(self.white.handle);
    }
}

fn shader_desc<'a>(
    label: &'a str,
    fragment_source: &'a str,
    layout: &'a VertexLayout,
) -> ShaderDesc<'a> {
    ShaderDesc {
        label,
        vertex_source: shaders::SHARED_VERTEX,
        fragment_source,
        layout,
    }
}

/// Batched 2D renderer.
///
/// Shapes drawn between [`begin`](Self::begin) and [`end`](Self::end) are
/// accumulated into one vertex buffer and submitted with as few draws as
/// possible. A batch is flushed early when the vertex buffer is full, when the
/// shape kind changes, or when a textured quad switches texture; draws are
/// therefore composited in issue order.
pub struct BatchRenderer<G: GpuBackend> {
    gpu: G,
    config: RendererConfig,
    res: Resources,
    layout: VertexLayout,

    batch: Batch,
    vertices: Vec<Vertex>,
    index_count: usize,

    camera: Option<Camera>,
    stats: FrameStats,
}

impl<G: GpuBackend> BatchRenderer<G> {
    pub fn new(mut gpu: G, config: RendererConfig) -> Result<Self, RendererError> {
        config.validate()?;

        let layout = Vertex::layout();
        let mut res = Resources::default();
        if let Err(err) = res.create(&mut gpu, &config, &layout) {
            res.destroy(&mut gpu);
            return Err(err.into());
        }

        log::debug!(
            "BatchRenderer: {} quads ({} vertices) per batch",
            config.max_quads,
            config.max_vertices()
        );

        Ok(Self {
            gpu,
            vertices: Vec::with_capacity(config.max_vertices()),
            config,
            res,
            layout,
            batch: Batch::Idle,
            index_count: 0,
            camera: None,
            stats: FrameStats::default(),
        })
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Starts a frame seen through `camera`. Pending geometry is discarded.
    pub fn begin(&mut self, camera: &Camera) {
        self.camera = Some(camera.clone());
        self.stats = FrameStats::default();
        self.start_batch();
    }

    /// Submits the pending batch.
    pub fn end(&mut self) {
        self.flush(FlushReason::End);
        self.start_batch();
    }

    fn start_batch(&mut self) {
        self.batch = Batch::Idle;
        self.vertices.clear();
        self.index_count = 0;
    }

    fn flush(&mut self, reason: FlushReason) {
        let Some(shape) = self.batch.shape() else { return };

        let camera = self.camera.get_or_insert_with(|| {
            log::warn!("BatchRenderer: flush outside of begin/end; using an identity camera");
            Camera::default()
        });
        camera.recalculate_view_matrix();
        let projection = camera.projection_matrix();
        let view = camera.view_matrix();

        let gpu = &mut self.gpu;
        gpu.set_buffer_data(
            BufferType::Vertex,
            self.res.vertex_buffer,
            bytemuck::cast_slice(&self.vertices),
        );
        gpu.bind_layout(&self.layout);
        gpu.bind_buffer(BufferType::Vertex, self.res.vertex_buffer);

        let shader = match self.batch {
            Batch::Quad { texture } => {
                gpu.bind_texture(0, texture.handle);
                self.res.quad_shader
            }
            Batch::Circle => self.res.circle_shader,
            Batch::Line | Batch::Idle => self.res.line_shader,
        };
        gpu.bind_shader(shader);
        gpu.set_uniform(shader, "projection", UniformValue::Mat4(projection));
        gpu.set_uniform(shader, "view", UniformValue::Mat4(view));

        let vertex_count = self.vertices.len() as u32;
        match shape {
            Shape::Quad | Shape::Circle => {
                gpu.bind_buffer(BufferType::Index, self.res.index_buffer);
                gpu.draw_primitives_indexed(PrimitiveType::TriangleList, self.index_count as u32);
            }
            Shape::Line => gpu.draw_primitives(PrimitiveType::LineList, vertex_count),
        }

        self.stats.draw_calls += 1;
        self.stats.vertices += self.vertices.len();
        self.stats.indices += self.index_count;
        match reason {
            FlushReason::Capacity => self.stats.capacity_flushes += 1,
            FlushReason::Shape => self.stats.shape_flushes += 1,
            FlushReason::Texture => self.stats.texture_flushes += 1,
            FlushReason::End => {}
        }

        log::trace!(
            "BatchRenderer: flushed {shape:?} batch ({vertex_count} vertices, {reason:?})"
        );
    }

    /// Appends one shape's vertices, flushing first when they cannot join the
    /// current batch.
    fn submit(&mut self, batch: Batch, vertices: &[Vertex]) {
        let reason = if self.vertices.len() + vertices.len() > self.capacity() {
            Some(FlushReason::Capacity)
        } else {
            match (self.batch, batch) {
                (Batch::Idle, _) => None,
                (current, next) if current.shape() != next.shape() => Some(FlushReason::Shape),
                (Batch::Quad { texture: current }, Batch::Quad { texture: next })
                    if current.handle != next.handle =>
                {
                    Some(FlushReason::Texture)
                }
                _ => None,
            }
        };

        if let Some(reason) = reason {
            self.flush(reason);
            self.start_batch();
        }

        self.vertices.extend_from_slice(vertices);
        self.batch = batch;
        if let Some(shape) = batch.shape() {
            self.index_count += shape.indices_per_shape();
        }
    }

    /// Substitutes the white texture for a null one.
    fn resolve(&self, texture: &Texture) -> Texture {
        if texture.is_null() { self.res.white } else { *texture }
    }

    // ── rects ─────────────────────────────────────────────────────────────

    pub fn draw_rect(&mut self, position: Vec2, size: Vec2, rotation: f32, color: Color) {
        self.draw_rect_transform(&vertex::make_transform(position, size, rotation), color);
    }

    pub fn draw_rect_transform(&mut self, transform: &Mat4, color: Color) {
        let white = self.res.white;
        self.draw_texture_transform(&white, transform, color);
    }

    /// Outline of a rect as four lines.
    pub fn draw_rect_lines(&mut self, position: Vec2, size: Vec2, rotation: f32, color: Color) {
        self.draw_rect_lines_transform(&vertex::make_transform(position, size, rotation), color);
    }

    pub fn draw_rect_lines_transform(&mut self, transform: &Mat4, color: Color) {
        for (start, end) in vertex::rect_outline(transform) {
            self.draw_line_points(start, end, color);
        }
    }

    // ── textures ──────────────────────────────────────────────────────────

    pub fn draw_texture(
        &mut self,
        texture: &Texture,
        position: Vec2,
        size: Vec2,
        rotation: f32,
        color: Color,
    ) {
        self.draw_texture_transform(texture, &vertex::make_transform(position, size, rotation), color);
    }

    pub fn draw_texture_transform(&mut self, texture: &Texture, transform: &Mat4, color: Color) {
        let texture = self.resolve(texture);
        let vertices = vertex::quad_vertices(transform, color, &Mat4::IDENTITY, Vec2::ONE);
        self.submit(Batch::Quad { texture }, &vertices);
    }

    /// Draws the `region` of `texture` (in texels), repeated `tiling` times
    /// across the quad. A null texture draws white and ignores the region.
    pub fn draw_texture_region(
        &mut self,
        texture: &Texture,
        region: Region,
        transform: &Mat4,
        color: Color,
        tiling: Vec2,
    ) {
        let uv_transform = if texture.is_null() {
            Mat4::IDENTITY
        } else {
            let size = texture.size();
            vertex::uv_transform(region.origin / size, region.size / size)
        };
        let texture = self.resolve(texture);
        let vertices = vertex::quad_vertices(transform, color, &uv_transform, tiling);
        self.submit(Batch::Quad { texture }, &vertices);
    }

    // ── circles ───────────────────────────────────────────────────────────

    pub fn draw_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        let transform = vertex::make_transform(center, Vec2::splat(radius * 2.0), 0.0);
        self.draw_circle_transform(&transform, color);
    }

    /// Circle (or ellipse) inscribed in the transformed unit quad.
    pub fn draw_circle_transform(&mut self, transform: &Mat4, color: Color) {
        let vertices = vertex::circle_vertices(transform, color);
        self.submit(Batch::Circle, &vertices);
    }

    // ── lines ─────────────────────────────────────────────────────────────

    pub fn draw_line(&mut self, start: Vec2, end: Vec2, color: Color) {
        self.draw_line_points(
            start.extend(0.0).extend(1.0),
            end.extend(0.0).extend(1.0),
            color,
        );
    }

    /// The unit segment `(-0.5, 0) → (0.5, 0)` under `transform`.
    pub fn draw_line_transform(&mut self, transform: &Mat4, color: Color) {
        let [start, end] = LINE_POSITIONS.map(|p| *transform * p);
        self.draw_line_points(start, end, color);
    }

    fn draw_line_points(&mut self, start: Vec4, end: Vec4, color: Color) {
        let vertices = vertex::line_vertices(start, end, color);
        self.submit(Batch::Line, &vertices);
    }

    // ── accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn num_draw_calls(&self) -> u32 {
        self.stats.draw_calls
    }

    #[inline]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Vertex capacity of one batch.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.max_vertices()
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// The 1x1 white texture used for untextured quads.
    #[inline]
    pub fn white_texture(&self) -> Texture {
        self.res.white
    }

    #[inline]
    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    #[inline]
    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }

    /// Creates a texture on the renderer's backend. The caller owns it.
    pub fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<Texture, GpuError> {
        create_texture(&mut self.gpu, desc)
    }

    pub fn destroy_texture(&mut self, texture: Texture) {
        if texture.handle == self.res.white.handle {
            log::warn!("BatchRenderer: refusing to destroy the white texture");
            return;
        }
        self.gpu.destroy_texture(texture.handle);
    }
}

impl<G: GpuBackend> Drop for BatchRenderer<G> {
    fn drop(&mut self) {
        self.res.destroy(&mut self.gpu);
    }
}
