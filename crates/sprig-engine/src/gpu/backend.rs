use crate::color::Color;

use super::{
    BufferDesc, BufferHandle, BufferType, GpuError, PrimitiveType, ShaderDesc, ShaderHandle,
    TextureDesc, TextureHandle, UniformValue, VertexLayout,
};

/// Stateful GPU command interface.
///
/// Draw calls consume whatever was last bound: one shader, one texture per unit,
/// one vertex and one index buffer, and the vertex layout. Bindings persist until
/// replaced.
///
/// Creation validates its descriptor and fails with [`GpuError`]. Everything else
/// is fire-and-forget: misuse (a stale handle, drawing with nothing bound) is
/// logged and the command is skipped.
pub trait GpuBackend {
    fn create_shader(&mut self, desc: &ShaderDesc<'_>) -> Result<ShaderHandle, GpuError>;
    fn destroy_shader(&mut self, shader: ShaderHandle);

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureHandle, GpuError>;
    fn destroy_texture(&mut self, texture: TextureHandle);

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferHandle, GpuError>;
    fn destroy_buffer(&mut self, buffer: BufferHandle);

    fn bind_shader(&mut self, shader: ShaderHandle);
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);
    fn bind_buffer(&mut self, ty: BufferType, buffer: BufferHandle);
    fn bind_layout(&mut self, layout: &VertexLayout);

    /// Replaces the first `data.len()` bytes of `buffer`.
    fn set_buffer_data(&mut self, ty: BufferType, buffer: BufferHandle, data: &[u8]);

    /// Writes a member of the shader's uniform block, looked up by name.
    fn set_uniform(&mut self, shader: ShaderHandle, name: &str, value: UniformValue);

    fn clear(&mut self, color: Color);

    /// Draws `count` vertices from the bound vertex buffer.
    fn draw_primitives(&mut self, primitive: PrimitiveType, count: u32);

    /// Draws `count` indices from the bound index buffer.
    fn draw_primitives_indexed(&mut self, primitive: PrimitiveType, count: u32);
}

impl<G: GpuBackend + ?Sized> GpuBackend for &mut G {
    fn create_shader(&mut self, desc: &ShaderDesc<'_>) -> Result<ShaderHandle, GpuError> {
        (**self).create_shader(desc)
    }

    fn destroy_shader(&mut self, shader: ShaderHandle) {
        (**self).destroy_shader(shader)
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureHandle, GpuError> {
        (**self).create_texture(desc)
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        (**self).destroy_texture(texture)
    }

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferHandle, GpuError> {
        (**self).create_buffer(desc)
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        (**self).destroy_buffer(buffer)
    }

    fn bind_shader(&mut self, shader: ShaderHandle) {
        (**self).bind_shader(shader)
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        (**self).bind_texture(unit, texture)
    }

    fn bind_buffer(&mut self, ty: BufferType, buffer: BufferHandle) {
        (**self).bind_buffer(ty, buffer)
    }

    fn bind_layout(&mut self, layout: &VertexLayout) {
        (**self).bind_layout(layout)
    }

    fn set_buffer_data(&mut self, ty: BufferType, buffer: BufferHandle, data: &[u8]) {
        (**self).set_buffer_data(ty, buffer, data)
    }

    fn set_uniform(&mut self, shader: ShaderHandle, name: &str, value: UniformValue) {
        (**self).set_uniform(shader, name, value)
    }

    fn clear(&mut self, color: Color) {
        (**self).clear(color)
    }

    fn draw_primitives(&mut self, primitive: PrimitiveType, count: u32) {
        (**self).draw_primitives(primitive, count)
    }

    fn draw_primitives_indexed(&mut self, primitive: PrimitiveType, count: u32) {
        (**self).draw_primitives_indexed(primitive, count)
    }
}
