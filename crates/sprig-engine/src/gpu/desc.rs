//! Resource descriptors accepted by [`GpuBackend`](super::GpuBackend).

use super::GpuError;

// ── vertex layout ─────────────────────────────────────────────────────────

/// Component format of a single vertex attribute. All formats are `f32` based.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VertexFormat {
    Float,
    Float2,
    Float3,
    Float4,
}

impl VertexFormat {
    /// Size in bytes.
    #[inline]
    pub const fn size(self) -> u64 {
        self.components() as u64 * 4
    }

    #[inline]
    pub const fn components(self) -> u32 {
        match self {
            VertexFormat::Float => 1,
            VertexFormat::Float2 => 2,
            VertexFormat::Float3 => 3,
            VertexFormat::Float4 => 4,
        }
    }

    pub(crate) fn to_wgpu(self) -> wgpu::VertexFormat {
        match self {
            VertexFormat::Float => wgpu::VertexFormat::Float32,
            VertexFormat::Float2 => wgpu::VertexFormat::Float32x2,
            VertexFormat::Float3 => wgpu::VertexFormat::Float32x3,
            VertexFormat::Float4 => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// Named attribute inside a [`VertexLayout`].
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct VertexAttribute {
    pub name: &'static str,
    pub format: VertexFormat,
}

/// Interleaved vertex layout.
///
/// Attribute `i` is bound to shader location `i`; the shader input with the same
/// name must be declared at that location. Offsets are tightly packed in
/// declaration order.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    stride: u64,
}

impl VertexLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute after the current ones.
    pub fn push(mut self, name: &'static str, format: VertexFormat) -> Self {
        self.stride += format.size();
        self.attributes.push(VertexAttribute { name, format });
        self
    }

    #[inline]
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Size of one vertex in bytes.
    #[inline]
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Byte offset of every attribute, in declaration order.
    pub fn offsets(&self) -> impl Iterator<Item = u64> + '_ {
        self.attributes.iter().scan(0u64, |offset, attr| {
            let current = *offset;
            *offset += attr.format.size();
            Some(current)
        })
    }
}

// ── shaders ───────────────────────────────────────────────────────────────

/// Source and input layout of a shader program.
///
/// Both sources are WGSL. The vertex module must define `vs_main`, the fragment
/// module `fs_main`.
#[derive(Debug, Clone, Copy)]
pub struct ShaderDesc<'a> {
    pub label: &'a str,
    pub vertex_source: &'a str,
    pub fragment_source: &'a str,
    pub layout: &'a VertexLayout,
}

/// Value accepted by [`GpuBackend::set_uniform`](super::GpuBackend::set_uniform).
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Mat4(glam::Mat4),
    Vec4(glam::Vec4),
}

impl UniformValue {
    /// Raw column-major bytes as laid out in a uniform block.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            UniformValue::Mat4(m) => bytemuck::cast_slice(&m.to_cols_array()).to_vec(),
            UniformValue::Vec4(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
        }
    }
}

// ── primitives ────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PrimitiveType {
    LineList,
    TriangleList,
}

impl PrimitiveType {
    pub(crate) fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            PrimitiveType::LineList => wgpu::PrimitiveTopology::LineList,
            PrimitiveType::TriangleList => wgpu::PrimitiveTopology::TriangleList,
        }
    }
}

// ── buffers ───────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferType {
    Vertex,
    /// `u16` indices.
    Index,
}

/// Update frequency hint.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferUsage {
    Static,
    Dynamic,
    Stream,
}

#[derive(Debug, Clone, Copy)]
pub struct BufferDesc<'a> {
    pub label: &'a str,
    pub ty: BufferType,
    pub usage: BufferUsage,
    /// Size in bytes.
    pub size: u64,
    /// Initial contents, written at offset 0. May be shorter than `size`.
    pub data: Option<&'a [u8]>,
}

impl BufferDesc<'_> {
    pub fn validate(&self) -> Result<(), GpuError> {
        if self.size == 0 {
            return Err(GpuError::InvalidBuffer(format!("`{}` has zero size", self.label)));
        }
        if let Some(data) = self.data {
            if data.len() as u64 > self.size {
                return Err(GpuError::InvalidBuffer(format!(
                    "`{}`: {} bytes of initial data exceed the buffer size of {}",
                    self.label,
                    data.len(),
                    self.size
                )));
            }
        }
        Ok(())
    }
}

// ── textures ──────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

impl TextureFilter {
    pub(crate) fn to_wgpu(self) -> wgpu::FilterMode {
        match self {
            TextureFilter::Nearest => wgpu::FilterMode::Nearest,
            TextureFilter::Linear => wgpu::FilterMode::Linear,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureWrap {
    Clamp,
    Repeat,
    MirrorRepeat,
}

impl TextureWrap {
    pub(crate) fn to_wgpu(self) -> wgpu::AddressMode {
        match self {
            TextureWrap::Clamp => wgpu::AddressMode::ClampToEdge,
            TextureWrap::Repeat => wgpu::AddressMode::Repeat,
            TextureWrap::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
        }
    }
}

/// Layout of the source pixels handed to `create_texture`.
///
/// Every format is one byte per channel.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PixelFormat {
    Rgb,
    Rgba,
    LuminanceAlpha,
    Luminance,
    Alpha,
}

impl PixelFormat {
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
            PixelFormat::LuminanceAlpha => 2,
            PixelFormat::Luminance => 1,
            PixelFormat::Alpha => 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TextureDesc<'a> {
    pub label: &'a str,
    pub filter: TextureFilter,
    pub wrap: TextureWrap,
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u8],
}

impl TextureDesc<'_> {
    pub fn validate(&self) -> Result<(), GpuError> {
        if self.width == 0 || self.height == 0 {
            return Err(GpuError::InvalidTexture(format!(
                "`{}` has zero size ({}x{})",
                self.label, self.width, self.height
            )));
        }
        let expected = self.width as usize * self.height as usize * self.format.bytes_per_pixel();
        if self.pixels.len() != expected {
            return Err(GpuError::InvalidTexture(format!(
                "`{}`: expected {expected} bytes of {:?} pixels for {}x{}, got {}",
                self.label,
                self.format,
                self.width,
                self.height,
                self.pixels.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture(width: u32, height: u32, format: PixelFormat, pixels: &[u8]) -> TextureDesc<'_> {
        TextureDesc {
            label: "test",
            filter: TextureFilter::Nearest,
            wrap: TextureWrap::Clamp,
            format,
            width,
            height,
            pixels,
        }
    }

    // ── layout ────────────────────────────────────────────────────────────

    #[test]
    fn layout_packs_offsets_in_order() {
        let layout = VertexLayout::new()
            .push("position", VertexFormat::Float4)
            .push("color", VertexFormat::Float4)
            .push("texture_coord", VertexFormat::Float2)
            .push("local_position", VertexFormat::Float2);

        assert_eq!(layout.stride(), 48);
        assert_eq!(layout.offsets().collect::<Vec<_>>(), vec![0, 16, 32, 40]);
    }

    #[test]
    fn empty_layout_has_zero_stride() {
        assert_eq!(VertexLayout::new().stride(), 0);
        assert_eq!(VertexLayout::new().offsets().count(), 0);
    }

    // ── textures ──────────────────────────────────────────────────────────

    #[test]
    fn texture_size_must_match_pixels() {
        assert!(texture(2, 2, PixelFormat::Rgb, &[0; 12]).validate().is_ok());
        assert!(texture(2, 2, PixelFormat::Rgb, &[0; 16]).validate().is_err());
        assert!(texture(2, 1, PixelFormat::LuminanceAlpha, &[0; 4]).validate().is_ok());
    }

    #[test]
    fn zero_sized_texture_is_rejected() {
        let err = texture(0, 4, PixelFormat::Alpha, &[]).validate().unwrap_err();
        assert!(matches!(err, GpuError::InvalidTexture(_)));
    }

    // ── buffers ───────────────────────────────────────────────────────────

    #[test]
    fn buffer_data_must_fit() {
        let data = [0u8; 8];
        let desc = BufferDesc {
            label: "vbo",
            ty: BufferType::Vertex,
            usage: BufferUsage::Dynamic,
            size: 4,
            data: Some(&data),
        };
        assert!(matches!(desc.validate(), Err(GpuError::InvalidBuffer(_))));
        assert!(BufferDesc { size: 8, ..desc }.validate().is_ok());
        assert!(BufferDesc { size: 0, data: None, ..desc }.validate().is_err());
    }
}
