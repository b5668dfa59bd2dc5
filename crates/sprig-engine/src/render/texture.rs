use std::path::Path;

use glam::Vec2;
use thiserror::Error;

use crate::gpu::{
    GpuBackend, GpuError, PixelFormat, TextureDesc, TextureFilter, TextureHandle, TextureWrap,
};

/// A GPU texture together with its size in texels.
///
/// `Texture::default()` is the null texture; the batch renderer draws it as white.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Texture {
    pub handle: TextureHandle,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    #[inline]
    pub fn is_null(&self) -> bool {
        self.handle == TextureHandle::default() || self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

/// Source rectangle in texel units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Region {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Region {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// The whole of `texture`.
    pub fn full(texture: &Texture) -> Self {
        Self {
            origin: Vec2::ZERO,
            size: texture.size(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error(transparent)]
    Gpu(#[from] GpuError),
}

pub fn create_texture<G: GpuBackend + ?Sized>(
    gpu: &mut G,
    desc: &TextureDesc<'_>,
) -> Result<Texture, GpuError> {
    let handle = gpu.create_texture(desc)?;
    Ok(Texture {
        handle,
        width: desc.width,
        height: desc.height,
    })
}

/// Decodes an image file (PNG, JPEG or BMP) into an RGBA texture.
pub fn load_texture<G: GpuBackend + ?Sized>(
    gpu: &mut G,
    path: impl AsRef<Path>,
    filter: TextureFilter,
    wrap: TextureWrap,
) -> Result<Texture, TextureError> {
    let path = path.as_ref();
    let rgba = image::open(path)?.into_rgba8();
    let (width, height) = rgba.dimensions();

    let label = path.display().to_string();
    let texture = create_texture(
        gpu,
        &TextureDesc {
            label: &label,
            filter,
            wrap,
            format: PixelFormat::Rgba,
            width,
            height,
            pixels: rgba.as_raw(),
        },
    )?;

    log::debug!("loaded texture {label} ({width}x{height})");
    Ok(texture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessGpu;

    #[test]
    fn default_texture_is_null() {
        assert!(Texture::default().is_null());
    }

    #[test]
    fn created_texture_carries_its_size() {
        let mut gpu = HeadlessGpu::new();
        let tex = create_texture(
            &mut gpu,
            &TextureDesc {
                label: "px",
                filter: TextureFilter::Nearest,
                wrap: TextureWrap::Clamp,
                format: PixelFormat::Rgb,
                width: 3,
                height: 2,
                pixels: &[0; 18],
            },
        )
        .unwrap();

        assert!(!tex.is_null());
        assert_eq!(Region::full(&tex), Region::new(0.0, 0.0, 3.0, 2.0));
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let mut gpu = HeadlessGpu::new();
        let err = load_texture(
            &mut gpu,
            "does/not/exist.png",
            TextureFilter::Linear,
            TextureWrap::Clamp,
        )
        .unwrap_err();
        assert!(matches!(err, TextureError::Decode(_)));
        assert_eq!(gpu.texture_count(), 0);
    }

    #[test]
    fn loads_png_from_disk() {
        let path = std::env::temp_dir().join(format!("sprig-texture-{}.png", std::process::id()));
        image::RgbaImage::from_pixel(4, 2, image::Rgba([9, 8, 7, 6]))
            .save(&path)
            .unwrap();

        let mut gpu = HeadlessGpu::new();
        let tex = load_texture(&mut gpu, &path, TextureFilter::Nearest, TextureWrap::Repeat).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!((tex.width, tex.height), (4, 2));
        assert_eq!(&gpu.texture_pixels(tex.handle).unwrap()[..4], &[9, 8, 7, 6]);
    }
}
