//! Batched 2D rendering.
//!
//! [`BatchRenderer`] turns shape calls into as few GPU draws as possible on any
//! [`GpuBackend`](crate::gpu::GpuBackend).
//!
//! Convention:
//! - world units are arbitrary; the [`Camera`] extent maps them to the target
//! - +Y is up, rotations are counter-clockwise in radians

mod batch;
mod camera;
mod config;
mod shaders;
mod texture;
pub mod vertex;

use thiserror::Error;

use crate::gpu::GpuError;

pub use batch::{BatchRenderer, FrameStats, Shape};
pub use camera::Camera;
pub use config::{RendererConfig, MAX_QUADS_LIMIT};
pub use texture::{create_texture, load_texture, Region, Texture, TextureError};
pub use vertex::Vertex;

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("invalid renderer configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Gpu(#[from] GpuError),
}
