//! GPU resource layer.
//!
//! A small stateful command interface in the style of a classic immediate-mode
//! graphics API: resources are created from descriptors and referred to by
//! opaque handles, bindings persist until replaced, and draws consume the bound
//! state.
//!
//! Two backends implement [`GpuBackend`]:
//! - [`WgpuBackend`] renders into a wgpu texture view
//! - [`HeadlessGpu`] keeps everything in memory and records draws

mod backend;
mod desc;
mod error;
mod handle;
mod headless;
mod pixels;
pub mod program;
mod wgpu_backend;

pub use backend::GpuBackend;
pub use desc::{
    BufferDesc, BufferType, BufferUsage, PixelFormat, PrimitiveType, ShaderDesc, TextureDesc,
    TextureFilter, TextureWrap, UniformValue, VertexAttribute, VertexFormat, VertexLayout,
};
pub use error::GpuError;
pub use handle::{BufferHandle, ShaderHandle, TextureHandle};
pub use headless::{DrawRecord, HeadlessGpu};
pub use pixels::expand_to_rgba8;
pub use program::ProgramInfo;
pub use wgpu_backend::WgpuBackend;
