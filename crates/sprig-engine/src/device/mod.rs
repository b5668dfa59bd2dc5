//! GPU device and surface management.
//!
//! [`Gpu`] creates the wgpu instance, adapter, device and queue for a window,
//! keeps its surface configured and hands out one [`GpuFrame`] per presented
//! frame. Rendering itself goes through [`crate::gpu::WgpuBackend`], which
//! shares the device and queue.

mod context;
mod error;
mod frame;
mod init;
mod surface;

pub use context::Gpu;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use init::GpuInit;
