/// One acquired swapchain image.
///
/// Holding the frame blocks acquisition of the next one; hand it back to
/// [`Gpu::present`](super::Gpu::present) as soon as drawing is done.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}
