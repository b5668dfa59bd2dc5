//! Demo scenes. Each one runs unchanged on the window backend and headless.

mod basic;
mod bunnymark;
mod shapes;

use glam::Vec2;
use sprig_engine::Color;
use sprig_engine::gpu::GpuBackend;
use sprig_engine::render::{BatchRenderer, Camera, FrameStats};

pub use basic::Basic;
pub use bunnymark::{BunnyMark, BunnyMarkConfig};
pub use shapes::Shapes;

pub trait Scene {
    /// Creates the scene's GPU resources.
    fn setup<G: GpuBackend>(&mut self, renderer: &mut BatchRenderer<G>) -> anyhow::Result<()>;

    /// Advances the simulation. `viewport` is the target size in logical pixels.
    fn update(&mut self, dt: f32, viewport: Vec2);

    /// Issues the frame's draws between `begin` and `end`.
    fn draw<G: GpuBackend>(&self, renderer: &mut BatchRenderer<G>);

    fn camera(&self) -> &Camera;

    fn clear_color(&self) -> Color {
        Color::BLACK
    }

    /// Receives the counters of the frame just drawn.
    fn after_frame(&mut self, stats: FrameStats) {
        let _ = stats;
    }

    /// Releases what `setup` created.
    fn teardown<G: GpuBackend>(&mut self, renderer: &mut BatchRenderer<G>) {
        let _ = renderer;
    }
}
