use glam::Vec2;
use sprig_engine::Color;
use sprig_engine::gpu::GpuBackend;
use sprig_engine::render::{BatchRenderer, Camera};

use super::Scene;

/// A single red square in the middle of the window.
pub struct Basic {
    camera: Camera,
    viewport: Vec2,
}

impl Basic {
    pub fn new() -> Self {
        Self {
            camera: Camera::default(),
            viewport: Vec2::ZERO,
        }
    }
}

impl Default for Basic {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for Basic {
    fn setup<G: GpuBackend>(&mut self, _renderer: &mut BatchRenderer<G>) -> anyhow::Result<()> {
        Ok(())
    }

    fn update(&mut self, _dt: f32, viewport: Vec2) {
        if viewport != self.viewport {
            self.viewport = viewport;
            self.camera = Camera::centered(viewport.x, viewport.y);
        }
    }

    fn draw<G: GpuBackend>(&self, renderer: &mut BatchRenderer<G>) {
        renderer.draw_rect(Vec2::ZERO, Vec2::splat(100.0), 0.0, Color::RED);
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_engine::gpu::HeadlessGpu;
    use sprig_engine::render::RendererConfig;

    #[test]
    fn one_draw_per_frame() {
        let mut renderer = BatchRenderer::new(HeadlessGpu::new(), RendererConfig::default()).unwrap();
        let mut scene = Basic::new();
        scene.setup(&mut renderer).unwrap();
        scene.update(1.0 / 60.0, Vec2::new(640.0, 480.0));

        renderer.begin(scene.camera());
        scene.draw(&mut renderer);
        renderer.end();

        assert_eq!(renderer.num_draw_calls(), 1);
        assert_eq!(renderer.gpu().draws()[0].count, 6);
    }
}
