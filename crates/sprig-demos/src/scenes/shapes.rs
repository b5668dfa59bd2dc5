use std::f32::consts::TAU;

use glam::{Mat4, Vec2};
use sprig_engine::Color;
use sprig_engine::gpu::{GpuBackend, PixelFormat, TextureDesc, TextureFilter, TextureWrap};
use sprig_engine::render::vertex::make_transform;
use sprig_engine::render::{BatchRenderer, Camera, Region, Texture};

use super::Scene;

const CHECKER_SIZE: u32 = 8;

/// Every shape kind, interleaved so each frame exercises shape and texture
/// flushes, under a slowly orbiting camera.
pub struct Shapes {
    camera: Camera,
    viewport: Vec2,
    elapsed: f32,
    checker: Texture,
}

impl Shapes {
    pub fn new() -> Self {
        Self {
            camera: Camera::default(),
            viewport: Vec2::ZERO,
            elapsed: 0.0,
            checker: Texture::default(),
        }
    }
}

impl Default for Shapes {
    fn default() -> Self {
        Self::new()
    }
}

/// Two-color checkerboard, one texel per cell.
fn checker_pixels(size: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let v = if (x + y) % 2 == 0 { 230 } else { 40 };
            pixels.extend_from_slice(&[v, v, v, 255]);
        }
    }
    pixels
}

impl Scene for Shapes {
    fn setup<G: GpuBackend>(&mut self, renderer: &mut BatchRenderer<G>) -> anyhow::Result<()> {
        let pixels = checker_pixels(CHECKER_SIZE);
        self.checker = renderer.create_texture(&TextureDesc {
            label: "checker",
            filter: TextureFilter::Nearest,
            wrap: TextureWrap::Repeat,
            format: PixelFormat::Rgba,
            width: CHECKER_SIZE,
            height: CHECKER_SIZE,
            pixels: &pixels,
        })?;
        Ok(())
    }

    fn update(&mut self, dt: f32, viewport: Vec2) {
        self.elapsed += dt;
        if viewport != self.viewport {
            self.viewport = viewport;
            self.camera = Camera::centered(viewport.x, viewport.y);
        }

        let phase = self.elapsed * 0.5;
        self.camera.position = Vec2::new(phase.cos(), phase.sin()) * 20.0;
        self.camera.rotation = (phase * 0.7).sin() * 0.1;
    }

    fn draw<G: GpuBackend>(&self, renderer: &mut BatchRenderer<G>) {
        let spin = self.elapsed;

        // Row of filled and outlined rects.
        for i in 0..5 {
            let x = -200.0 + i as f32 * 100.0;
            let color = Color::new(0.2 + 0.15 * i as f32, 0.4, 0.9 - 0.15 * i as f32, 1.0);
            renderer.draw_rect(Vec2::new(x, 150.0), Vec2::splat(60.0), spin * 0.3 * i as f32, color);
            renderer.draw_rect_lines(Vec2::new(x, 150.0), Vec2::splat(72.0), 0.0, Color::WHITE);
        }

        // Circles, one ellipse.
        for i in 0..4 {
            let angle = spin + i as f32 * TAU / 4.0;
            let center = Vec2::new(angle.cos(), angle.sin()) * 60.0;
            renderer.draw_circle(center, 18.0, Color::from_srgb_u8(255, 180, 40));
        }
        let ellipse = make_transform(Vec2::new(0.0, -40.0), Vec2::new(120.0, 40.0), 0.0);
        renderer.draw_circle_transform(&ellipse, Color::GREEN.with_alpha(0.6));

        // Checker: whole, one quadrant, and tiled.
        renderer.draw_texture(&self.checker, Vec2::new(-200.0, -150.0), Vec2::splat(80.0), 0.0, Color::WHITE);
        let half = CHECKER_SIZE as f32 * 0.5;
        renderer.draw_texture_region(
            &self.checker,
            Region::new(0.0, 0.0, half, half),
            &make_transform(Vec2::new(-100.0, -150.0), Vec2::splat(80.0), 0.0),
            Color::WHITE,
            Vec2::ONE,
        );
        renderer.draw_texture_region(
            &self.checker,
            Region::full(&self.checker),
            &make_transform(Vec2::new(50.0, -150.0), Vec2::new(160.0, 80.0), 0.0),
            Color::new(1.0, 0.8, 0.8, 1.0),
            Vec2::new(4.0, 2.0),
        );

        // A fan of lines, then a scaled unit segment.
        for i in 0..12 {
            let angle = i as f32 * TAU / 12.0 - spin * 0.2;
            let end = Vec2::new(200.0, -20.0) + Vec2::new(angle.cos(), angle.sin()) * 50.0;
            renderer.draw_line(Vec2::new(200.0, -20.0), end, Color::WHITE);
        }
        let segment = Mat4::from_translation(glam::Vec3::new(0.0, -220.0, 0.0))
            * Mat4::from_scale(glam::Vec3::new(400.0, 1.0, 1.0));
        renderer.draw_line_transform(&segment, Color::RED);
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn clear_color(&self) -> Color {
        Color::from_srgb_u8(24, 26, 32)
    }

    fn teardown<G: GpuBackend>(&mut self, renderer: &mut BatchRenderer<G>) {
        renderer.destroy_texture(self.checker);
        self.checker = Texture::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_engine::gpu::HeadlessGpu;
    use sprig_engine::render::RendererConfig;

    #[test]
    fn checker_alternates() {
        let pixels = checker_pixels(2);
        assert_eq!(&pixels[0..4], &[230, 230, 230, 255]);
        assert_eq!(&pixels[4..8], &[40, 40, 40, 255]);
        assert_eq!(&pixels[8..12], &[40, 40, 40, 255]);
    }

    #[test]
    fn frame_splits_by_shape_and_texture() {
        let mut renderer = BatchRenderer::new(HeadlessGpu::new(), RendererConfig::default()).unwrap();
        let mut scene = Shapes::new();
        scene.setup(&mut renderer).unwrap();
        scene.update(0.0, Vec2::new(640.0, 480.0));

        renderer.begin(scene.camera());
        scene.draw(&mut renderer);
        renderer.end();

        // white quad/line pairs (10), circles, checker quads, lines
        let stats = renderer.stats();
        assert_eq!(stats.draw_calls, 13);
        assert_eq!(stats.capacity_flushes, 0);
        assert_eq!(stats.texture_flushes, 0);
        assert_eq!(stats.shape_flushes, 12);

        scene.teardown(&mut renderer);
        assert_eq!(renderer.gpu().texture_count(), 1);
    }
}
