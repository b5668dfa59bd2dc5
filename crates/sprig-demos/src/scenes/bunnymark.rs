use std::f32::consts::TAU;
use std::path::PathBuf;

use glam::{Vec2, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sprig_engine::Color;
use sprig_engine::gpu::{GpuBackend, PixelFormat, TextureDesc, TextureFilter, TextureWrap};
use sprig_engine::render::{load_texture, BatchRenderer, Camera, FrameStats, Texture};
use sprig_engine::time::FrameAverage;

use super::Scene;

const SPAWN_PER_FRAME: usize = 50;
const SPAWN_POINT: Vec2 = Vec2::new(320.0, 240.0);
const SPEED: f32 = 100.0;
const BUNNY_SIZE: Vec2 = Vec2::splat(32.0);
const SPRITE_SIZE: u32 = 32;

/// Keep spawning while frames average under this.
const TARGET_DT: f32 = 1.0 / 61.0;

#[derive(Debug, Clone)]
pub struct BunnyMarkConfig {
    /// Image used for the sprite; a generated one when absent.
    pub texture: Option<PathBuf>,
    /// Stops spawning at this many entities.
    pub max_bunnies: usize,
    pub seed: u64,
}

impl Default for BunnyMarkConfig {
    fn default() -> Self {
        Self {
            texture: None,
            max_bunnies: usize::MAX,
            seed: 0x5eed,
        }
    }
}

#[derive(Debug, Copy, Clone)]
struct Bunny {
    position: Vec2,
    velocity: Vec2,
    color: Color,
}

impl Bunny {
    /// Moves and reflects off the viewport edges, keeping the sprite inside.
    fn step(&mut self, dt: f32, viewport: Vec2) {
        self.position += self.velocity * dt;

        let half = BUNNY_SIZE * 0.5;
        let min = self.position - half;
        let max = self.position + half;

        if min.x < 0.0 {
            self.velocity.x = -self.velocity.x;
            self.position.x = half.x;
        } else if max.x > viewport.x {
            self.velocity.x = -self.velocity.x;
            self.position.x = viewport.x - half.x;
        }

        if min.y < 0.0 {
            self.velocity.y = -self.velocity.y;
            self.position.y = half.y;
        } else if max.y > viewport.y {
            self.velocity.y = -self.velocity.y;
            self.position.y = viewport.y - half.y;
        }
    }
}

/// Spawns textured sprites until the frame rate drops, the classic batching
/// stress test.
pub struct BunnyMark {
    config: BunnyMarkConfig,
    rng: StdRng,
    camera: Camera,
    viewport: Vec2,
    sprite: Texture,
    bunnies: Vec<Bunny>,
    average: FrameAverage,
    last_stats: FrameStats,
}

impl BunnyMark {
    pub fn new(config: BunnyMarkConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            camera: Camera::default(),
            viewport: Vec2::ZERO,
            sprite: Texture::default(),
            bunnies: Vec::new(),
            average: FrameAverage::default(),
            last_stats: FrameStats::default(),
        }
    }

    fn spawn(&mut self) {
        let room = self.config.max_bunnies.saturating_sub(self.bunnies.len());
        for _ in 0..SPAWN_PER_FRAME.min(room) {
            let angle = self.rng.gen_range(0.0..TAU);
            let color = Color::new(self.rng.r#gen(), self.rng.r#gen(), self.rng.r#gen(), 1.0);
            self.bunnies.push(Bunny {
                position: SPAWN_POINT,
                velocity: Vec2::new(angle.cos(), angle.sin()) * SPEED,
                color,
            });
        }
    }
}

/// Round sprite with a soft edge, white so the per-entity color tints it.
fn sprite_pixels(size: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    let center = Vec2::splat(size as f32 * 0.5);
    for y in 0..size {
        for x in 0..size {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let d = (p - center).length() / center.x;
            let alpha = ((1.0 - d) * 4.0).clamp(0.0, 1.0);
            let shade = Vec4::splat(255.0) * Vec4::new(1.0, 1.0, 1.0, alpha);
            pixels.extend_from_slice(&shade.to_array().map(|c| c as u8));
        }
    }
    pixels
}

impl Scene for BunnyMark {
    fn setup<G: GpuBackend>(&mut self, renderer: &mut BatchRenderer<G>) -> anyhow::Result<()> {
        if let Some(path) = &self.config.texture {
            match load_texture(renderer.gpu_mut(), path, TextureFilter::Linear, TextureWrap::Clamp) {
                Ok(texture) => self.sprite = texture,
                // The null sprite draws as white squares.
                Err(err) => log::warn!("bunnymark: cannot load {}: {err}", path.display()),
            }
            return Ok(());
        }

        let pixels = sprite_pixels(SPRITE_SIZE);
        self.sprite = renderer.create_texture(&TextureDesc {
            label: "bunny",
            filter: TextureFilter::Linear,
            wrap: TextureWrap::Clamp,
            format: PixelFormat::Rgba,
            width: SPRITE_SIZE,
            height: SPRITE_SIZE,
            pixels: &pixels,
        })?;
        Ok(())
    }

    fn update(&mut self, dt: f32, viewport: Vec2) {
        if viewport != self.viewport {
            self.viewport = viewport;
            self.camera = Camera::new(0.0, viewport.x, viewport.y, 0.0);
        }

        if self.average.average() < TARGET_DT {
            self.spawn();
        }

        for bunny in &mut self.bunnies {
            bunny.step(dt, viewport);
        }

        if let Some(average) = self.average.push(dt) {
            log::info!(
                "delta: {:.3} ms, count: {}, batches: {}",
                average * 1000.0,
                self.bunnies.len(),
                self.last_stats.draw_calls
            );
        }
    }

    fn draw<G: GpuBackend>(&self, renderer: &mut BatchRenderer<G>) {
        for bunny in &self.bunnies {
            renderer.draw_texture(&self.sprite, bunny.position, BUNNY_SIZE, 0.0, bunny.color);
        }
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn after_frame(&mut self, stats: FrameStats) {
        self.last_stats = stats;
    }

    fn teardown<G: GpuBackend>(&mut self, renderer: &mut BatchRenderer<G>) {
        if !self.sprite.is_null() {
            renderer.destroy_texture(self.sprite);
        }
        self.sprite = Texture::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_engine::gpu::HeadlessGpu;
    use sprig_engine::render::RendererConfig;

    const VIEWPORT: Vec2 = Vec2::new(640.0, 480.0);

    #[test]
    fn spawns_fifty_per_frame_until_the_cap() {
        let mut scene = BunnyMark::new(BunnyMarkConfig {
            max_bunnies: 120,
            ..Default::default()
        });
        scene.update(1.0 / 60.0, VIEWPORT);
        assert_eq!(scene.bunnies.len(), 50);
        scene.update(1.0 / 60.0, VIEWPORT);
        scene.update(1.0 / 60.0, VIEWPORT);
        assert_eq!(scene.bunnies.len(), 120);
    }

    #[test]
    fn slow_frames_stop_spawning() {
        let mut scene = BunnyMark::new(BunnyMarkConfig::default());
        // One frame longer than the averaging window.
        scene.update(1.5, VIEWPORT);
        let count = scene.bunnies.len();
        scene.update(1.0 / 60.0, VIEWPORT);
        assert_eq!(scene.bunnies.len(), count);
    }

    #[test]
    fn bounces_off_edges() {
        let mut bunny = Bunny {
            position: Vec2::new(630.0, 10.0),
            velocity: Vec2::new(100.0, -100.0),
            color: Color::WHITE,
        };
        bunny.step(0.1, VIEWPORT);
        assert_eq!(bunny.position, Vec2::new(640.0 - 16.0, 16.0));
        assert_eq!(bunny.velocity, Vec2::new(-100.0, 100.0));
    }

    #[test]
    fn same_seed_same_bunnies() {
        let mut a = BunnyMark::new(BunnyMarkConfig::default());
        let mut b = BunnyMark::new(BunnyMarkConfig::default());
        a.update(0.01, VIEWPORT);
        b.update(0.01, VIEWPORT);
        let va: Vec<Vec2> = a.bunnies.iter().map(|b| b.velocity).collect();
        let vb: Vec<Vec2> = b.bunnies.iter().map(|b| b.velocity).collect();
        assert_eq!(va, vb);
    }

    #[test]
    fn all_bunnies_share_one_texture() {
        let config = RendererConfig { max_quads: 300 };
        let mut renderer = BatchRenderer::new(HeadlessGpu::new(), config).unwrap();
        let mut scene = BunnyMark::new(BunnyMarkConfig {
            max_bunnies: 1000,
            ..Default::default()
        });
        scene.setup(&mut renderer).unwrap();
        for _ in 0..20 {
            scene.update(1.0 / 60.0, VIEWPORT);
        }
        assert_eq!(scene.bunnies.len(), 1000);

        renderer.begin(scene.camera());
        scene.draw(&mut renderer);
        renderer.end();

        let stats = renderer.stats();
        assert_eq!(stats.draw_calls, 4);
        assert_eq!(stats.capacity_flushes, 3);
        assert_eq!(stats.texture_flushes, 0);
        assert!(renderer.gpu().draws().iter().all(|d| d.texture == Some(scene.sprite.handle)));
    }

    #[test]
    fn missing_texture_falls_back_to_white() {
        let mut renderer = BatchRenderer::new(HeadlessGpu::new(), RendererConfig::default()).unwrap();
        let mut scene = BunnyMark::new(BunnyMarkConfig {
            texture: Some(PathBuf::from("/nonexistent/bunny.png")),
            ..Default::default()
        });
        scene.setup(&mut renderer).unwrap();
        assert!(scene.sprite.is_null());

        scene.update(1.0 / 60.0, VIEWPORT);
        renderer.begin(scene.camera());
        scene.draw(&mut renderer);
        renderer.end();
        let white = renderer.white_texture().handle;
        assert_eq!(renderer.gpu().draws()[0].texture, Some(white));
    }
}
