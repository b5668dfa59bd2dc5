use glam::Vec2;
use sprig_engine::gpu::{GpuBackend, HeadlessGpu};
use sprig_engine::render::{BatchRenderer, FrameStats, RendererConfig};
use sprig_engine::time::FrameTime;

use crate::scenes::Scene;

const FIXED_DT: f32 = 1.0 / 60.0;

/// Runs `frames` frames of `scene` on the recording backend with a fixed step.
///
/// Returns the counters of the last frame.
pub fn run_headless<S: Scene>(
    mut scene: S,
    config: RendererConfig,
    frames: u32,
    viewport: Vec2,
) -> anyhow::Result<FrameStats> {
    let mut renderer = BatchRenderer::new(HeadlessGpu::new(), config)?;
    scene.setup(&mut renderer)?;

    let mut last = FrameStats::default();
    for index in 0..frames {
        let time = FrameTime::fixed(FIXED_DT, u64::from(index));
        scene.update(time.dt, viewport);

        renderer.gpu_mut().reset();
        renderer.gpu_mut().clear(scene.clear_color());
        renderer.begin(scene.camera());
        scene.draw(&mut renderer);
        renderer.end();

        last = renderer.stats();
        scene.after_frame(last);
        log::debug!(
            "frame {}: {} draws ({} recorded), {} vertices",
            time.frame_index,
            last.draw_calls,
            renderer.gpu().draws().len(),
            last.vertices
        );
    }

    log::info!(
        "headless: {frames} frames, last frame {} draw calls ({} capacity, {} shape, {} texture flushes)",
        last.draw_calls,
        last.capacity_flushes,
        last.shape_flushes,
        last.texture_flushes
    );

    scene.teardown(&mut renderer);
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::{Basic, BunnyMark, BunnyMarkConfig, Shapes};

    const VIEWPORT: Vec2 = Vec2::new(640.0, 480.0);

    #[test]
    fn basic_is_one_draw() {
        let stats = run_headless(Basic::new(), RendererConfig::default(), 3, VIEWPORT).unwrap();
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.vertices, 4);
    }

    #[test]
    fn shapes_frame_is_stable() {
        let first = run_headless(Shapes::new(), RendererConfig::default(), 1, VIEWPORT).unwrap();
        let later = run_headless(Shapes::new(), RendererConfig::default(), 30, VIEWPORT).unwrap();
        assert_eq!(first, later);
    }

    #[test]
    fn bunnymark_splits_on_capacity() {
        let scene = BunnyMark::new(BunnyMarkConfig {
            max_bunnies: 500,
            ..Default::default()
        });
        let stats = run_headless(scene, RendererConfig { max_quads: 200 }, 10, VIEWPORT).unwrap();
        assert_eq!(stats.draw_calls, 3);
        assert_eq!(stats.capacity_flushes, 2);
    }

    #[test]
    fn zero_frames_draw_nothing() {
        let stats = run_headless(Basic::new(), RendererConfig::default(), 0, VIEWPORT).unwrap();
        assert_eq!(stats, FrameStats::default());
    }
}
