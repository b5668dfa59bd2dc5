use glam::Vec2;
use sprig_engine::core::{App, AppControl, FrameCtx, StartCtx};
use sprig_engine::gpu::{GpuBackend, WgpuBackend};
use sprig_engine::render::{BatchRenderer, RendererConfig};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};

use crate::scenes::Scene;

/// Puts a [`Scene`] in a window. Escape quits.
pub struct DemoApp<S: Scene> {
    scene: S,
    config: RendererConfig,
    renderer: Option<BatchRenderer<WgpuBackend>>,
}

impl<S: Scene> DemoApp<S> {
    pub fn new(scene: S, config: RendererConfig) -> Self {
        Self {
            scene,
            config,
            renderer: None,
        }
    }
}

impl<S: Scene> App for DemoApp<S> {
    fn on_start(&mut self, ctx: &mut StartCtx<'_, '_>) -> anyhow::Result<()> {
        let mut renderer = BatchRenderer::new(WgpuBackend::new(ctx.gpu), self.config.clone())?;
        self.scene.setup(&mut renderer)?;
        self.renderer = Some(renderer);
        Ok(())
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.logical_key == Key::Named(NamedKey::Escape) =>
            {
                AppControl::Exit
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(renderer) = self.renderer.as_mut() else {
            return AppControl::Exit;
        };

        let (width, height) = ctx.window.logical_size();
        self.scene.update(ctx.time.dt, Vec2::new(width, height));

        let scene = &mut self.scene;
        let control = ctx.render(|view, format| {
            renderer.gpu_mut().set_target(view.clone(), format);
            renderer.gpu_mut().clear(scene.clear_color());
            renderer.begin(scene.camera());
            scene.draw(renderer);
            renderer.end();
            renderer.gpu_mut().release_target();
        });
        scene.after_frame(renderer.stats());
        control
    }

    fn on_exit(&mut self) {
        if let Some(mut renderer) = self.renderer.take() {
            self.scene.teardown(&mut renderer);
        }
    }
}
