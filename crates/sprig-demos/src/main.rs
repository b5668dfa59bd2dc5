//! Demo runner for the sprig batch renderer.
//!
//! ```text
//! sprig-demos bunnymark
//! sprig-demos shapes --headless --frames 300
//! ```

mod app;
mod headless;
mod scenes;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use glam::Vec2;
use sprig_engine::device::GpuInit;
use sprig_engine::logging::{init_logging, LoggingConfig};
use sprig_engine::render::RendererConfig;
use sprig_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::LogicalSize;

use app::DemoApp;
use headless::run_headless;
use scenes::{Basic, BunnyMark, BunnyMarkConfig, Scene, Shapes};

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Demo {
    /// One red square.
    Basic,
    /// Every shape kind and a textured checkerboard.
    Shapes,
    /// Sprite stress test.
    Bunnymark,
}

#[derive(Debug, Parser)]
#[command(name = "sprig-demos", about = "Batched 2D renderer demos")]
struct Cli {
    #[arg(value_enum, default_value_t = Demo::Basic)]
    demo: Demo,

    /// Render into the recording backend instead of a window.
    #[arg(long)]
    headless: bool,

    /// Frames to run with --headless.
    #[arg(long, default_value_t = 120)]
    frames: u32,

    /// Quads per batch.
    #[arg(long, default_value_t = RendererConfig::default().max_quads)]
    max_quads: usize,

    /// Sprite image for bunnymark.
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Entity cap for bunnymark.
    #[arg(long)]
    max_bunnies: Option<usize>,

    /// Log filter, e.g. `debug` or `sprig_engine=trace`.
    #[arg(long)]
    log: Option<String>,
}

const WINDOW_SIZE: Vec2 = Vec2::new(640.0, 480.0);

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(match &cli.log {
        Some(filter) => LoggingConfig::with_filter(filter.clone()),
        None => LoggingConfig::default(),
    });

    let config = RendererConfig {
        max_quads: cli.max_quads,
    };
    config.validate()?;

    match cli.demo {
        Demo::Basic => run(&cli, Basic::new(), config),
        Demo::Shapes => run(&cli, Shapes::new(), config),
        Demo::Bunnymark => {
            let defaults = BunnyMarkConfig::default();
            let scene = BunnyMark::new(BunnyMarkConfig {
                texture: cli.texture.clone(),
                max_bunnies: cli.max_bunnies.unwrap_or(defaults.max_bunnies),
                ..defaults
            });
            run(&cli, scene, config)
        }
    }
}

fn run<S: Scene + 'static>(cli: &Cli, scene: S, config: RendererConfig) -> Result<()> {
    if cli.headless {
        run_headless(scene, config, cli.frames, WINDOW_SIZE)?;
        return Ok(());
    }

    let title = format!("sprig - {:?}", cli.demo).to_lowercase();
    let runtime_config = RuntimeConfig {
        title,
        initial_size: LogicalSize::new(f64::from(WINDOW_SIZE.x), f64::from(WINDOW_SIZE.y)),
        ..RuntimeConfig::default()
    };

    // Bunnymark measures throughput, so it must not wait on vsync.
    let gpu_init = if cli.demo == Demo::Bunnymark {
        GpuInit::unthrottled()
    } else {
        GpuInit::default()
    };

    Runtime::run(runtime_config, gpu_init, DemoApp::new(scene, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headless_bunnymark() {
        let cli = Cli::try_parse_from([
            "sprig-demos",
            "bunnymark",
            "--headless",
            "--frames",
            "10",
            "--max-bunnies",
            "200",
        ])
        .unwrap();
        assert_eq!(cli.demo, Demo::Bunnymark);
        assert!(cli.headless);
        assert_eq!(cli.frames, 10);
        assert_eq!(cli.max_bunnies, Some(200));
        assert_eq!(cli.max_quads, 10_000);
    }

    #[test]
    fn defaults_to_basic() {
        let cli = Cli::try_parse_from(["sprig-demos"]).unwrap();
        assert_eq!(cli.demo, Demo::Basic);
        assert!(!cli.headless);
    }

    #[test]
    fn rejects_unknown_demo() {
        assert!(Cli::try_parse_from(["sprig-demos", "tetris"]).is_err());
    }
}
