//! Game of Life on the hyp 2D renderer.
//!
//! Controls: Space pause, R reseed, C clear, L lighting, left click toggles
//! a cell, Escape exits.

mod board;
mod config;
mod layer;

use anyhow::Result;
use winit::dpi::LogicalSize;

use hyp_engine::device::GpuInit;
use hyp_engine::logging::{init_logging, LoggingConfig};
use hyp_engine::window::{Runtime, RuntimeConfig};

use crate::config::GameConfig;
use crate::layer::GameLayer;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let game = GameConfig::default();
    let runtime = RuntimeConfig {
        title: "hyp sandbox".to_string(),
        initial_size: LogicalSize::new(game.world_width as f64, game.world_height as f64),
        resizable: true,
    };
    let gpu = GpuInit {
        texture_slots: 32,
        ..GpuInit::default()
    };

    Runtime::run(runtime, gpu, GameLayer::new(game))
}
