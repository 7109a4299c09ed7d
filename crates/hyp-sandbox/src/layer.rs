use std::time::Duration;

use anyhow::{Context, Result};
use nalgebra::{Matrix4, Vector2, Vector3};
use rand::SeedableRng;
use rand::rngs::StdRng;

use hyp_engine::coords::{Color, Viewport};
use hyp_engine::core::{App, AppControl, FrameCtx};
use hyp_engine::input::{Key, MouseButton};
use hyp_engine::render::{
    Light, OrthographicCamera, RenderDevice, Renderer2D, RendererConfig, TextureFilter,
    WgpuDevice, WgpuDeviceConfig,
};
use hyp_engine::time::Interval;

use crate::board::Board;
use crate::config::GameConfig;

const CURSOR_COLOR: Color = Color::new(1.0, 0.8, 0.2, 0.9);
const LIGHT_COLOR: Color = Color::new(1.0, 0.9, 0.7, 1.0);

/// Game of Life demo layer.
pub struct GameLayer {
    config: GameConfig,
    board: Board,
    rng: StdRng,
    camera: OrthographicCamera,

    step: Interval,
    stats_timer: Interval,
    lighting: bool,

    renderer: Option<Renderer2D<WgpuDevice>>,
}

impl GameLayer {
    pub fn new(config: GameConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut board = Board::new(config.rows, config.cols);
        board.randomize(&mut rng, config.density);
        log::info!(
            "board {}x{} seeded, {} cells alive",
            config.rows,
            config.cols,
            board.population()
        );

        Self {
            camera: OrthographicCamera::new(Viewport::new(config.world_width, config.world_height)),
            step: Interval::new(config.step_interval),
            stats_timer: Interval::new(Duration::from_secs(1)),
            lighting: false,
            renderer: None,
            board,
            rng,
            config,
        }
    }

    fn create_renderer(device: &wgpu::Device) -> Result<Renderer2D<WgpuDevice>> {
        let batch = RendererConfig::default();
        let device = WgpuDevice::new(
            device,
            WgpuDeviceConfig { filter: TextureFilter::Nearest, ..WgpuDeviceConfig::default() },
            &batch,
        )
        .context("failed to create render device")?;
        Renderer2D::new(device, batch).context("failed to create 2D renderer")
    }

    /// Pointer position mapped from window space into board world space.
    fn pointer_world(&self, ctx: &FrameCtx<'_, '_>) -> Option<Vector2<f32>> {
        let (px, py) = ctx.input.pointer_pos?;
        let (w, h) = ctx.window.logical_size();
        if w <= 0.0 || h <= 0.0 {
            return None;
        }
        let visible = self.camera.visible_size();
        Some(self.camera.screen_to_world(px * visible.x / w, py * visible.y / h))
    }

    fn handle_input(&mut self, ctx: &FrameCtx<'_, '_>) -> AppControl {
        let frame = ctx.input_frame;

        if frame.key_pressed(Key::Escape) {
            return AppControl::Exit;
        }
        if frame.key_pressed(Key::Space) {
            let paused = self.step.toggle_paused();
            log::info!("simulation {}", if paused { "paused" } else { "resumed" });
        }
        if frame.key_pressed(Key::R) {
            self.board.randomize(&mut self.rng, self.config.density);
            self.step.reset();
            log::info!("board reseeded, {} cells alive", self.board.population());
        }
        if frame.key_pressed(Key::C) {
            self.board.clear();
            log::info!("board cleared");
        }
        if frame.key_pressed(Key::L) {
            self.lighting = !self.lighting;
            log::info!("lighting {}", if self.lighting { "on" } else { "off" });
        }
        if frame.button_pressed(MouseButton::Left) {
            let cell = self
                .pointer_world(ctx)
                .and_then(|p| self.config.cell_at(p.x, p.y));
            if let Some((row, col)) = cell {
                self.board.toggle(row, col);
            }
        }

        AppControl::Continue
    }

    fn advance(&mut self, ctx: &FrameCtx<'_, '_>) {
        let dt = Duration::from_secs_f32(ctx.time.dt);

        let generations = self.step.advance(dt);
        for _ in 0..generations {
            self.board.step();
        }
        if generations > 0 {
            ctx.window.set_title(&format!(
                "hyp sandbox | generation {} | population {}",
                self.board.generation(),
                self.board.population()
            ));
        }

        if self.stats_timer.advance(dt) > 0 {
            if let Some(renderer) = self.renderer.as_ref() {
                let stats = renderer.stats();
                log::debug!(
                    "renderer: {} draw calls, {} quads, {} lines, {} circles, {} vertices, {} indices",
                    stats.draw_calls,
                    stats.quad_count,
                    stats.line_count,
                    stats.circle_count,
                    stats.vertex_count(),
                    stats.index_count()
                );
            }
        }
    }
}

impl App for GameLayer {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.handle_input(ctx) == AppControl::Exit {
            return AppControl::Exit;
        }
        self.advance(ctx);

        if self.renderer.is_none() {
            match Self::create_renderer(ctx.gpu.device()) {
                Ok(renderer) => self.renderer = Some(renderer),
                Err(e) => {
                    log::error!("{e:#}");
                    return AppControl::Exit;
                }
            }
        }

        let pointer = self.pointer_world(ctx);
        let view_projection = self.camera.view_projection();
        let Self { renderer, board, config, lighting, .. } = self;
        let Some(renderer) = renderer.as_mut() else { return AppControl::Exit };

        ctx.render(config.clear_color, |rctx, target| {
            renderer.begin_scene(&view_projection);
            renderer.enable_lighting(*lighting);
            if *lighting {
                if let Some(p) = pointer {
                    renderer.add_light(Light::point(
                        [p.x, p.y, 0.0],
                        LIGHT_COLOR,
                        config.light_intensity,
                        config.light_radius,
                    ));
                }
            }

            draw_board(renderer, board, config);
            if let Some(p) = pointer {
                draw_cursor(renderer, config, p);
            }

            renderer.end_scene();
            renderer.device_mut().encode(rctx, target);
        })
    }

    fn on_exit(&mut self) {
        if let Some(renderer) = self.renderer.take() {
            let device = renderer.shutdown();
            log::debug!("render device released ({} draws pending)", device.pending_draws());
        }
    }
}

fn draw_board<D: RenderDevice>(renderer: &mut Renderer2D<D>, board: &Board, config: &GameConfig) {
    let size = Vector2::new(config.cell_width(), config.cell_height());

    for (row, col, alive) in board.cells() {
        let position = Vector3::new(col as f32 * size.x, row as f32 * size.y, 0.0);
        let color = if alive { config.alive_color } else { config.dead_color };
        renderer.draw_quad(position, size, color);
    }

    if !config.show_grid {
        return;
    }
    for col in 0..=board.cols() {
        let x = col as f32 * size.x;
        renderer.draw_line(
            Vector3::new(x, 0.0, 0.0),
            Vector3::new(x, config.world_height, 0.0),
            config.grid_color,
        );
    }
    for row in 0..=board.rows() {
        let y = row as f32 * size.y;
        renderer.draw_line(
            Vector3::new(0.0, y, 0.0),
            Vector3::new(config.world_width, y, 0.0),
            config.grid_color,
        );
    }
}

/// Ring around the hovered cell plus its outline.
fn draw_cursor<D: RenderDevice>(renderer: &mut Renderer2D<D>, config: &GameConfig, pointer: Vector2<f32>) {
    let Some((row, col)) = config.cell_at(pointer.x, pointer.y) else { return };

    let size = Vector2::new(config.cell_width(), config.cell_height());
    let min = Vector3::new(col as f32 * size.x, row as f32 * size.y, 0.0);
    renderer.draw_rect_outline(min, size, CURSOR_COLOR);

    let center = min + Vector3::new(size.x * 0.5, size.y * 0.5, 0.0);
    let diameter = size.x.max(size.y) * 1.8;
    let transform = Matrix4::new_translation(&center)
        * Matrix4::new_nonuniform_scaling(&Vector3::new(diameter, diameter, 1.0));
    renderer.draw_circle(&transform, 0.15, 0.02, CURSOR_COLOR);
}
