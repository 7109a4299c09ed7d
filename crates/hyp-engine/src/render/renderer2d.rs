use anyhow::{Context, Result};
use nalgebra::{Matrix4, Vector2, Vector3};

use crate::coords::Color;

use super::batch::{CircleBatch, LineBatch, QuadBatch};
use super::config::RendererConfig;
use super::device::{QuadSubmission, RenderDevice, TextureId, TextureSpec};
use super::lighting::{Light, LightBuffer};
use super::stats::Stats;
use super::texture_slots::{SlotsExhausted, TextureSlots};
use super::vertex::quad_indices;

const DEFAULT_CIRCLE_FADE: f32 = 0.005;
const MIN_CIRCLE_FADE: f32 = 1e-4;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum SceneState {
    Idle,
    Recording,
}

/// Batched 2D renderer.
///
/// Frame protocol:
/// 1. [`begin_scene`](Self::begin_scene) resets every batch, the texture table,
///    the light list and the stats, and uploads the camera.
/// 2. `draw_*` calls append to the batch of their primitive kind.
/// 3. [`end_scene`](Self::end_scene) flushes every non-empty batch.
///
/// # Rollover
///
/// Every draw call checks capacity *before* appending. When its batch is
/// full, that batch alone is flushed and cleared; other primitive kinds keep
/// accumulating. A textured quad that finds the texture table full rolls the
/// quad batch over the same way, then binds into the fresh table. Capacity is
/// therefore unbounded from the caller's point of view.
pub struct Renderer2D<D: RenderDevice> {
    device: D,
    config: RendererConfig,

    quads: QuadBatch,
    circles: CircleBatch,
    lines: LineBatch,
    textures: TextureSlots,
    lighting: LightBuffer,
    lights_dirty: bool,

    stats: Stats,
    scene: SceneState,
}

impl<D: RenderDevice> Renderer2D<D> {
    /// Initializes the renderer on `device`.
    ///
    /// Uploads the shared index pattern and the 1×1 white texture that
    /// occupies slot 0. The texture-slot count is clamped to the device limit.
    pub fn new(mut device: D, config: RendererConfig) -> Result<Self> {
        anyhow::ensure!(config.max_quads > 0, "max_quads must be non-zero");
        anyhow::ensure!(config.max_circles > 0, "max_circles must be non-zero");
        anyhow::ensure!(config.max_line_vertices >= 2, "max_line_vertices must hold one segment");

        let slots = config.max_texture_slots.min(device.max_texture_slots());
        anyhow::ensure!(
            slots >= 2,
            "device exposes {} texture slot(s); the renderer needs at least 2",
            slots
        );

        let white = device
            .create_texture(
                &TextureSpec::new(1, 1).with_label("hyp white texture"),
                &[0xff; 4],
            )
            .context("failed to create default white texture")?;

        device.set_quad_indices(&quad_indices(config.max_quads.max(config.max_circles)));

        let config = RendererConfig {
            max_texture_slots: slots,
            max_line_vertices: config.max_line_vertices & !1,
            ..config
        };

        log::info!(
            "2D renderer initialized: {} quads/{} circles/{} line vertices per batch, {} texture slots, {} lights",
            config.max_quads,
            config.max_circles,
            config.max_line_vertices,
            config.max_texture_slots,
            config.max_lights
        );

        Ok(Self {
            quads: QuadBatch::with_capacity(config.max_quads),
            circles: CircleBatch::with_capacity(config.max_circles),
            lines: LineBatch::with_capacity(config.max_line_vertices),
            textures: TextureSlots::new(white, slots),
            lighting: LightBuffer::new(config.max_lights),
            lights_dirty: true,
            stats: Stats::default(),
            scene: SceneState::Idle,
            device,
            config,
        })
    }

    /// Releases CPU batch storage and hands the device back to its owner.
    pub fn shutdown(self) -> D {
        if self.scene == SceneState::Recording {
            log::warn!("2D renderer shut down with an open scene; pending draws discarded");
        }
        log::info!("2D renderer destroyed");
        self.device
    }

    // ── scene ─────────────────────────────────────────────────────────────

    /// Starts a scene. Must precede any draw call of the frame.
    pub fn begin_scene(&mut self, view_projection: &Matrix4<f32>) {
        if self.scene == SceneState::Recording {
            log::debug!("begin_scene with an open scene; discarding unflushed draws");
        }

        self.reset_batches();
        self.lighting.clear();
        self.lights_dirty = true;
        self.stats = Stats::default();

        self.device.set_camera(view_projection);
        self.scene = SceneState::Recording;
    }

    /// Flushes the scene. A second call without a new `begin_scene` is a no-op.
    pub fn end_scene(&mut self) {
        if self.scene == SceneState::Idle {
            return;
        }
        self.flush();
        self.scene = SceneState::Idle;
    }

    /// Submits every non-empty batch. Does not reset them.
    pub fn flush(&mut self) {
        self.flush_quads();
        self.flush_circles();
        self.flush_lines();
    }

    /// Flushes every batch, then resets all of them and the texture table.
    pub fn next_batch(&mut self) {
        self.flush();
        self.reset_batches();
    }

    // ── quads ─────────────────────────────────────────────────────────────

    /// Axis-aligned quad whose min corner is `position`.
    pub fn draw_quad(&mut self, position: Vector3<f32>, size: Vector2<f32>, color: Color) {
        self.draw_quad_transformed(&quad_transform(position, size), color);
    }

    /// Axis-aligned textured quad; `tint` multiplies the sampled texel.
    pub fn draw_textured_quad(
        &mut self,
        position: Vector3<f32>,
        size: Vector2<f32>,
        texture: TextureId,
        tint: Color,
    ) {
        self.draw_textured_quad_transformed(&quad_transform(position, size), texture, tint);
    }

    /// Flat-color quad: the unit quad under `transform`, sampling slot 0.
    pub fn draw_quad_transformed(&mut self, transform: &Matrix4<f32>, color: Color) {
        self.debug_assert_recording();
        self.ensure_quad_capacity();
        self.quads.push(transform, color, 0);
    }

    pub fn draw_textured_quad_transformed(
        &mut self,
        transform: &Matrix4<f32>,
        texture: TextureId,
        tint: Color,
    ) {
        self.debug_assert_recording();
        self.ensure_quad_capacity();
        let slot = self.texture_slot(texture);
        self.quads.push(transform, tint, slot);
    }

    // ── lines ─────────────────────────────────────────────────────────────

    pub fn draw_line(&mut self, p1: Vector3<f32>, p2: Vector3<f32>, color: Color) {
        self.debug_assert_recording();
        if self.lines.vertex_count() + 2 > self.config.max_line_vertices {
            log::debug!("line batch full ({} vertices); rolling over", self.lines.vertex_count());
            self.flush_lines();
            self.lines.clear();
        }
        self.lines.push([p1.x, p1.y, p1.z], [p2.x, p2.y, p2.z], color);
    }

    /// Outline of the axis-aligned rectangle with min corner `position`.
    pub fn draw_rect_outline(&mut self, position: Vector3<f32>, size: Vector2<f32>, color: Color) {
        let p0 = position;
        let p1 = position + Vector3::new(size.x, 0.0, 0.0);
        let p2 = position + Vector3::new(size.x, size.y, 0.0);
        let p3 = position + Vector3::new(0.0, size.y, 0.0);

        self.draw_line(p0, p1, color);
        self.draw_line(p1, p2, color);
        self.draw_line(p2, p3, color);
        self.draw_line(p3, p0, color);
    }

    // ── circles ───────────────────────────────────────────────────────────

    /// Circle inscribed in the unit quad under `transform`.
    ///
    /// `thickness` is the ring width as a fraction of the radius (`1.0` fills
    /// the disc); `fade` softens the edges.
    pub fn draw_circle(&mut self, transform: &Matrix4<f32>, thickness: f32, fade: f32, color: Color) {
        self.debug_assert_recording();
        if self.circles.len() >= self.config.max_circles {
            log::debug!("circle batch full ({} circles); rolling over", self.circles.len());
            self.flush_circles();
            self.circles.clear();
        }
        self.circles.push(transform, color, thickness.clamp(0.0, 1.0), fade.max(MIN_CIRCLE_FADE));
    }

    /// Filled disc centred on `center`.
    pub fn draw_filled_circle(&mut self, center: Vector3<f32>, radius: f32, color: Color) {
        let diameter = radius * 2.0;
        let transform = Matrix4::new_translation(&center)
            * Matrix4::new_nonuniform_scaling(&Vector3::new(diameter, diameter, 1.0));
        self.draw_circle(&transform, 1.0, DEFAULT_CIRCLE_FADE, color);
    }

    // ── lighting ──────────────────────────────────────────────────────────

    pub fn enable_lighting(&mut self, enabled: bool) {
        if self.lighting.enabled() != enabled {
            self.lighting.set_enabled(enabled);
            self.lights_dirty = true;
        }
    }

    /// Queues `light` for this scene. Lights past the cap are dropped and
    /// counted in [`Stats::dropped_lights`].
    pub fn add_light(&mut self, light: Light) {
        if self.lighting.push(light) {
            self.lights_dirty = true;
            return;
        }
        if self.stats.dropped_lights == 0 {
            log::warn!("light list full ({} lights); dropping extra lights", self.lighting.capacity());
        }
        self.stats.dropped_lights = self.lighting.dropped();
    }

    #[inline]
    pub fn lights(&self) -> &[Light] {
        self.lighting.lights()
    }

    #[inline]
    pub fn lighting_enabled(&self) -> bool {
        self.lighting.enabled()
    }

    // ── resources + accessors ─────────────────────────────────────────────

    pub fn create_texture(&mut self, spec: &TextureSpec, rgba: &[u8]) -> Result<TextureId> {
        self.device.create_texture(spec, rgba)
    }

    /// The default texture bound to slot 0.
    #[inline]
    pub fn white_texture(&self) -> TextureId {
        self.textures.white()
    }

    /// Textures bound for the current quad batch, in slot order.
    #[inline]
    pub fn bound_textures(&self) -> &[TextureId] {
        self.textures.bound()
    }

    #[inline]
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Effective limits (texture slots clamped to the device).
    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    // ── private helpers ───────────────────────────────────────────────────

    #[inline]
    fn debug_assert_recording(&self) {
        debug_assert!(
            self.scene == SceneState::Recording,
            "draw call outside begin_scene/end_scene"
        );
    }

    fn ensure_quad_capacity(&mut self) {
        if self.quads.len() >= self.config.max_quads {
            log::debug!("quad batch full ({} quads); rolling over", self.quads.len());
            self.roll_over_quads();
        }
    }

    fn texture_slot(&mut self, texture: TextureId) -> u32 {
        match self.textures.resolve_or_assign(texture) {
            Ok(slot) => slot,
            Err(SlotsExhausted) => {
                log::debug!(
                    "texture slots exhausted ({}/{} bound); rolling over quad batch",
                    self.textures.occupied(),
                    self.textures.capacity()
                );
                self.roll_over_quads();
                // A reset table has capacity - 1 >= 1 free slots.
                self.textures.resolve_or_assign(texture).unwrap_or(0)
            }
        }
    }

    fn roll_over_quads(&mut self) {
        self.flush_quads();
        self.quads.clear();
        self.textures.reset();
    }

    fn reset_batches(&mut self) {
        self.quads.clear();
        self.circles.clear();
        self.lines.clear();
        self.textures.reset();
    }

    fn upload_lights(&mut self) {
        if !self.lights_dirty {
            return;
        }
        let lights = if self.lighting.enabled() { self.lighting.lights() } else { &[] };
        self.device.set_lights(lights, self.lighting.active_count());
        self.lights_dirty = false;
    }

    fn flush_quads(&mut self) {
        if self.quads.is_empty() {
            return;
        }
        self.upload_lights();

        self.device.draw_quads(QuadSubmission {
            vertices: self.quads.vertices(),
            transforms: self.quads.transforms(),
            textures: self.textures.bound(),
            index_count: self.quads.index_count(),
        });

        self.stats.quad_count += self.quads.len() as u32;
        self.stats.draw_calls += 1;
    }

    fn flush_circles(&mut self) {
        if self.circles.is_empty() {
            return;
        }
        self.device.draw_circles(self.circles.vertices(), self.circles.index_count());

        self.stats.circle_count += self.circles.len() as u32;
        self.stats.draw_calls += 1;
    }

    fn flush_lines(&mut self) {
        if self.lines.is_empty() {
            return;
        }
        self.device.draw_lines(self.lines.vertices());

        self.stats.line_count += (self.lines.vertex_count() / 2) as u32;
        self.stats.draw_calls += 1;
    }
}

/// Unit quad scaled to `size` and translated so its min corner sits at `position`.
pub fn quad_transform(position: Vector3<f32>, size: Vector2<f32>) -> Matrix4<f32> {
    let center = position + Vector3::new(size.x * 0.5, size.y * 0.5, 0.0);
    Matrix4::new_translation(&center) * Matrix4::new_nonuniform_scaling(&Vector3::new(size.x, size.y, 1.0))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::super::testing::{DeviceCall, RecordingDevice};
    use super::*;

    fn renderer() -> Renderer2D<RecordingDevice> {
        Renderer2D::new(RecordingDevice::new(32), RendererConfig::default()).unwrap()
    }

    fn begin(r: &mut Renderer2D<RecordingDevice>) {
        r.begin_scene(&Matrix4::identity());
        r.device_mut().clear_calls();
    }

    fn origin() -> Vector3<f32> {
        Vector3::zeros()
    }

    fn unit() -> Vector2<f32> {
        Vector2::new(1.0, 1.0)
    }

    fn textures(r: &mut Renderer2D<RecordingDevice>, n: usize) -> Vec<TextureId> {
        (0..n)
            .map(|_| r.create_texture(&TextureSpec::new(1, 1), &[0; 4]).unwrap())
            .collect()
    }

    // ── init ──────────────────────────────────────────────────────────────

    #[test]
    fn init_uploads_white_texture_and_index_pattern() {
        let r = renderer();
        let dev = r.device();
        assert_eq!(
            dev.calls[0],
            DeviceCall::CreateTexture { id: r.white_texture(), width: 1, height: 1 }
        );
        assert_eq!(dev.quad_indices.len(), 6000);
        assert_eq!(&dev.quad_indices[6..12], &[4, 5, 6, 6, 7, 4]);
        assert_eq!(r.bound_textures(), &[r.white_texture()]);
    }

    #[test]
    fn init_clamps_texture_slots_to_device() {
        let r = Renderer2D::new(RecordingDevice::new(8), RendererConfig::default()).unwrap();
        assert_eq!(r.config().max_texture_slots, 8);
    }

    #[test]
    fn init_rejects_device_without_spare_slot() {
        assert!(Renderer2D::new(RecordingDevice::new(1), RendererConfig::default()).is_err());
    }

    #[test]
    fn init_rounds_line_capacity_to_pairs() {
        let config = RendererConfig { max_line_vertices: 7, ..RendererConfig::default() };
        let r = Renderer2D::new(RecordingDevice::new(32), config).unwrap();
        assert_eq!(r.config().max_line_vertices, 6);
    }

    // ── scene ─────────────────────────────────────────────────────────────

    #[test]
    fn begin_scene_uploads_camera_and_resets_stats() {
        let mut r = renderer();
        r.begin_scene(&Matrix4::identity());
        r.draw_quad(origin(), unit(), Color::WHITE);
        r.end_scene();
        assert_eq!(r.stats().draw_calls, 1);

        let vp = Matrix4::new_scaling(2.0);
        r.begin_scene(&vp);
        assert_eq!(r.stats(), Stats::default());
        assert!(matches!(r.device().calls.last(), Some(DeviceCall::SetCamera(m)) if m[0][0] == 2.0));
    }

    #[test]
    fn empty_scene_issues_no_draw_calls() {
        let mut r = renderer();
        begin(&mut r);
        r.end_scene();
        assert_eq!(r.device().draw_calls(), 0);
        assert_eq!(r.stats(), Stats::default());
    }

    #[test]
    fn second_end_scene_is_a_no_op() {
        let mut r = renderer();
        begin(&mut r);
        r.draw_quad(origin(), unit(), Color::WHITE);
        r.draw_line(origin(), Vector3::new(1.0, 0.0, 0.0), Color::WHITE);
        r.end_scene();
        let after_first = r.device().draw_calls();
        r.end_scene();
        assert_eq!(after_first, 2);
        assert_eq!(r.device().draw_calls(), after_first);
        assert_eq!(r.stats().draw_calls, 2);
    }

    #[test]
    fn one_draw_call_per_primitive_kind() {
        let mut r = renderer();
        begin(&mut r);
        for i in 0..10 {
            let p = Vector3::new(i as f32, 0.0, 0.0);
            r.draw_quad(p, unit(), Color::WHITE);
            r.draw_filled_circle(p, 1.0, Color::WHITE);
            r.draw_line(p, p + Vector3::new(0.0, 1.0, 0.0), Color::WHITE);
        }
        r.end_scene();

        let stats = r.stats();
        assert_eq!(stats.draw_calls, 3);
        assert_eq!(stats.quad_count, 10);
        assert_eq!(stats.circle_count, 10);
        assert_eq!(stats.line_count, 10);
    }

    #[test]
    fn quads_flush_before_circles_and_lines() {
        let mut r = renderer();
        begin(&mut r);
        r.draw_line(origin(), Vector3::new(1.0, 0.0, 0.0), Color::WHITE);
        r.draw_filled_circle(origin(), 1.0, Color::WHITE);
        r.draw_quad(origin(), unit(), Color::WHITE);
        r.end_scene();

        let kinds: Vec<_> = r
            .device()
            .calls
            .iter()
            .filter_map(|c| match c {
                DeviceCall::DrawQuads { .. } => Some("quads"),
                DeviceCall::DrawCircles { .. } => Some("circles"),
                DeviceCall::DrawLines { .. } => Some("lines"),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, ["quads", "circles", "lines"]);
    }

    // ── quad geometry ─────────────────────────────────────────────────────

    #[test]
    fn draw_quad_places_min_corner_at_position() {
        let mut r = renderer();
        begin(&mut r);
        r.draw_quad(Vector3::new(10.0, 20.0, 0.0), Vector2::new(4.0, 6.0), Color::WHITE);
        r.end_scene();

        let t = r.device().last_transforms[0];
        // Column 3 holds the translation to the quad centre.
        assert_relative_eq!(t[3][0], 12.0);
        assert_relative_eq!(t[3][1], 23.0);
        assert_relative_eq!(t[0][0], 4.0);
        assert_relative_eq!(t[1][1], 6.0);
    }

    #[test]
    fn cell_grid_colors_follow_draw_order() {
        // A board drawn cell by cell produces one colored quad per cell in order.
        let mut r = renderer();
        begin(&mut r);
        let pattern = [true, false, false, true, true, false];
        for (i, alive) in pattern.iter().enumerate() {
            let color = if *alive { Color::WHITE } else { Color::BLACK };
            r.draw_quad(Vector3::new(i as f32 * 12.0, 0.0, 0.0), Vector2::new(12.0, 12.0), color);
        }
        r.end_scene();

        let verts = &r.device().last_quad_vertices;
        assert_eq!(verts.len(), pattern.len() * 4);
        for (i, alive) in pattern.iter().enumerate() {
            let expected = (if *alive { Color::WHITE } else { Color::BLACK }).to_array();
            assert!(verts[i * 4..i * 4 + 4].iter().all(|v| v.color == expected));
            assert!(verts[i * 4..i * 4 + 4].iter().all(|v| v.transform_index == i as u32));
        }
    }

    // ── rollover ──────────────────────────────────────────────────────────

    #[test]
    fn quad_overflow_rolls_over_once() {
        let mut r = renderer();
        begin(&mut r);
        for _ in 0..=r.config().max_quads {
            r.draw_quad(origin(), unit(), Color::WHITE);
        }
        r.end_scene();

        let draws = r.device().quad_draws();
        assert_eq!(draws.len(), 2);
        assert!(matches!(draws[0], DeviceCall::DrawQuads { quads: 1000, index_count: 6000, .. }));
        assert!(matches!(draws[1], DeviceCall::DrawQuads { quads: 1, index_count: 6, .. }));
        assert_eq!(r.stats().quad_count, 1001);
    }

    #[test]
    fn exactly_full_quad_batch_does_not_roll_over() {
        let mut r = renderer();
        begin(&mut r);
        for _ in 0..r.config().max_quads {
            r.draw_quad(origin(), unit(), Color::WHITE);
        }
        assert_eq!(r.device().draw_calls(), 0);
        r.end_scene();
        assert_eq!(r.device().quad_draws().len(), 1);
    }

    #[test]
    fn quad_rollover_leaves_other_batches_alone() {
        let mut r = renderer();
        begin(&mut r);
        r.draw_line(origin(), Vector3::new(1.0, 0.0, 0.0), Color::WHITE);
        r.draw_filled_circle(origin(), 1.0, Color::WHITE);
        for _ in 0..=r.config().max_quads {
            r.draw_quad(origin(), unit(), Color::WHITE);
        }
        // Only the quad batch has been flushed so far.
        assert_eq!(r.device().quad_draws().len(), 1);
        assert_eq!(r.device().circle_draws(), 0);
        assert_eq!(r.device().line_draws(), 0);

        r.end_scene();
        assert_eq!(r.device().circle_draws(), 1);
        assert_eq!(r.device().line_draws(), 1);
    }

    #[test]
    fn line_overflow_rolls_over_lines_only() {
        let config = RendererConfig { max_line_vertices: 4, ..RendererConfig::default() };
        let mut r = Renderer2D::new(RecordingDevice::new(32), config).unwrap();
        begin(&mut r);
        r.draw_quad(origin(), unit(), Color::WHITE);
        for _ in 0..3 {
            r.draw_line(origin(), Vector3::new(1.0, 0.0, 0.0), Color::WHITE);
        }
        assert_eq!(r.device().line_draws(), 1);
        assert_eq!(r.device().quad_draws().len(), 0);
        assert!(r.device().calls.contains(&DeviceCall::DrawLines { vertices: 4 }));

        r.end_scene();
        assert_eq!(r.device().line_draws(), 2);
        assert_eq!(r.stats().line_count, 3);
    }

    #[test]
    fn circle_overflow_rolls_over() {
        let config = RendererConfig { max_circles: 2, ..RendererConfig::default() };
        let mut r = Renderer2D::new(RecordingDevice::new(32), config).unwrap();
        begin(&mut r);
        for _ in 0..5 {
            r.draw_filled_circle(origin(), 1.0, Color::WHITE);
        }
        r.end_scene();
        assert_eq!(r.device().circle_draws(), 3);
        assert_eq!(r.stats().circle_count, 5);
        assert!(r
            .device()
            .calls
            .contains(&DeviceCall::DrawCircles { circles: 2, index_count: 12 }));
    }

    #[test]
    fn next_batch_flushes_and_resets_everything() {
        let mut r = renderer();
        let tex = textures(&mut r, 1)[0];
        begin(&mut r);
        r.draw_textured_quad(origin(), unit(), tex, Color::WHITE);
        r.draw_line(origin(), Vector3::new(1.0, 0.0, 0.0), Color::WHITE);
        r.next_batch();
        assert_eq!(r.device().draw_calls(), 2);
        assert_eq!(r.bound_textures(), &[r.white_texture()]);

        r.end_scene();
        assert_eq!(r.device().draw_calls(), 2);
        assert_eq!(r.stats().quad_count, 1);
    }

    // ── textures ──────────────────────────────────────────────────────────

    #[test]
    fn flat_quads_sample_the_white_slot() {
        let mut r = renderer();
        begin(&mut r);
        r.draw_quad(origin(), unit(), Color::WHITE);
        r.end_scene();
        assert!(r.device().last_quad_vertices.iter().all(|v| v.texture_slot == 0));
    }

    #[test]
    fn same_texture_reuses_one_slot() {
        let mut r = renderer();
        let tex = textures(&mut r, 1)[0];
        begin(&mut r);
        for _ in 0..r.config().max_texture_slots * 2 {
            r.draw_textured_quad(origin(), unit(), tex, Color::WHITE);
        }
        assert_eq!(r.bound_textures(), &[r.white_texture(), tex]);
        r.end_scene();

        let draws = r.device().quad_draws();
        assert_eq!(draws.len(), 1);
        assert!(matches!(draws[0], DeviceCall::DrawQuads { textures, .. } if textures.len() == 2));
        assert!(r.device().last_quad_vertices.iter().all(|v| v.texture_slot == 1));
    }

    #[test]
    fn texture_exhaustion_flushes_once_then_accepts() {
        let mut r = renderer();
        let slots = r.config().max_texture_slots;
        let texs = textures(&mut r, slots + 1);
        begin(&mut r);

        // slots - 1 user textures fill the table next to the white slot.
        for &t in &texs[..slots - 1] {
            r.draw_textured_quad(origin(), unit(), t, Color::WHITE);
        }
        assert_eq!(r.device().quad_draws().len(), 0);
        assert_eq!(r.bound_textures().len(), slots);

        r.draw_textured_quad(origin(), unit(), texs[slots - 1], Color::WHITE);
        assert_eq!(r.device().quad_draws().len(), 1);
        assert_eq!(r.bound_textures(), &[r.white_texture(), texs[slots - 1]]);

        r.draw_textured_quad(origin(), unit(), texs[slots], Color::WHITE);
        assert_eq!(r.device().quad_draws().len(), 1);

        r.end_scene();
        let draws = r.device().quad_draws();
        assert_eq!(draws.len(), 2);
        assert!(matches!(draws[0], DeviceCall::DrawQuads { quads, textures, .. }
            if *quads == slots - 1 && textures.len() == slots));
        assert!(matches!(draws[1], DeviceCall::DrawQuads { quads: 2, textures, .. }
            if textures.len() == 3));
        // The accepted texture sits in slot 1 of the fresh batch.
        assert_eq!(r.device().last_quad_vertices[0].texture_slot, 1);
    }

    #[test]
    fn quad_rollover_resets_texture_table() {
        let config = RendererConfig { max_quads: 2, ..RendererConfig::default() };
        let mut r = Renderer2D::new(RecordingDevice::new(32), config).unwrap();
        let texs = textures(&mut r, 2);
        begin(&mut r);
        r.draw_textured_quad(origin(), unit(), texs[0], Color::WHITE);
        r.draw_textured_quad(origin(), unit(), texs[1], Color::WHITE);
        r.draw_quad(origin(), unit(), Color::WHITE);
        assert_eq!(r.bound_textures(), &[r.white_texture()]);
    }

    // ── lighting ──────────────────────────────────────────────────────────

    fn light(x: f32) -> Light {
        Light::point([x, 0.0, 0.0], Color::WHITE, 1.0, 50.0)
    }

    #[test]
    fn light_cap_retains_first_lights() {
        let mut r = renderer();
        begin(&mut r);
        for i in 0..40 {
            r.add_light(light(i as f32));
        }
        assert_eq!(r.lights().len(), 32);
        assert_eq!(r.stats().dropped_lights, 8);
    }

    #[test]
    fn lights_upload_once_when_enabled() {
        let mut r = renderer();
        r.enable_lighting(true);
        begin(&mut r);
        r.add_light(light(0.0));
        r.add_light(light(1.0));
        r.draw_quad(origin(), unit(), Color::WHITE);
        r.next_batch();
        r.draw_quad(origin(), unit(), Color::WHITE);
        r.end_scene();

        let uploads: Vec<_> = r
            .device()
            .calls
            .iter()
            .filter(|c| matches!(c, DeviceCall::SetLights { .. }))
            .collect();
        assert_eq!(uploads, [&DeviceCall::SetLights { uploaded: 2, active: 2 }]);
        assert_eq!(r.device().last_lights.len(), 2);
    }

    #[test]
    fn disabled_lighting_reports_zero_active() {
        let mut r = renderer();
        begin(&mut r);
        r.add_light(light(0.0));
        r.draw_quad(origin(), unit(), Color::WHITE);
        r.end_scene();
        assert!(r.device().calls.contains(&DeviceCall::SetLights { uploaded: 0, active: 0 }));
    }

    #[test]
    fn begin_scene_clears_lights_but_keeps_toggle() {
        let mut r = renderer();
        r.enable_lighting(true);
        begin(&mut r);
        r.add_light(light(0.0));
        r.end_scene();
        begin(&mut r);
        assert!(r.lights().is_empty());
        assert!(r.lighting_enabled());
    }

    #[test]
    fn shutdown_returns_device() {
        let r = renderer();
        let dev = r.shutdown();
        assert_eq!(dev.max_slots, 32);
    }
}
