/// Renderer counters accumulated since the last `begin_scene`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Stats {
    /// Device draw calls issued (one per non-empty primitive flush).
    pub draw_calls: u32,
    pub quad_count: u32,
    pub line_count: u32,
    pub circle_count: u32,
    /// Lights rejected because the light list was full.
    pub dropped_lights: u32,
}

impl Stats {
    /// Vertices submitted for the counted primitives.
    pub fn vertex_count(&self) -> u32 {
        self.quad_count * 4 + self.circle_count * 4 + self.line_count * 2
    }

    /// Indices submitted for quads and circles.
    pub fn index_count(&self) -> u32 {
        (self.quad_count + self.circle_count) * 6
    }
}
