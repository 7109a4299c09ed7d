/// Batch limits for [`Renderer2D`](super::Renderer2D).
///
/// Capacities are per batch; a scene may draw any number of primitives and
/// the renderer rolls over to a new batch when a limit is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    /// Quad instances per draw call.
    pub max_quads: usize,

    /// Circle instances per draw call.
    pub max_circles: usize,

    /// Line vertices per draw call (two per segment). Rounded down to even.
    pub max_line_vertices: usize,

    /// Requested sampler slots per quad draw, including the reserved white slot.
    ///
    /// Clamped to the device limit at init.
    pub max_texture_slots: usize,

    /// Lights retained per scene; excess lights are dropped and counted.
    pub max_lights: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        let max_quads = 1000;
        Self {
            max_quads,
            max_circles: max_quads,
            max_line_vertices: max_quads * 4,
            max_texture_slots: 32,
            max_lights: 32,
        }
    }
}
