use anyhow::Result;
use nalgebra::Matrix4;

use super::lighting::Light;
use super::vertex::{CircleVertex, LineVertex, QuadVertex};

/// Stable identity of a texture owned by a [`RenderDevice`].
///
/// Two handles refer to the same texture iff their ids are equal; contents are
/// never compared.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Description of an RGBA8 texture to create.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSpec {
    pub width: u32,
    pub height: u32,
    pub label: Option<String>,
}

impl TextureSpec {
    #[inline]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, label: None }
    }

    #[inline]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Byte length of a tightly packed RGBA8 upload for this spec.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// One flushed quad batch.
///
/// `textures[i]` is the texture bound to sampler slot `i`; slot 0 is always
/// the default white texture.
#[derive(Debug, Copy, Clone)]
pub struct QuadSubmission<'a> {
    pub vertices: &'a [QuadVertex],
    pub transforms: &'a [[[f32; 4]; 4]],
    pub textures: &'a [TextureId],
    pub index_count: u32,
}

/// Capabilities the batched renderer needs from the graphics device.
///
/// Every `draw_*` call is exactly one device draw call. Implementations own
/// all device objects; the renderer only holds [`TextureId`]s.
pub trait RenderDevice {
    /// Number of textures a single quad draw may bind.
    fn max_texture_slots(&self) -> usize;

    /// Creates a texture and uploads `rgba` (tightly packed RGBA8).
    fn create_texture(&mut self, spec: &TextureSpec, rgba: &[u8]) -> Result<TextureId>;

    /// Uploads the shared quad/circle index pattern. Called once at init.
    fn set_quad_indices(&mut self, indices: &[u32]);

    /// Uploads the camera block.
    fn set_camera(&mut self, view_projection: &Matrix4<f32>);

    /// Uploads the light block and tells the quad shader how many are active.
    fn set_lights(&mut self, lights: &[Light], active: u32);

    fn draw_quads(&mut self, batch: QuadSubmission<'_>);

    fn draw_circles(&mut self, vertices: &[CircleVertex], index_count: u32);

    fn draw_lines(&mut self, vertices: &[LineVertex]);
}
