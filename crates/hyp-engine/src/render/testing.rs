//! In-memory [`RenderDevice`] that records every call.

use anyhow::Result;
use nalgebra::Matrix4;

use super::batch::mat4_columns;
use super::device::{QuadSubmission, RenderDevice, TextureId, TextureSpec};
use super::lighting::Light;
use super::vertex::{CircleVertex, LineVertex, QuadVertex};

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateTexture { id: TextureId, width: u32, height: u32 },
    SetQuadIndices { len: usize },
    SetCamera([[f32; 4]; 4]),
    SetLights { uploaded: usize, active: u32 },
    DrawQuads { quads: usize, index_count: u32, textures: Vec<TextureId> },
    DrawCircles { circles: usize, index_count: u32 },
    DrawLines { vertices: usize },
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    pub max_slots: usize,
    pub calls: Vec<DeviceCall>,
    pub quad_indices: Vec<u32>,
    pub last_quad_vertices: Vec<QuadVertex>,
    pub last_transforms: Vec<[[f32; 4]; 4]>,
    pub last_lights: Vec<Light>,
    next_texture: u32,
}

impl RecordingDevice {
    pub fn new(max_slots: usize) -> Self {
        Self { max_slots, ..Self::default() }
    }

    pub fn quad_draws(&self) -> Vec<&DeviceCall> {
        self.calls.iter().filter(|c| matches!(c, DeviceCall::DrawQuads { .. })).collect()
    }

    pub fn circle_draws(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, DeviceCall::DrawCircles { .. })).count()
    }

    pub fn line_draws(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, DeviceCall::DrawLines { .. })).count()
    }

    pub fn draw_calls(&self) -> usize {
        self.quad_draws().len() + self.circle_draws() + self.line_draws()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl RenderDevice for RecordingDevice {
    fn max_texture_slots(&self) -> usize {
        self.max_slots
    }

    fn create_texture(&mut self, spec: &TextureSpec, rgba: &[u8]) -> Result<TextureId> {
        anyhow::ensure!(rgba.len() == spec.byte_len(), "texture data size mismatch");
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.calls.push(DeviceCall::CreateTexture { id, width: spec.width, height: spec.height });
        Ok(id)
    }

    fn set_quad_indices(&mut self, indices: &[u32]) {
        self.quad_indices = indices.to_vec();
        self.calls.push(DeviceCall::SetQuadIndices { len: indices.len() });
    }

    fn set_camera(&mut self, view_projection: &Matrix4<f32>) {
        self.calls.push(DeviceCall::SetCamera(mat4_columns(view_projection)));
    }

    fn set_lights(&mut self, lights: &[Light], active: u32) {
        self.last_lights = lights.to_vec();
        self.calls.push(DeviceCall::SetLights { uploaded: lights.len(), active });
    }

    fn draw_quads(&mut self, batch: QuadSubmission<'_>) {
        self.last_quad_vertices = batch.vertices.to_vec();
        self.last_transforms = batch.transforms.to_vec();
        self.calls.push(DeviceCall::DrawQuads {
            quads: batch.transforms.len(),
            index_count: batch.index_count,
            textures: batch.textures.to_vec(),
        });
    }

    fn draw_circles(&mut self, vertices: &[CircleVertex], index_count: u32) {
        self.calls.push(DeviceCall::DrawCircles { circles: vertices.len() / 4, index_count });
    }

    fn draw_lines(&mut self, vertices: &[LineVertex]) {
        self.calls.push(DeviceCall::DrawLines { vertices: vertices.len() });
    }
}
