//! Per-primitive CPU batch buffers.
//!
//! Each batch is append-only between resets. Capacity is checked by the
//! scheduler *before* appending, so a batch never holds more than its limit.

use nalgebra::{Matrix4, Vector4};

use crate::coords::Color;

use super::vertex::{
    CircleVertex, LineVertex, QuadVertex, INDICES_PER_QUAD, QUAD_CORNERS, QUAD_UVS,
    VERTICES_PER_QUAD,
};

/// Converts a column-major nalgebra matrix to WGSL `mat4x4<f32>` column arrays.
#[inline]
pub(crate) fn mat4_columns(m: &Matrix4<f32>) -> [[f32; 4]; 4] {
    let mut cols = [[0.0f32; 4]; 4];
    for (c, col) in cols.iter_mut().enumerate() {
        for (r, v) in col.iter_mut().enumerate() {
            *v = m[(r, c)];
        }
    }
    cols
}

// ── quads ─────────────────────────────────────────────────────────────────

/// Quads: four template-corner vertices plus one transform per instance.
#[derive(Debug, Default)]
pub struct QuadBatch {
    vertices: Vec<QuadVertex>,
    transforms: Vec<[[f32; 4]; 4]>,
}

impl QuadBatch {
    pub fn with_capacity(quads: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(quads * VERTICES_PER_QUAD),
            transforms: Vec::with_capacity(quads),
        }
    }

    /// Appends one quad instance sampling `texture_slot`.
    pub fn push(&mut self, transform: &Matrix4<f32>, color: Color, texture_slot: u32) {
        let transform_index = self.transforms.len() as u32;
        let color = color.to_array();

        for (position, uv) in QUAD_CORNERS.iter().zip(QUAD_UVS.iter()) {
            self.vertices.push(QuadVertex {
                position: *position,
                color,
                uv: *uv,
                transform_index,
                texture_slot,
            });
        }
        self.transforms.push(mat4_columns(transform));
    }

    /// Number of queued quad instances.
    #[inline]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        (self.transforms.len() * INDICES_PER_QUAD) as u32
    }

    #[inline]
    pub fn vertices(&self) -> &[QuadVertex] {
        &self.vertices
    }

    #[inline]
    pub fn transforms(&self) -> &[[[f32; 4]; 4]] {
        &self.transforms
    }

    /// Clears vertices and transforms; keeps allocations.
    #[inline]
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.transforms.clear();
    }
}

// ── lines ─────────────────────────────────────────────────────────────────

/// Lines: independent vertex pairs, no index buffer.
#[derive(Debug, Default)]
pub struct LineBatch {
    vertices: Vec<LineVertex>,
}

impl LineBatch {
    pub fn with_capacity(vertices: usize) -> Self {
        Self { vertices: Vec::with_capacity(vertices) }
    }

    pub fn push(&mut self, p1: [f32; 3], p2: [f32; 3], color: Color) {
        let color = color.to_array();
        self.vertices.push(LineVertex { position: p1, color });
        self.vertices.push(LineVertex { position: p2, color });
    }

    /// Number of queued vertices (two per segment).
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn vertices(&self) -> &[LineVertex] {
        &self.vertices
    }

    #[inline]
    pub fn clear(&mut self) {
        self.vertices.clear();
    }
}

// ── circles ───────────────────────────────────────────────────────────────

/// Circles: transformed unit quads with a signed-distance ring in the fragment stage.
#[derive(Debug, Default)]
pub struct CircleBatch {
    vertices: Vec<CircleVertex>,
    index_count: u32,
}

impl CircleBatch {
    pub fn with_capacity(circles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(circles * VERTICES_PER_QUAD),
            index_count: 0,
        }
    }

    pub fn push(&mut self, transform: &Matrix4<f32>, color: Color, thickness: f32, fade: f32) {
        let color = color.to_array();
        for corner in QUAD_CORNERS.iter() {
            let world = transform * Vector4::new(corner[0], corner[1], corner[2], 1.0);
            self.vertices.push(CircleVertex {
                world_position: [world.x, world.y, world.z],
                local_position: [corner[0] * 2.0, corner[1] * 2.0, corner[2] * 2.0],
                color,
                thickness,
                fade,
            });
        }
        self.index_count += INDICES_PER_QUAD as u32;
    }

    /// Number of queued circles.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len() / VERTICES_PER_QUAD
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    #[inline]
    pub fn vertices(&self) -> &[CircleVertex] {
        &self.vertices
    }

    #[inline]
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.index_count = 0;
    }
}
