//! CPU-side vertex layouts shared by the batch buffers and the wgpu facade.

use bytemuck::{Pod, Zeroable};

// ── quad ──────────────────────────────────────────────────────────────────

/// Quad vertex layout (44 bytes):
///
///  offset  0  position         [f32; 3]   loc 0  (unit-quad corner)
///  offset 12  color            [f32; 4]   loc 1
///  offset 28  uv               [f32; 2]   loc 2
///  offset 36  transform_index  u32        loc 3
///  offset 40  texture_slot     u32        loc 4
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
    pub transform_index: u32,
    pub texture_slot: u32,
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x4, // color
        2 => Float32x2, // uv
        3 => Uint32,    // transform_index
        4 => Uint32     // texture_slot
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

// ── line ──────────────────────────────────────────────────────────────────

/// Line vertex layout (28 bytes). Lines are independent vertex pairs.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl LineVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x4  // color
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

// ── circle ────────────────────────────────────────────────────────────────

/// Circle vertex layout (48 bytes):
///
///  offset  0  world_position  [f32; 3]   loc 0  (transform already applied)
///  offset 12  local_position  [f32; 3]   loc 1  (corner × 2, spans -1..1)
///  offset 24  color           [f32; 4]   loc 2
///  offset 40  thickness       f32        loc 3  (0..1 ring width)
///  offset 44  fade            f32        loc 4  (edge softness)
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CircleVertex {
    pub world_position: [f32; 3],
    pub local_position: [f32; 3],
    pub color: [f32; 4],
    pub thickness: f32,
    pub fade: f32,
}

impl CircleVertex {
    const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3, // world_position
        1 => Float32x3, // local_position
        2 => Float32x4, // color
        3 => Float32,   // thickness
        4 => Float32    // fade
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CircleVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

// ── unit quad template ────────────────────────────────────────────────────

/// Corners of the unit quad centred on the origin, counter-clockwise from
/// the top-right corner. Shared by quads and circles.
pub const QUAD_CORNERS: [[f32; 3]; 4] = [
    [0.5, 0.5, 0.0],
    [-0.5, 0.5, 0.0],
    [-0.5, -0.5, 0.0],
    [0.5, -0.5, 0.0],
];

/// Texture coordinates matching `QUAD_CORNERS`.
pub const QUAD_UVS: [[f32; 2]; 4] = [[1.0, 1.0], [0.0, 1.0], [0.0, 0.0], [1.0, 0.0]];

/// Per-quad index winding relative to the quad's first vertex.
pub const QUAD_INDEX_PATTERN: [u32; 6] = [0, 1, 2, 2, 3, 0];

pub const VERTICES_PER_QUAD: usize = 4;
pub const INDICES_PER_QUAD: usize = 6;

/// Builds the repeating index buffer for `quads` quads.
///
/// Generated once at renderer init; never rebuilt per draw.
pub fn quad_indices(quads: usize) -> Vec<u32> {
    (0..quads)
        .flat_map(|q| {
            let base = (q * VERTICES_PER_QUAD) as u32;
            QUAD_INDEX_PATTERN.iter().map(move |i| base + i)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_sizes_match_shader_layouts() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 44);
        assert_eq!(std::mem::size_of::<LineVertex>(), 28);
        assert_eq!(std::mem::size_of::<CircleVertex>(), 48);
    }

    #[test]
    fn quad_indices_offset_by_four_per_quad() {
        let idx = quad_indices(3);
        assert_eq!(idx.len(), 18);
        assert_eq!(&idx[0..6], &[0, 1, 2, 2, 3, 0]);
        assert_eq!(&idx[6..12], &[4, 5, 6, 6, 7, 4]);
        assert_eq!(&idx[12..18], &[8, 9, 10, 10, 11, 8]);
    }

    #[test]
    fn quad_indices_empty_for_zero_quads() {
        assert!(quad_indices(0).is_empty());
    }
}
