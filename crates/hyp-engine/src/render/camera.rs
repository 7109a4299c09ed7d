use nalgebra::{Matrix4, Point3, Vector2, Vector3};

use crate::coords::Viewport;

/// Remaps OpenGL clip depth (-1..1) to wgpu's 0..1.
#[rustfmt::skip]
fn opengl_to_wgpu() -> Matrix4<f32> {
    Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.5, 0.5,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// 2D orthographic camera in logical pixels (top-left origin, +Y down).
///
/// `position` is the world point shown at the viewport's top-left corner;
/// `zoom > 1` magnifies.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrthographicCamera {
    pub viewport: Viewport,
    pub position: Vector2<f32>,
    pub zoom: f32,
}

impl OrthographicCamera {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport, position: Vector2::zeros(), zoom: 1.0 }
    }

    /// World-space extent currently visible.
    pub fn visible_size(&self) -> Vector2<f32> {
        let zoom = self.zoom.max(f32::EPSILON);
        Vector2::new(self.viewport.width.max(1.0) / zoom, self.viewport.height.max(1.0) / zoom)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        let size = self.visible_size();
        let left = self.position.x;
        let top = self.position.y;
        let ortho = Matrix4::new_orthographic(left, left + size.x, top + size.y, top, -1.0, 1.0);
        opengl_to_wgpu() * ortho
    }

    /// Maps a logical-pixel window position to world space.
    pub fn screen_to_world(&self, x: f32, y: f32) -> Vector2<f32> {
        let zoom = self.zoom.max(f32::EPSILON);
        Vector2::new(self.position.x + x / zoom, self.position.y + y / zoom)
    }

    /// Projects a world point to normalized device coordinates.
    pub fn world_to_ndc(&self, p: Vector3<f32>) -> Vector3<f32> {
        self.view_projection().transform_point(&Point3::from(p)).coords
    }
}
