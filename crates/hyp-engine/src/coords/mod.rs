//! Small value types shared by the renderer, runtime and callers.
//!
//! World space for 2D scenes is whatever the camera maps; the built-in
//! [`OrthographicCamera`](crate::render::OrthographicCamera) uses logical
//! pixels with a top-left origin and +Y down.

mod color;
mod viewport;

pub use color::Color;
pub use viewport::Viewport;
