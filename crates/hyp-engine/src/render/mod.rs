//! Batched 2D rendering.
//!
//! [`Renderer2D`] accumulates quads, circles and lines into CPU batches and
//! submits each batch as one draw call through a [`RenderDevice`].
//! [`WgpuDevice`] is the GPU implementation.
//!
//! Convention:
//! - World space is logical pixels (top-left origin, +Y down) unless the
//!   caller supplies its own camera matrix.
//! - Colors are straight-alpha RGBA; shaders premultiply on output.

mod backend;
mod batch;
mod camera;
mod config;
mod ctx;
mod device;
mod lighting;
mod renderer2d;
mod stats;
mod texture_slots;
mod vertex;

#[cfg(test)]
mod testing;

pub use backend::{TextureFilter, WgpuDevice, WgpuDeviceConfig};
pub use camera::OrthographicCamera;
pub use config::RendererConfig;
pub use ctx::{RenderCtx, RenderTarget};
pub use device::{QuadSubmission, RenderDevice, TextureId, TextureSpec};
pub use lighting::Light;
pub use renderer2d::{quad_transform, Renderer2D};
pub use stats::Stats;
pub use vertex::{CircleVertex, LineVertex, QuadVertex};
