//! Persistent device buffers and the per-draw region layout inside them.

use crate::render::config::RendererConfig;
use crate::render::lighting::Light;

use super::pipelines::{CameraUniform, LightParams};

/// Device buffer that lives as long as the facade and grows on demand.
///
/// Contents are not preserved across growth; every frame rewrites the
/// regions it draws from.
pub(super) struct GrowableBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    buffer: wgpu::Buffer,
    capacity: u64,
}

impl GrowableBuffer {
    pub fn new(
        device: &wgpu::Device,
        label: &'static str,
        usage: wgpu::BufferUsages,
        capacity: u64,
    ) -> Self {
        let capacity = grown_capacity(capacity);
        let usage = usage | wgpu::BufferUsages::COPY_DST;
        Self { label, usage, buffer: allocate(device, label, usage, capacity), capacity }
    }

    #[inline]
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Reallocates when `required` bytes do not fit. Returns `true` if the
    /// buffer changed, which invalidates bind groups referencing it.
    pub fn ensure_capacity(&mut self, device: &wgpu::Device, required: u64) -> bool {
        if required <= self.capacity {
            return false;
        }
        let capacity = grown_capacity(required);
        log::debug!("{}: growing {} -> {} bytes", self.label, self.capacity, capacity);
        self.buffer = allocate(device, self.label, self.usage, capacity);
        self.capacity = capacity;
        true
    }
}

fn allocate(device: &wgpu::Device, label: &str, usage: wgpu::BufferUsages, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage,
        mapped_at_creation: false,
    })
}

fn grown_capacity(required: u64) -> u64 {
    align_to(required.max(256).next_power_of_two(), wgpu::COPY_BUFFER_ALIGNMENT)
}

#[inline]
pub(super) fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Byte stride of one recorded draw's region in each bound buffer.
///
/// Each region is bound through a dynamic offset, so strides are rounded up
/// to the device's offset alignment and sized for a full batch.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) struct Strides {
    pub camera: u64,
    pub transforms: u64,
    pub lights: u64,
    pub light_params: u64,
    /// Bytes bound per transforms region.
    pub transforms_binding: u64,
    /// Bytes bound per lights region.
    pub lights_binding: u64,
}

impl Strides {
    pub fn new(limits: &wgpu::Limits, batch: &RendererConfig) -> Self {
        let uniform = u64::from(limits.min_uniform_buffer_offset_alignment);
        let storage = u64::from(limits.min_storage_buffer_offset_alignment);

        let transforms_binding = (batch.max_quads.max(1) * std::mem::size_of::<[[f32; 4]; 4]>()) as u64;
        // Storage bindings must hold at least one element.
        let lights_binding = (batch.max_lights.max(1) * std::mem::size_of::<Light>()) as u64;

        Self {
            camera: align_to(std::mem::size_of::<CameraUniform>() as u64, uniform),
            transforms: align_to(transforms_binding, storage),
            lights: align_to(lights_binding, storage),
            light_params: align_to(std::mem::size_of::<LightParams>() as u64, uniform),
            transforms_binding,
            lights_binding,
        }
    }
}

/// Packs variable-length vertex runs back to back.
#[derive(Debug, Default)]
pub(super) struct VertexCursor {
    next: u64,
}

impl VertexCursor {
    /// Reserves `len` bytes and returns the byte range they occupy.
    pub fn reserve(&mut self, len: u64) -> std::ops::Range<u64> {
        let start = self.next;
        self.next = align_to(start + len, wgpu::COPY_BUFFER_ALIGNMENT);
        start..start + len
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_rounds_up_to_the_next_multiple() {
        assert_eq!(align_to(0, 256), 0);
        assert_eq!(align_to(1, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
    }

    #[test]
    fn strides_respect_offset_alignment() {
        let limits = wgpu::Limits::default();
        let strides = Strides::new(&limits, &RendererConfig::default());

        let uniform = u64::from(limits.min_uniform_buffer_offset_alignment);
        let storage = u64::from(limits.min_storage_buffer_offset_alignment);
        assert_eq!(strides.camera % uniform, 0);
        assert_eq!(strides.light_params % uniform, 0);
        assert_eq!(strides.transforms % storage, 0);
        assert_eq!(strides.lights % storage, 0);

        // 1000 quads × 64 bytes, 32 lights × 48 bytes.
        assert!(strides.transforms >= 64_000);
        assert!(strides.lights >= 32 * 48);
    }

    #[test]
    fn bindings_fit_inside_their_stride() {
        let batch = RendererConfig { max_quads: 3, max_lights: 0, ..RendererConfig::default() };
        let strides = Strides::new(&wgpu::Limits::default(), &batch);
        assert_eq!(strides.transforms_binding, 3 * 64);
        assert_eq!(strides.lights_binding, 48);
        assert!(strides.transforms_binding <= strides.transforms);
        assert!(strides.lights_binding <= strides.lights);
    }

    #[test]
    fn vertex_runs_do_not_overlap() {
        let mut cursor = VertexCursor::default();
        let a = cursor.reserve(44 * 4);
        let b = cursor.reserve(10);
        let c = cursor.reserve(28 * 2);

        assert_eq!(a, 0..176);
        assert_eq!(b, 176..186);
        assert_eq!(c.start, 188);
        assert_eq!(c.start % wgpu::COPY_BUFFER_ALIGNMENT, 0);
        assert_eq!(cursor.total(), 244);
    }

    #[test]
    fn capacity_grows_to_a_power_of_two() {
        assert_eq!(grown_capacity(1), 256);
        assert_eq!(grown_capacity(300), 512);
        assert_eq!(grown_capacity(4096), 4096);
    }
}
