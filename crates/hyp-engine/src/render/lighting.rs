use bytemuck::{Pod, Zeroable};

use crate::coords::Color;

/// Additive point light.
///
/// Layout matches the WGSL `Light` struct (48 bytes, 16-byte aligned):
///
///  offset  0  position   [f32; 3]
///  offset 12  intensity  f32
///  offset 16  color      [f32; 4]
///  offset 32  radius     f32
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Light {
    pub position: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 4],
    pub radius: f32,
    pub _pad: [f32; 3],
}

impl Light {
    /// Light at `position` (world units) reaching `radius` units.
    pub fn point(position: [f32; 3], color: Color, intensity: f32, radius: f32) -> Self {
        Self {
            position,
            intensity: intensity.max(0.0),
            color: color.to_array(),
            radius: radius.max(f32::EPSILON),
            _pad: [0.0; 3],
        }
    }
}

/// Bounded, scene-scoped light list.
///
/// Lights past the capacity are dropped and counted.
#[derive(Debug, Clone)]
pub struct LightBuffer {
    lights: Vec<Light>,
    capacity: usize,
    enabled: bool,
    dropped: u32,
}

impl LightBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lights: Vec::with_capacity(capacity),
            capacity,
            enabled: false,
            dropped: 0,
        }
    }

    /// Appends `light`; returns `false` if it was dropped.
    pub fn push(&mut self, light: Light) -> bool {
        if self.lights.len() >= self.capacity {
            self.dropped = self.dropped.saturating_add(1);
            return false;
        }
        self.lights.push(light);
        true
    }

    #[inline]
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Number of lights the shader should evaluate: zero while disabled.
    #[inline]
    pub fn active_count(&self) -> u32 {
        if self.enabled { self.lights.len() as u32 } else { 0 }
    }

    #[inline]
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clears the list and the drop counter. The enabled flag persists.
    pub fn clear(&mut self) {
        self.lights.clear();
        self.dropped = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light(x: f32) -> Light {
        Light::point([x, 0.0, 0.0], Color::WHITE, 1.0, 10.0)
    }

    #[test]
    fn light_matches_shader_stride() {
        assert_eq!(std::mem::size_of::<Light>(), 48);
    }

    #[test]
    fn drops_past_capacity_and_counts() {
        let mut buf = LightBuffer::new(32);
        for i in 0..40 {
            buf.push(light(i as f32));
        }
        assert_eq!(buf.lights().len(), 32);
        assert_eq!(buf.dropped(), 8);
        // Retained lights are the first 32, in order.
        assert_eq!(buf.lights()[31].position[0], 31.0);
    }

    #[test]
    fn active_count_is_zero_while_disabled() {
        let mut buf = LightBuffer::new(4);
        buf.push(light(0.0));
        buf.push(light(1.0));
        assert_eq!(buf.active_count(), 0);
        buf.set_enabled(true);
        assert_eq!(buf.active_count(), 2);
    }

    #[test]
    fn clear_keeps_enabled_flag() {
        let mut buf = LightBuffer::new(1);
        buf.set_enabled(true);
        buf.push(light(0.0));
        buf.push(light(1.0));
        buf.clear();
        assert!(buf.enabled());
        assert!(buf.lights().is_empty());
        assert_eq!(buf.dropped(), 0);
    }
}
