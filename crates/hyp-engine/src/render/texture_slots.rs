use super::device::TextureId;

/// Returned when a texture needs a new slot but every slot is occupied.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SlotsExhausted;

/// Fixed-capacity mapping from texture identity to sampler slot.
///
/// Slot 0 always holds the default white texture. Other slots are handed out
/// in first-seen order and live until [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct TextureSlots {
    slots: Vec<TextureId>,
    capacity: usize,
}

impl TextureSlots {
    /// Creates a table whose slot 0 is `white`.
    ///
    /// `capacity` includes the reserved slot and must be at least 2.
    pub fn new(white: TextureId, capacity: usize) -> Self {
        debug_assert!(capacity >= 2, "texture slot table needs room beyond the default slot");
        let mut slots = Vec::with_capacity(capacity);
        slots.push(white);
        Self { slots, capacity }
    }

    /// Returns the slot bound to `texture`, assigning the next free one if needed.
    ///
    /// Only slots `1..occupied` are scanned; slot 0 is never reassigned.
    pub fn resolve_or_assign(&mut self, texture: TextureId) -> Result<u32, SlotsExhausted> {
        if let Some(i) = self.slots[1..].iter().position(|&t| t == texture) {
            return Ok((i + 1) as u32);
        }

        if self.slots.len() == self.capacity {
            return Err(SlotsExhausted);
        }

        self.slots.push(texture);
        Ok((self.slots.len() - 1) as u32)
    }

    /// Drops every binding except the default texture.
    #[inline]
    pub fn reset(&mut self) {
        self.slots.truncate(1);
    }

    /// Bound textures in slot order (slot 0 first).
    #[inline]
    pub fn bound(&self) -> &[TextureId] {
        &self.slots
    }

    /// Number of occupied slots, including the default one.
    #[inline]
    pub fn occupied(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn white(&self) -> TextureId {
        self.slots[0]
    }
}
