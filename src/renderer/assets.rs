//! Per-level sprite registry
//!
//! Owned by whoever drives the renderer and passed in by reference. Each
//! level slot is pending until its image finishes loading or fails; a failed
//! level keeps drawing with its flat colors.

/// Load state of one level sprite
#[derive(Debug, Clone, PartialEq)]
pub enum SpriteSlot<I> {
    Pending,
    Ready(I),
    Failed,
}

/// Sprites indexed by fruit level
#[derive(Debug, Clone)]
pub struct AssetRegistry<I> {
    slots: Vec<SpriteSlot<I>>,
}

impl<I> AssetRegistry<I> {
    /// `levels` pending slots
    pub fn new(levels: usize) -> Self {
        Self {
            slots: (0..levels).map(|_| SpriteSlot::Pending).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Record a finished load. Out-of-range levels are ignored.
    pub fn mark_loaded(&mut self, level: usize, image: I) {
        if let Some(slot) = self.slots.get_mut(level) {
            *slot = SpriteSlot::Ready(image);
        }
    }

    /// Record a failed load; the level falls back to flat color
    pub fn mark_failed(&mut self, level: usize) {
        if let Some(slot) = self.slots.get_mut(level) {
            log::warn!("Sprite for level {} failed to load, using flat color", level);
            *slot = SpriteSlot::Failed;
        }
    }

    pub fn is_loaded(&self, level: usize) -> bool {
        matches!(self.slots.get(level), Some(SpriteSlot::Ready(_)))
    }

    pub fn is_failed(&self, level: usize) -> bool {
        matches!(self.slots.get(level), Some(SpriteSlot::Failed))
    }

    pub fn sprite(&self, level: usize) -> Option<&I> {
        match self.slots.get(level) {
            Some(SpriteSlot::Ready(image)) => Some(image),
            _ => None,
        }
    }

    /// No slot is still pending
    pub fn is_settled(&self) -> bool {
        !self
            .slots
            .iter()
            .any(|slot| matches!(slot, SpriteSlot::Pending))
    }

    /// Drop every image (unmount)
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = SpriteSlot::Pending;
        }
    }
}
