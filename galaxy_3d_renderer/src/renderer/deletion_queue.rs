/// Deferred deletion queue for renderbuffer ranges
///
/// A freed range cannot go back to the allocator immediately: frames that
/// were recorded before the free may still be reading it on the GPU.
/// The queue holds each freed range for `MAX_FRAMES_IN_FLIGHT` maintenance
/// passes (one pass per `frame_commands_begin`) before releasing it.
///
/// Slots are an explicit enum so that an empty, reusable slot can never be
/// confused with a pending deletion.

use crate::error::{Galaxy3dError, Galaxy3dResult};
use crate::renderer::freelist::MemoryRange;

/// One slot of the deletion queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionSlot {
    /// Nothing to delete; the slot can be reused by the next free
    Empty,
    /// A range waiting for in-flight frames to retire
    Pending {
        /// Maintenance passes left before the range is released
        frames_until_delete: u8,
        /// The range to hand back to the allocator
        range: MemoryRange,
    },
}

/// Outcome of one maintenance pass over a queue
#[derive(Debug, Default)]
pub struct DeletionPass {
    /// Ranges handed back to the allocator during this pass
    pub released: Vec<MemoryRange>,
    /// Ranges whose release failed; they stay queued and are retried next pass
    pub failed: Vec<(MemoryRange, Galaxy3dError)>,
}

/// Fixed-slot queue of pending range deletions
#[derive(Debug, Clone, Default)]
pub struct DeletionQueue {
    slots: Vec<DeletionSlot>,
}

impl DeletionQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Queue `range` for release after `frames` maintenance passes
    ///
    /// Reuses the first `Empty` slot, or appends a new one.
    /// Returns the slot index used.
    pub fn push(&mut self, range: MemoryRange, frames: u8) -> usize {
        let pending = DeletionSlot::Pending {
            frames_until_delete: frames,
            range,
        };

        match self.slots.iter().position(|slot| *slot == DeletionSlot::Empty) {
            Some(index) => {
                self.slots[index] = pending;
                index
            }
            None => {
                self.slots.push(pending);
                self.slots.len() - 1
            }
        }
    }

    /// Whether `range` overlaps any range still pending
    pub fn overlaps_pending(&self, range: &MemoryRange) -> bool {
        self.pending().any(|(_, pending)| pending.overlaps(range))
    }

    /// Iterate over pending entries as `(frames_until_delete, range)`
    pub fn pending(&self) -> impl Iterator<Item = (u8, MemoryRange)> + '_ {
        self.slots.iter().filter_map(|slot| match *slot {
            DeletionSlot::Pending { frames_until_delete, range } => Some((frames_until_delete, range)),
            DeletionSlot::Empty => None,
        })
    }

    /// Number of pending deletions
    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }

    /// Number of slots, empty ones included
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Raw slot access (diagnostics and tests)
    pub fn slots(&self) -> &[DeletionSlot] {
        &self.slots
    }

    /// Drop every pending deletion without releasing anything
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Run one maintenance pass
    ///
    /// Every pending entry is decremented. Entries reaching zero are passed to
    /// `release`; on success the slot becomes `Empty`, on failure the entry is
    /// kept with one pass left so the release is attempted again next frame.
    pub fn process<F>(&mut self, mut release: F) -> DeletionPass
    where
        F: FnMut(MemoryRange) -> Galaxy3dResult<()>,
    {
        let mut pass = DeletionPass::default();

        for slot in self.slots.iter_mut() {
            let DeletionSlot::Pending { frames_until_delete, range } = slot else {
                continue;
            };

            *frames_until_delete = frames_until_delete.saturating_sub(1);
            if *frames_until_delete > 0 {
                continue;
            }

            let range = *range;
            match release(range) {
                Ok(()) => {
                    *slot = DeletionSlot::Empty;
                    pass.released.push(range);
                }
                Err(error) => {
                    *frames_until_delete = 1;
                    pass.failed.push((range, error));
                }
            }
        }

        pass
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "deletion_queue_tests.rs"]
mod tests;
