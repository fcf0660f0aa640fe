/// Renderbuffer - a backend buffer plus the allocator tracking its ranges
///
/// Three tracking modes:
/// - `Freelist`: first-fit ranges, freed ranges coalesce
/// - `Linear`: bump cursor; individual frees are accepted but only `clear` reclaims space
/// - `None`: the caller manages the whole buffer; `allocate` is refused
///
/// Frees are never applied immediately. They go through the deletion queue
/// and reach the tracker `MAX_FRAMES_IN_FLIGHT` maintenance passes later.

use slotmap::new_key_type;
use crate::error::{Galaxy3dError, Galaxy3dResult};
use crate::renderer::backend::BackendResource;
use crate::renderer::config::MAX_FRAMES_IN_FLIGHT;
use crate::renderer::deletion_queue::{DeletionPass, DeletionQueue};
use crate::renderer::freelist::{Freelist, MemoryRange};

const SOURCE: &str = "galaxy3d::Renderbuffer";

new_key_type! {
    /// Generational handle to a renderbuffer owned by the frontend
    pub struct RenderbufferHandle;
}

/// What a renderbuffer holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderbufferType {
    Vertex,
    Index,
    Uniform,
    Storage,
    /// CPU-visible upload buffer
    Staging,
    /// CPU-visible readback buffer
    Read,
}

/// How allocations inside a renderbuffer are tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderbufferTrackType {
    None,
    Freelist,
    Linear,
}

#[derive(Debug, Clone)]
enum Tracker {
    None,
    Freelist(Freelist),
    Linear { cursor: u64 },
}

impl Tracker {
    fn new(track_type: RenderbufferTrackType, total_size: u64) -> Self {
        match track_type {
            RenderbufferTrackType::None => Tracker::None,
            RenderbufferTrackType::Freelist => Tracker::Freelist(Freelist::new(total_size)),
            RenderbufferTrackType::Linear => Tracker::Linear { cursor: 0 },
        }
    }

    /// Whether the range is already free (never allocated, or released)
    fn is_free(&self, range: &MemoryRange) -> bool {
        match self {
            Tracker::Freelist(freelist) => freelist.overlaps_free(range),
            Tracker::Linear { .. } | Tracker::None => false,
        }
    }

    /// Hand a range back; a no-op for linear and untracked buffers
    fn release(&mut self, range: MemoryRange) -> Galaxy3dResult<()> {
        match self {
            Tracker::Freelist(freelist) => freelist.free(range.offset, range.size),
            Tracker::Linear { .. } | Tracker::None => Ok(()),
        }
    }
}

/// Read-only summary of a renderbuffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderbufferInfo {
    pub name: String,
    pub buffer_type: RenderbufferType,
    pub track_type: RenderbufferTrackType,
    pub total_size: u64,
    pub free_space: u64,
    pub pending_deletions: usize,
}

/// A backend buffer and its range allocator
#[derive(Debug)]
pub struct Renderbuffer {
    name: String,
    buffer_type: RenderbufferType,
    total_size: u64,
    tracker: Tracker,
    deletion_queue: DeletionQueue,
    backend: BackendResource,
}

impl Renderbuffer {
    /// Wrap an already created backend buffer
    pub(crate) fn new(
        name: &str,
        buffer_type: RenderbufferType,
        total_size: u64,
        track_type: RenderbufferTrackType,
        backend: BackendResource,
    ) -> Self {
        Self {
            name: name.to_string(),
            buffer_type,
            total_size,
            tracker: Tracker::new(track_type, total_size),
            deletion_queue: DeletionQueue::new(),
            backend,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffer_type(&self) -> RenderbufferType {
        self.buffer_type
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn track_type(&self) -> RenderbufferTrackType {
        match self.tracker {
            Tracker::None => RenderbufferTrackType::None,
            Tracker::Freelist(_) => RenderbufferTrackType::Freelist,
            Tracker::Linear { .. } => RenderbufferTrackType::Linear,
        }
    }

    pub fn backend_resource(&self) -> BackendResource {
        self.backend
    }

    /// Bytes that can still be allocated (0 for untracked buffers)
    pub fn free_space(&self) -> u64 {
        match &self.tracker {
            Tracker::None => 0,
            Tracker::Freelist(freelist) => freelist.free_space(),
            Tracker::Linear { cursor } => self.total_size - cursor,
        }
    }

    pub fn deletion_queue(&self) -> &DeletionQueue {
        &self.deletion_queue
    }

    pub fn info(&self) -> RenderbufferInfo {
        RenderbufferInfo {
            name: self.name.clone(),
            buffer_type: self.buffer_type,
            track_type: self.track_type(),
            total_size: self.total_size,
            free_space: self.free_space(),
            pending_deletions: self.deletion_queue.pending_count(),
        }
    }

    /// Check that `[offset, offset + size)` lies inside the buffer
    pub(crate) fn check_range(&self, offset: u64, size: u64) -> Galaxy3dResult<()> {
        match offset.checked_add(size) {
            Some(end) if end <= self.total_size => Ok(()),
            _ => {
                crate::engine_bail_arg!(SOURCE,
                    "Range [{}, +{}) is outside renderbuffer '{}' (size {})",
                    offset, size, self.name, self.total_size);
            }
        }
    }

    /// Reserve `size` bytes and return their offset
    pub(crate) fn allocate(&mut self, size: u64) -> Galaxy3dResult<u64> {
        if size == 0 {
            crate::engine_bail_arg!(SOURCE, "Zero-size allocation in renderbuffer '{}'", self.name);
        }

        match &mut self.tracker {
            Tracker::None => {
                crate::engine_bail_arg!(SOURCE,
                    "Renderbuffer '{}' is not tracked and cannot allocate", self.name);
            }
            Tracker::Freelist(freelist) => freelist.allocate(size).map_err(|error| {
                crate::engine_error!(SOURCE,
                    "Allocation of {} bytes failed in renderbuffer '{}': {}", size, self.name, error);
                error
            }),
            Tracker::Linear { cursor } => {
                let offset = *cursor;
                match offset.checked_add(size) {
                    Some(end) if end <= self.total_size => {
                        *cursor = end;
                        Ok(offset)
                    }
                    _ => {
                        crate::engine_error!(SOURCE,
                            "Linear renderbuffer '{}' is full ({} of {} bytes used, {} requested)",
                            self.name, offset, self.total_size, size);
                        Err(Galaxy3dError::OutOfMemory)
                    }
                }
            }
        }
    }

    /// Queue a range for deferred release
    ///
    /// Fails with no mutation when the range is empty, out of bounds, already
    /// free in the tracker, or overlaps a range already waiting in the queue.
    pub(crate) fn queue_free(&mut self, offset: u64, size: u64) -> Galaxy3dResult<()> {
        if size == 0 {
            crate::engine_bail_arg!(SOURCE, "Zero-size free in renderbuffer '{}'", self.name);
        }
        self.check_range(offset, size)?;

        let range = MemoryRange::new(offset, size);
        if self.deletion_queue.overlaps_pending(&range) {
            crate::engine_bail_arg!(SOURCE,
                "Range [{}, +{}) of renderbuffer '{}' is already pending deletion",
                offset, size, self.name);
        }
        if self.tracker.is_free(&range) {
            crate::engine_bail_arg!(SOURCE,
                "Range [{}, +{}) of renderbuffer '{}' is not allocated",
                offset, size, self.name);
        }

        self.deletion_queue.push(range, MAX_FRAMES_IN_FLIGHT);
        Ok(())
    }

    /// One deferred-deletion maintenance pass
    pub(crate) fn process_deletions(&mut self) -> DeletionPass {
        let tracker = &mut self.tracker;
        let pass = self.deletion_queue.process(|range| tracker.release(range));

        for (range, error) in &pass.failed {
            crate::engine_error!(SOURCE,
                "Deferred release of [{}, +{}) in renderbuffer '{}' failed, retrying next frame: {}",
                range.offset, range.size, self.name, error);
        }
        pass
    }

    /// Grow the buffer
    ///
    /// The tracker is grown first; `resize_backend(old_size, new_size)` then
    /// resizes the backend buffer. If it fails the tracker is restored and the
    /// renderbuffer is left exactly as it was.
    pub(crate) fn resize_with<F>(&mut self, new_total_size: u64, resize_backend: F) -> Galaxy3dResult<()>
    where
        F: FnOnce(BackendResource, u64, u64) -> Galaxy3dResult<()>,
    {
        if new_total_size <= self.total_size {
            crate::engine_bail_arg!(SOURCE,
                "Renderbuffer '{}' can only grow ({} -> {} requested)",
                self.name, self.total_size, new_total_size);
        }

        let previous = self.tracker.clone();
        if let Tracker::Freelist(freelist) = &mut self.tracker {
            freelist.resize(new_total_size)?;
        }

        if let Err(error) = resize_backend(self.backend, self.total_size, new_total_size) {
            self.tracker = previous;
            crate::engine_error!(SOURCE,
                "Backend resize of renderbuffer '{}' failed, previous state kept: {}", self.name, error);
            return Err(error);
        }

        self.total_size = new_total_size;
        Ok(())
    }

    /// Forget every allocation and pending deletion
    pub(crate) fn reset(&mut self) {
        match &mut self.tracker {
            Tracker::None => {}
            Tracker::Freelist(freelist) => freelist.clear(),
            Tracker::Linear { cursor } => *cursor = 0,
        }
        self.deletion_queue.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "renderbuffer_tests.rs"]
mod tests;
