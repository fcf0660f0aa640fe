/// Per-frame data handed to the renderer and the application

use crate::error::{Galaxy3dError, Galaxy3dResult};

/// Linear arena for allocations that live for a single frame
///
/// Reset at the start of every engine tick; nothing is freed individually.
#[derive(Debug)]
pub struct FrameAllocator {
    memory: Vec<u8>,
    offset: usize,
}

impl FrameAllocator {
    pub fn new(capacity: usize) -> Self {
        Self {
            memory: vec![0; capacity],
            offset: 0,
        }
    }

    /// Reserve `size` zeroed bytes whose offset in the arena is a multiple of `align`
    pub fn allocate(&mut self, size: usize, align: usize) -> Galaxy3dResult<&mut [u8]> {
        if size == 0 || !align.is_power_of_two() {
            return Err(Galaxy3dError::InvalidArgument(format!(
                "Frame allocation of {} bytes with alignment {}", size, align
            )));
        }

        let start = self.offset.next_multiple_of(align);
        let end = match start.checked_add(size) {
            Some(end) if end <= self.memory.len() => end,
            _ => return Err(Galaxy3dError::OutOfMemory),
        };

        self.offset = end;
        let block = &mut self.memory[start..end];
        block.fill(0);
        Ok(block)
    }

    /// Copy `bytes` into the arena
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Galaxy3dResult<&mut [u8]> {
        let block = self.allocate(bytes.len(), 1)?;
        block.copy_from_slice(bytes);
        Ok(block)
    }

    /// Forget every allocation
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Bytes handed out since the last reset (including alignment padding)
    pub fn allocated(&self) -> usize {
        self.offset
    }

    pub fn capacity(&self) -> usize {
        self.memory.len()
    }
}

/// Data describing the frame being produced
#[derive(Debug)]
pub struct FrameData {
    /// Seconds since the previous frame
    pub delta_time: f64,
    /// Seconds since the engine started
    pub total_time: f64,
    /// Engine frame counter (frames actually rendered)
    pub frame_number: u64,
    /// Renderer frame number, written by `frame_prepare` (wraps at u16::MAX)
    pub renderer_frame_number: u16,
    /// Scratch memory valid until the next tick
    pub allocator: FrameAllocator,
}

impl FrameData {
    pub fn new(allocator_capacity: usize) -> Self {
        Self {
            delta_time: 0.0,
            total_time: 0.0,
            frame_number: 0,
            renderer_frame_number: 0,
            allocator: FrameAllocator::new(allocator_capacity),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "frame_data_tests.rs"]
mod tests;
