/// Freelist - first-fit sub-allocator over a linear byte range
///
/// Tracks the free ranges of a buffer as a sorted, coalesced list of
/// `MemoryRange`s. Used by freelist-tracked renderbuffers to hand out
/// arbitrary-sized regions and take them back individually.
///
/// # Example
///
/// ```ignore
/// let mut list = Freelist::new(1024);
/// let a = list.allocate(100)?; // 0
/// let b = list.allocate(200)?; // 100
/// list.free(a, 100)?;          // [0..100) free again
/// let c = list.allocate(100)?; // 0 (first fit)
/// ```

use crate::error::{Galaxy3dError, Galaxy3dResult};

// ===== MEMORY RANGE =====

/// A contiguous byte range `[offset, offset + size)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MemoryRange {
    /// Start of the range in bytes
    pub offset: u64,
    /// Length of the range in bytes
    pub size: u64,
}

impl MemoryRange {
    pub fn new(offset: u64, size: u64) -> Self {
        Self { offset, size }
    }

    /// One past the last byte of the range
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }

    /// Whether the two ranges share at least one byte
    pub fn overlaps(&self, other: &MemoryRange) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}

// ===== FREELIST =====

/// First-fit free range tracker
///
/// Invariants:
/// - `blocks` is sorted by offset
/// - blocks never overlap and never touch (adjacent blocks are merged)
/// - every block lies inside `[0, total_size)`
#[derive(Debug, Clone)]
pub struct Freelist {
    total_size: u64,
    blocks: Vec<MemoryRange>,
}

impl Freelist {
    /// Create a freelist where the whole range is free
    pub fn new(total_size: u64) -> Self {
        let mut list = Self {
            total_size,
            blocks: Vec::new(),
        };
        list.clear();
        list
    }

    /// Total size tracked by this freelist
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Sum of all free ranges
    pub fn free_space(&self) -> u64 {
        self.blocks.iter().map(|block| block.size).sum()
    }

    /// Current free ranges, sorted by offset
    pub fn free_blocks(&self) -> &[MemoryRange] {
        &self.blocks
    }

    /// Whether any byte of `range` is currently free
    pub fn overlaps_free(&self, range: &MemoryRange) -> bool {
        let index = self.blocks.partition_point(|block| block.end() <= range.offset);
        self.blocks.get(index).is_some_and(|block| block.overlaps(range))
    }

    /// Allocate `size` bytes, returning the offset of the first block large enough
    pub fn allocate(&mut self, size: u64) -> Galaxy3dResult<u64> {
        if size == 0 {
            return Err(Galaxy3dError::InvalidArgument("Cannot allocate 0 bytes from a freelist".to_string()));
        }

        let index = self.blocks.iter()
            .position(|block| block.size >= size)
            .ok_or(Galaxy3dError::OutOfMemory)?;

        let block = &mut self.blocks[index];
        let offset = block.offset;
        if block.size == size {
            self.blocks.remove(index);
        } else {
            block.offset += size;
            block.size -= size;
        }
        Ok(offset)
    }

    /// Return `[offset, offset + size)` to the free list
    ///
    /// Fails without mutation if the range is empty, out of bounds,
    /// or overlaps a range that is already free (double free).
    pub fn free(&mut self, offset: u64, size: u64) -> Galaxy3dResult<()> {
        if size == 0 {
            return Err(Galaxy3dError::InvalidArgument("Cannot free a 0-byte range".to_string()));
        }
        let end = offset.checked_add(size)
            .filter(|&end| end <= self.total_size)
            .ok_or_else(|| Galaxy3dError::InvalidArgument(format!(
                "Range [{}, +{}) exceeds freelist size {}", offset, size, self.total_size
            )))?;

        let range = MemoryRange::new(offset, size);
        let index = self.blocks.partition_point(|block| block.offset < offset);

        let prev = index.checked_sub(1).map(|i| self.blocks[i]);
        let next = self.blocks.get(index).copied();

        if prev.is_some_and(|p| p.overlaps(&range)) || next.is_some_and(|n| n.overlaps(&range)) {
            return Err(Galaxy3dError::InvalidArgument(format!(
                "Range [{}, +{}) is already free", offset, size
            )));
        }

        let merge_prev = prev.is_some_and(|p| p.end() == offset);
        let merge_next = next.is_some_and(|n| n.offset == end);

        match (merge_prev, merge_next) {
            (true, true) => {
                let next_size = self.blocks[index].size;
                self.blocks[index - 1].size += size + next_size;
                self.blocks.remove(index);
            }
            (true, false) => self.blocks[index - 1].size += size,
            (false, true) => {
                let block = &mut self.blocks[index];
                block.offset = offset;
                block.size += size;
            }
            (false, false) => self.blocks.insert(index, range),
        }
        Ok(())
    }

    /// Grow the tracked range to `new_total_size`, keeping every existing range
    ///
    /// The new tail `[old_total, new_total)` becomes free.
    pub fn resize(&mut self, new_total_size: u64) -> Galaxy3dResult<()> {
        if new_total_size <= self.total_size {
            return Err(Galaxy3dError::InvalidArgument(format!(
                "Freelist can only grow ({} -> {})", self.total_size, new_total_size
            )));
        }

        let old_total = self.total_size;
        let added = new_total_size - old_total;
        self.total_size = new_total_size;

        match self.blocks.last_mut() {
            Some(last) if last.end() == old_total => last.size += added,
            _ => self.blocks.push(MemoryRange::new(old_total, added)),
        }
        Ok(())
    }

    /// Mark the whole range as free again
    pub fn clear(&mut self) {
        self.blocks.clear();
        if self.total_size > 0 {
            self.blocks.push(MemoryRange::new(0, self.total_size));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "freelist_tests.rs"]
mod tests;
