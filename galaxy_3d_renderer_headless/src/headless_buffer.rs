/// Buffer - CPU byte storage behind a headless renderbuffer

use galaxy_3d_renderer::galaxy3d::Galaxy3dResult;
use galaxy_3d_renderer::galaxy3d::render::RenderbufferType;
use galaxy_3d_renderer::{engine_bail, engine_bail_arg};

use crate::SOURCE;

/// Headless buffer
#[derive(Debug)]
pub(crate) struct Buffer {
    pub(crate) name: String,
    pub(crate) buffer_type: RenderbufferType,
    pub(crate) data: Vec<u8>,
    /// Currently mapped range (offset, size)
    pub(crate) mapped: Option<(u64, u64)>,
}

impl Buffer {
    pub(crate) fn new(name: &str, buffer_type: RenderbufferType, size: u64) -> Self {
        Self {
            name: name.to_string(),
            buffer_type,
            data: vec![0; size as usize],
            mapped: None,
        }
    }

    pub(crate) fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Byte range `[offset, offset + size)` as slice indices
    pub(crate) fn range(&self, offset: u64, size: u64) -> Galaxy3dResult<std::ops::Range<usize>> {
        match offset.checked_add(size) {
            Some(end) if end <= self.size() => Ok(offset as usize..end as usize),
            _ => {
                engine_bail_arg!(SOURCE,
                    "Range [{}, +{}) is outside buffer '{}' ({} bytes)", offset, size, self.name, self.size());
            }
        }
    }

    pub(crate) fn write(&mut self, offset: u64, bytes: &[u8]) -> Galaxy3dResult<()> {
        let range = self.range(offset, bytes.len() as u64)?;
        self.data[range].copy_from_slice(bytes);
        Ok(())
    }

    pub(crate) fn read(&self, offset: u64, size: u64) -> Galaxy3dResult<Vec<u8>> {
        let range = self.range(offset, size)?;
        Ok(self.data[range].to_vec())
    }

    /// Grow to `new_size`, keeping the first `old_size` bytes
    pub(crate) fn resize(&mut self, old_size: u64, new_size: u64) -> Galaxy3dResult<()> {
        if old_size != self.size() {
            engine_bail!(SOURCE,
                "Buffer '{}' resize expected {} bytes, has {}", self.name, old_size, self.size());
        }
        if new_size < old_size {
            engine_bail!(SOURCE,
                "Buffer '{}' cannot shrink from {} to {} bytes", self.name, old_size, new_size);
        }
        self.data.resize(new_size as usize, 0);
        Ok(())
    }

    pub(crate) fn map(&mut self, offset: u64, size: u64) -> Galaxy3dResult<()> {
        self.range(offset, size)?;
        if let Some((mapped_offset, mapped_size)) = self.mapped {
            engine_bail!(SOURCE,
                "Buffer '{}' is already mapped at [{}, +{})", self.name, mapped_offset, mapped_size);
        }
        self.mapped = Some((offset, size));
        Ok(())
    }

    /// Whether `[offset, offset + size)` lies inside the mapped range
    pub(crate) fn is_mapped(&self, offset: u64, size: u64) -> bool {
        match self.mapped {
            Some((mapped_offset, mapped_size)) => {
                offset >= mapped_offset && offset + size <= mapped_offset + mapped_size
            }
            None => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "headless_buffer_tests.rs"]
mod tests;
