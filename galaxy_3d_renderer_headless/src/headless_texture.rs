/// Texture - CPU pixel storage behind a headless texture
///
/// Only mip 0 is stored, for every array layer, tightly packed:
/// `layer * layer_size + (y * width + x) * channels`.

use galaxy_3d_renderer::galaxy3d::Galaxy3dResult;
use galaxy_3d_renderer::galaxy3d::render::TextureDesc;
use galaxy_3d_renderer::{engine_bail, engine_bail_arg};

use crate::SOURCE;

/// Headless texture
#[derive(Debug)]
pub(crate) struct Texture {
    pub(crate) name: String,
    pub(crate) desc: TextureDesc,
    pub(crate) data: Vec<u8>,
}

impl Texture {
    pub(crate) fn new(name: &str, desc: &TextureDesc, data: Option<&[u8]>) -> Galaxy3dResult<Self> {
        let size = desc.size() as usize;
        let data = match data {
            Some(bytes) if bytes.len() != size => {
                engine_bail!(SOURCE,
                    "Texture '{}' initial data is {} bytes, expected {}", name, bytes.len(), size);
            }
            Some(bytes) => bytes.to_vec(),
            None => vec![0; size],
        };
        Ok(Self {
            name: name.to_string(),
            desc: desc.clone(),
            data,
        })
    }

    fn range(&self, offset: u64, size: u64) -> Galaxy3dResult<std::ops::Range<usize>> {
        match offset.checked_add(size) {
            Some(end) if end <= self.data.len() as u64 => Ok(offset as usize..end as usize),
            _ => {
                engine_bail_arg!(SOURCE,
                    "Range [{}, +{}) is outside texture '{}' ({} bytes)", offset, size, self.name, self.data.len());
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

    /// Pixel at (x, y) of layer 0 as RGBA; missing channels read as 0
    pub(crate) fn read_pixel(&self, x: u32, y: u32) -> Galaxy3dResult<[u8; 4]> {
        if x >= self.desc.width || y >= self.desc.height {
            engine_bail_arg!(SOURCE,
                "Pixel ({}, {}) is outside texture '{}' ({}x{})",
                x, y, self.name, self.desc.width, self.desc.height);
        }

        let channels = self.desc.channels as usize;
        let start = (y as usize * self.desc.width as usize + x as usize) * channels;
        let mut pixel = [0u8; 4];
        pixel[..channels].copy_from_slice(&self.data[start..start + channels]);
        Ok(pixel)
    }

    /// Reallocate at a new size; contents are reset to zero
    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        self.desc.width = width;
        self.desc.height = height;
        self.desc.mip_levels = self.desc.mip_levels.min(TextureDesc::max_mip_levels(width, height));
        self.data = vec![0; self.desc.size() as usize];
    }

    /// Set every pixel of every layer to `pixel`, truncated to the channel count
    pub(crate) fn fill(&mut self, pixel: [u8; 4]) {
        let channels = self.desc.channels as usize;
        for texel in self.data.chunks_exact_mut(channels) {
            texel.copy_from_slice(&pixel[..channels]);
        }
    }
}

/// Normalized float colour to RGBA8
pub(crate) fn colour_to_rgba8(colour: [f32; 4]) -> [u8; 4] {
    colour.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "headless_texture_tests.rs"]
mod tests;
