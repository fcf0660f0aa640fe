/// Texture operations of the frontend

use super::{RendererFrontend, TextureRecord, SOURCE};
use crate::error::Galaxy3dResult;
use crate::renderer::backend::BackendResource;
use crate::renderer::handle::{HandleTable, TextureHandle};
use crate::renderer::texture::{DefaultTexture, TextureDesc, TextureFlags, TextureType};

fn record(textures: &HandleTable<TextureHandle, TextureRecord>, handle: TextureHandle) -> Galaxy3dResult<&TextureRecord> {
    match textures.get(handle) {
        Some(record) => Ok(record),
        None => {
            crate::engine_bail_resource!(SOURCE, "{} is not a live texture", handle);
        }
    }
}

/// Check a descriptor before anything reaches the backend
fn validate_desc(name: &str, desc: &TextureDesc) -> Galaxy3dResult<()> {
    if desc.width == 0 || desc.height == 0 {
        crate::engine_bail_arg!(SOURCE,
            "Texture '{}' has invalid dimensions {}x{}", name, desc.width, desc.height);
    }
    if !(1..=4).contains(&desc.channels) {
        crate::engine_bail_arg!(SOURCE,
            "Texture '{}' has {} channels (1 to 4 supported)", name, desc.channels);
    }
    if desc.array_size == 0 {
        crate::engine_bail_arg!(SOURCE, "Texture '{}' has an array size of 0", name);
    }
    let max_mips = TextureDesc::max_mip_levels(desc.width, desc.height);
    if desc.mip_levels == 0 || desc.mip_levels > max_mips {
        crate::engine_bail_arg!(SOURCE,
            "Texture '{}' requests {} mip levels ({} max for {}x{})",
            name, desc.mip_levels, max_mips, desc.width, desc.height);
    }
    let layers_ok = match desc.texture_type {
        TextureType::Type2D => desc.array_size == 1,
        TextureType::Type2DArray => true,
        TextureType::Cube => desc.array_size == 6,
        TextureType::CubeArray => desc.array_size % 6 == 0,
    };
    if !layers_ok {
        crate::engine_bail_arg!(SOURCE,
            "Texture '{}' of type {:?} cannot have {} layers", name, desc.texture_type, desc.array_size);
    }
    Ok(())
}

impl RendererFrontend {
    /// Create a texture with no initial contents
    ///
    /// Everything is validated before the backend is called; on any error no
    /// handle is consumed.
    #[allow(clippy::too_many_arguments)]
    pub fn texture_resources_acquire(
        &mut self,
        name: &str,
        texture_type: TextureType,
        width: u32,
        height: u32,
        channels: u8,
        mip_levels: u32,
        array_size: u16,
        flags: TextureFlags,
    ) -> Galaxy3dResult<TextureHandle> {
        let desc = TextureDesc { texture_type, width, height, channels, mip_levels, array_size, flags };
        self.texture_create(name, desc, None)
    }

    /// Create a texture from a descriptor, optionally with its full mip 0 contents
    pub fn texture_create(&mut self, name: &str, desc: TextureDesc, data: Option<&[u8]>) -> Galaxy3dResult<TextureHandle> {
        validate_desc(name, &desc)?;
        if let Some(data) = data {
            if data.len() as u64 != desc.size() {
                crate::engine_bail_arg!(SOURCE,
                    "Texture '{}' initial data is {} bytes, expected {}", name, data.len(), desc.size());
            }
        }
        if let Err(error) = self.textures.can_insert(name) {
            crate::engine_error!(SOURCE, "Cannot create texture '{}': {}", name, error);
            return Err(error);
        }

        let backend = self.backend.texture_create(name, &desc, data)?;
        let handle = self.textures.insert(name, TextureRecord { desc, backend })?;
        crate::engine_trace!(SOURCE, "Texture '{}' acquired as {}", name, handle);
        Ok(handle)
    }

    /// Release a texture and reset the caller's handle to INVALID
    ///
    /// No-op for an INVALID handle, so releasing twice is harmless.
    pub fn texture_resources_release(&mut self, handle: &mut TextureHandle) {
        if !handle.is_valid() {
            return;
        }
        let handle = handle.take();
        match self.textures.remove(handle) {
            Some(record) => self.backend.texture_destroy(record.backend),
            None => crate::engine_warn!(SOURCE, "Release of {} which is not a live texture", handle),
        }
    }

    /// Write `data` at byte `offset` of mip 0
    ///
    /// Before the first frame has been prepared the write is always performed
    /// outside of the frame workload.
    pub fn texture_write_data(
        &mut self,
        handle: TextureHandle,
        offset: u64,
        data: &[u8],
        include_in_frame_workload: bool,
    ) -> Galaxy3dResult<()> {
        let record = record(&self.textures, handle)?;
        if data.is_empty() {
            crate::engine_bail_arg!(SOURCE, "Empty write to {}", handle);
        }
        check_bounds(handle, &record.desc, offset, data.len() as u64)?;

        let backend = record.backend;
        let include = include_in_frame_workload && self.frame_number != 0;
        self.backend.texture_write_data(backend, offset, data, include)
    }

    /// Synchronously read `size` bytes at `offset`
    pub fn texture_read_data(&mut self, handle: TextureHandle, offset: u64, size: u64) -> Galaxy3dResult<Vec<u8>> {
        let record = record(&self.textures, handle)?;
        if size == 0 {
            crate::engine_bail_arg!(SOURCE, "Zero-size read from {}", handle);
        }
        check_bounds(handle, &record.desc, offset, size)?;

        let backend = record.backend;
        self.backend.texture_read_data(backend, offset, size)
    }

    /// Synchronously read the pixel at (x, y) of layer 0
    pub fn texture_read_pixel(&mut self, handle: TextureHandle, x: u32, y: u32) -> Galaxy3dResult<[u8; 4]> {
        let record = record(&self.textures, handle)?;
        if x >= record.desc.width || y >= record.desc.height {
            crate::engine_bail_arg!(SOURCE,
                "Pixel ({}, {}) is outside {} ({}x{})", x, y, handle, record.desc.width, record.desc.height);
        }

        let backend = record.backend;
        self.backend.texture_read_pixel(backend, x, y)
    }

    /// Recreate a texture at a new size; contents are lost
    pub fn texture_resize(&mut self, handle: TextureHandle, width: u32, height: u32) -> Galaxy3dResult<()> {
        let backend = record(&self.textures, handle)?.backend;
        if width == 0 || height == 0 {
            crate::engine_bail_arg!(SOURCE, "Cannot resize {} to {}x{}", handle, width, height);
        }

        self.backend.texture_resize(backend, width, height)?;
        if let Some(record) = self.textures.get_mut(handle) {
            record.desc.width = width;
            record.desc.height = height;
            record.desc.mip_levels = record.desc.mip_levels.min(TextureDesc::max_mip_levels(width, height));
        }
        Ok(())
    }

    /// Handle of the texture registered under `name`
    pub fn texture_handle_get(&self, name: &str) -> Option<TextureHandle> {
        self.textures.lookup(name)
    }

    pub fn texture_info(&self, handle: TextureHandle) -> Galaxy3dResult<&TextureDesc> {
        Ok(&record(&self.textures, handle)?.desc)
    }

    pub fn texture_name(&self, handle: TextureHandle) -> Option<&str> {
        self.textures.name(handle)
    }

    /// Clear a colour texture with the current clear colour
    pub fn clear_colour_texture(&mut self, handle: TextureHandle) -> Galaxy3dResult<()> {
        let record = record(&self.textures, handle)?;
        if record.desc.is_depth() {
            crate::engine_bail_arg!(SOURCE, "{} is a depth texture, not a colour texture", handle);
        }
        let backend = record.backend;
        self.backend.clear_colour(backend)
    }

    /// Clear a depth-stencil texture with the current clear depth and stencil
    pub fn clear_depth_stencil(&mut self, handle: TextureHandle) -> Galaxy3dResult<()> {
        let record = record(&self.textures, handle)?;
        if !record.desc.is_depth() {
            crate::engine_bail_arg!(SOURCE, "{} is not a depth-stencil texture", handle);
        }
        let backend = record.backend;
        self.backend.clear_depth_stencil(backend)
    }

    /// Resolve a texture handle to its backend id
    pub(super) fn texture_backend(&self, handle: TextureHandle) -> Galaxy3dResult<BackendResource> {
        Ok(record(&self.textures, handle)?.backend)
    }

    // ===== DEFAULT TEXTURES =====

    /// Point a default texture slot at `handle`
    pub fn default_texture_register(&mut self, kind: DefaultTexture, handle: TextureHandle) -> Galaxy3dResult<()> {
        record(&self.textures, handle)?;
        self.default_textures[kind.index()] = handle;
        Ok(())
    }

    pub fn default_texture_get(&self, kind: DefaultTexture) -> TextureHandle {
        self.default_textures[kind.index()]
    }

    pub(super) fn create_default_textures(&mut self) -> Galaxy3dResult<()> {
        for kind in DefaultTexture::ALL {
            let (desc, pixels) = kind.built_in();
            let handle = self.texture_create(kind.name(), desc, Some(&pixels))?;
            self.default_textures[kind.index()] = handle;
        }
        Ok(())
    }
}

fn check_bounds(handle: TextureHandle, desc: &TextureDesc, offset: u64, size: u64) -> Galaxy3dResult<()> {
    match offset.checked_add(size) {
        Some(end) if end <= desc.size() => Ok(()),
        _ => {
            crate::engine_bail_arg!(SOURCE,
                "Range [{}, +{}) is outside {} ({} bytes)", offset, size, handle, desc.size());
        }
    }
}
