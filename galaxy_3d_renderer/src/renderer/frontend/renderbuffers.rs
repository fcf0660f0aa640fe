/// Renderbuffer operations of the frontend

use slotmap::SlotMap;

use super::{RendererFrontend, SOURCE};
use crate::error::Galaxy3dResult;
use crate::renderer::renderbuffer::{
    Renderbuffer, RenderbufferHandle, RenderbufferInfo, RenderbufferTrackType, RenderbufferType,
};

/// Chunk size used when zeroing a buffer on `renderbuffer_clear`
const ZERO_CHUNK_SIZE: u64 = 64 * 1024;

fn lookup(
    renderbuffers: &SlotMap<RenderbufferHandle, Renderbuffer>,
    handle: RenderbufferHandle,
) -> Galaxy3dResult<&Renderbuffer> {
    match renderbuffers.get(handle) {
        Some(renderbuffer) => Ok(renderbuffer),
        None => {
            crate::engine_bail_resource!(SOURCE, "Renderbuffer {:?} does not exist (destroyed or never created)", handle);
        }
    }
}

fn lookup_mut(
    renderbuffers: &mut SlotMap<RenderbufferHandle, Renderbuffer>,
    handle: RenderbufferHandle,
) -> Galaxy3dResult<&mut Renderbuffer> {
    match renderbuffers.get_mut(handle) {
        Some(renderbuffer) => Ok(renderbuffer),
        None => {
            crate::engine_bail_resource!(SOURCE, "Renderbuffer {:?} does not exist (destroyed or never created)", handle);
        }
    }
}

impl RendererFrontend {
    /// Create a renderbuffer and its backend buffer
    ///
    /// Nothing is kept if the backend fails.
    pub fn renderbuffer_create(
        &mut self,
        name: &str,
        buffer_type: RenderbufferType,
        total_size: u64,
        track_type: RenderbufferTrackType,
    ) -> Galaxy3dResult<RenderbufferHandle> {
        if total_size == 0 {
            crate::engine_bail_arg!(SOURCE, "Renderbuffer '{}' must have a non-zero size", name);
        }

        let backend = self.backend.renderbuffer_create(name, buffer_type, total_size)?;
        let handle = self.renderbuffers.insert(Renderbuffer::new(name, buffer_type, total_size, track_type, backend));

        crate::engine_debug!(SOURCE,
            "Renderbuffer '{}' created ({:?}, {} bytes, {:?} tracking)", name, buffer_type, total_size, track_type);
        Ok(handle)
    }

    /// Destroy a renderbuffer immediately, dropping its pending deletions
    pub fn renderbuffer_destroy(&mut self, handle: RenderbufferHandle) -> Galaxy3dResult<()> {
        lookup(&self.renderbuffers, handle)?;
        if let Some(renderbuffer) = self.renderbuffers.remove(handle) {
            self.backend.renderbuffer_destroy(renderbuffer.backend_resource());
            crate::engine_debug!(SOURCE, "Renderbuffer '{}' destroyed", renderbuffer.name());
        }
        Ok(())
    }

    /// Read-only view of a renderbuffer
    pub fn renderbuffer_get(&self, handle: RenderbufferHandle) -> Galaxy3dResult<&Renderbuffer> {
        lookup(&self.renderbuffers, handle)
    }

    pub fn renderbuffer_info(&self, handle: RenderbufferHandle) -> Galaxy3dResult<RenderbufferInfo> {
        Ok(lookup(&self.renderbuffers, handle)?.info())
    }

    pub fn renderbuffer_free_space(&self, handle: RenderbufferHandle) -> Galaxy3dResult<u64> {
        Ok(lookup(&self.renderbuffers, handle)?.free_space())
    }

    /// Reserve `size` bytes, returning their offset
    pub fn renderbuffer_allocate(&mut self, handle: RenderbufferHandle, size: u64) -> Galaxy3dResult<u64> {
        lookup_mut(&mut self.renderbuffers, handle)?.allocate(size)
    }

    /// Queue `[offset, offset + size)` for release `MAX_FRAMES_IN_FLIGHT` frames from now
    pub fn renderbuffer_free(&mut self, handle: RenderbufferHandle, size: u64, offset: u64) -> Galaxy3dResult<()> {
        lookup_mut(&mut self.renderbuffers, handle)?.queue_free(offset, size)
    }

    /// Grow a renderbuffer, keeping its contents and allocations
    pub fn renderbuffer_resize(&mut self, handle: RenderbufferHandle, new_total_size: u64) -> Galaxy3dResult<()> {
        let backend = &mut self.backend;
        let renderbuffer = lookup_mut(&mut self.renderbuffers, handle)?;
        renderbuffer.resize_with(new_total_size, |resource, old_size, new_size| {
            backend.renderbuffer_resize(resource, old_size, new_size)
        })
    }

    /// Forget every allocation and pending deletion of a renderbuffer
    ///
    /// With `zero_memory` the contents are overwritten with zeros outside of
    /// the frame workload.
    pub fn renderbuffer_clear(&mut self, handle: RenderbufferHandle, zero_memory: bool) -> Galaxy3dResult<()> {
        let renderbuffer = lookup_mut(&mut self.renderbuffers, handle)?;
        renderbuffer.reset();

        if zero_memory {
            let resource = renderbuffer.backend_resource();
            let total_size = renderbuffer.total_size();
            let zeros = vec![0u8; ZERO_CHUNK_SIZE.min(total_size) as usize];
            let mut offset = 0;
            while offset < total_size {
                let len = ZERO_CHUNK_SIZE.min(total_size - offset) as usize;
                self.backend.renderbuffer_load_range(resource, offset, &zeros[..len], false)?;
                offset += len as u64;
            }
        }
        Ok(())
    }

    /// Upload `data` at `offset`
    pub fn renderbuffer_load_range(
        &mut self,
        handle: RenderbufferHandle,
        offset: u64,
        data: &[u8],
        include_in_frame_workload: bool,
    ) -> Galaxy3dResult<()> {
        let renderbuffer = lookup(&self.renderbuffers, handle)?;
        if data.is_empty() {
            crate::engine_bail_arg!(SOURCE, "Empty load into renderbuffer '{}'", renderbuffer.name());
        }
        renderbuffer.check_range(offset, data.len() as u64)?;

        let resource = renderbuffer.backend_resource();
        self.backend.renderbuffer_load_range(resource, offset, data, include_in_frame_workload)
    }

    /// Copy `size` bytes between two renderbuffers (or within one)
    #[allow(clippy::too_many_arguments)]
    pub fn renderbuffer_copy_range(
        &mut self,
        source: RenderbufferHandle,
        source_offset: u64,
        dest: RenderbufferHandle,
        dest_offset: u64,
        size: u64,
        include_in_frame_workload: bool,
    ) -> Galaxy3dResult<()> {
        if size == 0 {
            crate::engine_bail_arg!(SOURCE, "Zero-size renderbuffer copy");
        }
        let src = lookup(&self.renderbuffers, source)?;
        src.check_range(source_offset, size)?;
        let dst = lookup(&self.renderbuffers, dest)?;
        dst.check_range(dest_offset, size)?;

        let (src, dst) = (src.backend_resource(), dst.backend_resource());
        self.backend.renderbuffer_copy_range(src, source_offset, dst, dest_offset, size, include_in_frame_workload)
    }

    /// Draw `element_count` elements starting at byte `offset`
    pub fn renderbuffer_draw(
        &mut self,
        handle: RenderbufferHandle,
        offset: u64,
        element_count: u32,
        include_in_frame_workload: bool,
    ) -> Galaxy3dResult<()> {
        let renderbuffer = lookup(&self.renderbuffers, handle)?;
        if offset >= renderbuffer.total_size() {
            crate::engine_bail_arg!(SOURCE,
                "Draw offset {} is outside renderbuffer '{}' (size {})",
                offset, renderbuffer.name(), renderbuffer.total_size());
        }

        let resource = renderbuffer.backend_resource();
        self.backend.renderbuffer_draw(resource, offset, element_count, include_in_frame_workload)?;
        self.draw_calls += 1;
        Ok(())
    }

    pub fn renderbuffer_bind(&mut self, handle: RenderbufferHandle, offset: u64) -> Galaxy3dResult<()> {
        let renderbuffer = lookup(&self.renderbuffers, handle)?;
        renderbuffer.check_range(offset, 0)?;
        let resource = renderbuffer.backend_resource();
        self.backend.renderbuffer_bind(resource, offset)
    }

    pub fn renderbuffer_unbind(&mut self, handle: RenderbufferHandle) -> Galaxy3dResult<()> {
        let resource = lookup(&self.renderbuffers, handle)?.backend_resource();
        self.backend.renderbuffer_unbind(resource)
    }

    /// Map a range for CPU access
    pub fn renderbuffer_map_memory(&mut self, handle: RenderbufferHandle, offset: u64, size: u64) -> Galaxy3dResult<()> {
        let renderbuffer = lookup(&self.renderbuffers, handle)?;
        renderbuffer.check_range(offset, size)?;
        let resource = renderbuffer.backend_resource();
        self.backend.renderbuffer_map_memory(resource, offset, size)
    }

    pub fn renderbuffer_unmap_memory(&mut self, handle: RenderbufferHandle, offset: u64, size: u64) -> Galaxy3dResult<()> {
        let renderbuffer = lookup(&self.renderbuffers, handle)?;
        renderbuffer.check_range(offset, size)?;
        let resource = renderbuffer.backend_resource();
        self.backend.renderbuffer_unmap_memory(resource, offset, size);
        Ok(())
    }

    /// Make CPU writes to a mapped range visible to the device
    pub fn renderbuffer_flush(&mut self, handle: RenderbufferHandle, offset: u64, size: u64) -> Galaxy3dResult<()> {
        let renderbuffer = lookup(&self.renderbuffers, handle)?;
        renderbuffer.check_range(offset, size)?;
        let resource = renderbuffer.backend_resource();
        self.backend.renderbuffer_flush(resource, offset, size)
    }

    /// Synchronously read `size` bytes at `offset` (may stall)
    pub fn renderbuffer_read(&mut self, handle: RenderbufferHandle, offset: u64, size: u64) -> Galaxy3dResult<Vec<u8>> {
        let renderbuffer = lookup(&self.renderbuffers, handle)?;
        if size == 0 {
            crate::engine_bail_arg!(SOURCE, "Zero-size read from renderbuffer '{}'", renderbuffer.name());
        }
        renderbuffer.check_range(offset, size)?;
        let resource = renderbuffer.backend_resource();
        self.backend.renderbuffer_read(resource, offset, size)
    }

    // ===== GLOBAL BUFFERS =====

    /// Global vertex buffer shared by all geometry
    pub fn vertex_buffer(&self) -> RenderbufferHandle {
        self.vertex_buffer
    }

    /// Global index buffer shared by all geometry
    pub fn index_buffer(&self) -> RenderbufferHandle {
        self.index_buffer
    }

    /// Global material storage buffer
    pub fn material_storage_buffer(&self) -> RenderbufferHandle {
        self.material_storage
    }

    pub(super) fn create_global_buffers(&mut self) -> Galaxy3dResult<()> {
        let (vertex_size, index_size, material_size) = (
            self.config.vertex_buffer_size,
            self.config.index_buffer_size,
            self.config.material_storage_size,
        );
        self.vertex_buffer = self.renderbuffer_create(
            "__global_vertex_buffer__", RenderbufferType::Vertex, vertex_size, RenderbufferTrackType::Freelist)?;
        self.index_buffer = self.renderbuffer_create(
            "__global_index_buffer__", RenderbufferType::Index, index_size, RenderbufferTrackType::Freelist)?;
        self.material_storage = self.renderbuffer_create(
            "__global_material_storage__", RenderbufferType::Storage, material_size, RenderbufferTrackType::Freelist)?;
        Ok(())
    }

    // ===== MAINTENANCE =====

    /// One deferred-deletion pass over every renderbuffer
    ///
    /// Returns the number of ranges released. Run at the start of `begin`.
    pub(crate) fn renderbuffers_process_deletions(&mut self) -> usize {
        self.renderbuffers
            .values_mut()
            .map(|renderbuffer| renderbuffer.process_deletions().released.len())
            .sum()
    }
}
