/// Geometry upload and draw through the global vertex/index buffers

use super::{RendererFrontend, SOURCE};
use crate::error::Galaxy3dResult;
use crate::renderer::geometry::{next_generation, Geometry, GeometryRenderData, INVALID_ID_U16};
use crate::renderer::renderbuffer::RenderbufferHandle;

impl RendererFrontend {
    /// Upload a geometry's vertices and indices
    ///
    /// The first upload allocates ranges in the global buffers; later uploads
    /// reuse the same ranges and are refused when the vertex or index data
    /// changed size. Every successful upload bumps `generation`.
    pub fn geometry_upload(&mut self, geometry: &mut Geometry) -> Galaxy3dResult<()> {
        let vertex_size = geometry.vertex_size();
        let index_size = geometry.index_size();
        if vertex_size == 0 {
            crate::engine_bail_arg!(SOURCE, "Geometry '{}' has no vertex data", geometry.name);
        }

        let first_upload = !geometry.is_uploaded();
        if !first_upload && !geometry.matches_allocation() {
            let (allocated_vertex, allocated_index) = geometry.allocated_sizes();
            crate::engine_bail_arg!(SOURCE,
                "Geometry '{}' re-upload changes its size ({}/{} bytes, {}/{} allocated)",
                geometry.name, vertex_size, index_size, allocated_vertex, allocated_index);
        }
        if first_upload {
            let vertex_offset = self.renderbuffer_allocate(self.vertex_buffer, vertex_size)?;
            let index_offset = if index_size > 0 {
                match self.renderbuffer_allocate(self.index_buffer, index_size) {
                    Ok(offset) => offset,
                    Err(error) => {
                        self.release_range(self.vertex_buffer, vertex_size, vertex_offset);
                        return Err(error);
                    }
                }
            } else {
                0
            };
            geometry.vertex_buffer_offset = vertex_offset;
            geometry.index_buffer_offset = index_offset;
            geometry.allocated_vertex_size = vertex_size;
            geometry.allocated_index_size = index_size;
        }

        if let Err(error) = self.geometry_load(geometry) {
            if first_upload {
                self.release_range(self.vertex_buffer, vertex_size, geometry.vertex_buffer_offset);
                if index_size > 0 {
                    self.release_range(self.index_buffer, index_size, geometry.index_buffer_offset);
                }
                geometry.allocated_vertex_size = 0;
                geometry.allocated_index_size = 0;
            }
            return Err(error);
        }

        geometry.generation = next_generation(geometry.generation);
        crate::engine_trace!(SOURCE,
            "Geometry '{}' uploaded (generation {})", geometry.name, geometry.generation);
        Ok(())
    }

    /// Replace part of an uploaded geometry's vertex data
    ///
    /// `offset` is in bytes from the start of the geometry's vertices.
    pub fn geometry_vertex_update(&mut self, geometry: &mut Geometry, offset: u64, vertices: &[u8]) -> Galaxy3dResult<()> {
        if !geometry.is_uploaded() {
            crate::engine_bail_arg!(SOURCE, "Geometry '{}' must be uploaded before it is updated", geometry.name);
        }
        if !geometry.matches_allocation() {
            crate::engine_bail_arg!(SOURCE,
                "Geometry '{}' data changed size since upload and must be re-created", geometry.name);
        }
        let in_bounds = matches!(offset.checked_add(vertices.len() as u64), Some(end) if end <= geometry.allocated_vertex_size);
        if vertices.is_empty() || !in_bounds {
            crate::engine_bail_arg!(SOURCE,
                "Vertex update [{}, +{}) is outside geometry '{}' ({} bytes)",
                offset, vertices.len(), geometry.name, geometry.allocated_vertex_size);
        }

        self.renderbuffer_load_range(self.vertex_buffer, geometry.vertex_buffer_offset + offset, vertices, false)?;

        let start = offset as usize;
        geometry.vertices[start..start + vertices.len()].copy_from_slice(vertices);
        geometry.generation = next_generation(geometry.generation);
        Ok(())
    }

    /// Give a geometry's ranges back to the global buffers (deferred)
    ///
    /// Idempotent: a geometry that was never uploaded, or already destroyed,
    /// is left untouched. The ranges reserved at first upload are freed,
    /// whatever the current size of the CPU data.
    pub fn geometry_destroy(&mut self, geometry: &mut Geometry) -> Galaxy3dResult<()> {
        if !geometry.is_uploaded() {
            return Ok(());
        }

        let (vertex_size, index_size) = geometry.allocated_sizes();
        self.renderbuffer_free(self.vertex_buffer, vertex_size, geometry.vertex_buffer_offset)?;
        if index_size > 0 {
            self.renderbuffer_free(self.index_buffer, index_size, geometry.index_buffer_offset)?;
        }

        geometry.generation = INVALID_ID_U16;
        geometry.vertex_buffer_offset = 0;
        geometry.index_buffer_offset = 0;
        geometry.allocated_vertex_size = 0;
        geometry.allocated_index_size = 0;
        Ok(())
    }

    /// Draw one geometry from the global buffers
    ///
    /// Indexed when `index_count > 0`. Winding is flipped around the draw
    /// when `winding_inverted` is set.
    pub fn geometry_draw(&mut self, data: &GeometryRenderData) -> Galaxy3dResult<()> {
        let previous_winding = self.winding;
        if data.winding_inverted {
            self.winding_set(previous_winding.inverted());
        }

        let result = if data.index_count > 0 {
            self.renderbuffer_bind(self.vertex_buffer, data.vertex_buffer_offset)
                .and_then(|_| self.renderbuffer_draw(self.index_buffer, data.index_buffer_offset, data.index_count, true))
        } else {
            self.renderbuffer_draw(self.vertex_buffer, data.vertex_buffer_offset, data.vertex_count, true)
        };

        if data.winding_inverted {
            self.winding_set(previous_winding);
        }

        if result.is_ok() {
            let elements = if data.index_count > 0 { data.index_count } else { data.vertex_count };
            self.triangles += elements / 3;
        }
        result
    }

    fn geometry_load(&mut self, geometry: &Geometry) -> Galaxy3dResult<()> {
        self.renderbuffer_load_range(self.vertex_buffer, geometry.vertex_buffer_offset, &geometry.vertices, false)?;
        if !geometry.indices.is_empty() {
            let indices: &[u8] = bytemuck::cast_slice(&geometry.indices);
            self.renderbuffer_load_range(self.index_buffer, geometry.index_buffer_offset, indices, false)?;
        }
        Ok(())
    }

    fn release_range(&mut self, buffer: RenderbufferHandle, size: u64, offset: u64) {
        if let Err(error) = self.renderbuffer_free(buffer, size, offset) {
            crate::engine_warn!(SOURCE, "Could not give back range [{}, +{}): {}", offset, size, error);
        }
    }
}
