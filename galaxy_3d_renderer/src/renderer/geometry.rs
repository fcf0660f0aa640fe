/// Geometry records uploaded to the global vertex/index buffers

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};

/// "No id" value for `u32` identifiers (materials, picking ids)
pub const INVALID_ID: u32 = u32::MAX;

/// "Never uploaded" value of `Geometry::generation`
pub const INVALID_ID_U16: u16 = u16::MAX;

/// Standard 3D vertex layout (64 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex3d {
    pub position: Vec3,
    pub normal: Vec3,
    pub texcoord: Vec2,
    pub colour: Vec4,
    pub tangent: Vec4,
}

impl Vertex3d {
    /// Vertex with a position and texture coordinate, white colour
    pub fn new(position: Vec3, texcoord: Vec2) -> Self {
        Self {
            position,
            normal: Vec3::Z,
            texcoord,
            colour: Vec4::ONE,
            tangent: Vec4::new(1.0, 0.0, 0.0, 1.0),
        }
    }
}

/// CPU-side geometry and its location in the global buffers
///
/// `generation` is `INVALID_ID_U16` until the first `geometry_upload`.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub name: String,
    /// Size in bytes of one vertex
    pub vertex_element_size: u32,
    /// Raw vertex data (`vertex_count * vertex_element_size` bytes)
    pub vertices: Vec<u8>,
    pub indices: Vec<u32>,
    pub generation: u16,
    /// Byte offset of the vertices in the global vertex buffer
    pub vertex_buffer_offset: u64,
    /// Byte offset of the indices in the global index buffer
    pub index_buffer_offset: u64,
    /// Bytes reserved in the global vertex buffer at first upload
    pub(crate) allocated_vertex_size: u64,
    /// Bytes reserved in the global index buffer at first upload
    pub(crate) allocated_index_size: u64,
    pub extents_min: Vec3,
    pub extents_max: Vec3,
    pub center: Vec3,
}

impl Geometry {
    /// Geometry holding arbitrary vertex data
    pub fn new(name: &str, vertex_element_size: u32, vertices: Vec<u8>, indices: Vec<u32>) -> Self {
        Self {
            name: name.to_string(),
            vertex_element_size,
            vertices,
            indices,
            generation: INVALID_ID_U16,
            vertex_buffer_offset: 0,
            index_buffer_offset: 0,
            allocated_vertex_size: 0,
            allocated_index_size: 0,
            extents_min: Vec3::ZERO,
            extents_max: Vec3::ZERO,
            center: Vec3::ZERO,
        }
    }

    /// Geometry built from `Vertex3d`, with extents and center computed
    pub fn from_vertices(name: &str, vertices: &[Vertex3d], indices: Vec<u32>) -> Self {
        let mut geometry = Self::new(
            name,
            std::mem::size_of::<Vertex3d>() as u32,
            bytemuck::cast_slice(vertices).to_vec(),
            indices,
        );

        if let Some(first) = vertices.first() {
            let (min, max) = vertices.iter().fold(
                (first.position, first.position),
                |(min, max), v| (min.min(v.position), max.max(v.position)),
            );
            geometry.extents_min = min;
            geometry.extents_max = max;
            geometry.center = (min + max) * 0.5;
        }
        geometry
    }

    pub fn vertex_count(&self) -> u32 {
        if self.vertex_element_size == 0 {
            return 0;
        }
        (self.vertices.len() / self.vertex_element_size as usize) as u32
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Size in bytes of the vertex data
    pub fn vertex_size(&self) -> u64 {
        self.vertices.len() as u64
    }

    /// Size in bytes of the index data
    pub fn index_size(&self) -> u64 {
        self.indices.len() as u64 * std::mem::size_of::<u32>() as u64
    }

    /// Whether the geometry currently owns ranges in the global buffers
    pub fn is_uploaded(&self) -> bool {
        self.generation != INVALID_ID_U16
    }

    /// Bytes owned in the global vertex and index buffers (0 when not uploaded)
    pub fn allocated_sizes(&self) -> (u64, u64) {
        (self.allocated_vertex_size, self.allocated_index_size)
    }

    /// Whether the CPU data still fits the ranges reserved at first upload
    pub(crate) fn matches_allocation(&self) -> bool {
        self.vertex_size() == self.allocated_vertex_size && self.index_size() == self.allocated_index_size
    }

    /// Build the per-draw record for this geometry
    pub fn render_data(&self, model: Mat4, material: u32) -> GeometryRenderData {
        GeometryRenderData {
            model,
            material,
            unique_id: INVALID_ID,
            vertex_count: self.vertex_count(),
            vertex_element_size: self.vertex_element_size,
            vertex_buffer_offset: self.vertex_buffer_offset,
            index_count: self.index_count(),
            index_element_size: std::mem::size_of::<u32>() as u32,
            index_buffer_offset: self.index_buffer_offset,
            winding_inverted: model.determinant() < 0.0,
        }
    }
}

/// Everything a backend needs to draw one geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryRenderData {
    pub model: Mat4,
    /// Material id (`INVALID_ID` for none)
    pub material: u32,
    /// Picking id (`INVALID_ID` for none)
    pub unique_id: u32,
    pub vertex_count: u32,
    pub vertex_element_size: u32,
    pub vertex_buffer_offset: u64,
    pub index_count: u32,
    pub index_element_size: u32,
    pub index_buffer_offset: u64,
    /// Flip front-face winding while drawing (mirrored transforms)
    pub winding_inverted: bool,
}

/// Next generation value, skipping the "never uploaded" sentinel
pub(crate) fn next_generation(generation: u16) -> u16 {
    let next = generation.wrapping_add(1);
    if next == INVALID_ID_U16 { 0 } else { next }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "geometry_tests.rs"]
mod tests;
