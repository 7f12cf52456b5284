use ash::vk;
use glam::{UVec3, Vec3};

use super::{
    BuildEntry, GeometryDescriptor, PrimitiveBuildInput, PrimitiveKind, DEFAULT_GEOMETRY_FLAGS,
};
use crate::{
    geometry::{Material, TriangleRecord},
    resources::{DeviceSlice, MemoryAllocator},
    BuildInputError,
};

/// Device addresses and strides of an indexed triangle mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriangleGeometry {
    pub vertex_data: vk::DeviceAddress,
    pub vertex_format: vk::Format,
    pub vertex_stride: vk::DeviceSize,
    pub num_vertices: u32,
    pub index_data: vk::DeviceAddress,
    pub index_type: vk::IndexType,
    /// Stride between index triples, not between single indices.
    pub index_stride: vk::DeviceSize,
    pub num_triangles: u32,
}

impl TriangleGeometry {
    pub fn to_vk(&self, flags: vk::GeometryFlagsKHR) -> vk::AccelerationStructureGeometryKHR {
        let triangles = vk::AccelerationStructureGeometryTrianglesDataKHR::builder()
            .vertex_format(self.vertex_format)
            .vertex_data(vk::DeviceOrHostAddressConstKHR {
                device_address: self.vertex_data,
            })
            .vertex_stride(self.vertex_stride)
            // maxVertex is the highest addressable index, not the count.
            .max_vertex(self.num_vertices.saturating_sub(1))
            .index_type(self.index_type)
            .index_data(vk::DeviceOrHostAddressConstKHR {
                device_address: self.index_data,
            })
            .build();
        vk::AccelerationStructureGeometryKHR::builder()
            .geometry_type(vk::GeometryTypeKHR::TRIANGLES)
            .geometry(vk::AccelerationStructureGeometryDataKHR { triangles })
            .flags(flags)
            .build()
    }
}

/// An indexed triangle mesh.
#[derive(Debug)]
pub struct TriangleBuildInput {
    record: TriangleRecord,
    vertices: DeviceSlice<Vec3>,
    indices: DeviceSlice<UVec3>,
    flags: vk::GeometryFlagsKHR,
}

impl TriangleBuildInput {
    pub fn new<A: MemoryAllocator + ?Sized>(
        allocator: &A,
        vertices: Vec<Vec3>,
        indices: Vec<UVec3>,
        material: Material,
    ) -> Result<Self, BuildInputError> {
        Self::from_record(
            allocator,
            TriangleRecord {
                vertices,
                indices,
                material,
            },
        )
    }

    /// Uploads the mesh after checking that it is non-empty and every index is in range.
    pub fn from_record<A: MemoryAllocator + ?Sized>(
        allocator: &A,
        record: TriangleRecord,
    ) -> Result<Self, BuildInputError> {
        if record.vertices.is_empty() || record.indices.is_empty() {
            return Err(BuildInputError::EmptyGeometry(PrimitiveKind::Triangle));
        }
        record.validate()?;
        let vertices = DeviceSlice::upload(allocator, &record.vertices)?;
        let indices = DeviceSlice::upload(allocator, &record.indices)?;
        tracing::debug!(
            num_vertices = record.vertices.len(),
            num_triangles = record.indices.len(),
            material = ?record.material.kind,
            "triangle build input"
        );
        Ok(Self {
            record,
            vertices,
            indices,
            flags: DEFAULT_GEOMETRY_FLAGS,
        })
    }

    pub fn with_geometry_flags(mut self, flags: vk::GeometryFlagsKHR) -> Self {
        self.flags = flags;
        self
    }

    pub fn record(&self) -> &TriangleRecord {
        &self.record
    }
    pub fn vertex_buffer(&self) -> &DeviceSlice<Vec3> {
        &self.vertices
    }
    pub fn index_buffer(&self) -> &DeviceSlice<UVec3> {
        &self.indices
    }
}

impl PrimitiveBuildInput for TriangleBuildInput {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Triangle
    }

    fn build(&self) -> BuildEntry {
        let geometry = TriangleGeometry {
            vertex_data: self.vertices.device_address(),
            vertex_format: vk::Format::R32G32B32_SFLOAT,
            vertex_stride: self.vertices.stride(),
            num_vertices: self.vertices.len() as u32,
            index_data: self.indices.device_address(),
            index_type: vk::IndexType::UINT32,
            index_stride: self.indices.stride(),
            num_triangles: self.indices.len() as u32,
        };
        tracing::trace!(?geometry, "build triangle descriptor");
        BuildEntry::new(GeometryDescriptor::Triangles(geometry), self.flags)
    }

    fn material(&self) -> &Material {
        &self.record.material
    }
}
