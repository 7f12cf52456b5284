use ash::vk;
use glam::Vec3;

use super::{
    BuildEntry, GeometryDescriptor, PrimitiveBuildInput, PrimitiveKind, DEFAULT_GEOMETRY_FLAGS,
};
use crate::{
    geometry::{Material, SphereRecord},
    resources::{DeviceSlice, MemoryAllocator},
    BuildInputError,
};

/// Device addresses and strides of a sphere geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SphereGeometry {
    pub vertex_data: vk::DeviceAddress,
    pub vertex_stride: vk::DeviceSize,
    pub num_vertices: u32,
    pub radius_data: vk::DeviceAddress,
    pub radius_stride: vk::DeviceSize,
    /// When set, the first radius applies to every sphere.
    pub single_radius: bool,
}

/// A single analytic sphere.
#[derive(Debug)]
pub struct SphereBuildInput {
    record: SphereRecord,
    center: DeviceSlice<Vec3>,
    radius: DeviceSlice<f32>,
    flags: vk::GeometryFlagsKHR,
}

impl SphereBuildInput {
    pub fn new<A: MemoryAllocator + ?Sized>(
        allocator: &A,
        center: Vec3,
        radius: f32,
        material: Material,
    ) -> Result<Self, BuildInputError> {
        Self::from_record(
            allocator,
            SphereRecord {
                center,
                radius,
                material,
            },
        )
    }

    pub fn from_record<A: MemoryAllocator + ?Sized>(
        allocator: &A,
        record: SphereRecord,
    ) -> Result<Self, BuildInputError> {
        let center = DeviceSlice::upload(allocator, std::slice::from_ref(&record.center))?;
        // If this fails, `center` is dropped and its allocation released.
        let radius = DeviceSlice::upload(allocator, std::slice::from_ref(&record.radius))?;
        tracing::debug!(
            center = ?record.center,
            radius = record.radius,
            material = ?record.material.kind,
            "sphere build input"
        );
        Ok(Self {
            record,
            center,
            radius,
            flags: DEFAULT_GEOMETRY_FLAGS,
        })
    }

    pub fn with_geometry_flags(mut self, flags: vk::GeometryFlagsKHR) -> Self {
        self.flags = flags;
        self
    }

    pub fn record(&self) -> &SphereRecord {
        &self.record
    }
    pub fn center_buffer(&self) -> &DeviceSlice<Vec3> {
        &self.center
    }
    pub fn radius_buffer(&self) -> &DeviceSlice<f32> {
        &self.radius
    }
}

impl PrimitiveBuildInput for SphereBuildInput {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Sphere
    }

    fn build(&self) -> BuildEntry {
        let geometry = SphereGeometry {
            vertex_data: self.center.device_address(),
            vertex_stride: self.center.stride(),
            num_vertices: self.center.len() as u32,
            radius_data: self.radius.device_address(),
            radius_stride: self.radius.stride(),
            single_radius: false,
        };
        tracing::trace!(?geometry, "build sphere descriptor");
        BuildEntry::new(GeometryDescriptor::Spheres(geometry), self.flags)
    }

    fn material(&self) -> &Material {
        &self.record.material
    }
}
