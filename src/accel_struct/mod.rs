use ash::vk;
use smallvec::{smallvec, SmallVec};

use crate::geometry::{Material, SphereRecord, TriangleRecord};

mod list;
mod sphere;
mod triangles;

pub use list::BuildInputList;
pub use sphere::{SphereBuildInput, SphereGeometry};
pub use triangles::{TriangleBuildInput, TriangleGeometry};

/// Any-hit is disabled unless the application asks for it.
pub const DEFAULT_GEOMETRY_FLAGS: vk::GeometryFlagsKHR = vk::GeometryFlagsKHR::OPAQUE;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Sphere,
    Triangle,
}

/// Where the builder finds one geometry's data and how to walk it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryDescriptor {
    Spheres(SphereGeometry),
    Triangles(TriangleGeometry),
}

impl GeometryDescriptor {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            GeometryDescriptor::Spheres(_) => PrimitiveKind::Sphere,
            GeometryDescriptor::Triangles(_) => PrimitiveKind::Triangle,
        }
    }
    /// Number of primitives the builder will create for this geometry.
    pub fn primitive_count(&self) -> u32 {
        match self {
            GeometryDescriptor::Spheres(spheres) => spheres.num_vertices,
            GeometryDescriptor::Triangles(triangles) => triangles.num_triangles,
        }
    }
    /// Number of shader binding table records, and therefore flag entries, for this geometry.
    pub fn num_sbt_records(&self) -> u32 {
        1
    }
    pub fn build_range(&self) -> vk::AccelerationStructureBuildRangeInfoKHR {
        vk::AccelerationStructureBuildRangeInfoKHR {
            primitive_count: self.primitive_count(),
            primitive_offset: 0,
            first_vertex: 0,
            transform_offset: 0,
        }
    }
}

/// Output of [`PrimitiveBuildInput::build`]: one descriptor and its per-record flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildEntry {
    pub descriptor: GeometryDescriptor,
    /// Always `descriptor.num_sbt_records()` entries long.
    pub flags: SmallVec<[vk::GeometryFlagsKHR; 1]>,
}

impl BuildEntry {
    pub(crate) fn new(descriptor: GeometryDescriptor, flags: vk::GeometryFlagsKHR) -> Self {
        let entry = Self {
            descriptor,
            flags: smallvec![flags],
        };
        debug_assert_eq!(entry.flags.len(), entry.descriptor.num_sbt_records() as usize);
        entry
    }

    /// The Vulkan form of this entry.
    ///
    /// Core Vulkan has no analytic sphere geometry, so sphere entries return `None`
    /// and are left to builders that understand [`SphereGeometry`].
    pub fn to_vk(
        &self,
    ) -> Option<(
        vk::AccelerationStructureGeometryKHR,
        vk::AccelerationStructureBuildRangeInfoKHR,
    )> {
        match &self.descriptor {
            GeometryDescriptor::Triangles(triangles) => Some((
                triangles.to_vk(self.flags[0]),
                self.descriptor.build_range(),
            )),
            GeometryDescriptor::Spheres(_) => None,
        }
    }
}

/// A group of primitives uploaded to the device, ready to be described to a builder.
pub trait PrimitiveBuildInput {
    fn kind(&self) -> PrimitiveKind;
    /// Describes the uploaded geometry. Never touches device memory.
    fn build(&self) -> BuildEntry;
    fn material(&self) -> &Material;
}

#[derive(Debug)]
pub enum BuildInput {
    Sphere(SphereBuildInput),
    Triangle(TriangleBuildInput),
}

impl BuildInput {
    /// The sphere record, or `None` if this input is a triangle mesh.
    pub fn sphere_record(&self) -> Option<&SphereRecord> {
        match self {
            BuildInput::Sphere(sphere) => Some(sphere.record()),
            BuildInput::Triangle(_) => None,
        }
    }
    /// The mesh record, or `None` if this input is a sphere.
    pub fn triangle_record(&self) -> Option<&TriangleRecord> {
        match self {
            BuildInput::Triangle(triangles) => Some(triangles.record()),
            BuildInput::Sphere(_) => None,
        }
    }
}

impl PrimitiveBuildInput for BuildInput {
    fn kind(&self) -> PrimitiveKind {
        match self {
            BuildInput::Sphere(sphere) => sphere.kind(),
            BuildInput::Triangle(triangles) => triangles.kind(),
        }
    }
    fn build(&self) -> BuildEntry {
        match self {
            BuildInput::Sphere(sphere) => sphere.build(),
            BuildInput::Triangle(triangles) => triangles.build(),
        }
    }
    fn material(&self) -> &Material {
        match self {
            BuildInput::Sphere(sphere) => sphere.material(),
            BuildInput::Triangle(triangles) => triangles.material(),
        }
    }
}

impl From<SphereBuildInput> for BuildInput {
    fn from(sphere: SphereBuildInput) -> Self {
        BuildInput::Sphere(sphere)
    }
}

impl From<TriangleBuildInput> for BuildInput {
    fn from(triangles: TriangleBuildInput) -> Self {
        BuildInput::Triangle(triangles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::HostAllocator;
    use glam::{UVec3, Vec3};

    #[test]
    fn test_record_accessors_match_variant() {
        let allocator = HostAllocator::new();
        let sphere: BuildInput =
            SphereBuildInput::new(&allocator, Vec3::ZERO, 1.0, Material::default())
                .unwrap()
                .into();
        let mesh: BuildInput = TriangleBuildInput::new(
            &allocator,
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![UVec3::new(0, 1, 2)],
            Material::default(),
        )
        .unwrap()
        .into();

        assert_eq!(sphere.kind(), PrimitiveKind::Sphere);
        assert!(sphere.sphere_record().is_some());
        assert!(sphere.triangle_record().is_none());

        assert_eq!(mesh.kind(), PrimitiveKind::Triangle);
        assert!(mesh.triangle_record().is_some());
        assert!(mesh.sphere_record().is_none());
    }

    #[test]
    fn test_flags_match_sbt_records() {
        let allocator = HostAllocator::new();
        let sphere: BuildInput = SphereBuildInput::new(&allocator, Vec3::ZERO, 1.0, Material::default())
            .unwrap()
            .with_geometry_flags(vk::GeometryFlagsKHR::NO_DUPLICATE_ANY_HIT_INVOCATION)
            .into();
        let entry = sphere.build();
        assert_eq!(entry.descriptor.kind(), PrimitiveKind::Sphere);
        assert_eq!(entry.flags.len(), entry.descriptor.num_sbt_records() as usize);
        assert_eq!(
            entry.flags[0],
            vk::GeometryFlagsKHR::NO_DUPLICATE_ANY_HIT_INVOCATION
        );
        assert!(entry.to_vk().is_none());
    }
}
