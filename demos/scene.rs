//! Builds the inputs for a small scene against the host allocator and prints
//! the descriptors a builder would receive.

use std::sync::Arc;

use accel_inputs::{
    resources::HostAllocator, BuildInput, BuildInputError, BuildInputList, Material,
    SphereBuildInput, TriangleBuildInput,
};
use glam::{UVec3, Vec3};

fn main() -> Result<(), BuildInputError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let allocator = HostAllocator::new();
    let mut list = BuildInputList::new();

    let ground = TriangleBuildInput::new(
        &allocator,
        vec![
            Vec3::new(-100.0, -0.5, -100.0),
            Vec3::new(100.0, -0.5, -100.0),
            Vec3::new(100.0, -0.5, 100.0),
            Vec3::new(-100.0, -0.5, 100.0),
        ],
        vec![UVec3::new(0, 1, 2), UVec3::new(0, 2, 3)],
        Material::diffuse(Vec3::new(0.8, 0.8, 0.0)),
    )?;
    list.add(Arc::new(BuildInput::from(ground)));

    for (center, material) in [
        (Vec3::new(0.0, 0.0, -1.0), Material::diffuse(Vec3::new(0.8, 0.3, 0.3))),
        (Vec3::new(-1.0, 0.0, -1.0), Material::dielectric(1.5)),
        (Vec3::new(1.0, 0.0, -1.0), Material::metal(Vec3::new(0.8, 0.6, 0.2), 0.3)),
        (Vec3::new(0.0, 2.0, -1.0), Material::emissive(Vec3::splat(4.0))),
    ] {
        let sphere = SphereBuildInput::new(&allocator, center, 0.5, material)?;
        list.add(Arc::new(BuildInput::from(sphere)));
    }

    for (index, entry) in list.build().iter().enumerate() {
        println!(
            "geometry {index}: {:?} primitives={} flags={:?}",
            entry.descriptor.kind(),
            entry.descriptor.primitive_count(),
            entry.flags.as_slice()
        );
    }
    println!(
        "{} allocations, {} bytes resident",
        allocator.live_allocations(),
        allocator.used_bytes()
    );
    Ok(())
}
