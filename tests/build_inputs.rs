use std::sync::Arc;

use accel_inputs::{
    resources::HostAllocator, BuildInput, BuildInputList, GeometryDescriptor, Material,
    MaterialKind, PrimitiveBuildInput, PrimitiveKind, SphereBuildInput, TriangleBuildInput,
};
use ash::vk;
use glam::{UVec3, Vec3};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

#[test]
fn sphere_scene_values_round_trip() {
    init_logging();
    let allocator = HostAllocator::new();
    let sphere = SphereBuildInput::new(
        &allocator,
        Vec3::new(0.0, 0.0, -1.0),
        0.5,
        Material {
            kind: MaterialKind::Diffuse,
            emission: Vec3::ZERO,
            diffuse_color: Vec3::new(0.8, 0.3, 0.3),
            fuzz: 0.0,
            eta: 0.0,
        },
    )
    .unwrap();
    let input = BuildInput::from(sphere);

    assert_eq!(input.kind(), PrimitiveKind::Sphere);
    let record = input.sphere_record().unwrap();
    assert_eq!(record.center, Vec3::new(0.0, 0.0, -1.0));
    assert_eq!(record.radius, 0.5);
    assert_eq!(record.material.kind, MaterialKind::Diffuse);
    assert_eq!(record.material.emission, Vec3::ZERO);
    assert_eq!(record.material.diffuse_color, Vec3::new(0.8, 0.3, 0.3));
    assert_eq!(record.material.fuzz, 0.0);
    assert_eq!(record.material.eta, 0.0);

    assert_eq!(input.build().descriptor.primitive_count(), 1);
}

#[test]
fn single_triangle_descriptor() {
    init_logging();
    let allocator = HostAllocator::new();
    let mesh = TriangleBuildInput::new(
        &allocator,
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        vec![UVec3::new(0, 1, 2)],
        Material::diffuse(Vec3::splat(0.5)),
    )
    .unwrap();

    match mesh.build().descriptor {
        GeometryDescriptor::Triangles(triangles) => {
            assert_eq!(triangles.num_vertices, 3);
            assert_eq!(triangles.num_triangles, 1);
            assert_eq!(triangles.vertex_format, vk::Format::R32G32B32_SFLOAT);
        }
        other => panic!("unexpected descriptor: {:?}", other),
    }
}

#[test]
fn build_is_idempotent() {
    init_logging();
    let allocator = HostAllocator::new();
    let sphere = SphereBuildInput::new(&allocator, Vec3::X, 1.0, Material::default()).unwrap();
    let mesh = TriangleBuildInput::new(
        &allocator,
        vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        vec![UVec3::new(0, 1, 2)],
        Material::default(),
    )
    .unwrap();
    let used = allocator.used_bytes();

    assert_eq!(sphere.build(), sphere.build());
    assert_eq!(mesh.build(), mesh.build());
    // Building never allocates or re-uploads.
    assert_eq!(allocator.used_bytes(), used);
    assert_eq!(allocator.live_allocations(), 4);
}

#[test]
fn list_emits_descriptors_in_insertion_order() {
    init_logging();
    let allocator = HostAllocator::new();
    let ground: Arc<BuildInput> = Arc::new(
        TriangleBuildInput::new(
            &allocator,
            vec![
                Vec3::new(-10.0, 0.0, -10.0),
                Vec3::new(10.0, 0.0, -10.0),
                Vec3::new(10.0, 0.0, 10.0),
                Vec3::new(-10.0, 0.0, 10.0),
            ],
            vec![UVec3::new(0, 1, 2), UVec3::new(0, 2, 3)],
            Material::diffuse(Vec3::splat(0.5)),
        )
        .unwrap()
        .into(),
    );
    let glass: Arc<BuildInput> = Arc::new(
        SphereBuildInput::new(&allocator, Vec3::Y, 1.0, Material::dielectric(1.5))
            .unwrap()
            .into(),
    );
    let light: Arc<BuildInput> = Arc::new(
        SphereBuildInput::new(
            &allocator,
            Vec3::new(0.0, 5.0, 0.0),
            0.25,
            Material::emissive(Vec3::splat(10.0)),
        )
        .unwrap()
        .into(),
    );

    let mut list = BuildInputList::new();
    list.add(ground.clone());
    list.add(glass.clone());
    list.add(light.clone());

    let entries = list.build();
    let kinds: Vec<_> = entries.iter().map(|entry| entry.descriptor.kind()).collect();
    assert_eq!(
        kinds,
        [
            PrimitiveKind::Triangle,
            PrimitiveKind::Sphere,
            PrimitiveKind::Sphere
        ]
    );
    assert_eq!(entries[0], ground.build());
    assert_eq!(entries[1], glass.build());
    assert_eq!(entries[2], light.build());
    for entry in &entries {
        assert_eq!(entry.flags.len(), entry.descriptor.num_sbt_records() as usize);
    }

    let materials = list.material_records();
    assert_eq!(materials.len(), 3);
    assert_eq!(materials[2].emission, [10.0; 3]);

    list.clear();
    assert!(list.build().is_empty());
    assert_eq!(glass.sphere_record().unwrap().material.eta, 1.5);
    assert_eq!(allocator.live_allocations(), 6);

    drop((ground, glass, light));
    assert_eq!(allocator.live_allocations(), 0);
}
