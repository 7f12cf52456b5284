use ash::vk;

use crate::accel_struct::PrimitiveKind;

/// Failure to place data in device memory.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("device memory allocation failed: {0}")]
    Allocation(#[from] gpu_alloc::AllocationError),
    #[error("failed to write device memory: {0}")]
    Map(#[from] gpu_alloc::MapError),
    #[error("vulkan error: {0}")]
    Vulkan(#[from] vk::Result),
    #[error("out of device memory: requested {requested} bytes, {available} available")]
    OutOfDeviceMemory {
        requested: vk::DeviceSize,
        available: vk::DeviceSize,
    },
}

/// Failure to construct a build input. No partially constructed input is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum BuildInputError {
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error("{0:?} build input has no elements")]
    EmptyGeometry(PrimitiveKind),
    #[error("triangle {triangle} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },
}
