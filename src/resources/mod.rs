use std::{fmt, marker::PhantomData, mem::size_of};

use ash::vk;
use bytemuck::Pod;

use crate::MemoryError;

pub mod alloc;
pub mod host;

pub use alloc::{Allocator, MemBuffer};
pub use host::HostAllocator;

/// An exclusively owned device allocation. Dropping it releases the memory.
pub trait DeviceMemory: Send + Sync + 'static {
    fn device_address(&self) -> vk::DeviceAddress;
    fn size(&self) -> vk::DeviceSize;
}

/// Something that can place bytes in device-resident memory.
pub trait MemoryAllocator {
    /// Allocates a buffer for `request` and copies `data` into it.
    ///
    /// The copy has completed when this returns. On failure nothing stays allocated.
    fn upload(
        &self,
        request: &BufferRequest<'_>,
        data: &[u8],
    ) -> Result<Box<dyn DeviceMemory>, MemoryError>;
}

pub struct BufferRequest<'a> {
    pub size: u64,
    /// If this value is 0, the memory will be allocated based on the buffer requirements.
    /// The actual alignment used on the allocation is buffer_request.alignment.max(buffer_requirements.alignment).
    pub alignment: u64,
    pub usage: vk::BufferUsageFlags,
    pub memory_usage: gpu_alloc::UsageFlags,
    pub sharing_mode: vk::SharingMode,
    pub queue_families: &'a [u32],
}

impl<'a> Default for BufferRequest<'a> {
    fn default() -> Self {
        Self {
            size: 0,
            alignment: 0,
            usage: vk::BufferUsageFlags::empty(),
            memory_usage: gpu_alloc::UsageFlags::empty(),
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            queue_families: &[],
        }
    }
}

impl BufferRequest<'static> {
    /// A host-written, device-addressable buffer read by acceleration structure builds.
    pub fn build_input(size: u64, alignment: u64) -> Self {
        Self {
            size,
            alignment,
            usage: vk::BufferUsageFlags::ACCELERATION_STRUCTURE_BUILD_INPUT_READ_ONLY_KHR
                | vk::BufferUsageFlags::SHADER_DEVICE_ADDRESS
                | vk::BufferUsageFlags::STORAGE_BUFFER,
            memory_usage: gpu_alloc::UsageFlags::UPLOAD
                | gpu_alloc::UsageFlags::FAST_DEVICE_ACCESS
                | gpu_alloc::UsageFlags::DEVICE_ADDRESS,
            ..Default::default()
        }
    }
}

/// A device copy of a slice of `T`.
pub struct DeviceSlice<T> {
    memory: Box<dyn DeviceMemory>,
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Pod> DeviceSlice<T> {
    pub fn upload<A: MemoryAllocator + ?Sized>(
        allocator: &A,
        items: &[T],
    ) -> Result<Self, MemoryError> {
        let bytes: &[u8] = bytemuck::cast_slice(items);
        let request = BufferRequest::build_input(bytes.len() as u64, std::mem::align_of::<T>() as u64);
        let memory = allocator.upload(&request, bytes)?;
        Ok(Self {
            memory,
            len: items.len(),
            _marker: PhantomData,
        })
    }
}

impl<T> DeviceSlice<T> {
    pub fn device_address(&self) -> vk::DeviceAddress {
        self.memory.device_address()
    }
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    pub fn stride(&self) -> vk::DeviceSize {
        size_of::<T>() as vk::DeviceSize
    }
    /// Size of the backing allocation in bytes.
    pub fn size_in_bytes(&self) -> vk::DeviceSize {
        self.memory.size()
    }
}

impl<T> fmt::Debug for DeviceSlice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSlice")
            .field("device_address", &self.device_address())
            .field("len", &self.len)
            .field("stride", &self.stride())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_upload_slice() {
        let allocator = HostAllocator::new();
        let points = [Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0)];
        let slice = DeviceSlice::upload(&allocator, &points).unwrap();
        assert_eq!(slice.len(), 2);
        assert_eq!(slice.stride(), 12);
        assert_eq!(slice.size_in_bytes(), 24);
        assert_eq!(
            allocator.read(slice.device_address()).unwrap(),
            bytemuck::cast_slice::<Vec3, u8>(&points)
        );
    }

    #[test]
    fn test_drop_releases_memory() {
        let allocator = HostAllocator::new();
        let slice = DeviceSlice::upload(&allocator, &[0.5f32]).unwrap();
        let address = slice.device_address();
        assert_eq!(allocator.live_allocations(), 1);
        drop(slice);
        assert_eq!(allocator.live_allocations(), 0);
        assert!(allocator.read(address).is_none());
    }
}
