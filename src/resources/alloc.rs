use ash::vk;
use std::{
    mem::ManuallyDrop,
    sync::{Arc, PoisonError, RwLock},
};

use crate::{Device, HasDevice, MemoryError};

use super::{BufferRequest, DeviceMemory, MemoryAllocator};

type GpuAllocator = gpu_alloc::GpuAllocator<vk::DeviceMemory>;

/// Vulkan device memory allocator backed by `gpu-alloc`.
pub struct Allocator {
    allocator: RwLock<GpuAllocator>,
    device: Arc<Device>,
}

impl HasDevice for Allocator {
    fn device(&self) -> &Arc<Device> {
        &self.device
    }
}

impl Allocator {
    pub fn new(device: Arc<Device>) -> Self {
        use gpu_alloc::{Config, DeviceProperties, MemoryHeap, MemoryType};
        use gpu_alloc_ash::memory_properties_from_ash;
        use std::borrow::Cow;

        let physical_device = device.physical_device();
        let (heaps, types) = physical_device.memory_properties();

        let config = Config::i_am_prototyping();

        let props = DeviceProperties {
            memory_types: Cow::Owned(
                types
                    .iter()
                    .map(|memory_type| MemoryType {
                        props: memory_properties_from_ash(memory_type.property_flags),
                        heap: memory_type.heap_index,
                    })
                    .collect(),
            ),
            memory_heaps: Cow::Owned(
                heaps
                    .iter()
                    .map(|memory_heap| MemoryHeap {
                        size: memory_heap.size,
                    })
                    .collect(),
            ),
            max_memory_allocation_count: physical_device
                .properties()
                .limits
                .max_memory_allocation_count,
            max_memory_allocation_size: physical_device.properties().v11.max_memory_allocation_size,
            non_coherent_atom_size: physical_device.properties().limits.non_coherent_atom_size,
            buffer_device_address: physical_device.features().v12.buffer_device_address != 0,
        };
        if !props.buffer_device_address {
            tracing::warn!("bufferDeviceAddress is not enabled; build input addresses will be invalid");
        }
        let allocator: GpuAllocator = GpuAllocator::new(config, props);

        Self {
            allocator: RwLock::new(allocator),
            device,
        }
    }

    pub fn allocate_buffer(
        self: &Arc<Self>,
        request: &BufferRequest<'_>,
    ) -> Result<MemBuffer, MemoryError> {
        unsafe {
            use gpu_alloc::Request;
            let buffer = self.device.create_buffer(
                &vk::BufferCreateInfo::builder()
                    .size(request.size)
                    .usage(request.usage)
                    .sharing_mode(request.sharing_mode)
                    .queue_family_indices(request.queue_families)
                    .build(),
                None,
            )?;

            let reqs = self.device.get_buffer_memory_requirements(buffer);

            let mem = self
                .allocator
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .alloc(
                    gpu_alloc_ash::AshMemoryDevice::wrap(&self.device),
                    Request {
                        size: reqs.size,
                        align_mask: reqs.alignment.max(request.alignment) - 1,
                        usage: request.memory_usage,
                        memory_types: reqs.memory_type_bits,
                    },
                );
            let mem = match mem {
                Ok(mem) => mem,
                Err(err) => {
                    self.device.destroy_buffer(buffer, None);
                    return Err(err.into());
                }
            };

            // From here on the MemBuffer owns both handles, so an early return releases them.
            let mem_buffer = MemBuffer {
                memory: ManuallyDrop::new(mem),
                buffer,
                size: request.size,
                allocator: self.clone(),
            };
            self.device.bind_buffer_memory(
                buffer,
                *mem_buffer.memory.memory(),
                mem_buffer.memory.offset(),
            )?;
            tracing::debug!(buffer = ?buffer, size = request.size, "allocate buffer");
            Ok(mem_buffer)
        }
    }
}

impl MemoryAllocator for Arc<Allocator> {
    fn upload(
        &self,
        request: &BufferRequest<'_>,
        data: &[u8],
    ) -> Result<Box<dyn DeviceMemory>, MemoryError> {
        debug_assert!(data.len() as u64 <= request.size);
        let mut buffer = self.allocate_buffer(request)?;
        buffer.write_bytes(0, data)?;
        Ok(Box::new(buffer))
    }
}

/// A `vk::Buffer` bound to a block of device memory it owns.
pub struct MemBuffer {
    allocator: Arc<Allocator>,
    pub buffer: vk::Buffer,
    size: vk::DeviceSize,
    memory: ManuallyDrop<gpu_alloc::MemoryBlock<vk::DeviceMemory>>,
}

impl Drop for MemBuffer {
    fn drop(&mut self) {
        tracing::debug!(buffer = ?self.buffer, "drop buffer");
        unsafe {
            let device = gpu_alloc_ash::AshMemoryDevice::wrap(&self.allocator.device);
            self.allocator.device.destroy_buffer(self.buffer, None);
            let memory = ManuallyDrop::take(&mut self.memory);
            self.allocator
                .allocator
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .dealloc(device, memory);
        }
    }
}

impl MemBuffer {
    pub fn get_device_address(&self) -> vk::DeviceAddress {
        unsafe {
            self.allocator.device.get_buffer_device_address(
                &vk::BufferDeviceAddressInfo::builder()
                    .buffer(self.buffer)
                    .build(),
            )
        }
    }

    /// Writes into host-visible memory
    pub fn write_bytes(&mut self, offset: u64, data: &[u8]) -> Result<(), MemoryError> {
        let device = gpu_alloc_ash::AshMemoryDevice::wrap(&self.allocator.device);
        // Fails with MapError::NonHostVisible if the block landed in device-only memory.
        unsafe { self.memory.write_bytes(device, offset, data)? };
        Ok(())
    }
}

impl DeviceMemory for MemBuffer {
    fn device_address(&self) -> vk::DeviceAddress {
        self.get_device_address()
    }
    fn size(&self) -> vk::DeviceSize {
        self.size
    }
}
