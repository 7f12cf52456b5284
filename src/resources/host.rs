//! Host-memory stand-in for a device heap.
//!
//! Every upload is kept as a byte-exact copy under a synthetic device
//! address, which makes it possible to inspect what a build would read
//! without a GPU. Used by the tests and by CPU-side builders.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use ash::vk;

use super::{BufferRequest, DeviceMemory, MemoryAllocator};
use crate::MemoryError;

/// Synthetic addresses start away from zero so a null address is never handed out.
const BASE_ADDRESS: vk::DeviceAddress = 0x1_0000;
/// Matches the minimum alignment drivers report for acceleration structure inputs.
const MIN_ALIGNMENT: vk::DeviceAddress = 256;

#[derive(Default)]
struct HostHeap {
    state: Mutex<HeapState>,
}

#[derive(Default)]
struct HeapState {
    next_address: vk::DeviceAddress,
    used: vk::DeviceSize,
    capacity: Option<vk::DeviceSize>,
    allocations: BTreeMap<vk::DeviceAddress, Box<[u8]>>,
}

impl HostHeap {
    fn lock(&self) -> MutexGuard<'_, HeapState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone, Default)]
pub struct HostAllocator {
    heap: Arc<HostHeap>,
}

impl HostAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// An allocator that fails once more than `capacity` bytes are live.
    pub fn with_capacity(capacity: vk::DeviceSize) -> Self {
        let allocator = Self::default();
        allocator.heap.lock().capacity = Some(capacity);
        allocator
    }

    /// Number of allocations not yet released.
    pub fn live_allocations(&self) -> usize {
        self.heap.lock().allocations.len()
    }

    /// Bytes held by live allocations.
    pub fn used_bytes(&self) -> vk::DeviceSize {
        self.heap.lock().used
    }

    /// Copy of the allocation starting at `address`, if it is still live.
    pub fn read(&self, address: vk::DeviceAddress) -> Option<Vec<u8>> {
        self.heap
            .lock()
            .allocations
            .get(&address)
            .map(|bytes| bytes.to_vec())
    }
}

impl MemoryAllocator for HostAllocator {
    fn upload(
        &self,
        request: &BufferRequest<'_>,
        data: &[u8],
    ) -> Result<Box<dyn DeviceMemory>, MemoryError> {
        debug_assert!(data.len() as u64 <= request.size);
        let mut state = self.heap.lock();
        if let Some(capacity) = state.capacity {
            let available = capacity.saturating_sub(state.used);
            if request.size > available {
                tracing::debug!(size = request.size, available, "host allocation failed");
                return Err(MemoryError::OutOfDeviceMemory {
                    requested: request.size,
                    available,
                });
            }
        }

        let alignment = request.alignment.max(MIN_ALIGNMENT);
        let address = (BASE_ADDRESS + state.next_address).next_multiple_of(alignment);
        // Zero-sized requests still get a distinct address.
        state.next_address = address + request.size.max(1) - BASE_ADDRESS;
        state.used += request.size;

        let mut bytes = vec![0u8; request.size as usize].into_boxed_slice();
        bytes[..data.len()].copy_from_slice(data);
        state.allocations.insert(address, bytes);
        tracing::debug!(address, size = request.size, "allocate host buffer");

        Ok(Box::new(HostBuffer {
            heap: self.heap.clone(),
            address,
            size: request.size,
        }))
    }
}

struct HostBuffer {
    heap: Arc<HostHeap>,
    address: vk::DeviceAddress,
    size: vk::DeviceSize,
}

impl DeviceMemory for HostBuffer {
    fn device_address(&self) -> vk::DeviceAddress {
        self.address
    }
    fn size(&self) -> vk::DeviceSize {
        self.size
    }
}

impl Drop for HostBuffer {
    fn drop(&mut self) {
        tracing::debug!(address = self.address, "drop host buffer");
        let mut state = self.heap.lock();
        let released = state.allocations.remove(&self.address);
        debug_assert!(released.is_some(), "host buffer released twice");
        state.used -= self.size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_are_aligned_and_distinct() {
        let allocator = HostAllocator::new();
        let a = allocator
            .upload(&BufferRequest::build_input(12, 4), &[1; 12])
            .unwrap();
        let b = allocator
            .upload(&BufferRequest::build_input(4, 4), &[2; 4])
            .unwrap();
        assert_ne!(a.device_address(), 0);
        assert_ne!(a.device_address(), b.device_address());
        assert_eq!(a.device_address() % MIN_ALIGNMENT, 0);
        assert_eq!(b.device_address() % MIN_ALIGNMENT, 0);
        assert_eq!(allocator.read(b.device_address()).unwrap(), vec![2; 4]);
        assert_eq!(allocator.used_bytes(), 16);
    }

    #[test]
    fn test_capacity_exhaustion() {
        let allocator = HostAllocator::with_capacity(16);
        let _a = allocator
            .upload(&BufferRequest::build_input(12, 4), &[0; 12])
            .unwrap();
        let err = allocator
            .upload(&BufferRequest::build_input(12, 4), &[0; 12])
            .err()
            .unwrap();
        assert!(matches!(
            err,
            MemoryError::OutOfDeviceMemory {
                requested: 12,
                available: 4
            }
        ));
        assert_eq!(allocator.live_allocations(), 1);
    }
}
