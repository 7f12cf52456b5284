use ash::vk;
use std::{ffi::c_void, ops::Deref, ptr};

/// Snapshot of the physical device state needed to place build input buffers.
pub struct PhysicalDevice {
    physical_device: vk::PhysicalDevice,
    properties: Box<PhysicalDeviceProperties>,
    features: Box<PhysicalDeviceFeatures>,
    memory_heaps: Box<[MemoryHeap]>,
    memory_types: Box<[MemoryType]>,
}

impl PhysicalDevice {
    pub(crate) fn new(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> Self {
        let (memory_heaps, memory_types) = get_memory_properties(instance, physical_device);
        Self {
            physical_device,
            properties: PhysicalDeviceProperties::new(instance, physical_device),
            features: PhysicalDeviceFeatures::new(instance, physical_device),
            memory_heaps,
            memory_types,
        }
    }
    pub fn raw(&self) -> vk::PhysicalDevice {
        self.physical_device
    }
    pub fn properties(&self) -> &PhysicalDeviceProperties {
        &self.properties
    }
    pub fn features(&self) -> &PhysicalDeviceFeatures {
        &self.features
    }
    pub fn memory_properties(&self) -> (&[MemoryHeap], &[MemoryType]) {
        (&self.memory_heaps, &self.memory_types)
    }
}

pub struct PhysicalDeviceProperties {
    pub inner: vk::PhysicalDeviceProperties2,
    pub v11: vk::PhysicalDeviceVulkan11Properties,
    pub acceleration_structure: vk::PhysicalDeviceAccelerationStructurePropertiesKHR,
}
// Safety: the p_next chain is cleared after the query, so no pointer escapes the struct.
unsafe impl Send for PhysicalDeviceProperties {}
unsafe impl Sync for PhysicalDeviceProperties {}
impl PhysicalDeviceProperties {
    fn new(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> Box<PhysicalDeviceProperties> {
        let mut this = Box::new(Self {
            inner: vk::PhysicalDeviceProperties2::default(),
            v11: vk::PhysicalDeviceVulkan11Properties::default(),
            acceleration_structure: vk::PhysicalDeviceAccelerationStructurePropertiesKHR::default(),
        });
        this.inner.p_next = &mut this.v11 as *mut _ as *mut c_void;
        this.v11.p_next = &mut this.acceleration_structure as *mut _ as *mut c_void;
        unsafe {
            instance.get_physical_device_properties2(physical_device, &mut this.inner);
        }
        this.inner.p_next = ptr::null_mut();
        this.v11.p_next = ptr::null_mut();
        this.acceleration_structure.p_next = ptr::null_mut();
        this
    }
}
impl Deref for PhysicalDeviceProperties {
    type Target = vk::PhysicalDeviceProperties;
    fn deref(&self) -> &Self::Target {
        &self.inner.properties
    }
}

pub struct PhysicalDeviceFeatures {
    pub inner: vk::PhysicalDeviceFeatures2,
    pub v12: vk::PhysicalDeviceVulkan12Features,
    pub acceleration_structure: vk::PhysicalDeviceAccelerationStructureFeaturesKHR,
}
// Safety: see PhysicalDeviceProperties.
unsafe impl Send for PhysicalDeviceFeatures {}
unsafe impl Sync for PhysicalDeviceFeatures {}
impl PhysicalDeviceFeatures {
    fn new(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> Box<PhysicalDeviceFeatures> {
        let mut this = Box::new(Self {
            inner: vk::PhysicalDeviceFeatures2::default(),
            v12: vk::PhysicalDeviceVulkan12Features::default(),
            acceleration_structure: vk::PhysicalDeviceAccelerationStructureFeaturesKHR::default(),
        });
        this.inner.p_next = &mut this.v12 as *mut _ as *mut c_void;
        this.v12.p_next = &mut this.acceleration_structure as *mut _ as *mut c_void;
        unsafe {
            instance.get_physical_device_features2(physical_device, &mut this.inner);
        }
        this.inner.p_next = ptr::null_mut();
        this.v12.p_next = ptr::null_mut();
        this.acceleration_structure.p_next = ptr::null_mut();
        this
    }
}
impl Deref for PhysicalDeviceFeatures {
    type Target = vk::PhysicalDeviceFeatures;
    fn deref(&self) -> &Self::Target {
        &self.inner.features
    }
}

pub struct MemoryType {
    pub property_flags: vk::MemoryPropertyFlags,
    pub heap_index: u32,
}

pub struct MemoryHeap {
    pub size: vk::DeviceSize,
    pub flags: vk::MemoryHeapFlags,
}

fn get_memory_properties(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
) -> (Box<[MemoryHeap]>, Box<[MemoryType]>) {
    let props = unsafe { instance.get_physical_device_memory_properties(physical_device) };
    let heaps = props.memory_heaps[0..props.memory_heap_count as usize]
        .iter()
        .map(|heap| MemoryHeap {
            size: heap.size,
            flags: heap.flags,
        })
        .collect();
    let tys = props.memory_types[0..props.memory_type_count as usize]
        .iter()
        .map(|ty| MemoryType {
            property_flags: ty.property_flags,
            heap_index: ty.heap_index,
        })
        .collect();
    (heaps, tys)
}
