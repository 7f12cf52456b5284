//! Build inputs for hardware ray-tracing acceleration structures.
//!
//! Each [`BuildInput`] owns a device-resident copy of one primitive group
//! (a sphere or an indexed triangle mesh) together with the CPU-side
//! material description the renderer shades it with. A [`BuildInputList`]
//! keeps inputs in insertion order and emits the descriptors an
//! acceleration-structure builder consumes.

use ash::vk;
use std::{ops::Deref, sync::Arc};

pub mod accel_struct;
mod error;
pub mod geometry;
mod physical_device;
pub mod resources;

pub use accel_struct::{
    BuildEntry, BuildInput, BuildInputList, GeometryDescriptor, PrimitiveBuildInput, PrimitiveKind,
    SphereBuildInput, SphereGeometry, TriangleBuildInput, TriangleGeometry,
};
pub use error::{BuildInputError, MemoryError};
pub use geometry::{Material, MaterialKind, MaterialRecord, SphereRecord, TriangleRecord};
pub use physical_device::*;

/// A logical device owned by the renderer.
///
/// The crate never creates or destroys the device. It only needs the handle
/// and a few physical device properties to allocate build input buffers.
pub struct Device {
    physical_device: PhysicalDevice,
    device: ash::Device,
}

impl Device {
    /// Wraps a device created elsewhere.
    ///
    /// # Safety
    /// `device` must have been created from `physical_device` on `instance`,
    /// and must outlive the returned `Device` and every buffer allocated through it.
    pub unsafe fn from_raw(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
    ) -> Self {
        let physical_device = PhysicalDevice::new(instance, physical_device);
        tracing::info!(device = ?device.handle(), "wrap device");
        Self {
            physical_device,
            device,
        }
    }
    pub fn physical_device(&self) -> &PhysicalDevice {
        &self.physical_device
    }
}

impl Deref for Device {
    type Target = ash::Device;

    fn deref(&self) -> &Self::Target {
        &self.device
    }
}

pub trait HasDevice {
    fn device(&self) -> &Arc<Device>;
}
