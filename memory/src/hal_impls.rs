//! Adapter for gfx-hal

use {
    crate::{
        device::Device,
        error::*,
        memory::{MemoryProperties, MemoryType, Properties},
    },
    gfx_hal::{device::Device as _, memory::Segment, Backend},
    std::{borrow::Borrow, iter::once, marker::PhantomData, ops::Range, ptr::NonNull},
};

impl From<gfx_hal::device::OutOfMemory> for OutOfMemoryError {
    fn from(error: gfx_hal::device::OutOfMemory) -> OutOfMemoryError {
        match error {
            gfx_hal::device::OutOfMemory::Host => OutOfMemoryError::OutOfHostMemory,
            gfx_hal::device::OutOfMemory::Device => OutOfMemoryError::OutOfDeviceMemory,
        }
    }
}

impl From<gfx_hal::memory::Properties> for Properties {
    fn from(value: gfx_hal::memory::Properties) -> Self {
        let mut result = Properties::empty();
        if value.contains(gfx_hal::memory::Properties::DEVICE_LOCAL) {
            result |= Properties::DEVICE_LOCAL;
        }
        if value.contains(gfx_hal::memory::Properties::COHERENT) {
            result |= Properties::HOST_COHERENT;
        }
        if value.contains(gfx_hal::memory::Properties::CPU_CACHED) {
            result |= Properties::HOST_CACHED;
        }
        if value.contains(gfx_hal::memory::Properties::CPU_VISIBLE) {
            result |= Properties::HOST_VISIBLE;
        }
        if value.contains(gfx_hal::memory::Properties::LAZILY_ALLOCATED) {
            result |= Properties::LAZILY_ALLOCATED;
        }
        result
    }
}

impl From<Properties> for gfx_hal::memory::Properties {
    fn from(value: Properties) -> Self {
        let mut result = gfx_hal::memory::Properties::empty();
        if value.contains(Properties::DEVICE_LOCAL) {
            result |= gfx_hal::memory::Properties::DEVICE_LOCAL;
        }
        if value.contains(Properties::HOST_COHERENT) {
            result |= gfx_hal::memory::Properties::COHERENT;
        }
        if value.contains(Properties::HOST_CACHED) {
            result |= gfx_hal::memory::Properties::CPU_CACHED;
        }
        if value.contains(Properties::HOST_VISIBLE) {
            result |= gfx_hal::memory::Properties::CPU_VISIBLE;
        }
        if value.contains(Properties::LAZILY_ALLOCATED) {
            result |= gfx_hal::memory::Properties::LAZILY_ALLOCATED;
        }
        result
    }
}

/// Convert memory properties reported by gfx-hal physical device.
pub fn memory_properties(properties: &gfx_hal::adapter::MemoryProperties) -> MemoryProperties {
    MemoryProperties {
        types: properties
            .memory_types
            .iter()
            .map(|ty| MemoryType {
                properties: ty.properties.into(),
                heap_index: ty.heap_index as u32,
            })
            .collect(),
        heaps: properties.memory_heaps.iter().map(|heap| heap.size).collect(),
    }
}

/// `Device` implementation over gfx-hal device.
#[derive(Debug)]
pub struct HalDevice<B, D> {
    device: D,
    marker: PhantomData<B>,
}

impl<B, D> HalDevice<B, D>
where
    B: Backend,
    D: Borrow<B::Device>,
{
    /// Wrap gfx-hal device.
    pub fn new(device: D) -> Self {
        HalDevice {
            device,
            marker: PhantomData,
        }
    }

    /// Get wrapped device.
    pub fn raw(&self) -> &B::Device {
        self.device.borrow()
    }
}

fn segment(range: Range<u64>) -> Segment {
    Segment {
        offset: range.start,
        size: Some(range.end - range.start),
    }
}

impl<B, D> Device for HalDevice<B, D>
where
    B: Backend,
    D: Borrow<B::Device> + Send + Sync,
{
    type Memory = B::Memory;
    type Buffer = B::Buffer;
    type Image = B::Image;

    unsafe fn allocate(
        &self,
        memory_type: u32,
        size: u64,
    ) -> Result<B::Memory, AllocationError> {
        self.raw()
            .allocate_memory(gfx_hal::MemoryTypeId(memory_type as usize), size)
            .map_err(|error| match error {
                gfx_hal::device::AllocationError::OutOfMemory(error) => {
                    OutOfMemoryError::from(error).into()
                }
                _ => AllocationError::TooManyObjects,
            })
    }

    unsafe fn free(&self, memory: B::Memory) {
        self.raw().free_memory(memory)
    }

    unsafe fn map(
        &self,
        memory: &mut B::Memory,
        size: u64,
    ) -> Result<NonNull<u8>, MappingError> {
        match self.raw().map_memory(memory, segment(0..size)) {
            Ok(ptr) => NonNull::new(ptr).ok_or(MappingError::MappingFailed),
            Err(gfx_hal::device::MapError::OutOfMemory(error)) => {
                Err(OutOfMemoryError::from(error).into())
            }
            Err(_) => Err(MappingError::MappingFailed),
        }
    }

    unsafe fn unmap(&self, memory: &mut B::Memory) {
        self.raw().unmap_memory(memory)
    }

    unsafe fn flush(
        &self,
        memory: &B::Memory,
        range: Range<u64>,
    ) -> Result<(), OutOfMemoryError> {
        self.raw()
            .flush_mapped_memory_ranges(once((memory, segment(range))))
            .map_err(Into::into)
    }

    unsafe fn invalidate(
        &self,
        memory: &B::Memory,
        range: Range<u64>,
    ) -> Result<(), OutOfMemoryError> {
        self.raw()
            .invalidate_mapped_memory_ranges(once((memory, segment(range))))
            .map_err(Into::into)
    }

    unsafe fn bind_buffer(
        &self,
        memory: &B::Memory,
        offset: u64,
        buffer: &mut B::Buffer,
    ) -> Result<(), BindError> {
        self.raw()
            .bind_buffer_memory(memory, offset, buffer)
            .map_err(bind_error)
    }

    unsafe fn bind_image(
        &self,
        memory: &B::Memory,
        offset: u64,
        image: &mut B::Image,
    ) -> Result<(), BindError> {
        self.raw()
            .bind_image_memory(memory, offset, image)
            .map_err(bind_error)
    }
}

fn bind_error(error: gfx_hal::device::BindError) -> BindError {
    match error {
        gfx_hal::device::BindError::OutOfMemory(error) => OutOfMemoryError::from(error).into(),
        gfx_hal::device::BindError::WrongMemory => BindError::WrongMemory,
        _ => BindError::OutOfBounds,
    }
}
