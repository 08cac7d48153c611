use {
    crate::error::*,
    std::{ops::Range, ptr::NonNull},
};

/// Native memory operations the allocator is built on.
///
/// Implemented by the graphics backend wrapper.
/// All methods are `unsafe` since they operate on raw device objects
/// and the allocator is responsible for upholding their usage rules.
pub trait Device: Send + Sync {
    /// Native memory object.
    type Memory: std::fmt::Debug + Send + Sync;

    /// Native buffer object.
    type Buffer;

    /// Native image object.
    type Image;

    /// Allocate memory object.
    ///
    /// # Parameters
    /// `memory_type` - memory type index.
    /// `size`        - size of the memory object to allocate.
    unsafe fn allocate(&self, memory_type: u32, size: u64) -> Result<Self::Memory, AllocationError>;

    /// Free memory object.
    unsafe fn free(&self, memory: Self::Memory);

    /// Map whole memory object to the host address space.
    /// Only one mapping for the given memory object can exist.
    unsafe fn map(&self, memory: &mut Self::Memory, size: u64) -> Result<NonNull<u8>, MappingError>;

    /// Unmap memory object.
    unsafe fn unmap(&self, memory: &mut Self::Memory);

    /// Flush mapped range guaranteeing that host writes to the memory
    /// can be made available to device access.
    /// `range` is aligned to the non-coherent atom size.
    unsafe fn flush(
        &self,
        memory: &Self::Memory,
        range: Range<u64>,
    ) -> Result<(), OutOfMemoryError>;

    /// Invalidate mapped range guaranteeing that device writes to the memory
    /// are made visible to the host.
    /// `range` is aligned to the non-coherent atom size.
    unsafe fn invalidate(
        &self,
        memory: &Self::Memory,
        range: Range<u64>,
    ) -> Result<(), OutOfMemoryError>;

    /// Bind buffer to the memory at `offset`.
    unsafe fn bind_buffer(
        &self,
        memory: &Self::Memory,
        offset: u64,
        buffer: &mut Self::Buffer,
    ) -> Result<(), BindError>;

    /// Bind image to the memory at `offset`.
    unsafe fn bind_image(
        &self,
        memory: &Self::Memory,
        offset: u64,
        image: &mut Self::Image,
    ) -> Result<(), BindError>;
}

/// Device-wide constants that affect sub-allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceLimits {
    /// Minimal spacing between linear and non-linear resources sharing one memory object.
    pub buffer_image_granularity: u64,

    /// Alignment of ranges passed to flush and invalidate for non-coherent memory.
    pub non_coherent_atom_size: u64,

    /// Whether resources can report preference for dedicated allocations.
    /// When `false` the hint is ignored.
    pub dedicated_allocation_query: bool,
}

impl Default for DeviceLimits {
    fn default() -> Self {
        DeviceLimits {
            buffer_image_granularity: 1,
            non_coherent_atom_size: 1,
            dedicated_allocation_query: false,
        }
    }
}
