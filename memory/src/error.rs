use crate::memory::Properties;

/// Typical memory error - out of available memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutOfMemoryError {
    /// Host memory exhausted.
    OutOfHostMemory,

    /// Device memory exhausted.
    OutOfDeviceMemory,
}

impl std::fmt::Display for OutOfMemoryError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutOfMemoryError::OutOfHostMemory => write!(fmt, "Out of host memory"),
            OutOfMemoryError::OutOfDeviceMemory => write!(fmt, "Out of device memory"),
        }
    }
}

impl std::error::Error for OutOfMemoryError {}

/// Possible cause of native allocation failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocationError {
    /// Out of either host or device memory.
    OutOfMemoryError(OutOfMemoryError),

    /// Implementation doesn't allow to create more memory objects.
    TooManyObjects,
}

impl std::fmt::Display for AllocationError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationError::OutOfMemoryError(error) => write!(fmt, "{}", error),
            AllocationError::TooManyObjects => write!(fmt, "Can't allocate more memory objects"),
        }
    }
}

impl std::error::Error for AllocationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AllocationError::OutOfMemoryError(error) => Some(error),
            AllocationError::TooManyObjects => None,
        }
    }
}

impl From<OutOfMemoryError> for AllocationError {
    fn from(error: OutOfMemoryError) -> Self {
        AllocationError::OutOfMemoryError(error)
    }
}

/// Possible cause of mapping failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MappingError {
    /// Attempt to map memory without host-visible property.
    HostInvisible,

    /// Unable to allocate an appropriately sized contiguous virtual address range.
    MappingFailed,

    /// Out of either host or device memory.
    OutOfMemoryError(OutOfMemoryError),
}

impl std::fmt::Display for MappingError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingError::HostInvisible => {
                write!(fmt, "Memory is not HOST_VISIBLE and can't be mapped")
            }
            MappingError::MappingFailed => write!(fmt, "Virtual memory allocation failed"),
            MappingError::OutOfMemoryError(error) => write!(fmt, "{}", error),
        }
    }
}

impl std::error::Error for MappingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MappingError::OutOfMemoryError(error) => Some(error),
            _ => None,
        }
    }
}

impl From<OutOfMemoryError> for MappingError {
    fn from(error: OutOfMemoryError) -> Self {
        MappingError::OutOfMemoryError(error)
    }
}

/// Possible cause of binding failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindError {
    /// Out of either host or device memory.
    OutOfMemoryError(OutOfMemoryError),

    /// Memory type is not among types the resource can be bound to.
    WrongMemory,

    /// Resource doesn't fit into the memory range.
    OutOfBounds,
}

impl std::fmt::Display for BindError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindError::OutOfMemoryError(error) => write!(fmt, "{}", error),
            BindError::WrongMemory => write!(fmt, "Resource can't be bound to this memory type"),
            BindError::OutOfBounds => write!(fmt, "Resource doesn't fit into the memory range"),
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BindError::OutOfMemoryError(error) => Some(error),
            _ => None,
        }
    }
}

impl From<OutOfMemoryError> for BindError {
    fn from(error: OutOfMemoryError) -> Self {
        BindError::OutOfMemoryError(error)
    }
}

/// Possible errors returned by `Allocator`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocatorError {
    /// No memory types among allowed by the mask have requested properties.
    NoSuitableMemoryType(u32, Properties),

    /// Native memory allocation failure.
    AllocationError(AllocationError),

    /// Binding allocated memory to the resource failed.
    BindError(BindError),

    /// Zero-sized allocations are not supported.
    ZeroSize,
}

impl std::fmt::Display for AllocatorError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocatorError::NoSuitableMemoryType(mask, properties) => write!(
                fmt,
                "Memory type among ({:#b}) with properties ({:?}) not found",
                mask, properties
            ),
            AllocatorError::AllocationError(error) => write!(fmt, "{}", error),
            AllocatorError::BindError(error) => write!(fmt, "{}", error),
            AllocatorError::ZeroSize => write!(fmt, "Can't allocate zero bytes"),
        }
    }
}

impl std::error::Error for AllocatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AllocatorError::NoSuitableMemoryType(_, _) => None,
            AllocatorError::AllocationError(error) => Some(error),
            AllocatorError::BindError(error) => Some(error),
            AllocatorError::ZeroSize => None,
        }
    }
}

impl From<AllocationError> for AllocatorError {
    fn from(error: AllocationError) -> Self {
        AllocatorError::AllocationError(error)
    }
}

impl From<OutOfMemoryError> for AllocatorError {
    fn from(error: OutOfMemoryError) -> Self {
        AllocatorError::AllocationError(error.into())
    }
}

impl From<BindError> for AllocatorError {
    fn from(error: BindError) -> Self {
        AllocatorError::BindError(error)
    }
}

/// Generic memory access error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryError {
    /// Out of either host or device memory.
    OutOfMemoryError(OutOfMemoryError),

    /// Error occurred during mapping operation.
    MappingError(MappingError),
}

impl std::fmt::Display for MemoryError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryError::OutOfMemoryError(error) => write!(fmt, "{}", error),
            MemoryError::MappingError(error) => write!(fmt, "{}", error),
        }
    }
}

impl std::error::Error for MemoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MemoryError::OutOfMemoryError(error) => Some(error),
            MemoryError::MappingError(error) => Some(error),
        }
    }
}

impl From<OutOfMemoryError> for MemoryError {
    fn from(error: OutOfMemoryError) -> Self {
        MemoryError::OutOfMemoryError(error)
    }
}

impl From<MappingError> for MemoryError {
    fn from(error: MappingError) -> Self {
        MemoryError::MappingError(error)
    }
}
