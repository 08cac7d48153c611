//! Defines usage types for memory chunks.
//! See `MemoryUsage` and implementations for details.

use crate::memory::Properties;

/// Memory usage trait.
/// Resolves intended usage into pair of property sets:
/// properties memory must have and properties memory should have.
pub trait MemoryUsage {
    /// Get runtime usage value.
    fn value(self) -> MemoryUsageValue;

    /// Properties memory must have.
    fn minimal(&self) -> Properties;

    /// Properties memory should have.
    fn optimal(&self) -> Properties;
}

/// Full speed GPU access.
/// Optimal for render targets and persistent resources.
/// Avoid memory with host access.
#[derive(Clone, Copy, Debug)]
pub struct Data;

impl MemoryUsage for Data {
    #[inline]
    fn value(self) -> MemoryUsageValue {
        MemoryUsageValue::Data
    }

    #[inline]
    fn minimal(&self) -> Properties {
        Properties::empty()
    }

    #[inline]
    fn optimal(&self) -> Properties {
        Properties::DEVICE_LOCAL
    }
}

/// CPU to GPU data flow with update commands.
/// Used for dynamic buffer data, typically constant buffers.
/// Host access is guaranteed.
/// Prefers memory with fast GPU access.
#[derive(Clone, Copy, Debug)]
pub struct Dynamic;

impl MemoryUsage for Dynamic {
    #[inline]
    fn value(self) -> MemoryUsageValue {
        MemoryUsageValue::Dynamic
    }

    #[inline]
    fn minimal(&self) -> Properties {
        Properties::HOST_VISIBLE
    }

    #[inline]
    fn optimal(&self) -> Properties {
        Properties::DEVICE_LOCAL | Properties::HOST_VISIBLE | Properties::HOST_COHERENT
    }
}

/// CPU to GPU data flow with mapping.
/// Used for staging data before copying to the `Data` memory.
/// Host access is guaranteed.
#[derive(Clone, Copy, Debug)]
pub struct Upload;

impl MemoryUsage for Upload {
    #[inline]
    fn value(self) -> MemoryUsageValue {
        MemoryUsageValue::Upload
    }

    #[inline]
    fn minimal(&self) -> Properties {
        Properties::HOST_VISIBLE
    }

    #[inline]
    fn optimal(&self) -> Properties {
        Properties::HOST_VISIBLE | Properties::HOST_COHERENT
    }
}

/// GPU to CPU data flow with mapping.
/// Used for copying data from `Data` memory to be read by the host.
/// Host access is guaranteed.
#[derive(Clone, Copy, Debug)]
pub struct Download;

impl MemoryUsage for Download {
    #[inline]
    fn value(self) -> MemoryUsageValue {
        MemoryUsageValue::Download
    }

    #[inline]
    fn minimal(&self) -> Properties {
        Properties::HOST_VISIBLE
    }

    #[inline]
    fn optimal(&self) -> Properties {
        Properties::HOST_VISIBLE | Properties::HOST_COHERENT | Properties::HOST_CACHED
    }
}

/// Dynamic value that specify memory usage flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemoryUsageValue {
    /// Runtime counterpart for `Data`.
    Data,
    /// Runtime counterpart for `Dynamic`.
    Dynamic,
    /// Runtime counterpart for `Upload`.
    Upload,
    /// Runtime counterpart for `Download`.
    Download,
}

impl MemoryUsage for MemoryUsageValue {
    #[inline]
    fn value(self) -> MemoryUsageValue {
        self
    }

    #[inline]
    fn minimal(&self) -> Properties {
        match self {
            MemoryUsageValue::Data => Data.minimal(),
            MemoryUsageValue::Dynamic => Dynamic.minimal(),
            MemoryUsageValue::Upload => Upload.minimal(),
            MemoryUsageValue::Download => Download.minimal(),
        }
    }

    #[inline]
    fn optimal(&self) -> Properties {
        match self {
            MemoryUsageValue::Data => Data.optimal(),
            MemoryUsageValue::Dynamic => Dynamic.optimal(),
            MemoryUsageValue::Upload => Upload.optimal(),
            MemoryUsageValue::Download => Download.optimal(),
        }
    }
}
