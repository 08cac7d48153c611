use std::ops::{Add, Index, IndexMut};

bitflags! {
    /// Memory property flags.
    pub struct Properties: u32 {
        /// Specifies that memory allocated with this type is the most efficient for device access.
        const DEVICE_LOCAL = 0x00000001;

        /// Specifies that memory allocated with this type can be mapped for host access.
        const HOST_VISIBLE = 0x00000002;

        /// Specifies that the host cache management commands `Device::flush` and `Device::invalidate`
        /// are not needed to flush host writes to the device or make device writes visible to the host, respectively.
        const HOST_COHERENT = 0x00000004;

        /// Specifies that memory allocated with this type is cached on the host.
        /// Host memory accesses to uncached memory are slower than to cached memory,
        /// however uncached memory is always host coherent.
        const HOST_CACHED = 0x00000008;

        /// Specifies that the memory type only allows device access to the memory.
        /// Memory types must not have both `LAZILY_ALLOCATED` and `HOST_VISIBLE` set.
        const LAZILY_ALLOCATED = 0x00000010;
    }
}

impl Properties {
    /// Check if memory with these properties can be mapped.
    pub fn host_visible(self) -> bool {
        self.contains(Properties::HOST_VISIBLE)
    }

    /// Check if memory with these properties doesn't require flushing and invalidating.
    pub fn host_coherent(self) -> bool {
        self.contains(Properties::HOST_COHERENT)
    }
}

/// Entry of the physical device memory type table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryType {
    /// Property flags of the memory type.
    pub properties: Properties,

    /// Index of the native heap this memory type allocates from.
    pub heap_index: u32,
}

/// Memory types and heaps reported by physical device.
#[derive(Clone, Debug, Default)]
pub struct MemoryProperties {
    /// Memory types. Index in this list is the memory type index.
    pub types: Vec<MemoryType>,

    /// Sizes of native memory heaps.
    pub heaps: Vec<u64>,
}

/// Coarse class of memory types.
/// Heap sizing and diagnostics are bucketed by this class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemoryClass {
    /// Device-local memory that host can't access.
    DeviceLocal,

    /// Device-local memory that host can map.
    DeviceShared,

    /// Host memory visible to the device.
    HostShared,
}

impl MemoryClass {
    /// All classes in bucket order.
    pub const ALL: [MemoryClass; 3] = [
        MemoryClass::DeviceLocal,
        MemoryClass::DeviceShared,
        MemoryClass::HostShared,
    ];

    /// Classify memory type by its properties.
    /// Types that are neither device-local nor host-visible fall into `HostShared`.
    pub fn of(properties: Properties) -> Self {
        let device_local = properties.contains(Properties::DEVICE_LOCAL);
        let host_visible = properties.contains(Properties::HOST_VISIBLE);
        match (device_local, host_visible) {
            (true, true) => MemoryClass::DeviceShared,
            (true, false) => MemoryClass::DeviceLocal,
            (false, _) => MemoryClass::HostShared,
        }
    }
}

/// Value bucketed per `MemoryClass`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PerClass<T> {
    /// Value for `MemoryClass::DeviceLocal`.
    pub device_local: T,

    /// Value for `MemoryClass::DeviceShared`.
    pub device_shared: T,

    /// Value for `MemoryClass::HostShared`.
    pub host_shared: T,
}

impl<T> PerClass<T> {
    /// Sum of all buckets.
    pub fn total(&self) -> T
    where
        T: Copy + Add<Output = T>,
    {
        self.device_local + self.device_shared + self.host_shared
    }
}

impl<T> Index<MemoryClass> for PerClass<T> {
    type Output = T;

    fn index(&self, class: MemoryClass) -> &T {
        match class {
            MemoryClass::DeviceLocal => &self.device_local,
            MemoryClass::DeviceShared => &self.device_shared,
            MemoryClass::HostShared => &self.host_shared,
        }
    }
}

impl<T> IndexMut<MemoryClass> for PerClass<T> {
    fn index_mut(&mut self, class: MemoryClass) -> &mut T {
        match class {
            MemoryClass::DeviceLocal => &mut self.device_local,
            MemoryClass::DeviceShared => &mut self.device_shared,
            MemoryClass::HostShared => &mut self.host_shared,
        }
    }
}
