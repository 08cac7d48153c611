use crate::{
    memory::{MemoryClass, MemoryProperties, PerClass},
    util::upper_power_of_two,
};

/// Smallest default heap size derived from budget.
pub const MIN_HEAP_SIZE: u64 = 1024 * 1024;

/// Default size of pooled heaps per memory class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeapSizes {
    /// Size for device-local memory types.
    pub device_local: u64,

    /// Size for device-local host-visible memory types.
    pub device_shared: u64,

    /// Size for host-visible memory types.
    pub host_shared: u64,
}

impl HeapSizes {
    /// Get size for memory class.
    pub fn for_class(&self, class: MemoryClass) -> u64 {
        match class {
            MemoryClass::DeviceLocal => self.device_local,
            MemoryClass::DeviceShared => self.device_shared,
            MemoryClass::HostShared => self.host_shared,
        }
    }

    /// Scale all sizes.
    pub fn scaled(self, multiplier: HeapSizeMultiplier) -> Self {
        HeapSizes {
            device_local: multiplier.apply(self.device_local),
            device_shared: multiplier.apply(self.device_shared),
            host_shared: multiplier.apply(self.host_shared),
        }
    }
}

/// Multiplier applied to default heap sizes computed from budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeapSizeMultiplier {
    /// One fourth of the baseline.
    Quarter,
    /// Half of the baseline.
    Half,
    /// Baseline.
    One,
    /// Twice the baseline.
    Double,
    /// Four times the baseline.
    Quadruple,
}

impl Default for HeapSizeMultiplier {
    fn default() -> Self {
        HeapSizeMultiplier::One
    }
}

impl HeapSizeMultiplier {
    /// Apply multiplier to the size.
    pub fn apply(self, size: u64) -> u64 {
        match self {
            HeapSizeMultiplier::Quarter => size / 4,
            HeapSizeMultiplier::Half => size / 2,
            HeapSizeMultiplier::One => size,
            HeapSizeMultiplier::Double => size.saturating_mul(2),
            HeapSizeMultiplier::Quadruple => size.saturating_mul(4),
        }
    }
}

/// Divisors applied to per-class budget to get baseline heap size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeapSizeDivisors {
    /// Divisor for device-local budget.
    pub device_local: u64,

    /// Divisor for device-shared budget when it is smaller than device-local budget.
    /// Typical for discrete GPUs with small host-visible window.
    pub device_shared: u64,

    /// Divisor for device-shared budget when it exceeds device-local budget.
    /// Typical for integrated GPUs where device memory is system memory.
    pub device_shared_large: u64,

    /// Divisor for host-shared budget.
    pub host_shared: u64,
}

impl Default for HeapSizeDivisors {
    fn default() -> Self {
        HeapSizeDivisors {
            device_local: 32,
            device_shared: 16,
            device_shared_large: 128,
            host_shared: 64,
        }
    }
}

/// Policy for default pooled heap sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeapSizing {
    /// Use sizes as is.
    Fixed(HeapSizes),

    /// Derive sizes from memory budget of the device.
    Budget {
        /// Scale of the derived sizes.
        multiplier: HeapSizeMultiplier,

        /// Budget divisors.
        divisors: HeapSizeDivisors,
    },
}

impl Default for HeapSizing {
    fn default() -> Self {
        HeapSizing::Budget {
            multiplier: HeapSizeMultiplier::default(),
            divisors: HeapSizeDivisors::default(),
        }
    }
}

impl HeapSizing {
    /// Resolve default heap sizes for device with given memory budget.
    pub fn resolve(&self, budget: &PerClass<u64>) -> HeapSizes {
        match *self {
            HeapSizing::Fixed(sizes) => sizes,
            HeapSizing::Budget {
                multiplier,
                divisors,
            } => {
                let shared_divisor = if budget.device_shared > budget.device_local {
                    divisors.device_shared_large
                } else {
                    divisors.device_shared
                };

                HeapSizes {
                    device_local: baseline(budget.device_local, divisors.device_local),
                    device_shared: baseline(budget.device_shared, shared_divisor),
                    host_shared: baseline(budget.host_shared, divisors.host_shared),
                }
                .scaled(multiplier)
            }
        }
    }
}

fn baseline(budget: u64, divisor: u64) -> u64 {
    upper_power_of_two(budget / divisor.max(1)).max(MIN_HEAP_SIZE)
}

/// Memory budget per class.
/// Budget of a class is the largest native heap used by memory types of that class.
pub fn memory_budget(properties: &MemoryProperties) -> PerClass<u64> {
    let mut budget = PerClass::default();
    for ty in &properties.types {
        let heap_size = properties
            .heaps
            .get(ty.heap_index as usize)
            .copied()
            .unwrap_or(0);
        let class = &mut budget[MemoryClass::of(ty.properties)];
        *class = heap_size.max(*class);
    }
    budget
}
