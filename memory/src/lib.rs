//! GPU memory sub-allocator.
//!
//! Native memory objects are allocated in large heaps
//! and handed out to resources as chunks.
//! Dropping a chunk returns its range to the heap.

#![deny(unused_must_use)]
#![warn(missing_docs)]

#[macro_use]
extern crate bitflags;

mod allocator;
mod chunk;
mod config;
mod device;
mod error;
mod heap;
mod memory;
mod usage;
mod util;
mod utilization;

#[cfg(feature = "gfx-hal")]
mod hal_impls;

#[cfg(test)]
mod test;

pub use crate::{
    allocator::{
        memory_budget, Allocator, HeapSizeDivisors, HeapSizeMultiplier, HeapSizes, HeapSizing,
        MemoryRequirements, MIN_HEAP_SIZE,
    },
    chunk::{BindTarget, Chunk},
    config::AllocatorConfig,
    device::{Device, DeviceLimits},
    error::{
        AllocationError, AllocatorError, BindError, MappingError, MemoryError, OutOfMemoryError,
    },
    heap::{HeapKind, ResourceType},
    memory::{MemoryClass, MemoryProperties, MemoryType, PerClass, Properties},
    usage::{Data, Download, Dynamic, MemoryUsage, MemoryUsageValue, Upload},
    utilization::{HeapUtilization, MemoryUtilization, TotalMemoryUtilization},
};

#[cfg(feature = "gfx-hal")]
pub use crate::hal_impls::{memory_properties, HalDevice};
