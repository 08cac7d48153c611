//! Heap selection, sizing and bookkeeping.

mod sizing;

pub use self::sizing::*;

use {
    crate::{
        chunk::{BindTarget, Chunk},
        config::AllocatorConfig,
        device::{Device, DeviceLimits},
        error::*,
        heap::{Heap, HeapKind, ResourceType},
        memory::{MemoryClass, MemoryProperties, MemoryType, PerClass, Properties},
        usage::MemoryUsage,
        util::*,
        utilization::{HeapUtilization, MemoryUtilization, TotalMemoryUtilization},
    },
    parking_lot::Mutex,
    smallvec::SmallVec,
    std::{ops::Add, sync::Arc},
};

/// Memory requirements of a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryRequirements {
    /// Size of the resource.
    pub size: u64,

    /// Alignment of the resource's offset.
    pub alignment: u64,

    /// Bitmask of memory types the resource can be bound to.
    pub type_mask: u32,

    /// Resource prefers or requires memory object of its own.
    pub prefers_dedicated: bool,
}

/// Memory allocator that owns native heaps and sub-allocates chunks from them.
///
/// Safe to share between threads.
/// Lock order is allocator first, heap second.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Allocator<D: Device> {
    #[derivative(Debug = "ignore")]
    device: Arc<D>,
    types: Vec<MemoryType>,
    heap_sizes: HeapSizes,
    limits: DeviceLimits,
    heaps: Mutex<Vec<Arc<Heap<D>>>>,
}

impl<D> Allocator<D>
where
    D: Device,
{
    /// Create allocator for device
    /// with memory `properties` and `limits` fetched from physical device.
    pub fn new(
        device: Arc<D>,
        properties: MemoryProperties,
        limits: DeviceLimits,
        config: AllocatorConfig,
    ) -> Self {
        assert!(
            properties.types.len() <= 32,
            "Number of memory types must fit in u32 mask"
        );

        let limits = DeviceLimits {
            buffer_image_granularity: limits.buffer_image_granularity.max(1),
            non_coherent_atom_size: limits.non_coherent_atom_size.max(1),
            ..limits
        };

        let budget = memory_budget(&properties);
        let heap_sizes = config.heap_sizing.resolve(&budget);

        log::info!(
            "Create allocator: types: {:#?}, limits: {:#?}, budget: {:#?}, heap sizes: {:#?}",
            properties.types,
            limits,
            budget,
            heap_sizes
        );

        Allocator {
            device,
            types: properties.types,
            heap_sizes,
            limits,
            heaps: Mutex::new(Vec::new()),
        }
    }

    /// Memory types of the device.
    pub fn memory_types(&self) -> &[MemoryType] {
        &self.types
    }

    /// Device limits used by the allocator.
    pub fn limits(&self) -> &DeviceLimits {
        &self.limits
    }

    /// Default pooled heap sizes.
    pub fn heap_sizes(&self) -> &HeapSizes {
        &self.heap_sizes
    }

    /// Find memory type among allowed by `mask`.
    ///
    /// Preference order:
    /// type with exactly `optimal` properties,
    /// type with superset of `optimal` properties,
    /// type with exactly `minimal` properties,
    /// type with superset of `minimal` properties.
    pub fn select_memory_type(
        &self,
        mask: u32,
        minimal: Properties,
        optimal: Properties,
    ) -> Result<u32, AllocatorError> {
        let allowed = || {
            self.types
                .iter()
                .enumerate()
                .filter(move |&(index, _)| mask & (1u32 << index) != 0)
        };

        let find = |properties: Properties| {
            allowed()
                .find(|(_, ty)| ty.properties == properties)
                .or_else(|| allowed().find(|(_, ty)| ty.properties.contains(properties)))
                .map(|(index, _)| index as u32)
        };

        find(optimal)
            .or_else(|| find(minimal))
            .ok_or(AllocatorError::NoSuitableMemoryType(mask, minimal))
    }

    /// Default size of pooled heap for the memory type.
    pub fn default_heap_size(&self, memory_type: u32) -> u64 {
        self.heap_sizes
            .for_class(MemoryClass::of(self.types[memory_type as usize].properties))
    }

    /// Allocate chunk
    /// from one of memory types allowed by `requirements.type_mask`
    /// that has at least `minimal` and preferably `optimal` properties.
    pub fn allocate(
        &self,
        requirements: &MemoryRequirements,
        resource_type: ResourceType,
        minimal: Properties,
        optimal: Properties,
    ) -> Result<Chunk<D>, AllocatorError> {
        if requirements.size == 0 {
            return Err(AllocatorError::ZeroSize);
        }

        let memory_type = self.select_memory_type(requirements.type_mask, minimal, optimal)?;

        if requirements.prefers_dedicated && self.limits.dedicated_allocation_query {
            return self.allocate_dedicated(requirements.size, memory_type);
        }

        let size = requirements.size;
        let align = requirements.alignment.max(1);
        let heap_size = self.default_heap_size(memory_type);

        log::trace!(
            "Allocate: type: {}, size: {}, align: {}, resource: {:?}",
            memory_type,
            size,
            align,
            resource_type
        );

        if size > heap_size {
            return self.allocate_pseudo_dedicated(memory_type, resource_type, size);
        }

        let mut heaps = self.heaps.lock();

        // Tightest heaps first, keeping roomy ones for larger requests.
        let required = align_up(size, self.limits.buffer_image_granularity);
        let mut candidates = heaps
            .iter()
            .filter(|heap| heap.kind() != HeapKind::Dedicated && heap.memory_type() == memory_type)
            .map(|heap| (heap.free_space(), heap))
            .filter(|&(free_space, _)| free_space >= required)
            .collect::<SmallVec<[_; 16]>>();
        candidates.sort_by_key(|&(free_space, _)| free_space);

        for (_, heap) in candidates {
            if let Some(offset) = heap.try_allocate(resource_type, size, align) {
                return Ok(Chunk::new(Arc::clone(heap), offset, size));
            }
        }

        let heap = Arc::new(self.create_heap(memory_type, heap_size, HeapKind::Pooled)?);
        let offset = heap
            .try_allocate(resource_type, size, align)
            .ok_or(OutOfMemoryError::OutOfDeviceMemory)?;
        heaps.push(Arc::clone(&heap));
        Ok(Chunk::new(heap, offset, size))
    }

    /// Allocate chunk for intended `usage`.
    pub fn allocate_for_usage(
        &self,
        requirements: &MemoryRequirements,
        resource_type: ResourceType,
        usage: impl MemoryUsage,
    ) -> Result<Chunk<D>, AllocatorError> {
        self.allocate(requirements, resource_type, usage.minimal(), usage.optimal())
    }

    /// Allocate chunk and bind `target` to it.
    /// Chunk is released if binding fails.
    pub fn allocate_bound(
        &self,
        requirements: &MemoryRequirements,
        resource_type: ResourceType,
        minimal: Properties,
        optimal: Properties,
        target: BindTarget<'_, D>,
    ) -> Result<Chunk<D>, AllocatorError> {
        let chunk = self.allocate(requirements, resource_type, minimal, optimal)?;
        chunk.bind(target)?;
        Ok(chunk)
    }

    /// Allocate memory object of exactly `size` bytes for single resource.
    /// Memory is freed as soon as the chunk is released.
    pub fn allocate_dedicated(
        &self,
        size: u64,
        memory_type: u32,
    ) -> Result<Chunk<D>, AllocatorError> {
        if size == 0 {
            return Err(AllocatorError::ZeroSize);
        }

        if memory_type as usize >= self.types.len() {
            return Err(AllocatorError::NoSuitableMemoryType(
                1u32.checked_shl(memory_type).unwrap_or(0),
                Properties::empty(),
            ));
        }

        let heap = Arc::new(self.create_heap(memory_type, size, HeapKind::Dedicated)?);
        let offset = heap.occupy(ResourceType::Linear, size);
        self.heaps.lock().push(Arc::clone(&heap));
        Ok(Chunk::new(heap, offset, size))
    }

    fn allocate_pseudo_dedicated(
        &self,
        memory_type: u32,
        resource_type: ResourceType,
        size: u64,
    ) -> Result<Chunk<D>, AllocatorError> {
        let heap = Arc::new(self.create_heap(memory_type, size, HeapKind::PseudoDedicated)?);
        let offset = heap.occupy(resource_type, size);
        self.heaps.lock().push(Arc::clone(&heap));
        Ok(Chunk::new(heap, offset, size))
    }

    fn create_heap(
        &self,
        memory_type: u32,
        size: u64,
        kind: HeapKind,
    ) -> Result<Heap<D>, AllocatorError> {
        let properties = self.types[memory_type as usize].properties;

        // Candidate filtering counts free space in whole granularity pages.
        let mut size = size;
        if kind != HeapKind::Dedicated {
            size = align_up(size, self.limits.buffer_image_granularity);
        }
        if is_non_coherent_visible(properties) {
            size = align_up(size, self.limits.non_coherent_atom_size);
        }

        Heap::new(
            Arc::clone(&self.device),
            memory_type,
            properties,
            size,
            kind,
            &self.limits,
        )
        .map_err(|error| {
            log::error!(
                "Failed to allocate {:?} heap: type: {}, size: {}, error: {}",
                kind,
                memory_type,
                size,
                error
            );
            error.into()
        })
    }

    /// Destroy all heaps without allocations.
    pub fn clean(&self) {
        self.retain(|heap| heap.allocation_count() > 0);
    }

    /// Destroy dedicated and pseudo-dedicated heaps without allocations.
    /// Intended to be called once per frame.
    pub fn clean_dedicated(&self) {
        self.retain(|heap| !heap.kind().is_dedicated() || heap.allocation_count() > 0);
    }

    fn retain(&self, keep: impl Fn(&Heap<D>) -> bool) {
        // New allocations happen only under this lock, so counts can't grow meanwhile.
        let mut heaps = self.heaps.lock();
        let before = heaps.len();
        heaps.retain(|heap| keep(heap));
        if heaps.len() != before {
            log::debug!("Destroyed {} empty heaps", before - heaps.len());
        }
    }

    /// Number of heaps per memory class.
    pub fn heap_count(&self) -> PerClass<usize> {
        self.collect(|_| true, |_| 1)
    }

    /// Number of live chunks per memory class.
    pub fn allocation_count(&self) -> PerClass<usize> {
        self.collect(|_| true, Heap::allocation_count)
    }

    /// Bytes occupied by live chunks per memory class.
    pub fn used_memory(&self) -> PerClass<u64> {
        self.collect(|_| true, Heap::used)
    }

    /// Bytes of native memory held per memory class.
    pub fn allocated_memory(&self) -> PerClass<u64> {
        self.collect(|_| true, Heap::allocated)
    }

    /// Number of dedicated and pseudo-dedicated heaps per memory class.
    pub fn dedicated_heap_count(&self) -> PerClass<usize> {
        self.collect(|heap| heap.kind().is_dedicated(), |_| 1)
    }

    /// Number of live chunks in dedicated and pseudo-dedicated heaps per memory class.
    pub fn dedicated_allocation_count(&self) -> PerClass<usize> {
        self.collect(|heap| heap.kind().is_dedicated(), Heap::allocation_count)
    }

    /// Bytes occupied by live chunks in dedicated and pseudo-dedicated heaps per memory class.
    pub fn dedicated_used_memory(&self) -> PerClass<u64> {
        self.collect(|heap| heap.kind().is_dedicated(), Heap::used)
    }

    /// Bytes of native memory held by dedicated and pseudo-dedicated heaps per memory class.
    pub fn dedicated_allocated_memory(&self) -> PerClass<u64> {
        self.collect(|heap| heap.kind().is_dedicated(), Heap::allocated)
    }

    fn collect<T>(
        &self,
        filter: impl Fn(&Heap<D>) -> bool,
        value: impl Fn(&Heap<D>) -> T,
    ) -> PerClass<T>
    where
        T: Default + Copy + Add<Output = T>,
    {
        let heaps = self.heaps.lock();
        let mut result = PerClass::<T>::default();
        for heap in heaps.iter().filter(|heap| filter(heap)) {
            let bucket = &mut result[heap.class()];
            *bucket = *bucket + value(heap);
        }
        result
    }

    /// Get memory utilization.
    pub fn utilization(&self) -> TotalMemoryUtilization {
        let heaps = self.heaps.lock();
        TotalMemoryUtilization {
            heaps: heaps
                .iter()
                .map(|heap| HeapUtilization {
                    memory_type: heap.memory_type(),
                    class: heap.class(),
                    kind: heap.kind(),
                    allocations: heap.allocation_count(),
                    utilization: MemoryUtilization {
                        used: heap.used(),
                        allocated: heap.allocated(),
                    },
                })
                .collect(),
        }
    }

    #[cfg(test)]
    pub(crate) fn heaps(&self) -> Vec<Arc<Heap<D>>> {
        self.heaps.lock().clone()
    }
}

impl<D> Drop for Allocator<D>
where
    D: Device,
{
    fn drop(&mut self) {
        let heaps = self.heaps.get_mut();
        let alive = heaps
            .iter()
            .filter(|heap| heap.allocation_count() > 0)
            .count();
        if alive > 0 {
            log::warn!(
                "Allocator dropped while {} heaps still have live chunks",
                alive
            );
        }
    }
}
