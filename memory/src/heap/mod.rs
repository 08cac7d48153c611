mod dedicated;
pub(crate) mod pooled;

pub use self::pooled::ResourceType;

use {
    self::{dedicated::Dedicated, pooled::Pool},
    crate::{
        chunk::BindTarget,
        device::{Device, DeviceLimits},
        error::*,
        memory::{MemoryClass, Properties},
        util::*,
    },
    parking_lot::Mutex,
    std::{
        ops::Range,
        ptr::NonNull,
        sync::atomic::{AtomicU64, AtomicUsize, Ordering},
        sync::Arc,
    },
};

/// How heap serves its allocations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeapKind {
    /// Heap of default size shared by many chunks.
    Pooled,

    /// Pooled heap sized for one request larger than default heap size.
    /// After that chunk is released it may serve other requests.
    PseudoDedicated,

    /// Heap created for single resource.
    /// Its memory is freed as soon as the chunk is released.
    Dedicated,
}

impl HeapKind {
    /// Check if heap was sized for single allocation.
    pub fn is_dedicated(self) -> bool {
        self != HeapKind::Pooled
    }
}

#[derive(Debug)]
enum Layout {
    Pooled(Pool),
    Dedicated(Dedicated),
}

#[derive(Debug)]
struct State<M> {
    /// `None` once dedicated heap released its only allocation.
    memory: Option<M>,
    mapping: Option<NonNull<u8>>,
    map_count: u64,
    layout: Layout,
}

// Mapping pointer is only touched under the heap lock.
unsafe impl<M> Send for State<M> where M: Send {}

/// Single native memory allocation and chunks sub-allocated from it.
///
/// `free_space` and `allocation_count` are written only while `state` is locked
/// but can be read without locking.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub(crate) struct Heap<D: Device> {
    #[derivative(Debug = "ignore")]
    device: Arc<D>,
    memory_type: u32,
    properties: Properties,
    kind: HeapKind,
    size: u64,
    non_coherent_atom_size: u64,
    free_space: AtomicU64,
    allocation_count: AtomicUsize,
    #[derivative(Debug = "ignore")]
    state: Mutex<State<D::Memory>>,
}

impl<D> Heap<D>
where
    D: Device,
{
    /// Allocate native memory for the heap.
    pub(crate) fn new(
        device: Arc<D>,
        memory_type: u32,
        properties: Properties,
        size: u64,
        kind: HeapKind,
        limits: &DeviceLimits,
    ) -> Result<Self, AllocationError> {
        let memory = unsafe { device.allocate(memory_type, size)? };

        log::debug!(
            "Create {:?} heap: type: {}, properties: {:?}, size: {}",
            kind,
            memory_type,
            properties,
            size
        );

        let layout = match kind {
            HeapKind::Dedicated => Layout::Dedicated(Dedicated::default()),
            HeapKind::Pooled | HeapKind::PseudoDedicated => {
                Layout::Pooled(Pool::new(size, limits.buffer_image_granularity))
            }
        };

        Ok(Heap {
            device,
            memory_type,
            properties,
            kind,
            size,
            non_coherent_atom_size: limits.non_coherent_atom_size.max(1),
            free_space: AtomicU64::new(size),
            allocation_count: AtomicUsize::new(0),
            state: Mutex::new(State {
                memory: Some(memory),
                mapping: None,
                map_count: 0,
                layout,
            }),
        })
    }

    pub(crate) fn memory_type(&self) -> u32 {
        self.memory_type
    }

    pub(crate) fn properties(&self) -> Properties {
        self.properties
    }

    pub(crate) fn class(&self) -> MemoryClass {
        MemoryClass::of(self.properties)
    }

    pub(crate) fn kind(&self) -> HeapKind {
        self.kind
    }

    #[cfg(test)]
    pub(crate) fn size(&self) -> u64 {
        self.size
    }

    pub(crate) fn free_space(&self) -> u64 {
        self.free_space.load(Ordering::Relaxed)
    }

    pub(crate) fn allocation_count(&self) -> usize {
        self.allocation_count.load(Ordering::Relaxed)
    }

    /// Bytes occupied by chunks.
    pub(crate) fn used(&self) -> u64 {
        self.size - self.free_space()
    }

    /// Bytes of native memory held by the heap.
    pub(crate) fn allocated(&self) -> u64 {
        match self.kind {
            HeapKind::Dedicated if self.allocation_count() == 0 => 0,
            _ => self.size,
        }
    }

    /// Try to place new range into pooled heap.
    /// Returns offset of the new range.
    /// Dedicated heaps never accept allocations this way.
    pub(crate) fn try_allocate(&self, ty: ResourceType, size: u64, align: u64) -> Option<u64> {
        let mut state = self.state.lock();
        let offset = match &mut state.layout {
            Layout::Pooled(pool) => pool.allocate(ty, size, align)?,
            Layout::Dedicated(_) => return None,
        };
        self.free_space.fetch_sub(size, Ordering::Relaxed);
        self.allocation_count.fetch_add(1, Ordering::Relaxed);
        Some(offset)
    }

    /// Occupy freshly created heap with single range.
    pub(crate) fn occupy(&self, ty: ResourceType, size: u64) -> u64 {
        let mut state = self.state.lock();
        let offset = match &mut state.layout {
            Layout::Pooled(pool) => {
                let offset = pool.occupy(ty, size);
                self.free_space.fetch_sub(size, Ordering::Relaxed);
                offset
            }
            Layout::Dedicated(dedicated) => {
                let offset = dedicated.occupy(size);
                // Native size may be rounded up past the request.
                self.free_space.store(self.size - size, Ordering::Relaxed);
                offset
            }
        };
        let count = self.allocation_count.fetch_add(1, Ordering::Relaxed);
        debug_assert_eq!(count, 0, "Heap must be empty to be occupied");
        offset
    }

    /// Release range starting at `offset`.
    /// Dedicated heap frees its native memory right away.
    pub(crate) fn release(&self, offset: u64) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        match &mut state.layout {
            Layout::Pooled(pool) => {
                if let Some(size) = pool.release(offset) {
                    self.free_space.fetch_add(size, Ordering::Relaxed);
                    self.allocation_count.fetch_sub(1, Ordering::Relaxed);
                }
            }
            Layout::Dedicated(dedicated) => {
                if dedicated.release(offset).is_some() {
                    self.free_space.store(self.size, Ordering::Relaxed);
                    self.allocation_count.fetch_sub(1, Ordering::Relaxed);
                    if let Some(mut memory) = state.memory.take() {
                        unsafe {
                            if state.mapping.take().is_some() {
                                self.device.unmap(&mut memory);
                            }
                            state.map_count = 0;
                            log::debug!(
                                "Free dedicated heap: type: {}, size: {}",
                                self.memory_type,
                                self.size
                            );
                            self.device.free(memory);
                        }
                    }
                }
            }
        }
    }

    /// Map whole heap, or share existing mapping.
    /// Every successful call must be paired with `unmap`.
    pub(crate) fn map(&self) -> Result<NonNull<u8>, MappingError> {
        if !self.properties.host_visible() {
            return Err(MappingError::HostInvisible);
        }

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let ptr = match state.mapping {
            Some(ptr) => ptr,
            None => {
                let memory = state.memory.as_mut().ok_or(MappingError::MappingFailed)?;
                debug_assert!(fits_usize(self.size), "Mapped heap must fit in address space");
                let ptr = unsafe { self.device.map(memory, self.size)? };
                log::trace!("Map heap: type: {}, size: {}", self.memory_type, self.size);
                state.mapping = Some(ptr);
                ptr
            }
        };
        state.map_count += 1;
        Ok(ptr)
    }

    pub(crate) fn unmap(&self) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        debug_assert_ne!(state.map_count, 0, "Heap is not mapped");
        if state.map_count == 0 {
            return;
        }

        state.map_count -= 1;
        if state.map_count == 0 {
            if let (Some(_), Some(memory)) = (state.mapping.take(), state.memory.as_mut()) {
                log::trace!("Unmap heap: type: {}, size: {}", self.memory_type, self.size);
                unsafe { self.device.unmap(memory) }
            }
        }
    }

    /// Flush host writes in `range`.
    /// No-op for coherent memory.
    pub(crate) fn flush(&self, range: Range<u64>) -> Result<(), OutOfMemoryError> {
        if !is_non_coherent_visible(self.properties) {
            return Ok(());
        }
        let range = self.atom_range(range);
        let state = self.state.lock();
        debug_assert!(state.mapping.is_some(), "Flushing memory that is not mapped");
        match &state.memory {
            Some(memory) => unsafe { self.device.flush(memory, range) },
            None => Ok(()),
        }
    }

    /// Make device writes in `range` visible to the host.
    /// No-op for coherent memory.
    pub(crate) fn invalidate(&self, range: Range<u64>) -> Result<(), OutOfMemoryError> {
        if !is_non_coherent_visible(self.properties) {
            return Ok(());
        }
        let range = self.atom_range(range);
        let state = self.state.lock();
        debug_assert!(state.mapping.is_some(), "Invalidating memory that is not mapped");
        match &state.memory {
            Some(memory) => unsafe { self.device.invalidate(memory, range) },
            None => Ok(()),
        }
    }

    pub(crate) fn bind(&self, offset: u64, target: BindTarget<'_, D>) -> Result<(), BindError> {
        let state = self.state.lock();
        let memory = state.memory.as_ref().ok_or(BindError::WrongMemory)?;
        unsafe {
            match target {
                BindTarget::Buffer(buffer) => self.device.bind_buffer(memory, offset, buffer),
                BindTarget::Image(image) => self.device.bind_image(memory, offset, image),
            }
        }
    }

    /// Snapshot of occupied ranges of the pooled heap.
    #[cfg(test)]
    pub(crate) fn ranges(&self) -> Vec<pooled::MemoryRange> {
        match &self.state.lock().layout {
            Layout::Pooled(pool) => pool.ranges().to_vec(),
            Layout::Dedicated(_) => Vec::new(),
        }
    }

    fn atom_range(&self, range: Range<u64>) -> Range<u64> {
        let aligned = align_range(range, self.non_coherent_atom_size);
        aligned.start..aligned.end.min(self.size)
    }
}

impl<D> Drop for Heap<D>
where
    D: Device,
{
    fn drop(&mut self) {
        debug_assert_eq!(
            *self.allocation_count.get_mut(),
            0,
            "Heap destroyed while chunks are still allocated from it"
        );

        let state = self.state.get_mut();
        if let Some(mut memory) = state.memory.take() {
            unsafe {
                if state.mapping.take().is_some() {
                    self.device.unmap(&mut memory);
                }
                log::debug!(
                    "Free {:?} heap: type: {}, size: {}",
                    self.kind,
                    self.memory_type,
                    self.size
                );
                self.device.free(memory);
            }
        }
    }
}
