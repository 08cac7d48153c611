use {
    crate::{
        allocator::{Allocator, HeapSizes, HeapSizing, MemoryRequirements},
        config::AllocatorConfig,
        device::{Device, DeviceLimits},
        error::*,
        memory::{MemoryProperties, MemoryType, Properties},
    },
    parking_lot::Mutex,
    std::{
        collections::HashSet,
        ops::Range,
        ptr::NonNull,
        sync::{
            atomic::{AtomicBool, AtomicU64, Ordering},
            Arc,
        },
    },
};

pub const DEVICE_LOCAL: u32 = 0;
pub const DEVICE_SHARED: u32 = 1;
pub const HOST_COHERENT: u32 = 2;
pub const HOST_CACHED: u32 = 3;

pub const KB: u64 = 1024;
pub const MB: u64 = 1024 * 1024;

#[derive(derivative::Derivative)]
#[derivative(Debug)]
pub struct MockMemory {
    pub id: u64,
    pub memory_type: u32,
    pub size: u64,
    mapped: bool,
    #[derivative(Debug = "ignore")]
    data: Option<Box<[u8]>>,
}

#[derive(Debug, Default)]
pub struct MockBuffer {
    /// Memory types buffer can be bound to.
    pub type_mask: u32,
    pub bound: Option<(u64, u64)>,
}

impl MockBuffer {
    pub fn new(type_mask: u32) -> Self {
        MockBuffer {
            type_mask,
            bound: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct MockImage {
    pub bound: Option<(u64, u64)>,
}

#[derive(Debug, Default)]
pub struct Calls {
    pub allocated: Vec<(u64, u32, u64)>,
    pub freed: HashSet<u64>,
    pub maps: usize,
    pub unmaps: usize,
    pub flushes: Vec<(u64, Range<u64>)>,
    pub invalidates: Vec<(u64, Range<u64>)>,
}

#[derive(Debug, Default)]
pub struct MockDevice {
    next: AtomicU64,
    fail: AtomicBool,
    calls: Mutex<Calls>,
}

impl MockDevice {
    /// Make following native allocations fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> parking_lot::MutexGuard<'_, Calls> {
        self.calls.lock()
    }

    /// Number of memory objects allocated and not freed.
    pub fn live(&self) -> usize {
        let calls = self.calls.lock();
        calls.allocated.len() - calls.freed.len()
    }

    pub fn is_freed(&self, id: u64) -> bool {
        self.calls.lock().freed.contains(&id)
    }

    /// Id of the last allocated memory object.
    pub fn last_id(&self) -> u64 {
        self.calls.lock().allocated.last().expect("Nothing allocated").0
    }
}

impl Device for MockDevice {
    type Memory = MockMemory;
    type Buffer = MockBuffer;
    type Image = MockImage;

    unsafe fn allocate(&self, memory_type: u32, size: u64) -> Result<MockMemory, AllocationError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(OutOfMemoryError::OutOfDeviceMemory.into());
        }
        let id = self.next.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().allocated.push((id, memory_type, size));
        Ok(MockMemory {
            id,
            memory_type,
            size,
            mapped: false,
            data: None,
        })
    }

    unsafe fn free(&self, memory: MockMemory) {
        assert!(!memory.mapped, "Memory {} freed while mapped", memory.id);
        assert!(
            self.calls.lock().freed.insert(memory.id),
            "Double-free of memory {}",
            memory.id
        );
    }

    unsafe fn map(&self, memory: &mut MockMemory, size: u64) -> Result<NonNull<u8>, MappingError> {
        assert!(!memory.mapped, "Memory {} is mapped twice", memory.id);
        assert_eq!(size, memory.size);
        let data = memory
            .data
            .get_or_insert_with(|| vec![0u8; size as usize].into_boxed_slice());
        memory.mapped = true;
        self.calls.lock().maps += 1;
        NonNull::new(data.as_mut_ptr()).ok_or(MappingError::MappingFailed)
    }

    unsafe fn unmap(&self, memory: &mut MockMemory) {
        assert!(memory.mapped, "Memory {} is not mapped", memory.id);
        memory.mapped = false;
        self.calls.lock().unmaps += 1;
    }

    unsafe fn flush(&self, memory: &MockMemory, range: Range<u64>) -> Result<(), OutOfMemoryError> {
        assert!(memory.mapped);
        assert!(range.end <= memory.size);
        self.calls.lock().flushes.push((memory.id, range));
        Ok(())
    }

    unsafe fn invalidate(
        &self,
        memory: &MockMemory,
        range: Range<u64>,
    ) -> Result<(), OutOfMemoryError> {
        assert!(memory.mapped);
        assert!(range.end <= memory.size);
        self.calls.lock().invalidates.push((memory.id, range));
        Ok(())
    }

    unsafe fn bind_buffer(
        &self,
        memory: &MockMemory,
        offset: u64,
        buffer: &mut MockBuffer,
    ) -> Result<(), BindError> {
        if buffer.type_mask & (1 << memory.memory_type) == 0 {
            return Err(BindError::WrongMemory);
        }
        if offset >= memory.size {
            return Err(BindError::OutOfBounds);
        }
        buffer.bound = Some((memory.id, offset));
        Ok(())
    }

    unsafe fn bind_image(
        &self,
        memory: &MockMemory,
        offset: u64,
        image: &mut MockImage,
    ) -> Result<(), BindError> {
        if offset >= memory.size {
            return Err(BindError::OutOfBounds);
        }
        image.bound = Some((memory.id, offset));
        Ok(())
    }
}

/// Discrete GPU layout: device-local heap, small host-visible device window, and system memory.
pub fn properties() -> MemoryProperties {
    MemoryProperties {
        types: vec![
            MemoryType {
                properties: Properties::DEVICE_LOCAL,
                heap_index: 0,
            },
            MemoryType {
                properties: Properties::DEVICE_LOCAL
                    | Properties::HOST_VISIBLE
                    | Properties::HOST_COHERENT,
                heap_index: 1,
            },
            MemoryType {
                properties: Properties::HOST_VISIBLE | Properties::HOST_COHERENT,
                heap_index: 2,
            },
            MemoryType {
                properties: Properties::HOST_VISIBLE | Properties::HOST_CACHED,
                heap_index: 2,
            },
        ],
        heaps: vec![256 * MB, 16 * MB, 512 * MB],
    }
}

pub fn limits() -> DeviceLimits {
    DeviceLimits {
        buffer_image_granularity: 4096,
        non_coherent_atom_size: 64,
        dedicated_allocation_query: true,
    }
}

pub fn config() -> AllocatorConfig {
    AllocatorConfig {
        heap_sizing: HeapSizing::Fixed(HeapSizes {
            device_local: MB,
            device_shared: 256 * KB,
            host_shared: MB,
        }),
    }
}

pub fn allocator_with_config(
    limits: DeviceLimits,
    config: AllocatorConfig,
) -> (Arc<MockDevice>, Allocator<MockDevice>) {
    let device = Arc::new(MockDevice::default());
    let allocator = Allocator::new(Arc::clone(&device), properties(), limits, config);
    (device, allocator)
}

pub fn allocator_with(limits: DeviceLimits) -> (Arc<MockDevice>, Allocator<MockDevice>) {
    allocator_with_config(limits, config())
}

pub fn allocator() -> (Arc<MockDevice>, Allocator<MockDevice>) {
    allocator_with(limits())
}

pub fn requirements(size: u64, alignment: u64, memory_type: u32) -> MemoryRequirements {
    MemoryRequirements {
        size,
        alignment,
        type_mask: 1 << memory_type,
        prefers_dedicated: false,
    }
}
