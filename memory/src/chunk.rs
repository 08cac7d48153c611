use {
    crate::{
        device::Device,
        error::*,
        heap::{Heap, HeapKind},
        memory::Properties,
        util::fits_usize,
    },
    std::{
        mem::{align_of, size_of, size_of_val},
        ops::Range,
        ptr::{copy_nonoverlapping, NonNull},
        sync::Arc,
    },
};

/// Resource memory can be bound to.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub enum BindTarget<'a, D: Device> {
    /// Buffer object.
    Buffer(#[derivative(Debug = "ignore")] &'a mut D::Buffer),

    /// Image object.
    Image(#[derivative(Debug = "ignore")] &'a mut D::Image),
}

/// Range of memory sub-allocated from a heap.
///
/// Dropping the chunk returns the range to its heap.
/// Chunk keeps its heap alive, so the native memory is never freed under it.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Chunk<D: Device> {
    heap: Arc<Heap<D>>,
    offset: u64,
    size: u64,
    mapping: Option<NonNull<u8>>,
}

unsafe impl<D> Send for Chunk<D> where D: Device {}
unsafe impl<D> Sync for Chunk<D> where D: Device {}

impl<D> Chunk<D>
where
    D: Device,
{
    pub(crate) fn new(heap: Arc<Heap<D>>, offset: u64, size: u64) -> Self {
        log::trace!(
            "Allocate chunk: type: {}, offset: {}, size: {}",
            heap.memory_type(),
            offset,
            size
        );
        Chunk {
            heap,
            offset,
            size,
            mapping: None,
        }
    }

    /// Offset of the chunk inside the native memory object.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Size of the chunk.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Range of the native memory object occupied by the chunk.
    pub fn range(&self) -> Range<u64> {
        self.offset..self.offset + self.size
    }

    /// Memory type index of the chunk's heap.
    pub fn memory_type(&self) -> u32 {
        self.heap.memory_type()
    }

    /// Memory properties of the chunk's heap.
    pub fn properties(&self) -> Properties {
        self.heap.properties()
    }

    /// Kind of heap the chunk was allocated from.
    pub fn heap_kind(&self) -> HeapKind {
        self.heap.kind()
    }

    /// Check if chunk is mapped.
    pub fn is_mapped(&self) -> bool {
        self.mapping.is_some()
    }

    /// Bind resource to the chunk's memory.
    pub fn bind(&self, target: BindTarget<'_, D>) -> Result<(), BindError> {
        self.heap.bind(self.offset, target)
    }

    /// Bind buffer to the chunk's memory.
    pub fn bind_buffer(&self, buffer: &mut D::Buffer) -> Result<(), BindError> {
        self.bind(BindTarget::Buffer(buffer))
    }

    /// Bind image to the chunk's memory.
    pub fn bind_image(&self, image: &mut D::Image) -> Result<(), BindError> {
        self.bind(BindTarget::Image(image))
    }

    /// Map chunk to the host address space.
    /// Returns pointer to the chunk's first byte.
    ///
    /// The whole heap gets mapped and the mapping is shared by all chunks of the heap.
    /// Chunk must not be mapped already.
    pub fn map(&mut self) -> Result<NonNull<u8>, MappingError> {
        debug_assert!(self.mapping.is_none(), "Chunk is already mapped");
        debug_assert!(fits_usize(self.offset + self.size));

        let ptr = self.heap.map()?;
        // Mapping covers the whole heap, chunk range lies inside it.
        let ptr = unsafe { NonNull::new_unchecked(ptr.as_ptr().add(self.offset as usize)) };
        self.mapping = Some(ptr);
        Ok(ptr)
    }

    /// Map chunk and cast pointer to `T`.
    pub fn map_as<T>(&mut self) -> Result<NonNull<T>, MappingError> {
        let ptr = self.map()?;
        debug_assert_eq!(
            ptr.as_ptr() as usize % align_of::<T>(),
            0,
            "Chunk offset doesn't satisfy alignment of the type"
        );
        Ok(ptr.cast())
    }

    /// Unmap chunk.
    /// Chunk must be mapped.
    pub fn unmap(&mut self) {
        debug_assert!(self.mapping.is_some(), "Chunk is not mapped");
        if self.mapping.take().is_some() {
            self.heap.unmap();
        }
    }

    /// Flush host writes to the whole chunk.
    /// No-op for coherent memory.
    pub fn flush(&self) -> Result<(), OutOfMemoryError> {
        self.heap.flush(self.range())
    }

    /// Flush host writes to the `range` relative to the chunk.
    pub fn flush_range(&self, range: Range<u64>) -> Result<(), OutOfMemoryError> {
        self.heap.flush(self.sub_range(range))
    }

    /// Make device writes to the whole chunk visible to the host.
    /// No-op for coherent memory.
    pub fn invalidate(&self) -> Result<(), OutOfMemoryError> {
        self.heap.invalidate(self.range())
    }

    /// Make device writes to the `range` relative to the chunk visible to the host.
    pub fn invalidate_range(&self, range: Range<u64>) -> Result<(), OutOfMemoryError> {
        self.heap.invalidate(self.sub_range(range))
    }

    /// Copy `data` into the chunk at `offset` and flush it.
    /// Chunk is mapped for the duration of the call unless it is mapped already.
    ///
    /// # Panics
    ///
    /// Panics if data doesn't fit into the chunk.
    pub fn write<T: Copy>(&mut self, offset: u64, data: &[T]) -> Result<(), MemoryError> {
        let bytes = size_of_val(data) as u64;
        assert!(
            offset + bytes <= self.size,
            "Writing {} bytes at {} out of chunk of size {}",
            bytes,
            offset,
            self.size
        );

        let was_mapped = self.mapping.is_some();
        let ptr = match self.mapping {
            Some(ptr) => ptr,
            None => self.map()?,
        };

        unsafe {
            copy_nonoverlapping(
                data.as_ptr() as *const u8,
                ptr.as_ptr().add(offset as usize),
                bytes as usize,
            );
        }

        let flushed = self.flush_range(offset..offset + bytes);
        if !was_mapped {
            self.unmap();
        }
        flushed.map_err(Into::into)
    }

    /// Invalidate range at `offset` and copy it from the chunk into `data`.
    /// Chunk is mapped for the duration of the call unless it is mapped already.
    ///
    /// # Panics
    ///
    /// Panics if range doesn't fit into the chunk.
    pub fn read<T: Copy>(&mut self, offset: u64, data: &mut [T]) -> Result<(), MemoryError> {
        let bytes = (data.len() * size_of::<T>()) as u64;
        assert!(
            offset + bytes <= self.size,
            "Reading {} bytes at {} out of chunk of size {}",
            bytes,
            offset,
            self.size
        );

        let was_mapped = self.mapping.is_some();
        let ptr = match self.mapping {
            Some(ptr) => ptr,
            None => self.map()?,
        };

        let result = self.invalidate_range(offset..offset + bytes).map(|()| unsafe {
            copy_nonoverlapping(
                ptr.as_ptr().add(offset as usize) as *const u8,
                data.as_mut_ptr() as *mut u8,
                bytes as usize,
            );
        });

        if !was_mapped {
            self.unmap();
        }
        result.map_err(Into::into)
    }

    fn sub_range(&self, range: Range<u64>) -> Range<u64> {
        debug_assert!(range.start <= range.end, "Range must have valid size");
        debug_assert!(range.end <= self.size, "Range is out of chunk bounds");
        self.offset + range.start..self.offset + range.end
    }
}

impl<D> Drop for Chunk<D>
where
    D: Device,
{
    fn drop(&mut self) {
        if self.mapping.take().is_some() {
            self.heap.unmap();
        }
        log::trace!(
            "Release chunk: type: {}, offset: {}, size: {}",
            self.heap.memory_type(),
            self.offset,
            self.size
        );
        self.heap.release(self.offset);
    }
}
