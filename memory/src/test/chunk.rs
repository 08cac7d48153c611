use {
    super::mock::*,
    crate::{error::*, heap::ResourceType, usage::*},
};

#[test]
fn mapping_is_shared_by_chunks_of_heap() {
    let (device, allocator) = allocator();
    let mut a = allocator
        .allocate_for_usage(&requirements(KB, 256, HOST_COHERENT), ResourceType::Linear, Upload)
        .unwrap();
    let mut b = allocator
        .allocate_for_usage(&requirements(KB, 256, HOST_COHERENT), ResourceType::Linear, Upload)
        .unwrap();

    let pa = a.map().unwrap();
    let pb = b.map().unwrap();
    assert!(a.is_mapped() && b.is_mapped());
    assert_eq!(pb.as_ptr() as usize - pa.as_ptr() as usize, KB as usize);
    assert_eq!(device.calls().maps, 1);

    a.unmap();
    assert_eq!(device.calls().unmaps, 0);
    b.unmap();
    assert_eq!(device.calls().unmaps, 1);

    b.map().unwrap();
    assert_eq!(device.calls().maps, 2);
    drop(b);
    assert_eq!(device.calls().unmaps, 2);
}

#[test]
fn coherent_memory_is_not_flushed() {
    let (device, allocator) = allocator();
    let mut chunk = allocator
        .allocate_for_usage(&requirements(KB, 1, HOST_COHERENT), ResourceType::Linear, Upload)
        .unwrap();
    chunk.map().unwrap();
    chunk.flush().unwrap();
    chunk.invalidate_range(0..16).unwrap();
    chunk.unmap();

    let calls = device.calls();
    assert!(calls.flushes.is_empty());
    assert!(calls.invalidates.is_empty());
}

#[test]
fn device_local_memory_can_not_be_mapped() {
    let (device, allocator) = allocator();
    let mut chunk = allocator
        .allocate_for_usage(&requirements(KB, 1, DEVICE_LOCAL), ResourceType::Linear, Data)
        .unwrap();
    assert_eq!(chunk.map().unwrap_err(), MappingError::HostInvisible);
    assert!(!chunk.is_mapped());
    assert_eq!(
        chunk.write(0, &[1u8]).unwrap_err(),
        MemoryError::MappingError(MappingError::HostInvisible)
    );
    assert_eq!(device.calls().maps, 0);
}

#[test]
fn write_and_read_back() {
    let (device, allocator) = allocator();
    let _padding = allocator
        .allocate_for_usage(&requirements(100, 1, HOST_CACHED), ResourceType::Linear, Download)
        .unwrap();
    let mut chunk = allocator
        .allocate_for_usage(&requirements(KB, 16, HOST_CACHED), ResourceType::Linear, Download)
        .unwrap();
    assert_eq!(chunk.offset(), 112);
    let id = device.last_id();

    chunk.write(16, &[1u32, 2, 3, 4]).unwrap();
    assert!(!chunk.is_mapped());
    assert_eq!(device.calls().flushes, vec![(id, 128..192)]);

    let mut data = [0u32; 4];
    chunk.read(16, &mut data).unwrap();
    assert_eq!(data, [1, 2, 3, 4]);
    assert_eq!(device.calls().invalidates, vec![(id, 128..192)]);

    // Mapping survives helpers when chunk was mapped by the caller.
    let ptr = chunk.map_as::<u32>().unwrap();
    chunk.write(0, &[7u32]).unwrap();
    assert!(chunk.is_mapped());
    assert_eq!(unsafe { *ptr.as_ptr() }, 7);
    assert_eq!(unsafe { *ptr.as_ptr().add(4) }, 1);
    chunk.unmap();

    let calls = device.calls();
    assert_eq!(calls.maps, 3);
    assert_eq!(calls.unmaps, 3);
}

#[test]
fn dedicated_chunk_is_unmapped_before_free() {
    let (device, allocator) = allocator();
    let mut chunk = allocator.allocate_dedicated(3 * KB, HOST_CACHED).unwrap();
    let id = device.last_id();
    assert_eq!(device.calls().allocated, vec![(id, HOST_CACHED, 3 * KB)]);

    chunk.map().unwrap();
    chunk.flush_range(KB..KB + 1).unwrap();
    assert_eq!(device.calls().flushes, vec![(id, KB..KB + 64)]);

    drop(chunk);
    assert!(device.is_freed(id));
    assert_eq!(device.calls().unmaps, 1);
    allocator.clean_dedicated();
    assert_eq!(allocator.heap_count().total(), 0);
}

#[test]
fn bind_at_chunk_offset() {
    let (device, allocator) = allocator();
    let _first = allocator
        .allocate_for_usage(&requirements(KB, 1, DEVICE_LOCAL), ResourceType::Linear, Data)
        .unwrap();
    let chunk = allocator
        .allocate_for_usage(&requirements(KB, 1, DEVICE_LOCAL), ResourceType::NonLinear, Data)
        .unwrap();

    let mut image = MockImage::default();
    chunk.bind_image(&mut image).unwrap();
    assert_eq!(image.bound, Some((device.last_id(), 4096)));

    let mut buffer = MockBuffer::new(1 << HOST_COHERENT);
    assert_eq!(chunk.bind_buffer(&mut buffer), Err(BindError::WrongMemory));
}
