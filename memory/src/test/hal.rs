use crate::{error::OutOfMemoryError, memory::Properties};

#[test]
fn properties_conversion() {
    let all = Properties::all();
    let hal: gfx_hal::memory::Properties = all.into();
    assert_eq!(
        hal,
        gfx_hal::memory::Properties::DEVICE_LOCAL
            | gfx_hal::memory::Properties::CPU_VISIBLE
            | gfx_hal::memory::Properties::COHERENT
            | gfx_hal::memory::Properties::CPU_CACHED
            | gfx_hal::memory::Properties::LAZILY_ALLOCATED
    );
    assert_eq!(Properties::from(hal), all);

    let upload = Properties::HOST_VISIBLE | Properties::HOST_COHERENT;
    assert_eq!(
        Properties::from(gfx_hal::memory::Properties::from(upload)),
        upload
    );
}

#[test]
fn out_of_memory_conversion() {
    assert_eq!(
        OutOfMemoryError::from(gfx_hal::device::OutOfMemory::Host),
        OutOfMemoryError::OutOfHostMemory
    );
    assert_eq!(
        OutOfMemoryError::from(gfx_hal::device::OutOfMemory::Device),
        OutOfMemoryError::OutOfDeviceMemory
    );
}
