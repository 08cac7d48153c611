use {crate::memory::Properties, std::ops::Range};

pub(crate) fn align_up(value: u64, align: u64) -> u64 {
    debug_assert_ne!(align, 0, "Alignment must be non-zero");
    match value % align {
        0 => value,
        rem => value + (align - rem),
    }
}

pub(crate) fn align_down(value: u64, align: u64) -> u64 {
    debug_assert_ne!(align, 0, "Alignment must be non-zero");
    value - value % align
}

/// Expand range so that both ends are multiple of `align`.
pub(crate) fn align_range(range: Range<u64>, align: u64) -> Range<u64> {
    align_down(range.start, align)..align_up(range.end, align)
}

/// Smallest power of two greater than or equal to `value`.
pub(crate) fn upper_power_of_two(value: u64) -> u64 {
    value.max(1).next_power_of_two()
}

pub(crate) fn is_non_coherent_visible(properties: Properties) -> bool {
    properties & (Properties::HOST_VISIBLE | Properties::HOST_COHERENT) == Properties::HOST_VISIBLE
}

#[cfg(target_pointer_width = "64")]
pub(crate) fn fits_usize(_value: u64) -> bool {
    true
}

#[cfg(not(target_pointer_width = "64"))]
pub(crate) fn fits_usize(value: u64) -> bool {
    value <= usize::max_value() as u64
}
