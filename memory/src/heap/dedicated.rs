/// Single-slot state of a heap that serves exactly one allocation.
#[derive(Debug, Default)]
pub(crate) struct Dedicated {
    occupied: Option<u64>,
}

impl Dedicated {
    pub(crate) fn occupy(&mut self, size: u64) -> u64 {
        debug_assert!(self.occupied.is_none(), "Dedicated heap is already occupied");
        self.occupied = Some(size);
        0
    }

    /// Returns size of the released allocation.
    pub(crate) fn release(&mut self, offset: u64) -> Option<u64> {
        debug_assert_eq!(offset, 0, "Dedicated allocation always starts at zero");
        let size = self.occupied.take();
        debug_assert!(size.is_some(), "Dedicated heap is not occupied");
        size
    }
}
