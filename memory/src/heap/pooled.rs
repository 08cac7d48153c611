use {crate::util::*, smallvec::SmallVec};

/// Kind of resource memory range is occupied by.
/// Neighbor ranges of different kinds must not share a page of `buffer_image_granularity` size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceType {
    /// Buffers and linearly tiled images.
    Linear,

    /// Optimally tiled images.
    NonLinear,
}

/// Occupied range of the pooled heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MemoryRange {
    pub(crate) offset: u64,
    pub(crate) size: u64,
    pub(crate) ty: ResourceType,
}

impl MemoryRange {
    pub(crate) fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// First-fit sub-allocator over single memory object.
///
/// Only occupied ranges are tracked, sorted by offset.
/// Free space is whatever lies between, before and after them,
/// so released ranges coalesce with their neighbors automatically.
#[derive(Debug)]
pub(crate) struct Pool {
    size: u64,
    granularity: u64,
    ranges: SmallVec<[MemoryRange; 16]>,
}

impl Pool {
    pub(crate) fn new(size: u64, granularity: u64) -> Self {
        Pool {
            size,
            granularity: granularity.max(1),
            ranges: SmallVec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn ranges(&self) -> &[MemoryRange] {
        &self.ranges
    }

    /// Find place for the range and occupy it.
    /// Returns offset of the new range.
    pub(crate) fn allocate(&mut self, ty: ResourceType, size: u64, align: u64) -> Option<u64> {
        debug_assert_ne!(size, 0, "Zero-sized allocations are not supported");
        let align = align.max(1);

        let last = match self.ranges.last() {
            Some(last) => *last,
            None => {
                if size > self.size {
                    return None;
                }
                self.ranges.push(MemoryRange {
                    offset: 0,
                    size,
                    ty,
                });
                return Some(0);
            }
        };

        let offset = self.start_after(&last, ty, align);
        if fits(offset, self.size, size) {
            self.ranges.push(MemoryRange { offset, size, ty });
            return Some(offset);
        }

        // Space before the first range.
        if fits(0, self.end_before(&self.ranges[0], ty), size) {
            self.ranges.insert(0, MemoryRange {
                offset: 0,
                size,
                ty,
            });
            return Some(0);
        }

        let index = self.ranges.windows(2).position(|pair| {
            let start = self.start_after(&pair[0], ty, align);
            fits(start, self.end_before(&pair[1], ty), size)
        })?;

        let offset = self.start_after(&self.ranges[index], ty, align);
        self.ranges.insert(index + 1, MemoryRange { offset, size, ty });
        Some(offset)
    }

    /// Occupy range at the beginning of the empty pool.
    pub(crate) fn occupy(&mut self, ty: ResourceType, size: u64) -> u64 {
        debug_assert!(self.ranges.is_empty(), "Pool is not empty");
        debug_assert!(size <= self.size, "Range doesn't fit into the pool");
        self.ranges.push(MemoryRange {
            offset: 0,
            size,
            ty,
        });
        0
    }

    /// Release range starting at `offset`.
    /// Returns size of the released range.
    pub(crate) fn release(&mut self, offset: u64) -> Option<u64> {
        match self.ranges.binary_search_by_key(&offset, |range| range.offset) {
            Ok(index) => Some(self.ranges.remove(index).size),
            Err(_) => {
                debug_assert!(false, "No range at offset {} in pool {:#?}", offset, self);
                None
            }
        }
    }

    /// First offset after `prev` suitable for range of type `ty`.
    fn start_after(&self, prev: &MemoryRange, ty: ResourceType, align: u64) -> u64 {
        if prev.ty == ty {
            align_up(prev.end(), align)
        } else {
            align_up(prev.end(), align.max(self.granularity))
        }
    }

    /// End of the space before `next` available for range of type `ty`.
    fn end_before(&self, next: &MemoryRange, ty: ResourceType) -> u64 {
        if next.ty == ty {
            next.offset
        } else {
            align_down(next.offset, self.granularity)
        }
    }
}

fn fits(start: u64, end: u64, size: u64) -> bool {
    end.checked_sub(start).map_or(false, |space| space >= size)
}
