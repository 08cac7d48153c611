use crate::allocator::HeapSizing;

/// Config for `Allocator`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllocatorConfig {
    /// Policy for default sizes of pooled heaps.
    pub heap_sizing: HeapSizing,
}
