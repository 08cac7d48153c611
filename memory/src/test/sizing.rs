use {
    super::mock::*,
    crate::{
        allocator::*,
        config::AllocatorConfig,
        memory::{MemoryClass, MemoryProperties, MemoryType, PerClass, Properties},
    },
    std::sync::Arc,
};

fn budget(device_local: u64, device_shared: u64, host_shared: u64) -> PerClass<u64> {
    PerClass {
        device_local,
        device_shared,
        host_shared,
    }
}

#[test]
fn budget_is_largest_heap_per_class() {
    assert_eq!(memory_budget(&properties()), budget(256 * MB, 16 * MB, 512 * MB));

    let integrated = MemoryProperties {
        types: vec![
            MemoryType {
                properties: Properties::DEVICE_LOCAL,
                heap_index: 0,
            },
            MemoryType {
                properties: Properties::DEVICE_LOCAL | Properties::HOST_VISIBLE,
                heap_index: 0,
            },
        ],
        heaps: vec![4096 * MB],
    };
    assert_eq!(memory_budget(&integrated), budget(4096 * MB, 4096 * MB, 0));
}

#[test]
fn default_sizing() {
    let sizes = HeapSizing::default().resolve(&budget(256 * MB, 16 * MB, 512 * MB));
    assert_eq!(
        sizes,
        HeapSizes {
            device_local: 8 * MB,
            device_shared: MB,
            host_shared: 8 * MB,
        }
    );
}

#[test]
fn large_shared_budget_uses_smaller_heaps() {
    let sizes = HeapSizing::default().resolve(&budget(512 * MB, 4096 * MB, 0));
    assert_eq!(sizes.device_local, 16 * MB);
    assert_eq!(sizes.device_shared, 32 * MB);
    assert_eq!(sizes.host_shared, MIN_HEAP_SIZE);
}

#[test]
fn sizes_are_powers_of_two_above_floor() {
    let sizes = HeapSizing::default().resolve(&budget(100 * MB, MB, 0));
    assert_eq!(sizes.device_local, 4 * MB);
    assert_eq!(sizes.device_shared, MIN_HEAP_SIZE);
    assert_eq!(sizes.host_shared, MIN_HEAP_SIZE);
}

#[test]
fn multiplier_and_divisors_are_tunable() {
    let sizing = HeapSizing::Budget {
        multiplier: HeapSizeMultiplier::Half,
        divisors: HeapSizeDivisors {
            device_local: 8,
            ..HeapSizeDivisors::default()
        },
    };
    let sizes = sizing.resolve(&budget(256 * MB, 16 * MB, 512 * MB));
    assert_eq!(sizes.device_local, 16 * MB);
    assert_eq!(sizes.device_shared, MB / 2);
    assert_eq!(sizes.host_shared, 4 * MB);

    let sizing = HeapSizing::Budget {
        multiplier: HeapSizeMultiplier::Quadruple,
        divisors: HeapSizeDivisors::default(),
    };
    assert_eq!(
        sizing.resolve(&budget(256 * MB, 16 * MB, 512 * MB)).device_local,
        32 * MB
    );
}

#[test]
fn fixed_sizing_is_used_as_is() {
    let sizes = HeapSizes {
        device_local: 3 * KB,
        device_shared: 5 * KB,
        host_shared: 7 * KB,
    };
    assert_eq!(HeapSizing::Fixed(sizes).resolve(&budget(0, 0, 0)), sizes);
    assert_eq!(sizes.for_class(MemoryClass::DeviceShared), 5 * KB);
}

#[test]
fn allocator_uses_sizes_per_class() {
    let allocator = Allocator::new(
        Arc::new(MockDevice::default()),
        properties(),
        limits(),
        AllocatorConfig::default(),
    );
    assert_eq!(allocator.default_heap_size(DEVICE_LOCAL), 8 * MB);
    assert_eq!(allocator.default_heap_size(DEVICE_SHARED), MB);
    assert_eq!(allocator.default_heap_size(HOST_COHERENT), 8 * MB);
    assert_eq!(allocator.default_heap_size(HOST_CACHED), 8 * MB);
}
