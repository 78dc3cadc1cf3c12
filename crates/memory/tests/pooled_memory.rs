//! Size-class routing through `PooledMemory`

use pretty_assertions::assert_eq;
use rstest::rstest;
use strata_memory::{
    MemoryContext, MemorySystem, PooledConfig, PooledMemory, TypedAllocator,
};

fn tiny() -> PooledMemory {
    let config = PooledConfig::builder()
        .with_class(16, 2)
        .with_class(32, 2)
        .with_patterns(Some(0xBB), Some(0xDD));
    PooledMemory::new(MemoryContext::system(), config).expect("valid classes")
}

#[rstest]
#[case(1, 0)]
#[case(16, 0)]
#[case(17, 1)]
#[case(32, 1)]
fn test_request_lands_in_smallest_class(#[case] size: usize, #[case] class: usize) {
    let pooled = tiny();
    let block = pooled.allocate(size).expect("Allocation failed");

    let usage = pooled.free_blocks_per_class();
    assert_eq!(usage[class].1, 1);
    assert_eq!(usage[1 - class].1, 2);

    // SAFETY: block was reserved above with `size` bytes.
    unsafe { pooled.deallocate(size, block).expect("Deallocation failed") };
    assert_eq!(pooled.free_blocks_per_class(), vec![(16, 2), (32, 2)]);
}

#[test]
fn test_exhausted_class_falls_back() {
    let pooled = tiny();
    let blocks: Vec<_> = (0..3)
        .map(|_| pooled.allocate(8).expect("Allocation failed"))
        .collect();

    // Two from the 16-byte class, the third from the fallback
    assert_eq!(pooled.free_blocks_per_class()[0], (16, 0));

    for block in blocks {
        // SAFETY: each block was reserved above with 8 bytes.
        unsafe { pooled.deallocate(8, block).expect("Deallocation failed") };
    }
    assert_eq!(pooled.free_blocks_per_class()[0], (16, 2));
}

#[test]
fn test_fill_patterns_applied() {
    let pooled = tiny();
    let block = pooled.allocate(16).expect("Allocation failed");
    // SAFETY: block spans 16 bytes from the 16-byte class.
    let bytes = unsafe { std::slice::from_raw_parts(block.as_ptr(), 16) };
    assert!(bytes.iter().all(|&b| b == 0xBB));

    // SAFETY: block was reserved above with 16 bytes.
    unsafe { pooled.deallocate(16, block).expect("Deallocation failed") };
}

#[test]
fn test_typed_allocator_over_pooled_context() {
    let context = MemoryContext::new(PooledMemory::standard().expect("standard classes"));
    assert_eq!(context.name(), "pooled");

    let alloc = TypedAllocator::<u64>::in_context(context);
    let small = alloc.allocate(2).expect("small request");
    let large = alloc.allocate(512).expect("large request");

    // SAFETY: both blocks were reserved above with the same counts.
    unsafe {
        small.write(11);
        large.add(511).write(22);
        assert_eq!(small.read() + large.add(511).read(), 33);
        alloc.deallocate(2, small).expect("small release");
        alloc.deallocate(512, large).expect("large release");
    }
}
