//! Pool and binding benchmarks
//!
//! Compares the intrusive free-list pool against the system strategy for the
//! allocate/use/release cycle.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use strata_memory::{
    FixedSizePool, MemoryContext, MemorySystem, PooledMemory, SlotPool, TypedAllocator,
};

fn bench_block_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_cycle");
    group.throughput(Throughput::Elements(1));

    for size in [16_usize, 64, 256] {
        group.bench_with_input(BenchmarkId::new("fixed_pool", size), &size, |b, &size| {
            let mut pool = FixedSizePool::new_in(&MemoryContext::system(), size, 64).unwrap();
            b.iter(|| {
                let block = pool.allocate().unwrap();
                // SAFETY: block spans `size` bytes and is returned right after.
                unsafe { block.as_ptr().write_bytes(0x42, size) };
                pool.deallocate(black_box(block)).unwrap();
            });
        });

        group.bench_with_input(BenchmarkId::new("system", size), &size, |b, &size| {
            let context = MemoryContext::system();
            b.iter(|| {
                let block = context.allocate(size).unwrap();
                // SAFETY: block spans `size` bytes and is released right after.
                unsafe {
                    block.as_ptr().write_bytes(0x42, size);
                    context.deallocate(size, black_box(block)).unwrap();
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("pooled", size), &size, |b, &size| {
            let pooled = PooledMemory::standard().unwrap();
            b.iter(|| {
                let block = pooled.allocate(size).unwrap();
                // SAFETY: block was reserved with `size` bytes.
                unsafe { pooled.deallocate(size, black_box(block)).unwrap() };
            });
        });
    }

    group.finish();
}

/// Fill a pool completely, then drain it
fn bench_fill_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill_drain");
    group.throughput(Throughput::Elements(256));

    group.bench_function("fixed_pool", |b| {
        let mut pool = FixedSizePool::new_in(&MemoryContext::system(), 32, 256).unwrap();
        let mut blocks = Vec::with_capacity(256);
        b.iter(|| {
            while let Ok(block) = pool.allocate() {
                blocks.push(block);
            }
            for block in blocks.drain(..) {
                pool.deallocate(block).unwrap();
            }
        });
    });

    group.bench_function("slot_pool", |b| {
        let mut pool = SlotPool::new(256);
        let mut handles = Vec::with_capacity(256);
        b.iter(|| {
            for i in 0..256_u64 {
                handles.push(pool.insert(black_box(i)).unwrap());
            }
            for handle in handles.drain(..) {
                black_box(pool.remove(handle).unwrap());
            }
        });
    });

    group.finish();
}

fn bench_typed_grow(c: &mut Criterion) {
    c.bench_function("typed_grow_doubling", |b| {
        let alloc = TypedAllocator::<u64>::in_context(MemoryContext::system());
        b.iter(|| {
            let mut count = 4;
            let mut ptr = alloc.allocate(count).unwrap();
            while count < 1024 {
                // SAFETY: ptr holds `count` slots, zeroed before they are moved.
                ptr = unsafe {
                    ptr.write_bytes(0, count);
                    alloc.grow(ptr, count, count * 2).unwrap()
                };
                count *= 2;
            }
            // SAFETY: ptr holds `count` slots from the last grow.
            unsafe { alloc.deallocate(count, black_box(ptr)).unwrap() };
        });
    });
}

criterion_group!(benches, bench_block_cycle, bench_fill_drain, bench_typed_grow);
criterion_main!(benches);
