//! Allocation accounting around table teardown.
//!
//! A counting global allocator tracks live allocations per thread, so each
//! test can assert that dropping a table returns exactly what it took.

use std::alloc::GlobalAlloc;
use std::alloc::Layout;
use std::alloc::System;
use std::cell::Cell;

use chain_hash::HashTable;

struct CountingAlloc;

thread_local! {
    static LIVE: Cell<isize> = const { Cell::new(0) };
}

fn track(delta: isize) {
    let _ = LIVE.try_with(|live| live.set(live.get() + delta));
}

fn live() -> isize {
    LIVE.with(Cell::get)
}

// SAFETY: Every call is forwarded unchanged to the system allocator.
unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        track(1);
        unsafe { System.alloc(layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        track(1);
        unsafe { System.alloc_zeroed(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        track(-1);
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

#[global_allocator]
static ALLOC: CountingAlloc = CountingAlloc;

/// Runs `f` and returns how many allocations it left live on this thread.
fn leaked_by(f: impl FnOnce()) -> isize {
    let before = live();
    f();
    live() - before
}

#[test]
fn empty_table_releases_bucket_array() {
    assert_eq!(
        leaked_by(|| {
            let before = live();
            let table = HashTable::with_capacity(837);
            assert_eq!(live() - before, 1);
            drop(table);
        }),
        0
    );
}

#[test]
fn populated_table_releases_every_entry() {
    assert_eq!(
        leaked_by(|| {
            let before = live();
            let mut table = HashTable::with_capacity(100);
            for key in 0..1000 {
                table.insert(key, key);
            }
            // One bucket array plus one allocation per entry.
            assert_eq!(live() - before, 1 + 1000);
            drop(table);
        }),
        0
    );
}

#[test]
fn mixed_inserts_and_erases_release_everything() {
    assert_eq!(
        leaked_by(|| {
            let before = live();
            let mut table = HashTable::with_capacity(64);
            for key in 0..500 {
                table.insert(key, key);
            }
            for key in (0..500).step_by(3) {
                assert!(table.erase(key));
            }
            for key in (0..500).step_by(3) {
                assert!(!table.erase(key));
            }
            for key in 0..250 {
                table.insert(key, key * 2);
            }
            assert_eq!(live() - before, 1 + table.len() as isize);
            drop(table);
        }),
        0
    );
}

#[test]
fn erase_releases_entry_immediately() {
    let mut table = HashTable::with_capacity(16);
    table.insert(1, 1);
    table.insert(2, 2);

    let before = live();
    assert!(table.erase(1));
    assert_eq!(live() - before, -1);
    assert!(!table.erase(1));
    assert_eq!(live() - before, -1);
}

#[test]
fn clear_and_clone_balance() {
    assert_eq!(
        leaked_by(|| {
            let mut table = HashTable::with_capacity(32);
            for key in 0..200 {
                table.insert(key, key);
            }
            let cloned = table.clone();
            table.clear();
            assert!(table.is_empty());
            assert_eq!(cloned.len(), 200);
            drop(cloned);
            drop(table);
        }),
        0
    );
}
