//! Generational storage behavior the GPU resource manager relies on:
//! recycled slots never alias stale ones.

use sparkle_core::alloc::sparse_set::{IndexSlot, SparseSet};

#[test]
fn test_push_and_get_keep_values_apart() {
    let mut set = SparseSet::new();

    let a = set.push("texture");
    let b = set.push("buffer");

    assert_eq!(*set.get(a), "texture");
    assert_eq!(*set.get(b), "buffer");
    assert_eq!(a.index(), 0);
    assert_eq!(b.index(), 1);
}

#[test]
fn test_get_mut_updates_in_place() {
    let mut set = SparseSet::new();
    let idx = set.push(1u32);

    *set.get_mut(idx) += 41;

    assert_eq!(set.try_get(idx), Some(&42));
}

#[test]
fn test_out_of_range_slot_is_absent() {
    let set = SparseSet::<i32>::new();
    assert_eq!(set.try_get(IndexSlot::new(0, 999)), None);
}

#[test]
#[should_panic(expected = "invalid generation")]
fn test_get_after_remove_panics() {
    let mut set = SparseSet::new();
    let idx = set.push(42);
    set.remove(idx);
    let _ = set.get(idx);
}

#[test]
fn test_try_remove_twice_returns_none() {
    let mut set = SparseSet::new();
    let idx = set.push(42);

    assert_eq!(set.try_remove(idx), Some(42));
    assert_eq!(set.try_remove(idx), None);
    assert!(set.is_empty());
}

#[test]
fn test_recycled_slot_gets_new_generation_each_time() {
    let mut set = SparseSet::new();
    let mut previous = Vec::new();

    let mut idx = set.push(0);
    for value in 1..4 {
        set.remove(idx);
        previous.push(idx);
        idx = set.push(value);
        assert_eq!(idx.index(), 0);
        assert_eq!(idx.generation(), value as u32);
    }

    for stale in previous {
        assert_eq!(set.try_get(stale), None);
    }
    assert_eq!(*set.get(idx), 3);
}

#[test]
fn test_slot_bits_are_distinct_across_generations() {
    let old = IndexSlot::new(0, 5);
    let new = IndexSlot::new(1, 5);

    assert_ne!(old.to_bits(), new.to_bits());
    assert_eq!(old, IndexSlot::new(0, 5));
    assert_ne!(old, IndexSlot::new(0, 6));
}

#[test]
fn test_len_tracks_push_and_remove() {
    let mut set = SparseSet::with_capacity(8);
    assert!(set.capacity() >= 8);

    let a = set.push(1);
    set.push(2);
    set.push(3);
    assert_eq!(set.len(), 3);

    set.remove(a);
    assert_eq!(set.len(), 2);

    set.clear();
    assert_eq!(set.len(), 0);
}

#[test]
fn test_iteration_skips_holes() {
    let mut set = SparseSet::new();
    set.push(10);
    let hole = set.push(20);
    set.push(30);
    set.remove(hole);

    for value in set.iter_mut() {
        *value += 1;
    }

    let values: Vec<_> = set.iter().copied().collect();
    assert_eq!(values, vec![11, 31]);
}

#[test]
fn test_many_removals_reuse_freed_slots() {
    let mut set = SparseSet::new();
    let indices: Vec<_> = (0..100).map(|i| set.push(i)).collect();

    for idx in indices.iter().step_by(2) {
        set.remove(*idx);
    }
    assert_eq!(set.len(), 50);

    let reused: Vec<_> = (100..150).map(|i| set.push(i)).collect();
    assert_eq!(set.len(), 100);
    assert!(reused.iter().all(|idx| idx.index() < 100));
    assert!(reused.iter().all(|idx| idx.generation() == 1));
}
