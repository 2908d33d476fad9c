use proptest::prelude::*;
use sparsim_paradis::{atomic_add, AtomicAccumulate, AtomicSlice, IndexPartition};

#[test]
fn fetch_add_returns_previous_value() {
    let cell = f64::new_atomic(1.5);
    assert_eq!(f64::fetch_add(&cell, 2.0), 1.5);
    assert_eq!(f64::load(&cell), 3.5);

    let cell = u32::new_atomic(7);
    atomic_add(&cell, 5u32);
    assert_eq!(u32::load(&cell), 12);

    let cell = i64::new_atomic(-4);
    atomic_add(&cell, 10i64);
    assert_eq!(i64::load(&cell), 6);

    let cell = f32::new_atomic(0.0);
    f32::store(&cell, 2.5);
    assert_eq!(f32::load(&cell), 2.5);
}

#[test]
fn concurrent_float_additions_are_not_lost() {
    let mut data = vec![0.0f64; 4];
    {
        let slice = AtomicSlice::new(&mut data);
        IndexPartition::with_num_chunks(10_000, 16).for_each(|i| {
            // Every entry receives 2500 additions of 0.5, which is exact in floating point
            slice.add(i % 4, 0.5);
        });
    }
    assert_eq!(data, vec![1250.0; 4]);
}

#[test]
fn concurrent_integer_additions_are_not_lost() {
    let mut data = vec![0usize; 3];
    {
        let slice = AtomicSlice::new(&mut data);
        IndexPartition::with_num_chunks(3000, 8).for_each(|i| slice.add(i % 3, i));
    }
    let expected: Vec<usize> = (0..3).map(|r| (0..3000).filter(|i| i % 3 == r).sum()).collect();
    assert_eq!(data, expected);
}

#[test]
fn add_slice_and_add_indexed() {
    let mut data = vec![1.0f32; 5];
    {
        let slice = AtomicSlice::new(&mut data);
        assert_eq!(slice.len(), 5);
        slice.add_slice(1, &[1.0, 2.0, 3.0]);
        slice.add_indexed(&[4, 0, 4], &[10.0, -1.0, 5.0]);
        assert_eq!(slice.load(4), 16.0);
        slice.store(2, -2.0);
    }
    assert_eq!(data, vec![0.0, 2.0, -2.0, 4.0, 16.0]);
}

#[test]
#[should_panic]
fn add_indexed_panics_on_length_mismatch() {
    let mut data = vec![0.0f64; 2];
    let slice = AtomicSlice::new(&mut data);
    slice.add_indexed(&[0, 1], &[1.0]);
}

proptest! {
    #[test]
    fn concurrent_scatter_matches_sequential(
        targets in proptest::collection::vec(0..10usize, 0..500),
        num_chunks in 1..8usize
    ) {
        let mut expected = vec![0i64; 10];
        for (k, &t) in targets.iter().enumerate() {
            expected[t] += k as i64;
        }

        let mut data = vec![0i64; 10];
        {
            let slice = AtomicSlice::new(&mut data);
            IndexPartition::with_num_chunks(targets.len(), num_chunks)
                .for_each(|k| slice.add(targets[k], k as i64));
        }
        prop_assert_eq!(data, expected);
    }
}
