use sparsim_paradis::{
    AbsMaxReduction, AbsMinReduction, AccumReduction, IndexPartition, MapReduction, MaxReduction, MinReduction,
    SumReduction,
};
use std::collections::BTreeMap;

const VALUES: [f64; 7] = [3.0, -7.5, 0.25, 12.0, -0.125, 4.0, -3.0];

fn partition() -> IndexPartition {
    IndexPartition::with_num_chunks(VALUES.len(), 3)
}

#[test]
fn min_max_reductions() {
    assert_eq!(partition().reduce::<MinReduction<f64>, _>(|i| VALUES[i]), -7.5);
    assert_eq!(partition().reduce::<MaxReduction<f64>, _>(|i| VALUES[i]), 12.0);
}

#[test]
fn abs_reductions_keep_sign() {
    assert_eq!(partition().reduce::<AbsMinReduction<f64>, _>(|i| VALUES[i]), -0.125);
    assert_eq!(partition().reduce::<AbsMaxReduction<f64>, _>(|i| -VALUES[i]), -12.0);
}

#[test]
fn empty_reductions_return_identity() {
    let empty = IndexPartition::new(0);
    assert_eq!(empty.reduce::<MinReduction<i32>, _>(|_| 0), i32::MAX);
    assert_eq!(empty.reduce::<MaxReduction<i32>, _>(|_| 0), i32::MIN);
    assert_eq!(empty.reduce::<AbsMaxReduction<f64>, _>(|_| 1.0), 0.0);
    assert!(empty.reduce::<AccumReduction<u8>, _>(|_| vec![1]).is_empty());
}

#[test]
fn accum_reduction_collects_all_values() {
    let partition = IndexPartition::with_num_chunks(50, 4);
    let mut collected = partition.reduce::<AccumReduction<usize>, _>(|i| vec![i, i + 100]);
    collected.sort_unstable();
    let mut expected: Vec<_> = (0..50).chain(100..150).collect();
    expected.sort_unstable();
    assert_eq!(collected, expected);
}

#[test]
fn map_reduction_merges_maps() {
    let partition = IndexPartition::with_num_chunks(10, 3);
    let map = partition.reduce::<MapReduction<usize, usize>, _>(|i| BTreeMap::from([(i % 4, i)]));
    assert_eq!(map.len(), 4);
    assert!(map.keys().copied().eq(0..4));
    assert!(map.iter().all(|(k, v)| v % 4 == *k));
}

#[test]
fn pair_reduction_computes_both_in_one_pass() {
    let (sum, max) = partition()
        .reduce::<(SumReduction<f64>, MaxReduction<f64>), _>(|i| (VALUES[i], VALUES[i]));
    assert_eq!(sum, VALUES.iter().sum::<f64>());
    assert_eq!(max, 12.0);
}
