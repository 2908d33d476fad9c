use sparsim_paradis::{IndexPartition, RowLockTable};

#[test]
fn rows_are_independent() {
    let table: RowLockTable<Vec<usize>> = RowLockTable::new(3);
    assert_eq!(table.len(), 3);

    let first = table.lock(0);
    // Another row can be locked while row 0 is held
    assert!(table.try_lock(1).is_some());
    assert!(table.try_lock(0).is_none());
    drop(first);
    assert!(table.try_lock(0).is_some());
}

#[test]
fn concurrent_pushes_into_same_rows_are_serialized() {
    let table = RowLockTable::from_fn(4, |_| Vec::new());
    IndexPartition::with_num_chunks(400, 8).for_each(|i| {
        table.with_locked(i % 4, |row| row.push(i));
    });

    let rows = table.into_inner();
    for (r, mut row) in rows.into_iter().enumerate() {
        row.sort_unstable();
        let expected: Vec<_> = (0..400).filter(|i| i % 4 == r).collect();
        assert_eq!(row, expected);
    }
}

#[test]
fn exclusive_access_without_locking() {
    let mut table = RowLockTable::from_fn(3, |row| row * 10);
    *table.get_mut(1) += 1;
    for value in table.iter_mut() {
        *value += 1;
    }
    assert_eq!(table.into_inner(), vec![1, 12, 21]);
}
