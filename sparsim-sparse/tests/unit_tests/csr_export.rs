use proptest::prelude::*;
use sparsim_sparse::{check_csr_structure, export_csr_arrays, offsets_from_row_sizes, CsrArrays, SparseError};
use util::prefix_sum;

#[test]
fn check_csr_structure_accepts_valid_patterns() {
    assert!(check_csr_structure(&[0], &[], 0).is_ok());
    assert!(check_csr_structure(&[0, 0, 0], &[], 0).is_ok());
    assert!(check_csr_structure(&[0, 2, 3], &[0, 4, 1], 5).is_ok());
}

#[test]
fn check_csr_structure_rejects_invalid_patterns() {
    let invalid = |offsets: &[usize], cols: &[usize], ncols| {
        matches!(
            check_csr_structure(offsets, cols, ncols),
            Err(SparseError::InvalidStructure(_))
        )
    };
    // No offsets at all
    assert!(invalid(&[], &[], 3));
    // First offset not zero
    assert!(invalid(&[1, 2], &[0, 1], 3));
    // Decreasing offsets
    assert!(invalid(&[0, 2, 1, 3], &[0, 1, 2], 3));
    // Last offset does not match the number of columns
    assert!(invalid(&[0, 1], &[0, 1], 3));
    // Unsorted and duplicate columns
    assert!(invalid(&[0, 2], &[1, 0], 3));
    assert!(invalid(&[0, 2], &[1, 1], 3));
    // Column beyond the declared number of columns
    assert!(invalid(&[0, 2], &[0, 3], 3));
}

#[test]
fn csr_arrays_accessors() {
    let arrays = CsrArrays {
        row_offsets: vec![0, 2, 2, 3],
        col_indices: vec![1, 5, 0],
    };
    assert_eq!(arrays.nrows(), 3);
    assert_eq!(arrays.nnz(), 3);
    assert_eq!(arrays.row(0), &[1, 5]);
    assert!(arrays.row(1).is_empty());
    assert_eq!(arrays.min_ncols(), 6);
    assert!(arrays.check(6).is_ok());
    assert!(arrays.check(5).is_err());

    assert_eq!(CsrArrays::default(), CsrArrays::empty(0));
    assert_eq!(CsrArrays::empty(2).row_offsets, vec![0, 0, 0]);
}

#[test]
fn export_sorts_each_row() {
    let rows = vec![vec![3, 1, 2], vec![], vec![9, 0]];
    let arrays = export_csr_arrays(rows.len(), |r| rows[r].len(), |r, out| out.copy_from_slice(&rows[r]));
    assert_eq!(arrays.row_offsets, vec![0, 3, 3, 5]);
    assert_eq!(arrays.col_indices, vec![1, 2, 3, 0, 9]);
}

proptest! {
    #[test]
    fn offsets_are_prefix_sums(sizes in proptest::collection::vec(0..10usize, 0..50)) {
        let offsets = offsets_from_row_sizes(&sizes);
        let total: usize = sizes.iter().sum();
        let expected: Vec<usize> = prefix_sum(sizes.iter().copied(), 0).chain(std::iter::once(total)).collect();
        prop_assert_eq!(offsets, expected);
    }
}
