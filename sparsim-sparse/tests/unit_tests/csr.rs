use nalgebra::DMatrix;
use sparsim_sparse::{CsrArrays, CsrMatrix, SparseContiguousRowGraph, SparseError, SparseGraph, SystemVector};
use std::collections::BTreeMap;
use util::{assert_approx_matrix_eq, assert_csr_invariants, assert_panics};

/// The 3x3 matrix
///
/// [ 1  0  2 ]
/// [ 0  3  0 ]
/// [ 4  0  5 ]
fn example_matrix() -> CsrMatrix<'static, f64> {
    CsrMatrix::from_csr_data(3, 3, vec![0, 2, 3, 5], vec![0, 2, 1, 0, 2], vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap()
}

#[test]
fn zeros_has_empty_pattern() {
    let matrix = CsrMatrix::<f64>::zeros(3, 4);
    assert_eq!(matrix.nrows(), 3);
    assert_eq!(matrix.ncols(), 4);
    assert_eq!(matrix.nnz(), 0);
    assert!(matrix.is_owner());
    assert_eq!(matrix.row_offsets(), &[0, 0, 0, 0]);
    assert!(matrix.check().is_ok());

    let empty = CsrMatrix::<f64>::new();
    assert_eq!(empty.nrows(), 0);
    assert_eq!(empty.ncols(), 0);
}

#[test]
fn from_graph_creates_zero_valued_square_matrix() {
    let graph = SparseContiguousRowGraph::new(3);
    graph.add_entries(0, &[0, 2]);
    graph.add_entry(1, 1);
    graph.add_entries(2, &[0, 2]);

    let matrix = CsrMatrix::<f64>::from_graph(&graph);
    assert_eq!(matrix.nrows(), 3);
    assert_eq!(matrix.ncols(), 3);
    assert_eq!(matrix.row_offsets(), &[0, 2, 3, 5]);
    assert_eq!(matrix.col_indices(), &[0, 2, 1, 0, 2]);
    assert_eq!(matrix.values(), &[0.0; 5]);
    assert_csr_invariants(matrix.row_offsets(), matrix.col_indices(), 3, 3);
}

#[test]
fn under_declared_columns_are_caught_by_check() {
    let mut graph = SparseGraph::new();
    graph.add_entries(0, &[0, 7]);

    let mut matrix = CsrMatrix::<f64>::from_graph_with_ncols(&graph, 1);
    assert_eq!(matrix.ncols(), 1);
    assert!(matches!(matrix.check(), Err(SparseError::InvalidStructure(_))));

    matrix.set_ncols(8);
    assert!(matrix.check().is_ok());

    let matrix = CsrMatrix::<f64>::from_graph_with_ncols(&graph, 10);
    assert_eq!(matrix.ncols(), 10);
    assert!(matrix.check().is_ok());
}

#[test]
fn from_graph_widens_to_fit_all_columns() {
    let mut graph = SparseGraph::new();
    graph.add_entry(0, 0);
    graph.add_entry(1, 4);

    let mut matrix = CsrMatrix::<f64>::from_graph(&graph);
    assert_eq!(matrix.nrows(), 2);
    assert_eq!(matrix.ncols(), 5);
    assert!(matrix.check().is_ok());

    matrix[(0, 0)] = 2.0;
    matrix[(1, 4)] = 3.0;
    let x = SystemVector::from_vec(vec![1.0, 0.0, 0.0, 0.0, 10.0]);
    let mut y = SystemVector::new(2);
    matrix.spmv(&x, &mut y).unwrap();
    assert_eq!(y.as_slice(), &[2.0, 30.0]);

    let mut expected = DMatrix::zeros(2, 5);
    expected[(0, 0)] = 2.0;
    expected[(1, 4)] = 3.0;
    assert_eq!(matrix.to_dense(), expected);
}

#[test]
fn from_csr_arrays_validates_structure() {
    let arrays = CsrArrays {
        row_offsets: vec![0, 1, 2],
        col_indices: vec![1, 0],
    };
    let matrix = CsrMatrix::<f64>::from_csr_arrays(arrays.clone(), 2).unwrap();
    assert_eq!(matrix.nnz(), 2);
    assert!(CsrMatrix::<f64>::from_csr_arrays(arrays, 1).is_err());
}

#[test]
fn from_csr_data_rejects_inconsistent_lengths() {
    let result = CsrMatrix::from_csr_data(2, 2, vec![0, 1, 2], vec![0, 1], vec![1.0]);
    assert!(matches!(result, Err(SparseError::DimensionMismatch { expected: 2, actual: 1, .. })));

    let result = CsrMatrix::from_csr_data(3, 2, vec![0, 1, 2], vec![0, 1], vec![1.0, 2.0]);
    assert!(matches!(result, Err(SparseError::DimensionMismatch { expected: 4, actual: 3, .. })));

    let result = CsrMatrix::from_csr_data(2, 2, vec![0, 2, 2], vec![1, 0], vec![1.0, 2.0]);
    assert!(matches!(result, Err(SparseError::InvalidStructure(_))));
}

#[test]
fn entry_access() {
    let mut matrix = example_matrix();
    assert_eq!(matrix.find_entry(2, 2), Some(4));
    assert_eq!(matrix.find_entry(1, 0), None);
    assert_eq!(matrix.find_entry(3, 0), None);
    assert!(matrix.has(0, 2));
    assert!(!matrix.has(0, 1));
    assert_eq!(matrix.get(2, 0), Some(&4.0));
    assert_eq!(matrix.get(1, 2), None);
    assert_eq!(matrix[(1, 1)], 3.0);

    matrix[(0, 2)] += 10.0;
    *matrix.get_mut(1, 1).unwrap() = -1.0;
    assert_eq!(matrix.values(), &[1.0, 12.0, -1.0, 4.0, 5.0]);

    let (cols, values) = matrix.row(2);
    assert_eq!(cols, &[0, 2]);
    assert_eq!(values, &[4.0, 5.0]);

    let (_, values) = matrix.row_mut(0);
    values[0] = 0.5;
    assert_eq!(matrix[(0, 0)], 0.5);
}

#[test]
fn indexing_missing_entry_panics() {
    let matrix = example_matrix();
    assert_panics!(matrix[(1, 0)]);
    assert_panics!(matrix[(5, 5)]);
}

#[test]
fn value_operations() {
    let mut matrix = example_matrix();
    matrix.scale(2.0);
    assert_eq!(matrix.values(), &[2.0, 4.0, 6.0, 8.0, 10.0]);

    matrix.set_value(1.5);
    assert_eq!(matrix.values(), &[1.5; 5]);

    matrix.set_zero();
    assert_eq!(matrix.values(), &[0.0; 5]);

    matrix.values_mut()[3] = 7.0;
    assert_eq!(matrix[(2, 0)], 7.0);
}

#[test]
fn norms_and_diagonal_diagnostics() {
    let matrix = example_matrix();
    assert!((matrix.norm_frobenius() - 55.0f64.sqrt()).abs() < 1e-12);
    assert!((matrix.diagonal_norm() - 35.0f64.sqrt()).abs() < 1e-12);
    assert_eq!(matrix.max_diagonal(), 5.0);
    assert_eq!(matrix.min_diagonal(), 1.0);
    assert_eq!(matrix.diagonal(1), 3.0);

    // Diagonal entries outside of the pattern count as zero
    let mut graph = SparseGraph::new();
    graph.add_entries(0, &[0, 1]);
    graph.add_entry(1, 0);
    let mut matrix = CsrMatrix::<f64>::from_graph(&graph);
    matrix.set_value(-3.0);
    assert_eq!(matrix.diagonal(1), 0.0);
    assert_eq!(matrix.max_diagonal(), 3.0);
    assert_eq!(matrix.min_diagonal(), 0.0);

    let empty = CsrMatrix::<f64>::new();
    assert_eq!(empty.max_diagonal(), 0.0);
    assert_eq!(empty.min_diagonal(), 0.0);
}

#[test]
fn to_dense_matches_entries() {
    #[rustfmt::skip]
    let expected = DMatrix::from_row_slice(3, 3, &[
        1.0, 0.0, 2.0,
        0.0, 3.0, 0.0,
        4.0, 0.0, 5.0,
    ]);
    assert_approx_matrix_eq!(&example_matrix().to_dense(), &expected, abstol = 1e-14);
}

#[test]
fn map_conversion() {
    let map = BTreeMap::from([((0, 3), 1.0), ((2, 1), -2.0), ((2, 0), 4.0)]);
    let matrix = CsrMatrix::from_map(&map);
    assert_eq!(matrix.nrows(), 3);
    assert_eq!(matrix.ncols(), 4);
    assert_eq!(matrix.nnz(), 3);
    assert_eq!(matrix[(2, 1)], -2.0);
    assert_eq!(matrix.to_map(), map);

    let triples: Vec<_> = matrix.iter().map(|(i, j, v)| (i, j, *v)).collect();
    assert_eq!(triples, vec![(0, 3, 1.0), (2, 0, 4.0), (2, 1, -2.0)]);
}

#[test]
fn nalgebra_sparse_conversion() {
    let matrix = example_matrix();
    let converted = matrix.to_nalgebra_csr().unwrap();
    assert_eq!(converted.nrows(), 3);
    assert_eq!(converted.nnz(), 5);
    assert_eq!(converted.values(), matrix.values());

    let back = CsrMatrix::from_nalgebra_csr(&converted);
    assert_eq!(back, matrix);
}

#[test]
fn borrowed_matrix_modifies_caller_buffers() {
    let mut offsets = vec![0, 1, 2];
    let mut cols = vec![1, 0];
    let mut values = vec![1.0, 2.0];
    {
        let mut matrix = CsrMatrix::from_borrowed_csr_data(2, &mut offsets, &mut cols, &mut values).unwrap();
        assert!(!matrix.is_owner());
        matrix.scale(3.0);
        matrix[(1, 0)] = -1.0;

        assert!(matches!(
            matrix.reserve(4, 4),
            Err(SparseError::BorrowedBuffer { operation: "reserve" })
        ));
        assert_eq!(matrix.nrows(), 2);

        // Clones always own their storage
        let copy = matrix.clone();
        assert!(copy.is_owner());
        assert_eq!(copy, matrix);
    }
    assert_eq!(values, vec![3.0, -1.0]);
}

#[test]
fn borrowed_matrix_validates_structure() {
    let mut offsets = vec![0, 2];
    let mut cols = vec![1, 1];
    let mut values = vec![1.0, 2.0];
    let result = CsrMatrix::from_borrowed_csr_data(2, &mut offsets, &mut cols, &mut values);
    assert!(matches!(result, Err(SparseError::InvalidStructure(_))));
}

#[test]
fn reserve_then_fill() {
    let mut matrix = CsrMatrix::<f64>::zeros(0, 2);
    matrix.reserve(2, 3).unwrap();
    assert_eq!(matrix.nrows(), 2);
    assert_eq!(matrix.nnz(), 3);
    {
        let (offsets, cols, values) = matrix.csr_data_mut();
        offsets.copy_from_slice(&[0, 2, 3]);
        cols.copy_from_slice(&[0, 1, 1]);
        values.copy_from_slice(&[1.0, 2.0, 3.0]);
    }
    assert!(matrix.check().is_ok());
    assert_eq!(matrix[(1, 1)], 3.0);

    let (offsets, cols, values) = matrix.into_csr_data();
    assert_eq!(offsets, vec![0, 2, 3]);
    assert_eq!(cols, vec![0, 1, 1]);
    assert_eq!(values, vec![1.0, 2.0, 3.0]);
}
