use nalgebra::DMatrix;
use sparsim_sparse::{CsrMatrix, SparseError, SparseGraph, SystemVector};

fn full_matrix(n: usize, value: f64) -> CsrMatrix<'static, f64> {
    let mut graph = SparseGraph::new();
    let all: Vec<usize> = (0..n).collect();
    graph.add_entries_block(&all, &all);
    let mut matrix = CsrMatrix::from_graph(&graph);
    matrix.set_value(value);
    matrix
}

#[test]
fn fixed_dof_is_eliminated() {
    let mut matrix = CsrMatrix::from_csr_data(
        3,
        3,
        vec![0, 3, 6, 9],
        vec![0, 1, 2, 0, 1, 2, 0, 1, 2],
        vec![4.0, 1.0, 2.0, 1.0, 5.0, 3.0, 2.0, 3.0, 6.0],
    )
    .unwrap();
    let free = SystemVector::from_vec(vec![1.0, 0.0, 1.0]);
    let mut rhs = SystemVector::from_vec(vec![1.0, 2.0, 3.0]);

    matrix.apply_homogeneous_dirichlet(&free, 1.0, &mut rhs).unwrap();

    #[rustfmt::skip]
    let expected = DMatrix::from_row_slice(3, 3, &[
        4.0, 0.0, 2.0,
        0.0, 1.0, 0.0,
        2.0, 0.0, 6.0,
    ]);
    assert_eq!(matrix.to_dense(), expected);
    assert_eq!(rhs.as_slice(), &[1.0, 0.0, 3.0]);
}

#[test]
fn diagonal_value_is_used_for_all_fixed_rows() {
    let mut matrix = full_matrix(4, 2.0);
    let free = SystemVector::from_vec(vec![0.0, 1.0, 1.0, 0.0]);
    let mut rhs = SystemVector::from_vec(vec![1.0; 4]);

    matrix.apply_homogeneous_dirichlet(&free, 7.0, &mut rhs).unwrap();

    #[rustfmt::skip]
    let expected = DMatrix::from_row_slice(4, 4, &[
        7.0, 0.0, 0.0, 0.0,
        0.0, 2.0, 2.0, 0.0,
        0.0, 2.0, 2.0, 0.0,
        0.0, 0.0, 0.0, 7.0,
    ]);
    assert_eq!(matrix.to_dense(), expected);
    assert_eq!(rhs.as_slice(), &[0.0, 1.0, 1.0, 0.0]);
}

#[test]
fn zero_diagonal_value_leaves_system_unchanged() {
    let mut matrix = full_matrix(3, 2.0);
    let before = matrix.clone();
    let free = SystemVector::from_vec(vec![1.0, 0.0, 1.0]);
    let mut rhs = SystemVector::from_vec(vec![1.0, 2.0, 3.0]);

    matrix.apply_homogeneous_dirichlet(&free, 0.0, &mut rhs).unwrap();
    assert_eq!(matrix, before);
    assert_eq!(rhs.as_slice(), &[1.0, 2.0, 3.0]);
}

#[test]
fn dimensions_are_checked() {
    let mut matrix = full_matrix(3, 1.0);
    let mut rhs = SystemVector::new(3);
    let result = matrix.apply_homogeneous_dirichlet(&SystemVector::new(2), 1.0, &mut rhs);
    assert!(matches!(result, Err(SparseError::DimensionMismatch { expected: 3, actual: 2, .. })));

    let mut rhs = SystemVector::new(4);
    let result = matrix.apply_homogeneous_dirichlet(&SystemVector::new(3), 1.0, &mut rhs);
    assert!(matches!(result, Err(SparseError::DimensionMismatch { expected: 3, actual: 4, .. })));
}
