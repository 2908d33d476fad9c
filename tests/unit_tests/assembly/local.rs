use super::Bar;
use nalgebra::DMatrix;
use sparsim::assembly::local::{DofConnectivity, ElementConnectivityAssembler, ElementMatrixAssembler};
use sparsim::sparse::SparseError;

#[test]
fn dof_connectivity_stores_elements() {
    let connectivity = DofConnectivity::from_elements(5, &[vec![0, 3], vec![4, 1, 2], vec![]]).unwrap();
    assert_eq!(connectivity.num_elements(), 3);
    assert_eq!(connectivity.num_dofs(), 5);
    assert_eq!(connectivity.element_dof_count(1), 3);
    assert_eq!(connectivity.element_dofs(1), &[4, 1, 2]);
    assert!(connectivity.element_dofs(2).is_empty());

    let mut output = vec![0; 2];
    connectivity.populate_element_dofs(&mut output, 0);
    assert_eq!(output, vec![0, 3]);

    let all: Vec<&[usize]> = connectivity.iter().collect();
    assert_eq!(all.len(), 3);
}

#[test]
fn dof_connectivity_rejects_dofs_out_of_bounds() {
    let result = DofConnectivity::from_elements(3, &[[0, 1], [2, 3]]);
    assert!(matches!(result, Err(SparseError::IndexOutOfBounds { index: 3, bound: 3, .. })));
}

#[test]
fn map_element_dofs_offsets_indices() {
    let mapped = Bar::new(2).map_element_dofs(10, |dof| dof + 5);
    assert_eq!(mapped.num_dofs(), 10);
    assert_eq!(mapped.num_elements(), 2);

    let mut output = vec![0; 2];
    mapped.populate_element_dofs(&mut output, 1);
    assert_eq!(output, vec![6, 7]);

    let mut local = DMatrix::<f64>::zeros(2, 2);
    mapped
        .assemble_element_matrix_into(0, (&mut local).into())
        .unwrap();
    assert_eq!(local, DMatrix::from_row_slice(2, 2, &[1.0, -1.0, -1.0, 1.0]));
}

#[test]
fn map_element_dofs_works_on_references() {
    let connectivity = DofConnectivity::from_elements(3, &[[0, 2]]).unwrap();
    let reversed = (&connectivity).map_element_dofs(3, |dof| 2 - dof);
    let mut output = vec![0; 2];
    reversed.populate_element_dofs(&mut output, 0);
    assert_eq!(output, vec![2, 0]);
}
