use proptest::collection::vec;
use proptest::prelude::*;

/// Poor man's approx assertion for matrices
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = $x - $y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

#[macro_export]
macro_rules! assert_panics {
    ($e:expr) => {{
        use std::panic::catch_unwind;
        use std::stringify;
        let expr_string = stringify!($e);
        let result = catch_unwind(|| $e);
        if result.is_ok() {
            panic!("assert_panics!({}) failed.", expr_string);
        }
    }};
}

/// Asserts that CSR arrays describe a valid pattern with `nrows` rows and `ncols` columns.
pub fn assert_csr_invariants(row_offsets: &[usize], col_indices: &[usize], nrows: usize, ncols: usize) {
    assert_eq!(row_offsets.len(), nrows + 1, "There must be one offset per row plus one.");
    assert_eq!(row_offsets[0], 0, "First offset must be zero.");
    assert_eq!(
        row_offsets[nrows],
        col_indices.len(),
        "Last offset must equal the number of column indices."
    );
    for row in 0..nrows {
        let (begin, end) = (row_offsets[row], row_offsets[row + 1]);
        assert!(begin <= end, "Offsets must be non-decreasing (row {row}).");
        let cols = &col_indices[begin..end];
        assert!(
            cols.windows(2).all(|w| w[0] < w[1]),
            "Columns of row {row} must be strictly increasing, got {cols:?}."
        );
        assert!(
            cols.iter().all(|&col| col < ncols),
            "Columns of row {row} must be smaller than {ncols}, got {cols:?}."
        );
    }
}

/// Turns element sizes into offsets, starting from `x0`.
pub fn prefix_sum(counts: impl IntoIterator<Item = usize>, x0: usize) -> impl Iterator<Item = usize> {
    counts.into_iter().scan(x0, |sum, x| {
        let current = *sum;
        *sum += x;
        Some(current)
    })
}

/// Arbitrary `(row, col)` entries with `row < max_rows` and `col < max_cols`, possibly repeated.
pub fn entries_strategy(
    max_rows: usize,
    max_cols: usize,
    max_entries: usize,
) -> impl Strategy<Value = Vec<(usize, usize)>> {
    vec((0..max_rows, 0..max_cols), 0..=max_entries)
}

/// A number of dofs together with elements whose dofs are distinct and smaller than it.
pub fn element_connectivity_strategy(
    max_dofs: usize,
    max_elements: usize,
    max_element_dofs: usize,
) -> impl Strategy<Value = (usize, Vec<Vec<usize>>)> {
    (1..=max_dofs).prop_flat_map(move |num_dofs| {
        let all_dofs: Vec<usize> = (0..num_dofs).collect();
        let element = (Just(all_dofs).prop_shuffle(), 1..=max_element_dofs.min(num_dofs))
            .prop_map(|(dofs, len)| dofs[..len].to_vec());
        (Just(num_dofs), vec(element, 0..=max_elements))
    })
}
