//! Conversion of row-wise column sets into compressed sparse row arrays.
use crate::error::{SparseError, SparseResult};
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sparsim_paradis::DisjointSliceAccess;

/// Row offsets and column indices of a CSR sparsity pattern.
///
/// For a valid pattern, `row_offsets[0] == 0`, the offsets are non-decreasing,
/// `row_offsets[nrows] == col_indices.len()`, and the columns of each row are strictly
/// increasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrArrays {
    pub row_offsets: Vec<usize>,
    pub col_indices: Vec<usize>,
}

impl Default for CsrArrays {
    fn default() -> Self {
        Self::empty(0)
    }
}

impl CsrArrays {
    /// A pattern with `nrows` empty rows.
    pub fn empty(nrows: usize) -> Self {
        Self {
            row_offsets: vec![0; nrows + 1],
            col_indices: Vec::new(),
        }
    }

    pub fn nrows(&self) -> usize {
        self.row_offsets.len().saturating_sub(1)
    }

    pub fn nnz(&self) -> usize {
        self.col_indices.len()
    }

    pub fn row(&self, row: usize) -> &[usize] {
        &self.col_indices[self.row_offsets[row]..self.row_offsets[row + 1]]
    }

    /// Largest column index plus one, or zero for a pattern without entries.
    pub fn min_ncols(&self) -> usize {
        self.col_indices.iter().max().map_or(0, |max| max + 1)
    }

    pub fn check(&self, ncols: usize) -> SparseResult<()> {
        check_csr_structure(&self.row_offsets, &self.col_indices, ncols)
    }
}

/// Verifies the structural invariants of CSR arrays with `ncols` columns.
pub fn check_csr_structure(row_offsets: &[usize], col_indices: &[usize], ncols: usize) -> SparseResult<()> {
    let invalid = |message: String| -> SparseResult<()> { Err(SparseError::InvalidStructure(message)) };

    match row_offsets.first() {
        None => return invalid("row offsets must contain at least one entry".to_string()),
        Some(&first) if first != 0 => return invalid(format!("first row offset is {first}, expected 0")),
        _ => {}
    }

    if let Some((row, _)) = row_offsets
        .iter()
        .tuple_windows()
        .find_position(|(begin, end)| begin > end)
    {
        return invalid(format!("row offsets decrease at row {row}"));
    }

    let last = *row_offsets.last().unwrap_or(&0);
    if last != col_indices.len() {
        return invalid(format!(
            "last row offset is {last}, but there are {} column indices",
            col_indices.len()
        ));
    }

    for (row, (&begin, &end)) in row_offsets.iter().tuple_windows().enumerate() {
        let cols = &col_indices[begin..end];
        if cols.iter().tuple_windows().any(|(a, b)| a >= b) {
            return invalid(format!("column indices of row {row} are not strictly increasing"));
        }
        if let Some(&col) = cols.last() {
            if col >= ncols {
                return invalid(format!(
                    "row {row} contains column {col}, but the matrix has {ncols} columns"
                ));
            }
        }
    }

    Ok(())
}

/// Turns row sizes into row offsets. Sequential by nature.
pub fn offsets_from_row_sizes(row_sizes: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(row_sizes.len() + 1);
    let mut current = 0;
    offsets.push(current);
    for size in row_sizes {
        current += size;
        offsets.push(current);
    }
    offsets
}

/// Builds CSR arrays for `num_rows` rows.
///
/// `row_size(r)` must return the number of distinct columns in row `r`, and `fill_row(r, out)`
/// must write exactly those columns, in any order, into `out`. Row sizes are computed in
/// parallel, the offsets are then formed by a single sequential prefix sum, after which rows
/// are filled and finally sorted in parallel.
pub fn export_csr_arrays<S, F>(num_rows: usize, row_size: S, fill_row: F) -> CsrArrays
where
    S: Fn(usize) -> usize + Sync,
    F: Fn(usize, &mut [usize]) + Sync,
{
    let row_sizes: Vec<usize> = (0..num_rows)
        .into_par_iter()
        .map(|row| row_size(row))
        .collect();
    let row_offsets = offsets_from_row_sizes(&row_sizes);

    let mut col_indices = vec![0; row_offsets[num_rows]];
    {
        let access = DisjointSliceAccess::new(&mut col_indices);
        let offsets = &row_offsets;
        // Offsets are non-decreasing, so the ranges of distinct rows never overlap
        (0..num_rows).into_par_iter().for_each(|row| {
            let cols = unsafe { access.range_mut(offsets[row]..offsets[row + 1]) };
            fill_row(row, cols);
        });
        (0..num_rows).into_par_iter().for_each(|row| {
            let cols = unsafe { access.range_mut(offsets[row]..offsets[row + 1]) };
            cols.sort_unstable();
        });
    }

    log::debug!(
        "Exported CSR arrays with {} rows and {} entries",
        num_rows,
        col_indices.len()
    );

    CsrArrays {
        row_offsets,
        col_indices,
    }
}
