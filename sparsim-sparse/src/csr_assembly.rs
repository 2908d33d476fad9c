use crate::csr::CsrMatrix;
use crate::error::{SparseError, SparseResult};
use crate::SystemScalar;
use nalgebra::storage::Storage;
use nalgebra::{Dim, Matrix};
use sparsim_paradis::AtomicSlice;

/// Shared handle for concurrent assembly into a [`CsrMatrix`] with a fixed sparsity pattern.
///
/// The handle is obtained through [`CsrMatrix::par_assembler`] and borrows the matrix
/// exclusively, so nothing can read the values while assembly is in progress. The handle itself
/// is `Sync`: every worker adds into the matrix through the same `&CsrParallelAssembler`, and
/// every addition is atomic.
#[derive(Debug)]
pub struct CsrParallelAssembler<'m, T: SystemScalar> {
    nrows: usize,
    ncols: usize,
    row_offsets: &'m [usize],
    col_indices: &'m [usize],
    values: AtomicSlice<'m, T>,
}

impl<'a, T: SystemScalar> CsrMatrix<'a, T> {
    pub fn par_assembler(&mut self) -> CsrParallelAssembler<'_, T> {
        let nrows = self.nrows();
        let ncols = self.ncols();
        let (row_offsets, col_indices, values) = self.csr_data_mut();
        CsrParallelAssembler {
            nrows,
            ncols,
            row_offsets,
            col_indices,
            values: AtomicSlice::new(values),
        }
    }

    /// Adds the square local matrix into the rows and columns given by `equation_ids`.
    pub fn assemble<R, C, S>(&mut self, local: &Matrix<T, R, C, S>, equation_ids: &[usize]) -> SparseResult<()>
    where
        R: Dim,
        C: Dim,
        S: Storage<T, R, C>,
    {
        self.par_assembler().assemble(local, equation_ids)
    }

    pub fn assemble_rows_cols<R, C, S>(
        &mut self,
        local: &Matrix<T, R, C, S>,
        row_ids: &[usize],
        col_ids: &[usize],
    ) -> SparseResult<()>
    where
        R: Dim,
        C: Dim,
        S: Storage<T, R, C>,
    {
        self.par_assembler().assemble_rows_cols(local, row_ids, col_ids)
    }

    pub fn assemble_entry(&mut self, value: T, row: usize, col: usize) -> SparseResult<()> {
        self.par_assembler().assemble_entry(value, row, col)
    }
}

impl<'m, T: SystemScalar> CsrParallelAssembler<'m, T> {
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Adds the local matrix into the rows and columns given by `equation_ids`.
    pub fn assemble<R, C, S>(&self, local: &Matrix<T, R, C, S>, equation_ids: &[usize]) -> SparseResult<()>
    where
        R: Dim,
        C: Dim,
        S: Storage<T, R, C>,
    {
        self.assemble_rows_cols(local, equation_ids, equation_ids)
    }

    /// Adds `local[(r, c)]` to the entry `(row_ids[r], col_ids[c])` for every local entry.
    ///
    /// Every target entry must already be part of the sparsity pattern. Rows are processed in
    /// order, so entries of rows preceding a failing row have been added when an error is
    /// returned.
    pub fn assemble_rows_cols<R, C, S>(
        &self,
        local: &Matrix<T, R, C, S>,
        row_ids: &[usize],
        col_ids: &[usize],
    ) -> SparseResult<()>
    where
        R: Dim,
        C: Dim,
        S: Storage<T, R, C>,
    {
        SparseError::check_dimension("assemble (rows)", row_ids.len(), local.nrows())?;
        SparseError::check_dimension("assemble (columns)", col_ids.len(), local.ncols())?;
        if let Some(&col) = col_ids.iter().find(|&&col| col >= self.ncols) {
            return Err(SparseError::IndexOutOfBounds {
                operation: "assemble",
                index: col,
                bound: self.ncols,
            });
        }

        let (first_col, remaining_cols) = match col_ids.split_first() {
            Some(split) => split,
            None => return Ok(()),
        };

        for (local_row, &row) in row_ids.iter().enumerate() {
            let (offset, cols) = self.row_pattern(row)?;
            let not_found = |col| SparseError::EntryNotFound { row, col };

            let mut position = cols.binary_search(first_col).map_err(|_| not_found(*first_col))?;
            self.values.add(offset + position, local[(local_row, 0)]);

            for (local_col, &col) in remaining_cols.iter().enumerate() {
                position = locate_after(cols, position, col).ok_or_else(|| not_found(col))?;
                self.values.add(offset + position, local[(local_row, local_col + 1)]);
            }
        }
        Ok(())
    }

    pub fn assemble_entry(&self, value: T, row: usize, col: usize) -> SparseResult<()> {
        let (offset, cols) = self.row_pattern(row)?;
        let position = cols
            .binary_search(&col)
            .map_err(|_| SparseError::EntryNotFound { row, col })?;
        self.values.add(offset + position, value);
        Ok(())
    }

    fn row_pattern(&self, row: usize) -> SparseResult<(usize, &'m [usize])> {
        if row >= self.nrows {
            return Err(SparseError::IndexOutOfBounds {
                operation: "assemble",
                index: row,
                bound: self.nrows,
            });
        }
        let begin = self.row_offsets[row];
        let end = self.row_offsets[row + 1];
        Ok((begin, &self.col_indices[begin..end]))
    }
}

/// Finds `col` in the sorted `cols`, given that `cols[last]` was the previous hit.
///
/// Local matrices usually list their dofs in nearly ascending order, so the common case is
/// that the next column is stored right after the previous one.
fn locate_after(cols: &[usize], last: usize, col: usize) -> Option<usize> {
    let previous = cols[last];
    if col == previous {
        Some(last)
    } else if col > previous {
        let next = last + 1;
        if cols.get(next) == Some(&col) {
            Some(next)
        } else {
            cols[next..].binary_search(&col).ok().map(|k| next + k)
        }
    } else {
        cols[..last].binary_search(&col).ok()
    }
}
