use crate::csr_export::{export_csr_arrays, CsrArrays};
use crate::error::{SparseError, SparseResult};
use crate::graph::{parse_single_vector_representation, sorted, write_single_vector_representation, SparsityGraph};
use rustc_hash::FxHashSet;
use sparsim_paradis::RowLockTable;

/// A sparsity graph with a fixed number of rows, supporting concurrent insertion.
///
/// Every row holds its own column set behind its own lock, so insertions from many threads
/// into different rows never contend, and insertions into the same row are serialized.
///
/// ```
/// use sparsim_sparse::SparseContiguousRowGraph;
/// use rayon::prelude::*;
///
/// let graph = SparseContiguousRowGraph::new(4);
/// (0..4usize).into_par_iter().for_each(|i| {
///     graph.add_entries(i, &[i, (i + 1) % 4]);
///     graph.add_entry(0, i);
/// });
/// assert_eq!(graph.nnz(), 4 * 2 + 2);
/// ```
#[derive(Debug)]
pub struct SparseContiguousRowGraph {
    rows: RowLockTable<FxHashSet<usize>>,
}

impl Clone for SparseContiguousRowGraph {
    fn clone(&self) -> Self {
        Self {
            rows: RowLockTable::from_fn(self.size(), |row| self.rows.lock(row).clone()),
        }
    }
}

impl SparseContiguousRowGraph {
    pub fn new(num_rows: usize) -> Self {
        Self {
            rows: RowLockTable::new(num_rows),
        }
    }

    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// # Panics
    ///
    /// Panics if `row` is not smaller than [`size`](Self::size).
    pub fn add_entry(&self, row: usize, col: usize) {
        self.lock_row(row).insert(col);
    }

    pub fn add_entries(&self, row: usize, cols: &[usize]) {
        self.lock_row(row).extend(cols.iter().copied());
    }

    /// Inserts every pair in the cartesian product `rows × cols`, locking one row at a time.
    pub fn add_entries_block(&self, rows: &[usize], cols: &[usize]) {
        for &row in rows {
            self.add_entries(row, cols);
        }
    }

    /// Inserts all entries of `other` (set union).
    ///
    /// # Panics
    ///
    /// Panics if `other` holds entries in rows beyond [`size`](Self::size).
    pub fn merge(&self, other: &impl SparsityGraph) {
        for row in other.stored_rows() {
            self.add_entries(row, &other.row_entries(row));
        }
    }

    pub fn has(&self, row: usize, col: usize) -> bool {
        row < self.size() && self.rows.lock(row).contains(&col)
    }

    pub fn row_len(&self, row: usize) -> usize {
        self.rows.lock(row).len()
    }

    pub fn row_entries(&self, row: usize) -> Vec<usize> {
        sorted(&self.rows.lock(row))
    }

    pub fn nnz(&self) -> usize {
        (0..self.size()).map(|row| self.row_len(row)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nnz() == 0
    }

    /// Removes all entries but keeps the number of rows.
    pub fn clear(&mut self) {
        for cols in self.rows.iter_mut() {
            cols.clear();
        }
    }

    /// Exports the graph to CSR arrays.
    ///
    /// Must not run concurrently with insertions.
    pub fn export_csr_arrays(&self) -> CsrArrays {
        export_csr_arrays(
            self.size(),
            |row| self.row_len(row),
            |row, out| {
                let cols = self.rows.lock(row);
                debug_assert_eq!(cols.len(), out.len(), "Graph was modified during export");
                for (target, col) in out.iter_mut().zip(cols.iter()) {
                    *target = *col;
                }
            },
        )
    }

    /// Flat representation covering every row, including rows without entries.
    pub fn export_single_vector_representation(&self) -> Vec<usize> {
        write_single_vector_representation(
            self.size(),
            (0..self.size()).map(|row| (row, self.row_entries(row))),
        )
    }

    /// Merges the rows recorded in `data` into this graph.
    ///
    /// Fails without inserting anything if the data is malformed or refers to rows beyond
    /// [`size`](Self::size).
    pub fn add_from_single_vector_representation(&self, data: &[usize]) -> SparseResult<()> {
        let rows = parse_single_vector_representation(data)?;
        if let Some(&(row, _)) = rows.iter().find(|(row, _)| *row >= self.size()) {
            return Err(SparseError::IndexOutOfBounds {
                operation: "add_from_single_vector_representation",
                index: row,
                bound: self.size(),
            });
        }
        for (row, cols) in rows {
            self.add_entries(row, cols);
        }
        Ok(())
    }

    fn lock_row(&self, row: usize) -> parking_lot::MutexGuard<'_, FxHashSet<usize>> {
        assert!(
            row < self.size(),
            "Row {row} out of bounds for graph with {} rows",
            self.size()
        );
        self.rows.lock(row)
    }
}

impl SparsityGraph for SparseContiguousRowGraph {
    fn size(&self) -> usize {
        self.size()
    }

    fn nnz(&self) -> usize {
        self.nnz()
    }

    fn row_entries(&self, row: usize) -> Vec<usize> {
        if row < self.size() {
            self.row_entries(row)
        } else {
            Vec::new()
        }
    }

    fn stored_rows(&self) -> Vec<usize> {
        (0..self.size()).filter(|&row| self.row_len(row) > 0).collect()
    }

    fn export_csr_arrays(&self) -> CsrArrays {
        self.export_csr_arrays()
    }

    fn export_single_vector_representation(&self) -> Vec<usize> {
        self.export_single_vector_representation()
    }
}
