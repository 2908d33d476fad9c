use crate::buffer::SystemBuffer;
use crate::csr_export::{check_csr_structure, CsrArrays};
use crate::error::{SparseError, SparseResult};
use crate::graph::{SparseGraph, SparsityGraph};
use crate::SystemScalar;
use nalgebra::DMatrix;
use num::Zero;
use rayon::prelude::*;
use sparsim_paradis::{DisjointSliceAccess, IndexPartition, MaxReduction, MinReduction, SumReduction};
use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

/// A sparse matrix in compressed sparse row (CSR) format.
///
/// The matrix holds three buffers: `row_offsets` (length `nrows + 1`), `col_indices` and
/// `values` (both of length `nnz`). The column indices of each row are strictly increasing.
/// The number of columns is stored separately and is never inferred from the column indices.
///
/// A matrix either owns its buffers or is a view over buffers supplied by the caller, see
/// [`from_borrowed_csr_data`](Self::from_borrowed_csr_data). Operations that would reallocate
/// storage fail for views.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<'a, T> {
    ncols: usize,
    row_offsets: SystemBuffer<'a, usize>,
    col_indices: SystemBuffer<'a, usize>,
    values: SystemBuffer<'a, T>,
}

impl<'a, T> Default for CsrMatrix<'a, T> {
    fn default() -> Self {
        Self::zeros(0, 0)
    }
}

impl<'a, T> CsrMatrix<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A matrix of the given shape without any stored entries.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            ncols,
            row_offsets: vec![0; nrows + 1].into(),
            col_indices: Vec::new().into(),
            values: Vec::new().into(),
        }
    }

    /// Creates an owning matrix from CSR data, validating the structure.
    pub fn from_csr_data(
        nrows: usize,
        ncols: usize,
        row_offsets: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<T>,
    ) -> SparseResult<Self> {
        SparseError::check_dimension("from_csr_data (row offsets)", nrows + 1, row_offsets.len())?;
        SparseError::check_dimension("from_csr_data (values)", col_indices.len(), values.len())?;
        check_csr_structure(&row_offsets, &col_indices, ncols)?;
        Ok(Self {
            ncols,
            row_offsets: row_offsets.into(),
            col_indices: col_indices.into(),
            values: values.into(),
        })
    }

    /// Creates a non-owning matrix over caller supplied buffers, validating the structure.
    ///
    /// The matrix may modify the values (and, through [`csr_data_mut`](Self::csr_data_mut),
    /// the structure) in place, but it never resizes or frees the buffers.
    pub fn from_borrowed_csr_data(
        ncols: usize,
        row_offsets: &'a mut [usize],
        col_indices: &'a mut [usize],
        values: &'a mut [T],
    ) -> SparseResult<Self> {
        SparseError::check_dimension("from_borrowed_csr_data (values)", col_indices.len(), values.len())?;
        check_csr_structure(row_offsets, col_indices, ncols)?;
        Ok(Self {
            ncols,
            row_offsets: row_offsets.into(),
            col_indices: col_indices.into(),
            values: values.into(),
        })
    }

    pub fn nrows(&self) -> usize {
        self.row_offsets.len().saturating_sub(1)
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Sets the number of columns.
    ///
    /// Declaring fewer columns than the pattern uses is only detected by [`check`](Self::check).
    pub fn set_ncols(&mut self, ncols: usize) {
        self.ncols = ncols;
    }

    pub fn nnz(&self) -> usize {
        self.col_indices.len()
    }

    /// Whether the matrix owns all of its buffers.
    pub fn is_owner(&self) -> bool {
        self.row_offsets.is_owner() && self.col_indices.is_owner() && self.values.is_owner()
    }

    pub fn row_offsets(&self) -> &[usize] {
        &self.row_offsets
    }

    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Mutable access to all three buffers, e.g. for filling a matrix after
    /// [`reserve`](Self::reserve). The caller is responsible for leaving a valid structure.
    pub fn csr_data_mut(&mut self) -> (&mut [usize], &mut [usize], &mut [T]) {
        (&mut self.row_offsets, &mut self.col_indices, &mut self.values)
    }

    pub fn into_csr_data(self) -> (Vec<usize>, Vec<usize>, Vec<T>)
    where
        T: Clone,
    {
        (
            self.row_offsets.into_owned(),
            self.col_indices.into_owned(),
            self.values.into_owned(),
        )
    }

    /// Column indices and values of the given row.
    pub fn row(&self, row: usize) -> (&[usize], &[T]) {
        let range = self.row_offsets[row]..self.row_offsets[row + 1];
        (&self.col_indices[range.clone()], &self.values[range])
    }

    pub fn row_mut(&mut self, row: usize) -> (&[usize], &mut [T]) {
        let range = self.row_offsets[row]..self.row_offsets[row + 1];
        (&self.col_indices[range.clone()], &mut self.values[range])
    }

    /// A parallel iterator over `(row, column indices, values)` of all rows.
    pub fn par_rows_mut<'s>(&'s mut self) -> impl 's + IndexedParallelIterator<Item = (usize, &'s [usize], &'s mut [T])>
    where
        T: Send + Sync,
    {
        let nrows = self.nrows();
        let offsets = self.row_offsets.as_slice();
        let cols = self.col_indices.as_slice();
        let access = DisjointSliceAccess::new(self.values.as_mut_slice());
        (0..nrows).into_par_iter().map(move |row| {
            let range = offsets[row]..offsets[row + 1];
            // Every row is visited once, and distinct rows own disjoint value ranges
            let values = unsafe { access.range_mut(range.clone()) };
            (row, &cols[range], values)
        })
    }

    /// Position of the entry `(row, col)` in the value buffer, if it is part of the pattern.
    pub fn find_entry(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.nrows() {
            return None;
        }
        let begin = self.row_offsets[row];
        let end = self.row_offsets[row + 1];
        self.col_indices[begin..end]
            .binary_search(&col)
            .ok()
            .map(|local| begin + local)
    }

    pub fn has(&self, row: usize, col: usize) -> bool {
        self.find_entry(row, col).is_some()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        self.find_entry(row, col).map(|k| &self.values[k])
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut T> {
        self.find_entry(row, col).map(move |k| &mut self.values[k])
    }

    /// Reallocates the buffers for `nrows` rows and `nnz` entries.
    ///
    /// All offsets, column indices and values are zero afterwards; the caller is expected to
    /// fill them through [`csr_data_mut`](Self::csr_data_mut). The column count is unchanged.
    /// Fails for matrices that do not own their buffers.
    pub fn reserve(&mut self, nrows: usize, nnz: usize) -> SparseResult<()>
    where
        T: Zero + Clone,
    {
        if !self.is_owner() {
            return Err(SparseError::BorrowedBuffer { operation: "reserve" });
        }
        self.row_offsets.replace(vec![0; nrows + 1], "reserve")?;
        self.col_indices.replace(vec![0; nnz], "reserve")?;
        self.values.replace(vec![T::zero(); nnz], "reserve")?;
        log::debug!("Reserved CSR matrix storage for {} rows and {} entries", nrows, nnz);
        Ok(())
    }

    /// Checks the structural consistency of the matrix, including that no column index
    /// exceeds the declared number of columns.
    pub fn check(&self) -> SparseResult<()> {
        SparseError::check_dimension("check (values)", self.col_indices.len(), self.values.len())?;
        check_csr_structure(&self.row_offsets, &self.col_indices, self.ncols)
    }

    /// Iterates over `(row, col, value)` of all stored entries in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let offsets = self.row_offsets();
        (0..self.nrows()).flat_map(move |row| {
            let range = offsets[row]..offsets[row + 1];
            self.col_indices[range.clone()]
                .iter()
                .zip(&self.values[range])
                .map(move |(col, value)| (row, *col, value))
        })
    }

    pub fn begin_assemble(&mut self) {}

    pub fn finalize_assemble(&mut self) {}
}

impl<'a, T: SystemScalar> CsrMatrix<'a, T> {
    /// Matrix with the structure of the graph and all values zero.
    ///
    /// The matrix is square unless the graph holds columns beyond its last row, in which case
    /// it is widened to fit every column.
    pub fn from_graph(graph: &impl SparsityGraph) -> Self {
        let arrays = graph.export_csr_arrays();
        let ncols = arrays.nrows().max(arrays.min_ncols());
        Self::from_exported_graph(arrays, ncols)
    }

    /// Matrix with the structure of the graph and a caller-supplied number of columns.
    ///
    /// The column count is not validated against the graph, see [`check`](Self::check).
    pub fn from_graph_with_ncols(graph: &impl SparsityGraph, ncols: usize) -> Self {
        Self::from_exported_graph(graph.export_csr_arrays(), ncols)
    }

    fn from_exported_graph(arrays: CsrArrays, ncols: usize) -> Self {
        log::debug!(
            "Creating {}x{} CSR matrix with {} entries from graph",
            arrays.nrows(),
            ncols,
            arrays.nnz()
        );
        Self::from_csr_arrays_unchecked(arrays, ncols)
    }

    /// Matrix with the given structure and all values zero. The structure is validated.
    pub fn from_csr_arrays(arrays: CsrArrays, ncols: usize) -> SparseResult<Self> {
        arrays.check(ncols)?;
        Ok(Self::from_csr_arrays_unchecked(arrays, ncols))
    }

    fn from_csr_arrays_unchecked(arrays: CsrArrays, ncols: usize) -> Self {
        let nnz = arrays.nnz();
        Self {
            ncols,
            row_offsets: arrays.row_offsets.into(),
            col_indices: arrays.col_indices.into(),
            values: vec![T::zero(); nnz].into(),
        }
    }

    /// Builds a matrix from `(row, col) -> value` entries.
    ///
    /// The shape is the smallest one containing every entry. The pattern is built through a
    /// [`SparseGraph`] so that it comes out sorted, and the values are then assembled.
    pub fn from_map(entries: &BTreeMap<(usize, usize), T>) -> Self {
        let mut graph = SparseGraph::new();
        let mut ncols = 0;
        for &(row, col) in entries.keys() {
            graph.add_entry(row, col);
            ncols = ncols.max(col + 1);
        }

        let mut matrix = Self::from_graph_with_ncols(&graph, ncols);
        for (&(row, col), value) in entries {
            if let Some(target) = matrix.get_mut(row, col) {
                *target += *value;
            }
        }
        matrix
    }

    pub fn to_map(&self) -> BTreeMap<(usize, usize), T> {
        self.iter()
            .map(|(row, col, value)| ((row, col), *value))
            .collect()
    }

    pub fn to_dense(&self) -> DMatrix<T> {
        let mut dense = DMatrix::zeros(self.nrows(), self.ncols());
        for (row, col, value) in self.iter() {
            dense[(row, col)] = *value;
        }
        dense
    }

    pub fn from_nalgebra_csr(matrix: &nalgebra_sparse::CsrMatrix<T>) -> Self {
        Self {
            ncols: matrix.ncols(),
            row_offsets: matrix.row_offsets().to_vec().into(),
            col_indices: matrix.col_indices().to_vec().into(),
            values: matrix.values().to_vec().into(),
        }
    }

    /// Copies the matrix into an `nalgebra_sparse` matrix, e.g. for handing it to a solver.
    pub fn to_nalgebra_csr(&self) -> SparseResult<nalgebra_sparse::CsrMatrix<T>> {
        nalgebra_sparse::CsrMatrix::try_from_csr_data(
            self.nrows(),
            self.ncols(),
            self.row_offsets.to_vec(),
            self.col_indices.to_vec(),
            self.values.to_vec(),
        )
        .map_err(|err| SparseError::InvalidStructure(err.to_string()))
    }

    /// Sets every stored value to `value`.
    pub fn set_value(&mut self, value: T) {
        self.values.par_iter_mut().for_each(|v| *v = value);
    }

    pub fn set_zero(&mut self) {
        self.set_value(T::zero());
    }

    pub fn scale(&mut self, factor: T) {
        self.values.par_iter_mut().for_each(|v| *v *= factor);
    }

    pub fn norm_frobenius(&self) -> T {
        let values = self.values();
        IndexPartition::new(values.len())
            .reduce::<SumReduction<T>, _>(|k| values[k] * values[k])
            .sqrt()
    }

    /// The diagonal entry of the given row, or zero if it is not part of the pattern.
    pub fn diagonal(&self, row: usize) -> T {
        self.get(row, row).copied().unwrap_or_else(T::zero)
    }

    /// Euclidean norm of the diagonal.
    pub fn diagonal_norm(&self) -> T {
        IndexPartition::new(self.nrows())
            .reduce::<SumReduction<T>, _>(|i| {
                let d = self.diagonal(i);
                d * d
            })
            .sqrt()
    }

    /// Largest diagonal magnitude, or zero for a matrix without rows.
    pub fn max_diagonal(&self) -> T {
        if self.nrows() == 0 {
            return T::zero();
        }
        IndexPartition::new(self.nrows()).reduce::<MaxReduction<T>, _>(|i| self.diagonal(i).abs())
    }

    /// Smallest diagonal magnitude, or zero for a matrix without rows.
    pub fn min_diagonal(&self) -> T {
        if self.nrows() == 0 {
            return T::zero();
        }
        IndexPartition::new(self.nrows()).reduce::<MinReduction<T>, _>(|i| self.diagonal(i).abs())
    }
}

impl<'a, T> Index<(usize, usize)> for CsrMatrix<'a, T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if the entry is not part of the sparsity pattern.
    fn index(&self, (row, col): (usize, usize)) -> &T {
        match self.find_entry(row, col) {
            Some(k) => &self.values[k],
            None => panic!("{}", SparseError::EntryNotFound { row, col }),
        }
    }
}

impl<'a, T> IndexMut<(usize, usize)> for CsrMatrix<'a, T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        match self.find_entry(row, col) {
            Some(k) => &mut self.values[k],
            None => panic!("{}", SparseError::EntryNotFound { row, col }),
        }
    }
}
