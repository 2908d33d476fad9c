//! Sparse matrix-vector products.
use crate::csr::CsrMatrix;
use crate::error::{SparseError, SparseResult};
use crate::vector::SystemVector;
use crate::SystemScalar;
use rayon::prelude::*;
use sparsim_paradis::{AtomicSlice, IndexPartition};

impl<'a, T: SystemScalar> CsrMatrix<'a, T> {
    /// Computes `y = A x`.
    ///
    /// Rows are processed in parallel, each writing only its own entry of `y`.
    pub fn spmv(&self, x: &SystemVector<'_, T>, y: &mut SystemVector<'_, T>) -> SparseResult<()> {
        self.spmv_scaled(T::one(), x, T::zero(), y)
    }

    /// Computes `y = alpha A x + beta y`.
    ///
    /// If `beta` is zero, `y` is overwritten without being read.
    pub fn spmv_scaled(
        &self,
        alpha: T,
        x: &SystemVector<'_, T>,
        beta: T,
        y: &mut SystemVector<'_, T>,
    ) -> SparseResult<()> {
        SparseError::check_dimension("spmv (x)", self.ncols(), x.len())?;
        SparseError::check_dimension("spmv (y)", self.nrows(), y.len())?;

        let x = x.as_slice();
        y.as_mut_slice()
            .par_iter_mut()
            .with_min_len(64)
            .enumerate()
            .for_each(|(row, y_row)| {
                let (cols, values) = self.row(row);
                let dot = cols
                    .iter()
                    .zip(values)
                    .fold(T::zero(), |acc, (&col, &a)| acc + a * x[col]);
                *y_row = if beta == T::zero() {
                    alpha * dot
                } else {
                    alpha * dot + beta * *y_row
                };
            });
        Ok(())
    }

    /// Computes `y += Aᵀ x`.
    ///
    /// Each row of `A` scatters into `y`, so rows sharing a column add concurrently into the
    /// same entry. The additions are atomic.
    pub fn transpose_spmv(&self, x: &SystemVector<'_, T>, y: &mut SystemVector<'_, T>) -> SparseResult<()> {
        self.transpose_spmv_scaled(T::one(), x, T::one(), y)
    }

    /// Computes `y = alpha Aᵀ x + beta y`.
    ///
    /// `y` is scaled by `beta` first, then the product is accumulated.
    pub fn transpose_spmv_scaled(
        &self,
        alpha: T,
        x: &SystemVector<'_, T>,
        beta: T,
        y: &mut SystemVector<'_, T>,
    ) -> SparseResult<()> {
        SparseError::check_dimension("transpose_spmv (x)", self.nrows(), x.len())?;
        SparseError::check_dimension("transpose_spmv (y)", self.ncols(), y.len())?;

        if beta == T::zero() {
            y.set_zero();
        } else if beta != T::one() {
            y.scale(beta);
        }

        let x = x.as_slice();
        let y = AtomicSlice::new(y.as_mut_slice());
        IndexPartition::new(self.nrows()).for_each(|row| {
            let x_row = alpha * x[row];
            let (cols, values) = self.row(row);
            for (&col, &a) in cols.iter().zip(values) {
                y.add(col, a * x_row);
            }
        });
        Ok(())
    }
}
