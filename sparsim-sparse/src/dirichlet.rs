use crate::csr::CsrMatrix;
use crate::error::{SparseError, SparseResult};
use crate::vector::SystemVector;
use crate::SystemScalar;
use rayon::prelude::*;

impl<'a, T: SystemScalar> CsrMatrix<'a, T> {
    /// Applies homogeneous Dirichlet conditions in place.
    ///
    /// `free_dofs` holds one entry per dof: zero marks a fixed dof, one a free dof. For every
    /// fixed row, all off-diagonal entries are zeroed, the diagonal is set to `diagonal_value`
    /// and the corresponding entry of `rhs` is zeroed. In every free row, each entry is
    /// multiplied by the mask value of its column, which removes the couplings to fixed dofs.
    ///
    /// If `diagonal_value` is zero, nothing is modified.
    pub fn apply_homogeneous_dirichlet(
        &mut self,
        free_dofs: &SystemVector<'_, T>,
        diagonal_value: T,
        rhs: &mut SystemVector<'_, T>,
    ) -> SparseResult<()> {
        let n = self.nrows();
        SparseError::check_dimension("apply_homogeneous_dirichlet (columns)", n, self.ncols())?;
        SparseError::check_dimension("apply_homogeneous_dirichlet (free dofs)", n, free_dofs.len())?;
        SparseError::check_dimension("apply_homogeneous_dirichlet (rhs)", n, rhs.len())?;

        if diagonal_value == T::zero() {
            log::debug!("Diagonal value for Dirichlet conditions is zero, leaving system unchanged");
            return Ok(());
        }

        let free = free_dofs.as_slice();
        let num_fixed: usize = self
            .par_rows_mut()
            .zip(rhs.as_mut_slice().par_iter_mut())
            .map(|((row, cols, values), rhs_row)| {
                if free[row] == T::zero() {
                    for (&col, value) in cols.iter().zip(values.iter_mut()) {
                        *value = if col == row { diagonal_value } else { T::zero() };
                    }
                    *rhs_row = T::zero();
                    1
                } else {
                    for (&col, value) in cols.iter().zip(values.iter_mut()) {
                        *value *= free[col];
                    }
                    0
                }
            })
            .sum();

        log::debug!(
            "Applied homogeneous Dirichlet conditions to {} of {} dofs",
            num_fixed,
            n
        );
        Ok(())
    }
}
