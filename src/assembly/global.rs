use crate::assembly::local::{ElementConnectivityAssembler, ElementMatrixAssembler, ElementVectorAssembler};
use crate::paradis::{IndexPartition, ParallelConfig};
use crate::sparse::{
    CsrMatrix, SparseContiguousRowGraph, SparseError, SparseGraph, SparseResult, SystemScalar, SystemVector,
};
use eyre::eyre;
use nalgebra::{DMatrix, DMatrixViewMut, DVector, DVectorViewMut, Scalar};

/// Builds the sparsity graph of the system sequentially.
///
/// Every element couples all of its dofs with each other. Rows of dofs that no element refers
/// to are not stored, see [`SparseGraph::size`].
pub fn assemble_sparse_graph(element_assembler: &(impl ?Sized + ElementConnectivityAssembler)) -> SparseGraph {
    let mut graph = SparseGraph::new();
    let mut element_dofs = Vec::new();
    for element_index in 0..element_assembler.num_elements() {
        element_dofs.resize(element_assembler.element_dof_count(element_index), 0);
        element_assembler.populate_element_dofs(&mut element_dofs, element_index);
        graph.add_entries_block(&element_dofs, &element_dofs);
    }
    graph
}

/// Builds the sparsity graph of the system in parallel, with one row per dof.
///
/// Fails if an element refers to a dof beyond [`num_dofs`](ElementConnectivityAssembler::num_dofs).
pub fn par_assemble_contiguous_graph(
    element_assembler: &(impl ?Sized + Sync + ElementConnectivityAssembler),
    config: &ParallelConfig,
) -> eyre::Result<SparseContiguousRowGraph> {
    let num_dofs = element_assembler.num_dofs();
    let graph = SparseContiguousRowGraph::new(num_dofs);
    let partition = IndexPartition::with_config(element_assembler.num_elements(), config);
    partition.try_for_each_with_tls(&Vec::new(), |element_index, element_dofs: &mut Vec<usize>| {
        element_dofs.resize(element_assembler.element_dof_count(element_index), 0);
        element_assembler.populate_element_dofs(element_dofs, element_index);
        if let Some(dof) = element_dofs.iter().find(|&&dof| dof >= num_dofs) {
            return Err(eyre!(
                "element {element_index} refers to dof {dof}, but there are only {num_dofs} dofs"
            ));
        }
        let dofs: &[usize] = element_dofs;
        graph.add_entries_block(dofs, dofs);
        Ok(())
    })?;
    log::debug!(
        "Built sparsity graph with {} rows and {} entries from {} elements",
        graph.size(),
        graph.nnz(),
        element_assembler.num_elements()
    );
    Ok(graph)
}

/// Buffers that are reused across the elements processed by a single worker.
#[derive(Debug, Clone)]
struct ElementWorkspace<T: Scalar> {
    element_dofs: Vec<usize>,
    element_matrix: DMatrix<T>,
    element_vector: DVector<T>,
}

impl<T: SystemScalar> Default for ElementWorkspace<T> {
    fn default() -> Self {
        Self {
            element_dofs: Vec::new(),
            element_matrix: DMatrix::zeros(0, 0),
            element_vector: DVector::zeros(0),
        }
    }
}

impl<T: SystemScalar> ElementWorkspace<T> {
    fn prepare_dofs(&mut self, element_assembler: &(impl ?Sized + ElementConnectivityAssembler), element_index: usize) {
        let dof_count = element_assembler.element_dof_count(element_index);
        self.element_dofs.resize(dof_count, 0);
        element_assembler.populate_element_dofs(&mut self.element_dofs, element_index);
    }

    fn zeroed_matrix(&mut self) -> DMatrixViewMut<T> {
        let n = self.element_dofs.len();
        self.element_matrix.resize_mut(n, n, T::zero());
        self.element_matrix.fill(T::zero());
        DMatrixViewMut::from(&mut self.element_matrix)
    }

    fn zeroed_vector(&mut self) -> DVectorViewMut<T> {
        let n = self.element_dofs.len();
        self.element_vector.resize_vertically_mut(n, T::zero());
        self.element_vector.fill(T::zero());
        DVectorViewMut::from(&mut self.element_vector)
    }
}

/// Parallel assembler for global systems.
///
/// Elements are distributed over the workers of the current rayon pool. Each worker computes
/// local contributions into its own workspace and adds them into the shared matrix and vector
/// with atomic additions, so no coloring of the elements is needed.
#[derive(Debug, Clone, Default)]
pub struct SystemAssembler {
    config: ParallelConfig,
}

impl SystemAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParallelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    /// Builds the sparsity graph and assembles a new square matrix.
    pub fn assemble_matrix<T, E>(&self, element_assembler: &E) -> eyre::Result<CsrMatrix<'static, T>>
    where
        T: SystemScalar,
        E: ?Sized + Sync + ElementMatrixAssembler<T>,
    {
        let graph = par_assemble_contiguous_graph(element_assembler, &self.config)?;
        let mut matrix = CsrMatrix::from_graph(&graph);
        self.assemble_matrix_into(&mut matrix, element_assembler)?;
        Ok(matrix)
    }

    pub fn assemble_vector<T, E>(&self, element_assembler: &E) -> eyre::Result<SystemVector<'static, T>>
    where
        T: SystemScalar,
        E: ?Sized + Sync + ElementVectorAssembler<T>,
    {
        let mut vector = SystemVector::new(element_assembler.num_dofs());
        self.assemble_vector_into(&mut vector, element_assembler)?;
        Ok(vector)
    }

    /// Adds the contributions of all elements into `matrix`.
    ///
    /// The sparsity pattern of `matrix` must contain every coupling of the elements. All
    /// failing elements are reported together once every worker has finished.
    pub fn assemble_matrix_into<T, E>(&self, matrix: &mut CsrMatrix<'_, T>, element_assembler: &E) -> eyre::Result<()>
    where
        T: SystemScalar,
        E: ?Sized + Sync + ElementMatrixAssembler<T>,
    {
        let num_elements = element_assembler.num_elements();
        matrix.begin_assemble();
        {
            let assembler = matrix.par_assembler();
            IndexPartition::with_config(num_elements, &self.config).try_for_each_with_tls(
                &ElementWorkspace::default(),
                |element_index, ws: &mut ElementWorkspace<T>| {
                    ws.prepare_dofs(element_assembler, element_index);
                    element_assembler.assemble_element_matrix_into(element_index, ws.zeroed_matrix())?;
                    assembler.assemble(&ws.element_matrix, &ws.element_dofs)?;
                    Ok(())
                },
            )?;
        }
        matrix.finalize_assemble();
        log::trace!("Assembled {} element matrices", num_elements);
        Ok(())
    }

    pub fn assemble_vector_into<T, E>(
        &self,
        vector: &mut SystemVector<'_, T>,
        element_assembler: &E,
    ) -> eyre::Result<()>
    where
        T: SystemScalar,
        E: ?Sized + Sync + ElementVectorAssembler<T>,
    {
        let num_elements = element_assembler.num_elements();
        vector.begin_assemble();
        {
            let assembler = vector.par_assembler();
            IndexPartition::with_config(num_elements, &self.config).try_for_each_with_tls(
                &ElementWorkspace::default(),
                |element_index, ws: &mut ElementWorkspace<T>| {
                    ws.prepare_dofs(element_assembler, element_index);
                    element_assembler.assemble_element_vector_into(element_index, ws.zeroed_vector())?;
                    assembler.assemble(ws.element_vector.as_slice(), &ws.element_dofs)?;
                    Ok(())
                },
            )?;
        }
        vector.finalize_assemble();
        log::trace!("Assembled {} element vectors", num_elements);
        Ok(())
    }

    /// Assembles matrix and right-hand side in a single pass over the elements.
    pub fn assemble_system_into<T, E>(
        &self,
        matrix: &mut CsrMatrix<'_, T>,
        rhs: &mut SystemVector<'_, T>,
        element_assembler: &E,
    ) -> eyre::Result<()>
    where
        T: SystemScalar,
        E: ?Sized + Sync + ElementMatrixAssembler<T> + ElementVectorAssembler<T>,
    {
        let num_elements = element_assembler.num_elements();
        matrix.begin_assemble();
        rhs.begin_assemble();
        {
            let matrix_assembler = matrix.par_assembler();
            let rhs_assembler = rhs.par_assembler();
            IndexPartition::with_config(num_elements, &self.config).try_for_each_with_tls(
                &ElementWorkspace::default(),
                |element_index, ws: &mut ElementWorkspace<T>| {
                    ws.prepare_dofs(element_assembler, element_index);
                    element_assembler.assemble_element_matrix_into(element_index, ws.zeroed_matrix())?;
                    element_assembler.assemble_element_vector_into(element_index, ws.zeroed_vector())?;
                    matrix_assembler.assemble(&ws.element_matrix, &ws.element_dofs)?;
                    rhs_assembler.assemble(ws.element_vector.as_slice(), &ws.element_dofs)?;
                    Ok(())
                },
            )?;
        }
        matrix.finalize_assemble();
        rhs.finalize_assemble();
        log::trace!("Assembled system from {} elements", num_elements);
        Ok(())
    }
}

/// Mask with one entry per dof: zero for the given fixed dofs, one for all others.
pub fn free_dofs_mask<T: SystemScalar>(
    num_dofs: usize,
    fixed_dofs: &[usize],
) -> SparseResult<SystemVector<'static, T>> {
    let mut mask = SystemVector::from_vec(vec![T::one(); num_dofs]);
    for &dof in fixed_dofs {
        if dof >= num_dofs {
            return Err(SparseError::IndexOutOfBounds {
                operation: "free_dofs_mask",
                index: dof,
                bound: num_dofs,
            });
        }
        mask[dof] = T::zero();
    }
    Ok(mask)
}

/// A representative magnitude for the diagonal entries of eliminated rows.
///
/// Simply using one would ignore the scaling of the matrix and may lead to poor condition
/// numbers, so the magnitude of the first non-zero diagonal entry is used instead, or one if
/// the diagonal is zero.
pub fn dirichlet_diagonal_scale<T: SystemScalar>(matrix: &CsrMatrix<'_, T>) -> T {
    (0..matrix.nrows())
        .map(|i| matrix.diagonal(i))
        .find(|d| *d != T::zero())
        .map(|d| d.abs())
        .unwrap_or_else(T::one)
}

/// Eliminates the fixed dofs from the system, setting their solution to zero.
pub fn apply_homogeneous_dirichlet_bc<T: SystemScalar>(
    matrix: &mut CsrMatrix<'_, T>,
    rhs: &mut SystemVector<'_, T>,
    fixed_dofs: &[usize],
) -> SparseResult<()> {
    let mask = free_dofs_mask(matrix.nrows(), fixed_dofs)?;
    let scale = dirichlet_diagonal_scale(matrix);
    matrix.apply_homogeneous_dirichlet(&mask, scale, rhs)
}
