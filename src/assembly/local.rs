use crate::sparse::{SparseError, SparseResult};
use nalgebra::{DMatrixViewMut, DVectorViewMut, Scalar};
use serde::{Deserialize, Serialize};

/// Describes which global degrees of freedom (dofs) each element couples.
pub trait ElementConnectivityAssembler {
    fn num_elements(&self) -> usize;

    /// Total number of dofs, i.e. the number of rows of the assembled system.
    fn num_dofs(&self) -> usize;

    fn element_dof_count(&self, element_index: usize) -> usize;

    /// Writes the global dofs of the element into `output`, whose length is
    /// [`element_dof_count`](Self::element_dof_count).
    fn populate_element_dofs(&self, output: &mut [usize], element_index: usize);

    /// Returns an adapter that modifies element dof indices according to the provided function.
    ///
    /// Changing the dof indices usually changes the total number of dofs as well, so the new
    /// total has to be provided. This is typically used to offset the dofs of one body so that
    /// it can be assembled directly into a larger system containing several bodies.
    fn map_element_dofs<F>(self, new_num_dofs: usize, f: F) -> MapElementDofs<Self, F>
    where
        Self: Sized,
    {
        MapElementDofs {
            mapped: self,
            function: f,
            num_dofs: new_num_dofs,
        }
    }
}

pub trait ElementMatrixAssembler<T: Scalar>: ElementConnectivityAssembler {
    /// Writes the local matrix of the element into `output`, which is zeroed and square with
    /// one row per element dof.
    fn assemble_element_matrix_into(&self, element_index: usize, output: DMatrixViewMut<T>) -> eyre::Result<()>;
}

pub trait ElementVectorAssembler<T: Scalar>: ElementConnectivityAssembler {
    fn assemble_element_vector_into(&self, element_index: usize, output: DVectorViewMut<T>) -> eyre::Result<()>;
}

impl<'a, A: ?Sized + ElementConnectivityAssembler> ElementConnectivityAssembler for &'a A {
    fn num_elements(&self) -> usize {
        (**self).num_elements()
    }

    fn num_dofs(&self) -> usize {
        (**self).num_dofs()
    }

    fn element_dof_count(&self, element_index: usize) -> usize {
        (**self).element_dof_count(element_index)
    }

    fn populate_element_dofs(&self, output: &mut [usize], element_index: usize) {
        (**self).populate_element_dofs(output, element_index)
    }
}

/// Element-to-dof connectivity stored in a compact offset/index form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DofConnectivity {
    num_dofs: usize,
    offsets: Vec<usize>,
    dofs: Vec<usize>,
}

impl DofConnectivity {
    /// Collects the dofs of every element, checking that all dofs are smaller than `num_dofs`.
    pub fn from_elements<E: AsRef<[usize]>>(num_dofs: usize, elements: &[E]) -> SparseResult<Self> {
        let mut offsets = Vec::with_capacity(elements.len() + 1);
        let mut dofs = Vec::new();
        offsets.push(0);
        for element in elements {
            let element = element.as_ref();
            if let Some(&dof) = element.iter().find(|&&dof| dof >= num_dofs) {
                return Err(SparseError::IndexOutOfBounds {
                    operation: "DofConnectivity::from_elements",
                    index: dof,
                    bound: num_dofs,
                });
            }
            dofs.extend_from_slice(element);
            offsets.push(dofs.len());
        }
        Ok(Self {
            num_dofs,
            offsets,
            dofs,
        })
    }

    pub fn element_dofs(&self, element_index: usize) -> &[usize] {
        &self.dofs[self.offsets[element_index]..self.offsets[element_index + 1]]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        (0..self.num_elements()).map(move |e| self.element_dofs(e))
    }
}

impl ElementConnectivityAssembler for DofConnectivity {
    fn num_elements(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    fn element_dof_count(&self, element_index: usize) -> usize {
        self.offsets[element_index + 1] - self.offsets[element_index]
    }

    fn populate_element_dofs(&self, output: &mut [usize], element_index: usize) {
        output.copy_from_slice(self.element_dofs(element_index));
    }
}

#[derive(Debug, Clone)]
pub struct MapElementDofs<Mapped, F> {
    mapped: Mapped,
    function: F,
    num_dofs: usize,
}

impl<Assembler, F> ElementConnectivityAssembler for MapElementDofs<Assembler, F>
where
    Assembler: ElementConnectivityAssembler,
    F: Fn(usize) -> usize,
{
    fn num_elements(&self) -> usize {
        self.mapped.num_elements()
    }

    fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    fn element_dof_count(&self, element_index: usize) -> usize {
        self.mapped.element_dof_count(element_index)
    }

    fn populate_element_dofs(&self, output: &mut [usize], element_index: usize) {
        self.mapped.populate_element_dofs(output, element_index);
        for dof in output {
            *dof = (self.function)(*dof);
        }
    }
}

impl<T, Assembler, F> ElementMatrixAssembler<T> for MapElementDofs<Assembler, F>
where
    T: Scalar,
    Assembler: ElementMatrixAssembler<T>,
    F: Fn(usize) -> usize,
{
    fn assemble_element_matrix_into(&self, element_index: usize, output: DMatrixViewMut<T>) -> eyre::Result<()> {
        self.mapped.assemble_element_matrix_into(element_index, output)
    }
}

impl<T, Assembler, F> ElementVectorAssembler<T> for MapElementDofs<Assembler, F>
where
    T: Scalar,
    Assembler: ElementVectorAssembler<T>,
    F: Fn(usize) -> usize,
{
    fn assemble_element_vector_into(&self, element_index: usize, output: DVectorViewMut<T>) -> eyre::Result<()> {
        self.mapped.assemble_element_vector_into(element_index, output)
    }
}
