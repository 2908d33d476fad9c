use crate::buffer::SystemBuffer;
use crate::error::{SparseError, SparseResult};
use crate::graph::SparsityGraph;
use crate::SystemScalar;
use rayon::prelude::*;
use sparsim_paradis::{AtomicSlice, IndexPartition, SumReduction};
use std::ops::{AddAssign, Index, IndexMut, MulAssign, SubAssign};

/// A dense vector used as right-hand side or solution of a sparse system.
///
/// Like [`CsrMatrix`](crate::CsrMatrix), the vector either owns its storage or is a view over a
/// caller supplied buffer. Views can be modified in place but not resized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemVector<'a, T> {
    data: SystemBuffer<'a, T>,
}

impl<'a, T> SystemVector<'a, T> {
    pub fn from_vec(data: Vec<T>) -> Self {
        Self { data: data.into() }
    }

    pub fn from_borrowed(data: &'a mut [T]) -> Self {
        Self { data: data.into() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_owner(&self) -> bool {
        self.data.is_owner()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T>
    where
        T: Clone,
    {
        self.data.into_owned()
    }

    pub fn begin_assemble(&mut self) {}

    pub fn finalize_assemble(&mut self) {}
}

impl<'a, T: SystemScalar> SystemVector<'a, T> {
    /// A zero vector of length `len`.
    pub fn new(len: usize) -> Self {
        Self::from_vec(vec![T::zero(); len])
    }

    /// A zero vector with one entry per row of the graph.
    pub fn from_graph(graph: &impl SparsityGraph) -> Self {
        Self::new(graph.size())
    }

    pub fn from_slice(data: &[T]) -> Self {
        Self::from_vec(data.to_vec())
    }

    pub fn set_value(&mut self, value: T) {
        self.data.par_iter_mut().for_each(|v| *v = value);
    }

    pub fn set_zero(&mut self) {
        self.set_value(T::zero());
    }

    /// Removes all entries. Fails for borrowed vectors.
    pub fn clear(&mut self) -> SparseResult<()> {
        self.data.replace(Vec::new(), "clear")
    }

    /// Changes the length, filling new entries with zero. Fails for borrowed vectors.
    pub fn resize(&mut self, len: usize) -> SparseResult<()> {
        self.data.resize(len, T::zero(), "resize")
    }

    pub fn copy_from(&mut self, other: &SystemVector<'_, T>) -> SparseResult<()> {
        SparseError::check_dimension("copy_from", self.len(), other.len())?;
        self.data.copy_from_slice(other.as_slice());
        Ok(())
    }

    pub fn scale(&mut self, factor: T) {
        self.data.par_iter_mut().for_each(|v| *v *= factor);
    }

    /// Computes `self += factor * other`.
    pub fn add(&mut self, factor: T, other: &SystemVector<'_, T>) -> SparseResult<()> {
        SparseError::check_dimension("add", self.len(), other.len())?;
        self.data
            .par_iter_mut()
            .zip(other.as_slice().par_iter())
            .for_each(|(v, w)| *v += factor * *w);
        Ok(())
    }

    pub fn dot(&self, other: &SystemVector<'_, T>) -> SparseResult<T> {
        SparseError::check_dimension("dot", self.len(), other.len())?;
        let (a, b) = (self.as_slice(), other.as_slice());
        Ok(IndexPartition::new(a.len()).reduce::<SumReduction<T>, _>(|i| a[i] * b[i]))
    }

    /// Euclidean norm.
    pub fn norm(&self) -> T {
        let data = self.as_slice();
        IndexPartition::new(data.len())
            .reduce::<SumReduction<T>, _>(|i| data[i] * data[i])
            .sqrt()
    }

    /// A view that lets many threads assemble into this vector at the same time.
    pub fn par_assembler(&mut self) -> VectorParallelAssembler<'_, T> {
        VectorParallelAssembler {
            values: AtomicSlice::new(self.as_mut_slice()),
        }
    }

    /// Adds `local[k]` to entry `equation_ids[k]` for every `k`.
    pub fn assemble(&mut self, local: &[T], equation_ids: &[usize]) -> SparseResult<()> {
        self.par_assembler().assemble(local, equation_ids)
    }

    pub fn assemble_entry(&mut self, value: T, index: usize) -> SparseResult<()> {
        self.par_assembler().assemble_entry(value, index)
    }
}

/// Shared handle for concurrent assembly into a [`SystemVector`].
///
/// Every addition is atomic, so any number of threads may assemble through the same handle,
/// including into the same entries.
#[derive(Debug)]
pub struct VectorParallelAssembler<'v, T: SystemScalar> {
    values: AtomicSlice<'v, T>,
}

impl<'v, T: SystemScalar> VectorParallelAssembler<'v, T> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Adds `local[k]` to entry `equation_ids[k]` for every `k`.
    ///
    /// Nothing is added if the lengths differ or any id is out of bounds.
    pub fn assemble(&self, local: &[T], equation_ids: &[usize]) -> SparseResult<()> {
        SparseError::check_dimension("vector assemble", equation_ids.len(), local.len())?;
        if let Some(&index) = equation_ids.iter().find(|&&id| id >= self.len()) {
            return Err(SparseError::IndexOutOfBounds {
                operation: "vector assemble",
                index,
                bound: self.len(),
            });
        }
        self.values.add_indexed(equation_ids, local);
        Ok(())
    }

    pub fn assemble_entry(&self, value: T, index: usize) -> SparseResult<()> {
        if index >= self.len() {
            return Err(SparseError::IndexOutOfBounds {
                operation: "vector assemble_entry",
                index,
                bound: self.len(),
            });
        }
        self.values.add(index, value);
        Ok(())
    }
}

impl<'a, T> From<Vec<T>> for SystemVector<'a, T> {
    fn from(data: Vec<T>) -> Self {
        Self::from_vec(data)
    }
}

impl<'a, T> Index<usize> for SystemVector<'a, T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<'a, T> IndexMut<usize> for SystemVector<'a, T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}

impl<'a, 'b, T: SystemScalar> AddAssign<&SystemVector<'b, T>> for SystemVector<'a, T> {
    fn add_assign(&mut self, rhs: &SystemVector<'b, T>) {
        assert_eq!(self.len(), rhs.len(), "Vectors must have the same length.");
        self.data
            .par_iter_mut()
            .zip(rhs.as_slice().par_iter())
            .for_each(|(v, w)| *v += *w);
    }
}

impl<'a, 'b, T: SystemScalar> SubAssign<&SystemVector<'b, T>> for SystemVector<'a, T> {
    fn sub_assign(&mut self, rhs: &SystemVector<'b, T>) {
        assert_eq!(self.len(), rhs.len(), "Vectors must have the same length.");
        self.data
            .par_iter_mut()
            .zip(rhs.as_slice().par_iter())
            .for_each(|(v, w)| *v -= *w);
    }
}

impl<'a, T: SystemScalar> MulAssign<T> for SystemVector<'a, T> {
    fn mul_assign(&mut self, factor: T) {
        self.scale(factor);
    }
}
