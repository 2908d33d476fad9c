//! Sparse linear systems with concurrent assembly.
//!
//! The typical workflow is:
//!
//! 1. Record the sparsity structure of the system in a [`SparseGraph`] (sequential, arbitrary row
//!    indices) or a [`SparseContiguousRowGraph`] (fixed number of rows, concurrent insertion).
//! 2. Create a [`CsrMatrix`] and [`SystemVector`]s from the graph.
//! 3. Assemble local contributions concurrently through [`CsrMatrix::par_assembler`] and
//!    [`SystemVector::par_assembler`].
//! 4. Apply boundary conditions and compute matrix-vector products.
use nalgebra::RealField;
use num::Bounded;
use sparsim_paradis::AtomicAccumulate;

pub mod buffer;
pub mod contiguous_graph;
pub mod csr;
pub mod csr_export;
pub mod error;
pub mod graph;
pub mod vector;

mod csr_assembly;
mod dirichlet;
mod spmv;

pub use buffer::SystemBuffer;
pub use contiguous_graph::SparseContiguousRowGraph;
pub use csr::CsrMatrix;
pub use csr_assembly::CsrParallelAssembler;
pub use csr_export::{check_csr_structure, export_csr_arrays, offsets_from_row_sizes, CsrArrays};
pub use error::{SparseError, SparseResult};
pub use graph::{SparseGraph, SparsityGraph};
pub use vector::{SystemVector, VectorParallelAssembler};

/// Scalar type of matrices and vectors.
///
/// Used as a trait alias for the traits needed by numerical routines and concurrent assembly.
pub trait SystemScalar: RealField + Copy + Bounded + AtomicAccumulate {}

impl<T> SystemScalar for T where T: RealField + Copy + Bounded + AtomicAccumulate {}
