//! Concurrent assembly of sparse linear systems.
//!
//! The workspace is split into
//!
//! - [`paradis`]: parallel primitives (index partitions, reductions, atomic accumulation, row
//!   locks),
//! - [`sparse`]: sparsity graphs, CSR matrices and system vectors,
//! - [`assembly`]: the element-level driver that builds and assembles global systems.
pub mod assembly;

pub mod paradis {
    pub use sparsim_paradis::*;
}

pub mod sparse {
    pub use sparsim_sparse::*;
}

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;
