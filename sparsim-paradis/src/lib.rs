//! paradis
//! =======
//!
//! Parallel processing of index ranges and disjoint data for sparse assembly.
//!
//! The building blocks are:
//!
//! - [`IndexPartition`], which splits `[0, n)` into contiguous chunks that run concurrently on
//!   the rayon worker pool, with reduction and thread-local-storage variants.
//! - [`AtomicAccumulate`] and [`AtomicSlice`], which allow many threads to add into the same
//!   numeric locations without losing updates.
//! - [`RowLockTable`], one mutex per row, for fine-grained protected insertion.
//! - [`DisjointSliceAccess`], which hands out disjoint sub-ranges of a single buffer to
//!   different threads.

pub mod atomic;
pub mod error;
pub mod lock;
pub mod partition;
pub mod reduction;
pub mod slice;

pub use atomic::{atomic_add, AtomicAccumulate, AtomicSlice};
pub use error::{ChunkFailure, FailureKind, ParallelError};
pub use lock::RowLockTable;
pub use partition::{IndexPartition, ParallelConfig};
pub use reduction::{
    AbsMaxReduction, AbsMinReduction, AccumReduction, MapReduction, MaxReduction, MinReduction,
    Reduction, SumReduction,
};
pub use slice::DisjointSliceAccess;
