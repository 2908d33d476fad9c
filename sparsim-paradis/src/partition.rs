use crate::error::{ChunkFailure, FailureKind, ParallelError};
use crate::reduction::Reduction;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Controls how index ranges are split across workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Number of workers, or `None` for the platform concurrency reported by rayon
    /// (which honours `RAYON_NUM_THREADS`).
    pub num_threads: Option<usize>,
    /// Chunks are never made smaller than this, unless the whole range is smaller.
    pub min_chunk_size: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            min_chunk_size: 1,
        }
    }
}

impl ParallelConfig {
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        assert!(num_threads > 0, "Number of threads must be positive.");
        self.num_threads = Some(num_threads);
        self
    }

    pub fn with_min_chunk_size(mut self, min_chunk_size: usize) -> Self {
        self.min_chunk_size = min_chunk_size;
        self
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
            .unwrap_or_else(rayon::current_num_threads)
            .max(1)
    }

    /// Builds a dedicated pool with exactly [`num_threads`](Self::num_threads) workers.
    ///
    /// Partitions always run on the pool that is current when they are invoked, so use
    /// [`ThreadPool::install`](rayon::ThreadPool::install) to run them on the returned pool.
    pub fn build_pool(&self) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads())
            .build()
    }
}

/// A split of `[0, len)` into contiguous chunks that are processed concurrently.
///
/// Every index is visited exactly once. Within a chunk, indices are visited in ascending
/// order. There is no ordering between chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPartition {
    // Chunk c covers bounds[c] .. bounds[c + 1]
    bounds: Vec<usize>,
}

impl IndexPartition {
    /// Partitions `[0, len)` into at most one chunk per worker of the current pool.
    pub fn new(len: usize) -> Self {
        Self::with_config(len, &ParallelConfig::default())
    }

    pub fn with_config(len: usize, config: &ParallelConfig) -> Self {
        let min_chunk_size = config.min_chunk_size.max(1);
        let chunks_by_size = (len + min_chunk_size - 1) / min_chunk_size;
        Self::with_num_chunks(len, config.num_threads().min(chunks_by_size))
    }

    /// Partitions `[0, len)` into `num_chunks` chunks of near-equal size.
    ///
    /// The number of chunks is clamped to `[1, len]`, and is zero if `len == 0`.
    pub fn with_num_chunks(len: usize, num_chunks: usize) -> Self {
        if len == 0 {
            return Self { bounds: vec![0] };
        }

        let n = num_chunks.clamp(1, len);
        let base = len / n;
        let remainder = len % n;
        let bounds = (0..=n)
            .map(|c| c * base + c.min(remainder))
            .collect();
        Self { bounds }
    }

    pub fn len(&self) -> usize {
        *self.bounds.last().unwrap_or(&0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_chunks(&self) -> usize {
        self.bounds.len() - 1
    }

    pub fn chunk_range(&self, chunk: usize) -> Range<usize> {
        self.bounds[chunk]..self.bounds[chunk + 1]
    }

    pub fn chunks<'a>(&'a self) -> impl 'a + Iterator<Item = Range<usize>> {
        (0..self.num_chunks()).map(move |c| self.chunk_range(c))
    }

    /// Runs the body for every index.
    ///
    /// # Panics
    ///
    /// If the body panics in any chunk, panics once every chunk has finished, with a message
    /// listing the panics of all chunks.
    pub fn for_each<F>(&self, f: F)
    where
        F: Fn(usize) + Sync,
    {
        let result = self.try_for_each(|index| {
            f(index);
            Ok(())
        });
        raise_panics(result)
    }

    /// Runs a fallible body for every index.
    ///
    /// A chunk stops at the first error or panic of its body, while the other chunks run to
    /// completion. All captured failures are returned together once every chunk has finished.
    pub fn try_for_each<F>(&self, f: F) -> Result<(), ParallelError>
    where
        F: Fn(usize) -> eyre::Result<()> + Sync,
    {
        let failures = (0..self.num_chunks())
            .into_par_iter()
            .filter_map(|chunk| self.run_chunk(chunk, &f))
            .collect();
        self.finish(failures)
    }

    /// Like [`for_each`](Self::for_each), but every chunk receives its own clone of
    /// `prototype`, which is passed mutably to every call in that chunk.
    ///
    /// This is intended for scratch buffers that should not be reallocated per index.
    pub fn for_each_with_tls<L, F>(&self, prototype: &L, f: F)
    where
        L: Clone + Sync,
        F: Fn(usize, &mut L) + Sync,
    {
        let result = self.try_for_each_with_tls(prototype, |index, local| {
            f(index, local);
            Ok(())
        });
        raise_panics(result)
    }

    pub fn try_for_each_with_tls<L, F>(&self, prototype: &L, f: F) -> Result<(), ParallelError>
    where
        L: Clone + Sync,
        F: Fn(usize, &mut L) -> eyre::Result<()> + Sync,
    {
        let failures = (0..self.num_chunks())
            .into_par_iter()
            .filter_map(|chunk| {
                let mut local = prototype.clone();
                self.run_chunk(chunk, |index| f(index, &mut local))
            })
            .collect();
        self.finish(failures)
    }

    /// Reduces the values produced for every index with the reduction `R`.
    ///
    /// Panics of the body are collected like in [`for_each`](Self::for_each).
    pub fn reduce<R, F>(&self, f: F) -> R::Value
    where
        R: Reduction,
        F: Fn(usize) -> R::Value + Sync,
    {
        raise_panics(self.try_reduce::<R, _>(|index| Ok(f(index))))
    }

    pub fn try_reduce<R, F>(&self, f: F) -> Result<R::Value, ParallelError>
    where
        R: Reduction,
        F: Fn(usize) -> eyre::Result<R::Value> + Sync,
    {
        let chunk_results: Vec<Result<R::Value, ChunkFailure>> = (0..self.num_chunks())
            .into_par_iter()
            .map(|chunk| {
                let mut acc = Some(R::identity());
                let failure = self.run_chunk(chunk, |index| {
                    let value = f(index)?;
                    let current = acc.take().unwrap_or_else(R::identity);
                    acc = Some(R::combine(current, value));
                    Ok(())
                });
                match failure {
                    Some(failure) => Err(failure),
                    None => Ok(acc.unwrap_or_else(R::identity)),
                }
            })
            .collect();

        let mut result = R::identity();
        let mut failures = Vec::new();
        for chunk_result in chunk_results {
            match chunk_result {
                Ok(value) => result = R::combine(result, value),
                Err(failure) => failures.push(failure),
            }
        }
        self.finish(failures).map(|_| result)
    }

    fn run_chunk<F>(&self, chunk: usize, mut body: F) -> Option<ChunkFailure>
    where
        F: FnMut(usize) -> eyre::Result<()>,
    {
        let mut current = None;
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            for index in self.chunk_range(chunk) {
                current = Some(index);
                if let Err(report) = body(index) {
                    return Some(ChunkFailure {
                        chunk,
                        index: Some(index),
                        kind: FailureKind::Error(report),
                    });
                }
            }
            None
        }));

        match outcome {
            Ok(failure) => failure,
            Err(payload) => Some(ChunkFailure::from_panic(chunk, current, payload)),
        }
    }

    fn finish(&self, failures: Vec<ChunkFailure>) -> Result<(), ParallelError> {
        if failures.is_empty() {
            Ok(())
        } else {
            log::warn!(
                "{} of {} parallel chunks failed",
                failures.len(),
                self.num_chunks()
            );
            Err(ParallelError {
                num_chunks: self.num_chunks(),
                failures,
            })
        }
    }
}

/// Resumes unwinding on the calling thread with every captured panic in the message.
fn raise_panics<T>(result: Result<T, ParallelError>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => panic!("{error}"),
    }
}
