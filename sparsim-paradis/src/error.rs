use std::any::Any;
use std::fmt;
use thiserror::Error;

/// The reason a single chunk of a parallel region stopped early.
#[derive(Debug)]
pub enum FailureKind {
    /// The body returned an error.
    Error(eyre::Report),
    /// The body panicked. Holds the panic payload if it was a string.
    Panic(String),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Error(report) => write!(f, "{report:#}"),
            FailureKind::Panic(message) => write!(f, "panicked: {message}"),
        }
    }
}

/// A failure captured inside one chunk of a parallel region.
#[derive(Debug)]
pub struct ChunkFailure {
    pub chunk: usize,
    /// The index whose body failed, if known.
    pub index: Option<usize>,
    pub kind: FailureKind,
}

impl ChunkFailure {
    pub(crate) fn from_panic(chunk: usize, index: Option<usize>, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "<non-string panic payload>".to_string()
        };
        Self {
            chunk,
            index,
            kind: FailureKind::Panic(message),
        }
    }
}

impl fmt::Display for ChunkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "chunk {} (index {}): {}", self.chunk, index, self.kind),
            None => write!(f, "chunk {}: {}", self.chunk, self.kind),
        }
    }
}

/// Aggregated failures of a parallel region.
///
/// Raised to the caller only after every chunk of the region has completed. Chunks are never
/// cancelled because another chunk failed, so the report contains every failure that occurred.
#[derive(Debug, Error)]
#[error("{} of {} parallel chunks failed: {}", .failures.len(), .num_chunks, summarize(.failures))]
pub struct ParallelError {
    pub num_chunks: usize,
    pub failures: Vec<ChunkFailure>,
}

impl ParallelError {
    pub fn failures(&self) -> &[ChunkFailure] {
        &self.failures
    }

    /// Whether any of the failures was a panic rather than a returned error.
    pub fn contains_panic(&self) -> bool {
        self.failures
            .iter()
            .any(|failure| matches!(failure.kind, FailureKind::Panic(_)))
    }
}

fn summarize(failures: &[ChunkFailure]) -> String {
    failures
        .iter()
        .map(ChunkFailure::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
