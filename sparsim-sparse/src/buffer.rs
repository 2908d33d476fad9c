use crate::error::{SparseError, SparseResult};
use std::ops::{Deref, DerefMut};

/// Backing storage of matrices and vectors.
///
/// An `Owned` buffer may be resized and is freed on drop. A `Borrowed` buffer is a view over
/// memory supplied by the caller: its contents may be modified, but it can never be resized,
/// replaced or freed.
#[derive(Debug)]
pub enum SystemBuffer<'a, T> {
    Owned(Vec<T>),
    Borrowed(&'a mut [T]),
}

impl<'a, T> SystemBuffer<'a, T> {
    pub fn is_owner(&self) -> bool {
        matches!(self, SystemBuffer::Owned(_))
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            SystemBuffer::Owned(data) => data,
            SystemBuffer::Borrowed(data) => data,
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match self {
            SystemBuffer::Owned(data) => data,
            SystemBuffer::Borrowed(data) => data,
        }
    }

    /// Replaces the contents of an owned buffer.
    pub fn replace(&mut self, data: Vec<T>, operation: &'static str) -> SparseResult<()> {
        match self {
            SystemBuffer::Owned(current) => {
                *current = data;
                Ok(())
            }
            SystemBuffer::Borrowed(_) => Err(SparseError::BorrowedBuffer { operation }),
        }
    }

    pub fn resize(&mut self, len: usize, value: T, operation: &'static str) -> SparseResult<()>
    where
        T: Clone,
    {
        match self {
            SystemBuffer::Owned(current) => {
                current.resize(len, value);
                Ok(())
            }
            SystemBuffer::Borrowed(_) => Err(SparseError::BorrowedBuffer { operation }),
        }
    }

    pub fn into_owned(self) -> Vec<T>
    where
        T: Clone,
    {
        match self {
            SystemBuffer::Owned(data) => data,
            SystemBuffer::Borrowed(data) => data.to_vec(),
        }
    }
}

impl<'a, T> Default for SystemBuffer<'a, T> {
    fn default() -> Self {
        SystemBuffer::Owned(Vec::new())
    }
}

/// Cloning always produces an owned copy, also of a borrowed buffer.
impl<'a, T: Clone> Clone for SystemBuffer<'a, T> {
    fn clone(&self) -> Self {
        SystemBuffer::Owned(self.as_slice().to_vec())
    }
}

impl<'a, T> From<Vec<T>> for SystemBuffer<'a, T> {
    fn from(data: Vec<T>) -> Self {
        SystemBuffer::Owned(data)
    }
}

impl<'a, T> From<&'a mut [T]> for SystemBuffer<'a, T> {
    fn from(data: &'a mut [T]) -> Self {
        SystemBuffer::Borrowed(data)
    }
}

impl<'a, T> Deref for SystemBuffer<'a, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<'a, T> DerefMut for SystemBuffer<'a, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<'a, T: PartialEq> PartialEq for SystemBuffer<'a, T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}
