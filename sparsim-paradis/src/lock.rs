use parking_lot::{Mutex, MutexGuard};

/// One mutex per row, each guarding the data of that row.
///
/// Concurrent access to disjoint rows proceeds without any synchronization between the rows,
/// while concurrent access to the same row is serialized. A row is unlocked when its guard
/// is dropped.
#[derive(Debug, Default)]
pub struct RowLockTable<T> {
    rows: Vec<Mutex<T>>,
}

impl<T> RowLockTable<T> {
    pub fn new(num_rows: usize) -> Self
    where
        T: Default,
    {
        Self::from_fn(num_rows, |_| T::default())
    }

    pub fn from_fn(num_rows: usize, f: impl FnMut(usize) -> T) -> Self {
        Self {
            rows: (0..num_rows).map(f).map(Mutex::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Blocks until the given row is locked.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn lock(&self, row: usize) -> MutexGuard<'_, T> {
        self.rows[row].lock()
    }

    /// Returns `None` if the row is currently locked by someone else.
    pub fn try_lock(&self, row: usize) -> Option<MutexGuard<'_, T>> {
        self.rows[row].try_lock()
    }

    pub fn with_locked<R>(&self, row: usize, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.lock(row);
        f(&mut guard)
    }

    /// Exclusive access without locking.
    pub fn get_mut(&mut self, row: usize) -> &mut T {
        self.rows[row].get_mut()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.rows.iter_mut().map(Mutex::get_mut)
    }

    pub fn into_inner(self) -> Vec<T> {
        self.rows.into_iter().map(Mutex::into_inner).collect()
    }
}
