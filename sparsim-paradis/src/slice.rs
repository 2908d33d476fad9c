use std::marker::PhantomData;
use std::ops::Range;

/// Shared handle to an exclusively borrowed slice, from which threads may obtain
/// *disjoint* mutable sub-ranges.
///
/// This is what lets several workers fill different rows of one CSR buffer at the same time.
/// The access itself is safe to create, but every sub-range must be requested through an
/// `unsafe` call whose caller guarantees disjointness.
#[derive(Copy)]
pub struct DisjointSliceAccess<'a, T> {
    ptr: *mut T,
    len: usize,
    marker: PhantomData<&'a mut [T]>,
}

impl<'a, T> Clone for DisjointSliceAccess<'a, T> {
    fn clone(&self) -> Self {
        Self {
            ptr: self.ptr,
            len: self.len,
            marker: PhantomData,
        }
    }
}

unsafe impl<'a, T: Send> Sync for DisjointSliceAccess<'a, T> {}
unsafe impl<'a, T: Send> Send for DisjointSliceAccess<'a, T> {}

impl<'a, T> DisjointSliceAccess<'a, T> {
    pub fn new(data: &'a mut [T]) -> Self {
        Self {
            ptr: data.as_mut_ptr(),
            len: data.len(),
            marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the mutable sub-slice covering `range`.
    ///
    /// # Panics
    ///
    /// Panics if `range` is decreasing or extends past the end of the slice.
    ///
    /// # Safety
    ///
    /// The caller must ensure that no two sub-slices that are alive at the same time overlap,
    /// whether they are held by the same thread or by different threads.
    pub unsafe fn range_mut(&self, range: Range<usize>) -> &'a mut [T] {
        assert!(
            range.start <= range.end && range.end <= self.len,
            "Range {range:?} out of bounds for slice of length {}",
            self.len
        );
        std::slice::from_raw_parts_mut(self.ptr.add(range.start), range.end - range.start)
    }

    /// # Safety
    ///
    /// Same as for [`range_mut`](Self::range_mut).
    pub unsafe fn get_mut(&self, index: usize) -> &'a mut T {
        assert!(index < self.len, "Index {index} out of bounds for slice of length {}", self.len);
        &mut *self.ptr.add(index)
    }
}
