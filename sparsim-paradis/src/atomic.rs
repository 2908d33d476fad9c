//! Lock-free accumulation into shared numeric locations.
//!
//! Scatter-style assembly lets many threads add into the same matrix or vector entry. The
//! [`AtomicAccumulate`] trait associates each supported scalar with an atomic cell of identical
//! layout, and [`AtomicSlice`] reinterprets an exclusively borrowed buffer as such cells for the
//! duration of the borrow.
use std::marker::PhantomData;
use std::mem::{align_of, size_of};
use std::sync::atomic::{
    AtomicI32, AtomicI64, AtomicIsize, AtomicU32, AtomicU64, AtomicUsize, Ordering,
};

/// A scalar that can be accumulated atomically.
///
/// # Safety
///
/// `Self::Atomic` must have the same size and alignment as `Self`, and its bit pattern must
/// be that of a valid `Self`. [`AtomicSlice`] relies on this to view `&mut [Self]` as
/// `&[Self::Atomic]`.
pub unsafe trait AtomicAccumulate: Copy + Send + Sync + 'static {
    type Atomic: Send + Sync;

    fn new_atomic(value: Self) -> Self::Atomic;

    /// Adds `value` to `target` and returns the previous value.
    fn fetch_add(target: &Self::Atomic, value: Self) -> Self;

    fn load(target: &Self::Atomic) -> Self;

    fn store(target: &Self::Atomic, value: Self);
}

/// Adds `value` into `target` without losing concurrent updates.
#[inline]
pub fn atomic_add<T: AtomicAccumulate>(target: &T::Atomic, value: T) {
    T::fetch_add(target, value);
}

macro_rules! impl_atomic_accumulate_float {
    ($float:ty, $atomic:ty) => {
        unsafe impl AtomicAccumulate for $float {
            type Atomic = $atomic;

            #[inline]
            fn new_atomic(value: Self) -> Self::Atomic {
                <$atomic>::new(value.to_bits())
            }

            #[inline]
            fn fetch_add(target: &Self::Atomic, value: Self) -> Self {
                let mut current = target.load(Ordering::Relaxed);
                loop {
                    let new = (<$float>::from_bits(current) + value).to_bits();
                    match target.compare_exchange_weak(current, new, Ordering::AcqRel, Ordering::Relaxed) {
                        Ok(previous) => return <$float>::from_bits(previous),
                        Err(actual) => current = actual,
                    }
                }
            }

            #[inline]
            fn load(target: &Self::Atomic) -> Self {
                <$float>::from_bits(target.load(Ordering::Acquire))
            }

            #[inline]
            fn store(target: &Self::Atomic, value: Self) {
                target.store(value.to_bits(), Ordering::Release)
            }
        }
    };
}

macro_rules! impl_atomic_accumulate_int {
    ($int:ty, $atomic:ty) => {
        unsafe impl AtomicAccumulate for $int {
            type Atomic = $atomic;

            #[inline]
            fn new_atomic(value: Self) -> Self::Atomic {
                <$atomic>::new(value)
            }

            #[inline]
            fn fetch_add(target: &Self::Atomic, value: Self) -> Self {
                target.fetch_add(value, Ordering::AcqRel)
            }

            #[inline]
            fn load(target: &Self::Atomic) -> Self {
                target.load(Ordering::Acquire)
            }

            #[inline]
            fn store(target: &Self::Atomic, value: Self) {
                target.store(value, Ordering::Release)
            }
        }
    };
}

impl_atomic_accumulate_float!(f32, AtomicU32);
impl_atomic_accumulate_float!(f64, AtomicU64);
impl_atomic_accumulate_int!(i32, AtomicI32);
impl_atomic_accumulate_int!(i64, AtomicI64);
impl_atomic_accumulate_int!(isize, AtomicIsize);
impl_atomic_accumulate_int!(u32, AtomicU32);
impl_atomic_accumulate_int!(u64, AtomicU64);
impl_atomic_accumulate_int!(usize, AtomicUsize);

/// A view of an exclusively borrowed buffer that permits concurrent accumulation.
///
/// The view is `Sync`, so a single `&AtomicSlice` can be shared by every worker of an assembly
/// pass. While the view exists, the underlying buffer cannot be read or written through any
/// other path.
pub struct AtomicSlice<'a, T: AtomicAccumulate> {
    cells: &'a [T::Atomic],
    marker: PhantomData<&'a mut [T]>,
}

impl<'a, T: AtomicAccumulate> AtomicSlice<'a, T> {
    pub fn new(data: &'a mut [T]) -> Self {
        assert_eq!(size_of::<T>(), size_of::<T::Atomic>());
        assert!(align_of::<T::Atomic>() <= align_of::<T>());
        let len = data.len();
        let ptr = data.as_mut_ptr() as *const T::Atomic;
        // The layouts agree (checked above and guaranteed by the trait contract), and the
        // exclusive borrow of `data` is held for 'a, so no non-atomic access can overlap.
        let cells = unsafe { std::slice::from_raw_parts(ptr, len) };
        Self {
            cells,
            marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &'a [T::Atomic] {
        self.cells
    }

    /// Atomically adds `value` to the entry at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn add(&self, index: usize, value: T) {
        atomic_add(&self.cells[index], value);
    }

    /// Atomically adds `values` elementwise to the entries starting at `offset`.
    ///
    /// Each element is added atomically, the slice as a whole is not.
    pub fn add_slice(&self, offset: usize, values: &[T]) {
        let targets = &self.cells[offset..offset + values.len()];
        for (target, value) in targets.iter().zip(values) {
            atomic_add(target, *value);
        }
    }

    /// Atomically adds `values[k]` to the entry at `indices[k]` for every `k`.
    pub fn add_indexed(&self, indices: &[usize], values: &[T]) {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have the same length."
        );
        for (&index, value) in indices.iter().zip(values) {
            atomic_add(&self.cells[index], *value);
        }
    }

    pub fn load(&self, index: usize) -> T {
        T::load(&self.cells[index])
    }

    pub fn store(&self, index: usize, value: T) {
        T::store(&self.cells[index], value)
    }
}

impl<'a, T: AtomicAccumulate> std::fmt::Debug for AtomicSlice<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomicSlice").field("len", &self.len()).finish()
    }
}
