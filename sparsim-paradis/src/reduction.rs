//! Associative reductions for [`IndexPartition::reduce`](crate::IndexPartition::reduce).
//!
//! A reduction is described by an identity value and an associative, commutative `combine`.
//! Chunk-local results are folded from the identity and then combined across chunks in an
//! unspecified order, so only reductions whose result is independent of that order belong here.
use num::{Bounded, Signed, Zero};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::ops::Add;

pub trait Reduction {
    type Value: Send;

    fn identity() -> Self::Value;

    fn combine(a: Self::Value, b: Self::Value) -> Self::Value;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SumReduction<T>(PhantomData<T>);

impl<T> Reduction for SumReduction<T>
where
    T: Zero + Add<Output = T> + Send,
{
    type Value = T;

    fn identity() -> T {
        T::zero()
    }

    fn combine(a: T, b: T) -> T {
        a + b
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MinReduction<T>(PhantomData<T>);

impl<T> Reduction for MinReduction<T>
where
    T: Bounded + PartialOrd + Send,
{
    type Value = T;

    fn identity() -> T {
        T::max_value()
    }

    fn combine(a: T, b: T) -> T {
        if b < a {
            b
        } else {
            a
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MaxReduction<T>(PhantomData<T>);

impl<T> Reduction for MaxReduction<T>
where
    T: Bounded + PartialOrd + Send,
{
    type Value = T;

    fn identity() -> T {
        T::min_value()
    }

    fn combine(a: T, b: T) -> T {
        if b > a {
            b
        } else {
            a
        }
    }
}

/// Keeps the value of smallest magnitude. The sign of the kept value is preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsMinReduction<T>(PhantomData<T>);

impl<T> Reduction for AbsMinReduction<T>
where
    T: Bounded + Signed + PartialOrd + Send,
{
    type Value = T;

    fn identity() -> T {
        T::max_value()
    }

    fn combine(a: T, b: T) -> T {
        if b.abs() < a.abs() {
            b
        } else {
            a
        }
    }
}

/// Keeps the value of largest magnitude. The sign of the kept value is preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsMaxReduction<T>(PhantomData<T>);

impl<T> Reduction for AbsMaxReduction<T>
where
    T: Zero + Signed + PartialOrd + Send,
{
    type Value = T;

    fn identity() -> T {
        T::zero()
    }

    fn combine(a: T, b: T) -> T {
        if b.abs() > a.abs() {
            b
        } else {
            a
        }
    }
}

/// Collects all values into a single `Vec`.
///
/// The relative order of values coming from different chunks is unspecified.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccumReduction<T>(PhantomData<T>);

impl<T: Send> Reduction for AccumReduction<T> {
    type Value = Vec<T>;

    fn identity() -> Vec<T> {
        Vec::new()
    }

    fn combine(mut a: Vec<T>, mut b: Vec<T>) -> Vec<T> {
        if a.len() < b.len() {
            std::mem::swap(&mut a, &mut b);
        }
        a.append(&mut b);
        a
    }
}

/// Merges maps. Keys are expected to be produced by exactly one index; for a key produced
/// more than once it is unspecified which value survives.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapReduction<K, V>(PhantomData<(K, V)>);

impl<K, V> Reduction for MapReduction<K, V>
where
    K: Ord + Send,
    V: Send,
{
    type Value = BTreeMap<K, V>;

    fn identity() -> Self::Value {
        BTreeMap::new()
    }

    fn combine(mut a: Self::Value, mut b: Self::Value) -> Self::Value {
        if a.len() < b.len() {
            std::mem::swap(&mut a, &mut b);
        }
        a.append(&mut b);
        a
    }
}

impl<R1, R2> Reduction for (R1, R2)
where
    R1: Reduction,
    R2: Reduction,
{
    type Value = (R1::Value, R2::Value);

    fn identity() -> Self::Value {
        (R1::identity(), R2::identity())
    }

    fn combine(a: Self::Value, b: Self::Value) -> Self::Value {
        (R1::combine(a.0, b.0), R2::combine(a.1, b.1))
    }
}
