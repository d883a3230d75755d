//! Compatibility layer for rayon/sequential execution.
//!
//! With the `parallel` feature enabled this re-exports rayon's parallel
//! iterators. Without it, a sequential stand-in implements the same API
//! surface, so algorithm code is written once against `into_par_iter()`.
//!
//! Parallelism in this crate is restricted to work items with no
//! ancestor/descendant relationship in the flow forest (rows of a local
//! scan, ready batches during accumulation); the shim does not change
//! that contract, only whether the independent items run concurrently.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential stand-in for `rayon::prelude::IntoParallelIterator`.
    ///
    /// Calls `into_iter()` instead of `into_par_iter()`, so the rest of
    /// the iterator chain resolves to the standard `Iterator` methods.
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }

    /// Sequential stand-in for `rayon::prelude::IntoParallelRefIterator`,
    /// covering `.par_iter()` on collections iterated by reference.
    pub trait IntoParallelRefIterator<'data> {
        type Iter;
        type Item;
        fn par_iter(&'data self) -> Self::Iter;
    }

    impl<'data, I: 'data + ?Sized> IntoParallelRefIterator<'data> for I
    where
        &'data I: IntoIterator,
    {
        type Iter = <&'data I as IntoIterator>::IntoIter;
        type Item = <&'data I as IntoIterator>::Item;
        fn par_iter(&'data self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
