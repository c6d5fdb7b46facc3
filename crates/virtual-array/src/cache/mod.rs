//! Cache implementations for derived arrays.

mod slice_cache;

pub use slice_cache::SliceCache;
