//! Single-entry cache for the data of the current gridded slice.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use mdim_common::MdimResult;

use crate::types::CacheStats;

/// Holds whatever was loaded for the most recently read slice.
///
/// The lock only guards lookup and replacement. Loading a new slice happens
/// outside of it, so concurrent readers of different slices never block on
/// each other's parent reads; the last one to finish wins the slot.
#[derive(Debug)]
pub struct SliceCache<T> {
    current: Mutex<Option<(u64, Arc<T>)>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<T> Default for SliceCache<T> {
    fn default() -> Self {
        Self {
            current: Mutex::new(None),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

impl<T> SliceCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the data of `slice`, loading it on a miss.
    pub fn get_or_load<F>(&self, slice: u64, load: F) -> MdimResult<Arc<T>>
    where
        F: FnOnce() -> MdimResult<T>,
    {
        if let Some((idx, data)) = self.current.lock().as_ref() {
            if *idx == slice {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(data.clone());
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let data = Arc::new(load()?);
        *self.current.lock() = Some((slice, data.clone()));
        Ok(data)
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            current_slice: self.current.lock().as_ref().map(|(idx, _)| *idx),
        }
    }
}
