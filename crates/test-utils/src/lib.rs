//! Shared test utilities for the multidimensional view crates.
//!
//! This crate provides common testing infrastructure including:
//! - Fixtures building the namespaces used across tests
//! - Generators for predictable rasters and point grids
//! - Synthetic arrays (lazy, failing, read-counting)
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, CountingArray};
//! ```

pub mod arrays;
pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use arrays::*;
pub use fixtures::*;
pub use generators::*;

/// Element-wise approximate equality of two value slices.
///
/// NaN on both sides counts as equal.
///
/// ```ignore
/// assert_values_approx_eq!(&[1.0, f64::NAN], &[1.0000001, f64::NAN], 1e-6);
/// ```
#[macro_export]
macro_rules! assert_values_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: &[f64] = $left;
        let right: &[f64] = $right;
        assert_eq!(
            left.len(),
            right.len(),
            "length mismatch: {:?} vs {:?}",
            left,
            right
        );
        for (i, (l, r)) in left.iter().zip(right).enumerate() {
            if l.is_nan() && r.is_nan() {
                continue;
            }
            if (l - r).abs() > $epsilon {
                panic!(
                    "assertion failed at index {}: `{:?}` != `{:?}`\n  left: {:?}\n right: {:?}",
                    i, l, r, left, right
                );
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_values_approx_eq_nan() {
        assert_values_approx_eq!(&[1.0, f64::NAN], &[1.0000001, f64::NAN], 1e-6);
    }

    #[test]
    #[should_panic(expected = "index 1")]
    fn test_assert_values_approx_eq_fails() {
        assert_values_approx_eq!(&[1.0, 2.0], &[1.0, 3.0], 1e-6);
    }
}
