//! Derived multidimensional arrays computed on demand from parent arrays.
//!
//! Three views share the windowed read contract of [`mdim_common::MdArray`]
//! and never materialize the whole derived array:
//!
//! - **Orthorectified**: remaps output cells through a pair of integer
//!   geolocation lookup arrays (GLT) into the parent.
//! - **Gridded**: interpolates a regular raster from scattered points.
//! - **Subset**: restricts one dimension of a whole namespace to the indices
//!   where a selector array equals a value.
//!
//! # Architecture
//!
//! ```text
//! Caller
//!   │
//!   ▼
//! ViewFactory / free functions
//!   │
//!   ├─► OrthorectifiedArray ── index_x, index_y ──► parent (one bulk read)
//!   │
//!   ├─► GriddedArray ── PointIndex (R-tree) + SliceCache ──► parent slice
//!   │         │
//!   │         └─► GridAlgorithm (invdist, average, nearest, linear, metrics ...)
//!   │
//!   └─► SubsetGroup ── SelectionContext ──► SubsetArray ──► parent
//! ```
//!
//! Holes (unmapped cells, nodes without nearby points) are filled with
//! NoData and are not errors.
//!
//! # Example
//!
//! ```ignore
//! use virtual_array::{get_gridded, GriddedOptions};
//!
//! let gridded = get_gridded(values, "average:radius1=1:radius2=1", x, y,
//!     &GriddedOptions::default().with_resolution(0.5))?;
//! let slice = gridded.read_f64(&Window::contiguous(vec![0, 0, 0], vec![1, 3, 5]))?;
//! ```

pub mod cache;
pub mod config;
pub mod factory;
pub mod gridded;
pub mod orthorectified;
pub mod subset;
pub mod types;

// Re-export commonly used types at crate root
pub use cache::SliceCache;
pub use config::VirtualArrayConfig;
pub use factory::{
    create_orthorectified, get_gridded, get_gridded_with_config, subset_dimension_from_selection,
    subset_dimension_from_selection_with_config, ViewFactory,
};
pub use gridded::{
    AlgorithmKind, GridAlgorithm, GriddedArray, GriddedOptions, PointIndex, TriangleMesh,
};
pub use orthorectified::OrthorectifiedArray;
pub use subset::{SelectionContext, SubsetArray, SubsetGroup};
pub use types::{CacheStats, GeoTransform, GridGeometry};
