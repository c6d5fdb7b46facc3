//! Array, dimension and group model shared by real and derived arrays.
//!
//! Every array exposes the same windowed read: per-axis start, count and step,
//! written into a caller buffer with its own element type and strides.
//!
//! ```text
//! Group ─┬─ Dimension (name, size, indexing variable)
//!        ├─ MdArray   (dimensions, data type, NoData, read(window, dest))
//!        └─ Group ...
//! ```
//!
//! The in-memory driver (`MemGroup`, `MemArray`) backs tests and the command
//! line tools; file-format drivers implement the same traits elsewhere.

pub mod array;
pub mod bbox;
pub mod buffer;
pub mod coordinates;
pub mod dataset;
pub mod datatype;
pub mod dimension;
pub mod error;
pub mod group;
pub mod mem;
pub mod window;

pub use array::MdArray;
pub use bbox::BoundingBox;
pub use buffer::{alloc_bytes, alloc_values, decode_all, DestBuffer};
pub use coordinates::{regular_dimension, RegularlySpacedArray};
pub use dataset::{ArraySpec, DimensionSpec, GroupSpec};
pub use datatype::DataType;
pub use dimension::{Dimension, DimensionKind};
pub use error::{MdimError, MdimResult};
pub use group::{join_path, Group};
pub use mem::{MemArray, MemGroup};
pub use window::{for_each_index, packed_strides, Window};
