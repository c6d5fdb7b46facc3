//! Named array axes.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::array::MdArray;

/// Semantic role of a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKind {
    HorizontalX,
    HorizontalY,
    Vertical,
    Temporal,
    #[default]
    Other,
}

/// An axis shared between arrays, identified by its full name.
///
/// Dimensions never change after construction. Views that need a different
/// size or indexing variable build a new `Dimension` from an existing one, so
/// an indexing variable never points back at the dimension that references it.
#[derive(Clone)]
pub struct Dimension {
    name: String,
    full_name: String,
    kind: DimensionKind,
    direction: Option<String>,
    size: u64,
    indexing_variable: Option<Arc<dyn MdArray>>,
}

impl Dimension {
    /// Create a dimension from its full name (e.g. `/band`).
    pub fn new(full_name: impl Into<String>, kind: DimensionKind, size: u64) -> Self {
        let full_name = full_name.into();
        let name = full_name
            .rsplit('/')
            .next()
            .unwrap_or(full_name.as_str())
            .to_string();
        Self {
            name,
            full_name,
            kind,
            direction: None,
            size,
            indexing_variable: None,
        }
    }

    pub fn with_direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = Some(direction.into());
        self
    }

    pub fn with_indexing_variable(mut self, variable: Arc<dyn MdArray>) -> Self {
        self.indexing_variable = Some(variable);
        self
    }

    pub fn without_indexing_variable(mut self) -> Self {
        self.indexing_variable = None;
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn kind(&self) -> DimensionKind {
        self.kind
    }

    pub fn direction(&self) -> Option<&str> {
        self.direction.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn indexing_variable(&self) -> Option<&Arc<dyn MdArray>> {
        self.indexing_variable.as_ref()
    }

    /// Same axis, compared by full name.
    pub fn same_axis(&self, other: &Dimension) -> bool {
        self.full_name == other.full_name
    }
}

impl fmt::Debug for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dimension")
            .field("full_name", &self.full_name)
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field(
                "indexing_variable",
                &self.indexing_variable.as_ref().map(|v| v.full_name().to_string()),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_from_full_name() {
        let dim = Dimension::new("/group/band", DimensionKind::Other, 3);
        assert_eq!(dim.name(), "band");
        assert_eq!(dim.full_name(), "/group/band");
        assert_eq!(dim.size(), 3);
    }

    #[test]
    fn test_with_size_keeps_identity() {
        let dim = Dimension::new("/band", DimensionKind::Other, 3).with_direction("EAST");
        let smaller = dim.clone().with_size(2);
        assert!(smaller.same_axis(&dim));
        assert_eq!(smaller.size(), 2);
        assert_eq!(smaller.direction(), Some("EAST"));
        assert_eq!(dim.size(), 3);
    }
}
