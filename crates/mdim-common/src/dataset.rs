//! JSON descriptions of in-memory datasets.
//!
//! ```json
//! {
//!   "dimensions": [{ "name": "band", "size": 3, "indexing_variable": "/props/validity" }],
//!   "arrays": [{ "name": "ar", "dimensions": ["/band"], "data_type": "float64", "values": [1, 2, 3] }],
//!   "groups": [{ "name": "props", "arrays": [ ... ] }]
//! }
//! ```
//!
//! Dimensions are referenced by full name. Arrays used as indexing variables
//! are built first so that every other array sees the indexed dimension.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::array::MdArray;
use crate::datatype::DataType;
use crate::dimension::{Dimension, DimensionKind};
use crate::error::{MdimError, MdimResult};
use crate::mem::{MemArray, MemGroup};

/// A group and everything below it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dimensions: Vec<DimensionSpec>,
    #[serde(default)]
    pub arrays: Vec<ArraySpec>,
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionSpec {
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub kind: DimensionKind,
    #[serde(default)]
    pub direction: Option<String>,
    /// Full name of the array indexing this dimension.
    #[serde(default)]
    pub indexing_variable: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArraySpec {
    pub name: String,
    /// Full names of the dimensions, outermost first.
    pub dimensions: Vec<String>,
    pub data_type: DataType,
    #[serde(default)]
    pub values: Vec<f64>,
    #[serde(default)]
    pub no_data: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub spatial_ref: Option<String>,
}

impl GroupSpec {
    /// Parse a description from JSON text.
    pub fn from_json(text: &str) -> MdimResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build the described dataset as an in-memory root group.
    pub fn build(&self) -> MdimResult<Arc<MemGroup>> {
        let root = MemGroup::new_root();

        // Groups and plain dimensions.
        let mut dims: HashMap<String, Arc<Dimension>> = HashMap::new();
        let mut pending_index: Vec<(Arc<MemGroup>, String, String)> = Vec::new();
        let mut arrays: Vec<(Arc<MemGroup>, &ArraySpec)> = Vec::new();
        self.declare(&root, &mut dims, &mut pending_index, &mut arrays)?;

        // Indexing variables first, on plain dimensions.
        let index_paths: HashSet<&str> = pending_index.iter().map(|(_, _, p)| p.as_str()).collect();
        let (index_arrays, data_arrays): (Vec<_>, Vec<_>) = arrays
            .into_iter()
            .partition(|(g, a)| index_paths.contains(g.child_path(&a.name).as_str()));

        let mut built: HashMap<String, Arc<dyn MdArray>> = HashMap::new();
        for (group, spec) in index_arrays {
            let array = spec.instantiate(&group, &dims)?;
            built.insert(array.full_name().to_string(), array.clone());
            group.add_array(array)?;
        }

        for (group, dim_name, var_path) in pending_index {
            let var = built.get(&var_path).cloned().ok_or_else(|| {
                MdimError::not_found(format!("Cannot find array {}", var_path))
            })?;
            let indexed = group.set_indexing_variable(&dim_name, var)?;
            dims.insert(indexed.full_name().to_string(), indexed);
        }

        for (group, spec) in data_arrays {
            let array = spec.instantiate(&group, &dims)?;
            group.add_array(array)?;
        }

        debug!(dimensions = dims.len(), "built in-memory dataset");
        Ok(root)
    }

    fn declare<'s>(
        &'s self,
        group: &Arc<MemGroup>,
        dims: &mut HashMap<String, Arc<Dimension>>,
        pending_index: &mut Vec<(Arc<MemGroup>, String, String)>,
        arrays: &mut Vec<(Arc<MemGroup>, &'s ArraySpec)>,
    ) -> MdimResult<()> {
        for d in &self.dimensions {
            let mut dim = Dimension::new(group.child_path(&d.name), d.kind, d.size);
            if let Some(direction) = &d.direction {
                dim = dim.with_direction(direction.clone());
            }
            let dim = Arc::new(dim);
            group.add_dimension(dim.clone())?;
            if let Some(var) = &d.indexing_variable {
                pending_index.push((group.clone(), d.name.clone(), var.clone()));
            }
            dims.insert(dim.full_name().to_string(), dim);
        }
        for a in &self.arrays {
            arrays.push((group.clone(), a));
        }
        for g in &self.groups {
            let child = group.create_group(&g.name)?;
            g.declare(&child, dims, pending_index, arrays)?;
        }
        Ok(())
    }
}

impl ArraySpec {
    fn instantiate(
        &self,
        group: &MemGroup,
        dims: &HashMap<String, Arc<Dimension>>,
    ) -> MdimResult<Arc<dyn MdArray>> {
        let array_dims = self
            .dimensions
            .iter()
            .map(|name| {
                dims.get(name)
                    .cloned()
                    .ok_or_else(|| MdimError::not_found(format!("Dimension {} does not exist", name)))
            })
            .collect::<MdimResult<Vec<_>>>()?;

        let mut array = MemArray::new(group.child_path(&self.name), array_dims, self.data_type);
        if let Some(no_data) = self.no_data {
            array = array.with_no_data(no_data);
        }
        if let Some(unit) = &self.unit {
            array = array.with_unit(unit.clone());
        }
        if let Some(srs) = &self.spatial_ref {
            array = array.with_spatial_ref(srs.clone());
        }
        if self.data_type.is_numeric() && !self.values.is_empty() {
            array.write(&self.values)?;
        }
        Ok(Arc::new(array))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::Group;

    const DATASET: &str = r#"{
        "dimensions": [
            { "name": "band", "size": 3, "indexing_variable": "/props/validity" },
            { "name": "x", "size": 2, "kind": "horizontal_x" }
        ],
        "arrays": [
            { "name": "ar", "dimensions": ["/band", "/x"], "data_type": "float64",
              "values": [0, 1, 2, 3, 4, 5], "no_data": 5, "unit": "K" }
        ],
        "groups": [
            { "name": "props",
              "arrays": [
                { "name": "validity", "dimensions": ["/band"], "data_type": "int32",
                  "values": [1, 0, 1] }
              ] }
        ]
    }"#;

    #[test]
    fn test_build_dataset_with_indexing_variable() {
        let root = GroupSpec::from_json(DATASET).unwrap().build().unwrap();
        let ar = root.open_array_from_full_name("/ar").unwrap();
        assert_eq!(ar.shape(), vec![3, 2]);
        assert_eq!(ar.raw_no_data(), Some(5.0));
        assert_eq!(ar.unit(), Some("K"));

        let band = &ar.dimensions()[0];
        let var = band.indexing_variable().expect("band should be indexed");
        assert_eq!(var.full_name(), "/props/validity");
        assert_eq!(var.read_all_f64().unwrap(), vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unknown_dimension_reference() {
        let text = r#"{ "arrays": [{ "name": "a", "dimensions": ["/nope"], "data_type": "uint8" }] }"#;
        let err = GroupSpec::from_json(text).unwrap().build().unwrap_err();
        assert_eq!(err.to_string(), "Dimension /nope does not exist");
    }
}
