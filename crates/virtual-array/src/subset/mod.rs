//! Namespaces where one dimension is restricted by a value selection.
//!
//! A selection `/path/to/array=value` keeps the indices of the dimension of
//! the 1-D array `/path/to/array` whose value equals `value`. Every array of
//! the namespace indexed by that dimension, at any depth, is exposed with the
//! dimension shrunk to the matching indices.
//!
//! ```text
//! SubsetGroup ──► SelectionContext (dimension, match table, replacement)
//!     │                 ▲
//!     ├─ SubsetGroup ───┤   (sub-groups share the context)
//!     └─ SubsetArray ───┘   (only the match table and dimension are kept)
//! ```

mod array;
mod group;

pub use array::SubsetArray;
pub use group::SubsetGroup;

use std::sync::Arc;

use mdim_common::{Dimension, Group, MdArray, MdimError, MdimResult};

use crate::config::VirtualArrayConfig;

/// State shared by every array and group derived from one selection.
///
/// Built once per selection. Derived arrays clone the match table and the
/// replacement dimension out of it and never point back at the group tree.
#[derive(Debug)]
pub struct SelectionContext {
    dim_full_name: String,
    matches: Arc<[u64]>,
    replacement: Arc<Dimension>,
    root: Arc<dyn Group>,
}

impl SelectionContext {
    /// Full name of the restricted dimension.
    pub fn dimension_full_name(&self) -> &str {
        &self.dim_full_name
    }

    /// Original indices kept, in ascending order.
    pub fn matches(&self) -> &Arc<[u64]> {
        &self.matches
    }

    /// The dimension exposed in place of the original one.
    pub fn replacement(&self) -> &Arc<Dimension> {
        &self.replacement
    }

    /// The namespace the selection was made on.
    pub fn root(&self) -> &Arc<dyn Group> {
        &self.root
    }

    /// Wrap `array` when it is indexed by the restricted dimension.
    pub fn wrap_array(&self, array: Arc<dyn MdArray>) -> Arc<dyn MdArray> {
        let indexed = array
            .dimensions()
            .iter()
            .any(|d| d.full_name() == self.dim_full_name);
        if indexed {
            Arc::new(SubsetArray::new(
                array,
                &self.dim_full_name,
                self.matches.clone(),
                self.replacement.clone(),
            ))
        } else {
            array
        }
    }
}

/// Split `/path/to/array=value` into its path and numeric value.
pub fn parse_selection(selection: &str) -> MdimResult<(&str, f64)> {
    let (path, value) = selection
        .rsplit_once('=')
        .filter(|(path, _)| !path.is_empty())
        .ok_or_else(|| MdimError::invalid("Invalid value for selection"))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| MdimError::invalid("Non-numeric value in selection criterion"))?;
    Ok((path, value))
}

/// Restrict the dimension of a selector array to the indices matching a value.
///
/// Returns `root` itself when every index matches.
pub fn subset_dimension_from_selection(
    root: &Arc<dyn Group>,
    selection: &str,
    config: &VirtualArrayConfig,
) -> MdimResult<Arc<dyn Group>> {
    let (path, value) = parse_selection(selection)?;

    let selector = root.open_array_from_full_name(path)?;
    if selector.rank() != 1 {
        return Err(MdimError::invalid(format!(
            "Array {} is not single dimensional",
            path
        )));
    }
    if !selector.data_type().is_numeric() {
        return Err(MdimError::invalid(format!(
            "Array {} is not of numeric type",
            path
        )));
    }
    let size = selector.total_elements();
    if size > config.max_selector_values {
        return Err(MdimError::capacity(format!("Too many values in {}", path)));
    }

    let values = selector.read_all_f64()?;
    let matches: Vec<u64> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v == value)
        .map(|(i, _)| i as u64)
        .collect();

    if matches.is_empty() {
        return Err(MdimError::invalid(format!(
            "No value in {} matching {:.6}",
            path, value
        )));
    }
    if matches.len() as u64 == size {
        tracing::warn!(
            selection,
            "Selection matches every index, returning the original group"
        );
        return Ok(root.clone());
    }

    // The selector may hold the dimension as declared before it got its
    // indexing variable; prefer the group's current declaration.
    let dim = selector.dimensions()[0].clone();
    let dim = find_dimension(root.as_ref(), dim.full_name()).unwrap_or(dim);
    let matches: Arc<[u64]> = matches.into();
    let plain = Arc::new(
        (*dim)
            .clone()
            .without_indexing_variable()
            .with_size(matches.len() as u64),
    );
    let replacement = match dim.indexing_variable() {
        Some(var) => {
            let var: Arc<dyn MdArray> = Arc::new(SubsetArray::new(
                var.clone(),
                dim.full_name(),
                matches.clone(),
                plain.clone(),
            ));
            Arc::new((*plain).clone().with_indexing_variable(var))
        }
        None => plain,
    };

    tracing::debug!(
        dimension = %dim.full_name(),
        original_size = size,
        matches = matches.len(),
        "Created dimension subset"
    );

    let context = Arc::new(SelectionContext {
        dim_full_name: dim.full_name().to_string(),
        matches,
        replacement,
        root: root.clone(),
    });
    Ok(Arc::new(SubsetGroup::new(root.clone(), context)))
}

/// Look up a dimension declaration by full name anywhere below `group`.
fn find_dimension(group: &dyn Group, full_name: &str) -> Option<Arc<Dimension>> {
    if let Some(dim) = group
        .dimensions()
        .into_iter()
        .find(|d| d.full_name() == full_name)
    {
        return Some(dim);
    }
    group
        .group_names()
        .iter()
        .filter_map(|name| group.open_group(name).ok())
        .find_map(|child| find_dimension(child.as_ref(), full_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("/a/b=1").unwrap(), ("/a/b", 1.0));
        // Split at the last '='
        assert_eq!(parse_selection("/a=b=-2.5").unwrap(), ("/a=b", -2.5));
    }

    #[test]
    fn test_parse_selection_errors() {
        for bad in ["", "/a", "=1"] {
            let err = parse_selection(bad).unwrap_err();
            assert_eq!(err.to_string(), "Invalid value for selection");
        }
        let err = parse_selection("/a=x").unwrap_err();
        assert_eq!(err.to_string(), "Non-numeric value in selection criterion");
    }
}
