//! Hierarchical namespaces of arrays and dimensions.

use std::fmt;
use std::sync::Arc;

use crate::array::MdArray;
use crate::dimension::Dimension;
use crate::error::{MdimError, MdimResult};

/// A namespace holding dimensions, arrays and sub-groups.
pub trait Group: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Full path of the group (`/` for the root).
    fn full_name(&self) -> &str;

    /// Dimensions declared in this group.
    fn dimensions(&self) -> Vec<Arc<Dimension>>;

    /// Array names in creation order.
    fn array_names(&self) -> Vec<String>;

    fn open_array(&self, name: &str) -> MdimResult<Arc<dyn MdArray>>;

    /// Sub-group names in creation order.
    fn group_names(&self) -> Vec<String>;

    fn open_group(&self, name: &str) -> MdimResult<Arc<dyn Group>>;

    /// Resolve an array by absolute path, walking sub-groups from here.
    fn open_array_from_full_name(&self, path: &str) -> MdimResult<Arc<dyn MdArray>> {
        let not_found = || MdimError::not_found(format!("Cannot find array {}", path));
        let mut parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        let array_name = parts.pop().ok_or_else(not_found)?;

        let mut current: Option<Arc<dyn Group>> = None;
        for part in parts {
            let next = match &current {
                None => self.open_group(part),
                Some(group) => group.open_group(part),
            };
            current = Some(next.map_err(|_| not_found())?);
        }

        match current {
            None => self.open_array(array_name),
            Some(group) => group.open_array(array_name),
        }
        .map_err(|_| not_found())
    }
}

/// Join a parent path and a child name into a full name.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/", "band"), "/band");
        assert_eq!(join_path("/sub", "x"), "/sub/x");
    }
}
