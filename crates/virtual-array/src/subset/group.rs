//! Namespace view exposing a selection on every array it contains.

use std::sync::Arc;

use mdim_common::{Dimension, Group, MdArray, MdimResult};

use super::SelectionContext;

/// A group whose arrays and sub-groups see the restricted dimension.
#[derive(Debug)]
pub struct SubsetGroup {
    group: Arc<dyn Group>,
    context: Arc<SelectionContext>,
}

impl SubsetGroup {
    pub fn new(group: Arc<dyn Group>, context: Arc<SelectionContext>) -> Self {
        Self { group, context }
    }

    pub fn context(&self) -> &Arc<SelectionContext> {
        &self.context
    }

    /// The wrapped group.
    pub fn inner(&self) -> &Arc<dyn Group> {
        &self.group
    }
}

impl Group for SubsetGroup {
    fn name(&self) -> &str {
        self.group.name()
    }

    fn full_name(&self) -> &str {
        self.group.full_name()
    }

    fn dimensions(&self) -> Vec<Arc<Dimension>> {
        self.group
            .dimensions()
            .into_iter()
            .map(|d| {
                if d.full_name() == self.context.dimension_full_name() {
                    self.context.replacement().clone()
                } else {
                    d
                }
            })
            .collect()
    }

    fn array_names(&self) -> Vec<String> {
        self.group.array_names()
    }

    fn open_array(&self, name: &str) -> MdimResult<Arc<dyn MdArray>> {
        let array = self.group.open_array(name)?;
        Ok(self.context.wrap_array(array))
    }

    fn group_names(&self) -> Vec<String> {
        self.group.group_names()
    }

    fn open_group(&self, name: &str) -> MdimResult<Arc<dyn Group>> {
        let group = self.group.open_group(name)?;
        Ok(Arc::new(SubsetGroup::new(group, self.context.clone())))
    }
}
