//! Entry points creating derived arrays and namespaces.
//!
//! Each view has a free function using the default configuration, a
//! `_with_config` variant, and a method on [`ViewFactory`] which carries a
//! configuration for repeated use.
//!
//! # Example
//!
//! ```rust,ignore
//! use virtual_array::{ViewFactory, GriddedOptions};
//!
//! let factory = ViewFactory::from_env()?;
//!
//! let gridded = factory.gridded(values, "invdist:nodata=nan", x, y, &GriddedOptions::default())?;
//! let subset = factory.subset(&root, "/band_properties/validity=1")?;
//! ```

use std::sync::Arc;

use mdim_common::{Group, MdArray, MdimError, MdimResult};

use crate::config::VirtualArrayConfig;
use crate::gridded::{GriddedArray, GriddedOptions};
use crate::orthorectified::OrthorectifiedArray;
use crate::subset;
use crate::types::GeoTransform;

/// Creates derived views with a shared configuration.
#[derive(Debug, Clone, Default)]
pub struct ViewFactory {
    config: VirtualArrayConfig,
}

impl ViewFactory {
    /// Create a factory after validating `config`.
    pub fn new(config: VirtualArrayConfig) -> MdimResult<Self> {
        config.validate().map_err(MdimError::invalid)?;
        Ok(Self { config })
    }

    /// Create a factory configured from environment variables.
    pub fn from_env() -> MdimResult<Self> {
        Self::new(VirtualArrayConfig::from_env())
    }

    /// Get the factory configuration.
    pub fn config(&self) -> &VirtualArrayConfig {
        &self.config
    }

    pub fn orthorectified(
        &self,
        parent: Arc<dyn MdArray>,
        index_x: Arc<dyn MdArray>,
        index_y: Arc<dyn MdArray>,
        index_offset: i64,
        geo_transform: GeoTransform,
    ) -> MdimResult<Arc<OrthorectifiedArray>> {
        OrthorectifiedArray::create(parent, index_x, index_y, index_offset, geo_transform)
    }

    pub fn gridded(
        &self,
        parent: Arc<dyn MdArray>,
        algorithm_options: &str,
        x_array: Arc<dyn MdArray>,
        y_array: Arc<dyn MdArray>,
        options: &GriddedOptions,
    ) -> MdimResult<Arc<GriddedArray>> {
        GriddedArray::create(parent, algorithm_options, x_array, y_array, options, &self.config)
    }

    pub fn subset(&self, root: &Arc<dyn Group>, selection: &str) -> MdimResult<Arc<dyn Group>> {
        subset::subset_dimension_from_selection(root, selection, &self.config)
    }
}

/// Rectify `parent` through the geolocation lookup table `(index_x, index_y)`.
pub fn create_orthorectified(
    parent: Arc<dyn MdArray>,
    index_x: Arc<dyn MdArray>,
    index_y: Arc<dyn MdArray>,
    index_offset: i64,
    geo_transform: GeoTransform,
) -> MdimResult<Arc<OrthorectifiedArray>> {
    OrthorectifiedArray::create(parent, index_x, index_y, index_offset, geo_transform)
}

/// Grid the point values of `parent` located by `x_array` / `y_array`.
pub fn get_gridded(
    parent: Arc<dyn MdArray>,
    algorithm_options: &str,
    x_array: Arc<dyn MdArray>,
    y_array: Arc<dyn MdArray>,
    options: &GriddedOptions,
) -> MdimResult<Arc<GriddedArray>> {
    get_gridded_with_config(
        parent,
        algorithm_options,
        x_array,
        y_array,
        options,
        &VirtualArrayConfig::default(),
    )
}

pub fn get_gridded_with_config(
    parent: Arc<dyn MdArray>,
    algorithm_options: &str,
    x_array: Arc<dyn MdArray>,
    y_array: Arc<dyn MdArray>,
    options: &GriddedOptions,
    config: &VirtualArrayConfig,
) -> MdimResult<Arc<GriddedArray>> {
    GriddedArray::create(parent, algorithm_options, x_array, y_array, options, config)
}

/// Restrict a dimension of `root` with a `/path/to/array=value` selection.
pub fn subset_dimension_from_selection(
    root: &Arc<dyn Group>,
    selection: &str,
) -> MdimResult<Arc<dyn Group>> {
    subset::subset_dimension_from_selection(root, selection, &VirtualArrayConfig::default())
}

pub fn subset_dimension_from_selection_with_config(
    root: &Arc<dyn Group>,
    selection: &str,
    config: &VirtualArrayConfig,
) -> MdimResult<Arc<dyn Group>> {
    subset::subset_dimension_from_selection(root, selection, config)
}
