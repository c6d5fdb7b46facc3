//! Construction options of the gridded view.

use serde::{Deserialize, Serialize};

use mdim_common::{MdimError, MdimResult};

/// Options accepted by [`crate::get_gridded`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GriddedOptions {
    /// Cell size of the output grid. Estimated from the points when unset.
    pub resolution: Option<f64>,
    /// Allow more points than the configured ceiling.
    pub accept_big_spatial_indexing_variable: bool,
}

impl GriddedOptions {
    /// Parse `KEY=VALUE` strings (`RESOLUTION`, `ACCEPT_BIG_SPATIAL_INDEXING_VARIABLE`).
    ///
    /// Keys are case-insensitive; unknown keys are ignored.
    pub fn from_key_values<S: AsRef<str>>(items: &[S]) -> MdimResult<Self> {
        let mut options = Self::default();
        for item in items {
            let item = item.as_ref();
            let (key, value) = item
                .split_once('=')
                .ok_or_else(|| MdimError::invalid(format!("Invalid option '{}'", item)))?;
            match key.trim().to_ascii_uppercase().as_str() {
                "RESOLUTION" => {
                    let res: f64 = value.trim().parse().map_err(|_| {
                        MdimError::invalid(format!("Invalid RESOLUTION value '{}'", value))
                    })?;
                    options.resolution = Some(res);
                }
                "ACCEPT_BIG_SPATIAL_INDEXING_VARIABLE" => {
                    options.accept_big_spatial_indexing_variable = parse_bool(value);
                }
                other => {
                    tracing::debug!(option = other, "Ignoring unknown gridded option");
                }
            }
        }
        Ok(options)
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn accept_big(mut self) -> Self {
        self.accept_big_spatial_indexing_variable = true;
        self
    }

    /// Reject resolutions that cannot describe a grid.
    pub fn validate(&self) -> MdimResult<()> {
        match self.resolution {
            Some(res) if !(res.is_finite() && res > 0.0) => Err(MdimError::invalid(format!(
                "Invalid RESOLUTION value: {}",
                res
            ))),
            _ => Ok(()),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_uppercase().as_str(),
        "YES" | "TRUE" | "ON" | "1"
    )
}
