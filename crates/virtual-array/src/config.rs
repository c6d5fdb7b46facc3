//! Configuration for derived arrays.

use serde::{Deserialize, Serialize};

/// Limits and tuning knobs shared by the derived-array factories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualArrayConfig {
    /// Largest point count a gridded view accepts without explicit opt-in.
    pub max_gridded_points: u64,

    /// Largest selector array a dimension subset accepts.
    pub max_selector_values: u64,

    /// Points sampled when refining an estimated grid resolution.
    pub resolution_sample_count: usize,

    /// Default search radius as a multiple of the grid resolution.
    pub search_radius_factor: f64,

    /// Block size advertised on the Y/X axes of gridded views.
    pub gridded_block_size: u64,
}

impl Default for VirtualArrayConfig {
    fn default() -> Self {
        Self {
            max_gridded_points: 10 * 1024 * 1024,
            max_selector_values: 10 * 1024 * 1024,
            resolution_sample_count: 10,
            search_radius_factor: 5.0,
            gridded_block_size: 256,
        }
    }
}

impl VirtualArrayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("GRIDDED_MAX_POINTS") {
            if let Ok(n) = val.parse() {
                config.max_gridded_points = n;
            }
        }

        if let Ok(val) = std::env::var("SUBSET_MAX_SELECTOR_VALUES") {
            if let Ok(n) = val.parse() {
                config.max_selector_values = n;
            }
        }

        if let Ok(val) = std::env::var("GRIDDED_RESOLUTION_SAMPLES") {
            if let Ok(n) = val.parse() {
                config.resolution_sample_count = n;
            }
        }

        if let Ok(val) = std::env::var("GRIDDED_SEARCH_RADIUS_FACTOR") {
            if let Ok(f) = val.parse() {
                config.search_radius_factor = f;
            }
        }

        if let Ok(val) = std::env::var("GRIDDED_BLOCK_SIZE") {
            if let Ok(n) = val.parse() {
                config.gridded_block_size = n;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_gridded_points < 3 {
            return Err("max_gridded_points must be >= 3".to_string());
        }

        if self.max_selector_values == 0 {
            return Err("max_selector_values must be > 0".to_string());
        }

        if self.resolution_sample_count == 0 {
            return Err("resolution_sample_count must be > 0".to_string());
        }

        if !(self.search_radius_factor.is_finite() && self.search_radius_factor > 0.0) {
            return Err("search_radius_factor must be a positive number".to_string());
        }

        Ok(())
    }
}
