use serde::{Serialize, Deserialize};
use crate::core::error::Result;
use crate::index::geo::MIN_CELL_SIZE_DEGREES;

/// Whether the planner may fall back to scanning every document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPolicy {
    Allow,
    /// Resource-constrained mode: queries without a usable index fail
    Forbid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan_policy: ScanPolicy,
    pub default_geo_max_distance: f64,     // metres, used when a geo filter omits it
    pub geo_cell_size_degrees: f64,        // grid cell edge for geospatial indexes
    pub scan_check_interval: usize,        // documents between deadline checks
    pub max_in_expansion: usize,           // max compound prefixes built from `in` clauses
    pub strict_schema: bool,               // drop fields the schema does not declare
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scan_policy: ScanPolicy::Allow,
            default_geo_max_distance: 5000.0,
            geo_cell_size_degrees: 1.0,
            scan_check_interval: 256,
            max_in_expansion: 64,
            strict_schema: true,
        }
    }
}

impl Config {
    /// Parse a JSON config; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        use crate::core::error::Error;

        if !(self.geo_cell_size_degrees >= MIN_CELL_SIZE_DEGREES && self.geo_cell_size_degrees <= 180.0) {
            return Err(Error::invalid_input(format!(
                "geo_cell_size_degrees must be in [{}, 180], got {}",
                MIN_CELL_SIZE_DEGREES, self.geo_cell_size_degrees
            )));
        }
        if !(self.default_geo_max_distance.is_finite() && self.default_geo_max_distance >= 0.0) {
            return Err(Error::invalid_input(format!(
                "default_geo_max_distance must be a non-negative number, got {}",
                self.default_geo_max_distance
            )));
        }
        if self.scan_check_interval == 0 {
            return Err(Error::invalid_input("scan_check_interval must be at least 1"));
        }
        if self.max_in_expansion == 0 {
            return Err(Error::invalid_input("max_in_expansion must be at least 1"));
        }
        Ok(())
    }
}
