use palmsim_core::config::{check_positive, Validate};
use palmsim_core::errors::PalmSimResult;
use palmsim_core::timestep::FloatValue;
use serde::{Deserialize, Serialize};

/// Soil water balance parameters.
///
/// Relative evapotranspiration follows a logistic curve of the relative
/// available water, $1/(1 + e^{-(x - a)/b})$ (Combres et al. 2013).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SoilParameters {
    /// Water holding capacity of the rooting zone when no soil depth is given
    /// unit: mm
    /// default: 500
    pub default_water_holding_capacity: FloatValue,
    /// unit: dimensionless
    /// default: 0.2
    pub relative_evapotranspiration_a: FloatValue,
    /// unit: dimensionless
    /// default: 0.1
    pub relative_evapotranspiration_b: FloatValue,
}

impl Default for SoilParameters {
    fn default() -> Self {
        Self {
            default_water_holding_capacity: 500.0,
            relative_evapotranspiration_a: 0.2,
            relative_evapotranspiration_b: 0.1,
        }
    }
}

impl Validate for SoilParameters {
    fn validate(&self) -> PalmSimResult<()> {
        check_positive("soil.default_water_holding_capacity", self.default_water_holding_capacity)?;
        check_positive("soil.relative_evapotranspiration_b", self.relative_evapotranspiration_b)
    }
}
