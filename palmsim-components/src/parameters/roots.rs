use palmsim_core::config::{check_non_negative, check_positive, Validate};
use palmsim_core::errors::PalmSimResult;
use palmsim_core::interpolate::NaturalCubicSpline;
use palmsim_core::timestep::FloatValue;
use serde::{Deserialize, Serialize};

/// Root parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RootParameters {
    /// unit: g_DM/g_CH2O
    /// default: 0.69
    pub conversion_efficiency: FloatValue,
    /// Fraction of root mass turned over each day
    /// unit: 1/day
    /// default: 0.000582
    pub loss_param: FloatValue,
    /// unit: g_CH2O/g_DM/day
    /// default: 0.0022
    pub specific_maintenance: FloatValue,
    /// unit: kg_DM/palm
    /// default: 0.1
    pub initial_mass_per_palm: FloatValue,
    /// Potential net growth control points, `[years after planting, kg_DM/palm/year]`
    pub potential_growth_curve: Vec<[FloatValue; 2]>,
}

impl Default for RootParameters {
    fn default() -> Self {
        Self {
            conversion_efficiency: 0.69,
            loss_param: 0.000582,
            specific_maintenance: 0.0022,
            initial_mass_per_palm: 0.1,
            potential_growth_curve: vec![
                [0.0, 3.5],
                [3.0, 5.7],
                [6.0, 5.1],
                [9.0, 3.4],
                [12.0, 1.9],
                [15.0, 1.0],
                [18.0, 0.5],
                [21.0, 0.3],
                [24.0, 0.1],
                [27.0, 0.1],
            ],
        }
    }
}

impl Validate for RootParameters {
    fn validate(&self) -> PalmSimResult<()> {
        check_positive("roots.conversion_efficiency", self.conversion_efficiency)?;
        check_non_negative("roots.loss_param", self.loss_param)?;
        check_non_negative("roots.specific_maintenance", self.specific_maintenance)?;
        check_positive("roots.initial_mass_per_palm", self.initial_mass_per_palm)?;
        NaturalCubicSpline::new(&self.potential_growth_curve).map(|_| ())
    }
}
