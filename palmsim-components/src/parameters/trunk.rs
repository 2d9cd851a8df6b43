use palmsim_core::config::{check_non_negative, check_positive, Validate};
use palmsim_core::errors::PalmSimResult;
use palmsim_core::interpolate::NaturalCubicSpline;
use palmsim_core::timestep::FloatValue;
use serde::{Deserialize, Serialize};

/// Trunk parameters.
///
/// The potential growth curve is a table of (years after planting,
/// kg_DM/palm/year) points from Corley & Tinker (2003) through which a
/// natural cubic spline is fitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrunkParameters {
    /// unit: g_DM/g_CH2O
    /// default: 0.69
    pub conversion_efficiency: FloatValue,
    /// Increase of trunk density with age
    /// unit: kg/m3/year
    /// default: 7.62
    pub density_a: FloatValue,
    /// Trunk density at planting
    /// unit: kg/m3
    /// default: 83
    pub density_b: FloatValue,
    /// Rate at which trunk tissue lignifies
    /// unit: kg/m3/month
    /// default: 0.74
    pub lignification_rate: FloatValue,
    /// Constant mass loss
    /// unit: kg_DM/ha/day
    /// default: 0
    pub mass_loss_rate: FloatValue,
    /// Maintenance cost of non-lignified tissue
    /// unit: g_CH2O/g_DM/day
    /// default: 0.0005
    pub specific_maintenance: FloatValue,
    /// unit: kg_DM/palm
    /// default: 0.1
    pub initial_mass_per_palm: FloatValue,
    /// Potential growth rate control points, `[years after planting, kg_DM/palm/year]`
    pub potential_growth_curve: Vec<[FloatValue; 2]>,
}

impl Default for TrunkParameters {
    fn default() -> Self {
        Self {
            conversion_efficiency: 0.69,
            density_a: 7.62,
            density_b: 83.0,
            lignification_rate: 0.74,
            mass_loss_rate: 0.0,
            specific_maintenance: 0.0005,
            initial_mass_per_palm: 0.1,
            potential_growth_curve: vec![
                [0.0, 1.6],
                [3.0, 9.5],
                [6.0, 19.6],
                [9.0, 22.8],
                [12.0, 19.2],
                [15.0, 13.5],
                [18.0, 8.6],
                [21.0, 5.2],
                [24.0, 3.0],
                [27.0, 1.7],
            ],
        }
    }
}

impl Validate for TrunkParameters {
    fn validate(&self) -> PalmSimResult<()> {
        check_positive("trunk.conversion_efficiency", self.conversion_efficiency)?;
        check_positive("trunk.density_b", self.density_b)?;
        check_non_negative("trunk.lignification_rate", self.lignification_rate)?;
        check_non_negative("trunk.mass_loss_rate", self.mass_loss_rate)?;
        check_positive("trunk.initial_mass_per_palm", self.initial_mass_per_palm)?;
        NaturalCubicSpline::new(&self.potential_growth_curve).map(|_| ())
    }
}
