use palmsim_core::config::{
    check_fraction, check_non_negative, check_positive, check_window, Validate,
};
use palmsim_core::errors::PalmSimResult;
use palmsim_core::timestep::FloatValue;
use serde::{Deserialize, Serialize};

/// Parameters of one bunch component.
///
/// Growth window bounds are fractions of the maturity time of the cohort
/// the component belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BunchComponentParameters {
    /// unit: g_DM/g_CH2O
    pub conversion_efficiency: FloatValue,
    /// Share of the potential bunch mass
    /// unit: dimensionless
    pub potential_mass_fraction: FloatValue,
    /// unit: g_CH2O/g_DM/day
    pub specific_maintenance: FloatValue,
    /// unit: fraction of t_maturity
    pub t_growth_start: FloatValue,
    /// unit: fraction of t_maturity
    pub t_growth_end: FloatValue,
}

impl BunchComponentParameters {
    pub fn stalk() -> Self {
        Self {
            conversion_efficiency: 0.69,
            potential_mass_fraction: 0.25,
            specific_maintenance: 0.0022,
            t_growth_start: 0.0,
            t_growth_end: 0.75,
        }
    }

    pub fn mesocarp_fibers() -> Self {
        Self {
            conversion_efficiency: 0.69,
            potential_mass_fraction: 0.35,
            specific_maintenance: 0.0022,
            t_growth_start: 0.825,
            t_growth_end: 0.95,
        }
    }

    pub fn mesocarp_oil() -> Self {
        Self {
            conversion_efficiency: 0.42,
            potential_mass_fraction: 0.35,
            specific_maintenance: 0.0022,
            t_growth_start: 0.9,
            t_growth_end: 0.95,
        }
    }

    pub fn kernel() -> Self {
        Self {
            conversion_efficiency: 0.42,
            potential_mass_fraction: 0.05,
            specific_maintenance: 0.0022,
            t_growth_start: 0.875,
            t_growth_end: 0.975,
        }
    }

    fn validate_named(&self, name: &str) -> PalmSimResult<()> {
        check_positive(&format!("{}.conversion_efficiency", name), self.conversion_efficiency)?;
        check_fraction(&format!("{}.potential_mass_fraction", name), self.potential_mass_fraction)?;
        check_non_negative(&format!("{}.specific_maintenance", name), self.specific_maintenance)?;
        check_window(&format!("{}.t_growth", name), self.t_growth_start, self.t_growth_end)
    }
}

/// Parameters of all bunch components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BunchComponentsParameters {
    pub stalk: BunchComponentParameters,
    pub mesocarp_fibers: BunchComponentParameters,
    pub mesocarp_oil: BunchComponentParameters,
    pub kernel: BunchComponentParameters,
}

impl Default for BunchComponentsParameters {
    fn default() -> Self {
        Self {
            stalk: BunchComponentParameters::stalk(),
            mesocarp_fibers: BunchComponentParameters::mesocarp_fibers(),
            mesocarp_oil: BunchComponentParameters::mesocarp_oil(),
            kernel: BunchComponentParameters::kernel(),
        }
    }
}

impl Validate for BunchComponentsParameters {
    fn validate(&self) -> PalmSimResult<()> {
        self.stalk.validate_named("bunch_components.stalk")?;
        self.mesocarp_fibers.validate_named("bunch_components.mesocarp_fibers")?;
        self.mesocarp_oil.validate_named("bunch_components.mesocarp_oil")?;
        self.kernel.validate_named("bunch_components.kernel")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    #[test]
    fn potential_mass_fractions_sum_to_one() {
        let p = BunchComponentsParameters::default();
        let total = p.stalk.potential_mass_fraction
            + p.mesocarp_fibers.potential_mass_fraction
            + p.mesocarp_oil.potential_mass_fraction
            + p.kernel.potential_mass_fraction;
        assert!(is_close!(total, 1.0));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let mut p = BunchComponentsParameters::default();
        p.kernel.t_growth_end = 0.5;
        assert!(p.validate().is_err());
    }
}
