//! Frond parameters
//!
//! Leaf area and frond initiation follow Gerritsma & Soebagyo (1998),
//! leaf photosynthesis Gerritsma (1988).

use palmsim_core::config::{check_fraction, check_positive, Validate};
use palmsim_core::errors::PalmSimResult;
use palmsim_core::timestep::FloatValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrondParameters {
    /// Light-saturated leaf photosynthesis rate
    /// unit: ug_CO2/m2/s
    /// default: 720
    pub asymptotic_photosynthesis_rate: FloatValue,
    /// Initial slope of the leaf light response
    /// unit: ug_CO2/J
    /// default: 10
    pub initial_light_efficiency: FloatValue,
    /// unit: g_DM/g_CH2O
    /// default: 0.73
    pub conversion_efficiency: FloatValue,
    /// Leaflet share of frond mass
    /// unit: dimensionless
    /// default: 0.25
    pub fraction_leaflets: FloatValue,
    /// Rachis share of frond mass
    /// unit: dimensionless
    /// default: 0.75
    pub fraction_rachis: FloatValue,
    /// Target frond count per palm of a mature canopy
    /// unit: 1/palm
    /// default: 40
    pub fronds_goal_count_t1: FloatValue,
    /// Target frond count per palm at planting
    /// unit: 1/palm
    /// default: 52
    pub fronds_goal_count_t0: FloatValue,
    /// Age at which the target frond count has reached its mature value
    /// unit: year
    /// default: 15
    pub time_mature_canopy: FloatValue,
    /// Asymptotic frond initiation rate, $a$ in $a(1 + b e^{-ct})$
    /// unit: 1/palm/year
    /// default: 21.28
    pub initiation_rate_a: FloatValue,
    /// unit: dimensionless
    /// default: 1.56
    pub initiation_rate_b: FloatValue,
    /// unit: 1/year
    /// default: 0.24
    pub initiation_rate_c: FloatValue,
    /// Upper bound on the frond initiation rate
    /// unit: 1/palm/year
    /// default: 50
    pub initiation_rate_max: FloatValue,
    /// Canopy extinction coefficient for diffuse light
    /// unit: dimensionless
    /// default: 0.33
    pub k: FloatValue,
    /// Asymptotic leaf area per frond, $a$ in $a e^{-b e^{-ct}}$
    /// unit: m2
    /// default: 12.13
    pub leaf_area_a: FloatValue,
    /// unit: dimensionless
    /// default: 2.47
    pub leaf_area_b: FloatValue,
    /// unit: 1/year
    /// default: 0.36
    pub leaf_area_c: FloatValue,
    /// Potential frond growth rate
    /// unit: kg_DM/palm/month
    /// default: 4
    pub potential_growth_rate: FloatValue,
    /// unit: g_CH2O/g_DM/day
    /// default: 0.0083
    pub specific_maintenance_leaflets: FloatValue,
    /// unit: g_CH2O/g_DM/day
    /// default: 0.0018
    pub specific_maintenance_rachis: FloatValue,
    /// Frond mass at planting
    /// unit: kg_DM/palm
    /// default: 0.1
    pub initial_mass_per_palm: FloatValue,
    /// Frond count at planting
    /// unit: 1/palm
    /// default: 10
    pub initial_count_per_palm: FloatValue,
}

impl Default for FrondParameters {
    fn default() -> Self {
        Self {
            asymptotic_photosynthesis_rate: 720.0,
            initial_light_efficiency: 10.0,
            conversion_efficiency: 0.73,
            fraction_leaflets: 0.25,
            fraction_rachis: 0.75,
            fronds_goal_count_t1: 40.0,
            fronds_goal_count_t0: 52.0,
            time_mature_canopy: 15.0,
            initiation_rate_a: 21.28,
            initiation_rate_b: 1.56,
            initiation_rate_c: 0.24,
            initiation_rate_max: 50.0,
            k: 0.33,
            leaf_area_a: 12.13,
            leaf_area_b: 2.47,
            leaf_area_c: 0.36,
            potential_growth_rate: 4.0,
            specific_maintenance_leaflets: 0.0083,
            specific_maintenance_rachis: 0.0018,
            initial_mass_per_palm: 0.1,
            initial_count_per_palm: 10.0,
        }
    }
}

impl Validate for FrondParameters {
    fn validate(&self) -> PalmSimResult<()> {
        check_positive(
            "fronds.asymptotic_photosynthesis_rate",
            self.asymptotic_photosynthesis_rate,
        )?;
        check_positive("fronds.conversion_efficiency", self.conversion_efficiency)?;
        check_fraction("fronds.fraction_leaflets", self.fraction_leaflets)?;
        check_fraction("fronds.fraction_rachis", self.fraction_rachis)?;
        check_positive("fronds.time_mature_canopy", self.time_mature_canopy)?;
        check_positive("fronds.initiation_rate_max", self.initiation_rate_max)?;
        check_positive("fronds.k", self.k)?;
        check_positive("fronds.initial_mass_per_palm", self.initial_mass_per_palm)?;
        check_positive("fronds.initial_count_per_palm", self.initial_count_per_palm)
    }
}
