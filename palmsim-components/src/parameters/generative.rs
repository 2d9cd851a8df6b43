//! Parameters of the inflorescence cohorts and their population.

use palmsim_core::config::{check_fraction, check_non_negative, check_positive, Validate};
use palmsim_core::errors::PalmSimResult;
use palmsim_core::timestep::FloatValue;
use serde::{Deserialize, Serialize};

/// Parameters of the cohort population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerativeParameters {
    /// Asymptotic duration from inflorescence initiation to harvest
    /// unit: day
    /// default: 1500
    pub bunch_development_asymptote_t0: FloatValue,
    /// Increase of the development duration with palm age
    /// unit: day/year
    /// default: 27
    pub bunch_development_slope: FloatValue,
    /// Fresh to dry matter ratio of bunches
    /// unit: kg_FM/kg_DM
    /// default: 1.9
    pub bunch_fm_to_dm_ratio: FloatValue,
    /// Female inflorescence production, $a$ in $a(1 + b e^{-kt})$
    /// unit: 1/palm/year
    /// default: 15.8
    pub female_fraction_a: FloatValue,
    /// unit: dimensionless
    /// default: 2
    pub female_fraction_b: FloatValue,
    /// unit: 1/year
    /// default: 0.22
    pub female_fraction_k: FloatValue,
    /// Leaf initiation used as reference for the female fraction baseline
    /// unit: 1/palm/year
    /// default: 21.28
    pub reference_initiation_a: FloatValue,
    /// unit: dimensionless
    /// default: 1.56
    pub reference_initiation_b: FloatValue,
    /// unit: 1/year
    /// default: 0.24
    pub reference_initiation_c: FloatValue,
    /// Palm age at which the first bunches are harvested
    /// unit: month
    /// default: 28
    pub onset_time: FloatValue,
    /// Steepness of the onset of inflorescence production
    /// unit: 1/month^4
    /// default: 0.1
    pub onset_steepness: FloatValue,
    /// Decrease of the female fraction with the stress index
    /// unit: dimensionless
    /// default: 0.6
    pub stress_female_fraction_asymptote: FloatValue,
}

impl Default for GenerativeParameters {
    fn default() -> Self {
        Self {
            bunch_development_asymptote_t0: 1500.0,
            bunch_development_slope: 27.0,
            bunch_fm_to_dm_ratio: 1.9,
            female_fraction_a: 15.8,
            female_fraction_b: 2.0,
            female_fraction_k: 0.22,
            reference_initiation_a: 21.28,
            reference_initiation_b: 1.56,
            reference_initiation_c: 0.24,
            onset_time: 28.0,
            onset_steepness: 0.1,
            stress_female_fraction_asymptote: 0.6,
        }
    }
}

impl Validate for GenerativeParameters {
    fn validate(&self) -> PalmSimResult<()> {
        check_positive(
            "generative.bunch_development_asymptote_t0",
            self.bunch_development_asymptote_t0,
        )?;
        check_positive("generative.bunch_fm_to_dm_ratio", self.bunch_fm_to_dm_ratio)?;
        check_positive("generative.reference_initiation_a", self.reference_initiation_a)?;
        check_non_negative("generative.onset_steepness", self.onset_steepness)?;
        check_non_negative(
            "generative.stress_female_fraction_asymptote",
            self.stress_female_fraction_asymptote,
        )
    }
}

/// Parameters of indeterminate (not yet sex-differentiated) cohorts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndeterminateParameters {
    /// Asymptotic fresh bunch mass, $a$ in $a(1 - e^{-bx})$
    /// unit: kg_FM
    /// default: 31
    pub potential_mass_a: FloatValue,
    /// unit: 1/year
    /// default: 0.10
    pub potential_mass_b: FloatValue,
    /// Age of sex differentiation
    /// unit: fraction of t_maturity
    /// default: 0.2
    pub t_differentiation: FloatValue,
}

impl Default for IndeterminateParameters {
    fn default() -> Self {
        Self {
            potential_mass_a: 31.0,
            potential_mass_b: 0.10,
            t_differentiation: 0.2,
        }
    }
}

impl Validate for IndeterminateParameters {
    fn validate(&self) -> PalmSimResult<()> {
        check_non_negative("indeterminate.potential_mass_a", self.potential_mass_a)?;
        check_non_negative("indeterminate.potential_mass_b", self.potential_mass_b)?;
        check_fraction("indeterminate.t_differentiation", self.t_differentiation)
    }
}

/// Parameters of female cohorts.
///
/// Event times are fractions of the cohort's maturity time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FemaleParameters {
    /// unit: fraction of t_maturity
    /// default: 0.82
    pub t_anthesis: FloatValue,
    /// unit: fraction of t_maturity
    /// default: 0.75
    pub inflorescence_abortion_t0: FloatValue,
    /// unit: fraction of t_maturity
    /// default: 0.03
    pub inflorescence_abortion_dt: FloatValue,
    /// unit: fraction of t_maturity
    /// default: 0.92
    pub bunch_failure_t0: FloatValue,
    /// unit: fraction of t_maturity
    /// default: 0.03
    pub bunch_failure_dt: FloatValue,
    /// unit: 1/day
    /// default: 0.95
    pub stress_inflorescence_abortion_asymptote: FloatValue,
    /// unit: 1/day
    /// default: 0.95
    pub stress_bunch_failure_asymptote: FloatValue,
    /// default: true
    pub enable_inflorescence_abortion: bool,
    /// default: true
    pub enable_bunch_failure: bool,
}

impl Default for FemaleParameters {
    fn default() -> Self {
        Self {
            t_anthesis: 0.82,
            inflorescence_abortion_t0: 0.75,
            inflorescence_abortion_dt: 0.03,
            bunch_failure_t0: 0.92,
            bunch_failure_dt: 0.03,
            stress_inflorescence_abortion_asymptote: 0.95,
            stress_bunch_failure_asymptote: 0.95,
            enable_inflorescence_abortion: true,
            enable_bunch_failure: true,
        }
    }
}

impl Validate for FemaleParameters {
    fn validate(&self) -> PalmSimResult<()> {
        check_fraction("female.t_anthesis", self.t_anthesis)?;
        check_fraction("female.inflorescence_abortion_t0", self.inflorescence_abortion_t0)?;
        check_non_negative("female.inflorescence_abortion_dt", self.inflorescence_abortion_dt)?;
        check_fraction("female.bunch_failure_t0", self.bunch_failure_t0)?;
        check_non_negative("female.bunch_failure_dt", self.bunch_failure_dt)?;
        check_non_negative(
            "female.stress_inflorescence_abortion_asymptote",
            self.stress_inflorescence_abortion_asymptote,
        )?;
        check_non_negative(
            "female.stress_bunch_failure_asymptote",
            self.stress_bunch_failure_asymptote,
        )
    }
}
