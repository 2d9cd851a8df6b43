//! Roots
//!
//! Root mass turns over at a fixed fraction of the standing mass per day.
//! The potential growth rate is the age-dependent rate interpolated through
//! control points plus the turnover, so a well-supplied root system keeps
//! its growth curve.

use super::Organ;
use crate::parameters::RootParameters;
use palmsim_core::define_static_variable;
use palmsim_core::errors::{ensure_non_negative, PalmSimResult};
use palmsim_core::interpolate::NaturalCubicSpline;
use palmsim_core::timestep::{FloatValue, StepContext};
use palmsim_core::variable::{Reportable, ReportedValue};
use serde::{Deserialize, Serialize};

/// Roots of a hectare of palms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roots {
    parameters: RootParameters,
    potential_growth: NaturalCubicSpline,
    /// unit: kg_DM/ha
    mass: FloatValue,
    /// unit: kg_CH2O/ha/day
    assim_growth: FloatValue,
}

impl Roots {
    pub fn from_parameters(
        parameters: RootParameters,
        planting_density: FloatValue,
    ) -> PalmSimResult<Self> {
        let potential_growth = NaturalCubicSpline::new(&parameters.potential_growth_curve)?;
        Ok(Self {
            mass: planting_density * parameters.initial_mass_per_palm,
            potential_growth,
            parameters,
            assim_growth: 0.0,
        })
    }

    pub fn parameters(&self) -> &RootParameters {
        &self.parameters
    }

    /// unit: kg_DM/palm/year
    pub fn potential_growth_rate_per_palm(&self, context: &StepContext) -> FloatValue {
        self.potential_growth.evaluate(context.years_after_planting())
    }

    /// Potential growth including replacement of turnover (kg_DM/ha/day).
    pub fn potential_growth_rate(&self, context: &StepContext) -> FloatValue {
        let growth = context.planting_density * self.potential_growth_rate_per_palm(context)
            / context.days_in_year;
        growth.max(0.0) + self.mass_loss_rate()
    }

    /// unit: kg_DM/ha/day
    pub fn mass_growth_rate(&self) -> FloatValue {
        self.parameters.conversion_efficiency * self.assim_growth
    }

    /// Turnover (kg_DM/ha/day).
    pub fn mass_loss_rate(&self) -> FloatValue {
        self.parameters.loss_param * self.mass
    }

    pub fn mass_per_palm(&self, context: &StepContext) -> FloatValue {
        self.mass / context.planting_density
    }
}

impl Organ for Roots {
    fn name(&self) -> &'static str {
        "roots"
    }

    fn mass(&self) -> FloatValue {
        self.mass
    }

    fn potential_sink_strength(&self, context: &StepContext) -> FloatValue {
        self.potential_growth_rate(context) / self.parameters.conversion_efficiency
    }

    fn maintenance_requirement(&self) -> FloatValue {
        self.parameters.specific_maintenance * self.mass
    }

    fn set_assim_growth(&mut self, assim_growth: FloatValue) {
        self.assim_growth = assim_growth;
    }

    fn assim_growth(&self) -> FloatValue {
        self.assim_growth
    }

    fn update(&mut self, context: &StepContext) -> PalmSimResult<()> {
        let mass_change = self.mass_growth_rate() - self.mass_loss_rate();
        self.mass += mass_change * context.dt;
        ensure_non_negative("roots", "mass", self.mass)
    }
}

define_static_variable!(

    VAR_ROOTS_MASS,

    name = "roots_mass",

    unit = "kg_DM/ha",

    description = "Dry mass of the roots",

);
define_static_variable!(
    VAR_ROOTS_MASS_PER_PALM,
    name = "roots_mass_per_palm",
    unit = "kg_DM/palm",
    description = "Root dry mass per palm",
);
define_static_variable!(
    VAR_ROOTS_MASS_LOSS_RATE,
    name = "roots_mass_loss_rate",
    unit = "kg_DM/ha/day",
    description = "Root turnover",
);
define_static_variable!(
    VAR_ROOTS_POTENTIAL_GROWTH_RATE,
    name = "roots_potential_growth_rate",
    unit = "kg_DM/ha/day",
    description = "Potential root growth rate",
);
define_static_variable!(
    VAR_ROOTS_ASSIM_GROWTH,
    name = "roots_assim_growth",
    unit = "kg_CH2O/ha/day",
    description = "Assimilates allocated to root growth",
);
define_static_variable!(
    VAR_ROOTS_POTENTIAL_SINK,
    name = "roots_potential_sink_strength",
    unit = "kg_CH2O/ha/day",
    description = "Potential sink strength of the roots",
);
define_static_variable!(
    VAR_ROOTS_MAINTENANCE,
    name = "roots_maintenance_requirement",
    unit = "kg_CH2O/ha/day",
    description = "Maintenance requirement of the roots",
);

impl Reportable for Roots {
    fn report(&self, context: &StepContext) -> Vec<ReportedValue> {
        vec![
            VAR_ROOTS_MASS.report(self.mass),
            VAR_ROOTS_MASS_PER_PALM.report(self.mass_per_palm(context)),
            VAR_ROOTS_MASS_LOSS_RATE.report(self.mass_loss_rate()),
            VAR_ROOTS_POTENTIAL_GROWTH_RATE.report(self.potential_growth_rate(context)),
            VAR_ROOTS_ASSIM_GROWTH.report(self.assim_growth),
            VAR_ROOTS_POTENTIAL_SINK.report(self.potential_sink_strength(context)),
            VAR_ROOTS_MAINTENANCE.report(self.maintenance_requirement()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn roots() -> Roots {
        Roots::from_parameters(RootParameters::default(), 143.0).unwrap()
    }

    #[test]
    fn turnover_is_included_in_potential_growth() {
        let roots = roots();
        let ctx = StepContext::standalone();
        let curve_only = 143.0 * roots.potential_growth_rate_per_palm(&ctx) / 365.0;
        assert_relative_eq!(
            roots.potential_growth_rate(&ctx),
            curve_only + roots.mass_loss_rate()
        );
    }

    #[test]
    fn starved_roots_decay_without_going_negative() {
        let mut roots = roots();
        let ctx = StepContext::standalone().with_dt(10.0);
        let initial = roots.mass();
        for _ in 0..100 {
            roots.update(&ctx).unwrap();
        }
        assert!(roots.mass() < initial);
        assert!(roots.mass() > 0.0);
    }

    #[test]
    fn maintenance_is_proportional_to_mass() {
        let roots = roots();
        assert_relative_eq!(roots.maintenance_requirement(), 0.0022 * 14.3, epsilon = 1e-12);
    }
}
