//! Trunk
//!
//! The trunk grows towards an age-dependent potential rate (Corley et al.,
//! 1971) interpolated through a handful of control points. Part of the trunk
//! lignifies over time; lignified tissue no longer needs maintenance.
//!
//! # Algorithm
//!
//! Trunk density rises linearly with age, $\rho(t) = a t + b$, so the trunk
//! volume is $V = M / \rho$. Lignified mass accumulates at
//!
//! $$ \frac{dM_{lig}}{dt} = V \frac{c_{lig}}{d_{month}} $$
//!
//! Each increment is capped at the non-lignified mass, so lignified mass
//! never decreases, even when the trunk loses mass.

use super::Organ;
use crate::parameters::TrunkParameters;
use palmsim_core::define_static_variable;
use palmsim_core::errors::{ensure_non_negative, PalmSimResult};
use palmsim_core::interpolate::NaturalCubicSpline;
use palmsim_core::timestep::{FloatValue, StepContext};
use palmsim_core::variable::{Reportable, ReportedValue};
use serde::{Deserialize, Serialize};

/// Trunks of a hectare of palms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trunk {
    parameters: TrunkParameters,
    potential_growth: NaturalCubicSpline,
    /// unit: kg_DM/ha
    mass: FloatValue,
    /// unit: kg_DM/ha
    lignified_mass: FloatValue,
    /// unit: kg_CH2O/ha/day
    assim_growth: FloatValue,
}

impl Trunk {
    /// Trunks of a freshly planted stand of `planting_density` palms/ha.
    ///
    /// Fails when the potential growth control points do not define a spline.
    pub fn from_parameters(
        parameters: TrunkParameters,
        planting_density: FloatValue,
    ) -> PalmSimResult<Self> {
        let potential_growth = NaturalCubicSpline::new(&parameters.potential_growth_curve)?;
        Ok(Self {
            mass: planting_density * parameters.initial_mass_per_palm,
            lignified_mass: 0.0,
            potential_growth,
            parameters,
            assim_growth: 0.0,
        })
    }

    pub fn parameters(&self) -> &TrunkParameters {
        &self.parameters
    }

    /// unit: kg_DM/ha
    pub fn lignified_mass(&self) -> FloatValue {
        self.lignified_mass
    }

    /// Potential growth rate per palm (kg_DM/palm/year).
    pub fn potential_growth_rate_per_palm(&self, context: &StepContext) -> FloatValue {
        self.potential_growth
            .evaluate(context.years_after_planting())
    }

    /// Potential growth rate (kg_DM/ha/day), never negative.
    pub fn potential_growth_rate(&self, context: &StepContext) -> FloatValue {
        (context.planting_density * self.potential_growth_rate_per_palm(context)
            / context.days_in_year)
            .max(0.0)
    }

    /// unit: kg_DM/ha/day
    pub fn mass_growth_rate(&self) -> FloatValue {
        self.parameters.conversion_efficiency * self.assim_growth
    }

    /// unit: kg_DM/ha/day
    pub fn mass_loss_rate(&self) -> FloatValue {
        self.parameters.mass_loss_rate
    }

    /// unit: kg/m3
    pub fn density(&self, context: &StepContext) -> FloatValue {
        self.parameters.density_a * context.years_after_planting() + self.parameters.density_b
    }

    /// unit: m3/ha
    pub fn volume(&self, context: &StepContext) -> FloatValue {
        self.mass / self.density(context)
    }

    /// unit: kg_DM/ha/day
    pub fn lignified_mass_change_rate(&self, context: &StepContext) -> FloatValue {
        self.volume(context) * self.parameters.lignification_rate / context.days_in_month
    }

    pub fn mass_per_palm(&self, context: &StepContext) -> FloatValue {
        self.mass / context.planting_density
    }
}

impl Organ for Trunk {
    fn name(&self) -> &'static str {
        "trunk"
    }

    fn mass(&self) -> FloatValue {
        self.mass
    }

    fn potential_sink_strength(&self, context: &StepContext) -> FloatValue {
        self.potential_growth_rate(context) / self.parameters.conversion_efficiency
    }

    /// Only the living, non-lignified part of the trunk is maintained.
    fn maintenance_requirement(&self) -> FloatValue {
        self.parameters.specific_maintenance * (self.mass - self.lignified_mass).max(0.0)
    }

    fn set_assim_growth(&mut self, assim_growth: FloatValue) {
        self.assim_growth = assim_growth;
    }

    fn assim_growth(&self) -> FloatValue {
        self.assim_growth
    }

    fn update(&mut self, context: &StepContext) -> PalmSimResult<()> {
        let lignification = self.lignified_mass_change_rate(context);
        let mass_change = self.mass_growth_rate() - self.mass_loss_rate();

        self.mass += mass_change * context.dt;
        ensure_non_negative("trunk", "mass", self.mass)?;
        let headroom = (self.mass - self.lignified_mass).max(0.0);
        self.lignified_mass += (lignification * context.dt).min(headroom);
        Ok(())
    }
}

define_static_variable!(

    VAR_TRUNK_MASS,

    name = "trunk_mass",

    unit = "kg_DM/ha",

    description = "Dry mass of the trunk",

);
define_static_variable!(
    VAR_TRUNK_MASS_PER_PALM,
    name = "trunk_mass_per_palm",
    unit = "kg_DM/palm",
    description = "Trunk dry mass per palm",
);
define_static_variable!(
    VAR_TRUNK_LIGNIFIED_MASS,
    name = "trunk_lignified_mass",
    unit = "kg_DM/ha",
    description = "Lignified trunk dry mass",
);
define_static_variable!(
    VAR_TRUNK_DENSITY,
    name = "trunk_density",
    unit = "kg/m3",
    description = "Trunk density",
);
define_static_variable!(
    VAR_TRUNK_VOLUME,
    name = "trunk_volume",
    unit = "m3/ha",
    description = "Trunk volume",
);
define_static_variable!(
    VAR_TRUNK_POTENTIAL_GROWTH_RATE,
    name = "trunk_potential_growth_rate",
    unit = "kg_DM/ha/day",
    description = "Potential trunk growth rate",
);
define_static_variable!(
    VAR_TRUNK_ASSIM_GROWTH,
    name = "trunk_assim_growth",
    unit = "kg_CH2O/ha/day",
    description = "Assimilates allocated to trunk growth",
);
define_static_variable!(
    VAR_TRUNK_POTENTIAL_SINK,
    name = "trunk_potential_sink_strength",
    unit = "kg_CH2O/ha/day",
    description = "Potential sink strength of the trunk",
);
define_static_variable!(
    VAR_TRUNK_MAINTENANCE,
    name = "trunk_maintenance_requirement",
    unit = "kg_CH2O/ha/day",
    description = "Maintenance requirement of the trunk",
);

impl Reportable for Trunk {
    fn report(&self, context: &StepContext) -> Vec<ReportedValue> {
        vec![
            VAR_TRUNK_MASS.report(self.mass),
            VAR_TRUNK_MASS_PER_PALM.report(self.mass_per_palm(context)),
            VAR_TRUNK_LIGNIFIED_MASS.report(self.lignified_mass),
            VAR_TRUNK_DENSITY.report(self.density(context)),
            VAR_TRUNK_VOLUME.report(self.volume(context)),
            VAR_TRUNK_POTENTIAL_GROWTH_RATE.report(self.potential_growth_rate(context)),
            VAR_TRUNK_ASSIM_GROWTH.report(self.assim_growth),
            VAR_TRUNK_POTENTIAL_SINK.report(self.potential_sink_strength(context)),
            VAR_TRUNK_MAINTENANCE.report(self.maintenance_requirement()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn trunk() -> Trunk {
        Trunk::from_parameters(TrunkParameters::default(), 143.0).unwrap()
    }

    #[test]
    fn potential_growth_passes_through_control_points() {
        let trunk = trunk();
        let ctx = StepContext::standalone().at_age(9.0 * 365.0);
        assert_relative_eq!(trunk.potential_growth_rate_per_palm(&ctx), 22.8, epsilon = 1e-9);
        assert_relative_eq!(
            trunk.potential_growth_rate(&ctx),
            143.0 * 22.8 / 365.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn invalid_curve_is_rejected() {
        let parameters = TrunkParameters {
            potential_growth_curve: vec![[0.0, 1.0]],
            ..TrunkParameters::default()
        };
        assert!(Trunk::from_parameters(parameters, 143.0).is_err());
    }

    #[test]
    fn lignified_mass_never_exceeds_mass() {
        let mut trunk = trunk();
        let ctx = StepContext::standalone().with_dt(30.0);
        let parameters = TrunkParameters {
            lignification_rate: 1000.0,
            ..TrunkParameters::default()
        };
        trunk.parameters = parameters;
        for _ in 0..5 {
            trunk.update(&ctx).unwrap();
            assert!(trunk.lignified_mass() <= trunk.mass());
        }
        assert_eq!(trunk.maintenance_requirement(), 0.0);
    }

    #[test]
    fn growth_increases_mass() {
        let mut trunk = trunk();
        let ctx = StepContext::standalone().with_dt(10.0);
        let before = trunk.mass();
        trunk.set_assim_growth(5.0);
        trunk.update(&ctx).unwrap();
        assert_relative_eq!(trunk.mass(), before + 0.69 * 5.0 * 10.0);
        assert!(trunk.lignified_mass() > 0.0);
    }

    #[test]
    fn mass_loss_beyond_mass_is_fatal() {
        let mut trunk = Trunk::from_parameters(
            TrunkParameters {
                mass_loss_rate: 100.0,
                ..TrunkParameters::default()
            },
            143.0,
        )
        .unwrap();
        let err = trunk.update(&StepContext::standalone()).unwrap_err();
        assert!(err.to_string().contains("trunk"));
    }

    #[test]
    fn lignified_mass_survives_mass_loss() {
        let mut trunk = Trunk::from_parameters(
            TrunkParameters {
                mass_loss_rate: 0.5,
                lignification_rate: 1000.0,
                ..TrunkParameters::default()
            },
            143.0,
        )
        .unwrap();
        let ctx = StepContext::standalone().with_dt(10.0).at_age(2.0 * 365.0);

        let mut previous = trunk.lignified_mass();
        for step in 0..40 {
            trunk.set_assim_growth(if step < 10 { 5.0 } else { 0.0 });
            trunk.update(&ctx).unwrap();
            assert!(
                trunk.lignified_mass() >= previous,
                "lignified mass decreased from {} to {} at step {}",
                previous,
                trunk.lignified_mass(),
                step
            );
            previous = trunk.lignified_mass();
        }
        assert!(trunk.mass() < previous, "trunk should have lost mass below its lignified part");
    }
}
