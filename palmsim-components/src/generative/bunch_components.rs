//! Sub-organs of an inflorescence: stalk, mesocarp fibers, mesocarp oil and
//! kernel.
//!
//! Each component grows along a quadratic potential growth curve whose
//! window is a fixed share of the cohort's maturity time and whose integral
//! is the component's potential mass. Realised growth never exceeds the
//! potential; allocated assimilates beyond it are lost.

use crate::parameters::BunchComponentParameters;
use palmsim_core::errors::{ensure_non_negative, PalmSimResult};
use palmsim_core::interpolate::QuadraticPulse;
use palmsim_core::timestep::FloatValue;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BunchComponentKind {
    Stalk,
    MesocarpFibers,
    MesocarpOil,
    Kernel,
}

impl BunchComponentKind {
    pub fn name(&self) -> &'static str {
        match self {
            BunchComponentKind::Stalk => "stalk",
            BunchComponentKind::MesocarpFibers => "mesocarp_fibers",
            BunchComponentKind::MesocarpOil => "mesocarp_oil",
            BunchComponentKind::Kernel => "kernel",
        }
    }
}

impl fmt::Display for BunchComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One component of the mean inflorescence of a cohort.
///
/// Quantities are per inflorescence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BunchComponent {
    kind: BunchComponentKind,
    parameters: BunchComponentParameters,
    potential_growth: QuadraticPulse,
    /// unit: kg_DM
    potential_mass: FloatValue,
    /// unit: kg_DM
    mass: FloatValue,
    /// unit: day
    age: FloatValue,
    /// Potential sink strength at the current age
    /// unit: kg_CH2O/day
    potential_sink_strength: FloatValue,
    /// Last realised growth
    /// unit: kg_DM/day
    mass_growth_rate: FloatValue,
}

impl BunchComponent {
    /// A component of an inflorescence with potential mass
    /// `bunch_potential_mass` and maturity time `t_maturity` (days).
    pub fn new(
        kind: BunchComponentKind,
        parameters: BunchComponentParameters,
        bunch_potential_mass: FloatValue,
        t_maturity: FloatValue,
        age: FloatValue,
    ) -> PalmSimResult<Self> {
        let potential_mass = parameters.potential_mass_fraction * bunch_potential_mass;
        let potential_growth = QuadraticPulse::new(
            parameters.t_growth_start * t_maturity,
            parameters.t_growth_end * t_maturity,
            potential_mass,
        )?;
        let mut component = Self {
            kind,
            parameters,
            potential_growth,
            potential_mass,
            mass: 0.0,
            age,
            potential_sink_strength: 0.0,
            mass_growth_rate: 0.0,
        };
        component.potential_sink_strength = component.compute_potential_sink_strength();
        Ok(component)
    }

    pub fn kind(&self) -> BunchComponentKind {
        self.kind
    }

    pub fn mass(&self) -> FloatValue {
        self.mass
    }

    pub fn potential_mass(&self) -> FloatValue {
        self.potential_mass
    }

    pub fn age(&self) -> FloatValue {
        self.age
    }

    /// Potential growth rate at the current age (kg_DM/day).
    pub fn mass_growth_rate_potential(&self) -> FloatValue {
        self.potential_growth.rate(self.age)
    }

    pub fn mass_growth_rate(&self) -> FloatValue {
        self.mass_growth_rate
    }

    /// unit: kg_CH2O/day
    pub fn potential_sink_strength(&self) -> FloatValue {
        self.potential_sink_strength
    }

    fn compute_potential_sink_strength(&self) -> FloatValue {
        self.mass_growth_rate_potential() / self.parameters.conversion_efficiency
    }

    /// unit: kg_CH2O/day
    pub fn maintenance_requirement(&self) -> FloatValue {
        self.parameters.specific_maintenance * self.mass
    }

    /// Grow on `assim_growth` (kg_CH2O/day) for `dt` days at the current age.
    pub fn grow(&mut self, assim_growth: FloatValue, dt: FloatValue) -> PalmSimResult<()> {
        let realised = self.parameters.conversion_efficiency * assim_growth;
        self.mass_growth_rate = realised.min(self.mass_growth_rate_potential());
        self.mass += self.mass_growth_rate * dt;
        ensure_non_negative(self.kind.name(), "mass", self.mass)
    }

    /// Advance the age and refresh the potential sink strength.
    pub fn advance_age(&mut self, dt: FloatValue) {
        self.age += dt;
        self.potential_sink_strength = self.compute_potential_sink_strength();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stalk() -> BunchComponent {
        BunchComponent::new(
            BunchComponentKind::Stalk,
            BunchComponentParameters::stalk(),
            10.0,
            1000.0,
            0.0,
        )
        .unwrap()
    }

    #[test]
    fn potential_mass_is_share_of_bunch() {
        assert_relative_eq!(stalk().potential_mass(), 2.5);
    }

    #[test]
    fn growth_is_capped_by_potential() {
        let mut component = stalk();
        component.advance_age(375.0);
        let potential = component.mass_growth_rate_potential();
        component.grow(1e6, 1.0).unwrap();
        assert_relative_eq!(component.mass(), potential);
    }

    #[test]
    fn unlimited_supply_reaches_potential_mass() {
        let mut component = stalk();
        let dt = 1.0;
        for _ in 0..1000 {
            component.grow(1e6, dt).unwrap();
            component.advance_age(dt);
        }
        assert_relative_eq!(component.mass(), component.potential_mass(), epsilon = 1e-3);
    }

    #[test]
    fn no_growth_outside_window() {
        let mut component = BunchComponent::new(
            BunchComponentKind::Kernel,
            BunchComponentParameters::kernel(),
            10.0,
            1000.0,
            0.0,
        )
        .unwrap();
        assert_eq!(component.potential_sink_strength(), 0.0);
        component.grow(100.0, 10.0).unwrap();
        assert_eq!(component.mass(), 0.0);
    }

    #[test]
    fn copies_are_independent() {
        let mut original = stalk();
        original.advance_age(100.0);
        original.grow(1.0, 1.0).unwrap();
        let copy = original.clone();
        original.grow(1.0, 1.0).unwrap();
        assert!(copy.mass() < original.mass());
        assert_eq!(copy.age(), 100.0);
    }
}
