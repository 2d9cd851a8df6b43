//! Partitioning of the palm's assimilate supply.
//!
//! # Algorithm
//!
//! Maintenance of every organ and cohort is paid first. What remains is
//! the growth pool:
//!
//! $$ G = \max(0,\ S - M) $$
//!
//! The growth pool is split between the vegetative sinks (fronds, trunk,
//! roots) and the generative sink with the blended partitioning rule,
//! vegetative first, weighted by `vegetative_priority`. The vegetative share
//! is then divided in proportion to the organs' potential sink strengths.
//! The generative share never exceeds the generative potential sink
//! strength.

use crate::parameters::AssimilateParameters;
use palmsim_core::define_static_variable;
use palmsim_core::errors::PalmSimResult;
use palmsim_core::partitioning::{parametrized, relative_shares};
use palmsim_core::timestep::{FloatValue, StepContext};
use palmsim_core::variable::{Reportable, ReportedValue};
use serde::{Deserialize, Serialize};

/// Demand of one sink for the coming step.
///
/// unit: kg_CH2O/ha/day
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SinkDemand {
    pub potential_sink_strength: FloatValue,
    pub maintenance_requirement: FloatValue,
}

impl SinkDemand {
    pub fn new(potential_sink_strength: FloatValue, maintenance_requirement: FloatValue) -> Self {
        Self {
            potential_sink_strength,
            maintenance_requirement,
        }
    }
}

/// Demands of the four sinks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SinkDemands {
    pub fronds: SinkDemand,
    pub trunk: SinkDemand,
    pub roots: SinkDemand,
    pub generative: SinkDemand,
}

impl SinkDemands {
    pub fn vegetative_sink_strength(&self) -> FloatValue {
        self.fronds.potential_sink_strength
            + self.trunk.potential_sink_strength
            + self.roots.potential_sink_strength
    }

    pub fn vegetative_maintenance(&self) -> FloatValue {
        self.fronds.maintenance_requirement
            + self.trunk.maintenance_requirement
            + self.roots.maintenance_requirement
    }

    pub fn total_maintenance(&self) -> FloatValue {
        self.vegetative_maintenance() + self.generative.maintenance_requirement
    }

    pub fn total_sink_strength(&self) -> FloatValue {
        self.vegetative_sink_strength() + self.generative.potential_sink_strength
    }
}

/// Growth assimilates handed to each sink.
///
/// unit: kg_CH2O/ha/day
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub fronds: FloatValue,
    pub trunk: FloatValue,
    pub roots: FloatValue,
    pub generative: FloatValue,
}

impl Allocation {
    pub fn vegetative(&self) -> FloatValue {
        self.fronds + self.trunk + self.roots
    }

    pub fn total(&self) -> FloatValue {
        self.vegetative() + self.generative
    }
}

/// Splits the assimilate supply among the palm's sinks.
///
/// Holds the last step's supply, demands and allocation for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssimilatePartitioner {
    parameters: AssimilateParameters,
    /// unit: kg_CH2O/ha/day
    produced: FloatValue,
    demands: SinkDemands,
    allocation: Allocation,
}

impl AssimilatePartitioner {
    pub fn new() -> Self {
        Self::from_parameters(AssimilateParameters::default())
    }

    pub fn from_parameters(parameters: AssimilateParameters) -> Self {
        Self {
            parameters,
            produced: 0.0,
            demands: SinkDemands::default(),
            allocation: Allocation::default(),
        }
    }

    pub fn parameters(&self) -> &AssimilateParameters {
        &self.parameters
    }

    /// Growth pool left after maintenance, never negative.
    pub fn growth_pool(supply: FloatValue, maintenance: FloatValue) -> FloatValue {
        (supply - maintenance).max(0.0)
    }

    /// Split `supply` (kg_CH2O/ha/day) among the sinks in `demands`.
    pub fn allocate(
        &mut self,
        supply: FloatValue,
        demands: SinkDemands,
    ) -> PalmSimResult<Allocation> {
        let growth = Self::growth_pool(supply, demands.total_maintenance());
        let generative_potential = demands.generative.potential_sink_strength;
        let split = parametrized(
            growth,
            &[demands.vegetative_sink_strength(), generative_potential],
            self.parameters.vegetative_priority,
        )?;
        let vegetative = split[0].max(0.0);
        let generative = split[1].min(generative_potential);

        let shares = relative_shares(&[
            demands.fronds.potential_sink_strength,
            demands.trunk.potential_sink_strength,
            demands.roots.potential_sink_strength,
        ]);
        let allocation = Allocation {
            fronds: shares[0] * vegetative,
            trunk: shares[1] * vegetative,
            roots: shares[2] * vegetative,
            generative,
        };

        self.produced = supply;
        self.demands = demands;
        self.allocation = allocation;
        Ok(allocation)
    }

    pub fn allocation(&self) -> &Allocation {
        &self.allocation
    }

    pub fn demands(&self) -> &SinkDemands {
        &self.demands
    }

    pub fn produced(&self) -> FloatValue {
        self.produced
    }

    pub fn growth_total(&self) -> FloatValue {
        Self::growth_pool(self.produced, self.demands.total_maintenance())
    }
}

impl Default for AssimilatePartitioner {
    fn default() -> Self {
        Self::new()
    }
}

define_static_variable!(

    VAR_ASSIM_PRODUCED,

    name = "assimilates_produced",

    unit = "kg_CH2O/ha/day",

    description = "Gross assimilate production",

);
define_static_variable!(
    VAR_ASSIM_MAINTENANCE_TOTAL,
    name = "assimilates_maintenance_total",
    unit = "kg_CH2O/ha/day",
    description = "Maintenance requirement of all sinks",
);
define_static_variable!(
    VAR_ASSIM_MAINTENANCE_VEGETATIVE,
    name = "assimilates_maintenance_vegetative",
    unit = "kg_CH2O/ha/day",
    description = "Maintenance requirement of the vegetative organs",
);
define_static_variable!(
    VAR_ASSIM_MAINTENANCE_GENERATIVE,
    name = "assimilates_maintenance_generative",
    unit = "kg_CH2O/ha/day",
    description = "Maintenance requirement of the inflorescences",
);
define_static_variable!(
    VAR_ASSIM_GROWTH_TOTAL,
    name = "assimilates_growth_total",
    unit = "kg_CH2O/ha/day",
    description = "Assimilates available for growth",
);
define_static_variable!(
    VAR_ASSIM_GROWTH_VEGETATIVE,
    name = "assimilates_growth_vegetative",
    unit = "kg_CH2O/ha/day",
    description = "Growth assimilates for the vegetative organs",
);
define_static_variable!(
    VAR_ASSIM_GROWTH_FRONDS,
    name = "assimilates_growth_fronds",
    unit = "kg_CH2O/ha/day",
    description = "Growth assimilates for the fronds",
);
define_static_variable!(
    VAR_ASSIM_GROWTH_TRUNK,
    name = "assimilates_growth_trunk",
    unit = "kg_CH2O/ha/day",
    description = "Growth assimilates for the trunk",
);
define_static_variable!(
    VAR_ASSIM_GROWTH_ROOTS,
    name = "assimilates_growth_roots",
    unit = "kg_CH2O/ha/day",
    description = "Growth assimilates for the roots",
);
define_static_variable!(
    VAR_ASSIM_GROWTH_GENERATIVE,
    name = "assimilates_growth_generative",
    unit = "kg_CH2O/ha/day",
    description = "Growth assimilates for the inflorescences",
);
define_static_variable!(
    VAR_ASSIM_SINK_VEGETATIVE,
    name = "assimilates_potential_sink_strength_vegetative",
    unit = "kg_CH2O/ha/day",
    description = "Potential sink strength of the vegetative organs",
);
define_static_variable!(
    VAR_ASSIM_SINK_GENERATIVE,
    name = "assimilates_potential_sink_strength_generative",
    unit = "kg_CH2O/ha/day",
    description = "Potential sink strength of the inflorescences",
);
define_static_variable!(
    VAR_ASSIM_SINK_TOTAL,
    name = "assimilates_potential_sink_strength_total",
    unit = "kg_CH2O/ha/day",
    description = "Potential sink strength of all sinks",
);

impl Reportable for AssimilatePartitioner {
    fn report(&self, _context: &StepContext) -> Vec<ReportedValue> {
        vec![
            VAR_ASSIM_PRODUCED.report(self.produced),
            VAR_ASSIM_MAINTENANCE_TOTAL.report(self.demands.total_maintenance()),
            VAR_ASSIM_MAINTENANCE_VEGETATIVE.report(self.demands.vegetative_maintenance()),
            VAR_ASSIM_MAINTENANCE_GENERATIVE
                .report(self.demands.generative.maintenance_requirement),
            VAR_ASSIM_GROWTH_TOTAL.report(self.growth_total()),
            VAR_ASSIM_GROWTH_VEGETATIVE.report(self.allocation.vegetative()),
            VAR_ASSIM_GROWTH_FRONDS.report(self.allocation.fronds),
            VAR_ASSIM_GROWTH_TRUNK.report(self.allocation.trunk),
            VAR_ASSIM_GROWTH_ROOTS.report(self.allocation.roots),
            VAR_ASSIM_GROWTH_GENERATIVE.report(self.allocation.generative),
            VAR_ASSIM_SINK_VEGETATIVE.report(self.demands.vegetative_sink_strength()),
            VAR_ASSIM_SINK_GENERATIVE.report(self.demands.generative.potential_sink_strength),
            VAR_ASSIM_SINK_TOTAL.report(self.demands.total_sink_strength()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use palmsim_core::errors::PalmSimError;

    fn demands(
        fronds: FloatValue,
        trunk: FloatValue,
        roots: FloatValue,
        generative: FloatValue,
    ) -> SinkDemands {
        SinkDemands {
            fronds: SinkDemand::new(fronds, 10.0),
            trunk: SinkDemand::new(trunk, 5.0),
            roots: SinkDemand::new(roots, 5.0),
            generative: SinkDemand::new(generative, 0.0),
        }
    }

    #[test]
    fn maintenance_is_paid_first() {
        let mut partitioner = AssimilatePartitioner::new();
        let allocation = partitioner.allocate(15.0, demands(60.0, 20.0, 20.0, 50.0)).unwrap();
        assert_eq!(allocation.total(), 0.0);
        assert_eq!(partitioner.growth_total(), 0.0);
    }

    #[test]
    fn allocation_conserves_growth_pool_when_demand_exceeds_supply() {
        let mut partitioner = AssimilatePartitioner::new();
        let allocation = partitioner.allocate(120.0, demands(60.0, 20.0, 20.0, 50.0)).unwrap();
        // 100 of growth: prioritized [100, 0], proportionate [66.7, 33.3]
        assert_relative_eq!(allocation.total(), 100.0, epsilon = 1e-9);
        assert_relative_eq!(allocation.vegetative(), 0.8 * 100.0 + 0.2 * 100.0 * 100.0 / 150.0);
        assert!(allocation.generative <= 50.0);
    }

    #[test]
    fn vegetative_split_follows_sink_strength() {
        let mut partitioner = AssimilatePartitioner::new();
        let allocation = partitioner.allocate(120.0, demands(60.0, 20.0, 20.0, 50.0)).unwrap();
        assert_relative_eq!(allocation.fronds, 0.6 * allocation.vegetative(), epsilon = 1e-12);
        assert_relative_eq!(allocation.trunk, allocation.roots, epsilon = 1e-12);
    }

    #[test]
    fn generative_is_capped_by_its_potential() {
        let mut partitioner = AssimilatePartitioner::new();
        let allocation = partitioner.allocate(1020.0, demands(60.0, 20.0, 20.0, 50.0)).unwrap();
        assert_relative_eq!(allocation.generative, 50.0);
        assert!(allocation.vegetative() > 100.0);
    }

    #[test]
    fn full_priority_serves_vegetative_first() {
        let mut partitioner = AssimilatePartitioner::from_parameters(AssimilateParameters {
            vegetative_priority: 1.0,
        });
        let allocation = partitioner.allocate(100.0, demands(60.0, 20.0, 20.0, 50.0)).unwrap();
        assert_relative_eq!(allocation.vegetative(), 80.0);
        assert_eq!(allocation.generative, 0.0);
    }

    #[test]
    fn zero_total_demand_fails() {
        let mut partitioner = AssimilatePartitioner::new();
        let err = partitioner
            .allocate(100.0, demands(0.0, 0.0, 0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, PalmSimError::ZeroTotalDemand { .. }));
    }

    #[test]
    fn reports_every_pool() {
        let mut partitioner = AssimilatePartitioner::new();
        partitioner.allocate(120.0, demands(60.0, 20.0, 20.0, 50.0)).unwrap();
        let report = partitioner.report(&StepContext::standalone());
        assert_eq!(report.len(), 13);
        assert!(report
            .iter()
            .any(|r| r.key() == "assimilates_growth_total (kg_CH2O/ha/day)" && r.value == 100.0));
    }
}
