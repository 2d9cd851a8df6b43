//! Inflorescence cohorts.
//!
//! A cohort is a group of inflorescences initiated in the same step,
//! represented by its mean inflorescence. Cohorts start indeterminate and
//! differentiate into a female and a male cohort. Females gain fruit
//! components at anthesis and are harvested at maturity; males only carry a
//! stalk.
//!
//! ```text
//! Indeterminate ──(age >= t_differentiation)──> Female + Male
//! Female ──(age > t_anthesis)──> Female with fruit
//! ```
//!
//! Cohorts are removed purely on age. A female cohort aborted to zero
//! inflorescences stays in the population until it reaches maturity.

use super::bunch_components::{BunchComponent, BunchComponentKind};
use crate::parameters::{BunchComponentsParameters, FemaleParameters};
use palmsim_core::errors::{ensure_non_negative, PalmSimResult};
use palmsim_core::interpolate::curves::saturating;
use palmsim_core::timestep::FloatValue;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Inputs shared by every cohort during one population step.
#[derive(Debug, Clone, Copy)]
pub struct CohortStep<'a> {
    /// unit: day
    pub dt: FloatValue,
    /// Assimilates allocated to the whole population
    /// unit: kg_CH2O/ha/day
    pub generative_assim_growth: FloatValue,
    pub stress_index: FloatValue,
    pub components: &'a BunchComponentsParameters,
}

/// State common to every kind of cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortCore {
    /// unit: 1/ha
    num_inflorescences: FloatValue,
    /// unit: day
    age: FloatValue,
    /// Duration from initiation to harvest, fixed at creation
    /// unit: day
    t_maturity: FloatValue,
    /// Potential dry mass of the mean inflorescence, fixed at creation
    /// unit: kg_DM
    potential_mass: FloatValue,
    /// Share of the population's potential sink strength, frozen per step
    relative_sink_strength: FloatValue,
    /// Assimilates received in the last step
    /// unit: kg_CH2O/ha/day
    assim_growth: FloatValue,
    components: Vec<BunchComponent>,
}

impl CohortCore {
    fn new(
        num_inflorescences: FloatValue,
        t_maturity: FloatValue,
        potential_mass: FloatValue,
        components: &BunchComponentsParameters,
    ) -> PalmSimResult<Self> {
        let stalk = BunchComponent::new(
            BunchComponentKind::Stalk,
            components.stalk,
            potential_mass,
            t_maturity,
            0.0,
        )?;
        Ok(Self {
            num_inflorescences,
            age: 0.0,
            t_maturity,
            potential_mass,
            relative_sink_strength: 0.0,
            assim_growth: 0.0,
            components: vec![stalk],
        })
    }

    pub fn num_inflorescences(&self) -> FloatValue {
        self.num_inflorescences
    }

    pub fn age(&self) -> FloatValue {
        self.age
    }

    pub fn t_maturity(&self) -> FloatValue {
        self.t_maturity
    }

    pub fn potential_mass(&self) -> FloatValue {
        self.potential_mass
    }

    pub fn relative_sink_strength(&self) -> FloatValue {
        self.relative_sink_strength
    }

    pub fn components(&self) -> &[BunchComponent] {
        &self.components
    }

    pub fn component(&self, kind: BunchComponentKind) -> Option<&BunchComponent> {
        self.components.iter().find(|c| c.kind() == kind)
    }

    /// Mass of one component of the mean inflorescence, zero when absent.
    pub fn component_mass(&self, kind: BunchComponentKind) -> FloatValue {
        self.component(kind).map_or(0.0, BunchComponent::mass)
    }

    /// Dry mass of the mean inflorescence (kg_DM).
    pub fn mass(&self) -> FloatValue {
        self.components.iter().map(BunchComponent::mass).sum()
    }

    /// Potential sink strength of the mean inflorescence (kg_CH2O/day).
    pub fn potential_sink_strength(&self) -> FloatValue {
        self.components
            .iter()
            .map(BunchComponent::potential_sink_strength)
            .sum()
    }

    /// Potential sink strength of the whole cohort (kg_CH2O/ha/day).
    pub fn cohort_sink_strength(&self) -> FloatValue {
        self.num_inflorescences * self.potential_sink_strength()
    }

    /// Maintenance of the mean inflorescence (kg_CH2O/day).
    pub fn maintenance_requirement(&self) -> FloatValue {
        self.components
            .iter()
            .map(BunchComponent::maintenance_requirement)
            .sum()
    }

    /// unit: kg_CH2O/ha/day
    pub fn assim_growth(&self) -> FloatValue {
        self.assim_growth
    }

    /// Realised growth of the mean inflorescence in the last step (kg_DM/day).
    pub fn mass_growth_rate(&self) -> FloatValue {
        self.components
            .iter()
            .map(BunchComponent::mass_growth_rate)
            .sum()
    }

    fn set_relative_sink_strength(&mut self, total_sink_strength: FloatValue) {
        self.relative_sink_strength = if total_sink_strength > 0.0 {
            self.cohort_sink_strength() / total_sink_strength
        } else {
            0.0
        };
    }

    /// Grow all components, then age them, then apply abortion.
    fn update(
        &mut self,
        step: &CohortStep<'_>,
        abortion_fraction: FloatValue,
    ) -> PalmSimResult<()> {
        self.assim_growth = self.relative_sink_strength * step.generative_assim_growth;
        let per_inflorescence = if self.num_inflorescences > 0.0 {
            self.assim_growth / self.num_inflorescences
        } else {
            0.0
        };

        // Shares are taken before any component ages
        let total = self.potential_sink_strength();
        let shares: Vec<FloatValue> = self
            .components
            .iter()
            .map(|c| {
                if total > 0.0 {
                    c.potential_sink_strength() / total
                } else {
                    0.0
                }
            })
            .collect();
        for (component, share) in self.components.iter_mut().zip(shares) {
            component.grow(share * per_inflorescence, step.dt)?;
        }
        for component in self.components.iter_mut() {
            component.advance_age(step.dt);
        }

        self.num_inflorescences *= (1.0 - abortion_fraction * step.dt).max(0.0);
        ensure_non_negative("cohort", "num_inflorescences", self.num_inflorescences)?;
        self.age += step.dt;
        Ok(())
    }

    /// Deep copy carrying a share of the inflorescences and sink strength.
    fn split_off(&self, fraction: FloatValue) -> Self {
        Self {
            num_inflorescences: fraction * self.num_inflorescences,
            relative_sink_strength: fraction * self.relative_sink_strength,
            assim_growth: fraction * self.assim_growth,
            ..self.clone()
        }
    }
}

/// Cohort before sex differentiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndeterminateCohort {
    core: CohortCore,
    /// unit: day
    t_differentiation: FloatValue,
}

impl IndeterminateCohort {
    /// A new cohort of `num_inflorescences` inflorescences per hectare.
    ///
    /// `t_differentiation` is a fraction of `t_maturity`.
    pub fn new(
        num_inflorescences: FloatValue,
        t_maturity: FloatValue,
        t_differentiation: FloatValue,
        potential_mass: FloatValue,
        components: &BunchComponentsParameters,
    ) -> PalmSimResult<Self> {
        Ok(Self {
            core: CohortCore::new(num_inflorescences, t_maturity, potential_mass, components)?,
            t_differentiation: t_differentiation * t_maturity,
        })
    }

    pub fn t_differentiation(&self) -> FloatValue {
        self.t_differentiation
    }

    pub fn should_differentiate(&self) -> bool {
        self.core.age >= self.t_differentiation
    }

    /// Split into a female and a male cohort.
    ///
    /// Counts and relative sink strength are divided by `female_fraction`;
    /// both children carry a deep copy of the stalk.
    pub fn differentiate(
        &self,
        female_fraction: FloatValue,
        female_parameters: &FemaleParameters,
    ) -> (FemaleCohort, MaleCohort) {
        let female_fraction = female_fraction.clamp(0.0, 1.0);
        let female = FemaleCohort::from_core(
            self.core.split_off(female_fraction),
            female_parameters.clone(),
        );
        let male = MaleCohort {
            core: self.core.split_off(1.0 - female_fraction),
        };
        (female, male)
    }
}

/// Male cohort; carries a stalk only and never aborts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaleCohort {
    core: CohortCore,
}

/// Female cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FemaleCohort {
    core: CohortCore,
    parameters: FemaleParameters,
    has_flowered: bool,
    /// Event times, in days since initiation
    t_anthesis: FloatValue,
    inflorescence_abortion_t0: FloatValue,
    inflorescence_abortion_t1: FloatValue,
    bunch_failure_t0: FloatValue,
    bunch_failure_t1: FloatValue,
    /// Abortion rates applied in the last step
    /// unit: 1/day
    inflorescence_abortion_fraction: FloatValue,
    bunch_failure_fraction: FloatValue,
}

impl FemaleCohort {
    fn from_core(core: CohortCore, parameters: FemaleParameters) -> Self {
        let t = core.t_maturity;
        let inflorescence_abortion_t0 = t * parameters.inflorescence_abortion_t0;
        let bunch_failure_t0 = t * parameters.bunch_failure_t0;
        Self {
            t_anthesis: t * parameters.t_anthesis,
            inflorescence_abortion_t0,
            inflorescence_abortion_t1: inflorescence_abortion_t0
                + t * parameters.inflorescence_abortion_dt,
            bunch_failure_t0,
            bunch_failure_t1: bunch_failure_t0 + t * parameters.bunch_failure_dt,
            core,
            parameters,
            has_flowered: false,
            inflorescence_abortion_fraction: 0.0,
            bunch_failure_fraction: 0.0,
        }
    }

    pub fn has_flowered(&self) -> bool {
        self.has_flowered
    }

    pub fn t_anthesis(&self) -> FloatValue {
        self.t_anthesis
    }

    pub fn should_trigger_flowering(&self) -> bool {
        self.core.age > self.t_anthesis && !self.has_flowered
    }

    pub fn is_harvestible(&self) -> bool {
        self.core.age >= self.core.t_maturity
    }

    /// Stress-driven abortion of young inflorescences (1/day).
    pub fn inflorescence_abortion_fraction_at(&self, stress_index: FloatValue) -> FloatValue {
        let age = self.core.age;
        if self.parameters.enable_inflorescence_abortion
            && age >= self.inflorescence_abortion_t0
            && age < self.inflorescence_abortion_t1
        {
            saturating(stress_index, self.parameters.stress_inflorescence_abortion_asymptote)
        } else {
            0.0
        }
    }

    /// Stress-driven failure of bunches close to maturity (1/day).
    pub fn bunch_failure_fraction_at(&self, stress_index: FloatValue) -> FloatValue {
        let age = self.core.age;
        if self.parameters.enable_bunch_failure
            && age >= self.bunch_failure_t0
            && age < self.bunch_failure_t1
        {
            saturating(stress_index, self.parameters.stress_bunch_failure_asymptote)
        } else {
            0.0
        }
    }

    pub fn inflorescence_abortion_fraction(&self) -> FloatValue {
        self.inflorescence_abortion_fraction
    }

    pub fn bunch_failure_fraction(&self) -> FloatValue {
        self.bunch_failure_fraction
    }

    /// Add mesocarp fibers, mesocarp oil and kernel at the cohort's age.
    ///
    /// Has no effect once the cohort has flowered.
    pub fn set_fruit(&mut self, components: &BunchComponentsParameters) -> PalmSimResult<()> {
        if self.has_flowered {
            return Ok(());
        }
        let core = &mut self.core;
        for (kind, parameters) in [
            (BunchComponentKind::MesocarpFibers, components.mesocarp_fibers),
            (BunchComponentKind::MesocarpOil, components.mesocarp_oil),
            (BunchComponentKind::Kernel, components.kernel),
        ] {
            core.components.push(BunchComponent::new(
                kind,
                parameters,
                core.potential_mass,
                core.t_maturity,
                core.age,
            )?);
        }
        self.has_flowered = true;
        debug!(
            age = core.age,
            num_inflorescences = core.num_inflorescences,
            "female cohort flowered"
        );
        Ok(())
    }

    fn update(&mut self, step: &CohortStep<'_>) -> PalmSimResult<()> {
        self.inflorescence_abortion_fraction =
            self.inflorescence_abortion_fraction_at(step.stress_index);
        self.bunch_failure_fraction = self.bunch_failure_fraction_at(step.stress_index);
        let abortion = self.inflorescence_abortion_fraction + self.bunch_failure_fraction;
        self.core.update(step, abortion)?;
        if self.should_trigger_flowering() {
            self.set_fruit(step.components)?;
        }
        Ok(())
    }
}

/// Sex of a cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Indeterminate,
    Male,
    Female,
}

/// A cohort of inflorescences at any stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cohort {
    Indeterminate(IndeterminateCohort),
    Male(MaleCohort),
    Female(FemaleCohort),
}

impl Cohort {
    pub fn sex(&self) -> Sex {
        match self {
            Cohort::Indeterminate(_) => Sex::Indeterminate,
            Cohort::Male(_) => Sex::Male,
            Cohort::Female(_) => Sex::Female,
        }
    }

    pub fn core(&self) -> &CohortCore {
        match self {
            Cohort::Indeterminate(c) => &c.core,
            Cohort::Male(c) => &c.core,
            Cohort::Female(c) => &c.core,
        }
    }

    fn core_mut(&mut self) -> &mut CohortCore {
        match self {
            Cohort::Indeterminate(c) => &mut c.core,
            Cohort::Male(c) => &mut c.core,
            Cohort::Female(c) => &mut c.core,
        }
    }

    pub fn as_female(&self) -> Option<&FemaleCohort> {
        match self {
            Cohort::Female(c) => Some(c),
            _ => None,
        }
    }

    pub fn num_inflorescences(&self) -> FloatValue {
        self.core().num_inflorescences
    }

    pub fn age(&self) -> FloatValue {
        self.core().age
    }

    /// Time-triggered removal; counts never trigger it.
    pub fn is_deletable(&self) -> bool {
        match self {
            Cohort::Indeterminate(c) => c.core.age > c.t_differentiation,
            Cohort::Male(c) => c.core.age > c.core.t_maturity,
            Cohort::Female(c) => c.core.age >= c.core.t_maturity,
        }
    }

    /// Advance the cohort by `step.dt` days.
    pub fn update(&mut self, step: &CohortStep<'_>) -> PalmSimResult<()> {
        match self {
            // Aborting before differentiation is negligible
            Cohort::Indeterminate(c) => c.core.update(step, 0.0),
            Cohort::Male(c) => c.core.update(step, 0.0),
            Cohort::Female(c) => c.update(step),
        }
    }

    pub fn set_relative_sink_strength(&mut self, total_sink_strength: FloatValue) {
        self.core_mut().set_relative_sink_strength(total_sink_strength);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn indeterminate(num: FloatValue) -> IndeterminateCohort {
        IndeterminateCohort::new(num, 1000.0, 0.2, 10.0, &BunchComponentsParameters::default())
            .unwrap()
    }

    fn step(
        components: &BunchComponentsParameters,
        assim: FloatValue,
        stress: FloatValue,
    ) -> CohortStep<'_> {
        CohortStep {
            dt: 10.0,
            generative_assim_growth: assim,
            stress_index: stress,
            components,
        }
    }

    fn female(num: FloatValue) -> FemaleCohort {
        indeterminate(num)
            .differentiate(1.0, &FemaleParameters::default())
            .0
    }

    // ===== Indeterminate Tests =====

    #[test]
    fn new_cohort_carries_only_a_stalk() {
        let cohort = indeterminate(5.0);
        assert_eq!(cohort.core.components().len(), 1);
        assert_eq!(cohort.core.components()[0].kind(), BunchComponentKind::Stalk);
        assert_relative_eq!(cohort.t_differentiation(), 200.0);
    }

    #[test]
    fn differentiation_happens_at_threshold() {
        let params = BunchComponentsParameters::default();
        let mut cohort = Cohort::Indeterminate(indeterminate(5.0));
        for _ in 0..19 {
            cohort.update(&step(&params, 0.0, 0.0)).unwrap();
        }
        match &cohort {
            Cohort::Indeterminate(c) => assert!(!c.should_differentiate()),
            _ => unreachable!(),
        }
        cohort.update(&step(&params, 0.0, 0.0)).unwrap();
        match &cohort {
            Cohort::Indeterminate(c) => assert!(c.should_differentiate()),
            _ => unreachable!(),
        }
    }

    #[test]
    fn relative_sink_strength_is_zero_without_demand() {
        let mut cohort = Cohort::Indeterminate(indeterminate(5.0));
        cohort.set_relative_sink_strength(0.0);
        assert_eq!(cohort.core().relative_sink_strength(), 0.0);
    }

    // ===== Female Tests =====

    #[test]
    fn event_timings_scale_with_maturity() {
        let cohort = female(1.0);
        assert_relative_eq!(cohort.t_anthesis(), 820.0);
        assert_relative_eq!(cohort.inflorescence_abortion_t1, 780.0);
        assert_relative_eq!(cohort.bunch_failure_t1, 950.0);
    }

    #[test]
    fn flowering_adds_fruit_components_once() {
        let params = BunchComponentsParameters::default();
        let mut cohort = female(1.0);
        cohort.set_fruit(&params).unwrap();
        cohort.set_fruit(&params).unwrap();
        assert!(cohort.has_flowered());
        assert_eq!(cohort.core.components().len(), 4);
        assert!(!cohort.should_trigger_flowering());
    }

    #[test]
    fn abortion_only_within_window() {
        let mut cohort = female(1.0);
        assert_eq!(cohort.inflorescence_abortion_fraction_at(1.0), 0.0);
        cohort.core.age = 760.0;
        assert_relative_eq!(
            cohort.inflorescence_abortion_fraction_at(1.0),
            1.0 - (-0.95_f64).exp()
        );
        assert_eq!(cohort.inflorescence_abortion_fraction_at(0.0), 0.0);
        assert_eq!(cohort.bunch_failure_fraction_at(1.0), 0.0);
        cohort.core.age = 930.0;
        assert!(cohort.bunch_failure_fraction_at(0.5) > 0.0);
    }

    #[test]
    fn disabled_abortion_never_applies() {
        let parameters = FemaleParameters {
            enable_inflorescence_abortion: false,
            enable_bunch_failure: false,
            ..FemaleParameters::default()
        };
        let (mut cohort, _) = indeterminate(1.0).differentiate(1.0, &parameters);
        cohort.core.age = 760.0;
        assert_eq!(cohort.inflorescence_abortion_fraction_at(1.0), 0.0);
        cohort.core.age = 930.0;
        assert_eq!(cohort.bunch_failure_fraction_at(1.0), 0.0);
    }

    #[test]
    fn stressed_cohort_aborts_to_zero_but_survives() {
        let params = BunchComponentsParameters::default();
        let mut cohort = Cohort::Female(female(4.0));
        if let Cohort::Female(c) = &mut cohort {
            c.core.age = 750.0;
        }
        for _ in 0..3 {
            cohort.update(&step(&params, 0.0, 1.0)).unwrap();
        }
        assert_eq!(cohort.num_inflorescences(), 0.0);
        assert!(!cohort.is_deletable());
    }

    // ===== Deletion Tests =====

    #[test]
    fn deletion_thresholds_by_sex() {
        let (mut female, mut male) =
            indeterminate(1.0).differentiate(0.5, &FemaleParameters::default());
        female.core.age = 1000.0;
        male.core.age = 1000.0;
        assert!(Cohort::Female(female.clone()).is_deletable());
        assert!(female.is_harvestible());
        assert!(!Cohort::Male(male.clone()).is_deletable());
        male.core.age = 1000.1;
        assert!(Cohort::Male(male).is_deletable());
    }

    // ===== Growth Tests =====

    #[test]
    fn allocation_is_shared_per_inflorescence() {
        let params = BunchComponentsParameters::default();
        let mut cohort = Cohort::Indeterminate(indeterminate(2.0));
        if let Cohort::Indeterminate(c) = &mut cohort {
            c.core.age = 100.0;
            for component in c.core.components.iter_mut() {
                component.advance_age(100.0);
            }
        }
        let total = cohort.core().cohort_sink_strength();
        cohort.set_relative_sink_strength(total);
        assert_relative_eq!(cohort.core().relative_sink_strength(), 1.0);

        // A tiny supply stays below the potential of the stalk
        cohort.update(&step(&params, 1e-6, 0.0)).unwrap();
        assert_relative_eq!(cohort.core().mass(), 0.69 * 0.5e-6 * 10.0, epsilon = 1e-12);
    }

    // ===== Equality Tests =====

    #[test]
    fn flowering_changes_cohort_equality() {
        let unflowered = Cohort::Female(female(3.0));
        let mut flowered = female(3.0);
        flowered.set_fruit(&BunchComponentsParameters::default()).unwrap();
        let flowered = Cohort::Female(flowered);

        assert_eq!(flowered.clone(), flowered);
        assert_eq!(unflowered, Cohort::Female(female(3.0)));
        assert_ne!(flowered, unflowered);
    }
}
