//! The cohort population: the generative sink of the palm.
//!
//! Every step the population receives one allocation of growth assimilates,
//! shares it among its cohorts by their frozen relative sink strengths and
//! runs the cohort lifecycle in a fixed order:
//!
//! 1. take this step's generative allocation
//! 2. update every cohort (mass, then age, abortion)
//! 3. split differentiating indeterminate cohorts into female and male
//! 4. append one new indeterminate cohort
//! 5. select the harvest, the youngest harvestible female
//! 6. remove deletable cohorts
//! 7. recompute the total potential sink strength and every cohort's share
//!
//! Yields are computed from the harvest only.

use super::cohorts::{Cohort, CohortStep, IndeterminateCohort, Sex};
use crate::generative::bunch_components::BunchComponentKind;
use crate::parameters::{
    BunchComponentsParameters, FemaleParameters, GenerativeParameters, IndeterminateParameters,
};
use palmsim_core::define_static_variable;
use palmsim_core::errors::PalmSimResult;
use palmsim_core::interpolate::curves::{decay_to_asymptote, saturating};
use palmsim_core::timestep::{FloatValue, StepContext};
use palmsim_core::variable::{Reportable, ReportedValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Snapshot of the cohort harvested in a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarvestRecord {
    /// unit: day
    pub age: FloatValue,
    /// Harvested bunches
    /// unit: 1/ha
    pub num_bunches: FloatValue,
    /// Component masses of the mean bunch
    /// unit: kg_DM
    pub stalk_mass: FloatValue,
    pub mesocarp_fibers_mass: FloatValue,
    pub mesocarp_oil_mass: FloatValue,
    pub kernel_mass: FloatValue,
}

impl HarvestRecord {
    fn from_cohort(cohort: &Cohort) -> Self {
        let core = cohort.core();
        Self {
            age: core.age(),
            num_bunches: core.num_inflorescences(),
            stalk_mass: core.component_mass(BunchComponentKind::Stalk),
            mesocarp_fibers_mass: core.component_mass(BunchComponentKind::MesocarpFibers),
            mesocarp_oil_mass: core.component_mass(BunchComponentKind::MesocarpOil),
            kernel_mass: core.component_mass(BunchComponentKind::Kernel),
        }
    }

    /// Dry mass of the mean bunch (kg_DM).
    pub fn bunch_mass(&self) -> FloatValue {
        self.stalk_mass + self.mesocarp_fibers_mass + self.mesocarp_oil_mass + self.kernel_mass
    }

    /// Empty fruit bunch dry mass of the mean bunch (kg_DM).
    pub fn empty_fruit_bunch_mass(&self) -> FloatValue {
        self.stalk_mass + self.mesocarp_fibers_mass
    }
}

/// All inflorescence cohorts of a hectare of palms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortPopulation {
    parameters: GenerativeParameters,
    indeterminate_parameters: IndeterminateParameters,
    female_parameters: FemaleParameters,
    component_parameters: BunchComponentsParameters,
    cohorts: Vec<Cohort>,
    /// unit: kg_CH2O/ha/day
    assim_growth: FloatValue,
    /// Sum of cohort sink strengths, frozen at the end of a step
    /// unit: kg_CH2O/ha/day
    potential_sink_strength: FloatValue,
    /// Inflorescences initiated in the last step
    /// unit: 1/ha/day
    initiation_rate: FloatValue,
    harvest: Option<HarvestRecord>,
}

impl CohortPopulation {
    pub fn new() -> Self {
        Self::from_parameters(
            GenerativeParameters::default(),
            IndeterminateParameters::default(),
            FemaleParameters::default(),
            BunchComponentsParameters::default(),
        )
    }

    pub fn from_parameters(
        parameters: GenerativeParameters,
        indeterminate_parameters: IndeterminateParameters,
        female_parameters: FemaleParameters,
        component_parameters: BunchComponentsParameters,
    ) -> Self {
        Self {
            parameters,
            indeterminate_parameters,
            female_parameters,
            component_parameters,
            cohorts: Vec::new(),
            assim_growth: 0.0,
            potential_sink_strength: 0.0,
            initiation_rate: 0.0,
            harvest: None,
        }
    }

    pub fn parameters(&self) -> &GenerativeParameters {
        &self.parameters
    }

    pub fn cohorts(&self) -> &[Cohort] {
        &self.cohorts
    }

    pub fn harvest(&self) -> Option<&HarvestRecord> {
        self.harvest.as_ref()
    }

    /// Generative allocation of the last step (kg_CH2O/ha/day).
    pub fn assim_growth(&self) -> FloatValue {
        self.assim_growth
    }

    /// Frozen potential sink strength (kg_CH2O/ha/day).
    pub fn potential_sink_strength(&self) -> FloatValue {
        self.potential_sink_strength
    }

    /// Duration from initiation to harvest for cohorts initiated now (days).
    ///
    /// Rises logistically with palm age towards
    /// `bunch_development_asymptote_t0`.
    pub fn t_maturity(&self, context: &StepContext) -> FloatValue {
        let a0 = self.parameters.bunch_development_asymptote_t0;
        let slope = self.parameters.bunch_development_slope;
        let t = context.years_after_planting();
        a0 / (1.0 + (-4.0 * slope * t / a0).exp())
    }

    /// Satisfied share of the generative demand, in [0, 1].
    pub fn ic(&self) -> FloatValue {
        if self.potential_sink_strength > 0.0 {
            (self.assim_growth / self.potential_sink_strength).min(1.0)
        } else {
            1.0
        }
    }

    pub fn stress_index(&self) -> FloatValue {
        1.0 - self.ic()
    }

    /// Female fraction of an unstressed palm of this age.
    pub fn female_fraction_baseline(&self, context: &StepContext) -> FloatValue {
        let p = &self.parameters;
        let t = context.years_after_planting();
        let female =
            decay_to_asymptote(t, p.female_fraction_a, p.female_fraction_b, p.female_fraction_k);
        let initiation = decay_to_asymptote(
            t,
            p.reference_initiation_a,
            p.reference_initiation_b,
            p.reference_initiation_c,
        );
        female / initiation
    }

    /// Female fraction of differentiating cohorts, reduced by stress.
    pub fn female_fraction(&self, context: &StepContext) -> FloatValue {
        let stress_effect =
            (-self.parameters.stress_female_fraction_asymptote * self.stress_index()).exp();
        (self.female_fraction_baseline(context) * stress_effect).clamp(0.0, 1.0)
    }

    /// Ramp-up of inflorescence production after planting, in [0, 1).
    ///
    /// Production starts so that the first bunches ripen around
    /// `onset_time` months after planting.
    pub fn onset_multiplicity(&self, context: &StepContext) -> FloatValue {
        let t0 = self.parameters.onset_time - self.t_maturity(context) / context.days_in_month;
        let months = context.months_after_planting;
        if months < t0 {
            0.0
        } else {
            1.0 - 1.0 / (1.0 + self.parameters.onset_steepness * (months - t0).powi(4))
        }
    }

    /// Inflorescence initiation (1/ha/day) given the frond initiation rate
    /// (1/palm/day).
    pub fn initiation_rate(
        &self,
        context: &StepContext,
        frond_initiation_rate: FloatValue,
    ) -> FloatValue {
        frond_initiation_rate * context.planting_density * self.onset_multiplicity(context)
    }

    /// Potential dry mass of bunches initiated now (kg_DM).
    ///
    /// Depends on the palm age (years) at which these bunches will be
    /// harvested, `(DAP + t_maturity) / days_in_year`.
    pub fn potential_bunch_mass(&self, context: &StepContext) -> FloatValue {
        let p = &self.indeterminate_parameters;
        let age_at_harvest =
            (context.days_after_planting + self.t_maturity(context)) / context.days_in_year;
        let fresh = p.potential_mass_a * saturating(age_at_harvest, p.potential_mass_b);
        fresh / self.parameters.bunch_fm_to_dm_ratio
    }

    /// Advance all cohorts by `context.dt` days.
    ///
    /// `assim_growth` is this step's generative allocation (kg_CH2O/ha/day),
    /// `frond_initiation_rate` the frond initiation rate (1/palm/day).
    pub fn update(
        &mut self,
        context: &StepContext,
        assim_growth: FloatValue,
        frond_initiation_rate: FloatValue,
    ) -> PalmSimResult<()> {
        // 1.
        self.assim_growth = assim_growth;
        let step = CohortStep {
            dt: context.dt,
            generative_assim_growth: assim_growth,
            stress_index: self.stress_index(),
            components: &self.component_parameters,
        };

        // 2.
        for cohort in self.cohorts.iter_mut() {
            cohort.update(&step)?;
        }

        // 3.
        let female_fraction = self.female_fraction(context);
        let mut differentiated = 0usize;
        let mut cohorts = Vec::with_capacity(self.cohorts.len() + 2);
        for cohort in self.cohorts.drain(..) {
            match cohort {
                Cohort::Indeterminate(c) if c.should_differentiate() => {
                    let (female, male) = c.differentiate(female_fraction, &self.female_parameters);
                    cohorts.push(Cohort::Female(female));
                    cohorts.push(Cohort::Male(male));
                    differentiated += 1;
                }
                other => cohorts.push(other),
            }
        }
        self.cohorts = cohorts;
        if differentiated > 0 {
            debug!(differentiated, female_fraction, "sex differentiation");
        }

        // 4.
        self.initiation_rate = self.initiation_rate(context, frond_initiation_rate);
        let cohort = IndeterminateCohort::new(
            self.initiation_rate * context.dt,
            self.t_maturity(context),
            self.indeterminate_parameters.t_differentiation,
            self.potential_bunch_mass(context),
            &self.component_parameters,
        )?;
        self.cohorts.push(Cohort::Indeterminate(cohort));

        // 5.
        self.harvest = self
            .cohorts
            .iter()
            .filter(|c| c.as_female().is_some_and(|f| f.is_harvestible()))
            .min_by(|a, b| a.age().total_cmp(&b.age()))
            .map(HarvestRecord::from_cohort);
        if let Some(harvest) = &self.harvest {
            debug!(
                age = harvest.age,
                bunches = harvest.num_bunches,
                bunch_mass = harvest.bunch_mass(),
                "harvest selected"
            );
        }

        // 6.
        let before = self.cohorts.len();
        self.cohorts.retain(|c| !c.is_deletable());
        let removed = before - self.cohorts.len();
        if removed > 0 {
            debug!(removed, remaining = self.cohorts.len(), "cohorts removed");
        }

        // 7.
        self.potential_sink_strength = self
            .cohorts
            .iter()
            .map(|c| c.core().cohort_sink_strength())
            .sum();
        let total = self.potential_sink_strength;
        for cohort in self.cohorts.iter_mut() {
            cohort.set_relative_sink_strength(total);
        }
        Ok(())
    }

    fn of_sex(&self, sex: Sex) -> impl Iterator<Item = &Cohort> {
        self.cohorts.iter().filter(move |c| c.sex() == sex)
    }

    /// unit: kg_CH2O/ha/day
    pub fn maintenance_requirement(&self) -> FloatValue {
        self.cohorts
            .iter()
            .map(|c| c.num_inflorescences() * c.core().maintenance_requirement())
            .sum()
    }

    /// Dry mass of all inflorescences (kg_DM/ha).
    pub fn mass(&self) -> FloatValue {
        self.cohorts
            .iter()
            .map(|c| c.num_inflorescences() * c.core().mass())
            .sum()
    }

    pub fn mass_of(&self, sex: Sex) -> FloatValue {
        self.of_sex(sex)
            .map(|c| c.num_inflorescences() * c.core().mass())
            .sum()
    }

    /// unit: 1/ha
    pub fn count_of(&self, sex: Sex) -> FloatValue {
        self.of_sex(sex).map(Cohort::num_inflorescences).sum()
    }

    pub fn number_of_cohorts(&self) -> usize {
        self.cohorts.len()
    }

    /// unit: kg_CH2O/ha/day
    pub fn assim_growth_of(&self, sex: Sex) -> FloatValue {
        self.of_sex(sex).map(|c| c.core().assim_growth()).sum()
    }

    fn mean_non_zero(values: impl Iterator<Item = FloatValue>) -> FloatValue {
        let (sum, n) = values
            .filter(|v| *v > 0.0)
            .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
        if n > 0 {
            sum / n as FloatValue
        } else {
            0.0
        }
    }

    /// Mean over female cohorts currently aborting inflorescences (1/day).
    pub fn inflorescence_abortion_fraction(&self) -> FloatValue {
        Self::mean_non_zero(
            self.cohorts
                .iter()
                .filter_map(Cohort::as_female)
                .map(|f| f.inflorescence_abortion_fraction()),
        )
    }

    /// Mean over female cohorts currently failing (1/day).
    pub fn bunch_failure_fraction(&self) -> FloatValue {
        Self::mean_non_zero(
            self.cohorts
                .iter()
                .filter_map(Cohort::as_female)
                .map(|f| f.bunch_failure_fraction()),
        )
    }

    fn harvested_bunches(&self) -> FloatValue {
        self.harvest.map_or(0.0, |h| h.num_bunches)
    }

    /// Bunches harvested per day over the last step (1/ha/day).
    pub fn bunch_count_daily(&self, context: &StepContext) -> FloatValue {
        self.harvested_bunches() / context.dt
    }

    /// unit: 1/ha/month
    pub fn bunch_count(&self, context: &StepContext) -> FloatValue {
        context.days_in_month * self.bunch_count_daily(context)
    }

    /// unit: kg_DM
    pub fn bunch_weight_dry(&self) -> FloatValue {
        match self.harvest {
            Some(h) if h.num_bunches > 0.0 => h.bunch_mass(),
            _ => 0.0,
        }
    }

    /// Fresh weight of the mean harvested bunch (kg_FM).
    pub fn bunch_weight(&self) -> FloatValue {
        self.parameters.bunch_fm_to_dm_ratio * self.bunch_weight_dry()
    }

    /// Fresh fruit bunch production at the current harvest rate (t_FM/ha/year).
    pub fn ffb_production(&self, context: &StepContext) -> FloatValue {
        context.days_in_year * self.bunch_count_daily(context) * self.bunch_weight() / 1000.0
    }

    /// Crude palm oil production (kg_DM/ha/day).
    pub fn cpo_production(&self, context: &StepContext) -> FloatValue {
        self.harvest
            .map_or(0.0, |h| h.num_bunches * h.mesocarp_oil_mass)
            / context.dt
    }

    /// Palm kernel oil production (kg_DM/ha/day).
    pub fn pko_production(&self, context: &StepContext) -> FloatValue {
        self.harvest.map_or(0.0, |h| h.num_bunches * h.kernel_mass) / context.dt
    }

    /// Empty fruit bunch production (kg_DM/ha/day).
    pub fn efb_production(&self, context: &StepContext) -> FloatValue {
        self.harvest
            .map_or(0.0, |h| h.num_bunches * h.empty_fruit_bunch_mass())
            / context.dt
    }
}

impl Default for CohortPopulation {
    fn default() -> Self {
        Self::new()
    }
}

define_static_variable!(

    VAR_GEN_MASS,

    name = "generative_mass",

    unit = "kg_DM/ha",

    description = "Dry mass of all inflorescences",

);
define_static_variable!(
    VAR_GEN_MASS_FEMALES,
    name = "generative_mass_females",
    unit = "kg_DM/ha",
    description = "Dry mass of female inflorescences",
);
define_static_variable!(
    VAR_GEN_MASS_MALES,
    name = "generative_mass_males",
    unit = "kg_DM/ha",
    description = "Dry mass of male inflorescences",
);
define_static_variable!(
    VAR_GEN_MASS_INDETERMINATES,
    name = "generative_mass_indeterminates",
    unit = "kg_DM/ha",
    description = "Dry mass of undifferentiated inflorescences",
);
define_static_variable!(
    VAR_GEN_COUNT_FEMALES,
    name = "generative_count_females",
    unit = "1/ha",
    description = "Female inflorescences",
);
define_static_variable!(
    VAR_GEN_COUNT_MALES,
    name = "generative_count_males",
    unit = "1/ha",
    description = "Male inflorescences",
);
define_static_variable!(
    VAR_GEN_COUNT_INDETERMINATES,
    name = "generative_count_indeterminates",
    unit = "1/ha",
    description = "Undifferentiated inflorescences",
);
define_static_variable!(
    VAR_GEN_NUMBER_OF_COHORTS,
    name = "generative_number_of_cohorts",
    unit = "1",
    description = "Live cohorts",
);
define_static_variable!(
    VAR_GEN_ASSIM_GROWTH,
    name = "generative_assim_growth",
    unit = "kg_CH2O/ha/day",
    description = "Assimilates allocated to the inflorescences",
);
define_static_variable!(
    VAR_GEN_ASSIM_FEMALES,
    name = "generative_assim_growth_females",
    unit = "kg_CH2O/ha/day",
    description = "Assimilates received by female cohorts",
);
define_static_variable!(
    VAR_GEN_ASSIM_MALES,
    name = "generative_assim_growth_males",
    unit = "kg_CH2O/ha/day",
    description = "Assimilates received by male cohorts",
);
define_static_variable!(
    VAR_GEN_ASSIM_INDETERMINATES,
    name = "generative_assim_growth_indeterminates",
    unit = "kg_CH2O/ha/day",
    description = "Assimilates received by undifferentiated cohorts",
);
define_static_variable!(
    VAR_GEN_POTENTIAL_SINK,
    name = "generative_potential_sink_strength",
    unit = "kg_CH2O/ha/day",
    description = "Potential sink strength of the inflorescences",
);
define_static_variable!(
    VAR_GEN_MAINTENANCE,
    name = "generative_maintenance_requirement",
    unit = "kg_CH2O/ha/day",
    description = "Maintenance requirement of the inflorescences",
);
define_static_variable!(
    VAR_GEN_IC,
    name = "generative_Ic",
    unit = "1",
    description = "Satisfied share of the generative demand",
);
define_static_variable!(
    VAR_GEN_STRESS_INDEX,
    name = "generative_stress_index",
    unit = "1",
    description = "Unsatisfied share of the generative demand",
);
define_static_variable!(
    VAR_GEN_FEMALE_FRACTION,
    name = "generative_female_fraction",
    unit = "1",
    description = "Female share of differentiating inflorescences",
);
define_static_variable!(
    VAR_GEN_T_MATURITY,
    name = "generative_t_maturity",
    unit = "day",
    description = "Bunch development time of new cohorts",
);
define_static_variable!(
    VAR_GEN_ONSET,
    name = "generative_onset_multiplicity_factor",
    unit = "1",
    description = "Ramp-up of inflorescence production",
);
define_static_variable!(
    VAR_GEN_INITIATION_RATE,
    name = "generative_initiation_rate",
    unit = "1/ha/day",
    description = "Inflorescence initiation rate",
);
define_static_variable!(
    VAR_GEN_INFLORESCENCE_ABORTION,
    name = "generative_inflorescence_abortion_fraction",
    unit = "1/day",
    description = "Mean inflorescence abortion rate",
);
define_static_variable!(
    VAR_GEN_BUNCH_FAILURE,
    name = "generative_bunch_failure_fraction",
    unit = "1/day",
    description = "Mean bunch failure rate",
);
define_static_variable!(
    VAR_GEN_BUNCH_COUNT,
    name = "generative_bunch_count",
    unit = "1/ha/month",
    description = "Harvested bunches",
);
define_static_variable!(
    VAR_GEN_BUNCH_WEIGHT,
    name = "generative_bunch_weight",
    unit = "kg_FM",
    description = "Fresh weight of the mean harvested bunch",
);
define_static_variable!(
    VAR_GEN_BUNCH_WEIGHT_DRY,
    name = "generative_bunch_weight_dry",
    unit = "kg_DM",
    description = "Dry weight of the mean harvested bunch",
);
define_static_variable!(
    VAR_GEN_FFB,
    name = "generative_FFB_production",
    unit = "t/ha/year",
    description = "Fresh fruit bunch production",
);
define_static_variable!(
    VAR_GEN_CPO,
    name = "generative_CPO_production",
    unit = "kg_DM/ha/day",
    description = "Crude palm oil production",
);
define_static_variable!(
    VAR_GEN_PKO,
    name = "generative_PKO_production",
    unit = "kg_DM/ha/day",
    description = "Palm kernel oil production",
);
define_static_variable!(
    VAR_GEN_EFB,
    name = "generative_EFB_production",
    unit = "kg_DM/ha/day",
    description = "Empty fruit bunch production",
);

impl Reportable for CohortPopulation {
    fn report(&self, context: &StepContext) -> Vec<ReportedValue> {
        vec![
            VAR_GEN_MASS.report(self.mass()),
            VAR_GEN_MASS_FEMALES.report(self.mass_of(Sex::Female)),
            VAR_GEN_MASS_MALES.report(self.mass_of(Sex::Male)),
            VAR_GEN_MASS_INDETERMINATES.report(self.mass_of(Sex::Indeterminate)),
            VAR_GEN_COUNT_FEMALES.report(self.count_of(Sex::Female)),
            VAR_GEN_COUNT_MALES.report(self.count_of(Sex::Male)),
            VAR_GEN_COUNT_INDETERMINATES.report(self.count_of(Sex::Indeterminate)),
            VAR_GEN_NUMBER_OF_COHORTS.report(self.number_of_cohorts() as FloatValue),
            VAR_GEN_ASSIM_GROWTH.report(self.assim_growth),
            VAR_GEN_ASSIM_FEMALES.report(self.assim_growth_of(Sex::Female)),
            VAR_GEN_ASSIM_MALES.report(self.assim_growth_of(Sex::Male)),
            VAR_GEN_ASSIM_INDETERMINATES.report(self.assim_growth_of(Sex::Indeterminate)),
            VAR_GEN_POTENTIAL_SINK.report(self.potential_sink_strength),
            VAR_GEN_MAINTENANCE.report(self.maintenance_requirement()),
            VAR_GEN_IC.report(self.ic()),
            VAR_GEN_STRESS_INDEX.report(self.stress_index()),
            VAR_GEN_FEMALE_FRACTION.report(self.female_fraction(context)),
            VAR_GEN_T_MATURITY.report(self.t_maturity(context)),
            VAR_GEN_ONSET.report(self.onset_multiplicity(context)),
            VAR_GEN_INITIATION_RATE.report(self.initiation_rate),
            VAR_GEN_INFLORESCENCE_ABORTION.report(self.inflorescence_abortion_fraction()),
            VAR_GEN_BUNCH_FAILURE.report(self.bunch_failure_fraction()),
            VAR_GEN_BUNCH_COUNT.report(self.bunch_count(context)),
            VAR_GEN_BUNCH_WEIGHT.report(self.bunch_weight()),
            VAR_GEN_BUNCH_WEIGHT_DRY.report(self.bunch_weight_dry()),
            VAR_GEN_FFB.report(self.ffb_production(context)),
            VAR_GEN_CPO.report(self.cpo_production(context)),
            VAR_GEN_PKO.report(self.pko_production(context)),
            VAR_GEN_EFB.report(self.efb_production(context)),
        ]
    }
}
