//! Lifecycle properties of inflorescence cohorts.
//!
//! These tests drive cohorts through the public API only:
//! - sex differentiation conserves inflorescences and stalk mass
//! - flowering adds the fruit components exactly once
//! - female counts never increase
//! - bunch potential mass follows the palm age at harvest

use approx::assert_relative_eq;
use palmsim_components::generative::bunch_components::BunchComponentKind;
use palmsim_components::generative::cohorts::{Cohort, CohortStep, IndeterminateCohort, Sex};
use palmsim_components::generative::CohortPopulation;
use palmsim_components::parameters::{
    BunchComponentsParameters, FemaleParameters, GenerativeParameters, IndeterminateParameters,
};
use palmsim_core::timestep::{FloatValue, StepContext};

const T_MATURITY: FloatValue = 1000.0;

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

/// Advance a lone cohort, fully supplied, until it reaches `age`.
fn grow_until(
    cohort: &mut Cohort,
    age: FloatValue,
    stress: FloatValue,
    components: &BunchComponentsParameters,
) {
    while cohort.age() < age {
        let demand = cohort.core().cohort_sink_strength();
        cohort.set_relative_sink_strength(demand);
        cohort.update(&step(components, demand, stress)).unwrap();
    }
}

fn grown_indeterminate(components: &BunchComponentsParameters) -> IndeterminateCohort {
    let mut cohort = Cohort::Indeterminate(
        IndeterminateCohort::new(100.0, T_MATURITY, 0.2, 12.0, components).unwrap(),
    );
    grow_until(&mut cohort, 200.0, 0.0, components);
    match cohort {
        Cohort::Indeterminate(c) => c,
        other => panic!("expected an indeterminate cohort, got {:?}", other.sex()),
    }
}

mod sex_differentiation {
    use super::*;

    #[test]
    fn test_split_conserves_inflorescences() {
        let components = BunchComponentsParameters::default();
        let parent = grown_indeterminate(&components);
        assert!(parent.should_differentiate());

        let (female, male) = parent.differentiate(0.7, &FemaleParameters::default());
        let female = Cohort::Female(female);
        let male = Cohort::Male(male);

        assert_relative_eq!(
            female.num_inflorescences() + male.num_inflorescences(),
            100.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(female.num_inflorescences(), 70.0, epsilon = 1e-9);
        assert_eq!(female.sex(), Sex::Female);
        assert_eq!(male.sex(), Sex::Male);
    }

    #[test]
    fn test_children_carry_the_parent_stalk() {
        let components = BunchComponentsParameters::default();
        let parent = grown_indeterminate(&components);
        let parent_stalk = Cohort::Indeterminate(parent.clone())
            .core()
            .component_mass(BunchComponentKind::Stalk);
        assert!(parent_stalk > 0.0, "stalk did not grow before differentiation");

        let (female, male) = parent.differentiate(0.4, &FemaleParameters::default());
        let female = Cohort::Female(female);
        let male = Cohort::Male(male);

        assert_eq!(female.core().component_mass(BunchComponentKind::Stalk), parent_stalk);
        assert_eq!(male.core().component_mass(BunchComponentKind::Stalk), parent_stalk);
        assert_eq!(female.age(), 200.0);
        assert_eq!(male.age(), 200.0);
    }

    #[test]
    fn test_children_grow_independently() {
        let components = BunchComponentsParameters::default();
        let (female, male) = grown_indeterminate(&components)
            .differentiate(0.5, &FemaleParameters::default());
        let mut female = Cohort::Female(female);
        let male = Cohort::Male(male);
        let before = male.core().component_mass(BunchComponentKind::Stalk);

        grow_until(&mut female, 300.0, 0.0, &components);

        assert!(female.core().component_mass(BunchComponentKind::Stalk) > before);
        assert_eq!(male.core().component_mass(BunchComponentKind::Stalk), before);
    }
}

mod flowering {
    use super::*;

    #[test]
    fn test_fruit_components_are_added_once() {
        let components = BunchComponentsParameters::default();
        let (female, _) = grown_indeterminate(&components)
            .differentiate(1.0, &FemaleParameters::default());
        let mut cohort = Cohort::Female(female);

        grow_until(&mut cohort, 810.0, 0.0, &components);
        assert_eq!(cohort.core().components().len(), 1, "flowered before anthesis");

        grow_until(&mut cohort, 830.0, 0.0, &components);
        assert_eq!(cohort.core().components().len(), 4);
        assert!(cohort.as_female().is_some_and(|f| f.has_flowered()));

        grow_until(&mut cohort, 990.0, 0.0, &components);
        assert_eq!(cohort.core().components().len(), 4);
    }

    #[test]
    fn test_flowered_bunch_fills_with_oil() {
        let components = BunchComponentsParameters::default();
        let (female, _) = grown_indeterminate(&components)
            .differentiate(1.0, &FemaleParameters::default());
        let mut cohort = Cohort::Female(female);

        grow_until(&mut cohort, T_MATURITY, 0.0, &components);

        assert!(cohort.as_female().is_some_and(|f| f.is_harvestible()));
        assert!(cohort.core().component_mass(BunchComponentKind::MesocarpOil) > 0.0);
        assert!(cohort.core().component_mass(BunchComponentKind::Kernel) > 0.0);
        assert!(cohort.is_deletable());
    }
}

mod female_counts {
    use super::*;

    #[test]
    fn test_counts_never_increase_under_stress() {
        let components = BunchComponentsParameters::default();
        let (female, _) = grown_indeterminate(&components)
            .differentiate(1.0, &FemaleParameters::default());
        let mut cohort = Cohort::Female(female);

        let mut previous = cohort.num_inflorescences();
        while cohort.age() < T_MATURITY {
            cohort.update(&step(&components, 0.0, 0.8)).unwrap();
            let current = cohort.num_inflorescences();
            assert!(
                current <= previous,
                "count rose from {:.2} to {:.2} at age {}",
                previous,
                current,
                cohort.age()
            );
            assert!(current >= 0.0);
            previous = current;
        }
        assert!(previous < 100.0, "stress caused no abortion");
    }

    #[test]
    fn test_unstressed_counts_are_constant() {
        let components = BunchComponentsParameters::default();
        let (female, _) = grown_indeterminate(&components)
            .differentiate(1.0, &FemaleParameters::default());
        let mut cohort = Cohort::Female(female);

        grow_until(&mut cohort, T_MATURITY, 0.0, &components);

        assert_relative_eq!(cohort.num_inflorescences(), 100.0, epsilon = 1e-9);
    }
}

mod potential_mass {
    use super::*;

    fn expected_potential_mass(age_at_harvest_years: FloatValue) -> FloatValue {
        let p = IndeterminateParameters::default();
        p.potential_mass_a * (1.0 - (-p.potential_mass_b * age_at_harvest_years).exp())
            / GenerativeParameters::default().bunch_fm_to_dm_ratio
    }

    #[test]
    fn test_new_cohort_targets_age_at_harvest() {
        for years in [2.0, 3.0, 6.0, 12.0] {
            let mut population = CohortPopulation::new();
            let ctx = StepContext::standalone().with_dt(10.0).at_age(years * 365.0);
            population.update(&ctx, 0.0, 50.0 / 365.0).unwrap();

            let newest = population.cohorts().last().unwrap();
            assert_eq!(newest.sex(), Sex::Indeterminate);
            let t_maturity = newest.core().t_maturity();
            assert_relative_eq!(
                newest.core().potential_mass(),
                expected_potential_mass((years * 365.0 + t_maturity) / 365.0),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_children_keep_parent_potential_mass() {
        let components = BunchComponentsParameters::default();
        let parent = grown_indeterminate(&components);
        let potential = Cohort::Indeterminate(parent.clone()).core().potential_mass();

        let (female, male) = parent.differentiate(0.5, &FemaleParameters::default());
        assert_eq!(Cohort::Female(female).core().potential_mass(), potential);
        assert_eq!(Cohort::Male(male).core().potential_mass(), potential);
    }
}
