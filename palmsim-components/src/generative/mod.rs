//! Generative organs: inflorescence cohorts and their bunch components.

pub mod bunch_components;
pub mod cohorts;
pub mod population;

pub use bunch_components::{BunchComponent, BunchComponentKind};
pub use cohorts::{Cohort, CohortCore, FemaleCohort, IndeterminateCohort, MaleCohort, Sex};
pub use population::{CohortPopulation, HarvestRecord};
