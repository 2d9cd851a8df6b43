//! Plant and environment components of the PalmSim oil palm growth model.
//!
//! - [`vegetative`]: fronds, trunk and roots
//! - [`generative`]: inflorescence cohorts, their bunch components and the
//!   cohort population
//! - [`assimilates`]: partitioning of the assimilate supply among the sinks
//! - [`environment`]: daily weather and the soil water balance
//! - [`parameters`]: parameter structs of every component

pub mod assimilates;
pub mod environment;
pub mod generative;
pub mod parameters;
pub mod vegetative;
