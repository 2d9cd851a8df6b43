//! Core types of the PalmSim oil palm growth model: errors, simulated time,
//! assimilate partitioning rules, interpolation, reported variables and
//! parameter loading.

pub mod config;
pub mod errors;
pub mod interpolate;
pub mod partitioning;
pub mod timestep;
pub mod utils;
pub mod variable;
