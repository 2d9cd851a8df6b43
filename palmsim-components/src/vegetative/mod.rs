//! Vegetative organs: fronds, trunk and roots.
//!
//! Each organ is created once at planting and mutated every step. The
//! partitioner reads the potential sink strength and maintenance requirement
//! of every organ, hands back an allocation through
//! [`Organ::set_assim_growth`], and the organ then grows by
//! [`Organ::update`].

pub mod fronds;
pub mod roots;
pub mod trunk;

pub use fronds::Fronds;
pub use roots::Roots;
pub use trunk::Trunk;

use palmsim_core::errors::PalmSimResult;
use palmsim_core::timestep::{FloatValue, StepContext};
use palmsim_core::variable::Reportable;

/// Interface shared by the vegetative organs.
///
/// All masses are dry matter per hectare and all assimilate quantities are
/// CH2O per hectare per day.
pub trait Organ: Reportable {
    fn name(&self) -> &'static str;

    /// unit: kg_DM/ha
    fn mass(&self) -> FloatValue;

    /// Assimilates the organ would consume to grow at its potential rate.
    ///
    /// unit: kg_CH2O/ha/day
    fn potential_sink_strength(&self, context: &StepContext) -> FloatValue;

    /// unit: kg_CH2O/ha/day
    fn maintenance_requirement(&self) -> FloatValue;

    /// Assimilates allocated to growth for the coming update.
    ///
    /// unit: kg_CH2O/ha/day
    fn set_assim_growth(&mut self, assim_growth: FloatValue);

    fn assim_growth(&self) -> FloatValue;

    /// Advance the organ by `context.dt` days.
    fn update(&mut self, context: &StepContext) -> PalmSimResult<()>;
}
