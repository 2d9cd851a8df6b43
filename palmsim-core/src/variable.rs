//! Reported variables.
//!
//! Every component declares the quantities it reports as statics with a
//! name and a physical unit, then implements [`Reportable`] to pair them
//! with their current values. A step's output is the flat mapping
//! `"<name> (<unit>)" -> value` over all components.
//!
//! ```rust
//! use palmsim_core::define_static_variable;
//! use palmsim_core::variable::ReportedValue;
//!
//! define_static_variable!(
//!     VAR_TRUNK_MASS,
//!     name = "trunk_mass",
//!     unit = "kg_DM/ha",
//!     description = "Dry mass of the trunk",
//! );
//!
//! let value: ReportedValue = VAR_TRUNK_MASS.report(512.0);
//! assert_eq!(value.key(), "trunk_mass (kg_DM/ha)");
//! ```

use crate::timestep::{FloatValue, StepContext};
use std::collections::HashMap;

/// Flat mapping from `"<name> (<unit>)"` to value.
pub type OutputState = HashMap<String, FloatValue>;

/// Static definition of a reported quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StaticVariableDefinition {
    /// Variable name
    pub name: &'static str,
    /// Physical unit
    pub unit: &'static str,
    /// Description
    pub description: &'static str,
}

impl StaticVariableDefinition {
    pub const fn new(name: &'static str, unit: &'static str, description: &'static str) -> Self {
        Self {
            name,
            unit,
            description,
        }
    }

    /// Output key, `"<name> (<unit>)"`.
    pub fn key(&self) -> String {
        format!("{} ({})", self.name, self.unit)
    }

    /// Pair this definition with a value.
    pub fn report(&'static self, value: FloatValue) -> ReportedValue {
        ReportedValue {
            definition: self,
            value,
        }
    }
}

/// Define a reported variable as a `static`.
#[macro_export]
macro_rules! define_static_variable {
    (
        $var_name:ident,
        name = $name:expr,
        unit = $unit:expr,
        description = $desc:expr $(,)?
    ) => {
        #[doc = concat!("Reported variable `", $name, "` (", $unit, ")")]
        pub static $var_name: $crate::variable::StaticVariableDefinition =
            $crate::variable::StaticVariableDefinition::new($name, $unit, $desc);
    };
}

/// A reported quantity and its current value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportedValue {
    pub definition: &'static StaticVariableDefinition,
    pub value: FloatValue,
}

impl ReportedValue {
    pub fn key(&self) -> String {
        self.definition.key()
    }
}

/// Capability shared by every component that contributes to the step output.
pub trait Reportable {
    /// Current values of all reported quantities, in a fixed order.
    fn report(&self, context: &StepContext) -> Vec<ReportedValue>;
}

/// Collect reported values into an [`OutputState`].
pub fn to_output_state(values: &[ReportedValue]) -> OutputState {
    values.iter().map(|v| (v.key(), v.value)).collect()
}
