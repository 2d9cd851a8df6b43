use palmsim_core::config::{check_fraction, Validate};
use palmsim_core::errors::PalmSimResult;
use palmsim_core::timestep::FloatValue;
use serde::{Deserialize, Serialize};

/// Parameters for partitioning growth assimilates between vegetative and
/// generative sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssimilateParameters {
    /// Priority of the vegetative sinks over the generative sink
    ///
    /// 1 serves vegetative demand first, 0 shares proportionally to demand.
    ///
    /// unit: dimensionless
    /// default: 0.8
    pub vegetative_priority: FloatValue,
}

impl Default for AssimilateParameters {
    fn default() -> Self {
        Self {
            vegetative_priority: 0.8,
        }
    }
}

impl Validate for AssimilateParameters {
    fn validate(&self) -> PalmSimResult<()> {
        check_fraction("assimilates.vegetative_priority", self.vegetative_priority)
    }
}
