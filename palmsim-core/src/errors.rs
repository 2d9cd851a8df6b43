use chrono::NaiveDate;
use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum PalmSimError {
    #[error("{0}")]
    Error(String),
    #[error("Invariant violated in {component}: {quantity} = {value}")]
    InvariantViolation {
        component: String,
        quantity: String,
        value: f64,
    },
    #[error("Proportionate partitioning of supply {supply} requires a positive total demand")]
    ZeroTotalDemand { supply: f64 },
    #[error("Step {step} ({date}) failed: {source}")]
    StepFailed {
        step: usize,
        date: NaiveDate,
        #[source]
        source: Box<PalmSimError>,
    },
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("Unknown soil texture class '{0}'")]
    UnknownSoilTexture(String),
    #[error("Invalid spline: {0}")]
    InvalidSpline(String),
    #[error("Could not parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PalmSimError {
    /// Shorthand for an [`PalmSimError::InvariantViolation`].
    pub fn invariant(component: &str, quantity: &str, value: f64) -> Self {
        PalmSimError::InvariantViolation {
            component: component.to_string(),
            quantity: quantity.to_string(),
            value,
        }
    }

    /// Shorthand for an [`PalmSimError::InvalidParameter`].
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        PalmSimError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Attach the step index and simulated date to an error raised during a step.
    pub fn at_step(self, step: usize, date: NaiveDate) -> Self {
        PalmSimError::StepFailed {
            step,
            date,
            source: Box::new(self),
        }
    }
}

/// Convenience type for `Result<T, PalmSimError>`.
pub type PalmSimResult<T> = Result<T, PalmSimError>;

/// Fail with an invariant violation unless `value` is non-negative.
pub fn ensure_non_negative(component: &str, quantity: &str, value: f64) -> PalmSimResult<()> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(PalmSimError::invariant(component, quantity, value))
    }
}
