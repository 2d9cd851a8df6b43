//! Loading and validation of parameter files.
//!
//! Parameter structs are plain serde types. Unknown keys are rejected by
//! `#[serde(deny_unknown_fields)]` on the structs themselves, so a misspelt
//! parameter surfaces when the file is loaded rather than being silently
//! ignored.

use crate::errors::{PalmSimError, PalmSimResult};
use crate::timestep::FloatValue;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

/// Range checks run on parameters before a simulation is built.
pub trait Validate {
    fn validate(&self) -> PalmSimResult<()>;
}

pub fn from_toml_str<T: DeserializeOwned>(text: &str) -> PalmSimResult<T> {
    Ok(toml::from_str(text)?)
}

pub fn from_toml_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> PalmSimResult<T> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading parameters");
    let text = std::fs::read_to_string(path)?;
    from_toml_str(&text)
}

pub fn check_positive(name: &str, value: FloatValue) -> PalmSimResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(PalmSimError::invalid_parameter(
            name,
            format!("must be positive, got {}", value),
        ))
    }
}

pub fn check_non_negative(name: &str, value: FloatValue) -> PalmSimResult<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(PalmSimError::invalid_parameter(
            name,
            format!("must not be negative, got {}", value),
        ))
    }
}

pub fn check_fraction(name: &str, value: FloatValue) -> PalmSimResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PalmSimError::invalid_parameter(
            name,
            format!("must lie within [0, 1], got {}", value),
        ))
    }
}

pub fn check_window(name: &str, start: FloatValue, end: FloatValue) -> PalmSimResult<()> {
    if end > start {
        Ok(())
    } else {
        Err(PalmSimError::invalid_parameter(
            name,
            format!("end ({}) must be after start ({})", end, start),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Example {
        rate: f64,
    }

    #[test]
    fn unknown_keys_fail_at_load_time() {
        let err = from_toml_str::<Example>("rate = 1.0\nrat = 2.0").unwrap_err();
        assert!(matches!(err, PalmSimError::ConfigParse(_)));
        let ok: Example = from_toml_str("rate = 1.0").unwrap();
        assert_eq!(ok.rate, 1.0);
    }

    #[test]
    fn range_checks() {
        assert!(check_fraction("k", 0.8).is_ok());
        assert!(check_fraction("k", 1.2).is_err());
        assert!(check_positive("c", 0.0).is_err());
        assert!(check_non_negative("c", 0.0).is_ok());
        assert!(check_window("w", 0.8, 0.75).is_err());
    }
}
