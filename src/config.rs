//! Simulation configuration.
//!
//! A configuration has two tables: `[field]` describes the plantation and
//! the run, `[parameters.*]` overrides component parameters. Every key is
//! optional and falls back to its default; unknown keys are rejected.
//!
//! ```toml
//! [field]
//! planting_date = "2001-06-15"
//! planting_density = 143.0
//! latitude = 2.5
//! soil_texture = "sandy clay loam"
//! soil_depth = 1.5
//! dt = 10
//!
//! [field.weather]
//! rainfall = 6.0
//!
//! [parameters.assimilates]
//! vegetative_priority = 0.7
//! ```

use chrono::NaiveDate;
use palmsim_components::environment::{SoilTexture, WeatherDefaults};
use palmsim_components::parameters::{
    AssimilateParameters, BunchComponentsParameters, FemaleParameters, FrondParameters,
    GenerativeParameters, IndeterminateParameters, RootParameters, SoilParameters,
    TrunkParameters, WeatherParameters,
};
use palmsim_core::config::{
    check_non_negative, check_positive, from_toml_file, from_toml_str, Validate,
};
use palmsim_core::errors::{PalmSimError, PalmSimResult};
use palmsim_core::timestep::{FloatValue, MAX_TIMESTEP};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The plantation being simulated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldSettings {
    /// default: 2001-06-15
    pub planting_date: NaiveDate,
    /// unit: palms/ha
    /// default: 143
    pub planting_density: FloatValue,
    /// unit: degrees north
    /// default: 0
    pub latitude: FloatValue,
    /// default: loamy sand
    pub soil_texture: SoilTexture,
    /// Rooting depth; without it the default water holding capacity applies
    /// unit: m
    /// default: 1
    pub soil_depth: Option<FloatValue>,
    /// Timestep
    /// unit: day
    /// default: 10
    pub dt: u32,
    /// Weather used where no daily series is supplied
    pub weather: WeatherDefaults,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            planting_date: NaiveDate::from_ymd_opt(2001, 6, 15).unwrap_or_default(),
            planting_density: 143.0,
            latitude: 0.0,
            soil_texture: SoilTexture::LoamySand,
            soil_depth: Some(1.0),
            dt: 10,
            weather: WeatherDefaults::default(),
        }
    }
}

impl Validate for FieldSettings {
    fn validate(&self) -> PalmSimResult<()> {
        check_positive("field.planting_density", self.planting_density)?;
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(PalmSimError::invalid_parameter(
                "field.latitude",
                format!("must lie within [-90, 90], got {}", self.latitude),
            ));
        }
        if let Some(depth) = self.soil_depth {
            check_positive("field.soil_depth", depth)?;
        }
        if !(1..=MAX_TIMESTEP).contains(&self.dt) {
            return Err(PalmSimError::invalid_parameter(
                "field.dt",
                format!("must be between 1 and {} days, got {}", MAX_TIMESTEP, self.dt),
            ));
        }
        let weather = &self.weather;
        check_non_negative("field.weather.radiation", weather.radiation)?;
        check_non_negative("field.weather.rainfall", weather.rainfall)?;
        check_non_negative("field.weather.windspeed", weather.windspeed)
    }
}

/// Parameters of every component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParameterSet {
    pub fronds: FrondParameters,
    pub trunk: TrunkParameters,
    pub roots: RootParameters,
    pub generative: GenerativeParameters,
    pub indeterminate: IndeterminateParameters,
    pub female: FemaleParameters,
    pub bunch_components: BunchComponentsParameters,
    pub assimilates: AssimilateParameters,
    pub soil: SoilParameters,
    pub weather: WeatherParameters,
}

impl Validate for ParameterSet {
    fn validate(&self) -> PalmSimResult<()> {
        self.fronds.validate()?;
        self.trunk.validate()?;
        self.roots.validate()?;
        self.generative.validate()?;
        self.indeterminate.validate()?;
        self.female.validate()?;
        self.bunch_components.validate()?;
        self.assimilates.validate()?;
        self.soil.validate()?;
        self.weather.validate()
    }
}

/// A complete, validated simulation setup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub field: FieldSettings,
    pub parameters: ParameterSet,
}

impl SimulationConfig {
    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(text: &str) -> PalmSimResult<Self> {
        let config: Self = from_toml_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> PalmSimResult<Self> {
        let config: Self = from_toml_file(path)?;
        config.validate()?;
        Ok(config)
    }
}

impl Validate for SimulationConfig {
    fn validate(&self) -> PalmSimResult<()> {
        self.field.validate()?;
        self.parameters.validate()
    }
}
