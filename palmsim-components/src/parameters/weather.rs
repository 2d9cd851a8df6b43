//! Weather parameters
//!
//! Radiation constants follow Goudriaan & Van Laar (1994), the reference
//! evapotranspiration FAO Irrigation and Drainage Paper 56.

use palmsim_core::config::{check_fraction, check_positive, Validate};
use palmsim_core::errors::PalmSimResult;
use palmsim_core::timestep::FloatValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherParameters {
    /// Albedo of an oil palm canopy
    /// unit: dimensionless
    /// default: 0.14
    pub albedo: FloatValue,
    /// Albedo of the grass reference crop
    /// unit: dimensionless
    /// default: 0.23
    pub crop_reference_albedo: FloatValue,
    /// unit: m
    /// default: 0.12
    pub crop_reference_height: FloatValue,
    /// unit: s/m
    /// default: 100
    pub crop_reference_stomatal_resistance: FloatValue,
    /// unit: dimensionless
    /// default: 0.41
    pub karman_constant: FloatValue,
    /// unit: MJ/kg
    /// default: 2.454
    pub latent_heat_water: FloatValue,
    /// Fraction of global radiation that is photosynthetically active
    /// unit: dimensionless
    /// default: 0.5
    pub par_fraction: FloatValue,
    /// unit: kPa/degC
    /// default: 0.067
    pub psychrometer_coefficient: FloatValue,
    /// Molecular weight of water vapour over that of dry air
    /// unit: dimensionless
    /// default: 0.622
    pub ratio_molecular_weight: FloatValue,
    /// Transmission of a clear sky
    /// unit: dimensionless
    /// default: 0.7
    pub reference_transmission_factor: FloatValue,
    /// Stefan-Boltzmann constant
    /// unit: W/m2/K4
    /// default: 5.67e-8
    pub sigma: FloatValue,
    /// unit: J/m2/s
    /// default: 1367
    pub solar_constant: FloatValue,
    /// unit: kJ/kg/K
    /// default: 0.287
    pub specific_gas_constant: FloatValue,
    /// unit: W/m2/K6
    /// default: 5.31e-13
    pub swinbank_constant: FloatValue,
    /// unit: deg
    /// default: 23.45
    pub tilt_of_earth: FloatValue,
    /// Height of the weather station instruments
    /// unit: m
    /// default: 2
    pub measurement_height: FloatValue,
}

impl Default for WeatherParameters {
    fn default() -> Self {
        Self {
            albedo: 0.14,
            crop_reference_albedo: 0.23,
            crop_reference_height: 0.12,
            crop_reference_stomatal_resistance: 100.0,
            karman_constant: 0.41,
            latent_heat_water: 2.454,
            par_fraction: 0.5,
            psychrometer_coefficient: 0.067,
            ratio_molecular_weight: 0.622,
            reference_transmission_factor: 0.7,
            sigma: 5.670e-8,
            solar_constant: 1367.0,
            specific_gas_constant: 0.287,
            swinbank_constant: 5.31e-13,
            tilt_of_earth: 23.45,
            measurement_height: 2.0,
        }
    }
}

impl Validate for WeatherParameters {
    fn validate(&self) -> PalmSimResult<()> {
        check_fraction("weather.albedo", self.albedo)?;
        check_fraction("weather.crop_reference_albedo", self.crop_reference_albedo)?;
        check_fraction("weather.par_fraction", self.par_fraction)?;
        check_positive(
            "weather.reference_transmission_factor",
            self.reference_transmission_factor,
        )?;
        check_positive("weather.solar_constant", self.solar_constant)?;
        check_positive("weather.crop_reference_height", self.crop_reference_height)?;
        check_positive("weather.measurement_height", self.measurement_height)
    }
}
