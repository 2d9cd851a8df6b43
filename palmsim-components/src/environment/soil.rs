//! Soil water balance of the rooting zone.
//!
//! # Algorithm
//!
//! The water holding capacity follows from the plant available water content
//! of the soil texture class and the rooting depth. Volumetric water content
//! at suction $P$ is given by the van Genuchten curve with the tropical
//! pedotransfer parameters of Hodnett & Tomasella (2002):
//!
//! $$ \theta(P) = \theta_r + \frac{\theta_s - \theta_r}{(1 + (\alpha P)^n)^{1 - 1/n}} $$
//!
//! Plant available water is $\theta(10) - \theta(1500)$ (kPa).
//!
//! Available water $W$ changes as
//!
//! $$ \frac{dW}{dt} = P - ET - D $$
//!
//! with actual evapotranspiration a logistic function of the relative
//! available water and drainage removing anything above capacity. The
//! balance is integrated in daily sub-steps.

use crate::environment::DailyWeather;
use crate::parameters::SoilParameters;
use palmsim_core::define_static_variable;
use palmsim_core::errors::{PalmSimError, PalmSimResult};
use palmsim_core::interpolate::curves::logistic;
use palmsim_core::timestep::{FloatValue, StepContext};
use palmsim_core::variable::{Reportable, ReportedValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Suction at field capacity (kPa).
const FIELD_CAPACITY_PRESSURE: FloatValue = 10.0;
/// Suction at the permanent wilting point (kPa).
const WILTING_POINT_PRESSURE: FloatValue = 1500.0;

/// Soil texture classes with tropical pedotransfer parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilTexture {
    #[serde(rename = "sand")]
    Sand,
    #[serde(rename = "loamy sand")]
    LoamySand,
    #[serde(rename = "sandy loam")]
    SandyLoam,
    #[serde(rename = "loam")]
    Loam,
    #[serde(rename = "silty loam")]
    SiltyLoam,
    #[serde(rename = "sandy clay loam")]
    SandyClayLoam,
    #[serde(rename = "clay loam")]
    ClayLoam,
    #[serde(rename = "silty clay loam")]
    SiltyClayLoam,
    #[serde(rename = "silty clay")]
    SiltyClay,
    #[serde(rename = "sandy clay")]
    SandyClay,
    #[serde(rename = "clay")]
    Clay,
}

impl SoilTexture {
    pub const ALL: [SoilTexture; 11] = [
        SoilTexture::Sand,
        SoilTexture::LoamySand,
        SoilTexture::SandyLoam,
        SoilTexture::Loam,
        SoilTexture::SiltyLoam,
        SoilTexture::SandyClayLoam,
        SoilTexture::ClayLoam,
        SoilTexture::SiltyClayLoam,
        SoilTexture::SiltyClay,
        SoilTexture::SandyClay,
        SoilTexture::Clay,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SoilTexture::Sand => "sand",
            SoilTexture::LoamySand => "loamy sand",
            SoilTexture::SandyLoam => "sandy loam",
            SoilTexture::Loam => "loam",
            SoilTexture::SiltyLoam => "silty loam",
            SoilTexture::SandyClayLoam => "sandy clay loam",
            SoilTexture::ClayLoam => "clay loam",
            SoilTexture::SiltyClayLoam => "silty clay loam",
            SoilTexture::SiltyClay => "silty clay",
            SoilTexture::SandyClay => "sandy clay",
            SoilTexture::Clay => "clay",
        }
    }

    /// Van Genuchten parameters of the texture class.
    pub fn retention_curve(&self) -> RetentionCurve {
        let (alpha, n, saturated, residual) = match self {
            SoilTexture::Sand => (0.380, 2.474, 0.410, 0.037),
            SoilTexture::LoamySand => (0.837, 1.672, 0.438, 0.062),
            SoilTexture::SandyLoam => (0.396, 1.553, 0.461, 0.111),
            SoilTexture::Loam => (0.246, 1.461, 0.521, 0.155),
            SoilTexture::SiltyLoam => (0.191, 1.644, 0.601, 0.223),
            SoilTexture::SandyClayLoam => (0.644, 1.535, 0.413, 0.149),
            SoilTexture::ClayLoam => (0.392, 1.437, 0.519, 0.226),
            SoilTexture::SiltyClayLoam => (0.298, 1.513, 0.586, 0.267),
            SoilTexture::SiltyClay => (0.258, 1.466, 0.570, 0.278),
            SoilTexture::SandyClay => (0.509, 1.396, 0.460, 0.199),
            SoilTexture::Clay => (0.463, 1.514, 0.546, 0.267),
        };
        RetentionCurve {
            alpha,
            n,
            saturated_moisture_content: saturated,
            residual_moisture_content: residual,
        }
    }
}

impl fmt::Display for SoilTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SoilTexture {
    type Err = PalmSimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        SoilTexture::ALL
            .iter()
            .find(|texture| texture.name() == wanted)
            .copied()
            .ok_or_else(|| PalmSimError::UnknownSoilTexture(s.to_string()))
    }
}

/// Van Genuchten water retention curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionCurve {
    /// unit: 1/kPa
    pub alpha: FloatValue,
    pub n: FloatValue,
    /// unit: m3/m3
    pub saturated_moisture_content: FloatValue,
    /// unit: m3/m3
    pub residual_moisture_content: FloatValue,
}

impl RetentionCurve {
    /// Volumetric water content at suction `pressure` (kPa).
    pub fn water_content(&self, pressure: FloatValue) -> FloatValue {
        let m = 1.0 - 1.0 / self.n;
        let span = self.saturated_moisture_content - self.residual_moisture_content;
        self.residual_moisture_content + span / (1.0 + (self.alpha * pressure).powf(self.n)).powf(m)
    }

    pub fn field_capacity(&self) -> FloatValue {
        self.water_content(FIELD_CAPACITY_PRESSURE)
    }

    pub fn wilting_point(&self) -> FloatValue {
        self.water_content(WILTING_POINT_PRESSURE)
    }

    /// unit: m3/m3
    pub fn plant_available_water_content(&self) -> FloatValue {
        self.field_capacity() - self.wilting_point()
    }
}

/// Water balance of the rooting zone of one hectare.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Soil {
    parameters: SoilParameters,
    texture: SoilTexture,
    /// unit: m
    depth: Option<FloatValue>,
    /// unit: mm
    water_holding_capacity: FloatValue,
    /// unit: mm
    available_water: FloatValue,
    /// Fluxes of the last sub-step, in mm/day
    rainfall: FloatValue,
    evapotranspiration_potential: FloatValue,
    evapotranspiration: FloatValue,
    drainage: FloatValue,
    /// Canopy cover seen by the last update
    fraction_intercepted: FloatValue,
}

impl Soil {
    /// Soil of the given texture, starting at field capacity.
    ///
    /// Without a rooting depth the default water holding capacity is used.
    pub fn from_parameters(
        parameters: SoilParameters,
        texture: SoilTexture,
        depth: Option<FloatValue>,
    ) -> PalmSimResult<Self> {
        let water_holding_capacity = match depth {
            Some(d) if d > 0.0 => {
                1000.0 * texture.retention_curve().plant_available_water_content() * d
            }
            Some(d) => {
                return Err(PalmSimError::invalid_parameter(
                    "soil_depth",
                    format!("rooting depth must be positive, got {}", d),
                ))
            }
            None => parameters.default_water_holding_capacity,
        };
        Ok(Self {
            parameters,
            texture,
            depth,
            water_holding_capacity,
            available_water: water_holding_capacity,
            rainfall: 0.0,
            evapotranspiration_potential: 0.0,
            evapotranspiration: 0.0,
            drainage: 0.0,
            fraction_intercepted: 0.0,
        })
    }

    pub fn texture(&self) -> SoilTexture {
        self.texture
    }

    pub fn depth(&self) -> Option<FloatValue> {
        self.depth
    }

    /// unit: mm
    pub fn water_holding_capacity(&self) -> FloatValue {
        self.water_holding_capacity
    }

    /// unit: mm
    pub fn available_water(&self) -> FloatValue {
        self.available_water
    }

    /// Available water relative to capacity.
    pub fn moisture_content(&self) -> FloatValue {
        self.available_water / self.water_holding_capacity
    }

    /// Actual over potential evapotranspiration at relative available water `x`.
    pub fn relative_evapotranspiration_at(
        &self,
        relative_available_water: FloatValue,
    ) -> FloatValue {
        logistic(
            relative_available_water,
            self.parameters.relative_evapotranspiration_a,
            self.parameters.relative_evapotranspiration_b,
        )
    }

    pub fn relative_evapotranspiration(&self) -> FloatValue {
        self.relative_evapotranspiration_at(self.moisture_content())
    }

    /// Share of potential evapotranspiration available to the canopy.
    pub fn relative_potential_transpiration(&self) -> FloatValue {
        (1.0 - self.relative_evapotranspiration_at(0.0)) * self.fraction_intercepted
    }

    pub fn relative_transpiration(&self) -> FloatValue {
        self.relative_evapotranspiration() * self.relative_potential_transpiration()
    }

    /// Reduction of photosynthesis by water shortage, in [0, 1].
    pub fn transpiration_reduction(&self) -> FloatValue {
        self.relative_evapotranspiration()
    }

    /// unit: mm/day
    pub fn transpiration(&self) -> FloatValue {
        self.relative_transpiration() * self.evapotranspiration_potential
    }

    /// unit: mm/day
    pub fn evaporation(&self) -> FloatValue {
        self.evapotranspiration - self.transpiration()
    }

    /// Drainage of the last day (mm/day).
    pub fn drainage(&self) -> FloatValue {
        self.drainage
    }

    /// Shortfall of available water below capacity (mm).
    pub fn water_deficit(&self) -> FloatValue {
        (self.water_holding_capacity - self.available_water).max(0.0)
    }

    /// Drainage needed to keep `available_water` at capacity (mm/day).
    fn drainage_for(&self, rainfall: FloatValue, evapotranspiration: FloatValue) -> FloatValue {
        (self.available_water + rainfall - evapotranspiration - self.water_holding_capacity)
            .max(0.0)
    }

    /// Integrate the water balance over `context.dt` days of `day`'s weather.
    pub fn update(
        &mut self,
        context: &StepContext,
        day: &DailyWeather,
        fraction_intercepted: FloatValue,
    ) -> PalmSimResult<()> {
        self.fraction_intercepted = fraction_intercepted;
        self.rainfall = day.rainfall;
        self.evapotranspiration_potential = day.et_potential();

        let days = context.dt.round().max(1.0) as usize;
        for _ in 0..days {
            let evapotranspiration =
                self.relative_evapotranspiration() * self.evapotranspiration_potential;
            let drainage = self.drainage_for(self.rainfall, evapotranspiration);
            self.available_water += self.rainfall - evapotranspiration - drainage;
            if self.available_water < 0.0 {
                warn!(
                    available_water = self.available_water,
                    "soil water balance went negative, clamping to zero"
                );
                self.available_water = 0.0;
            }
            self.evapotranspiration = evapotranspiration;
            self.drainage = drainage;
        }
        Ok(())
    }
}

define_static_variable!(

    VAR_SOIL_AVAILABLE_WATER,

    name = "soil_available_water",

    unit = "mm",

    description = "Water available to the palms",

);
define_static_variable!(
    VAR_SOIL_WHC,
    name = "soil_water_holding_capacity",
    unit = "mm",
    description = "Water holding capacity of the rooting zone",
);
define_static_variable!(
    VAR_SOIL_MOISTURE,
    name = "soil_moisture_content",
    unit = "1",
    description = "Available water relative to capacity",
);
define_static_variable!(
    VAR_SOIL_WATER_DEFICIT,
    name = "soil_water_deficit",
    unit = "mm",
    description = "Shortfall below capacity",
);
define_static_variable!(
    VAR_SOIL_RAINFALL,
    name = "soil_rainfall",
    unit = "mm/day",
    description = "Rainfall",
);
define_static_variable!(
    VAR_SOIL_ET_POTENTIAL,
    name = "soil_evapotranspiration_potential",
    unit = "mm/day",
    description = "Reference evapotranspiration",
);
define_static_variable!(
    VAR_SOIL_ET,
    name = "soil_evapotranspiration",
    unit = "mm/day",
    description = "Actual evapotranspiration",
);
define_static_variable!(
    VAR_SOIL_TRANSPIRATION,
    name = "soil_transpiration",
    unit = "mm/day",
    description = "Actual transpiration",
);
define_static_variable!(
    VAR_SOIL_EVAPORATION,
    name = "soil_evaporation",
    unit = "mm/day",
    description = "Actual evaporation",
);
define_static_variable!(
    VAR_SOIL_DRAINAGE,
    name = "soil_drainage",
    unit = "mm/day",
    description = "Drainage and run-off",
);
define_static_variable!(
    VAR_SOIL_RELATIVE_ET,
    name = "soil_relative_evapotranspiration",
    unit = "1",
    description = "Actual over potential evapotranspiration",
);
define_static_variable!(
    VAR_SOIL_RELATIVE_POTENTIAL_T,
    name = "soil_relative_potential_transpiration",
    unit = "1",
    description = "Potential transpiration share",
);
define_static_variable!(
    VAR_SOIL_RELATIVE_T,
    name = "soil_relative_transpiration",
    unit = "1",
    description = "Actual transpiration share",
);
define_static_variable!(
    VAR_SOIL_TRANSPIRATION_REDUCTION,
    name = "soil_transpiration_reduction",
    unit = "1",
    description = "Water stress factor on photosynthesis",
);

impl Reportable for Soil {
    fn report(&self, _context: &StepContext) -> Vec<ReportedValue> {
        vec![
            VAR_SOIL_AVAILABLE_WATER.report(self.available_water),
            VAR_SOIL_WHC.report(self.water_holding_capacity),
            VAR_SOIL_MOISTURE.report(self.moisture_content()),
            VAR_SOIL_WATER_DEFICIT.report(self.water_deficit()),
            VAR_SOIL_RAINFALL.report(self.rainfall),
            VAR_SOIL_ET_POTENTIAL.report(self.evapotranspiration_potential),
            VAR_SOIL_ET.report(self.evapotranspiration),
            VAR_SOIL_TRANSPIRATION.report(self.transpiration()),
            VAR_SOIL_EVAPORATION.report(self.evaporation()),
            VAR_SOIL_DRAINAGE.report(self.drainage),
            VAR_SOIL_RELATIVE_ET.report(self.relative_evapotranspiration()),
            VAR_SOIL_RELATIVE_POTENTIAL_T.report(self.relative_potential_transpiration()),
            VAR_SOIL_RELATIVE_T.report(self.relative_transpiration()),
            VAR_SOIL_TRANSPIRATION_REDUCTION.report(self.transpiration_reduction()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{Weather, WeatherDefaults};
    use crate::parameters::WeatherParameters;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn dry_day(rainfall: FloatValue) -> DailyWeather {
        let weather = Weather::from_parameters(
            WeatherParameters::default(),
            WeatherDefaults {
                rainfall,
                ..WeatherDefaults::default()
            },
        );
        weather
            .day(
                NaiveDate::from_ymd_opt(2001, 1, 1).unwrap(),
                0.0,
                &StepContext::standalone(),
            )
            .unwrap()
    }

    // ===== Pedotransfer Tests =====

    #[test]
    fn texture_names_parse() {
        for texture in SoilTexture::ALL {
            assert_eq!(texture.name().parse::<SoilTexture>().unwrap(), texture);
        }
        assert_eq!("Loamy Sand".parse::<SoilTexture>().unwrap(), SoilTexture::LoamySand);
    }

    #[test]
    fn unknown_texture_is_an_error() {
        let err = "peat".parse::<SoilTexture>().unwrap_err();
        assert!(matches!(err, PalmSimError::UnknownSoilTexture(ref s) if s == "peat"));
    }

    #[test]
    fn loamy_sand_holds_about_86_mm_per_metre() {
        let soil =
            Soil::from_parameters(SoilParameters::default(), SoilTexture::LoamySand, Some(1.0))
                .unwrap();
        assert_relative_eq!(soil.water_holding_capacity(), 86.0, epsilon = 0.5);
    }

    #[test]
    fn available_water_content_is_positive_for_all_textures() {
        for texture in SoilTexture::ALL {
            let curve = texture.retention_curve();
            assert!(
                curve.plant_available_water_content() > 0.0,
                "{} has no available water",
                texture
            );
            assert!(curve.field_capacity() <= curve.saturated_moisture_content);
        }
    }

    #[test]
    fn default_capacity_without_depth() {
        let soil = Soil::from_parameters(SoilParameters::default(), SoilTexture::Clay, None)
            .unwrap();
        assert_eq!(soil.water_holding_capacity(), 500.0);
        assert_eq!(soil.water_deficit(), 0.0);
    }

    #[test]
    fn non_positive_depth_is_rejected() {
        assert!(
            Soil::from_parameters(SoilParameters::default(), SoilTexture::Clay, Some(0.0))
                .is_err()
        );
    }

    // ===== Water Balance Tests =====

    #[test]
    fn wet_soil_drains_to_capacity() {
        let mut soil =
            Soil::from_parameters(SoilParameters::default(), SoilTexture::Loam, Some(1.0))
                .unwrap();
        let day = dry_day(50.0);
        soil.update(&StepContext::standalone().with_dt(10.0), &day, 0.9)
            .unwrap();
        assert_relative_eq!(soil.available_water(), soil.water_holding_capacity());
        assert!(soil.drainage() > 0.0);
    }

    #[test]
    fn drought_dries_the_soil_without_going_negative() {
        let mut soil =
            Soil::from_parameters(SoilParameters::default(), SoilTexture::Sand, Some(0.5))
                .unwrap();
        let day = dry_day(0.0);
        let ctx = StepContext::standalone().with_dt(30.0);
        let mut previous = soil.available_water();
        for _ in 0..12 {
            soil.update(&ctx, &day, 0.9).unwrap();
            assert!(soil.available_water() <= previous);
            assert!(soil.available_water() >= 0.0);
            previous = soil.available_water();
        }
        assert!(soil.transpiration_reduction() < 0.5);
        assert!(soil.water_deficit() > 0.0);
    }

    #[test]
    fn relative_evapotranspiration_is_logistic() {
        let soil = Soil::from_parameters(SoilParameters::default(), SoilTexture::Loam, None)
            .unwrap();
        assert_relative_eq!(soil.relative_evapotranspiration_at(0.2), 0.5);
        assert!(soil.relative_evapotranspiration_at(1.0) > 0.99);
    }
}
