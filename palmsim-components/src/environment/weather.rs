//! Daily weather and derived radiation quantities.
//!
//! Observed weather is supplied as date-keyed [`DailySeries`]. A date missing
//! from a series falls back to that series' all-time mean; a variable with no
//! series at all uses the scalar [`WeatherDefaults`].
//!
//! # Algorithm
//!
//! Solar geometry follows Goudriaan & Van Laar (1994). With solar
//! declination $\delta$ and latitude $\phi$ the sine of the solar height over
//! the day is
//!
//! $$ \sin\beta(h) = a + b \cos\left(2\pi \frac{h - 12}{24}\right),
//!    \quad a = \sin\phi \sin\delta,\ b = \cos\phi \cos\delta $$
//!
//! The reference evapotranspiration is the FAO-56 Penman-Monteith equation
//! for a grass reference crop.

use crate::parameters::WeatherParameters;
use chrono::NaiveDate;
use palmsim_core::define_static_variable;
use palmsim_core::errors::{PalmSimError, PalmSimResult};
use palmsim_core::timestep::{FloatValue, StepContext};
use palmsim_core::variable::{Reportable, ReportedValue};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;
use tracing::trace;

const SECONDS_PER_DAY: FloatValue = 86400.0;
const ZERO_CELSIUS: FloatValue = 273.16;

/// Daily weather variables that can be driven by a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherVariable {
    /// unit: MJ/m2/day
    Radiation,
    /// unit: mm/day
    Rainfall,
    /// unit: degC
    Temperature,
    /// unit: %
    Humidity,
    /// unit: m/s
    Windspeed,
}

/// Date-keyed daily values with their all-time mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    values: BTreeMap<NaiveDate, FloatValue>,
    mean: FloatValue,
}

impl DailySeries {
    pub fn new(values: impl IntoIterator<Item = (NaiveDate, FloatValue)>) -> PalmSimResult<Self> {
        let values: BTreeMap<NaiveDate, FloatValue> = values.into_iter().collect();
        if values.is_empty() {
            return Err(PalmSimError::Error(
                "a weather series needs at least one value".to_string(),
            ));
        }
        let mean = values.values().sum::<FloatValue>() / values.len() as FloatValue;
        Ok(Self { values, mean })
    }

    pub fn mean(&self) -> FloatValue {
        self.mean
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value on `date`, if observed.
    pub fn get(&self, date: NaiveDate) -> Option<FloatValue> {
        self.values.get(&date).copied()
    }
}

/// Weather used when no series is available for a variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherDefaults {
    /// unit: MJ/m2/day
    /// default: 20
    pub radiation: FloatValue,
    /// unit: mm/day
    /// default: 7
    pub rainfall: FloatValue,
    /// unit: degC
    /// default: 28
    pub temperature: FloatValue,
    /// unit: %
    /// default: 86
    pub humidity: FloatValue,
    /// unit: m/s
    /// default: 2
    pub windspeed: FloatValue,
}

impl Default for WeatherDefaults {
    fn default() -> Self {
        Self {
            radiation: 20.0,
            rainfall: 7.0,
            temperature: 28.0,
            humidity: 86.0,
            windspeed: 2.0,
        }
    }
}

impl WeatherDefaults {
    fn get(&self, variable: WeatherVariable) -> FloatValue {
        match variable {
            WeatherVariable::Radiation => self.radiation,
            WeatherVariable::Rainfall => self.rainfall,
            WeatherVariable::Temperature => self.temperature,
            WeatherVariable::Humidity => self.humidity,
            WeatherVariable::Windspeed => self.windspeed,
        }
    }
}

/// Source of daily weather for a field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Weather {
    parameters: WeatherParameters,
    defaults: WeatherDefaults,
    series: HashMap<WeatherVariable, DailySeries>,
}

impl Weather {
    pub fn new() -> Self {
        Self::from_parameters(WeatherParameters::default(), WeatherDefaults::default())
    }

    pub fn from_parameters(parameters: WeatherParameters, defaults: WeatherDefaults) -> Self {
        Self {
            parameters,
            defaults,
            series: HashMap::new(),
        }
    }

    pub fn with_series(mut self, variable: WeatherVariable, series: DailySeries) -> Self {
        self.series.insert(variable, series);
        self
    }

    pub fn set_series(&mut self, variable: WeatherVariable, series: DailySeries) {
        self.series.insert(variable, series);
    }

    pub fn parameters(&self) -> &WeatherParameters {
        &self.parameters
    }

    /// Value of `variable` on `date`.
    pub fn lookup(&self, variable: WeatherVariable, date: NaiveDate) -> FloatValue {
        match self.series.get(&variable) {
            Some(series) => series.get(date).unwrap_or_else(|| {
                trace!(variable = ?variable, date = %date, "no observation, using series mean");
                series.mean()
            }),
            None => self.defaults.get(variable),
        }
    }

    /// Weather and solar geometry of one day.
    pub fn day(
        &self,
        date: NaiveDate,
        latitude: FloatValue,
        context: &StepContext,
    ) -> PalmSimResult<DailyWeather> {
        let rainfall = self.lookup(WeatherVariable::Rainfall, date);
        if rainfall < 0.0 {
            return Err(PalmSimError::invariant("weather", "rainfall", rainfall));
        }
        let radiation = self.lookup(WeatherVariable::Radiation, date);
        if radiation < 0.0 {
            return Err(PalmSimError::invariant("weather", "radiation", radiation));
        }

        let (mean, amplitude) = self.solar_height_coefficients(
            context.day_of_year,
            context.days_in_year,
            latitude,
        )?;

        Ok(DailyWeather {
            parameters: self.parameters.clone(),
            radiation,
            rainfall,
            temperature: self.lookup(WeatherVariable::Temperature, date),
            humidity: self.lookup(WeatherVariable::Humidity, date),
            windspeed: self.lookup(WeatherVariable::Windspeed, date).max(0.0),
            day_of_year: context.day_of_year,
            days_in_year: context.days_in_year,
            sine_solar_height_mean: mean,
            sine_solar_height_amplitude: amplitude,
        })
    }

    /// Mean and amplitude of the sine of solar height over the day.
    pub fn solar_height_coefficients(
        &self,
        day_of_year: FloatValue,
        days_in_year: FloatValue,
        latitude: FloatValue,
    ) -> PalmSimResult<(FloatValue, FloatValue)> {
        let sin_declination = -self.parameters.tilt_of_earth.to_radians().sin()
            * (2.0 * PI * (day_of_year + 10.0) / days_in_year).cos();
        let cos_declination = (1.0 - sin_declination.powi(2)).sqrt();
        let phi = latitude.to_radians();

        let a = phi.sin() * sin_declination;
        let b = phi.cos() * cos_declination;
        if !(-1.0..=1.0).contains(&a) {
            return Err(PalmSimError::invariant("weather", "sine_solar_height_mean", a));
        }
        if !(0.0..=1.0).contains(&b) {
            return Err(PalmSimError::invariant(
                "weather",
                "sine_solar_height_amplitude",
                b,
            ));
        }
        Ok((a, b))
    }
}

/// Weather of one day together with its solar geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyWeather {
    parameters: WeatherParameters,
    /// unit: MJ/m2/day
    pub radiation: FloatValue,
    /// unit: mm/day
    pub rainfall: FloatValue,
    /// unit: degC
    pub temperature: FloatValue,
    /// unit: %
    pub humidity: FloatValue,
    /// unit: m/s
    pub windspeed: FloatValue,
    pub day_of_year: FloatValue,
    pub days_in_year: FloatValue,
    pub sine_solar_height_mean: FloatValue,
    pub sine_solar_height_amplitude: FloatValue,
}

impl DailyWeather {
    /// Photosynthetically active radiation (MJ/m2/day).
    pub fn par(&self) -> FloatValue {
        self.parameters.par_fraction * self.radiation
    }

    fn day_ratio(&self) -> FloatValue {
        if self.sine_solar_height_amplitude > 0.0 {
            (self.sine_solar_height_mean / self.sine_solar_height_amplitude).clamp(-1.0, 1.0)
        } else if self.sine_solar_height_mean > 0.0 {
            1.0
        } else {
            -1.0
        }
    }

    pub fn hour_of_dawn(&self) -> FloatValue {
        12.0 * self.day_ratio().acos() / PI
    }

    pub fn hour_of_dusk(&self) -> FloatValue {
        12.0 * (2.0 - self.day_ratio().acos() / PI)
    }

    /// unit: hour
    pub fn daylength(&self) -> FloatValue {
        (self.hour_of_dusk() - self.hour_of_dawn()).max(0.0)
    }

    pub fn eccentricity_factor(&self) -> FloatValue {
        1.0 + 0.033 * (2.0 * PI * (self.day_of_year - 10.0) / self.days_in_year).cos()
    }

    /// Sine of the solar height at `hour`, zero at night.
    pub fn sine_solar_height(&self, hour: FloatValue) -> FloatValue {
        (self.sine_solar_height_mean
            + self.sine_solar_height_amplitude * (2.0 * PI * (hour - 12.0) / 24.0).cos())
        .max(0.0)
    }

    /// Solar irradiance at the top of the atmosphere at `hour` (J/m2/s).
    pub fn radiation_extraterrestrial(&self, hour: FloatValue) -> FloatValue {
        self.parameters.solar_constant * self.sine_solar_height(hour) * self.eccentricity_factor()
    }

    /// Daily solar irradiation at the top of the atmosphere (MJ/m2/day).
    pub fn radiation_extraterrestrial_daily(&self) -> FloatValue {
        let d = self.daylength();
        let a = self.sine_solar_height_mean;
        let b = self.sine_solar_height_amplitude;
        let integral = a * d + (24.0 * b / PI) * ((PI / 2.0) * (d / 12.0 - 1.0)).cos();
        1e-6 * 3600.0 * self.parameters.solar_constant * integral * self.eccentricity_factor()
    }

    /// Atmospheric transmission: observed over extraterrestrial radiation.
    pub fn transmission_factor(&self) -> FloatValue {
        let extraterrestrial = self.radiation_extraterrestrial_daily();
        if extraterrestrial > 0.0 {
            self.radiation / extraterrestrial
        } else {
            0.0
        }
    }

    /// Daily mean diffuse fraction of radiation (De Jong, 1980).
    pub fn fraction_diffuse(&self) -> FloatValue {
        let f = self.transmission_factor();
        if f < 0.07 {
            1.0
        } else if f < 0.35 {
            1.0 - 2.3 * (f - 0.07).powi(2)
        } else if f < 0.75 {
            1.33 - 1.46 * f
        } else {
            0.23
        }
    }

    /// Lower bound on the diffuse fraction at low solar heights.
    pub fn fraction_diffuse_lower_limit(&self, hour: FloatValue) -> FloatValue {
        let sinb = self.sine_solar_height(hour);
        if sinb > 0.0 {
            0.15 + 0.85 * (1.0 - (-0.1 / sinb).exp())
        } else {
            0.0
        }
    }

    /// Diffuse fraction at `hour`.
    pub fn fraction_diffuse_at(&self, hour: FloatValue) -> FloatValue {
        self.fraction_diffuse()
            .max(self.fraction_diffuse_lower_limit(hour))
    }

    /// Photosynthetically active irradiance at `hour` (J/m2/s).
    pub fn par_at(&self, hour: FloatValue) -> FloatValue {
        self.parameters.par_fraction
            * self.transmission_factor()
            * self.radiation_extraterrestrial(hour)
    }

    /// Saturated vapour pressure from Tetens' formula (kPa).
    pub fn saturated_vapour_pressure(&self) -> FloatValue {
        let t = self.temperature;
        0.610588 * (17.32491 * t / (t + ZERO_CELSIUS - 35.86)).exp()
    }

    /// Slope of the saturated vapour pressure curve (kPa/degC).
    pub fn saturated_vapour_pressure_slope(&self) -> FloatValue {
        let offset = ZERO_CELSIUS - 35.86;
        offset * 17.32491 * self.saturated_vapour_pressure() / (self.temperature + offset).powi(2)
    }

    /// unit: kPa
    pub fn vapour_pressure_deficit(&self) -> FloatValue {
        let saturated = self.saturated_vapour_pressure();
        saturated - 0.01 * self.humidity * saturated
    }

    fn radiation_longwave_earth(&self) -> FloatValue {
        self.parameters.sigma * (self.temperature + ZERO_CELSIUS).powi(4)
    }

    /// Long-wave sky radiation from an adapted Swinbank formula (J/m2/s).
    ///
    /// Interpolates between the clear-sky Swinbank estimate and black-body
    /// sky radiation using the transmission factor.
    fn radiation_longwave_sky(&self) -> FloatValue {
        let a = self.transmission_factor();
        let a0 = self.parameters.reference_transmission_factor;
        let t = self.temperature + ZERO_CELSIUS;
        (a / a0) * self.parameters.swinbank_constant * t.powi(6)
            + ((a0 - a) / a0) * self.radiation_longwave_earth()
    }

    /// Net radiation captured by a surface of the given albedo (MJ/m2/day).
    pub fn net_radiation(&self, albedo: FloatValue) -> FloatValue {
        let to_daily = 1e-6 * SECONDS_PER_DAY;
        (1.0 - albedo) * self.radiation
            + to_daily * (self.radiation_longwave_sky() - self.radiation_longwave_earth())
    }

    /// Aerodynamic resistance of the grass reference crop (s/m).
    pub fn aerodynamic_resistance(&self) -> FloatValue {
        let p = &self.parameters;
        let displacement = 2.0 / 3.0 * p.crop_reference_height;
        let roughness_momentum = 0.123 * p.crop_reference_height;
        let roughness_heat = 0.1 * roughness_momentum;
        let z = p.measurement_height - displacement;
        (z / roughness_momentum).ln() * (z / roughness_heat).ln()
            / (p.karman_constant.powi(2) * self.windspeed)
    }

    /// Bulk surface resistance of the grass reference crop (s/m).
    pub fn bulk_surface_resistance(&self) -> FloatValue {
        let active_lai = 0.5 * 24.0 * self.parameters.crop_reference_height;
        self.parameters.crop_reference_stomatal_resistance / active_lai
    }

    /// Reference evapotranspiration (mm/day), floored at zero.
    pub fn et_potential(&self) -> FloatValue {
        let p = &self.parameters;
        let rn = self.net_radiation(p.crop_reference_albedo);
        let slope = self.saturated_vapour_pressure_slope();
        let ra = self.aerodynamic_resistance();
        let rs = self.bulk_surface_resistance();

        let virtual_temperature = 1.01 * (self.temperature + ZERO_CELSIUS);
        let air_heat_capacity = p.psychrometer_coefficient * p.ratio_molecular_weight
            * p.latent_heat_water
            / (virtual_temperature * p.specific_gas_constant);

        let numerator =
            slope * rn + SECONDS_PER_DAY * air_heat_capacity * self.vapour_pressure_deficit() / ra;
        let denominator = slope + p.psychrometer_coefficient * (1.0 + rs / ra);
        (numerator / denominator / p.latent_heat_water).max(0.0)
    }
}

define_static_variable!(

    VAR_RADIATION,

    name = "weather_radiation",

    unit = "MJ/m2/day",

    description = "Global radiation",

);
define_static_variable!(
    VAR_PAR,
    name = "weather_PAR",
    unit = "MJ/m2/day",
    description = "Photosynthetically active radiation",
);
define_static_variable!(
    VAR_RAINFALL,
    name = "weather_rainfall",
    unit = "mm/day",
    description = "Rainfall",
);
define_static_variable!(
    VAR_TEMPERATURE,
    name = "weather_temperature",
    unit = "degC",
    description = "Mean air temperature",
);
define_static_variable!(
    VAR_HUMIDITY,
    name = "weather_humidity",
    unit = "%",
    description = "Relative humidity",
);
define_static_variable!(
    VAR_WINDSPEED,
    name = "weather_windspeed",
    unit = "m/s",
    description = "Wind speed",
);
define_static_variable!(
    VAR_DAYLENGTH,
    name = "weather_daylength",
    unit = "hour",
    description = "Length of the day",
);
define_static_variable!(
    VAR_TRANSMISSION,
    name = "weather_transmission_factor",
    unit = "1",
    description = "Atmospheric transmission",
);
define_static_variable!(
    VAR_FRACTION_DIFFUSE,
    name = "weather_fraction_diffuse",
    unit = "1",
    description = "Daily diffuse fraction",
);
define_static_variable!(
    VAR_EXTRATERRESTRIAL,
    name = "weather_radiation_extraterrestrial_daily",
    unit = "MJ/m2/day",
    description = "Radiation at the top of the atmosphere",
);
define_static_variable!(
    VAR_VPD,
    name = "weather_vapour_pressure_deficit",
    unit = "kPa",
    description = "Vapour pressure deficit",
);
define_static_variable!(
    VAR_NET_RADIATION,
    name = "weather_canopy_net_radiation_capture",
    unit = "MJ/m2/day",
    description = "Net radiation captured by the canopy",
);
define_static_variable!(
    VAR_ET_POTENTIAL,
    name = "weather_ET_potential",
    unit = "mm/day",
    description = "Reference evapotranspiration",
);

impl Reportable for DailyWeather {
    fn report(&self, _context: &StepContext) -> Vec<ReportedValue> {
        vec![
            VAR_RADIATION.report(self.radiation),
            VAR_PAR.report(self.par()),
            VAR_RAINFALL.report(self.rainfall),
            VAR_TEMPERATURE.report(self.temperature),
            VAR_HUMIDITY.report(self.humidity),
            VAR_WINDSPEED.report(self.windspeed),
            VAR_DAYLENGTH.report(self.daylength()),
            VAR_TRANSMISSION.report(self.transmission_factor()),
            VAR_FRACTION_DIFFUSE.report(self.fraction_diffuse()),
            VAR_EXTRATERRESTRIAL.report(self.radiation_extraterrestrial_daily()),
            VAR_VPD.report(self.vapour_pressure_deficit()),
            VAR_NET_RADIATION.report(self.net_radiation(self.parameters.albedo)),
            VAR_ET_POTENTIAL.report(self.et_potential()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn equator_day() -> DailyWeather {
        let ctx = StepContext::standalone();
        Weather::new().day(date(2001, 1, 1), 0.0, &ctx).unwrap()
    }

    #[test]
    fn missing_dates_fall_back_to_series_mean() {
        let series =
            DailySeries::new(vec![(date(2001, 1, 1), 10.0), (date(2001, 1, 2), 20.0)]).unwrap();
        let weather = Weather::new().with_series(WeatherVariable::Radiation, series);
        assert_eq!(weather.lookup(WeatherVariable::Radiation, date(2001, 1, 2)), 20.0);
        assert_eq!(weather.lookup(WeatherVariable::Radiation, date(2001, 3, 1)), 15.0);
        // Variables without a series use the defaults
        assert_eq!(weather.lookup(WeatherVariable::Temperature, date(2001, 3, 1)), 28.0);
    }

    #[test]
    fn empty_series_is_rejected() {
        assert!(DailySeries::new(Vec::new()).is_err());
    }

    #[test]
    fn equator_has_twelve_hour_days() {
        let day = equator_day();
        assert_relative_eq!(day.hour_of_dawn(), 6.0, epsilon = 1e-9);
        assert_relative_eq!(day.hour_of_dusk(), 18.0, epsilon = 1e-9);
        assert_relative_eq!(day.daylength(), 12.0, epsilon = 1e-9);
    }

    #[test]
    fn northern_summer_days_are_long() {
        let weather = Weather::new();
        let ctx = StepContext {
            day_of_year: 172.0,
            ..StepContext::standalone()
        };
        let day = weather.day(date(2001, 6, 21), 52.0, &ctx).unwrap();
        assert!(day.daylength() > 16.0, "daylength {:.2}", day.daylength());
        let winter = weather
            .day(date(2001, 12, 21), 52.0, &StepContext { day_of_year: 355.0, ..ctx })
            .unwrap();
        assert!(winter.daylength() < 8.5, "daylength {:.2}", winter.daylength());
    }

    #[test]
    fn sun_is_down_at_night() {
        let day = equator_day();
        assert_eq!(day.sine_solar_height(0.0), 0.0);
        assert!(day.sine_solar_height(12.0) > 0.9);
    }

    #[test]
    fn transmission_and_diffuse_fraction_are_plausible() {
        let day = equator_day();
        let extraterrestrial = day.radiation_extraterrestrial_daily();
        assert!(
            extraterrestrial > 33.0 && extraterrestrial < 40.0,
            "extraterrestrial radiation {:.2}",
            extraterrestrial
        );
        let transmission = day.transmission_factor();
        assert!(transmission > 0.4 && transmission < 0.7);
        assert_relative_eq!(day.fraction_diffuse(), 1.33 - 1.46 * transmission);
    }

    #[test]
    fn diffuse_fraction_is_one_in_darkness() {
        let weather = Weather::from_parameters(
            WeatherParameters::default(),
            WeatherDefaults {
                radiation: 0.0,
                ..WeatherDefaults::default()
            },
        );
        let day = weather
            .day(date(2001, 1, 1), 0.0, &StepContext::standalone())
            .unwrap();
        assert_eq!(day.fraction_diffuse(), 1.0);
        assert_eq!(day.par_at(12.0), 0.0);
    }

    #[test]
    fn reference_evapotranspiration_is_tropical() {
        let et = equator_day().et_potential();
        assert!(et > 2.5 && et < 6.0, "ET_potential {:.2} mm/day", et);
    }

    #[test]
    fn vapour_pressure_at_twenty_degrees() {
        let weather = Weather::from_parameters(
            WeatherParameters::default(),
            WeatherDefaults {
                temperature: 20.0,
                ..WeatherDefaults::default()
            },
        );
        let day = weather
            .day(date(2001, 1, 1), 0.0, &StepContext::standalone())
            .unwrap();
        assert_relative_eq!(day.saturated_vapour_pressure(), 2.347, epsilon = 0.005);
    }

    #[test]
    fn negative_rainfall_is_fatal() {
        let weather = Weather::from_parameters(
            WeatherParameters::default(),
            WeatherDefaults {
                rainfall: -1.0,
                ..WeatherDefaults::default()
            },
        );
        assert!(weather
            .day(date(2001, 1, 1), 0.0, &StepContext::standalone())
            .is_err());
    }
}
