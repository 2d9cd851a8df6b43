//! Environment of the stand: daily weather and the soil water balance.

pub mod soil;
pub mod weather;

pub use soil::{Soil, SoilTexture};
pub use weather::{DailySeries, DailyWeather, Weather, WeatherDefaults, WeatherVariable};
