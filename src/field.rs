//! A planted field of oil palms and its simulation loop.
//!
//! Each step, in order:
//!
//! 1. advance the clock and read the day's weather
//! 2. produce assimilates, reduced by the soil water stress of the previous
//!    step
//! 3. partition the assimilates among fronds, trunk, roots and inflorescences
//! 4. grow the vegetative organs
//! 5. run the cohort population lifecycle
//! 6. update the soil water balance under the new canopy

use crate::config::{FieldSettings, ParameterSet, SimulationConfig};
use crate::output::{OutputRecorder, SimulationOutput};
use chrono::NaiveDate;
use palmsim_components::assimilates::{AssimilatePartitioner, SinkDemand, SinkDemands};
use palmsim_components::environment::{DailySeries, DailyWeather, Soil, Weather, WeatherVariable};
use palmsim_components::generative::CohortPopulation;
use palmsim_components::vegetative::{Fronds, Organ, Roots, Trunk};
use palmsim_core::define_static_variable;
use palmsim_core::errors::PalmSimResult;
use palmsim_core::timestep::{FloatValue, SimulationClock, StepContext};
use palmsim_core::variable::{to_output_state, OutputState, Reportable, ReportedValue};
use tracing::{debug, info};

define_static_variable!(

    VAR_FIELD_DAYS_AFTER_PLANTING,

    name = "field_days_after_planting",

    unit = "day",

    description = "Age of the plantation",

);
define_static_variable!(
    VAR_FIELD_CUMULATIVE_BUNCH_COUNT,
    name = "field_cumulative_bunch_count",
    unit = "1/ha",
    description = "Bunches harvested since planting",
);

/// One hectare of palms with its weather and soil.
#[derive(Debug, Clone)]
pub struct PalmField {
    settings: FieldSettings,
    clock: SimulationClock,
    weather: Weather,
    day: DailyWeather,
    soil: Soil,
    fronds: Fronds,
    trunk: Trunk,
    roots: Roots,
    generative: CohortPopulation,
    assimilates: AssimilatePartitioner,
    /// unit: 1/ha
    cumulative_bunch_count: FloatValue,
}

impl PalmField {
    /// A field planted with the default configuration.
    pub fn new() -> PalmSimResult<Self> {
        Self::from_config(SimulationConfig::default())
    }

    /// A freshly planted field.
    pub fn from_config(config: SimulationConfig) -> PalmSimResult<Self> {
        let SimulationConfig { field, parameters } = config;
        let ParameterSet {
            fronds,
            trunk,
            roots,
            generative,
            indeterminate,
            female,
            bunch_components,
            assimilates,
            soil,
            weather,
        } = parameters;

        let density = field.planting_density;
        let clock = SimulationClock::new(field.planting_date, field.dt)?;
        let weather = Weather::from_parameters(weather, field.weather);
        let day = weather.day(clock.date(), field.latitude, &clock.context(density))?;

        Ok(Self {
            clock,
            day,
            weather,
            soil: Soil::from_parameters(soil, field.soil_texture, field.soil_depth)?,
            fronds: Fronds::from_parameters(fronds, density),
            trunk: Trunk::from_parameters(trunk, density)?,
            roots: Roots::from_parameters(roots, density)?,
            generative: CohortPopulation::from_parameters(
                generative,
                indeterminate,
                female,
                bunch_components,
            ),
            assimilates: AssimilatePartitioner::from_parameters(assimilates),
            cumulative_bunch_count: 0.0,
            settings: field,
        })
    }

    /// Drive `variable` from an observed daily series.
    ///
    /// The other variables keep their configured defaults and weather
    /// parameters.
    pub fn with_weather_series(mut self, variable: WeatherVariable, series: DailySeries) -> Self {
        self.weather.set_series(variable, series);
        self
    }

    pub fn settings(&self) -> &FieldSettings {
        &self.settings
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn date(&self) -> NaiveDate {
        self.clock.date()
    }

    pub fn context(&self) -> StepContext {
        self.clock.context(self.settings.planting_density)
    }

    pub fn weather(&self) -> &Weather {
        &self.weather
    }

    pub fn weather_mut(&mut self) -> &mut Weather {
        &mut self.weather
    }

    /// Weather of the last step.
    pub fn day(&self) -> &DailyWeather {
        &self.day
    }

    pub fn soil(&self) -> &Soil {
        &self.soil
    }

    pub fn fronds(&self) -> &Fronds {
        &self.fronds
    }

    pub fn trunk(&self) -> &Trunk {
        &self.trunk
    }

    pub fn roots(&self) -> &Roots {
        &self.roots
    }

    pub fn generative(&self) -> &CohortPopulation {
        &self.generative
    }

    pub fn assimilates(&self) -> &AssimilatePartitioner {
        &self.assimilates
    }

    /// Bunches harvested since planting (1/ha).
    pub fn cumulative_bunch_count(&self) -> FloatValue {
        self.cumulative_bunch_count
    }

    /// Advance the field by one timestep.
    ///
    /// Failures carry the step index and date.
    pub fn step(&mut self) -> PalmSimResult<()> {
        self.clock.advance()?;
        self.advance()
            .map_err(|e| e.at_step(self.clock.step(), self.clock.date()))
    }

    fn advance(&mut self) -> PalmSimResult<()> {
        let context = self.context();
        self.day = self
            .weather
            .day(self.clock.date(), self.settings.latitude, &context)?;

        let supply = self
            .fronds
            .assimilate(&context, &self.day, self.soil.transpiration_reduction());
        let demands = SinkDemands {
            fronds: SinkDemand::new(
                self.fronds.potential_sink_strength(&context),
                self.fronds.maintenance_requirement(),
            ),
            trunk: SinkDemand::new(
                self.trunk.potential_sink_strength(&context),
                self.trunk.maintenance_requirement(),
            ),
            roots: SinkDemand::new(
                self.roots.potential_sink_strength(&context),
                self.roots.maintenance_requirement(),
            ),
            generative: SinkDemand::new(
                self.generative.potential_sink_strength(),
                self.generative.maintenance_requirement(),
            ),
        };
        let allocation = self.assimilates.allocate(supply, demands)?;

        self.fronds.set_assim_growth(allocation.fronds);
        self.trunk.set_assim_growth(allocation.trunk);
        self.roots.set_assim_growth(allocation.roots);
        self.fronds.update(&context)?;
        self.trunk.update(&context)?;
        self.roots.update(&context)?;

        let frond_initiation_rate = self.fronds.initiation_rate(&context);
        self.generative
            .update(&context, allocation.generative, frond_initiation_rate)?;

        self.soil
            .update(&context, &self.day, self.fronds.fraction_intercepted(&context))?;

        if let Some(harvest) = self.generative.harvest() {
            self.cumulative_bunch_count += harvest.num_bunches;
        }
        debug!(
            step = self.clock.step(),
            date = %self.clock.date(),
            supply,
            generative = allocation.generative,
            "step complete"
        );
        Ok(())
    }

    /// Step for `duration_days` days, recording every step.
    ///
    /// A trailing remainder shorter than the timestep is not simulated.
    pub fn run(&mut self, duration_days: u32) -> PalmSimResult<SimulationOutput> {
        let steps = duration_days / self.clock.dt();
        info!(
            planting_date = %self.clock.planting_date(),
            start = %self.clock.date(),
            steps,
            dt = self.clock.dt(),
            "starting run"
        );
        let mut recorder = OutputRecorder::default();
        for _ in 0..steps {
            self.step()?;
            recorder.record(self.clock.date(), &self.report())?;
        }
        info!(
            end = %self.clock.date(),
            cumulative_bunch_count = self.cumulative_bunch_count,
            "run finished"
        );
        recorder.finish()
    }

    /// Reported values of every component at the current step.
    pub fn report(&self) -> Vec<ReportedValue> {
        let context = self.context();
        let mut values = vec![
            VAR_FIELD_DAYS_AFTER_PLANTING.report(context.days_after_planting),
            VAR_FIELD_CUMULATIVE_BUNCH_COUNT.report(self.cumulative_bunch_count),
        ];
        let components: [&dyn Reportable; 7] = [
            &self.day,
            &self.fronds,
            &self.trunk,
            &self.roots,
            &self.generative,
            &self.assimilates,
            &self.soil,
        ];
        for component in components {
            values.extend(component.report(&context));
        }
        values
    }

    /// Flat `"<name> (<unit>)"` mapping of the current step.
    pub fn output_state(&self) -> OutputState {
        to_output_state(&self.report())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_field_starts_at_planting() {
        let field = PalmField::new().unwrap();
        assert_eq!(field.date(), field.clock().planting_date());
        assert_eq!(field.cumulative_bunch_count(), 0.0);
        assert!(field.trunk().mass() > 0.0);
        assert_eq!(field.generative().number_of_cohorts(), 0);
    }

    #[test]
    fn step_advances_by_timestep() {
        let mut field = PalmField::new().unwrap();
        field.step().unwrap();
        field.step().unwrap();
        assert_eq!(field.clock().days_after_planting(), 20);
        assert_eq!(field.generative().number_of_cohorts(), 2);
    }

    #[test]
    fn output_state_is_keyed_by_name_and_unit() {
        let mut field = PalmField::new().unwrap();
        field.step().unwrap();
        let state = field.output_state();
        assert_eq!(state.get("field_days_after_planting (day)"), Some(&10.0));
        assert!(state.contains_key("trunk_mass (kg_DM/ha)"));
        assert!(state.contains_key("generative_FFB_production (t/ha/year)"));
        assert!(state.contains_key("soil_available_water (mm)"));
        assert!(state.contains_key("assimilates_produced (kg_CH2O/ha/day)"));
        assert_eq!(state.len(), field.report().len(), "duplicate output keys");
    }

    #[test]
    fn run_records_every_step() {
        let mut field = PalmField::new().unwrap();
        let output = field.run(365).unwrap();
        assert_eq!(output.len(), 36);
        assert_eq!(output.dates()[0], field.clock().planting_date() + chrono::Days::new(10));
        assert_eq!(output.columns().len(), field.report().len());
    }

    #[test]
    fn observed_series_keeps_configured_defaults() {
        let config =
            SimulationConfig::from_toml_str("[field.weather]\nradiation = 15.0\n").unwrap();
        let planting = config.field.planting_date;
        let rainfall =
            DailySeries::new((1..=30u64).map(|d| (planting + chrono::Days::new(d), 0.0)))
                .unwrap();
        let mut field = PalmField::from_config(config)
            .unwrap()
            .with_weather_series(WeatherVariable::Rainfall, rainfall);
        field.step().unwrap();
        assert_eq!(field.day().rainfall, 0.0);
        assert_eq!(field.day().radiation, 15.0);
    }
}
