//! Simulated time: the calendar clock of a field and the per-step context
//! handed to every component.

use crate::errors::{PalmSimError, PalmSimResult};
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Floating point type used for all state and rates.
pub type FloatValue = f64;

/// Longest supported timestep (days).
pub const MAX_TIMESTEP: u32 = 31;

/// Snapshot of simulated time and stand properties for one step.
///
/// Components never hold a reference to the field that owns them. Whatever
/// they need to know about plant age or stand density is read from this
/// value, which the field rebuilds after advancing its clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepContext {
    /// Timestep length
    /// unit: day
    pub dt: FloatValue,
    /// Days after planting at the end of the step
    /// unit: day
    pub days_after_planting: FloatValue,
    /// Calendar months after planting
    /// unit: month
    pub months_after_planting: FloatValue,
    /// unit: day
    pub day_of_year: FloatValue,
    /// unit: day
    pub days_in_year: FloatValue,
    /// unit: day
    pub days_in_month: FloatValue,
    /// unit: palm/ha
    pub planting_density: FloatValue,
}

impl StepContext {
    /// Context for exercising a single component outside a field:
    /// a freshly planted stand of 143 palms/ha and a one day step.
    pub fn standalone() -> Self {
        Self {
            dt: 1.0,
            days_after_planting: 0.0,
            months_after_planting: 0.0,
            day_of_year: 1.0,
            days_in_year: 365.0,
            days_in_month: 30.0,
            planting_density: 143.0,
        }
    }

    /// Same context at another plant age (days after planting).
    pub fn at_age(self, days_after_planting: FloatValue) -> Self {
        Self {
            days_after_planting,
            months_after_planting: (12.0 * days_after_planting / self.days_in_year).floor(),
            ..self
        }
    }

    pub fn with_dt(self, dt: FloatValue) -> Self {
        Self { dt, ..self }
    }

    pub fn with_density(self, planting_density: FloatValue) -> Self {
        Self {
            planting_density,
            ..self
        }
    }

    /// Plant age in (fractional) years.
    pub fn years_after_planting(&self) -> FloatValue {
        self.days_after_planting / self.days_in_year
    }
}

/// Calendar clock of a planted field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationClock {
    planting_date: NaiveDate,
    date: NaiveDate,
    dt: u32,
    step: usize,
}

impl SimulationClock {
    /// Start a clock on the planting date, advancing `dt` days per step.
    pub fn new(planting_date: NaiveDate, dt: u32) -> PalmSimResult<Self> {
        if !(1..=MAX_TIMESTEP).contains(&dt) {
            return Err(PalmSimError::invalid_parameter(
                "dt",
                format!("timestep must be between 1 and {} days, got {}", MAX_TIMESTEP, dt),
            ));
        }
        Ok(Self {
            planting_date,
            date: planting_date,
            dt,
            step: 0,
        })
    }

    /// Move the clock forward by one timestep.
    pub fn advance(&mut self) -> PalmSimResult<()> {
        self.date = self
            .date
            .checked_add_days(Days::new(self.dt as u64))
            .ok_or_else(|| PalmSimError::Error(format!("date overflow after {}", self.date)))?;
        self.step += 1;
        Ok(())
    }

    pub fn planting_date(&self) -> NaiveDate {
        self.planting_date
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn dt(&self) -> u32 {
        self.dt
    }

    /// Number of completed steps.
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn days_after_planting(&self) -> i64 {
        (self.date - self.planting_date).num_days()
    }

    /// Calendar months between planting and the current date, ignoring days.
    pub fn months_after_planting(&self) -> i32 {
        12 * (self.date.year() - self.planting_date.year()) + self.date.month() as i32
            - self.planting_date.month() as i32
    }

    pub fn day_of_year(&self) -> u32 {
        self.date.ordinal()
    }

    pub fn days_in_year(&self) -> u32 {
        if NaiveDate::from_ymd_opt(self.date.year(), 2, 29).is_some() {
            366
        } else {
            365
        }
    }

    pub fn days_in_month(&self) -> u32 {
        let (year, month) = (self.date.year(), self.date.month());
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        match (
            NaiveDate::from_ymd_opt(year, month, 1),
            NaiveDate::from_ymd_opt(next_year, next_month, 1),
        ) {
            (Some(first), Some(next)) => (next - first).num_days() as u32,
            _ => 30,
        }
    }

    /// Context handed to components for the current step.
    pub fn context(&self, planting_density: FloatValue) -> StepContext {
        StepContext {
            dt: self.dt as FloatValue,
            days_after_planting: self.days_after_planting() as FloatValue,
            months_after_planting: self.months_after_planting() as FloatValue,
            day_of_year: self.day_of_year() as FloatValue,
            days_in_year: self.days_in_year() as FloatValue,
            days_in_month: self.days_in_month() as FloatValue,
            planting_density,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn timestep_is_validated() {
        assert!(SimulationClock::new(date(2001, 6, 15), 0).is_err());
        assert!(SimulationClock::new(date(2001, 6, 15), 32).is_err());
        assert!(SimulationClock::new(date(2001, 6, 15), 31).is_ok());
    }

    #[test]
    fn advancing_moves_date_and_counts_steps() {
        let mut clock = SimulationClock::new(date(2001, 6, 15), 10).unwrap();
        clock.advance().unwrap();
        clock.advance().unwrap();
        assert_eq!(clock.date(), date(2001, 7, 5));
        assert_eq!(clock.step(), 2);
        assert_eq!(clock.days_after_planting(), 20);
        assert_eq!(clock.months_after_planting(), 1);
    }

    #[test]
    fn calendar_lengths() {
        let mut clock = SimulationClock::new(date(2004, 2, 10), 1).unwrap();
        assert_eq!(clock.days_in_month(), 29);
        assert_eq!(clock.days_in_year(), 366);
        for _ in 0..365 {
            clock.advance().unwrap();
        }
        assert_eq!(clock.date(), date(2005, 2, 9));
        assert_eq!(clock.days_in_month(), 28);
        assert_eq!(clock.days_in_year(), 365);
        assert_eq!(clock.months_after_planting(), 12);
    }

    #[test]
    fn december_has_31_days() {
        let clock = SimulationClock::new(date(2003, 12, 2), 5).unwrap();
        assert_eq!(clock.days_in_month(), 31);
        assert_eq!(clock.day_of_year(), 336);
    }

    #[test]
    fn context_reflects_clock() {
        let mut clock = SimulationClock::new(date(2001, 1, 1), 10).unwrap();
        clock.advance().unwrap();
        let ctx = clock.context(160.0);
        assert_eq!(ctx.dt, 10.0);
        assert_eq!(ctx.days_after_planting, 10.0);
        assert_eq!(ctx.day_of_year, 11.0);
        assert_eq!(ctx.planting_density, 160.0);
    }
}
