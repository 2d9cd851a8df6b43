//! Tabulated output of a simulation run.

use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, Axis};
use palmsim_core::errors::{PalmSimError, PalmSimResult};
use palmsim_core::timestep::FloatValue;
use palmsim_core::variable::{OutputState, ReportedValue};
use serde::{Deserialize, Serialize};

/// Reported values of every step of a run.
///
/// Rows are steps and columns are `"<name> (<unit>)"` keys in report order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    columns: Vec<String>,
    dates: Vec<NaiveDate>,
    values: Array2<FloatValue>,
}

impl SimulationOutput {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &Array2<FloatValue> {
        &self.values
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Values of one column over the run, by its full key.
    pub fn column(&self, key: &str) -> Option<ArrayView1<'_, FloatValue>> {
        let index = self.columns.iter().position(|c| c == key)?;
        Some(self.values.column(index))
    }

    /// The output state of a recorded step.
    pub fn row(&self, step: usize) -> Option<OutputState> {
        if step >= self.len() {
            return None;
        }
        let row = self.values.index_axis(Axis(0), step);
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(row.iter().copied())
                .collect(),
        )
    }
}

/// Accumulates reports step by step.
#[derive(Debug, Clone, Default)]
pub(crate) struct OutputRecorder {
    columns: Vec<String>,
    dates: Vec<NaiveDate>,
    values: Vec<FloatValue>,
}

impl OutputRecorder {
    pub(crate) fn record(
        &mut self,
        date: NaiveDate,
        report: &[ReportedValue],
    ) -> PalmSimResult<()> {
        if self.columns.is_empty() {
            self.columns = report.iter().map(ReportedValue::key).collect();
        } else if report.len() != self.columns.len() {
            return Err(PalmSimError::Error(format!(
                "step on {} reported {} values, expected {}",
                date,
                report.len(),
                self.columns.len()
            )));
        }
        self.dates.push(date);
        self.values.extend(report.iter().map(|r| r.value));
        Ok(())
    }

    pub(crate) fn finish(self) -> PalmSimResult<SimulationOutput> {
        let shape = (self.dates.len(), self.columns.len());
        let values = Array2::from_shape_vec(shape, self.values)
            .map_err(|e| PalmSimError::Error(format!("inconsistent output table: {}", e)))?;
        Ok(SimulationOutput {
            columns: self.columns,
            dates: self.dates,
            values,
        })
    }
}
