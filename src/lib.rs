//! Process-based growth and yield simulation of oil palm plantations.
//!
//! A [`PalmField`](field::PalmField) owns the palms of one hectare (fronds,
//! trunk, roots and the inflorescence cohorts), its weather and its soil, and
//! advances them together on a calendar clock. Configuration is read from
//! TOML with [`SimulationConfig`](config::SimulationConfig).
//!
//! ```no_run
//! use palmsim::config::SimulationConfig;
//! use palmsim::field::PalmField;
//!
//! let config = SimulationConfig::from_file("plantation.toml")?;
//! let mut field = PalmField::from_config(config)?;
//! let output = field.run(15 * 365)?;
//! let ffb = output.column("generative_FFB_production (t/ha/year)");
//! # Ok::<(), palmsim_core::errors::PalmSimError>(())
//! ```

pub mod config;
pub mod field;
pub mod output;
