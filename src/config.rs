//! Configuration loading and validation.
//!
//! Settings are layered the usual way: built-in defaults, then an optional
//! TOML file, then `ANC300__`-prefixed environment variables. A minimal file
//! looks like:
//!
//! ```toml
//! [instrument]
//! name = "anc300"
//! address = "ASRL1::INSTR"
//! wait_move_timeout_ms = 60000
//!
//! [[axes]]
//! slot = 1
//! frequency = 500
//! mode = "stp"
//! amplitude = 25
//! ```
//!
//! Values that parse but are semantically wrong (duplicate slots, a
//! frequency the controller would refuse) are caught by
//! [`Settings::validate`] and reported as `Configuration` errors.

use crate::error::{Anc300Error, DriverResult};
use crate::hardware::{AxisMode, AXIS_SLOTS};
use crate::instrument::Anc300;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Instrument identity and session settings.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentSettings {
    /// Logical instrument name used in logs and errors.
    pub name: String,
    /// Transport resource address (e.g. a serial resource identifier).
    pub address: String,
    /// Upper bound on a single wait-move call, in milliseconds.
    pub wait_move_timeout_ms: u64,
}

/// Startup defaults for one axis.
#[derive(Debug, Clone, Deserialize)]
pub struct AxisDefaults {
    /// Axis slot, 1-7.
    pub slot: u8,
    /// Step frequency in Hz, if it should be set at startup.
    pub frequency: Option<u32>,
    /// Operating mode, if it should be set at startup.
    pub mode: Option<AxisMode>,
    /// Drive amplitude in volts, if it should be set at startup.
    pub amplitude: Option<u32>,
}

/// Top-level driver settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Instrument identity and session settings.
    pub instrument: InstrumentSettings,
    /// Per-axis startup defaults.
    #[serde(default)]
    pub axes: Vec<AxisDefaults>,
}

impl Settings {
    /// Load settings from defaults, an optional TOML file, and environment
    /// variables prefixed with `ANC300__`.
    pub fn new(config_path: Option<&Path>) -> DriverResult<Self> {
        let mut builder = Config::builder()
            .set_default("instrument.name", "anc300")?
            .set_default("instrument.address", "ASRL1::INSTR")?
            .set_default("instrument.wait_move_timeout_ms", 60_000i64)?;

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix("ANC300")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check semantic constraints that parsing cannot.
    pub fn validate(&self) -> DriverResult<()> {
        if self.instrument.name.is_empty() {
            return Err(Anc300Error::Configuration(
                "instrument.name must not be empty".to_string(),
            ));
        }
        if self.instrument.wait_move_timeout_ms == 0 {
            return Err(Anc300Error::Configuration(
                "instrument.wait_move_timeout_ms must be positive".to_string(),
            ));
        }

        let mut seen = [false; AXIS_SLOTS as usize + 1];
        for axis in &self.axes {
            if !(1..=AXIS_SLOTS).contains(&axis.slot) {
                return Err(Anc300Error::Configuration(format!(
                    "axis slot {} outside 1-{}",
                    axis.slot, AXIS_SLOTS
                )));
            }
            if seen[axis.slot as usize] {
                return Err(Anc300Error::Configuration(format!(
                    "duplicate axis slot {}",
                    axis.slot
                )));
            }
            seen[axis.slot as usize] = true;

            if let Some(hz) = axis.frequency {
                if !(1..=10_000).contains(&hz) {
                    return Err(Anc300Error::Configuration(format!(
                        "axis {} frequency {} Hz outside 1-10000",
                        axis.slot, hz
                    )));
                }
            }
            if let Some(v) = axis.amplitude {
                if v > 150 {
                    return Err(Anc300Error::Configuration(format!(
                        "axis {} amplitude {} V above 150",
                        axis.slot, v
                    )));
                }
            }
        }

        Ok(())
    }

    /// Wait-move timeout as a [`Duration`].
    pub fn wait_move_timeout(&self) -> Duration {
        Duration::from_millis(self.instrument.wait_move_timeout_ms)
    }

    /// Push the configured axis defaults to an open controller.
    ///
    /// Fails if a configured slot has no detected module.
    pub async fn apply_axis_defaults(&self, controller: &Anc300) -> DriverResult<()> {
        for defaults in &self.axes {
            let axis = controller.axis(defaults.slot)?;
            if let Some(hz) = defaults.frequency {
                axis.set_frequency(hz).await?;
            }
            if let Some(volts) = defaults.amplitude {
                axis.set_amplitude(volts).await?;
            }
            if let Some(mode) = defaults.mode {
                axis.set_mode(mode).await?;
            }
        }
        Ok(())
    }
}
