//! Backend trait for ANC300-class step controllers.
//!
//! The trait is the seam between the typed driver API and whatever actually
//! carries the commands (serial, VISA, or a simulation). Implementations own
//! the connection and are responsible for parameter validation the way the
//! physical controller is: the instrument layer forwards values unchecked.

use crate::error::DriverResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of axis module slots in the controller chassis.
pub const AXIS_SLOTS: u8 = 7;

/// Description of an axis module detected during probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisInfo {
    /// Module serial number as reported by the controller.
    pub serial: String,
}

/// Operating mode of an axis module.
///
/// The controller accepts short ASCII tokens for these; the driver keeps
/// them as a closed enum and only renders the token at the backend boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisMode {
    /// Output grounded; no stepping possible.
    #[serde(rename = "gnd")]
    Ground,
    /// Stepping mode; required before issuing step commands.
    #[serde(rename = "stp")]
    Step,
    /// DC offset mode for fine positioning.
    #[serde(rename = "off")]
    Offset,
    /// Capacitance measurement mode.
    #[serde(rename = "cap")]
    Capacitance,
}

impl AxisMode {
    /// The token the controller uses for this mode.
    pub fn token(self) -> &'static str {
        match self {
            AxisMode::Ground => "gnd",
            AxisMode::Step => "stp",
            AxisMode::Offset => "off",
            AxisMode::Capacitance => "cap",
        }
    }
}

impl fmt::Display for AxisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for AxisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gnd" => Ok(AxisMode::Ground),
            "stp" => Ok(AxisMode::Step),
            "off" => Ok(AxisMode::Offset),
            "cap" => Ok(AxisMode::Capacitance),
            other => Err(format!("unknown axis mode token: {other}")),
        }
    }
}

/// Hardware backend for a multi-axis piezo step controller.
///
/// Slots are numbered 1 through [`AXIS_SLOTS`]. Implementations must answer
/// `probe_axis` with `None` for empty slots and reject parameter or motion
/// commands addressed to them.
#[async_trait]
pub trait StepperBackend: Send + Sync {
    /// Open the connection to the controller at `address`.
    async fn connect(&mut self, address: &str) -> DriverResult<()>;

    /// Release the connection. Called once by the instrument on close.
    async fn disconnect(&mut self) -> DriverResult<()>;

    /// Check whether an axis module is installed in `slot`.
    async fn probe_axis(&mut self, slot: u8) -> DriverResult<Option<AxisInfo>>;

    /// Read the step frequency in Hz.
    async fn frequency(&mut self, slot: u8) -> DriverResult<u32>;

    /// Set the step frequency in Hz.
    async fn set_frequency(&mut self, slot: u8, hz: u32) -> DriverResult<()>;

    /// Read the operating mode.
    async fn mode(&mut self, slot: u8) -> DriverResult<AxisMode>;

    /// Set the operating mode.
    async fn set_mode(&mut self, slot: u8, mode: AxisMode) -> DriverResult<()>;

    /// Read the drive amplitude in volts.
    async fn amplitude(&mut self, slot: u8) -> DriverResult<u32>;

    /// Set the drive amplitude in volts.
    async fn set_amplitude(&mut self, slot: u8, volts: u32) -> DriverResult<()>;

    /// Issue a non-blocking step command; the sign of `steps` encodes the
    /// direction. The axis must be in step mode.
    async fn step(&mut self, slot: u8, steps: i32) -> DriverResult<()>;

    /// Report whether the axis is currently executing a step command.
    async fn is_moving(&mut self, slot: u8) -> DriverResult<bool>;

    /// Halt an in-flight step command.
    async fn stop(&mut self, slot: u8) -> DriverResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_tokens_round_trip() {
        for mode in [
            AxisMode::Ground,
            AxisMode::Step,
            AxisMode::Offset,
            AxisMode::Capacitance,
        ] {
            let parsed: AxisMode = mode.token().parse().unwrap();
            assert_eq!(parsed, mode);
        }
    }

    #[test]
    fn test_unknown_mode_token_rejected() {
        assert!("inp2".parse::<AxisMode>().is_err());
        assert!("STP".parse::<AxisMode>().is_err());
    }
}
