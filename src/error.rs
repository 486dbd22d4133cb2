//! Custom error types for the driver.
//!
//! This module defines the primary error type, `Anc300Error`, for the entire
//! crate. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle the failures a controller session can run into,
//! from an address that cannot be opened to a motion wait that never
//! completes.
//!
//! Variants fall into three groups:
//!
//! - **Session lifecycle**: `ConnectionFailed` at open time, and
//!   `InstrumentClosed` for any access after `close()`.
//! - **Axis access and parameters**: `InvalidSlot` for slot numbers outside
//!   1-7, `NoSuchAxis` for slots without an installed module, and the
//!   out-of-range variants for frequency and amplitude values the controller
//!   would refuse.
//! - **Motion and hardware**: `WaitMoveTimeout` when an axis never reports
//!   idle, and `Fault` for anything the backend reports that has no more
//!   specific variant.
//!
//! Configuration and I/O errors from the `config` crate and `std::io` convert
//! via `#[from]`, so the `?` operator works throughout the crate.

use std::time::Duration;
use thiserror::Error;

/// Convenience alias for results using the driver error type.
pub type DriverResult<T> = std::result::Result<T, Anc300Error>;

#[derive(Error, Debug)]
pub enum Anc300Error {
    #[error("Failed to open controller at '{address}': {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("Invalid axis slot {0} (valid slots are 1-7)")]
    InvalidSlot(u8),

    #[error("No axis module detected in slot {0}")]
    NoSuchAxis(u8),

    #[error("Instrument '{0}' has been closed")]
    InstrumentClosed(String),

    #[error("Frequency {0} Hz out of range (1-10000 Hz)")]
    FrequencyOutOfRange(u32),

    #[error("Amplitude {0} V out of range (0-150 V)")]
    AmplitudeOutOfRange(u32),

    #[error("Axis {axis} still moving after {timeout:?}")]
    WaitMoveTimeout { axis: u8, timeout: Duration },

    #[error("Controller fault: {0}")]
    Fault(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Anc300Error::NoSuchAxis(5);
        assert_eq!(err.to_string(), "No axis module detected in slot 5");
    }

    #[test]
    fn test_connection_failed_display() {
        let err = Anc300Error::ConnectionFailed {
            address: "ASRL1::INSTR".to_string(),
            reason: "port busy".to_string(),
        };
        assert!(err.to_string().contains("ASRL1::INSTR"));
        assert!(err.to_string().contains("port busy"));
    }
}
