//! Hardware access layer.
//!
//! The driver never talks to a serial port or VISA session directly; all
//! controller I/O goes through the [`StepperBackend`] trait so the same
//! instrument code runs against real hardware or the in-memory
//! [`SimController`].

pub mod backend;
pub mod sim;

pub use backend::{AxisInfo, AxisMode, StepperBackend, AXIS_SLOTS};
pub use sim::SimController;
