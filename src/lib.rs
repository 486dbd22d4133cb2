//! Async driver for the Attocube ANC300 piezo step controller.
//!
//! The ANC300 is a rack chassis with up to seven plug-in axis modules, each
//! driving one piezo positioner in open loop. This crate models the chassis
//! as an [`instrument::Anc300`] handle that probes the axis slots at open
//! time and hands out one [`instrument::Axis`] per detected module. Each
//! axis exposes the device's settable parameters (step frequency, operating
//! mode, drive amplitude) and the step/wait motion primitives.
//!
//! The wire protocol and serial/VISA transport are not part of this crate.
//! All hardware access goes through the [`hardware::StepperBackend`] trait;
//! [`hardware::SimController`] is a complete in-memory implementation used
//! by the tests and the demo tool.

pub mod config;
pub mod error;
pub mod hardware;
pub mod instrument;

pub use error::{Anc300Error, DriverResult};
pub use hardware::{AxisInfo, AxisMode, SimController, StepperBackend};
pub use instrument::{Anc300, Axis, AxisId};
