//! Typed instrument layer.
//!
//! [`Anc300`] owns the controller session and the set of axes detected at
//! open time; [`Axis`] is the per-module handle the rest of an application
//! works with.

pub mod anc300;
pub mod axis;

pub use anc300::Anc300;
pub use axis::{Axis, AxisId};
