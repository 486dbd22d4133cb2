//! Simulated ANC300 controller.
//!
//! Provides a full in-memory implementation of [`StepperBackend`] for
//! testing and demos without physical hardware. Parameter writes are stored
//! per axis with read-after-write consistency, and step commands follow a
//! simple timing model: a burst of `n` steps at frequency `f` Hz keeps the
//! axis in the Moving state for `|n| / f` seconds.

use crate::error::{Anc300Error, DriverResult};
use crate::hardware::backend::{AxisInfo, AxisMode, StepperBackend, AXIS_SLOTS};
use async_trait::async_trait;
use log::debug;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Step frequency range accepted by the controller, in Hz.
const FREQUENCY_RANGE: std::ops::RangeInclusive<u32> = 1..=10_000;
/// Drive amplitude range accepted by the controller, in volts.
const AMPLITUDE_RANGE: std::ops::RangeInclusive<u32> = 0..=150;

/// Factory defaults of a freshly powered axis module.
const DEFAULT_FREQUENCY_HZ: u32 = 210;
const DEFAULT_AMPLITUDE_V: u32 = 30;

/// State of one simulated axis module.
#[derive(Debug, Clone)]
struct SimAxis {
    serial: String,
    frequency_hz: u32,
    amplitude_v: u32,
    mode: AxisMode,
    /// Deadline of the current step burst; `None` while idle.
    moving_until: Option<Instant>,
}

impl SimAxis {
    fn new(slot: u8) -> Self {
        Self {
            serial: format!("ANM150-SIM-{slot:02}"),
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            amplitude_v: DEFAULT_AMPLITUDE_V,
            mode: AxisMode::Ground,
            moving_until: None,
        }
    }

    fn is_moving(&self) -> bool {
        self.moving_until.is_some_and(|t| Instant::now() < t)
    }
}

/// Simulated multi-axis step controller.
///
/// By default, slots 1 and 2 hold axis modules and the remaining slots are
/// empty; use [`SimController::with_installed_slots`] to change that. An
/// empty address string is treated as an unreachable resource so connection
/// failures can be exercised.
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimController::with_installed_slots(&[1, 3]);
/// sim.connect("ASRL1::INSTR").await?;
/// assert!(sim.probe_axis(1).await?.is_some());
/// assert!(sim.probe_axis(2).await?.is_none());
/// ```
pub struct SimController {
    axes: BTreeMap<u8, SimAxis>,
    connected: bool,
}

impl SimController {
    /// Create a simulated controller with modules in slots 1 and 2.
    pub fn new() -> Self {
        Self::with_installed_slots(&[1, 2])
    }

    /// Create a simulated controller with modules in the given slots.
    ///
    /// Slot numbers outside 1-7 are ignored.
    pub fn with_installed_slots(slots: &[u8]) -> Self {
        let axes = slots
            .iter()
            .copied()
            .filter(|s| (1..=AXIS_SLOTS).contains(s))
            .map(|s| (s, SimAxis::new(s)))
            .collect();

        Self {
            axes,
            connected: false,
        }
    }

    fn check_connected(&self) -> DriverResult<()> {
        if self.connected {
            Ok(())
        } else {
            Err(Anc300Error::Fault("backend not connected".to_string()))
        }
    }

    fn axis(&self, slot: u8) -> DriverResult<&SimAxis> {
        self.check_connected()?;
        if !(1..=AXIS_SLOTS).contains(&slot) {
            return Err(Anc300Error::InvalidSlot(slot));
        }
        self.axes.get(&slot).ok_or(Anc300Error::NoSuchAxis(slot))
    }

    fn axis_mut(&mut self, slot: u8) -> DriverResult<&mut SimAxis> {
        self.check_connected()?;
        if !(1..=AXIS_SLOTS).contains(&slot) {
            return Err(Anc300Error::InvalidSlot(slot));
        }
        self.axes
            .get_mut(&slot)
            .ok_or(Anc300Error::NoSuchAxis(slot))
    }
}

impl Default for SimController {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepperBackend for SimController {
    async fn connect(&mut self, address: &str) -> DriverResult<()> {
        if address.is_empty() {
            return Err(Anc300Error::ConnectionFailed {
                address: address.to_string(),
                reason: "no such resource".to_string(),
            });
        }

        self.connected = true;
        debug!("SimController connected at '{}'", address);
        Ok(())
    }

    async fn disconnect(&mut self) -> DriverResult<()> {
        self.connected = false;
        debug!("SimController disconnected");
        Ok(())
    }

    async fn probe_axis(&mut self, slot: u8) -> DriverResult<Option<AxisInfo>> {
        self.check_connected()?;
        if !(1..=AXIS_SLOTS).contains(&slot) {
            return Err(Anc300Error::InvalidSlot(slot));
        }

        Ok(self.axes.get(&slot).map(|axis| AxisInfo {
            serial: axis.serial.clone(),
        }))
    }

    async fn frequency(&mut self, slot: u8) -> DriverResult<u32> {
        Ok(self.axis(slot)?.frequency_hz)
    }

    async fn set_frequency(&mut self, slot: u8, hz: u32) -> DriverResult<()> {
        if !FREQUENCY_RANGE.contains(&hz) {
            return Err(Anc300Error::FrequencyOutOfRange(hz));
        }
        self.axis_mut(slot)?.frequency_hz = hz;
        Ok(())
    }

    async fn mode(&mut self, slot: u8) -> DriverResult<AxisMode> {
        Ok(self.axis(slot)?.mode)
    }

    async fn set_mode(&mut self, slot: u8, mode: AxisMode) -> DriverResult<()> {
        let axis = self.axis_mut(slot)?;
        // Leaving step mode grounds the output and cancels any burst.
        if mode != AxisMode::Step {
            axis.moving_until = None;
        }
        axis.mode = mode;
        Ok(())
    }

    async fn amplitude(&mut self, slot: u8) -> DriverResult<u32> {
        Ok(self.axis(slot)?.amplitude_v)
    }

    async fn set_amplitude(&mut self, slot: u8, volts: u32) -> DriverResult<()> {
        if !AMPLITUDE_RANGE.contains(&volts) {
            return Err(Anc300Error::AmplitudeOutOfRange(volts));
        }
        self.axis_mut(slot)?.amplitude_v = volts;
        Ok(())
    }

    async fn step(&mut self, slot: u8, steps: i32) -> DriverResult<()> {
        let axis = self.axis_mut(slot)?;
        if axis.mode != AxisMode::Step {
            return Err(Anc300Error::Fault(format!(
                "axis {} is in {} mode, stepping requires stp",
                slot, axis.mode
            )));
        }

        if steps == 0 {
            return Ok(());
        }

        let duration = Duration::from_secs_f64(steps.unsigned_abs() as f64 / axis.frequency_hz as f64);
        // A new burst replaces any burst still in flight.
        axis.moving_until = Some(Instant::now() + duration);
        debug!(
            "SimController axis {} stepping {} steps over {:?}",
            slot, steps, duration
        );
        Ok(())
    }

    async fn is_moving(&mut self, slot: u8) -> DriverResult<bool> {
        let axis = self.axis_mut(slot)?;
        if !axis.is_moving() {
            axis.moving_until = None;
        }
        Ok(axis.moving_until.is_some())
    }

    async fn stop(&mut self, slot: u8) -> DriverResult<()> {
        let axis = self.axis_mut(slot)?;
        if axis.moving_until.take().is_some() {
            debug!("SimController axis {} stopped mid-burst", slot);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn connected_sim(slots: &[u8]) -> SimController {
        let mut sim = SimController::with_installed_slots(slots);
        sim.connect("ASRL1::INSTR").await.unwrap();
        sim
    }

    #[tokio::test]
    async fn test_probe_reports_installed_slots_only() {
        let mut sim = connected_sim(&[1, 3]).await;

        assert!(sim.probe_axis(1).await.unwrap().is_some());
        assert!(sim.probe_axis(2).await.unwrap().is_none());
        assert!(sim.probe_axis(3).await.unwrap().is_some());
        assert!(matches!(
            sim.probe_axis(8).await,
            Err(Anc300Error::InvalidSlot(8))
        ));
    }

    #[tokio::test]
    async fn test_connect_rejects_empty_address() {
        let mut sim = SimController::new();
        assert!(matches!(
            sim.connect("").await,
            Err(Anc300Error::ConnectionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_parameter_read_after_write() {
        let mut sim = connected_sim(&[1]).await;

        assert_eq!(sim.frequency(1).await.unwrap(), 210);
        sim.set_frequency(1, 200).await.unwrap();
        assert_eq!(sim.frequency(1).await.unwrap(), 200);

        assert_eq!(sim.amplitude(1).await.unwrap(), 30);
        sim.set_amplitude(1, 25).await.unwrap();
        assert_eq!(sim.amplitude(1).await.unwrap(), 25);

        assert_eq!(sim.mode(1).await.unwrap(), AxisMode::Ground);
        sim.set_mode(1, AxisMode::Step).await.unwrap();
        assert_eq!(sim.mode(1).await.unwrap(), AxisMode::Step);
    }

    #[tokio::test]
    async fn test_out_of_range_values_rejected() {
        let mut sim = connected_sim(&[1]).await;

        assert!(matches!(
            sim.set_frequency(1, 0).await,
            Err(Anc300Error::FrequencyOutOfRange(0))
        ));
        assert!(matches!(
            sim.set_frequency(1, 20_000).await,
            Err(Anc300Error::FrequencyOutOfRange(20_000))
        ));
        assert!(matches!(
            sim.set_amplitude(1, 151).await,
            Err(Anc300Error::AmplitudeOutOfRange(151))
        ));
    }

    #[tokio::test]
    async fn test_step_requires_step_mode() {
        let mut sim = connected_sim(&[1]).await;

        // Fresh module powers up grounded.
        assert!(matches!(sim.step(1, 10).await, Err(Anc300Error::Fault(_))));

        sim.set_mode(1, AxisMode::Step).await.unwrap();
        sim.step(1, 10).await.unwrap();
    }

    #[tokio::test]
    async fn test_step_burst_finishes_after_expected_time() {
        let mut sim = connected_sim(&[1]).await;
        sim.set_mode(1, AxisMode::Step).await.unwrap();
        sim.set_frequency(1, 1000).await.unwrap();

        // 100 steps at 1 kHz: 100ms of motion.
        sim.step(1, 100).await.unwrap();
        assert!(sim.is_moving(1).await.unwrap());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!sim.is_moving(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_stop_cancels_burst() {
        let mut sim = connected_sim(&[1]).await;
        sim.set_mode(1, AxisMode::Step).await.unwrap();
        sim.set_frequency(1, 10).await.unwrap();

        // 100 steps at 10 Hz would take 10 seconds.
        sim.step(1, 100).await.unwrap();
        assert!(sim.is_moving(1).await.unwrap());

        sim.stop(1).await.unwrap();
        assert!(!sim.is_moving(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_zero_steps_is_a_no_op() {
        let mut sim = connected_sim(&[1]).await;
        sim.set_mode(1, AxisMode::Step).await.unwrap();

        sim.step(1, 0).await.unwrap();
        assert!(!sim.is_moving(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_negative_steps_move_too() {
        let mut sim = connected_sim(&[1]).await;
        sim.set_mode(1, AxisMode::Step).await.unwrap();
        sim.set_frequency(1, 10).await.unwrap();

        sim.step(1, -50).await.unwrap();
        assert!(sim.is_moving(1).await.unwrap());
        sim.stop(1).await.unwrap();
    }
}
