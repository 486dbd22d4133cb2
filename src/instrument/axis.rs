//! Per-axis handle and axis identifiers.

use crate::error::{Anc300Error, DriverResult};
use crate::hardware::AxisMode;
use crate::instrument::anc300::ControllerShared;
use log::debug;
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;

/// Identifier of an axis slot (1-7) in the controller chassis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AxisId(u8);

impl AxisId {
    /// Create an identifier, rejecting slot numbers outside 1-7.
    pub fn new(slot: u8) -> DriverResult<Self> {
        if (1..=crate::hardware::AXIS_SLOTS).contains(&slot) {
            Ok(Self(slot))
        } else {
            Err(Anc300Error::InvalidSlot(slot))
        }
    }

    /// The slot number, 1-7.
    pub fn slot(self) -> u8 {
        self.0
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "axis{}", self.0)
    }
}

/// Handle to one axis module of an open controller session.
///
/// Handles are cheap to clone and share the session with the [`Anc300`]
/// that created them; every call fails with `InstrumentClosed` once the
/// session has been closed.
///
/// [`Anc300`]: crate::instrument::Anc300
#[derive(Clone)]
pub struct Axis {
    shared: Arc<ControllerShared>,
    id: AxisId,
}

impl Axis {
    pub(crate) fn new(shared: Arc<ControllerShared>, id: AxisId) -> Self {
        Self { shared, id }
    }

    /// Identifier of this axis.
    pub fn id(&self) -> AxisId {
        self.id
    }

    /// Read the step frequency in Hz.
    pub async fn frequency(&self) -> DriverResult<u32> {
        self.shared.check_open()?;
        self.shared
            .backend
            .lock()
            .await
            .frequency(self.id.slot())
            .await
    }

    /// Set the step frequency in Hz.
    pub async fn set_frequency(&self, hz: u32) -> DriverResult<()> {
        self.shared.check_open()?;
        self.shared
            .backend
            .lock()
            .await
            .set_frequency(self.id.slot(), hz)
            .await?;
        debug!("{} frequency set to {} Hz", self.id, hz);
        Ok(())
    }

    /// Read the operating mode.
    pub async fn mode(&self) -> DriverResult<AxisMode> {
        self.shared.check_open()?;
        self.shared.backend.lock().await.mode(self.id.slot()).await
    }

    /// Set the operating mode. Step commands require [`AxisMode::Step`].
    pub async fn set_mode(&self, mode: AxisMode) -> DriverResult<()> {
        self.shared.check_open()?;
        self.shared
            .backend
            .lock()
            .await
            .set_mode(self.id.slot(), mode)
            .await?;
        debug!("{} mode set to {}", self.id, mode);
        Ok(())
    }

    /// Read the drive amplitude in volts.
    pub async fn amplitude(&self) -> DriverResult<u32> {
        self.shared.check_open()?;
        self.shared
            .backend
            .lock()
            .await
            .amplitude(self.id.slot())
            .await
    }

    /// Set the drive amplitude in volts.
    pub async fn set_amplitude(&self, volts: u32) -> DriverResult<()> {
        self.shared.check_open()?;
        self.shared
            .backend
            .lock()
            .await
            .set_amplitude(self.id.slot(), volts)
            .await?;
        debug!("{} amplitude set to {} V", self.id, volts);
        Ok(())
    }

    /// Issue a step command and return without waiting for completion.
    ///
    /// The sign of `steps` encodes the direction. The controller executes
    /// the burst in real time; use [`Axis::wait_move`] to block until it
    /// finishes.
    pub async fn step_by(&self, steps: i32) -> DriverResult<()> {
        self.shared.check_open()?;
        self.shared
            .backend
            .lock()
            .await
            .step(self.id.slot(), steps)
            .await?;
        debug!("{} stepping by {}", self.id, steps);
        Ok(())
    }

    /// Whether the axis is currently executing a step command.
    pub async fn is_moving(&self) -> DriverResult<bool> {
        self.shared.check_open()?;
        self.shared
            .backend
            .lock()
            .await
            .is_moving(self.id.slot())
            .await
    }

    /// Block until the current step command has finished.
    ///
    /// The axis leaves the Moving state either by exhausting its step count
    /// or through an explicit [`Axis::stop`]. Polls the controller until
    /// then; gives up with [`Anc300Error::WaitMoveTimeout`] after the
    /// session's wait-move timeout.
    pub async fn wait_move(&self) -> DriverResult<()> {
        let deadline = Instant::now() + self.shared.wait_timeout;

        loop {
            if !self.is_moving().await? {
                return Ok(());
            }

            if Instant::now() >= deadline {
                return Err(Anc300Error::WaitMoveTimeout {
                    axis: self.id.slot(),
                    timeout: self.shared.wait_timeout,
                });
            }

            tokio::time::sleep(self.shared.wait_poll).await;
        }
    }

    /// Halt an in-flight step command.
    pub async fn stop(&self) -> DriverResult<()> {
        self.shared.check_open()?;
        self.shared.backend.lock().await.stop(self.id.slot()).await?;
        debug!("{} stop issued", self.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_id_bounds() {
        assert!(AxisId::new(0).is_err());
        assert!(AxisId::new(1).is_ok());
        assert!(AxisId::new(7).is_ok());
        assert!(AxisId::new(8).is_err());
    }

    #[test]
    fn test_axis_id_display() {
        let id = AxisId::new(3).unwrap();
        assert_eq!(id.to_string(), "axis3");
        assert_eq!(id.slot(), 3);
    }
}
