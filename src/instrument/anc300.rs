//! ANC300 controller handle.
//!
//! Opening the instrument connects the backend and probes every axis slot
//! once; only slots with an installed module end up in the axis map, so an
//! [`Axis`] handle can only exist for hardware that was actually detected.

use crate::error::{Anc300Error, DriverResult};
use crate::hardware::{AxisInfo, StepperBackend, AXIS_SLOTS};
use crate::instrument::axis::{Axis, AxisId};
use log::{debug, info};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Default upper bound on a single `wait_move` call.
const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(60);
/// Interval at which `wait_move` polls the motion status.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Session state shared between the controller handle and its axis handles.
pub(crate) struct ControllerShared {
    pub(crate) name: String,
    pub(crate) address: String,
    pub(crate) backend: Mutex<Box<dyn StepperBackend>>,
    closed: AtomicBool,
    pub(crate) wait_timeout: Duration,
    pub(crate) wait_poll: Duration,
}

impl ControllerShared {
    /// Reject any operation once the session has been closed.
    pub(crate) fn check_open(&self) -> DriverResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(Anc300Error::InstrumentClosed(self.name.clone()))
        } else {
            Ok(())
        }
    }
}

/// Handle to an open ANC300 controller session.
///
/// # Example
///
/// ```rust,ignore
/// let controller = Anc300::open("anc300", "ASRL1::INSTR", Box::new(SimController::new())).await?;
/// let axis = controller.axis(1)?;
/// axis.set_frequency(200).await?;
/// axis.set_mode(AxisMode::Step).await?;
/// axis.step_by(100).await?;
/// axis.wait_move().await?;
/// controller.close().await?;
/// ```
pub struct Anc300 {
    shared: Arc<ControllerShared>,
    axes: BTreeMap<AxisId, AxisInfo>,
}

impl Anc300 {
    /// Open a controller session with the default wait-move timeout.
    ///
    /// Connects the backend at `address` and probes all seven axis slots.
    ///
    /// # Errors
    /// Returns an error if the address cannot be opened or probing fails.
    pub async fn open(
        name: &str,
        address: &str,
        backend: Box<dyn StepperBackend>,
    ) -> DriverResult<Self> {
        Self::open_with_wait_timeout(name, address, backend, DEFAULT_WAIT_TIMEOUT).await
    }

    /// Open a controller session with a custom wait-move timeout.
    pub async fn open_with_wait_timeout(
        name: &str,
        address: &str,
        mut backend: Box<dyn StepperBackend>,
        wait_timeout: Duration,
    ) -> DriverResult<Self> {
        info!("Opening ANC300 '{}' at '{}'", name, address);
        backend.connect(address).await?;

        let mut axes = BTreeMap::new();
        for slot in 1..=AXIS_SLOTS {
            match backend.probe_axis(slot).await? {
                Some(module) => {
                    info!(
                        "ANC300 '{}': axis module in slot {} (serial {})",
                        name, slot, module.serial
                    );
                    axes.insert(AxisId::new(slot)?, module);
                }
                None => debug!("ANC300 '{}': slot {} empty", name, slot),
            }
        }

        info!("ANC300 '{}' ready with {} axis module(s)", name, axes.len());

        Ok(Self {
            shared: Arc::new(ControllerShared {
                name: name.to_string(),
                address: address.to_string(),
                backend: Mutex::new(backend),
                closed: AtomicBool::new(false),
                wait_timeout,
                wait_poll: WAIT_POLL_INTERVAL,
            }),
            axes,
        })
    }

    /// Logical instrument name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Resource address the session was opened against.
    pub fn address(&self) -> &str {
        &self.shared.address
    }

    /// Identifiers of the axes detected at open time, in slot order.
    pub fn axis_ids(&self) -> Vec<AxisId> {
        self.axes.keys().copied().collect()
    }

    /// Detected axes with their module descriptions, in slot order.
    pub fn axes(&self) -> impl Iterator<Item = (AxisId, &AxisInfo)> {
        self.axes.iter().map(|(id, info)| (*id, info))
    }

    /// Get a handle to the axis in `slot`.
    ///
    /// # Errors
    /// Returns [`Anc300Error::InvalidSlot`] for slots outside 1-7 and
    /// [`Anc300Error::NoSuchAxis`] for slots without a detected module.
    pub fn axis(&self, slot: u8) -> DriverResult<Axis> {
        let id = AxisId::new(slot)?;
        if !self.axes.contains_key(&id) {
            return Err(Anc300Error::NoSuchAxis(slot));
        }
        Ok(Axis::new(Arc::clone(&self.shared), id))
    }

    /// Whether `close` has been called on this session.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Close the session and release the backend connection.
    ///
    /// Closing twice is a no-op; any axis operation after close fails with
    /// [`Anc300Error::InstrumentClosed`].
    pub async fn close(&self) -> DriverResult<()> {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            debug!("ANC300 '{}' already closed", self.shared.name);
            return Ok(());
        }

        info!("Closing ANC300 '{}'", self.shared.name);
        self.shared.backend.lock().await.disconnect().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::SimController;

    #[tokio::test]
    async fn test_open_probes_installed_slots() {
        let backend = Box::new(SimController::with_installed_slots(&[2, 5]));
        let controller = Anc300::open("anc300", "ASRL1::INSTR", backend)
            .await
            .unwrap();

        let ids: Vec<u8> = controller.axis_ids().iter().map(|id| id.slot()).collect();
        assert_eq!(ids, vec![2, 5]);

        assert!(controller.axis(2).is_ok());
        assert!(matches!(
            controller.axis(1),
            Err(Anc300Error::NoSuchAxis(1))
        ));
        assert!(matches!(
            controller.axis(0),
            Err(Anc300Error::InvalidSlot(0))
        ));
    }

    #[tokio::test]
    async fn test_open_fails_on_bad_address() {
        let backend = Box::new(SimController::new());
        let result = Anc300::open("anc300", "", backend).await;
        assert!(matches!(result, Err(Anc300Error::ConnectionFailed { .. })));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let backend = Box::new(SimController::new());
        let controller = Anc300::open("anc300", "ASRL1::INSTR", backend)
            .await
            .unwrap();

        assert!(!controller.is_closed());
        controller.close().await.unwrap();
        assert!(controller.is_closed());
        controller.close().await.unwrap();
    }
}
