//! In-memory GATT transport for the host simulator.
//!
//! Models the one property of a real peripheral stack the engine cares
//! about: the outgoing notification buffer is small and fills up. A
//! notification occupies one slot until [`SimLink::flush`] "sends" it
//! over the air; while every slot is taken, `notify` reports
//! [`TransportError::Busy`].
//!
//! ```text
//!  ImprovService ──notify──▶ SimTransport ──▶ [ slot | slot | ... ]
//!                                                    │ flush()
//!  EventInbox ◀── TransportReady ── SimLink ◀────────┘
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info};

use crate::protocol::transport::{GattTransport, TransportError};
use crate::protocol::types::{CentralId, Characteristic, SERVICE_DATA_UUID, ServiceData};

/// Outgoing buffer depth of a typical BLE controller.
pub const DEFAULT_CAPACITY: usize = 4;

/// A notification handed to the simulated radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub characteristic: Characteristic,
    pub value: Vec<u8>,
    pub centrals: Vec<CentralId>,
}

#[derive(Debug)]
struct Radio {
    capacity: usize,
    in_flight: Mutex<VecDeque<SentNotification>>,
    advertisement: Mutex<Option<ServiceData>>,
    powered: AtomicBool,
    fail_registration: AtomicBool,
}

impl Radio {
    fn in_flight(&self) -> MutexGuard<'_, VecDeque<SentNotification>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn advertisement(&self) -> MutexGuard<'_, Option<ServiceData>> {
        self.advertisement.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ───────────────────────────────────────────────────────────────
// Transport (owned by the engine)
// ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct SimTransport {
    radio: Arc<Radio>,
}

impl SimTransport {
    /// A powered-on radio with `capacity` outgoing slots, plus the handle
    /// the simulator uses to drive it.
    pub fn new(capacity: usize) -> (Self, SimLink) {
        let radio = Arc::new(Radio {
            capacity: capacity.max(1),
            in_flight: Mutex::new(VecDeque::new()),
            advertisement: Mutex::new(None),
            powered: AtomicBool::new(true),
            fail_registration: AtomicBool::new(false),
        });
        (
            Self {
                radio: Arc::clone(&radio),
            },
            SimLink { radio },
        )
    }
}

impl GattTransport for SimTransport {
    fn notify(
        &mut self,
        characteristic: Characteristic,
        value: &[u8],
        centrals: &[CentralId],
    ) -> Result<(), TransportError> {
        if !self.radio.powered.load(Ordering::Acquire) {
            return Err(TransportError::PoweredOff);
        }
        let mut in_flight = self.radio.in_flight();
        if in_flight.len() >= self.radio.capacity {
            return Err(TransportError::Busy);
        }
        debug!("SIM: queued {} {:02x?}", characteristic, value);
        in_flight.push_back(SentNotification {
            characteristic,
            value: value.to_vec(),
            centrals: centrals.to_vec(),
        });
        Ok(())
    }

    fn is_powered_on(&self) -> bool {
        self.radio.powered.load(Ordering::Acquire)
    }

    fn start_advertising(&mut self, data: ServiceData) -> Result<(), TransportError> {
        if !self.is_powered_on() {
            return Err(TransportError::PoweredOff);
        }
        if self.radio.fail_registration.load(Ordering::Acquire) {
            return Err(TransportError::RegistrationFailed);
        }
        info!(
            "SIM: advertising service data 0x{:04x} {:02x?}",
            SERVICE_DATA_UUID,
            data.to_bytes()
        );
        *self.radio.advertisement() = Some(data);
        Ok(())
    }

    fn update_advertising(&mut self, data: ServiceData) {
        let mut advert = self.radio.advertisement();
        if advert.is_some() {
            debug!("SIM: advertisement now {:02x?}", data.to_bytes());
            *advert = Some(data);
        }
    }

    fn stop_advertising(&mut self) {
        info!("SIM: advertising stopped");
        *self.radio.advertisement() = None;
        self.radio.in_flight().clear();
    }
}

// ───────────────────────────────────────────────────────────────
// Link (held by the simulator)
// ───────────────────────────────────────────────────────────────

/// Simulator-side handle onto the radio shared with [`SimTransport`].
#[derive(Debug, Clone)]
pub struct SimLink {
    radio: Arc<Radio>,
}

impl SimLink {
    /// Transmit everything in flight, freeing every slot.
    pub fn flush(&self) -> Vec<SentNotification> {
        self.radio.in_flight().drain(..).collect()
    }

    pub fn in_flight(&self) -> usize {
        self.radio.in_flight().len()
    }

    pub fn capacity(&self) -> usize {
        self.radio.capacity
    }

    pub fn set_powered(&self, on: bool) {
        self.radio.powered.store(on, Ordering::Release);
        if !on {
            self.radio.in_flight().clear();
            *self.radio.advertisement() = None;
        }
    }

    /// Make the next `start_advertising` fail.
    pub fn set_fail_registration(&self, fail: bool) {
        self.radio.fail_registration.store(fail, Ordering::Release);
    }

    /// Service data currently advertised, if any.
    pub fn advertisement(&self) -> Option<ServiceData> {
        *self.radio.advertisement()
    }
}
