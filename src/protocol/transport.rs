//! GATT transport abstraction: the BLE peripheral-role stack.
//!
//! The engine never touches a radio. It consumes these capabilities from
//! whatever peripheral implementation hosts the Improv service, and the
//! transport in turn forwards reads, writes and subscriptions back as
//! [`PeripheralEvent`](crate::app::events::PeripheralEvent)s.

use core::fmt;

use super::types::{Characteristic, CentralId, ServiceData};

/// Failures reported by a GATT transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Outgoing notification buffer is full; retry after the transport
    /// signals readiness.
    Busy,
    /// The controller is powered off or unavailable.
    PoweredOff,
    /// The service could not be registered or advertising could not start.
    RegistrationFailed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "GATT: outgoing buffer full"),
            Self::PoweredOff => write!(f, "GATT: controller powered off"),
            Self::RegistrationFailed => write!(f, "GATT: service registration failed"),
        }
    }
}

/// Peripheral-role capabilities consumed by the engine.
pub trait GattTransport {
    /// Push `value` to every central in `centrals`.
    ///
    /// Must not block. Returns [`TransportError::Busy`] when the outgoing
    /// queue cannot take the notification right now.
    fn notify(
        &mut self,
        characteristic: Characteristic,
        value: &[u8],
        centrals: &[CentralId],
    ) -> Result<(), TransportError>;

    /// Whether the controller is currently powered on.
    fn is_powered_on(&self) -> bool;

    /// Register the service and begin advertising `data`.
    fn start_advertising(&mut self, data: ServiceData) -> Result<(), TransportError>;

    /// Refresh the advertised service data after a state change.
    fn update_advertising(&mut self, data: ServiceData);

    /// Stop advertising and unregister the service.
    fn stop_advertising(&mut self);
}

/// A transport that accepts everything and goes nowhere.
/// Useful as a default when no radio is attached.
pub struct NullTransport;

impl GattTransport for NullTransport {
    fn notify(
        &mut self,
        _characteristic: Characteristic,
        _value: &[u8],
        _centrals: &[CentralId],
    ) -> Result<(), TransportError> {
        Ok(())
    }

    fn is_powered_on(&self) -> bool {
        true
    }

    fn start_advertising(&mut self, _data: ServiceData) -> Result<(), TransportError> {
        Ok(())
    }

    fn update_advertising(&mut self, _data: ServiceData) {}

    fn stop_advertising(&mut self) {}
}
