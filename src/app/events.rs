//! Inbound events to the protocol engine.
//!
//! Everything that can happen to the peripheral arrives as one of these:
//! transport callbacks (writes, subscriptions, buffer readiness, power),
//! human actions from the UI, and the 1 Hz tick. The runtime applies them
//! one at a time, in order, to the single owned
//! [`ImprovService`](super::service::ImprovService).

use crate::config::SessionConfig;
use crate::protocol::codec::MAX_PACKET_LEN;
use crate::protocol::types::{CentralId, Characteristic};

/// Largest write kept verbatim. Anything longer is cut to this size,
/// which is still one byte more than any valid packet, so the decoder
/// rejects it as oversized.
pub const MAX_WRITE_LEN: usize = MAX_PACKET_LEN + 1;

/// Raw bytes of one characteristic write.
pub type WriteData = heapless::Vec<u8, MAX_WRITE_LEN>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeripheralEvent {
    // ── UI ────────────────────────────────────────────────────
    /// Start a session with the given parameters.
    Enable(SessionConfig),
    /// Tear the session down.
    Disable,
    /// Human pressed the authorize button.
    Authorize,
    /// The Wi-Fi attempt succeeded.
    WifiConnected,
    /// The Wi-Fi attempt failed.
    WifiFailed,

    // ── Clock ─────────────────────────────────────────────────
    /// One second elapsed.
    Tick,

    // ── Transport ─────────────────────────────────────────────
    Write {
        central: CentralId,
        characteristic: Characteristic,
        data: WriteData,
    },
    Subscribe {
        central: CentralId,
        characteristic: Characteristic,
    },
    Unsubscribe {
        central: CentralId,
        characteristic: Characteristic,
    },
    /// The outgoing notification buffer has room again.
    TransportReady,
    /// The controller powered off.
    PoweredOff,
    /// The service could not be registered or advertised.
    ServiceRegistrationFailed,
}

impl PeripheralEvent {
    /// Build a write event, cutting oversized payloads to [`MAX_WRITE_LEN`].
    pub fn write(central: CentralId, characteristic: Characteristic, bytes: &[u8]) -> Self {
        let keep = bytes.len().min(MAX_WRITE_LEN);
        let mut data = WriteData::new();
        // Cannot fail: `keep` never exceeds the capacity.
        let _ = data.extend_from_slice(&bytes[..keep]);
        Self::Write {
            central,
            characteristic,
            data,
        }
    }

    /// Short name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Enable(_) => "enable",
            Self::Disable => "disable",
            Self::Authorize => "authorize",
            Self::WifiConnected => "wifi_connected",
            Self::WifiFailed => "wifi_failed",
            Self::Tick => "tick",
            Self::Write { .. } => "write",
            Self::Subscribe { .. } => "subscribe",
            Self::Unsubscribe { .. } => "unsubscribe",
            Self::TransportReady => "transport_ready",
            Self::PoweredOff => "powered_off",
            Self::ServiceRegistrationFailed => "service_registration_failed",
        }
    }
}
