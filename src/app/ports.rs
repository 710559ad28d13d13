//! Port traits: the boundary between the protocol engine and the
//! presentation layer.
//!
//! ```text
//!   GattTransport ──▶ ImprovService ──▶ UiPort
//!   (protocol::transport)               (this module)
//! ```
//!
//! The engine holds its collaborators only through these traits,
//! injected at construction. It never names a concrete UI type.

use crate::protocol::types::{ErrorState, ServerState};

// ───────────────────────────────────────────────────────────────
// UI port (driven adapter: engine → presentation)
// ───────────────────────────────────────────────────────────────

/// Callbacks into whatever presents the peripheral to a human.
///
/// Every method is a notification; none of them may block. Decisions the
/// human makes in response (authorize, accept or deny the connection)
/// come back into the engine as events.
pub trait UiPort {
    /// The server state changed.
    fn state_changed(&mut self, state: ServerState);

    /// The error state changed (including a reset to `NoError`).
    fn error_changed(&mut self, error: ErrorState);

    /// Seconds left before the current authorization lapses.
    fn timeout_tick(&mut self, remaining_secs: u16);

    /// A central asked the device to identify itself.
    fn identify_requested(&mut self);

    /// Credentials arrived. The human decides whether the "connection"
    /// succeeds and answers with `wifi_connected` or `wifi_failed`.
    fn credentials_submitted(&mut self, ssid: &str, password: &str);

    /// Bluetooth is powered off or unavailable.
    fn bluetooth_unavailable(&mut self);

    /// The service could not be registered or advertised.
    fn failed_to_start(&mut self);
}

/// A UI that ignores every callback.
pub struct NullUi;

impl UiPort for NullUi {
    fn state_changed(&mut self, _state: ServerState) {}
    fn error_changed(&mut self, _error: ErrorState) {}
    fn timeout_tick(&mut self, _remaining_secs: u16) {}
    fn identify_requested(&mut self) {}
    fn credentials_submitted(&mut self, _ssid: &str, _password: &str) {}
    fn bluetooth_unavailable(&mut self) {}
    fn failed_to_start(&mut self) {}
}
