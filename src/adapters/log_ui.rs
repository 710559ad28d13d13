//! Log-based UI adapter.
//!
//! Implements [`UiPort`] by writing every callback to the logger. The
//! simulator uses it as its whole presentation layer: the human reads
//! the log and answers on stdin.

use log::{info, warn};

use crate::app::ports::UiPort;
use crate::protocol::types::{ErrorState, ServerState};

/// Adapter that logs every UI callback.
#[derive(Debug, Default)]
pub struct LogUi {
    /// Mask the password in logs.
    reveal_password: bool,
}

impl LogUi {
    pub fn new(reveal_password: bool) -> Self {
        Self { reveal_password }
    }
}

impl UiPort for LogUi {
    fn state_changed(&mut self, state: ServerState) {
        info!("UI | state: {}", state);
    }

    fn error_changed(&mut self, error: ErrorState) {
        if error == ErrorState::NoError {
            info!("UI | error cleared");
        } else {
            warn!("UI | error: {}", error);
        }
    }

    fn timeout_tick(&mut self, remaining_secs: u16) {
        info!("UI | authorization expires in {}s", remaining_secs);
    }

    fn identify_requested(&mut self) {
        info!("UI | *** identify: blinking ***");
    }

    fn credentials_submitted(&mut self, ssid: &str, password: &str) {
        if self.reveal_password {
            info!("UI | credentials: ssid={:?} password={:?}", ssid, password);
        } else {
            info!(
                "UI | credentials: ssid={:?} password=<{} bytes>",
                ssid,
                password.len()
            );
        }
        info!("UI | answer with `connect` or `fail`");
    }

    fn bluetooth_unavailable(&mut self) {
        warn!("UI | bluetooth is unavailable");
    }

    fn failed_to_start(&mut self) {
        warn!("UI | improv service failed to start");
    }
}
