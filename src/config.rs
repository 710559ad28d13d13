//! Peripheral configuration.
//!
//! [`ImprovConfig`] is the persisted/loaded form (JSON in the simulator).
//! [`SessionConfig`] is what one `enable` call needs and is fixed for the
//! lifetime of that session.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::protocol::codec::MAX_PAYLOAD_LEN;
use crate::protocol::types::Capabilities;

/// Longest device name that still fits a legacy advertisement.
pub const MAX_DEVICE_NAME_LEN: usize = 24;

/// A redirect URL travels as one length-prefixed field of an RPC result.
pub const MAX_REDIRECT_URL_LEN: usize = MAX_PAYLOAD_LEN - 1;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImprovConfig {
    /// Local name advertised by the peripheral.
    pub device_name: String,
    /// Require a physical authorize action before accepting credentials.
    pub requires_authorization: bool,
    /// Advertise the identify capability.
    pub can_identify: bool,
    /// Seconds an authorization stays valid. `None` disables the timeout.
    pub authorization_timeout_secs: Option<u16>,
    /// URL returned to the central after a successful connection.
    pub redirect_url: Option<String>,
}

impl Default for ImprovConfig {
    fn default() -> Self {
        Self {
            device_name: "improv-sim".into(),
            requires_authorization: true,
            can_identify: true,
            authorization_timeout_secs: Some(60),
            redirect_url: None,
        }
    }
}

impl ImprovConfig {
    /// Reject values the protocol cannot carry.
    pub fn validate(&self) -> Result<()> {
        if self.device_name.is_empty() || self.device_name.len() > MAX_DEVICE_NAME_LEN {
            return Err(Error::Config("device_name must be 1-24 bytes"));
        }
        if self.authorization_timeout_secs == Some(0) {
            return Err(Error::Config(
                "authorization_timeout_secs must be positive (use null to disable)",
            ));
        }
        if let Some(url) = &self.redirect_url {
            if url.is_empty() || url.len() > MAX_REDIRECT_URL_LEN {
                return Err(Error::Config("redirect_url must be 1-254 bytes"));
            }
        }
        Ok(())
    }

    /// Session parameters for [`ImprovService::enable`](crate::app::service::ImprovService::enable).
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            requires_authorization: self.requires_authorization,
            capabilities: Capabilities::with_identify(self.can_identify),
            authorization_timeout_secs: self.authorization_timeout_secs,
            redirect_url: self.redirect_url.clone(),
        }
    }
}

/// Parameters of one enabled session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub requires_authorization: bool,
    pub capabilities: Capabilities,
    pub authorization_timeout_secs: Option<u16>,
    pub redirect_url: Option<String>,
}

impl SessionConfig {
    pub fn new(requires_authorization: bool, can_identify: bool) -> Self {
        Self {
            requires_authorization,
            capabilities: Capabilities::with_identify(can_identify),
            authorization_timeout_secs: None,
            redirect_url: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, secs: u16) -> Self {
        self.authorization_timeout_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn with_redirect(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }
}
