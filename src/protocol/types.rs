//! Wire-level enums and GATT identities of the Improv BLE service.
//!
//! Every numeric value here is part of the external wire contract and
//! must never be renumbered.
//!
//! ## GATT Service Layout
//!
//! | Characteristic  | UUID                                   | Perms        |
//! |-----------------|----------------------------------------|--------------|
//! | Current State   | `00467768-6228-2272-4663-277478268001` | Read+Notify  |
//! | Error State     | `00467768-6228-2272-4663-277478268002` | Read+Notify  |
//! | RPC Command     | `00467768-6228-2272-4663-277478268003` | Write        |
//! | RPC Result      | `00467768-6228-2272-4663-277478268004` | Read+Notify  |
//! | Capabilities    | `00467768-6228-2272-4663-277478268005` | Read         |

use core::fmt;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const SERVICE_UUID: u128 = 0x00467768_6228_2272_4663_277478268000;
pub const CHAR_CURRENT_STATE: u128 = 0x00467768_6228_2272_4663_277478268001;
pub const CHAR_ERROR_STATE: u128 = 0x00467768_6228_2272_4663_277478268002;
pub const CHAR_RPC_COMMAND: u128 = 0x00467768_6228_2272_4663_277478268003;
pub const CHAR_RPC_RESULT: u128 = 0x00467768_6228_2272_4663_277478268004;
pub const CHAR_CAPABILITIES: u128 = 0x00467768_6228_2272_4663_277478268005;

/// 16-bit UUID under which the advertisement carries [`ServiceData`].
pub const SERVICE_DATA_UUID: u16 = 0x4677;

/// Remote central identity as assigned by the transport.
pub type CentralId = u32;

// ───────────────────────────────────────────────────────────────
// Server state
// ───────────────────────────────────────────────────────────────

/// Provisioning progress of the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ServerState {
    Unknown = 0,
    AuthorizationRequired = 1,
    Authorized = 2,
    Provisioning = 3,
    Provisioned = 4,
}

impl ServerState {
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::AuthorizationRequired => "Authorization Required",
            Self::Authorized => "Authorized",
            Self::Provisioning => "Provisioning",
            Self::Provisioned => "Provisioned",
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ───────────────────────────────────────────────────────────────
// Error state
// ───────────────────────────────────────────────────────────────

/// Last protocol error reported to the central.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorState {
    NoError = 0,
    InvalidPacket = 1,
    UnknownCommand = 2,
    UnableToConnect = 3,
    NotAuthorized = 4,
    UnknownError = 255,
}

impl ErrorState {
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::NoError => "No Error",
            Self::InvalidPacket => "Invalid Packet",
            Self::UnknownCommand => "Unknown Command",
            Self::UnableToConnect => "Unable To Connect",
            Self::NotAuthorized => "Not Authorized",
            Self::UnknownError => "Unknown Error",
        }
    }
}

impl fmt::Display for ErrorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ───────────────────────────────────────────────────────────────
// Capabilities
// ───────────────────────────────────────────────────────────────

/// Capability bitmask advertised by the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Self = Self(0);
    pub const CAN_BE_IDENTIFIED: Self = Self(0b0000_0001);

    /// Build the mask from the session's identify switch.
    pub const fn with_identify(can_identify: bool) -> Self {
        if can_identify { Self::CAN_BE_IDENTIFIED } else { Self::NONE }
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

// ───────────────────────────────────────────────────────────────
// RPC commands
// ───────────────────────────────────────────────────────────────

/// Command byte of an RPC packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RpcCommand {
    SubmitCredentials = 1,
    Identify = 2,
}

impl RpcCommand {
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for RpcCommand {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            1 => Ok(Self::SubmitCredentials),
            2 => Ok(Self::Identify),
            other => Err(other),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Characteristics
// ───────────────────────────────────────────────────────────────

/// Logical name of each characteristic the transport routes to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Characteristic {
    Capabilities,
    CurrentState,
    ErrorState,
    RpcCommand,
    RpcResult,
}

impl Characteristic {
    pub const ALL: [Self; 5] = [
        Self::Capabilities,
        Self::CurrentState,
        Self::ErrorState,
        Self::RpcCommand,
        Self::RpcResult,
    ];

    /// The three characteristics a central may subscribe to.
    pub const NOTIFIABLE: [Self; 3] = [Self::CurrentState, Self::ErrorState, Self::RpcResult];

    pub const fn uuid(self) -> u128 {
        match self {
            Self::Capabilities => CHAR_CAPABILITIES,
            Self::CurrentState => CHAR_CURRENT_STATE,
            Self::ErrorState => CHAR_ERROR_STATE,
            Self::RpcCommand => CHAR_RPC_COMMAND,
            Self::RpcResult => CHAR_RPC_RESULT,
        }
    }

    pub fn from_uuid(uuid: u128) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.uuid() == uuid)
    }

    pub const fn is_readable(self) -> bool {
        !matches!(self, Self::RpcCommand)
    }

    pub const fn is_writable(self) -> bool {
        matches!(self, Self::RpcCommand)
    }

    pub const fn is_notifiable(self) -> bool {
        matches!(self, Self::CurrentState | Self::ErrorState | Self::RpcResult)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Capabilities => "capabilities",
            Self::CurrentState => "current_state",
            Self::ErrorState => "error_state",
            Self::RpcCommand => "rpc_command",
            Self::RpcResult => "rpc_result",
        }
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ───────────────────────────────────────────────────────────────
// Advertisement service data
// ───────────────────────────────────────────────────────────────

/// Service data carried in the advertisement under [`SERVICE_DATA_UUID`]:
/// `[state, capabilities, 0, 0, 0, 0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceData {
    pub state: ServerState,
    pub capabilities: Capabilities,
}

impl ServiceData {
    pub const LEN: usize = 6;

    pub const fn new(state: ServerState, capabilities: Capabilities) -> Self {
        Self { state, capabilities }
    }

    pub const fn to_bytes(self) -> [u8; Self::LEN] {
        [self.state.as_byte(), self.capabilities.bits(), 0, 0, 0, 0]
    }
}
