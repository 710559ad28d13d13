//! Application core: the provisioning state machine and its ports.
//!
//! Nothing here performs I/O. The radio side comes in through
//! [`GattTransport`](crate::protocol::transport::GattTransport), the
//! presentation side through [`ports::UiPort`], keeping the engine fully
//! testable with mock adapters.

pub mod events;
pub mod ports;
pub mod service;
