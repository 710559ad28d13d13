//! Improv Wi-Fi over BLE: the peripheral-side protocol engine.
//!
//! The engine is radio-agnostic. A BLE peripheral stack implements
//! [`protocol::transport::GattTransport`], a presentation layer implements
//! [`app::ports::UiPort`], and a [`runtime::Runtime`] serializes every
//! inbound event through one owned [`app::service::ImprovService`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod notify;
pub mod protocol;
pub mod runtime;
pub mod timer;

pub use error::{Error, Result};
