//! Improv wire protocol.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     Protocol Stack                         │
//! │                                                            │
//! │  ┌───────────┐   ┌──────────┐   ┌───────────────────────┐  │
//! │  │ Transport │──▶│  Codec   │──▶│  ImprovService (FSM)  │  │
//! │  │ (GATT)    │   │ + Sum    │   │                       │  │
//! │  └───────────┘   └──────────┘   └───────────────────────┘  │
//! │       ▲                                    │               │
//! │       │              ┌─────────────────────┘               │
//! │       │              ▼                                     │
//! │  ┌───────────┐   ┌────────────┐                            │
//! │  │ Transport │◀──│ Dispatcher │   (notify + retry queue)   │
//! │  │ (notify)  │   │            │                            │
//! │  └───────────┘   └────────────┘                            │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod checksum;
pub mod codec;
pub mod transport;
pub mod types;
