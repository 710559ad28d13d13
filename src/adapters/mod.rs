//! Adapters: concrete implementations of the engine's port traits.
//!
//! | Adapter         | Implements      | Connects to                   |
//! |-----------------|-----------------|-------------------------------|
//! | `log_ui`        | UiPort          | Log output                    |
//! | `sim_transport` | GattTransport   | In-memory radio (simulator)   |
//! | `console`       | -               | stdin commands → events       |

pub mod console;
pub mod log_ui;
pub mod sim_transport;
