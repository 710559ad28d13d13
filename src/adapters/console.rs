//! Line-oriented command console for the simulator.
//!
//! Each stdin line plays either the human (authorize, accept or deny the
//! connection) or a remote central (subscribe, write packets), or drives
//! the simulated radio (flush the outgoing buffer, power cycle).
//!
//! | Command                         | Effect                               |
//! |---------------------------------|--------------------------------------|
//! | `enable` / `disable`            | start / stop the session             |
//! | `authorize`                     | human authorizes                     |
//! | `connect` / `fail`              | Wi-Fi attempt succeeds / fails       |
//! | `sub <central> <char>`          | subscribe (`current_state`, ...)     |
//! | `unsub <central> <char>`        | unsubscribe                          |
//! | `creds <central> <ssid> [pwd]`  | write a SubmitCredentials packet     |
//! | `identify <central>`            | write an Identify packet             |
//! | `write <central> <hex>`         | write raw bytes to `rpc_command`     |
//! | `flush`                         | transmit the radio buffer            |
//! | `power on` / `power off`        | toggle the controller                |
//! | `help` / `quit`                 |                                      |

use core::fmt;

use crate::app::events::PeripheralEvent;
use crate::config::ImprovConfig;
use crate::protocol::codec::{self, CodecError};
use crate::protocol::types::{CentralId, Characteristic, RpcCommand};

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Post this event to the engine.
    Event(PeripheralEvent),
    /// Transmit the simulated outgoing buffer, then signal readiness.
    Flush,
    PowerOn,
    PowerOff,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    UnknownCommand,
    MissingArgument(&'static str),
    BadCentral,
    BadCharacteristic,
    BadHex,
    Encode(CodecError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand => write!(f, "unknown command (try `help`)"),
            Self::MissingArgument(name) => write!(f, "missing argument <{name}>"),
            Self::BadCentral => write!(f, "central id must be a number"),
            Self::BadCharacteristic => write!(f, "unknown characteristic"),
            Self::BadHex => write!(f, "expected an even number of hex digits"),
            Self::Encode(e) => write!(f, "cannot encode packet: {e}"),
        }
    }
}

pub const HELP: &str = "\
enable | disable | authorize | connect | fail
sub <central> <char> | unsub <central> <char>
creds <central> <ssid> [password] | identify <central> | write <central> <hex>
flush | power on|off | help | quit
characteristics: capabilities current_state error_state rpc_command rpc_result";

/// Parse one line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str, config: &ImprovConfig) -> Result<Option<ConsoleCommand>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let cmd = match verb {
        "enable" => ConsoleCommand::Event(PeripheralEvent::Enable(config.session())),
        "disable" => ConsoleCommand::Event(PeripheralEvent::Disable),
        "authorize" | "auth" => ConsoleCommand::Event(PeripheralEvent::Authorize),
        "connect" => ConsoleCommand::Event(PeripheralEvent::WifiConnected),
        "fail" => ConsoleCommand::Event(PeripheralEvent::WifiFailed),
        "sub" | "unsub" => {
            let central = central(words.next())?;
            let characteristic = characteristic(words.next())?;
            ConsoleCommand::Event(if verb == "sub" {
                PeripheralEvent::Subscribe {
                    central,
                    characteristic,
                }
            } else {
                PeripheralEvent::Unsubscribe {
                    central,
                    characteristic,
                }
            })
        }
        "creds" => {
            let central = central(words.next())?;
            let ssid = words.next().ok_or(ParseError::MissingArgument("ssid"))?;
            let password = words.next().unwrap_or("");
            let packet = codec::encode(RpcCommand::SubmitCredentials.as_byte(), &[ssid, password])
                .map_err(ParseError::Encode)?;
            rpc_write(central, &packet)
        }
        "identify" => {
            let central = central(words.next())?;
            let packet =
                codec::encode(RpcCommand::Identify.as_byte(), &[]).map_err(ParseError::Encode)?;
            rpc_write(central, &packet)
        }
        "write" => {
            let central = central(words.next())?;
            let hex: String = words.collect();
            rpc_write(central, &parse_hex(&hex)?)
        }
        "flush" => ConsoleCommand::Flush,
        "power" => match words.next() {
            Some("on") => ConsoleCommand::PowerOn,
            Some("off") => ConsoleCommand::PowerOff,
            _ => return Err(ParseError::MissingArgument("on|off")),
        },
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        _ => return Err(ParseError::UnknownCommand),
    };
    Ok(Some(cmd))
}

fn rpc_write(central: CentralId, bytes: &[u8]) -> ConsoleCommand {
    ConsoleCommand::Event(PeripheralEvent::write(
        central,
        Characteristic::RpcCommand,
        bytes,
    ))
}

fn central(word: Option<&str>) -> Result<CentralId, ParseError> {
    word.ok_or(ParseError::MissingArgument("central"))?
        .parse()
        .map_err(|_| ParseError::BadCentral)
}

fn characteristic(word: Option<&str>) -> Result<Characteristic, ParseError> {
    let name = word.ok_or(ParseError::MissingArgument("char"))?;
    Characteristic::ALL
        .into_iter()
        .find(|c| c.name() == name)
        .ok_or(ParseError::BadCharacteristic)
}

fn parse_hex(hex: &str) -> Result<Vec<u8>, ParseError> {
    let hex = hex.trim_start_matches("0x");
    if hex.len() % 2 != 0 {
        return Err(ParseError::BadHex);
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or(ParseError::BadHex)
        })
        .collect()
}
