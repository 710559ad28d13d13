//! Improv peripheral simulator.
//!
//! Runs the protocol engine against an in-memory radio. Stdin plays both
//! the human operator and the remote central; the log shows everything
//! the engine does.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  console thread            │  main thread                    │
//! │                            │                                 │
//! │  stdin ─▶ parse_line ──────┼─▶ INBOX ─▶ Runtime ─▶ Improv-   │
//! │            │               │     ▲       (1 Hz     Service   │
//! │            ▼               │     │        ticker)     │      │
//! │         SimLink ◀──────────┼─────┼────── SimTransport ◀┘      │
//! │  (flush, power)            │     └── TransportReady          │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use improv::adapters::console::{ConsoleCommand, HELP, parse_line};
use improv::adapters::log_ui::LogUi;
use improv::adapters::sim_transport::{DEFAULT_CAPACITY, SimLink, SimTransport};
use improv::app::events::PeripheralEvent;
use improv::app::service::ImprovService;
use improv::config::ImprovConfig;
use improv::runtime::{EventInbox, Runtime, TICK_PERIOD};

#[derive(Parser)]
#[command(name = "improv-sim")]
#[command(about = "Simulated Improv Wi-Fi BLE peripheral")]
struct Cli {
    /// JSON configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Outgoing notification slots of the simulated radio
    #[arg(short, long, default_value_t = DEFAULT_CAPACITY)]
    buffer: usize,
    /// Enable the session immediately
    #[arg(short, long)]
    enable: bool,
    /// Log submitted passwords in clear text
    #[arg(long)]
    reveal_password: bool,
}

/// The one inbox of the process. Posted to from the console thread,
/// drained by the runtime on the main thread.
static INBOX: EventInbox = EventInbox::new();

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    config.validate().context("invalid configuration")?;
    info!(
        "improv-sim v{} as {:?} (auth={}, identify={}, timeout={:?}, redirect={:?})",
        env!("CARGO_PKG_VERSION"),
        config.device_name,
        config.requires_authorization,
        config.can_identify,
        config.authorization_timeout_secs,
        config.redirect_url
    );

    let (transport, link) = SimTransport::new(cli.buffer);
    info!("SIM: radio up with {} notification slots", link.capacity());
    let service = ImprovService::new(transport, LogUi::new(cli.reveal_password));
    let runtime = Runtime::new(service, &INBOX);

    if cli.enable {
        INBOX.post(PeripheralEvent::Enable(config.session()))?;
    }

    let _console = std::thread::Builder::new()
        .name("console".into())
        .spawn(move || console_loop(&config, &link))
        .context("failed to spawn console thread")?;

    let service = runtime.run_blocking(TICK_PERIOD);
    info!(
        "final state: {} (error: {}, {} notifications still queued)",
        service.state(),
        service.error(),
        service.dispatcher().pending_len()
    );
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ImprovConfig> {
    let Some(path) = path else {
        return Ok(ImprovConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn console_loop(config: &ImprovConfig, link: &SimLink) {
    println!("{HELP}");
    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else {
            break;
        };
        match parse_line(&line, config) {
            Ok(None) => {}
            Ok(Some(ConsoleCommand::Event(event))) => post(event),
            Ok(Some(ConsoleCommand::Flush)) => {
                for sent in link.flush() {
                    info!(
                        "SIM: sent {} {:02x?} to {:?}",
                        sent.characteristic, sent.value, sent.centrals
                    );
                }
                post(PeripheralEvent::TransportReady);
            }
            Ok(Some(ConsoleCommand::PowerOff)) => {
                link.set_powered(false);
                post(PeripheralEvent::PoweredOff);
            }
            Ok(Some(ConsoleCommand::PowerOn)) => {
                link.set_powered(true);
                info!("SIM: powered on, `enable` to start a session");
            }
            Ok(Some(ConsoleCommand::Help)) => println!("{HELP}"),
            Ok(Some(ConsoleCommand::Quit)) => break,
            Err(e) => warn!("console: {}", e),
        }
    }
    INBOX.shutdown();
}

fn post(event: PeripheralEvent) {
    if let Err(e) = INBOX.post(event) {
        warn!("console: {}", e);
    }
}
