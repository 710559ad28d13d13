//! Improv service: the provisioning state machine.
//!
//! [`ImprovService`] owns every piece of session state (server state,
//! error state, subscriptions, the retry queue, the authorization timer)
//! and mutates it only through the operations below. Transport and UI
//! are injected at construction as port traits.
//!
//! ```text
//!   GattTransport ──▶ ┌─────────────────────────────┐ ──▶ UiPort
//!   (writes, subs,    │        ImprovService         │
//!    ready, power)    │ state · error · timer · queue│
//!                     └─────────────────────────────┘
//!                        │ publish        ▲ read
//!                        ▼                │
//!                  NotificationDispatcher ─┘
//! ```
//!
//! ## Transitions
//!
//! | From                  | Event            | To                    |
//! |-----------------------|------------------|-----------------------|
//! | Unknown               | enable (auth)    | AuthorizationRequired |
//! | Unknown               | enable (no auth) | Authorized            |
//! | AuthorizationRequired | authorize        | Authorized            |
//! | Authorized            | credentials      | Provisioning          |
//! | Provisioning          | wifi connected   | Provisioned           |
//! | Provisioning          | wifi failed      | Authorized            |
//! | any enabled           | timer expiry     | AuthorizationRequired |
//! | any                   | disable          | Unknown               |

use log::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::Result;
use crate::notify::dispatcher::{NotificationDispatcher, PublishOutcome, single_byte};
use crate::notify::subscriptions::SubscriptionRegistry;
use crate::protocol::codec::{self, Credentials, Frame, RpcRequest};
use crate::protocol::transport::GattTransport;
use crate::protocol::types::{
    Capabilities, CentralId, Characteristic, ErrorState, RpcCommand, ServerState, ServiceData,
};
use crate::timer::{AuthorizationTimer, TimerTick};

use super::events::PeripheralEvent;
use super::ports::UiPort;

/// Parameters fixed for the lifetime of one enabled session.
#[derive(Debug, Clone)]
struct ActiveSession {
    requires_authorization: bool,
    capabilities: Capabilities,
    /// `rpc_result` sent after a successful connection, encoded at enable
    /// time so an oversized redirect URL is refused up front.
    success_result: Frame,
}

// ───────────────────────────────────────────────────────────────
// ImprovService
// ───────────────────────────────────────────────────────────────

pub struct ImprovService<T: GattTransport, U: UiPort> {
    transport: T,
    ui: U,
    state: ServerState,
    error: ErrorState,
    session: Option<ActiveSession>,
    registry: SubscriptionRegistry,
    dispatcher: NotificationDispatcher,
    timer: AuthorizationTimer,
    /// Value served on `rpc_result` reads.
    last_result: Frame,
}

impl<T: GattTransport, U: UiPort> ImprovService<T, U> {
    /// Build a disabled service. Call [`enable`](Self::enable) to start.
    pub fn new(transport: T, ui: U) -> Self {
        Self {
            transport,
            ui,
            state: ServerState::Unknown,
            error: ErrorState::NoError,
            session: None,
            registry: SubscriptionRegistry::new(),
            dispatcher: NotificationDispatcher::new(),
            timer: AuthorizationTimer::Disabled,
            last_result: Frame::new(),
        }
    }

    /// Apply one inbound event.
    pub fn handle(&mut self, event: PeripheralEvent) {
        debug!("IMPROV: event {}", event.name());
        match event {
            PeripheralEvent::Enable(config) => {
                self.enable(&config);
            }
            PeripheralEvent::Disable => self.disable(),
            PeripheralEvent::Authorize => {
                self.authorize();
            }
            PeripheralEvent::WifiConnected => {
                self.wifi_connected();
            }
            PeripheralEvent::WifiFailed => {
                self.wifi_failed();
            }
            PeripheralEvent::Tick => self.tick(),
            PeripheralEvent::Write {
                central,
                characteristic,
                data,
            } => {
                self.handle_write(central, characteristic, &data);
            }
            PeripheralEvent::Subscribe {
                central,
                characteristic,
            } => {
                self.subscribe(central, characteristic);
            }
            PeripheralEvent::Unsubscribe {
                central,
                characteristic,
            } => {
                self.unsubscribe(central, characteristic);
            }
            PeripheralEvent::TransportReady => {
                self.transport_ready();
            }
            PeripheralEvent::PoweredOff => self.powered_off(),
            PeripheralEvent::ServiceRegistrationFailed => self.service_registration_failed(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start a session. Returns `false` if one is already running, the
    /// controller is off, or the service cannot be advertised.
    pub fn enable(&mut self, config: &SessionConfig) -> bool {
        if self.session.is_some() {
            warn!("IMPROV: enable refused, session already active");
            return false;
        }
        if !self.transport.is_powered_on() {
            warn!("IMPROV: enable refused, bluetooth unavailable");
            self.ui.bluetooth_unavailable();
            return false;
        }

        let initial = if config.requires_authorization {
            ServerState::AuthorizationRequired
        } else {
            ServerState::Authorized
        };
        let session = match self.open_session(config, initial) {
            Ok(session) => session,
            Err(e) => {
                warn!("IMPROV: enable failed: {}", e);
                self.ui.failed_to_start();
                return false;
            }
        };

        self.session = Some(session);
        self.timer = AuthorizationTimer::new(config.authorization_timeout_secs);
        self.last_result.clear();
        info!(
            "IMPROV: enabled (auth={}, caps=0x{:02x}, timeout={:?})",
            config.requires_authorization,
            config.capabilities.bits(),
            config.authorization_timeout_secs
        );

        self.clear_error();
        self.set_state(initial);
        true
    }

    /// Encode the success result and start advertising. Nothing is
    /// committed until both succeed.
    fn open_session(
        &mut self,
        config: &SessionConfig,
        initial: ServerState,
    ) -> Result<ActiveSession> {
        let redirect = config.redirect_url.as_deref();
        let success_result =
            codec::encode_result(RpcCommand::SubmitCredentials, redirect.as_slice())?;
        self.transport
            .start_advertising(ServiceData::new(initial, config.capabilities))?;
        Ok(ActiveSession {
            requires_authorization: config.requires_authorization,
            capabilities: config.capabilities,
            success_result,
        })
    }

    /// Tear the session down: stop the timer, drop queued notifications
    /// and subscriptions, clear the error, return to `Unknown`.
    ///
    /// Safe to call in any state.
    pub fn disable(&mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let was_enabled = self.session.take().is_some();

        self.timer.cancel();
        self.timer = AuthorizationTimer::Disabled;
        self.dispatcher.clear();
        self.registry.clear();
        self.last_result.clear();
        if was_enabled {
            self.transport.stop_advertising();
            info!("IMPROV: disabled");
        }

        // Subscriptions are gone, so these reach only the UI.
        self.clear_error();
        self.set_state(ServerState::Unknown);
    }

    /// Controller powered off: the session cannot continue.
    pub fn powered_off(&mut self) {
        warn!("IMPROV: bluetooth powered off");
        self.teardown();
        self.ui.bluetooth_unavailable();
    }

    /// Service registration or advertising failed after enable.
    pub fn service_registration_failed(&mut self) {
        warn!("IMPROV: service registration failed");
        self.teardown();
        self.ui.failed_to_start();
    }

    // ── Human actions ─────────────────────────────────────────

    /// Grant authorization. From `AuthorizationRequired` this moves to
    /// `Authorized`; while already `Authorized` it restarts the countdown.
    pub fn authorize(&mut self) -> bool {
        let Some(requires_authorization) = self.session.as_ref().map(|s| s.requires_authorization)
        else {
            debug!("IMPROV: authorize ignored, not enabled");
            return false;
        };
        match self.state {
            ServerState::AuthorizationRequired => {
                self.set_state(ServerState::Authorized);
                self.start_timer();
                true
            }
            ServerState::Authorized if requires_authorization => {
                debug!("IMPROV: authorization refreshed");
                self.start_timer();
                true
            }
            other => {
                debug!("IMPROV: authorize ignored in {}", other);
                false
            }
        }
    }

    /// The Wi-Fi attempt succeeded: publish the result and finish.
    pub fn wifi_connected(&mut self) -> bool {
        if self.state != ServerState::Provisioning {
            debug!("IMPROV: wifi_connected ignored in {}", self.state);
            return false;
        }
        let Some(result) = self.session.as_ref().map(|s| s.success_result.clone()) else {
            return false;
        };

        self.timer.cancel();
        self.set_state(ServerState::Provisioned);
        self.last_result = result.clone();
        self.publish(Characteristic::RpcResult, result);
        info!("IMPROV: provisioned");
        true
    }

    /// The Wi-Fi attempt failed: report it and fall back to `Authorized`.
    pub fn wifi_failed(&mut self) -> bool {
        if self.state != ServerState::Provisioning {
            debug!("IMPROV: wifi_failed ignored in {}", self.state);
            return false;
        }
        let requires_authorization = self
            .session
            .as_ref()
            .is_some_and(|s| s.requires_authorization);

        self.set_error(ErrorState::UnableToConnect);
        self.set_state(ServerState::Authorized);
        if requires_authorization {
            self.start_timer();
        }
        true
    }

    // ── Clock ─────────────────────────────────────────────────

    /// Advance the authorization countdown by one second.
    pub fn tick(&mut self) {
        if self.session.is_none() {
            return;
        }
        match self.timer.tick() {
            TimerTick::Inactive => {}
            TimerTick::Remaining(secs) => self.ui.timeout_tick(secs),
            TimerTick::Expired => {
                self.ui.timeout_tick(0);
                info!("IMPROV: authorization lapsed");
                self.set_state(ServerState::AuthorizationRequired);
            }
        }
    }

    // ── Transport callbacks ───────────────────────────────────

    /// A central wrote `data` to `characteristic`. Only `rpc_command`
    /// accepts writes; anything else is refused without touching the
    /// error state.
    pub fn handle_write(
        &mut self,
        central: CentralId,
        characteristic: Characteristic,
        data: &[u8],
    ) -> bool {
        if self.session.is_none() {
            debug!("IMPROV: write from {} ignored, not enabled", central);
            return false;
        }
        if !characteristic.is_writable() {
            warn!("IMPROV: write to read-only {} refused", characteristic);
            return false;
        }
        self.handle_command(data)
    }

    /// Decode an `rpc_command` packet and apply it. Ignored while
    /// disabled; returns whether the packet was processed.
    pub fn handle_command(&mut self, packet: &[u8]) -> bool {
        if self.session.is_none() {
            debug!("IMPROV: command ignored, not enabled");
            return false;
        }
        let request = match codec::decode(packet) {
            Ok(request) => request,
            Err(e) => {
                warn!("IMPROV: invalid packet: {}", e);
                self.set_error(e.error_state());
                return true;
            }
        };

        match request {
            RpcRequest::Unknown(byte) => {
                warn!("IMPROV: unknown command 0x{:02x}", byte);
                self.set_error(ErrorState::UnknownCommand);
            }
            RpcRequest::Identify => self.identify(),
            RpcRequest::SubmitCredentials(credentials) => self.submit_credentials(&credentials),
        }
        true
    }

    fn identify(&mut self) {
        match self.state {
            ServerState::AuthorizationRequired | ServerState::Authorized => {
                if !self.capabilities().contains(Capabilities::CAN_BE_IDENTIFIED) {
                    debug!("IMPROV: identify honoured without the advertised capability");
                }
                info!("IMPROV: identify requested");
                self.ui.identify_requested();
            }
            other => {
                warn!("IMPROV: identify refused in {}", other);
                self.set_error(ErrorState::UnknownError);
            }
        }
    }

    fn submit_credentials(&mut self, credentials: &Credentials) {
        if self.state != ServerState::Authorized {
            warn!("IMPROV: credentials refused in {}", self.state);
            self.set_error(ErrorState::NotAuthorized);
            return;
        }

        info!("IMPROV: credentials received for SSID {:?}", credentials.ssid.as_str());
        // The attempt runs to completion even if the countdown would lapse.
        self.timer.cancel();
        self.set_state(ServerState::Provisioning);
        self.ui
            .credentials_submitted(credentials.ssid.as_str(), credentials.password.as_str());
    }

    /// Register a subscription. Ignored while disabled.
    pub fn subscribe(&mut self, central: CentralId, characteristic: Characteristic) -> bool {
        if self.session.is_none() {
            debug!("IMPROV: subscribe from {} ignored, not enabled", central);
            return false;
        }
        self.registry.subscribe(central, characteristic)
    }

    pub fn unsubscribe(&mut self, central: CentralId, characteristic: Characteristic) -> bool {
        self.registry.unsubscribe(central, characteristic)
    }

    /// The transport has room again: drain queued notifications.
    ///
    /// Returns the number of queued jobs delivered. A completion that
    /// arrives after teardown finds an empty queue and does nothing.
    pub fn transport_ready(&mut self) -> usize {
        self.dispatcher
            .on_transport_ready(&self.registry, &mut self.transport)
    }

    /// Current value of `characteristic` for an inbound read.
    /// `None` for characteristics that are not readable.
    pub fn read(&self, characteristic: Characteristic) -> Option<Frame> {
        match characteristic {
            Characteristic::CurrentState => Some(single_byte(self.state.as_byte())),
            Characteristic::ErrorState => Some(single_byte(self.error.as_byte())),
            Characteristic::Capabilities => Some(single_byte(self.capabilities().bits())),
            Characteristic::RpcResult => Some(self.last_result.clone()),
            Characteristic::RpcCommand => None,
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn error(&self) -> ErrorState {
        self.error
    }

    /// Capabilities of the active session (`NONE` while disabled).
    pub fn capabilities(&self) -> Capabilities {
        self.session
            .as_ref()
            .map_or(Capabilities::NONE, |s| s.capabilities)
    }

    pub fn is_enabled(&self) -> bool {
        self.session.is_some()
    }

    pub fn timer(&self) -> &AuthorizationTimer {
        &self.timer
    }

    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    pub fn last_result(&self) -> &[u8] {
        &self.last_result
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    // ── Internal ──────────────────────────────────────────────

    fn set_state(&mut self, state: ServerState) {
        if state == self.state {
            return;
        }
        info!("IMPROV: {} -> {}", self.state, state);
        self.state = state;
        self.publish(Characteristic::CurrentState, single_byte(state.as_byte()));
        self.ui.state_changed(state);
        if let Some(session) = &self.session {
            self.transport
                .update_advertising(ServiceData::new(state, session.capabilities));
        }
    }

    /// Every error is pushed, even a repeat of the current one, so the
    /// central sees each rejected command.
    fn set_error(&mut self, error: ErrorState) {
        self.error = error;
        self.publish(Characteristic::ErrorState, single_byte(error.as_byte()));
        self.ui.error_changed(error);
    }

    fn clear_error(&mut self) {
        if self.error != ErrorState::NoError {
            self.set_error(ErrorState::NoError);
        }
    }

    fn start_timer(&mut self) {
        if let Some(secs) = self.timer.start() {
            self.ui.timeout_tick(secs);
        }
    }

    fn publish(&mut self, characteristic: Characteristic, value: Frame) {
        let outcome = self
            .dispatcher
            .publish(&self.registry, &mut self.transport, characteristic, value);
        if outcome == PublishOutcome::Queued {
            debug!(
                "IMPROV: {} deferred, {} queued",
                characteristic,
                self.dispatcher.pending_len()
            );
        }
    }
}
