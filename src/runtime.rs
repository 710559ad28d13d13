//! Single-owner event loop.
//!
//! Every entry point (transport callbacks, UI actions, the 1 Hz tick)
//! posts a [`PeripheralEvent`] into a bounded `embassy-sync` channel.
//! One [`Runtime`] owns the [`ImprovService`] and applies events one at a
//! time, each to completion, so state transitions and notification pushes
//! form a single sequential history.
//!
//! ```text
//!  transport ─┐
//!  UI ────────┼──▶ EventInbox ──▶ Runtime ──▶ ImprovService
//!  ticker ────┘    (bounded)      (owner)
//! ```
//!
//! [`Runtime::run_blocking`] drives the loop and the ticker on an
//! `edge-executor` `LocalExecutor`; timers come from the `async-io-mini`
//! reactor.

use core::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use log::{debug, info, warn};

use crate::app::events::PeripheralEvent;
use crate::app::ports::UiPort;
use crate::app::service::ImprovService;
use crate::error::{Error, Result};
use crate::protocol::transport::GattTransport;

/// Events the inbox can hold before `post` starts failing.
pub const INBOX_DEPTH: usize = 32;

/// Authorization countdown resolution.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

// ───────────────────────────────────────────────────────────────
// Inbox
// ───────────────────────────────────────────────────────────────

/// Bounded MPMC queue of inbound events plus a stop signal.
///
/// `const`-constructible so a composition root can keep it in a
/// `static`; tests can equally own one on the stack.
pub struct EventInbox {
    channel: Channel<CriticalSectionRawMutex, PeripheralEvent, INBOX_DEPTH>,
    stop: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for EventInbox {
    fn default() -> Self {
        Self::new()
    }
}

impl EventInbox {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            stop: Signal::new(),
        }
    }

    /// Queue an event. Never blocks.
    pub fn post(&self, event: PeripheralEvent) -> Result<()> {
        self.channel.try_send(event).map_err(|_| Error::InboxFull)
    }

    pub fn try_next(&self) -> Option<PeripheralEvent> {
        self.channel.try_receive().ok()
    }

    pub async fn next(&self) -> PeripheralEvent {
        self.channel.receive().await
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Ask a running [`Runtime::run`] to return once the events already
    /// queued have been applied.
    pub fn shutdown(&self) {
        self.stop.signal(());
    }

    async fn stopped(&self) {
        self.stop.wait().await;
    }
}

// ───────────────────────────────────────────────────────────────
// Runtime
// ───────────────────────────────────────────────────────────────

pub struct Runtime<'a, T: GattTransport, U: UiPort> {
    service: ImprovService<T, U>,
    inbox: &'a EventInbox,
}

impl<'a, T: GattTransport, U: UiPort> Runtime<'a, T, U> {
    pub fn new(service: ImprovService<T, U>, inbox: &'a EventInbox) -> Self {
        Self { service, inbox }
    }

    /// Apply every queued event, in order. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.inbox.try_next() {
            self.service.handle(event);
            applied += 1;
        }
        applied
    }

    /// Apply events as they arrive until [`EventInbox::shutdown`].
    pub async fn run(&mut self) {
        let inbox = self.inbox;
        info!("RT: event loop started");
        loop {
            // `or` polls the inbox first, so ready events win over the stop.
            let next = futures_lite::future::or(async { Some(inbox.next().await) }, async {
                inbox.stopped().await;
                None
            })
            .await;

            match next {
                Some(event) => self.service.handle(event),
                None => break,
            }
        }
        let drained = self.pump();
        info!("RT: event loop stopped ({} late events applied)", drained);
    }

    /// Run the loop together with a ticker posting
    /// [`PeripheralEvent::Tick`] every `tick_period`, blocking the calling
    /// thread until shutdown. Hands the service back afterwards.
    pub fn run_blocking(mut self, tick_period: Duration) -> ImprovService<T, U> {
        {
            let executor: edge_executor::LocalExecutor<'_, 4> =
                edge_executor::LocalExecutor::new();
            executor.spawn(ticker(self.inbox, tick_period)).detach();
            futures_lite::future::block_on(executor.run(self.run()));
        }
        self.service
    }

    pub fn service(&self) -> &ImprovService<T, U> {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut ImprovService<T, U> {
        &mut self.service
    }

    pub fn inbox(&self) -> &'a EventInbox {
        self.inbox
    }

    pub fn into_service(self) -> ImprovService<T, U> {
        self.service
    }
}

/// Post a tick every `period`.
///
/// A full inbox drops the tick and the countdown is not caught up, so
/// each dropped tick lengthens the authorization window by one period.
async fn ticker(inbox: &EventInbox, period: Duration) {
    debug!("RT: ticker every {:?}", period);
    loop {
        async_io_mini::Timer::after(period).await;
        if let Err(e) = inbox.post(PeripheralEvent::Tick) {
            warn!("RT: tick dropped ({}), authorization countdown runs late", e);
        }
    }
}
