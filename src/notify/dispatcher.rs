//! Notification dispatcher with backpressure handling.
//!
//! A push rejected by the transport is parked at the tail of a FIFO
//! retry queue. While anything is parked, new publishes queue behind it
//! so the central observes notifications in exactly the order they were
//! produced, with no reordering or coalescing. Only `Busy` parks a push;
//! any other transport error drops it with a warning.
//!
//! ```text
//!  publish ──▶ queue empty? ──yes──▶ transport.notify ──Busy──┐
//!                  │ no                                       │
//!                  ▼                                          ▼
//!            ┌──────────────────────────────────────────────────┐
//!            │ pending: [head] [ ] [ ] ... [tail]               │
//!            └──────────────────────────────────────────────────┘
//!                  ▲
//!  on_transport_ready ── drain from head, stop at first Busy
//! ```

use std::collections::VecDeque;

use log::{debug, warn};

use super::subscriptions::SubscriptionRegistry;
use crate::protocol::codec::Frame;
use crate::protocol::transport::{GattTransport, TransportError};
use crate::protocol::types::Characteristic;

/// A notification waiting for transport capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNotification {
    pub characteristic: Characteristic,
    pub value: Frame,
}

/// What happened to a single publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Handed to the transport.
    Sent,
    /// Nobody is subscribed; nothing to push.
    NoSubscribers,
    /// Parked in the retry queue.
    Queued,
    /// Refused for a reason other than a full buffer; not retried.
    Dropped,
}

#[derive(Debug, Default)]
pub struct NotificationDispatcher {
    pending: VecDeque<PendingNotification>,
    /// Number of pushes the transport has refused (lifetime counter).
    rejected_count: u32,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            rejected_count: 0,
        }
    }

    /// Push `value` to every subscriber of `characteristic`, or queue it.
    pub fn publish(
        &mut self,
        registry: &SubscriptionRegistry,
        transport: &mut impl GattTransport,
        characteristic: Characteristic,
        value: Frame,
    ) -> PublishOutcome {
        let centrals = registry.subscribers_of(characteristic);
        if centrals.is_empty() {
            return PublishOutcome::NoSubscribers;
        }

        if !self.pending.is_empty() {
            debug!(
                "NOTIFY: {} queued behind {} pending",
                characteristic,
                self.pending.len()
            );
            self.enqueue(characteristic, value);
            return PublishOutcome::Queued;
        }

        match transport.notify(characteristic, &value, &centrals) {
            Ok(()) => PublishOutcome::Sent,
            Err(TransportError::Busy) => {
                self.rejected_count = self.rejected_count.wrapping_add(1);
                warn!("NOTIFY: {} rejected (buffer full), queued for retry", characteristic);
                self.enqueue(characteristic, value);
                PublishOutcome::Queued
            }
            Err(e) => {
                warn!("NOTIFY: {} dropped ({})", characteristic, e);
                PublishOutcome::Dropped
            }
        }
    }

    /// Drain the retry queue from the head after the transport frees
    /// capacity. Stops at the first renewed rejection.
    ///
    /// Returns the number of jobs removed from the queue.
    pub fn on_transport_ready(
        &mut self,
        registry: &SubscriptionRegistry,
        transport: &mut impl GattTransport,
    ) -> usize {
        let mut drained = 0;

        while let Some(job) = self.pending.front() {
            let centrals = registry.subscribers_of(job.characteristic);
            if !centrals.is_empty() {
                match transport.notify(job.characteristic, &job.value, &centrals) {
                    Ok(()) => {}
                    Err(TransportError::Busy) => {
                        self.rejected_count = self.rejected_count.wrapping_add(1);
                        debug!(
                            "NOTIFY: retry of {} rejected, {} still pending",
                            job.characteristic,
                            self.pending.len()
                        );
                        break;
                    }
                    Err(e) => warn!("NOTIFY: retry of {} dropped ({})", job.characteristic, e),
                }
            }
            // Delivered, dropped, or every subscriber has since left.
            self.pending.pop_front();
            drained += 1;
        }

        if drained > 0 {
            debug!("NOTIFY: drained {} pending, {} left", drained, self.pending.len());
        }
        drained
    }

    /// Discard every pending job (session teardown).
    pub fn clear(&mut self) {
        if !self.pending.is_empty() {
            debug!("NOTIFY: discarding {} pending notifications", self.pending.len());
        }
        self.pending.clear();
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingNotification> {
        self.pending.iter()
    }

    pub fn rejected_count(&self) -> u32 {
        self.rejected_count
    }

    fn enqueue(&mut self, characteristic: Characteristic, value: Frame) {
        self.pending.push_back(PendingNotification {
            characteristic,
            value,
        });
    }
}

/// A one-byte characteristic value.
pub fn single_byte(byte: u8) -> Frame {
    let mut frame = Frame::new();
    let _ = frame.push(byte);
    frame
}
