//! Notification delivery when the transport refuses pushes.

use improv::config::SessionConfig;
use improv::protocol::types::{Characteristic, ServerState};

use crate::mock_gatt::{CENTRAL, credentials_packet, subscribed, write};

#[test]
fn rejected_push_is_queued_and_drained_in_order() {
    let mut svc = subscribed(&SessionConfig::new(true, true));
    svc.transport_mut().budget = Some(0);

    svc.authorize();
    assert_eq!(svc.dispatcher().pending_len(), 1);

    // Different characteristic, still queued behind the head.
    write(&mut svc, &[0xFF]);
    assert_eq!(svc.dispatcher().pending_len(), 2);
    assert!(svc.transport().sent.is_empty());

    svc.transport_mut().budget = Some(1);
    assert_eq!(svc.transport_ready(), 1);
    assert_eq!(svc.dispatcher().pending_len(), 1);

    svc.transport_mut().budget = Some(5);
    assert_eq!(svc.transport_ready(), 1);
    assert_eq!(
        svc.transport().history(),
        vec![
            (Characteristic::CurrentState, 2),
            (Characteristic::ErrorState, 1),
        ]
    );
    assert_eq!(svc.dispatcher().rejected_count(), 2);
}

#[test]
fn new_publishes_wait_behind_pending_even_with_capacity() {
    let mut svc = subscribed(&SessionConfig::new(true, true));
    svc.transport_mut().budget = Some(0);
    svc.authorize();

    svc.transport_mut().budget = None;
    write(&mut svc, &credentials_packet("net", "pw"));
    assert!(svc.transport().sent.is_empty());
    assert_eq!(svc.dispatcher().pending_len(), 2);

    assert_eq!(svc.transport_ready(), 2);
    assert_eq!(
        svc.transport().values_on(Characteristic::CurrentState),
        vec![vec![2], vec![3]]
    );
}

#[test]
fn whole_flow_under_backpressure_keeps_order() {
    let mut svc = subscribed(&SessionConfig::new(true, true).with_redirect("http://x"));
    svc.transport_mut().budget = Some(0);

    svc.authorize();
    write(&mut svc, &credentials_packet("net", "pw"));
    svc.wifi_connected();
    assert_eq!(svc.state(), ServerState::Provisioned);
    assert_eq!(svc.dispatcher().pending_len(), 4);

    // Trickle: one slot per readiness signal.
    let mut rounds = 0;
    while svc.dispatcher().pending_len() > 0 {
        svc.transport_mut().budget = Some(1);
        assert_eq!(svc.transport_ready(), 1);
        rounds += 1;
    }
    assert_eq!(rounds, 4);
    assert_eq!(
        svc.transport().history(),
        vec![
            (Characteristic::CurrentState, 2),
            (Characteristic::CurrentState, 3),
            (Characteristic::CurrentState, 4),
            (Characteristic::RpcResult, 1),
        ]
    );
}

#[test]
fn ready_with_no_capacity_drains_nothing() {
    let mut svc = subscribed(&SessionConfig::new(true, true));
    svc.transport_mut().budget = Some(0);
    svc.authorize();
    assert_eq!(svc.transport_ready(), 0);
    assert_eq!(svc.dispatcher().pending_len(), 1);
}

#[test]
fn disable_discards_queued_notifications() {
    let mut svc = subscribed(&SessionConfig::new(true, true));
    svc.transport_mut().budget = Some(0);
    svc.authorize();
    svc.disable();
    assert_eq!(svc.dispatcher().pending_len(), 0);

    // A readiness signal arriving after teardown has nothing to send.
    svc.transport_mut().budget = None;
    assert_eq!(svc.transport_ready(), 0);
    assert!(svc.transport().sent.is_empty());
}

#[test]
fn jobs_for_departed_subscribers_are_dropped() {
    let mut svc = subscribed(&SessionConfig::new(true, true));
    svc.transport_mut().budget = Some(0);
    svc.authorize();
    assert!(svc.unsubscribe(CENTRAL, Characteristic::CurrentState));

    svc.transport_mut().budget = None;
    assert_eq!(svc.transport_ready(), 1);
    assert!(svc.transport().sent.is_empty());
}

#[test]
fn broadcast_reaches_every_subscriber() {
    let mut svc = subscribed(&SessionConfig::new(true, true));
    assert!(svc.subscribe(2, Characteristic::CurrentState));
    assert!(!svc.subscribe(2, Characteristic::CurrentState));
    svc.authorize();

    assert_eq!(svc.transport().sent.len(), 1);
    assert_eq!(svc.transport().sent[0].centrals, vec![CENTRAL, 2]);
}

#[test]
fn non_notifiable_characteristics_cannot_be_subscribed() {
    let mut svc = subscribed(&SessionConfig::new(true, true));
    assert!(!svc.subscribe(2, Characteristic::Capabilities));
    assert!(!svc.subscribe(2, Characteristic::RpcCommand));
}
