//! Provisioning state machine: transitions, guards, and the values
//! pushed to subscribers along the way.

use improv::app::events::PeripheralEvent;
use improv::config::SessionConfig;
use improv::protocol::checksum::checksum;
use improv::protocol::codec;
use improv::protocol::types::{Capabilities, Characteristic, ErrorState, ServerState, ServiceData};

use crate::mock_gatt::{
    CENTRAL, UiCall, credentials_packet, identify_packet, service, subscribed, write,
};

fn auth_session() -> SessionConfig {
    SessionConfig::new(true, true).with_timeout(60)
}

// ── Happy path ────────────────────────────────────────────────

#[test]
fn full_provisioning_flow_publishes_redirect() {
    let cfg = auth_session().with_redirect("http://10.0.0.2/setup");
    let mut svc = subscribed(&cfg);
    assert_eq!(svc.state(), ServerState::AuthorizationRequired);

    assert!(svc.authorize());
    assert_eq!(svc.state(), ServerState::Authorized);
    assert!(svc.timer().is_active());

    write(&mut svc, &credentials_packet("HomeWiFi", "hunter22"));
    assert_eq!(svc.state(), ServerState::Provisioning);
    assert!(svc.ui().contains(&UiCall::Credentials {
        ssid: "HomeWiFi".into(),
        password: "hunter22".into(),
    }));

    assert!(svc.wifi_connected());
    assert_eq!(svc.state(), ServerState::Provisioned);
    assert!(!svc.timer().is_active());

    let expected = codec::encode(1, &["http://10.0.0.2/setup"]).unwrap();
    assert_eq!(
        svc.transport().history(),
        vec![
            (Characteristic::CurrentState, 2),
            (Characteristic::CurrentState, 3),
            (Characteristic::CurrentState, 4),
            (Characteristic::RpcResult, 1),
        ]
    );
    assert_eq!(
        svc.transport().values_on(Characteristic::RpcResult),
        vec![expected.to_vec()]
    );
    assert_eq!(svc.last_result(), expected.as_slice());
    assert_eq!(
        svc.read(Characteristic::RpcResult).unwrap().as_slice(),
        expected.as_slice()
    );
}

#[test]
fn connected_without_redirect_publishes_empty_result() {
    let mut svc = subscribed(&SessionConfig::new(false, false));
    assert_eq!(svc.state(), ServerState::Authorized);

    write(&mut svc, &credentials_packet("net", "pw"));
    assert!(svc.wifi_connected());

    assert_eq!(
        svc.transport().values_on(Characteristic::RpcResult),
        vec![vec![1, 0, 1]]
    );
}

#[test]
fn state_changes_refresh_the_advertisement() {
    let mut svc = subscribed(&auth_session());
    assert_eq!(
        svc.transport().advertising,
        Some(ServiceData::new(
            ServerState::AuthorizationRequired,
            Capabilities::CAN_BE_IDENTIFIED
        ))
    );

    svc.authorize();
    assert_eq!(
        svc.transport().advertising.map(|d| d.to_bytes()),
        Some([2, 1, 0, 0, 0, 0])
    );
}

#[test]
fn events_route_through_handle() {
    let mut svc = service();
    svc.handle(PeripheralEvent::Enable(auth_session()));
    svc.handle(PeripheralEvent::Subscribe {
        central: CENTRAL,
        characteristic: Characteristic::CurrentState,
    });
    svc.handle(PeripheralEvent::Authorize);
    svc.handle(PeripheralEvent::write(
        CENTRAL,
        Characteristic::RpcCommand,
        &credentials_packet("a", "b"),
    ));
    svc.handle(PeripheralEvent::WifiFailed);

    assert_eq!(svc.state(), ServerState::Authorized);
    assert_eq!(svc.error(), ErrorState::UnableToConnect);
    assert_eq!(
        svc.transport().values_on(Characteristic::CurrentState),
        vec![vec![2], vec![3], vec![2]]
    );
}

// ── Guards ────────────────────────────────────────────────────

#[test]
fn credentials_before_authorization_are_refused() {
    let mut svc = subscribed(&auth_session());
    write(&mut svc, &credentials_packet("net", "pw"));

    assert_eq!(svc.state(), ServerState::AuthorizationRequired);
    assert_eq!(svc.error(), ErrorState::NotAuthorized);
    assert_eq!(
        svc.transport().history(),
        vec![(Characteristic::ErrorState, 4)]
    );
    assert!(!svc.ui().calls.iter().any(|c| matches!(c, UiCall::Credentials { .. })));
}

#[test]
fn bad_checksum_is_invalid_packet_without_state_change() {
    let mut svc = subscribed(&SessionConfig::new(false, true));
    let mut packet = vec![1, 6, 3, b'a', b'b', b'c', 0, 0];
    let last = packet.len() - 1;
    packet[last] = checksum(&packet).wrapping_add(1);

    write(&mut svc, &packet);
    assert_eq!(svc.state(), ServerState::Authorized);
    assert_eq!(svc.error(), ErrorState::InvalidPacket);
    assert_eq!(svc.read(Characteristic::ErrorState).unwrap().as_slice(), &[1]);
}

#[test]
fn empty_password_packet_is_accepted() {
    let mut svc = subscribed(&SessionConfig::new(false, true));
    let mut packet = vec![1, 6, 3, b'a', b'b', b'c', 0, 0];
    let last = packet.len() - 1;
    packet[last] = checksum(&packet);

    write(&mut svc, &packet);
    assert_eq!(svc.state(), ServerState::Provisioning);
    assert_eq!(svc.error(), ErrorState::NoError);
    assert!(svc.ui().contains(&UiCall::Credentials {
        ssid: "abc".into(),
        password: String::new(),
    }));
}

#[test]
fn truncated_fields_are_invalid_packet() {
    let mut svc = subscribed(&SessionConfig::new(false, true));
    let mut packet = vec![1, 4, 9, b'a', b'b', b'c', 0];
    let last = packet.len() - 1;
    packet[last] = checksum(&packet);

    write(&mut svc, &packet);
    assert_eq!(svc.state(), ServerState::Authorized);
    assert_eq!(svc.error(), ErrorState::InvalidPacket);
}

#[test]
fn unknown_command_sets_unknown_command() {
    let mut svc = subscribed(&SessionConfig::new(false, true));
    write(&mut svc, &codec::encode(0x42, &[]).unwrap());
    assert_eq!(svc.error(), ErrorState::UnknownCommand);
    assert_eq!(svc.state(), ServerState::Authorized);
}

#[test]
fn every_error_is_pushed_even_when_repeated() {
    let mut svc = subscribed(&SessionConfig::new(false, true));
    write(&mut svc, &[0xFF]);
    write(&mut svc, &[0xFF]);
    assert_eq!(
        svc.transport().values_on(Characteristic::ErrorState),
        vec![vec![1], vec![1]]
    );
}

#[test]
fn identify_only_before_provisioning() {
    let mut svc = subscribed(&auth_session());
    write(&mut svc, &identify_packet());
    assert!(svc.ui().contains(&UiCall::Identify));
    assert_eq!(svc.error(), ErrorState::NoError);

    svc.authorize();
    write(&mut svc, &credentials_packet("net", "pw"));
    write(&mut svc, &identify_packet());
    assert_eq!(svc.error(), ErrorState::UnknownError);
    assert_eq!(svc.state(), ServerState::Provisioning);
}

#[test]
fn wifi_outcomes_outside_provisioning_are_ignored() {
    let mut svc = subscribed(&auth_session());
    assert!(!svc.wifi_connected());
    assert!(!svc.wifi_failed());
    assert_eq!(svc.state(), ServerState::AuthorizationRequired);
    assert!(svc.transport().sent.is_empty());
}

#[test]
fn writes_before_enable_are_ignored() {
    let mut svc = service();
    assert!(!svc.handle_write(CENTRAL, Characteristic::RpcCommand, &[0xFF]));
    assert_eq!(svc.error(), ErrorState::NoError);
}

// ── Wi-Fi failure and retry ───────────────────────────────────

#[test]
fn failed_connection_returns_to_authorized_and_rearms_timer() {
    let mut svc = subscribed(&auth_session());
    svc.authorize();
    write(&mut svc, &credentials_packet("net", "wrong"));
    assert!(!svc.timer().is_active());

    assert!(svc.wifi_failed());
    assert_eq!(svc.state(), ServerState::Authorized);
    assert_eq!(svc.error(), ErrorState::UnableToConnect);
    assert_eq!(svc.timer().remaining_secs(), Some(60));
    assert_eq!(
        svc.transport().history(),
        vec![
            (Characteristic::CurrentState, 2),
            (Characteristic::CurrentState, 3),
            (Characteristic::ErrorState, 3),
            (Characteristic::CurrentState, 2),
        ]
    );

    // Second attempt succeeds; the error stays until the next session.
    write(&mut svc, &credentials_packet("net", "right"));
    assert!(svc.wifi_connected());
    assert_eq!(svc.state(), ServerState::Provisioned);
    assert_eq!(svc.error(), ErrorState::UnableToConnect);
}

#[test]
fn failed_connection_without_auth_has_no_timer() {
    let mut svc = subscribed(&SessionConfig::new(false, false).with_timeout(10));
    write(&mut svc, &credentials_packet("net", "pw"));
    svc.wifi_failed();
    assert!(!svc.timer().is_active());
}

// ── Authorization timer ───────────────────────────────────────

#[test]
fn authorization_lapses_after_timeout() {
    let mut svc = subscribed(&SessionConfig::new(true, true).with_timeout(2));
    svc.authorize();
    svc.tick();
    assert_eq!(svc.state(), ServerState::Authorized);
    svc.tick();

    assert_eq!(svc.state(), ServerState::AuthorizationRequired);
    assert!(!svc.timer().is_active());
    assert_eq!(svc.ui().ticks(), vec![2, 1, 0]);

    svc.tick();
    assert_eq!(svc.ui().ticks(), vec![2, 1, 0]);
}

#[test]
fn authorize_again_restarts_countdown() {
    let mut svc = subscribed(&SessionConfig::new(true, true).with_timeout(5));
    svc.authorize();
    svc.tick();
    svc.tick();
    assert_eq!(svc.timer().remaining_secs(), Some(3));

    assert!(svc.authorize());
    assert_eq!(svc.timer().remaining_secs(), Some(5));
    assert_eq!(svc.state(), ServerState::Authorized);
}

#[test]
fn provisioning_is_not_interrupted_by_timeout() {
    let mut svc = subscribed(&SessionConfig::new(true, true).with_timeout(2));
    svc.authorize();
    write(&mut svc, &credentials_packet("net", "pw"));
    for _ in 0..5 {
        svc.tick();
    }
    assert_eq!(svc.state(), ServerState::Provisioning);
    assert!(svc.wifi_connected());
}

#[test]
fn no_timeout_configured_never_lapses() {
    let mut svc = subscribed(&SessionConfig::new(true, true));
    svc.authorize();
    for _ in 0..100 {
        svc.tick();
    }
    assert_eq!(svc.state(), ServerState::Authorized);
    assert!(svc.ui().ticks().is_empty());
}

// ── Lifecycle ─────────────────────────────────────────────────

#[test]
fn disable_resets_everything() {
    let mut svc = subscribed(&SessionConfig::new(true, true).with_timeout(30));
    svc.authorize();
    write(&mut svc, &[0x00]);
    assert_eq!(svc.error(), ErrorState::InvalidPacket);

    svc.disable();
    assert_eq!(svc.state(), ServerState::Unknown);
    assert_eq!(svc.error(), ErrorState::NoError);
    assert!(svc.subscriptions().is_empty());
    assert!(!svc.timer().is_active());
    assert!(!svc.is_enabled());
    assert_eq!(svc.transport().advertising, None);

    let calls = &svc.ui().calls;
    assert_eq!(
        &calls[calls.len() - 2..],
        &[UiCall::Error(ErrorState::NoError), UiCall::State(ServerState::Unknown)]
    );
}

#[test]
fn disable_from_every_state_returns_to_unknown() {
    let drivers: [fn(&mut crate::mock_gatt::TestService); 4] = [
        |_| {},
        |s| {
            s.authorize();
        },
        |s| {
            s.authorize();
            write(s, &credentials_packet("n", "p"));
        },
        |s| {
            s.authorize();
            write(s, &credentials_packet("n", "p"));
            s.wifi_connected();
        },
    ];
    for drive in drivers {
        let mut svc = subscribed(&auth_session());
        drive(&mut svc);
        svc.disable();
        assert_eq!(svc.state(), ServerState::Unknown);
        assert!(svc.subscriptions().is_empty());
        assert!(!svc.timer().is_active());
    }
}

#[test]
fn second_enable_is_rejected() {
    let mut svc = subscribed(&auth_session());
    assert!(!svc.enable(&SessionConfig::new(false, false)));
    assert_eq!(svc.state(), ServerState::AuthorizationRequired);
    assert_eq!(svc.capabilities(), Capabilities::CAN_BE_IDENTIFIED);
}

#[test]
fn enable_while_powered_off_reports_unavailable() {
    let mut svc = service();
    svc.transport_mut().powered = false;
    assert!(!svc.enable(&auth_session()));
    assert!(!svc.is_enabled());
    assert_eq!(svc.ui().calls, vec![UiCall::BluetoothUnavailable]);
}

#[test]
fn registration_failure_at_enable() {
    let mut svc = service();
    svc.transport_mut().fail_registration = true;
    assert!(!svc.enable(&auth_session()));
    assert_eq!(svc.state(), ServerState::Unknown);
    assert_eq!(svc.ui().calls, vec![UiCall::FailedToStart]);
}

#[test]
fn unencodable_redirect_refuses_enable_before_advertising() {
    let mut svc = service();
    let url = "h".repeat(300);
    assert!(!svc.enable(&auth_session().with_redirect(url)));
    assert!(!svc.is_enabled());
    assert_eq!(svc.transport().advertising, None);
    assert_eq!(svc.ui().calls, vec![UiCall::FailedToStart]);
}

#[test]
fn command_before_enable_is_ignored() {
    let mut svc = service();
    assert!(!svc.handle_command(&[0x00]));
    assert!(!svc.handle_command(&identify_packet()));
    assert_eq!(svc.error(), ErrorState::NoError);
    assert!(svc.ui().calls.is_empty());
    assert!(svc.transport().sent.is_empty());
}

#[test]
fn power_loss_forces_disable() {
    let mut svc = subscribed(&auth_session());
    svc.authorize();
    svc.handle(PeripheralEvent::PoweredOff);

    assert!(!svc.is_enabled());
    assert_eq!(svc.state(), ServerState::Unknown);
    assert!(svc.subscriptions().is_empty());
    assert_eq!(svc.ui().calls.last(), Some(&UiCall::BluetoothUnavailable));
}

#[test]
fn late_registration_failure_forces_disable() {
    let mut svc = subscribed(&auth_session());
    svc.handle(PeripheralEvent::ServiceRegistrationFailed);
    assert!(!svc.is_enabled());
    assert_eq!(svc.ui().calls.last(), Some(&UiCall::FailedToStart));

    // A fresh session can start afterwards.
    assert!(svc.enable(&auth_session()));
}
