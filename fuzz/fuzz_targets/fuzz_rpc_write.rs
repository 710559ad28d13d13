//! Fuzz target: `ImprovService::handle_write`
//!
//! Feeds arbitrary writes into an authorized session. Whatever arrives,
//! the engine must stay enabled and end in a state reachable from
//! `Authorized` by one command.
//!
//! cargo fuzz run fuzz_rpc_write

#![no_main]

use improv::app::ports::NullUi;
use improv::app::service::ImprovService;
use improv::config::SessionConfig;
use improv::protocol::transport::NullTransport;
use improv::protocol::types::{Characteristic, ServerState};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut svc = ImprovService::new(NullTransport, NullUi);
    assert!(svc.enable(&SessionConfig::new(false, true)));
    svc.subscribe(1, Characteristic::ErrorState);

    svc.handle_write(1, Characteristic::RpcCommand, data);

    assert!(svc.is_enabled());
    assert!(matches!(
        svc.state(),
        ServerState::Authorized | ServerState::Provisioning
    ));
});
