//! Fuzz target: `codec::decode`
//!
//! Arbitrary bytes on the `rpc_command` characteristic must decode or
//! fail with a `CodecError`; never panic, never read past the buffer.
//! Anything that decodes must re-encode to a checksum-valid frame.
//!
//! cargo fuzz run fuzz_packet_decoder

#![no_main]

use improv::protocol::checksum::verify;
use improv::protocol::codec::{self, RpcRequest};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    match codec::decode(data) {
        Ok(RpcRequest::SubmitCredentials(c)) => {
            let frame = codec::encode(1, &[c.ssid.as_str(), c.password.as_str()])
                .expect("decoded fields always fit a frame");
            assert!(verify(&frame));
        }
        Ok(RpcRequest::Identify | RpcRequest::Unknown(_)) => {
            assert!(verify(data));
        }
        Err(_) => {}
    }
});
