//! Fuzz target: `NetworkBridge::handle_text`
//!
//! Any frame text must map to nothing, a known UART command line, or a
//! direct reply; never a line outside the vocabulary.
//!
//! cargo fuzz run fuzz_bridge_frames

#![no_main]

use aera::config::TokenTable;
use aera::link::bridge::{BridgeAction, NetworkBridge};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let tokens = TokenTable::default();
    let bridge = NetworkBridge::new(tokens.clone(), true);

    match bridge.handle_text(text) {
        Some(BridgeAction::Forward { line, .. }) => {
            assert!(line == tokens.led_on.as_str() || line == tokens.led_off.as_str());
        }
        Some(BridgeAction::Reply(reply)) => assert_eq!(reply, tokens.net_pong.as_str()),
        None => {}
    }
});
