//! Board-to-board link: line framing, request/reply exchange, command
//! dispatch and the network bridge.

pub mod bridge;
pub mod channel;
pub mod codec;
pub mod dispatcher;
pub mod exchange;
pub mod queue;
pub mod transport;
