//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host (x86_64) with no
//! real hardware required.

mod bridge_flow_tests;
mod initiator_tests;
mod mocks;
mod responder_tests;
mod two_board_tests;
