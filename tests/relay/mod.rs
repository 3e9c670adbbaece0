//! Relay scenarios
//!
//! Client events are decoded from their JSON wire frames, as the socket
//! handler receives them.

mod call_flow_tests;
mod socket_message_tests;
