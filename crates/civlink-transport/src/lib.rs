//! civlink-transport: physical-layer transports for civlink.
//!
//! Provides [`SerialTransport`] for the CI-V jack (or USB virtual COM
//! port) of a transceiver. The protocol engine in `civlink-icom` consumes
//! these through the [`Transport`](civlink_core::Transport) trait.

pub mod serial;

pub use serial::SerialTransport;
