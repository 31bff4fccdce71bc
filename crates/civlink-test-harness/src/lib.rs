//! civlink-test-harness: Mock transports for civlink.
//!
//! Provides [`MockTransport`] for deterministic unit testing of the CI-V
//! protocol engine without requiring real radio hardware.

pub mod mock_serial;

pub use mock_serial::MockTransport;
