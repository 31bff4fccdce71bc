//! civlink-core: Core traits, types, and error definitions for civlink.
//!
//! This crate defines the protocol-agnostic abstractions the civlink rig
//! drivers implement. Applications depend on these types without pulling
//! in any specific protocol engine.
//!
//! # Key types
//!
//! - [`Rig`] -- the unified trait for controlling a transceiver
//! - [`Transport`] -- byte-level communication channel
//! - [`RigEvent`] -- asynchronous state change notifications
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod events;
pub mod helpers;
pub mod rig;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use civlink_core::*`.
pub use error::{Error, Result};
pub use events::RigEvent;
pub use helpers::{format_freq_mhz, s_units_from_dbm};
pub use rig::Rig;
pub use transport::Transport;
pub use types::*;
