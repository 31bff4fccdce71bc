//! Icom CI-V protocol backend for civlink.
//!
//! This crate implements the Icom CI-V (Communication Interface V) binary
//! protocol for the dual-watch D-STAR mobile family (ID-5100, ID-4100).
//! It provides:
//!
//! - **Frame codec** ([`civ`]) -- encode and decode CI-V frames, BCD
//!   conversion, and collision detection on the half-duplex bus.
//! - **Mode codec** ([`mode`]) -- the radio-specific mapping between
//!   operating modes and (mode byte, width byte) pairs, including the
//!   shared mode bytes of the narrow variants.
//! - **Command builders** ([`commands`]) -- construct correctly-formatted
//!   commands (frequency, mode, band selection, dual watch, functions,
//!   levels, metering, PTT, duplex, tones, power) and parse the
//!   corresponding responses.
//! - **Model definitions** ([`models`]) -- static capability data for the
//!   supported radios.
//! - **IcomRig** ([`rig`]) -- the [`Rig`](civlink_core::Rig) trait
//!   implementation, including the dual-watch reconciliation that makes
//!   VFO A/B and Main/Sub addressing interchangeable.
//! - **IcomBuilder** ([`builder`]) -- fluent builder for constructing
//!   `IcomRig` instances with configurable serial, address, region, and
//!   timeout settings.
//!
//! # Example
//!
//! ```
//! use civlink_icom::civ::{decode_frame, Decoded};
//! use civlink_icom::commands::cmd_read_frequency;
//!
//! // Build a "read frequency" command for an ID-5100
//! let cmd = cmd_read_frequency(0x8C);
//! assert_eq!(cmd, vec![0xFE, 0xFE, 0x8C, 0xE0, 0x03, 0xFD]);
//!
//! // Simulate receiving an ACK from the rig
//! let response = vec![0xFE, 0xFE, 0xE0, 0x8C, 0xFB, 0xFD];
//! if let Decoded::Frame { frame, .. } = decode_frame(&response) {
//!     assert!(frame.is_ack());
//! }
//! ```

pub mod builder;
pub mod civ;
pub mod commands;
pub mod mode;
pub mod models;
pub mod rig;

mod io;

pub use builder::IcomBuilder;
pub use rig::IcomRig;
