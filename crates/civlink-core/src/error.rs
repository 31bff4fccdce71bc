//! Error types for civlink.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport failures, CI-V protocol
//! errors, and policy rejections from the device profile are all captured
//! here.

use crate::types::Vfo;

/// The error type for all civlink operations.
///
/// Variants cover the full range of failure modes encountered when
/// controlling a transceiver over a half-duplex serial bus: physical
/// transport failures, protocol decode errors, timeouts, and requests
/// the connected radio cannot honor.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port open/read/write failure).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (malformed CI-V frame, NAK from the rig,
    /// unexpected response shape).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for a response from the rig.
    ///
    /// This typically indicates the rig is powered off, the baud rate is
    /// wrong, or the CI-V address is incorrect.
    #[error("timeout waiting for response")]
    Timeout,

    /// The requested operation is not supported by this rig model.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// An invalid parameter was passed to a rig command.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The rig reported a mode/width code pair outside the known table.
    ///
    /// CI-V reserves mode codes for operating modes this device profile
    /// does not implement (data sub-modes, DR memories). An unknown pair
    /// is surfaced rather than mapped to a default.
    #[error("unrecognized mode code: mode=0x{mode:02X} width=0x{width:02X}")]
    UnrecognizedMode {
        /// Mode byte as reported by the rig.
        mode: u8,
        /// Width/filter byte as reported by the rig.
        width: u8,
    },

    /// A split pairing the radio's hardware cannot realize.
    ///
    /// Dual-watch mobiles wire transmit to the Main band and receive to
    /// the Sub band; any other pairing is rejected before a single byte
    /// goes out on the wire.
    #[error("unsupported split pairing: tx={tx_vfo} rx={rx_vfo} (transmit must be on A/Main)")]
    UnsupportedSplit {
        /// Requested transmit VFO.
        tx_vfo: Vfo,
        /// Requested receive VFO.
        rx_vfo: Vfo,
    },

    /// No connection to the rig has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the rig was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_transport() {
        let e = Error::Transport("port busy".into());
        assert_eq!(e.to_string(), "transport error: port busy");
    }

    #[test]
    fn error_display_unrecognized_mode() {
        let e = Error::UnrecognizedMode {
            mode: 0x23,
            width: 0x01,
        };
        assert_eq!(e.to_string(), "unrecognized mode code: mode=0x23 width=0x01");
    }

    #[test]
    fn error_display_unsupported_split() {
        let e = Error::UnsupportedSplit {
            tx_vfo: Vfo::Sub,
            rx_vfo: Vfo::Main,
        };
        assert_eq!(
            e.to_string(),
            "unsupported split pairing: tx=Sub rx=Main (transmit must be on A/Main)"
        );
    }

    #[test]
    fn error_display_timeout() {
        assert_eq!(Error::Timeout.to_string(), "timeout waiting for response");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("pipe broken"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<Error>();
    }
}
