//! Serial port transport for rig communication.
//!
//! This module provides [`SerialTransport`], which implements the
//! [`Transport`] trait for the CI-V remote jack or USB virtual COM port
//! of a mobile transceiver.
//!
//! The line discipline is fixed at 8 data bits, 1 stop bit, no parity,
//! no handshake — the only framing these radios speak. Only the baud
//! rate varies (4800–19200 on the mobiles this library targets).
//!
//! # Example
//!
//! ```no_run
//! use civlink_transport::SerialTransport;
//! use civlink_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> civlink_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 19200).await?;
//!
//! // Send a CI-V command
//! transport.send(&[0xFE, 0xFE, 0x8C, 0xE0, 0x03, 0xFD]).await?;
//!
//! // Receive response with 1 second timeout
//! let mut buf = [0u8; 256];
//! let n = transport.receive(&mut buf, Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};
use tracing::{debug, trace, warn};

use civlink_core::error::{Error, Result};
use civlink_core::transport::Transport;

/// Serial port transport to a CI-V radio.
pub struct SerialTransport {
    /// The underlying serial port stream. `None` after `close()`.
    port: Option<SerialStream>,
    /// Port name for logging.
    port_name: String,
}

impl SerialTransport {
    /// Open a serial port at the given baud rate with the 8N1 no-handshake
    /// discipline the radio expects.
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g. "/dev/ttyUSB0" on Linux, "COM3" on Windows)
    /// * `baud_rate` - Baud rate (4800, 9600, or 19200 for these radios)
    pub async fn open(port: &str, baud_rate: u32) -> Result<Self> {
        debug!(port = %port, baud_rate, "opening serial port");

        let mut stream = tokio_serial::new(port, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::None)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| Error::Transport(format!("failed to open serial port {port}: {e}")))?;

        // De-assert DTR and RTS immediately after opening. Some interface
        // cables route these lines to PTT; an OS that asserts DTR on open
        // would otherwise key the transmitter.
        if let Err(e) = stream.write_data_terminal_ready(false) {
            warn!(port = %port, error = %e, "failed to de-assert DTR");
        }
        if let Err(e) = stream.write_request_to_send(false) {
            warn!(port = %port, error = %e, "failed to de-assert RTS");
        }

        Ok(Self {
            port: Some(stream),
            port_name: port.to_string(),
        })
    }

    /// Get the name of the serial port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        trace!(port = %self.port_name, bytes = data.len(), "sending");

        port.write_all(data).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::BrokenPipe
                || e.kind() == std::io::ErrorKind::NotConnected
            {
                Error::ConnectionLost
            } else {
                Error::Io(e)
            }
        })?;

        // Flush so the frame goes out as one burst on the half-duplex bus.
        port.flush().await.map_err(Error::Io)?;
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        match tokio::time::timeout(timeout, port.read(buf)).await {
            Ok(Ok(0)) => Err(Error::ConnectionLost),
            Ok(Ok(n)) => {
                trace!(port = %self.port_name, bytes = n, "received");
                Ok(n)
            }
            Ok(Err(e)) => {
                if e.kind() == std::io::ErrorKind::BrokenPipe
                    || e.kind() == std::io::ErrorKind::NotConnected
                {
                    Err(Error::ConnectionLost)
                } else {
                    Err(Error::Io(e))
                }
            }
            Err(_) => Err(Error::Timeout),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            debug!(port = %self.port_name, "serial port closed");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}
