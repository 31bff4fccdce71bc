//! IcomBuilder -- fluent builder for constructing [`IcomRig`] instances.
//!
//! Separates configuration from construction so that callers can set up
//! serial parameters, CI-V address overrides, the band-plan region, and
//! timeout/retry policy before establishing the transport connection.
//!
//! # Example
//!
//! ```no_run
//! use civlink_icom::builder::IcomBuilder;
//! use civlink_icom::models::id_5100;
//! use std::time::Duration;
//!
//! # async fn example() -> civlink_core::Result<()> {
//! let rig = IcomBuilder::new(id_5100())
//!     .serial_port("/dev/ttyUSB0")
//!     .baud_rate(19_200)
//!     .command_timeout(Duration::from_millis(1000))
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tokio::sync::broadcast;

use civlink_core::error::{Error, Result};
use civlink_core::transport::Transport;
use civlink_core::types::Region;
use civlink_transport::SerialTransport;

use crate::io::{self, IoConfig};
use crate::models::IcomModel;
use crate::rig::IcomRig;

/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Fluent builder for [`IcomRig`].
///
/// All configuration has defaults derived from the [`IcomModel`], so the
/// simplest usage is:
///
/// ```ignore
/// let rig = IcomBuilder::new(id_5100())
///     .serial_port("/dev/ttyUSB0")
///     .build()
///     .await?;
/// ```
pub struct IcomBuilder {
    model: IcomModel,
    serial_port: Option<String>,
    baud_rate: Option<u32>,
    civ_address: Option<u8>,
    region: Region,
    command_timeout: Option<Duration>,
    max_retries: u32,
}

impl IcomBuilder {
    /// Create a new builder for the given model.
    pub fn new(model: IcomModel) -> Self {
        IcomBuilder {
            model,
            serial_port: None,
            baud_rate: None,
            civ_address: None,
            region: Region::default(),
            command_timeout: None,
            // The factory caps for this family specify no retries;
            // failures surface instead of being silently repeated.
            max_retries: 0,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the default baud rate for this model.
    ///
    /// Validated against the model's supported range at build time.
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = Some(baud);
        self
    }

    /// Override the default CI-V address for this model.
    ///
    /// Use this when the radio's CI-V address has been changed from the
    /// factory default in its menu settings.
    pub fn civ_address(mut self, addr: u8) -> Self {
        self.civ_address = Some(addr);
        self
    }

    /// Select the ITU region variant of the band plan (default: Region 2).
    pub fn region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Set the timeout for a single CI-V command/response exchange
    /// (default: the model's specified timeout, 1000 ms for this family).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Set extra attempts after a timeout or bus collision (default: 0).
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Build an [`IcomRig`] with a caller-provided transport.
    ///
    /// This is the primary entry point for testing (pass a
    /// `MockTransport` from `civlink-test-harness`) and for advanced use
    /// cases where the caller manages the transport lifecycle directly.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<IcomRig> {
        // A broken model table should fail loudly at connection time.
        self.model.validate()?;

        let civ_address = self.civ_address.unwrap_or(self.model.default_civ_address);
        let command_timeout = self.command_timeout.unwrap_or(self.model.default_timeout);

        let io = io::spawn_io(
            transport,
            IoConfig {
                civ_address,
                command_timeout,
                max_retries: self.max_retries,
            },
        );
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(IcomRig::new(
            io,
            self.model,
            self.region,
            civ_address,
            command_timeout,
            event_tx,
        ))
    }

    /// Build an [`IcomRig`] using a serial transport.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been
    /// called. The baud rate defaults to the model's default if not
    /// overridden.
    pub async fn build(self) -> Result<IcomRig> {
        let port = self
            .serial_port
            .clone()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;

        let baud = self.baud_rate.unwrap_or(self.model.default_baud_rate);
        if baud < self.model.baud_rate_min || baud > self.model.baud_rate_max {
            return Err(Error::InvalidParameter(format!(
                "baud rate {baud} outside {}-{} supported by the {}",
                self.model.baud_rate_min, self.model.baud_rate_max, self.model.name
            )));
        }

        let transport = SerialTransport::open(&port, baud).await?;
        self.build_with_transport(Box::new(transport)).await
    }
}
