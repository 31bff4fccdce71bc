//! IO task: the CI-V transaction engine.
//!
//! A single spawned task owns the [`Transport`] and serializes all
//! command/acknowledgement exchanges to the half-duplex bus — one
//! transaction in flight per rig handle, ever. Rig methods talk to it
//! over an `mpsc` channel and get their reply through a `oneshot`.
//!
//! The engine handles echo skipping (the bus echoes our own frames),
//! NAK detection, collision recovery with bounded retry, per-command
//! timeouts, and draining of unsolicited traffic between commands.
//! Retry policy lives here and nowhere above.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use civlink_core::error::{Error, Result};
use civlink_core::transport::Transport;

use crate::civ::{self, CONTROLLER_ADDR, Decoded, Frame};

/// Configuration for the IO task.
pub(crate) struct IoConfig {
    /// CI-V address of the target radio (e.g. 0x8C for the ID-5100).
    pub civ_address: u8,
    /// Timeout for a single command/response exchange.
    pub command_timeout: Duration,
    /// Extra attempts after a timeout or bus collision. The factory
    /// default for this family is 0 — the control layer sees failures
    /// rather than silent repeats.
    pub max_retries: u32,
}

/// A request sent from rig methods to the IO task.
pub(crate) enum IoRequest {
    /// A CI-V command with an expected data response.
    Exchange {
        cmd_bytes: Vec<u8>,
        reply: oneshot::Sender<Result<Frame>>,
    },
    /// A SET command expecting a bare ACK.
    ExchangeAck {
        cmd_bytes: Vec<u8>,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Graceful shutdown; returns the transport for test recovery.
    Shutdown {
        reply: oneshot::Sender<Box<dyn Transport>>,
    },
}

/// Handle to the IO task. Stored inside the rig.
pub(crate) struct IoHandle {
    cmd_tx: mpsc::Sender<IoRequest>,
    /// Cancellation token for graceful shutdown.
    pub cancel: CancellationToken,
    /// Join handle for the IO task.
    pub task: JoinHandle<()>,
}

impl IoHandle {
    /// Send a CI-V command and await the data response.
    pub async fn exchange(&self, cmd: Vec<u8>, timeout: Duration) -> Result<Frame> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(IoRequest::Exchange {
                cmd_bytes: cmd,
                reply: reply_tx,
            })
            .await
            .map_err(|_| Error::NotConnected)?;

        // Safety-net timeout on top of the transport-level timeout the
        // IO task enforces internally.
        match tokio::time::timeout(timeout + Duration::from_millis(500), reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::NotConnected),
            Err(_) => Err(Error::Timeout),
        }
    }

    /// Send a SET command and await the ACK.
    pub async fn exchange_ack(&self, cmd: Vec<u8>, timeout: Duration) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(IoRequest::ExchangeAck {
                cmd_bytes: cmd,
                reply: reply_tx,
            })
            .await
            .map_err(|_| Error::NotConnected)?;

        match tokio::time::timeout(timeout + Duration::from_millis(500), reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::NotConnected),
            Err(_) => Err(Error::Timeout),
        }
    }

    /// Shut down the IO task and recover the transport.
    #[allow(dead_code)]
    pub async fn shutdown(self) -> Result<Box<dyn Transport>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let _ = self.cmd_tx.send(IoRequest::Shutdown { reply: reply_tx }).await;
        let transport = reply_rx.await.map_err(|_| Error::NotConnected)?;
        let _ = self.task.await;
        Ok(transport)
    }
}

/// Spawn the IO task. Returns the handle for sending commands.
pub(crate) fn spawn_io(transport: Box<dyn Transport>, config: IoConfig) -> IoHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel::<IoRequest>(32);
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    let task = tokio::spawn(io_loop(transport, config, cmd_rx, cancel_clone));

    IoHandle {
        cmd_tx,
        cancel,
        task,
    }
}

/// Maximum idle buffer size before reset to prevent unbounded growth.
const MAX_IDLE_BUF: usize = 4096;

/// The main IO loop. Runs as a spawned Tokio task.
async fn io_loop(
    mut transport: Box<dyn Transport>,
    config: IoConfig,
    mut cmd_rx: mpsc::Receiver<IoRequest>,
    cancel: CancellationToken,
) {
    let mut idle_buf = Vec::new();

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("IO task cancelled");
                break;
            }

            req = cmd_rx.recv() => {
                match req {
                    Some(IoRequest::Exchange { cmd_bytes, reply }) => {
                        let result = run_exchange(&mut *transport, &cmd_bytes, &config).await;
                        let _ = reply.send(result);
                    }
                    Some(IoRequest::ExchangeAck { cmd_bytes, reply }) => {
                        let result = run_exchange(&mut *transport, &cmd_bytes, &config)
                            .await
                            .and_then(|frame| {
                                if frame.is_ack() {
                                    Ok(())
                                } else {
                                    Err(Error::Protocol(format!(
                                        "expected ACK, got cmd 0x{:02X}",
                                        frame.cmd
                                    )))
                                }
                            });
                        let _ = reply.send(result);
                    }
                    Some(IoRequest::Shutdown { reply }) => {
                        debug!("IO task shutdown requested");
                        let _ = reply.send(transport);
                        return;
                    }
                    None => {
                        debug!("all command senders dropped, exiting IO task");
                        break;
                    }
                }
            }

            // Idle: drain unsolicited bytes so stale broadcasts never
            // corrupt the next exchange.
            _ = async {
                let mut buf = [0u8; 256];
                match transport.receive(&mut buf, Duration::from_millis(100)).await {
                    Ok(n) if n > 0 => {
                        idle_buf.extend_from_slice(&buf[..n]);
                        if idle_buf.len() > MAX_IDLE_BUF {
                            warn!(len = idle_buf.len(), "idle buffer overflow, resetting");
                            idle_buf.clear();
                            return;
                        }
                        drain_idle_frames(&mut idle_buf);
                    }
                    _ => {
                        // Timeout or error — yield briefly so the loop
                        // can check for commands or cancellation.
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            } => {}
        }
    }
}

/// Discard complete frames (and collision debris) from the idle buffer,
/// keeping any trailing partial frame for the next read.
fn drain_idle_frames(buf: &mut Vec<u8>) {
    loop {
        match civ::decode_frame(buf) {
            Decoded::Frame { frame, consumed } => {
                debug!(
                    src = format_args!("0x{:02X}", frame.src_addr),
                    cmd = format_args!("0x{:02X}", frame.cmd),
                    "draining unsolicited CI-V frame"
                );
                buf.drain(..consumed);
            }
            Decoded::Collision { consumed } => {
                buf.drain(..consumed);
            }
            Decoded::Incomplete => break,
        }
    }
}

/// Execute one CI-V command on the transport, handling echo, collision,
/// NAK, timeout, and the configured retry budget.
async fn run_exchange(
    transport: &mut dyn Transport,
    cmd: &[u8],
    config: &IoConfig,
) -> Result<Frame> {
    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            debug!(attempt, "CI-V command retry");
            tokio::time::sleep(Duration::from_millis(20 * attempt as u64)).await;
        }

        transport.send(cmd).await?;

        let mut pending = Vec::new();
        let mut buf = [0u8; 256];
        let mut collided = false;

        'read: loop {
            match transport.receive(&mut buf, config.command_timeout).await {
                Ok(n) => {
                    pending.extend_from_slice(&buf[..n]);

                    loop {
                        match civ::decode_frame(&pending) {
                            Decoded::Frame { frame, consumed } => {
                                pending.drain(..consumed);

                                // Skip the echo of our own command.
                                if frame.dst_addr == config.civ_address
                                    && frame.src_addr == CONTROLLER_ADDR
                                {
                                    debug!("skipping CI-V echo frame");
                                    continue;
                                }

                                // Actual response from the rig to us.
                                if frame.dst_addr == CONTROLLER_ADDR
                                    && frame.src_addr == config.civ_address
                                {
                                    if frame.is_nak() {
                                        return Err(Error::Protocol("rig returned NAK".into()));
                                    }
                                    return Ok(frame);
                                }

                                debug!(
                                    dst = frame.dst_addr,
                                    src = frame.src_addr,
                                    "skipping CI-V frame from unexpected address"
                                );
                            }
                            Decoded::Incomplete => break,
                            Decoded::Collision { consumed } => {
                                pending.drain(..consumed);
                                debug!("CI-V bus collision detected");
                                collided = true;
                                break 'read;
                            }
                        }
                    }
                }
                Err(Error::Timeout) => break 'read,
                Err(e) => return Err(e),
            }
        }

        if collided && attempt == config.max_retries {
            return Err(Error::Protocol("CI-V bus collision".into()));
        }
        // Fall through to the next attempt (timeout or collision).
    }

    Err(Error::Timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use civlink_test_harness::MockTransport;

    const ADDR: u8 = 0x8C;

    fn config() -> IoConfig {
        IoConfig {
            civ_address: ADDR,
            command_timeout: Duration::from_millis(50),
            max_retries: 0,
        }
    }

    /// Echo of our own command followed by the rig's response, as one
    /// receive burst — what a real half-duplex bus delivers.
    fn echo_and_response(cmd: &[u8], response: &[u8]) -> Vec<u8> {
        let mut combined = cmd.to_vec();
        combined.extend_from_slice(response);
        combined
    }

    fn ack_frame() -> Vec<u8> {
        civ::encode_frame(CONTROLLER_ADDR, ADDR, civ::ACK, None, &[])
    }

    fn nak_frame() -> Vec<u8> {
        civ::encode_frame(CONTROLLER_ADDR, ADDR, civ::NAK, None, &[])
    }

    #[tokio::test]
    async fn exchange_skips_echo_and_returns_response() {
        let mut mock = MockTransport::new();
        let cmd = civ::encode_frame(ADDR, CONTROLLER_ADDR, 0x03, None, &[]);
        let response = civ::encode_frame(
            CONTROLLER_ADDR,
            ADDR,
            0x03,
            None,
            &[0x00, 0x00, 0x45, 0x45, 0x01],
        );
        mock.expect(&cmd, &echo_and_response(&cmd, &response));

        let frame = run_exchange(&mut mock, &cmd, &config()).await.unwrap();
        assert_eq!(frame.cmd, 0x03);
        assert_eq!(frame.body, vec![0x00, 0x00, 0x45, 0x45, 0x01]);
    }

    #[tokio::test]
    async fn exchange_nak_is_protocol_error() {
        let mut mock = MockTransport::new();
        let cmd = civ::encode_frame(ADDR, CONTROLLER_ADDR, 0x07, Some(0xD0), &[]);
        mock.expect(&cmd, &echo_and_response(&cmd, &nak_frame()));

        let err = run_exchange(&mut mock, &cmd, &config()).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(msg) if msg.contains("NAK")));
    }

    #[tokio::test]
    async fn exchange_times_out_without_response() {
        let mut mock = MockTransport::new();
        let cmd = civ::encode_frame(ADDR, CONTROLLER_ADDR, 0x03, None, &[]);
        // Echo only, no response from the rig.
        mock.expect(&cmd, &cmd);

        let err = run_exchange(&mut mock, &cmd, &config()).await.unwrap_err();
        assert!(matches!(err, Error::Timeout));
    }

    #[tokio::test]
    async fn exchange_retries_after_timeout() {
        let mut mock = MockTransport::new();
        let cmd = civ::encode_frame(ADDR, CONTROLLER_ADDR, 0x03, None, &[]);
        let response = civ::encode_frame(
            CONTROLLER_ADDR,
            ADDR,
            0x03,
            None,
            &[0x00, 0x00, 0x45, 0x45, 0x01],
        );
        // First attempt: silence. Second attempt: answered.
        mock.expect(&cmd, &[]);
        mock.expect(&cmd, &echo_and_response(&cmd, &response));

        let cfg = IoConfig {
            max_retries: 1,
            ..config()
        };
        let frame = run_exchange(&mut mock, &cmd, &cfg).await.unwrap();
        assert_eq!(frame.cmd, 0x03);
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn exchange_collision_without_retry_budget_fails() {
        let mut mock = MockTransport::new();
        let cmd = civ::encode_frame(ADDR, CONTROLLER_ADDR, 0x03, None, &[]);
        // Collision debris instead of a clean echo.
        mock.expect(&cmd, &[0xFE, 0xFE, 0xE0, 0x8C, 0xFC, 0xFD]);

        let err = run_exchange(&mut mock, &cmd, &config()).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(msg) if msg.contains("collision")));
    }

    #[tokio::test]
    async fn exchange_recovers_from_collision_with_retry() {
        let mut mock = MockTransport::new();
        let cmd = civ::encode_frame(ADDR, CONTROLLER_ADDR, 0x03, None, &[]);
        let response = civ::encode_frame(
            CONTROLLER_ADDR,
            ADDR,
            0x03,
            None,
            &[0x00, 0x00, 0x45, 0x45, 0x01],
        );
        mock.expect(&cmd, &[0xFE, 0xFE, 0xE0, 0x8C, 0xFC, 0xFD]);
        mock.expect(&cmd, &echo_and_response(&cmd, &response));

        let cfg = IoConfig {
            max_retries: 1,
            ..config()
        };
        let frame = run_exchange(&mut mock, &cmd, &cfg).await.unwrap();
        assert_eq!(frame.cmd, 0x03);
    }

    #[tokio::test]
    async fn exchange_skips_unrelated_traffic() {
        let mut mock = MockTransport::new();
        let cmd = civ::encode_frame(ADDR, CONTROLLER_ADDR, 0x03, None, &[]);
        // A broadcast from another device on the bus arrives between the
        // echo and our response.
        let other = civ::encode_frame(0x00, 0x94, 0x00, None, &[0x00, 0x00, 0x00, 0x45, 0x01]);
        let response = civ::encode_frame(
            CONTROLLER_ADDR,
            ADDR,
            0x03,
            None,
            &[0x00, 0x00, 0x45, 0x45, 0x01],
        );
        let mut bytes = echo_and_response(&cmd, &other);
        bytes.extend_from_slice(&response);
        mock.expect(&cmd, &bytes);

        let frame = run_exchange(&mut mock, &cmd, &config()).await.unwrap();
        assert_eq!(frame.body, vec![0x00, 0x00, 0x45, 0x45, 0x01]);
    }

    #[tokio::test]
    async fn ack_exchange_through_io_task() {
        let mut mock = MockTransport::new();
        let cmd = civ::encode_frame(ADDR, CONTROLLER_ADDR, 0x07, Some(0xD0), &[]);
        mock.expect(&cmd, &echo_and_response(&cmd, &ack_frame()));

        let io = spawn_io(Box::new(mock), config());
        io.exchange_ack(cmd, Duration::from_millis(50))
            .await
            .unwrap();
        io.cancel.cancel();
    }

    #[tokio::test]
    async fn ack_exchange_rejects_data_response() {
        let mut mock = MockTransport::new();
        let cmd = civ::encode_frame(ADDR, CONTROLLER_ADDR, 0x07, Some(0xD0), &[]);
        let data = civ::encode_frame(CONTROLLER_ADDR, ADDR, 0x03, None, &[0x00; 5]);
        mock.expect(&cmd, &echo_and_response(&cmd, &data));

        let io = spawn_io(Box::new(mock), config());
        let err = io
            .exchange_ack(cmd, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(msg) if msg.contains("expected ACK")));
        io.cancel.cancel();
    }

    #[tokio::test]
    async fn shutdown_returns_transport() {
        let mock = MockTransport::new();
        let io = spawn_io(Box::new(mock), config());
        let transport = io.shutdown().await.unwrap();
        assert!(transport.is_connected());
    }

    #[test]
    fn drain_discards_complete_frames_keeps_partial() {
        let mut buf = civ::encode_frame(0x00, 0x8C, 0x00, None, &[0x00; 5]);
        buf.extend_from_slice(&[0xFE, 0xFE, 0xE0]);
        drain_idle_frames(&mut buf);
        assert_eq!(buf, vec![0xFE, 0xFE, 0xE0]);
    }
}
