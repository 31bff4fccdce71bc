//! IcomRig -- the [`Rig`] trait implementation for dual-watch mobiles.
//!
//! This module ties the CI-V engine ([`crate::civ`], [`crate::commands`],
//! [`crate::io`]) to a [`Transport`](civlink_core::Transport) to produce a
//! working driver for the ID-5100 family.
//!
//! The interesting part is band addressing. The radio has two receive
//! paths, Main and Sub, and a dual-watch feature that monitors both at
//! once. Clients may address it either as a conventional VFO A/B radio or
//! as a Main/Sub radio, and the firmware only accepts the addressing
//! style matching its current dual-watch state. [`IcomRig::set_vfo`]
//! therefore reconciles dual watch as an explicit first step of every
//! selection, holding the session state locked across both transactions
//! so nothing can interleave between them.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, warn};

use civlink_core::error::{Error, Result};
use civlink_core::events::RigEvent;
use civlink_core::rig::Rig;
use civlink_core::types::*;

use crate::civ;
use crate::commands::{self, BandSelect};
use crate::io::IoHandle;
use crate::mode::native_passband;
use crate::models::IcomModel;

/// Number of wake-up preamble bytes sent ahead of a power-on command.
///
/// A powered-down radio needs a burst of `0xFE` on the bus before its
/// CI-V receiver clocks in the frame that follows.
const POWER_ON_WAKE_LEN: usize = 16;

/// Mutable session state of the receiver paths.
///
/// Owned by the rig handle, never shared across connections, and only
/// mutated after the corresponding transaction has been acknowledged —
/// the in-memory picture never runs ahead of the radio.
#[derive(Debug, Clone, Copy)]
struct ReceiverPath {
    /// Whether dual watch is currently engaged on the radio.
    dual_watch: bool,
    /// Whether the extended frequency command (0x25) has been found
    /// unusable. On this family it misbehaves in both addressing styles,
    /// so the flag is raised on every band selection and never cleared.
    x25_cmd_fails: bool,
    /// The VFO the session currently has selected.
    current_vfo: Vfo,
}

impl ReceiverPath {
    fn new() -> Self {
        ReceiverPath {
            dual_watch: false,
            x25_cmd_fails: false,
            current_vfo: Vfo::A,
        }
    }
}

/// A connected dual-watch mobile controlled over CI-V.
///
/// Constructed via [`IcomBuilder`](crate::builder::IcomBuilder). All rig
/// communication goes through the IO task, which owns the
/// [`Transport`](civlink_core::Transport) provided at build time.
pub struct IcomRig {
    io: IoHandle,
    model: IcomModel,
    civ_address: u8,
    command_timeout: Duration,
    info: RigInfo,
    capabilities: RigCapabilities,
    event_tx: broadcast::Sender<RigEvent>,
    /// Receiver path state, locked across multi-transaction operations.
    path: Mutex<ReceiverPath>,
}

impl std::fmt::Debug for IcomRig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IcomRig")
            .field("model", &self.model)
            .field("civ_address", &self.civ_address)
            .field("command_timeout", &self.command_timeout)
            .field("info", &self.info)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl Drop for IcomRig {
    fn drop(&mut self) {
        // Graceful: signal the IO loop to exit at the next select iteration.
        self.io.cancel.cancel();
        // Safety net: abort the task in case it's stuck in a transport
        // read that doesn't respect the cancellation token.
        self.io.task.abort();
    }
}

impl IcomRig {
    /// Create a new `IcomRig` from its constituent parts.
    ///
    /// This is called by [`IcomBuilder`](crate::builder::IcomBuilder);
    /// callers should use the builder API instead.
    pub(crate) fn new(
        io: IoHandle,
        model: IcomModel,
        region: Region,
        civ_address: u8,
        command_timeout: Duration,
        event_tx: broadcast::Sender<RigEvent>,
    ) -> Self {
        let info = RigInfo {
            manufacturer: "Icom",
            model_name: model.name.to_string(),
            model_id: model.model_id.to_string(),
        };
        let capabilities = model.capabilities(region);
        IcomRig {
            io,
            model,
            civ_address,
            command_timeout,
            info,
            capabilities,
            event_tx,
            path: Mutex::new(ReceiverPath::new()),
        }
    }

    /// Resolve [`Vfo::Current`] against the session's active VFO.
    async fn resolve_vfo(&self, vfo: Vfo) -> Vfo {
        if vfo == Vfo::Current {
            self.path.lock().await.current_vfo
        } else {
            vfo
        }
    }

    /// Issue the dual-watch toggle and commit the session state.
    ///
    /// The caller holds the path lock; `dual_watch` is updated only
    /// after the radio has acknowledged the toggle.
    async fn set_dual_watch_locked(&self, path: &mut ReceiverPath, on: bool) -> Result<()> {
        let cmd = commands::cmd_set_dual_watch(self.civ_address, on);
        debug!(on, "toggling dual watch");
        self.io.exchange_ack(cmd, self.command_timeout).await?;
        path.dual_watch = on;
        let _ = self.event_tx.send(RigEvent::DualWatchChanged { on });
        Ok(())
    }
}

#[async_trait]
impl Rig for IcomRig {
    fn info(&self) -> &RigInfo {
        &self.info
    }

    fn capabilities(&self) -> &RigCapabilities {
        &self.capabilities
    }

    async fn current_vfo(&self) -> Result<Vfo> {
        Ok(self.path.lock().await.current_vfo)
    }

    async fn set_vfo(&self, vfo: Vfo) -> Result<()> {
        // The lock is held across the toggle and the select: the select's
        // meaning depends on the toggle having taken effect, so no other
        // transaction may land between them.
        let mut path = self.path.lock().await;

        let resolved = if vfo == Vfo::Current {
            path.current_vfo
        } else {
            vfo
        };

        // Requesting A/B means conventional addressing, Main/Sub means
        // dual-path addressing; dual watch must match before the select
        // is meaningful to the firmware.
        let want_dual = resolved.is_dual_path();

        // The extended frequency command misbehaves in both addressing
        // styles on this family. Flag it unusable on every selection so
        // the frequency paths stay on the classic commands.
        path.x25_cmd_fails = true;

        if want_dual != path.dual_watch {
            if let Err(e) = self.set_dual_watch_locked(&mut path, want_dual).await {
                warn!(error = %e, "dual watch toggle failed; band selection not attempted");
                return Err(e);
            }
        }

        let band = match resolved {
            Vfo::B | Vfo::Sub => BandSelect::Sub,
            _ => BandSelect::Main,
        };
        let cmd = commands::cmd_select_band(self.civ_address, band);
        debug!(vfo = %resolved, band = ?band, "selecting band");
        self.io.exchange_ack(cmd, self.command_timeout).await?;

        path.current_vfo = resolved;
        let _ = self.event_tx.send(RigEvent::VfoChanged { vfo: resolved });
        Ok(())
    }

    async fn set_split_vfo(&self, rx_vfo: Vfo, split: bool, tx_vfo: Vfo) -> Result<()> {
        debug!(rx = %rx_vfo, tx = %tx_vfo, split, "split request");

        // Hardware wiring: transmit on Main, receive on Sub. Nothing else
        // is realizable, so reject other pairings before any transaction.
        if !matches!(tx_vfo, Vfo::A | Vfo::Main) {
            return Err(Error::UnsupportedSplit { tx_vfo, rx_vfo });
        }

        if !split {
            // The radio cannot drop split independently over CI-V; the
            // flag is accepted for contract symmetry only.
            debug!("split disable not supported on this radio; forcing receive to Sub anyway");
        }

        // Transmit implicitly stays on Main; put the receive path on Sub.
        self.set_vfo(Vfo::Sub).await?;

        if split {
            let _ = self.event_tx.send(RigEvent::SplitChanged { on: true });
        }
        Ok(())
    }

    async fn get_frequency(&self, vfo: Vfo) -> Result<u64> {
        let vfo = self.resolve_vfo(vfo).await;
        debug!(vfo = %vfo, "reading frequency");

        let x25_unusable = self.path.lock().await.x25_cmd_fails;
        if !x25_unusable {
            let cmd = commands::cmd_read_selected_frequency(self.civ_address);
            match self.io.exchange(cmd, self.command_timeout).await {
                Ok(frame) => {
                    let freq = commands::parse_frequency_body(&frame.body)?;
                    let _ = self.event_tx.send(RigEvent::FrequencyChanged { freq_hz: freq });
                    return Ok(freq);
                }
                Err(Error::Protocol(_)) | Err(Error::Timeout) => {
                    debug!("extended frequency read rejected; falling back to classic command");
                    self.path.lock().await.x25_cmd_fails = true;
                }
                Err(e) => return Err(e),
            }
        }

        let cmd = commands::cmd_read_frequency(self.civ_address);
        let frame = self.io.exchange(cmd, self.command_timeout).await?;
        let freq = commands::parse_frequency_body(&frame.body)?;
        let _ = self.event_tx.send(RigEvent::FrequencyChanged { freq_hz: freq });
        Ok(freq)
    }

    async fn set_frequency(&self, vfo: Vfo, freq_hz: u64) -> Result<()> {
        let vfo = self.resolve_vfo(vfo).await;
        debug!(vfo = %vfo, freq_hz, "setting frequency");

        let x25_unusable = self.path.lock().await.x25_cmd_fails;
        if !x25_unusable {
            let cmd = commands::cmd_set_selected_frequency(self.civ_address, freq_hz);
            match self.io.exchange_ack(cmd, self.command_timeout).await {
                Ok(()) => {
                    let _ = self.event_tx.send(RigEvent::FrequencyChanged { freq_hz });
                    return Ok(());
                }
                Err(Error::Protocol(_)) | Err(Error::Timeout) => {
                    debug!("extended frequency write rejected; falling back to classic command");
                    self.path.lock().await.x25_cmd_fails = true;
                }
                Err(e) => return Err(e),
            }
        }

        let cmd = commands::cmd_set_frequency(self.civ_address, freq_hz);
        self.io.exchange_ack(cmd, self.command_timeout).await?;
        let _ = self.event_tx.send(RigEvent::FrequencyChanged { freq_hz });
        Ok(())
    }

    async fn get_mode(&self, vfo: Vfo) -> Result<(Mode, Passband)> {
        let vfo = self.resolve_vfo(vfo).await;
        debug!(vfo = %vfo, "reading mode");
        let cmd = commands::cmd_read_mode(self.civ_address);
        let frame = self.io.exchange(cmd, self.command_timeout).await?;
        let (mode, width) = commands::parse_mode_body(&frame.body)?;
        let _ = self.event_tx.send(RigEvent::ModeChanged { mode, width });
        Ok((mode, width))
    }

    async fn set_mode(&self, vfo: Vfo, mode: Mode, width: Option<Passband>) -> Result<()> {
        let vfo = self.resolve_vfo(vfo).await;

        if !self.capabilities.supported_modes.contains(&mode) {
            return Err(Error::InvalidParameter(format!(
                "{} does not support mode {mode}",
                self.model.name
            )));
        }

        let native = native_passband(mode);
        if let Some(requested) = width {
            if requested != native {
                // Width is implied by the mode on this family.
                debug!(
                    requested = %requested,
                    native = %native,
                    "ignoring requested width; passband is fixed by mode"
                );
            }
        }

        debug!(vfo = %vfo, %mode, "setting mode");
        let cmd = commands::cmd_set_mode(self.civ_address, mode);
        self.io.exchange_ack(cmd, self.command_timeout).await?;
        let _ = self.event_tx.send(RigEvent::ModeChanged {
            mode,
            width: native,
        });
        Ok(())
    }

    async fn get_function(&self, vfo: Vfo, func: Func) -> Result<bool> {
        let vfo = self.resolve_vfo(vfo).await;
        if !self.capabilities.functions.contains(&func) {
            return Err(Error::Unsupported(format!(
                "{} does not expose {func} over CI-V",
                self.model.name
            )));
        }

        debug!(vfo = %vfo, %func, "reading function");
        let cmd = commands::cmd_read_function(self.civ_address, func);
        let frame = self.io.exchange(cmd, self.command_timeout).await?;
        let on = commands::parse_function_body(func, &frame.body)?;

        if func == Func::DualWatch {
            // Reconcile the session picture with the radio's answer.
            self.path.lock().await.dual_watch = on;
        }
        Ok(on)
    }

    async fn set_function(&self, vfo: Vfo, func: Func, on: bool) -> Result<()> {
        let vfo = self.resolve_vfo(vfo).await;
        if !self.capabilities.functions.contains(&func) {
            return Err(Error::Unsupported(format!(
                "{} does not expose {func} over CI-V",
                self.model.name
            )));
        }

        debug!(vfo = %vfo, %func, on, "setting function");
        if func == Func::DualWatch {
            let mut path = self.path.lock().await;
            return self.set_dual_watch_locked(&mut path, on).await;
        }

        let cmd = commands::cmd_set_function(self.civ_address, func, on);
        self.io.exchange_ack(cmd, self.command_timeout).await
    }

    async fn get_level(&self, vfo: Vfo, level: Level) -> Result<f32> {
        let vfo = self.resolve_vfo(vfo).await;
        if !self.capabilities.levels.contains(&level) {
            return Err(Error::Unsupported(format!(
                "{} does not expose {level} over CI-V",
                self.model.name
            )));
        }

        debug!(vfo = %vfo, %level, "reading level");
        let cmd = commands::cmd_read_level(self.civ_address, level);
        let frame = self.io.exchange(cmd, self.command_timeout).await?;
        let raw = commands::parse_level_body(level, &frame.body)?;
        Ok(f32::from(raw.min(255)) / 255.0)
    }

    async fn set_level(&self, vfo: Vfo, level: Level, value: f32) -> Result<()> {
        let vfo = self.resolve_vfo(vfo).await;
        if !self.capabilities.levels.contains(&level) {
            return Err(Error::Unsupported(format!(
                "{} does not expose {level} over CI-V",
                self.model.name
            )));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(Error::InvalidParameter(format!(
                "level value {value} out of range 0.0-1.0"
            )));
        }

        let raw = (value * 255.0).round() as u16;
        debug!(vfo = %vfo, %level, raw, "setting level");
        let cmd = commands::cmd_set_level(self.civ_address, level, raw);
        self.io.exchange_ack(cmd, self.command_timeout).await
    }

    async fn get_s_meter(&self, vfo: Vfo) -> Result<f32> {
        let vfo = self.resolve_vfo(vfo).await;
        debug!(vfo = %vfo, "reading S-meter");
        let cmd = commands::cmd_read_s_meter(self.civ_address);
        let frame = self.io.exchange(cmd, self.command_timeout).await?;
        let raw = commands::parse_s_meter_body(&frame.body)?;
        let raw = raw.min(255) as u8;
        // S9 = -73 dBm; the calibration curve yields dB relative to S9.
        let dbm = -73.0 + self.capabilities.meter_cal.db_rel_s9(raw);
        let _ = self.event_tx.send(RigEvent::SmeterReading { dbm });
        Ok(dbm)
    }

    async fn get_ptt(&self) -> Result<bool> {
        debug!("reading PTT state");
        let cmd = commands::cmd_read_ptt(self.civ_address);
        let frame = self.io.exchange(cmd, self.command_timeout).await?;
        commands::parse_ptt_body(&frame.body)
    }

    async fn set_ptt(&self, on: bool) -> Result<()> {
        debug!(on, "setting PTT");
        let cmd = commands::cmd_set_ptt(self.civ_address, on);
        self.io.exchange_ack(cmd, self.command_timeout).await?;
        let _ = self.event_tx.send(RigEvent::PttChanged { on });
        Ok(())
    }

    async fn set_repeater_shift(&self, shift: RepeaterShift) -> Result<()> {
        debug!(%shift, "setting repeater shift");
        let cmd = commands::cmd_set_repeater_shift(self.civ_address, shift);
        self.io.exchange_ack(cmd, self.command_timeout).await
    }

    async fn get_repeater_shift(&self) -> Result<RepeaterShift> {
        debug!("reading repeater shift");
        let cmd = commands::cmd_read_repeater_shift(self.civ_address);
        let frame = self.io.exchange(cmd, self.command_timeout).await?;
        commands::parse_repeater_shift_body(&frame.body)
    }

    async fn set_repeater_tone(&self, tenth_hz: u16) -> Result<()> {
        debug!(tenth_hz, "setting repeater tone");
        let cmd = commands::cmd_set_repeater_tone(self.civ_address, tenth_hz);
        self.io.exchange_ack(cmd, self.command_timeout).await
    }

    async fn get_repeater_tone(&self) -> Result<u16> {
        debug!("reading repeater tone");
        let cmd = commands::cmd_read_repeater_tone(self.civ_address);
        let frame = self.io.exchange(cmd, self.command_timeout).await?;
        commands::parse_tone_body(&frame.body, false)
    }

    async fn set_tone_squelch(&self, tenth_hz: u16) -> Result<()> {
        debug!(tenth_hz, "setting tone squelch");
        let cmd = commands::cmd_set_tone_squelch(self.civ_address, tenth_hz);
        self.io.exchange_ack(cmd, self.command_timeout).await
    }

    async fn get_tone_squelch(&self) -> Result<u16> {
        debug!("reading tone squelch");
        let cmd = commands::cmd_read_tone_squelch(self.civ_address);
        let frame = self.io.exchange(cmd, self.command_timeout).await?;
        commands::parse_tone_body(&frame.body, true)
    }

    async fn set_power_on(&self, on: bool) -> Result<()> {
        debug!(on, "setting power state");
        let frame = commands::cmd_set_power(self.civ_address, on);
        let cmd = if on {
            // Preamble burst wakes the sleeping CI-V receiver.
            let mut bytes = vec![civ::PREAMBLE; POWER_ON_WAKE_LEN];
            bytes.extend_from_slice(&frame);
            bytes
        } else {
            frame
        };
        self.io.exchange_ack(cmd, self.command_timeout).await
    }

    fn subscribe(&self) -> Result<broadcast::Receiver<RigEvent>> {
        Ok(self.event_tx.subscribe())
    }
}
