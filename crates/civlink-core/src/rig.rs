//! The `Rig` trait -- unified interface for civlink rig drivers.
//!
//! This trait is the primary API surface of civlink. Frontends and
//! automation tools program against `dyn Rig` without needing to know
//! the CI-V details underneath.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::events::RigEvent;
use crate::types::*;

/// Unified asynchronous interface for controlling a transceiver.
///
/// All methods that communicate with the rig are `async` because the
/// underlying transport involves serial round-trips. Methods that return
/// cached state ([`info()`](Rig::info), [`capabilities()`](Rig::capabilities))
/// are synchronous.
///
/// # VFO addressing
///
/// Mode, level, function, and metering operations apply to the radio's
/// *currently selected* band; the `vfo` argument on those methods is
/// resolved for [`Vfo::Current`] and used for diagnostics, but does not
/// re-target the command. Call [`set_vfo()`](Rig::set_vfo) first to steer
/// a different band. This mirrors the radio's own addressing model, where
/// band selection is a distinct stateful operation with dual-watch side
/// effects.
#[async_trait]
pub trait Rig: Send + Sync {
    /// Return static information about the connected rig (manufacturer, model).
    fn info(&self) -> &RigInfo;

    /// Return the capabilities of the connected rig.
    fn capabilities(&self) -> &RigCapabilities;

    /// Return the VFO the session currently has selected.
    async fn current_vfo(&self) -> Result<Vfo>;

    /// Select a logical VFO.
    ///
    /// On dual-watch radios this reconciles the radio's dual-watch state
    /// with the addressing style of the request: selecting `A`/`B` turns
    /// dual watch off, selecting `Main`/`Sub` turns it on. The toggle, if
    /// needed, is issued before the selection; if it fails the selection
    /// is not attempted.
    async fn set_vfo(&self, vfo: Vfo) -> Result<()>;

    /// Configure split-frequency operation.
    ///
    /// `rx_vfo` is the receive slot, `tx_vfo` the transmit slot. Radios
    /// with a fixed split wiring reject pairings they cannot realize
    /// with [`Error::UnsupportedSplit`](crate::error::Error::UnsupportedSplit)
    /// before any transaction is attempted.
    async fn set_split_vfo(&self, rx_vfo: Vfo, split: bool, tx_vfo: Vfo) -> Result<()>;

    /// Get the frequency of the selected band in hertz.
    async fn get_frequency(&self, vfo: Vfo) -> Result<u64>;

    /// Set the frequency of the selected band in hertz.
    async fn set_frequency(&self, vfo: Vfo, freq_hz: u64) -> Result<()>;

    /// Get the operating mode and passband of the selected band.
    async fn get_mode(&self, vfo: Vfo) -> Result<(Mode, Passband)>;

    /// Set the operating mode of the selected band.
    ///
    /// `width` is accepted for contract symmetry with radios that tune
    /// the passband independently; on this family the width is implied
    /// by the mode and a mismatched request is ignored.
    async fn set_mode(&self, vfo: Vfo, mode: Mode, width: Option<Passband>) -> Result<()>;

    /// Read an on/off function.
    async fn get_function(&self, vfo: Vfo, func: Func) -> Result<bool>;

    /// Set an on/off function.
    async fn set_function(&self, vfo: Vfo, func: Func, on: bool) -> Result<()>;

    /// Read a level, normalized to `0.0..=1.0`.
    async fn get_level(&self, vfo: Vfo, level: Level) -> Result<f32>;

    /// Set a level, normalized to `0.0..=1.0`.
    async fn set_level(&self, vfo: Vfo, level: Level, value: f32) -> Result<()>;

    /// Read the S-meter of the selected band.
    ///
    /// Returns the signal strength in dBm, resolved through the model's
    /// calibration curve.
    async fn get_s_meter(&self, vfo: Vfo) -> Result<f32>;

    /// Get the current PTT (push-to-talk) state.
    ///
    /// Returns `true` if the rig is transmitting.
    async fn get_ptt(&self) -> Result<bool>;

    /// Set the PTT state.
    ///
    /// Passing `true` keys the transmitter; `false` returns to receive.
    async fn set_ptt(&self, on: bool) -> Result<()>;

    /// Set the repeater shift direction.
    async fn set_repeater_shift(&self, shift: RepeaterShift) -> Result<()> {
        let _ = shift;
        Err(crate::error::Error::Unsupported(
            "repeater shift not supported".into(),
        ))
    }

    /// Get the repeater shift direction.
    async fn get_repeater_shift(&self) -> Result<RepeaterShift> {
        Err(crate::error::Error::Unsupported(
            "repeater shift not supported".into(),
        ))
    }

    /// Set the repeater (CTCSS encode) tone, in tenths of hertz
    /// (e.g. `885` for 88.5 Hz).
    async fn set_repeater_tone(&self, tenth_hz: u16) -> Result<()> {
        let _ = tenth_hz;
        Err(crate::error::Error::Unsupported(
            "CTCSS tone not supported".into(),
        ))
    }

    /// Get the repeater (CTCSS encode) tone, in tenths of hertz.
    async fn get_repeater_tone(&self) -> Result<u16> {
        Err(crate::error::Error::Unsupported(
            "CTCSS tone not supported".into(),
        ))
    }

    /// Set the tone squelch (CTCSS decode) tone, in tenths of hertz.
    async fn set_tone_squelch(&self, tenth_hz: u16) -> Result<()> {
        let _ = tenth_hz;
        Err(crate::error::Error::Unsupported(
            "tone squelch not supported".into(),
        ))
    }

    /// Get the tone squelch (CTCSS decode) tone, in tenths of hertz.
    async fn get_tone_squelch(&self) -> Result<u16> {
        Err(crate::error::Error::Unsupported(
            "tone squelch not supported".into(),
        ))
    }

    /// Power the radio on or off.
    ///
    /// There is no getter: this radio family cannot report its power
    /// state over CI-V.
    async fn set_power_on(&self, on: bool) -> Result<()> {
        let _ = on;
        Err(crate::error::Error::Unsupported(
            "power control not supported".into(),
        ))
    }

    /// Obtain a broadcast receiver for rig state change events.
    fn subscribe(&self) -> Result<broadcast::Receiver<RigEvent>>;
}
