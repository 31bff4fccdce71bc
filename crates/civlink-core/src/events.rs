//! Asynchronous rig event types.
//!
//! Events are emitted by the rig driver through a [`tokio::sync::broadcast`]
//! channel after a state change has been acknowledged by the radio.
//! Dashboards and logging frontends subscribe to these instead of polling.

use crate::types::{Mode, Passband, Vfo};

/// An event emitted by a rig driver when radio state changes.
///
/// Subscribe via [`crate::rig::Rig::subscribe()`]. Events are delivered
/// on a best-effort basis through a bounded broadcast channel; slow
/// consumers may miss events under load.
#[derive(Debug, Clone)]
pub enum RigEvent {
    /// A different VFO was selected.
    VfoChanged {
        /// The newly selected VFO.
        vfo: Vfo,
    },

    /// Dual watch was switched on or off.
    ///
    /// This fires both for explicit function calls and for the silent
    /// toggles performed while reconciling a VFO selection.
    DualWatchChanged {
        /// `true` if dual watch is now active.
        on: bool,
    },

    /// The operating mode of the selected band changed.
    ModeChanged {
        /// New operating mode.
        mode: Mode,
        /// Passband implied by the mode.
        width: Passband,
    },

    /// The frequency of the selected band changed.
    FrequencyChanged {
        /// New frequency in hertz.
        freq_hz: u64,
    },

    /// Push-to-talk state changed (TX/RX transition).
    PttChanged {
        /// `true` if transmitting, `false` if receiving.
        on: bool,
    },

    /// Split operation was engaged.
    SplitChanged {
        /// `true` if split is enabled.
        on: bool,
    },

    /// S-meter reading from the selected band.
    SmeterReading {
        /// Signal strength in dBm.
        dbm: f32,
    },
}
