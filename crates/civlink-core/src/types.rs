//! Core types used throughout civlink.
//!
//! These types provide a protocol-agnostic vocabulary for controlling
//! dual-watch mobile transceivers: operating modes, logical VFOs,
//! functions, levels, and the static capability tables that describe a
//! specific radio model.

use std::fmt;
use std::str::FromStr;

/// Operating mode of the transceiver.
///
/// Dual-watch D-STAR mobiles carry the analog AM/FM families (each in a
/// wide and a narrow variant) plus digital voice. The narrow variants are
/// distinct modes on the wire, not a separate width setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Amplitude modulation, wide (12 kHz) — airband receive.
    Am,
    /// Amplitude modulation, narrow (6 kHz).
    AmNarrow,
    /// Frequency modulation, wide (10 kHz).
    Fm,
    /// Frequency modulation, narrow (5 kHz).
    FmNarrow,
    /// D-STAR digital voice (GMSK, 6 kHz).
    DigitalVoice,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Am => "AM",
            Mode::AmNarrow => "AM-N",
            Mode::Fm => "FM",
            Mode::FmNarrow => "FM-N",
            Mode::DigitalVoice => "DV",
        };
        write!(f, "{s}")
    }
}

/// Error returned when a string cannot be parsed into a [`Mode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseModeError(String);

impl fmt::Display for ParseModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown mode: {}", self.0)
    }
}

impl std::error::Error for ParseModeError {}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AM" => Ok(Mode::Am),
            "AM-N" | "AMN" => Ok(Mode::AmNarrow),
            "FM" => Ok(Mode::Fm),
            "FM-N" | "FMN" => Ok(Mode::FmNarrow),
            "DV" | "DSTAR" | "D-STAR" => Ok(Mode::DigitalVoice),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// A logical VFO as seen by the control layer.
///
/// Dual-watch radios expose two independent receive paths ("Main" and
/// "Sub"). When dual watch is off they behave like a conventional VFO A/B
/// pair. Both addressing styles are accepted; the driver reconciles them
/// against the radio's dual-watch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vfo {
    /// Conventional VFO A (maps to the Main band).
    A,
    /// Conventional VFO B (maps to the Sub band).
    B,
    /// Main band of a dual-watch radio.
    Main,
    /// Sub band of a dual-watch radio.
    Sub,
    /// Whatever VFO the session currently has selected.
    Current,
}

impl Vfo {
    /// Whether this VFO uses dual-path (Main/Sub) addressing.
    ///
    /// [`Vfo::Current`] must be resolved before calling this.
    pub fn is_dual_path(&self) -> bool {
        matches!(self, Vfo::Main | Vfo::Sub)
    }
}

impl fmt::Display for Vfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Vfo::A => "VFO-A",
            Vfo::B => "VFO-B",
            Vfo::Main => "Main",
            Vfo::Sub => "Sub",
            Vfo::Current => "Current",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Vfo {
    type Err = ParseModeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "A" | "VFO-A" | "VFOA" => Ok(Vfo::A),
            "B" | "VFO-B" | "VFOB" => Ok(Vfo::B),
            "MAIN" => Ok(Vfo::Main),
            "SUB" => Ok(Vfo::Sub),
            "CURRENT" | "CURR" => Ok(Vfo::Current),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// Receiver passband (filter width) in hertz.
///
/// On this radio family the passband is implied by the mode (12 kHz for
/// AM, 5 kHz for FM-N, and so on) rather than independently tunable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Passband(u32);

impl Passband {
    /// Create a new passband width from a value in hertz.
    pub fn from_hz(hz: u32) -> Self {
        Passband(hz)
    }

    /// Return the passband width in hertz.
    pub fn hz(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Passband {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

/// An on/off function the radio exposes through its function get/set
/// command family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Func {
    /// Dual watch — simultaneous monitoring of the Main and Sub bands.
    DualWatch,
    /// Repeater tone (CTCSS encode on transmit).
    Tone,
    /// Tone squelch (CTCSS decode on receive).
    ToneSquelch,
    /// Voice-operated transmit.
    Vox,
}

impl fmt::Display for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Func::DualWatch => "DUAL-WATCH",
            Func::Tone => "TONE",
            Func::ToneSquelch => "TSQL",
            Func::Vox => "VOX",
        };
        write!(f, "{s}")
    }
}

/// A continuously adjustable level, normalized to `0.0..=1.0` at the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// AF (audio) gain.
    AfGain,
    /// Squelch threshold.
    Squelch,
    /// Transmit power setting.
    RfPower,
    /// Microphone gain.
    MicGain,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::AfGain => "AF",
            Level::Squelch => "SQL",
            Level::RfPower => "RFPOWER",
            Level::MicGain => "MICGAIN",
        };
        write!(f, "{s}")
    }
}

/// Repeater shift direction for duplex operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeaterShift {
    /// Simplex (no shift).
    Simplex,
    /// Negative offset (transmit below receive).
    Minus,
    /// Positive offset (transmit above receive).
    Plus,
}

impl fmt::Display for RepeaterShift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RepeaterShift::Simplex => "SIMPLEX",
            RepeaterShift::Minus => "DUP-",
            RepeaterShift::Plus => "DUP+",
        };
        write!(f, "{s}")
    }
}

/// ITU region variant of a model's band plan.
///
/// Mobile radios ship with region-specific TX coverage (144–146 MHz in
/// Region 1 versus 144–148 MHz in Region 2) while RX coverage is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Region {
    /// ITU Region 1 (Europe, Africa).
    Region1,
    /// ITU Region 2 (Americas). Default for factory-fresh US models.
    #[default]
    Region2,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Region1 => write!(f, "Region 1"),
            Region::Region2 => write!(f, "Region 2"),
        }
    }
}

/// A contiguous frequency range with the modes legal inside it.
///
/// Used in [`RigCapabilities`] for both receive and transmit coverage.
/// Transmit ranges additionally carry the radio's power bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct FreqRange {
    /// Lower bound of the range in hertz (inclusive).
    pub low_hz: u64,
    /// Upper bound of the range in hertz (inclusive).
    pub high_hz: u64,
    /// Modes legal within this range. Never empty for a valid profile.
    pub modes: Vec<Mode>,
    /// Minimum transmit power in watts (`None` for receive-only ranges).
    pub min_power_watts: Option<f32>,
    /// Maximum transmit power in watts (`None` for receive-only ranges).
    pub max_power_watts: Option<f32>,
}

impl FreqRange {
    /// A receive-only range.
    pub fn rx(low_hz: u64, high_hz: u64, modes: Vec<Mode>) -> Self {
        FreqRange {
            low_hz,
            high_hz,
            modes,
            min_power_watts: None,
            max_power_watts: None,
        }
    }

    /// A transmit range with power bounds in watts.
    pub fn tx(low_hz: u64, high_hz: u64, modes: Vec<Mode>, min_w: f32, max_w: f32) -> Self {
        FreqRange {
            low_hz,
            high_hz,
            modes,
            min_power_watts: Some(min_w),
            max_power_watts: Some(max_w),
        }
    }

    /// Check whether a frequency (in hertz) falls within this range (inclusive).
    pub fn contains(&self, freq_hz: u64) -> bool {
        freq_hz >= self.low_hz && freq_hz <= self.high_hz
    }
}

impl fmt::Display for FreqRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} Hz", self.low_hz, self.high_hz)
    }
}

/// S-meter calibration curve.
///
/// Maps the raw meter value (0–255 as reported on the wire) to decibels
/// relative to S9. Readings between points are interpolated linearly;
/// readings outside the table are clamped to the end points.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterCal {
    /// `(raw, dB relative to S9)` pairs, sorted ascending by raw value.
    pub points: Vec<(u8, i32)>,
}

impl MeterCal {
    /// The placeholder curve used when a model has no published
    /// calibration: raw 0 maps to −60 dB and raw 255 to +60 dB.
    pub fn uncalibrated() -> Self {
        MeterCal {
            points: vec![(0, -60), (255, 60)],
        }
    }

    /// Convert a raw meter value to dB relative to S9.
    pub fn db_rel_s9(&self, raw: u8) -> f32 {
        match self.points.as_slice() {
            [] => 0.0,
            [only] => only.1 as f32,
            points => {
                if raw <= points[0].0 {
                    return points[0].1 as f32;
                }
                for pair in points.windows(2) {
                    let (lo_raw, lo_db) = pair[0];
                    let (hi_raw, hi_db) = pair[1];
                    if raw <= hi_raw {
                        let span = (hi_raw - lo_raw) as f32;
                        let frac = (raw - lo_raw) as f32 / span;
                        return lo_db as f32 + frac * (hi_db - lo_db) as f32;
                    }
                }
                points[points.len() - 1].1 as f32
            }
        }
    }
}

/// Static information about a connected rig.
///
/// Returned by [`crate::rig::Rig::info()`] to identify the specific
/// radio model in use.
#[derive(Debug, Clone)]
pub struct RigInfo {
    /// The manufacturer of the rig.
    pub manufacturer: &'static str,
    /// Human-readable model name (e.g. "ID-5100").
    pub model_name: String,
    /// Machine-readable model identifier — the default CI-V address in
    /// hex (e.g. "0x8C" for the ID-5100).
    pub model_id: String,
}

/// Capabilities and limits of a specific rig model.
///
/// Built from the model descriptor at connection time (with the band plan
/// resolved for the configured [`Region`]) so callers can adapt to the
/// specific radio without protocol knowledge.
#[derive(Debug, Clone)]
pub struct RigCapabilities {
    /// The set of operating modes the radio supports.
    pub supported_modes: Vec<Mode>,
    /// Receive coverage with per-range mode legality.
    pub rx_ranges: Vec<FreqRange>,
    /// Transmit coverage with per-range mode legality and power bounds.
    pub tx_ranges: Vec<FreqRange>,
    /// On/off functions the radio exposes over CI-V.
    pub functions: Vec<Func>,
    /// Adjustable levels the radio exposes over CI-V.
    pub levels: Vec<Level>,
    /// Whether the radio can monitor Main and Sub simultaneously.
    pub has_dual_watch: bool,
    /// Whether split (TX on Main, RX on Sub) operation is available.
    pub has_split: bool,
    /// Maximum transmit power in watts across all TX ranges.
    pub max_power_watts: f32,
    /// S-meter calibration curve.
    pub meter_cal: MeterCal,
}

impl Default for RigCapabilities {
    fn default() -> Self {
        RigCapabilities {
            supported_modes: Vec::new(),
            rx_ranges: Vec::new(),
            tx_ranges: Vec::new(),
            functions: Vec::new(),
            levels: Vec::new(),
            has_dual_watch: false,
            has_split: false,
            max_power_watts: 0.0,
            meter_cal: MeterCal::uncalibrated(),
        }
    }
}
