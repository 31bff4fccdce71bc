//! Mode codec for dual-watch D-STAR mobiles.
//!
//! These radios encode the narrow variants of AM and FM as the *same*
//! CI-V mode byte with a different width byte, and the width byte in turn
//! implies a fixed receiver bandwidth. The codec owns that three-way
//! mapping in both directions.
//!
//! | Mode | mode byte | width byte | bandwidth |
//! |------|-----------|------------|-----------|
//! | AM   | `0x02`    | `0x01`     | 12 kHz    |
//! | AM-N | `0x02`    | `0x02`     | 6 kHz     |
//! | FM   | `0x05`    | `0x01`     | 10 kHz    |
//! | FM-N | `0x05`    | `0x02`     | 5 kHz     |
//! | DV   | `0x17`    | `0x01`     | 6 kHz     |

use civlink_core::{Error, Mode, Passband, Result};

/// CI-V mode byte for the AM family.
pub const CIV_MODE_AM: u8 = 0x02;
/// CI-V mode byte for the FM family.
pub const CIV_MODE_FM: u8 = 0x05;
/// CI-V mode byte for D-STAR digital voice.
pub const CIV_MODE_DV: u8 = 0x17;

/// Width byte selecting the wide variant of a mode family.
pub const CIV_WIDTH_WIDE: u8 = 0x01;
/// Width byte selecting the narrow variant of a mode family.
pub const CIV_WIDTH_NARROW: u8 = 0x02;

/// Encode an operating mode as its `(mode byte, width byte)` pair.
///
/// Total over [`Mode`]: every variant has exactly one encoding.
pub fn mode_to_civ(mode: Mode) -> (u8, u8) {
    match mode {
        Mode::Am => (CIV_MODE_AM, CIV_WIDTH_WIDE),
        Mode::AmNarrow => (CIV_MODE_AM, CIV_WIDTH_NARROW),
        Mode::Fm => (CIV_MODE_FM, CIV_WIDTH_WIDE),
        Mode::FmNarrow => (CIV_MODE_FM, CIV_WIDTH_NARROW),
        Mode::DigitalVoice => (CIV_MODE_DV, CIV_WIDTH_WIDE),
    }
}

/// Decode a `(mode byte, width byte)` pair reported by the radio.
///
/// Returns the operating mode together with the bandwidth the width byte
/// implies, for callers that report width independently of mode.
///
/// CI-V reserves mode bytes for modes this radio family does not have
/// (SSB, data sub-modes, DR memories); a pair outside the table is an
/// [`Error::UnrecognizedMode`], never silently mapped to a default.
pub fn civ_to_mode(mode: u8, width: u8) -> Result<(Mode, Passband)> {
    let decoded = match (mode, width) {
        (CIV_MODE_AM, CIV_WIDTH_WIDE) => (Mode::Am, Passband::from_hz(12_000)),
        (CIV_MODE_AM, CIV_WIDTH_NARROW) => (Mode::AmNarrow, Passband::from_hz(6_000)),
        (CIV_MODE_FM, CIV_WIDTH_WIDE) => (Mode::Fm, Passband::from_hz(10_000)),
        (CIV_MODE_FM, CIV_WIDTH_NARROW) => (Mode::FmNarrow, Passband::from_hz(5_000)),
        (CIV_MODE_DV, CIV_WIDTH_WIDE) => (Mode::DigitalVoice, Passband::from_hz(6_000)),
        _ => return Err(Error::UnrecognizedMode { mode, width }),
    };
    Ok(decoded)
}

/// The receiver bandwidth a mode implies on this radio family.
pub fn native_passband(mode: Mode) -> Passband {
    let (m, w) = mode_to_civ(mode);
    // The table is total, so this cannot fail.
    let (_, pb) = civ_to_mode(m, w).expect("mode table is total");
    pb
}
