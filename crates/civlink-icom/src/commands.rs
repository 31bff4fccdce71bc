//! CI-V command builders and response parsers.
//!
//! This module constructs CI-V command frames for the operations a
//! dual-watch mobile exposes (frequency, mode, band selection, dual
//! watch, functions, levels, metering, PTT, duplex, tones, power) and
//! parses the corresponding response bodies.
//!
//! All functions are pure — they produce or consume byte vectors without
//! performing any I/O. The IO task owns sending and receiving.
//!
//! Response parsers take the raw frame `body` (everything after the
//! command byte); each parser knows whether its command echoes a
//! sub-command byte at the front and strips it itself.

use civlink_core::{Error, Func, Level, Mode, Passband, RepeaterShift, Result};

use crate::civ::{
    CONTROLLER_ADDR, bcd_be_to_u16, bcd_to_freq, encode_frame, freq_to_bcd, u16_to_bcd_be,
    validate_bcd,
};
use crate::mode::{civ_to_mode, mode_to_civ};

// ---------------------------------------------------------------
// CI-V command/sub-command constants
// ---------------------------------------------------------------

/// Read operating frequency (cmd 0x03). No sub-command, no data.
const CMD_READ_FREQ: u8 = 0x03;

/// Read operating mode (cmd 0x04). No sub-command, no data.
const CMD_READ_MODE: u8 = 0x04;

/// Write operating frequency (cmd 0x05). Data: 5-byte BCD, no sub-command.
const CMD_SET_FREQ: u8 = 0x05;

/// Set operating mode (cmd 0x06). Data: mode byte + width byte.
const CMD_SET_MODE: u8 = 0x06;

/// VFO selection and dual-watch control (cmd 0x07).
const CMD_VFO: u8 = 0x07;

/// Split/duplex control (cmd 0x0F).
const CMD_SPLIT_DUP: u8 = 0x0F;

/// Read/set level settings (cmd 0x14).
const CMD_LEVEL: u8 = 0x14;

/// Read meter values (cmd 0x15).
const CMD_METER: u8 = 0x15;

/// Function on/off control (cmd 0x16).
const CMD_FUNC: u8 = 0x16;

/// Power on/off (cmd 0x18).
const CMD_POWER: u8 = 0x18;

/// Repeater tone / tone squelch frequency (cmd 0x1B).
const CMD_TONE: u8 = 0x1B;

/// PTT and transmit control (cmd 0x1C).
const CMD_PTT: u8 = 0x1C;

/// Selected/unselected band frequency access (cmd 0x25).
///
/// Newer firmware addresses a band without switching to it through this
/// command. The dual-watch mobiles answer it unreliably in both
/// addressing styles, so the driver falls back to the classic 0x03/0x05
/// pair once a band selection has been made.
const CMD_SELECTED_FREQ: u8 = 0x25;

// Sub-command constants for CMD_VFO (0x07)
/// Turn dual watch off.
const SUB_DUAL_OFF: u8 = 0xC0;
/// Turn dual watch on.
const SUB_DUAL_ON: u8 = 0xC1;
/// Read dual-watch state.
const SUB_DUAL_READ: u8 = 0xC2;
/// Select the Main band.
const SUB_SELECT_MAIN: u8 = 0xD0;
/// Select the Sub band.
const SUB_SELECT_SUB: u8 = 0xD1;

// Sub-command constants for CMD_SPLIT_DUP (0x0F)
const SUB_DUP_SIMPLEX: u8 = 0x10;
const SUB_DUP_MINUS: u8 = 0x11;
const SUB_DUP_PLUS: u8 = 0x12;

// Sub-command constants for CMD_LEVEL (0x14)
const SUB_AF_GAIN: u8 = 0x01;
const SUB_SQUELCH: u8 = 0x03;
const SUB_RF_POWER: u8 = 0x0A;
const SUB_MIC_GAIN: u8 = 0x0B;

// Sub-command constants for CMD_METER (0x15)
const SUB_S_METER: u8 = 0x02;

// Sub-command constants for CMD_FUNC (0x16)
const SUB_TONE: u8 = 0x42;
const SUB_TSQL: u8 = 0x43;
const SUB_VOX: u8 = 0x46;

// Sub-command constants for CMD_POWER (0x18)
const SUB_POWER_OFF: u8 = 0x00;
const SUB_POWER_ON: u8 = 0x01;

// Sub-command constants for CMD_TONE (0x1B)
const SUB_RPTR_TONE: u8 = 0x00;
const SUB_TSQL_TONE: u8 = 0x01;

// Sub-command for CMD_PTT (0x1C)
const SUB_PTT: u8 = 0x00;

// Sub-command for CMD_SELECTED_FREQ (0x25)
const SUB_SELECTED: u8 = 0x00;

/// Physical band selector of a dual-watch radio.
///
/// Logical VFO A maps to Main and B to Sub; Main/Sub map to themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandSelect {
    /// The Main band (also the transmit band in split operation).
    Main,
    /// The Sub band (the receive band in split operation).
    Sub,
}

/// The (command, sub-command) pair for a level.
fn level_sub(level: Level) -> u8 {
    match level {
        Level::AfGain => SUB_AF_GAIN,
        Level::Squelch => SUB_SQUELCH,
        Level::RfPower => SUB_RF_POWER,
        Level::MicGain => SUB_MIC_GAIN,
    }
}

/// The 0x16-family sub-command for a function, or `None` for functions
/// that live elsewhere in the command map (dual watch is on 0x07).
fn func_sub(func: Func) -> Option<u8> {
    match func {
        Func::DualWatch => None,
        Func::Tone => Some(SUB_TONE),
        Func::ToneSquelch => Some(SUB_TSQL),
        Func::Vox => Some(SUB_VOX),
    }
}

// ---------------------------------------------------------------
// Command builders
// ---------------------------------------------------------------

/// Build a "read frequency" command (classic 0x03).
pub fn cmd_read_frequency(addr: u8) -> Vec<u8> {
    encode_frame(addr, CONTROLLER_ADDR, CMD_READ_FREQ, None, &[])
}

/// Build a "set frequency" command (classic 0x05) with 5-byte BCD data.
pub fn cmd_set_frequency(addr: u8, freq_hz: u64) -> Vec<u8> {
    let bcd = freq_to_bcd(freq_hz);
    encode_frame(addr, CONTROLLER_ADDR, CMD_SET_FREQ, None, &bcd)
}

/// Build a "read selected-band frequency" command (extended 0x25 0x00).
pub fn cmd_read_selected_frequency(addr: u8) -> Vec<u8> {
    encode_frame(
        addr,
        CONTROLLER_ADDR,
        CMD_SELECTED_FREQ,
        Some(SUB_SELECTED),
        &[],
    )
}

/// Build a "set selected-band frequency" command (extended 0x25 0x00).
pub fn cmd_set_selected_frequency(addr: u8, freq_hz: u64) -> Vec<u8> {
    let bcd = freq_to_bcd(freq_hz);
    encode_frame(
        addr,
        CONTROLLER_ADDR,
        CMD_SELECTED_FREQ,
        Some(SUB_SELECTED),
        &bcd,
    )
}

/// Build a "read mode" command.
///
/// The radio responds with a mode byte and a width byte; see
/// [`parse_mode_body`].
pub fn cmd_read_mode(addr: u8) -> Vec<u8> {
    encode_frame(addr, CONTROLLER_ADDR, CMD_READ_MODE, None, &[])
}

/// Build a "set mode" command.
///
/// Encodes the mode through the mode codec: the narrow variants share a
/// mode byte with their wide siblings and differ in the width byte.
pub fn cmd_set_mode(addr: u8, mode: Mode) -> Vec<u8> {
    let (mode_byte, width_byte) = mode_to_civ(mode);
    encode_frame(
        addr,
        CONTROLLER_ADDR,
        CMD_SET_MODE,
        None,
        &[mode_byte, width_byte],
    )
}

/// Build a "select band" command (cmd 0x07, sub 0xD0 Main / 0xD1 Sub).
pub fn cmd_select_band(addr: u8, band: BandSelect) -> Vec<u8> {
    let sub = match band {
        BandSelect::Main => SUB_SELECT_MAIN,
        BandSelect::Sub => SUB_SELECT_SUB,
    };
    encode_frame(addr, CONTROLLER_ADDR, CMD_VFO, Some(sub), &[])
}

/// Build a "set dual watch" command (cmd 0x07, sub 0xC1 on / 0xC0 off).
pub fn cmd_set_dual_watch(addr: u8, on: bool) -> Vec<u8> {
    let sub = if on { SUB_DUAL_ON } else { SUB_DUAL_OFF };
    encode_frame(addr, CONTROLLER_ADDR, CMD_VFO, Some(sub), &[])
}

/// Build a "read dual watch" command (cmd 0x07, sub 0xC2).
pub fn cmd_read_dual_watch(addr: u8) -> Vec<u8> {
    encode_frame(addr, CONTROLLER_ADDR, CMD_VFO, Some(SUB_DUAL_READ), &[])
}

/// Build a "set function" command.
///
/// Dual watch is not a 0x16 function on these radios; it routes to the
/// VFO command family ([`cmd_set_dual_watch`]).
pub fn cmd_set_function(addr: u8, func: Func, on: bool) -> Vec<u8> {
    match func_sub(func) {
        Some(sub) => encode_frame(addr, CONTROLLER_ADDR, CMD_FUNC, Some(sub), &[on as u8]),
        None => cmd_set_dual_watch(addr, on),
    }
}

/// Build a "read function" command.
pub fn cmd_read_function(addr: u8, func: Func) -> Vec<u8> {
    match func_sub(func) {
        Some(sub) => encode_frame(addr, CONTROLLER_ADDR, CMD_FUNC, Some(sub), &[]),
        None => cmd_read_dual_watch(addr),
    }
}

/// Build a "set level" command with a raw 0–255 value as 2-byte BCD.
pub fn cmd_set_level(addr: u8, level: Level, raw: u16) -> Vec<u8> {
    let bcd = u16_to_bcd_be(raw.min(255));
    encode_frame(
        addr,
        CONTROLLER_ADDR,
        CMD_LEVEL,
        Some(level_sub(level)),
        &bcd,
    )
}

/// Build a "read level" command.
pub fn cmd_read_level(addr: u8, level: Level) -> Vec<u8> {
    encode_frame(addr, CONTROLLER_ADDR, CMD_LEVEL, Some(level_sub(level)), &[])
}

/// Build a "read S-meter" command (cmd 0x15, sub 0x02).
pub fn cmd_read_s_meter(addr: u8) -> Vec<u8> {
    encode_frame(addr, CONTROLLER_ADDR, CMD_METER, Some(SUB_S_METER), &[])
}

/// Build a "set PTT" command (cmd 0x1C, sub 0x00, data 0x01/0x00).
pub fn cmd_set_ptt(addr: u8, on: bool) -> Vec<u8> {
    encode_frame(addr, CONTROLLER_ADDR, CMD_PTT, Some(SUB_PTT), &[on as u8])
}

/// Build a "read PTT" command (cmd 0x1C, sub 0x00).
pub fn cmd_read_ptt(addr: u8) -> Vec<u8> {
    encode_frame(addr, CONTROLLER_ADDR, CMD_PTT, Some(SUB_PTT), &[])
}

/// Build a "set repeater shift" command (cmd 0x0F).
pub fn cmd_set_repeater_shift(addr: u8, shift: RepeaterShift) -> Vec<u8> {
    let sub = match shift {
        RepeaterShift::Simplex => SUB_DUP_SIMPLEX,
        RepeaterShift::Minus => SUB_DUP_MINUS,
        RepeaterShift::Plus => SUB_DUP_PLUS,
    };
    encode_frame(addr, CONTROLLER_ADDR, CMD_SPLIT_DUP, Some(sub), &[])
}

/// Build a "read duplex state" command (cmd 0x0F, no sub-command).
pub fn cmd_read_repeater_shift(addr: u8) -> Vec<u8> {
    encode_frame(addr, CONTROLLER_ADDR, CMD_SPLIT_DUP, None, &[])
}

/// Build a "set repeater tone" command (cmd 0x1B, sub 0x00).
///
/// `tenth_hz` is the CTCSS frequency in tenths of hertz (885 = 88.5 Hz).
pub fn cmd_set_repeater_tone(addr: u8, tenth_hz: u16) -> Vec<u8> {
    let bcd = u16_to_bcd_be(tenth_hz);
    encode_frame(addr, CONTROLLER_ADDR, CMD_TONE, Some(SUB_RPTR_TONE), &bcd)
}

/// Build a "read repeater tone" command (cmd 0x1B, sub 0x00).
pub fn cmd_read_repeater_tone(addr: u8) -> Vec<u8> {
    encode_frame(addr, CONTROLLER_ADDR, CMD_TONE, Some(SUB_RPTR_TONE), &[])
}

/// Build a "set tone squelch tone" command (cmd 0x1B, sub 0x01).
pub fn cmd_set_tone_squelch(addr: u8, tenth_hz: u16) -> Vec<u8> {
    let bcd = u16_to_bcd_be(tenth_hz);
    encode_frame(addr, CONTROLLER_ADDR, CMD_TONE, Some(SUB_TSQL_TONE), &bcd)
}

/// Build a "read tone squelch tone" command (cmd 0x1B, sub 0x01).
pub fn cmd_read_tone_squelch(addr: u8) -> Vec<u8> {
    encode_frame(addr, CONTROLLER_ADDR, CMD_TONE, Some(SUB_TSQL_TONE), &[])
}

/// Build a "power on/off" command (cmd 0x18).
///
/// Power-on additionally needs a wake-up preamble burst; the driver
/// prepends it before handing the bytes to the transport.
pub fn cmd_set_power(addr: u8, on: bool) -> Vec<u8> {
    let sub = if on { SUB_POWER_ON } else { SUB_POWER_OFF };
    encode_frame(addr, CONTROLLER_ADDR, CMD_POWER, Some(sub), &[])
}

// ---------------------------------------------------------------
// Response parsers
// ---------------------------------------------------------------

/// Strip an echoed sub-command byte from the front of a response body.
///
/// Some firmware revisions echo the sub-command in data responses and
/// some omit it. The strip happens only when the body is longer than the
/// expected payload, so a data byte that happens to equal the sub-command
/// value is never eaten.
fn strip_sub_echo(body: &[u8], sub: u8, expected: usize) -> &[u8] {
    if body.len() > expected && body.first() == Some(&sub) {
        &body[1..]
    } else {
        body
    }
}

/// Parse a 5-byte BCD frequency response body (commands 0x03/0x25).
///
/// For 0x25 responses the echoed sub-command byte is stripped first.
pub fn parse_frequency_body(body: &[u8]) -> Result<u64> {
    let data = strip_sub_echo(body, SUB_SELECTED, 5);
    if data.len() < 5 {
        return Err(Error::Protocol(format!(
            "frequency response too short: {} bytes",
            data.len()
        )));
    }
    let mut bcd = [0u8; 5];
    bcd.copy_from_slice(&data[..5]);
    validate_bcd(&bcd)?;
    Ok(bcd_to_freq(&bcd))
}

/// Parse a mode response body (command 0x04) through the mode codec.
///
/// Returns the operating mode and the bandwidth implied by the width
/// byte. An unknown pair is surfaced as
/// [`Error::UnrecognizedMode`](civlink_core::Error::UnrecognizedMode).
pub fn parse_mode_body(body: &[u8]) -> Result<(Mode, Passband)> {
    if body.len() < 2 {
        return Err(Error::Protocol(format!(
            "mode response too short: {} bytes",
            body.len()
        )));
    }
    civ_to_mode(body[0], body[1])
}

/// Parse an on/off status byte, stripping the echoed sub-command.
pub fn parse_switch_body(body: &[u8], sub: u8) -> Result<bool> {
    let data = strip_sub_echo(body, sub, 1);
    match data.first() {
        Some(0x00) => Ok(false),
        Some(0x01) => Ok(true),
        Some(other) => Err(Error::Protocol(format!(
            "unexpected switch status byte: 0x{other:02X}"
        ))),
        None => Err(Error::Protocol("empty switch response".into())),
    }
}

/// Parse an on/off function response for the given function.
pub fn parse_function_body(func: Func, body: &[u8]) -> Result<bool> {
    let sub = func_sub(func).unwrap_or(SUB_DUAL_READ);
    parse_switch_body(body, sub)
}

/// Parse a 2-byte BCD level response (0000–0255) to a raw value.
pub fn parse_level_body(level: Level, body: &[u8]) -> Result<u16> {
    parse_bcd2_body(body, level_sub(level))
}

/// Parse a raw S-meter response (0000–0255).
pub fn parse_s_meter_body(body: &[u8]) -> Result<u16> {
    parse_bcd2_body(body, SUB_S_METER)
}

/// Parse a PTT status response.
pub fn parse_ptt_body(body: &[u8]) -> Result<bool> {
    parse_switch_body(body, SUB_PTT)
}

/// Parse a duplex state response (command 0x0F).
pub fn parse_repeater_shift_body(body: &[u8]) -> Result<RepeaterShift> {
    match body.first() {
        Some(&SUB_DUP_SIMPLEX) => Ok(RepeaterShift::Simplex),
        Some(&SUB_DUP_MINUS) => Ok(RepeaterShift::Minus),
        Some(&SUB_DUP_PLUS) => Ok(RepeaterShift::Plus),
        Some(other) => Err(Error::Protocol(format!(
            "unexpected duplex state byte: 0x{other:02X}"
        ))),
        None => Err(Error::Protocol("empty duplex response".into())),
    }
}

/// Parse a CTCSS tone response to tenths of hertz.
pub fn parse_tone_body(body: &[u8], tone_squelch: bool) -> Result<u16> {
    let sub = if tone_squelch {
        SUB_TSQL_TONE
    } else {
        SUB_RPTR_TONE
    };
    parse_bcd2_body(body, sub)
}

/// Shared 2-byte big-endian BCD parser with sub-command stripping.
fn parse_bcd2_body(body: &[u8], sub: u8) -> Result<u16> {
    let data = strip_sub_echo(body, sub, 2);
    if data.len() < 2 {
        return Err(Error::Protocol(format!(
            "BCD response too short: {} bytes",
            data.len()
        )));
    }
    let mut bcd = [0u8; 2];
    bcd.copy_from_slice(&data[..2]);
    bcd_be_to_u16(&bcd)
        .ok_or_else(|| Error::Protocol(format!("invalid BCD bytes: {bcd:02X?}")))
}
