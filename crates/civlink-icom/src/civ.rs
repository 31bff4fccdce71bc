//! CI-V frame encoder/decoder.
//!
//! The Icom CI-V (Communication Interface V) protocol uses binary frames
//! on a half-duplex bus. This module handles the pure byte-level encoding
//! and decoding of CI-V frames, BCD number conversion, and collision
//! detection.
//!
//! # Frame format
//!
//! ```text
//! 0xFE 0xFE <dst> <src> <cmd> [<sub>] [<data>...] 0xFD
//! ```
//!
//! - Preamble: two `0xFE` bytes
//! - `dst`: target CI-V address (e.g. `0x8C` for the ID-5100)
//! - `src`: controller address (typically `0xE0`)
//! - `cmd`: command byte
//! - `sub`: optional sub-command byte
//! - `data`: variable-length payload (BCD-encoded for numbers)
//! - Terminator: `0xFD`
//!
//! Whether a frame carries a sub-command depends on the command, and the
//! wire format gives no way to tell. A decoded [`Frame`] therefore keeps
//! everything after the command byte as an opaque `body`; the per-command
//! response parsers in [`crate::commands`] know which leading byte, if
//! any, is an echoed sub-command.

use bytes::{BufMut, BytesMut};

/// Preamble byte repeated twice at the start of every CI-V frame.
pub const PREAMBLE: u8 = 0xFE;

/// Frame terminator byte.
pub const TERMINATOR: u8 = 0xFD;

/// Standard PC controller CI-V address.
pub const CONTROLLER_ADDR: u8 = 0xE0;

/// ACK command byte — positive acknowledgement from the rig.
pub const ACK: u8 = 0xFB;

/// NAK command byte — negative acknowledgement from the rig.
pub const NAK: u8 = 0xFA;

/// Collision indicator byte on the CI-V bus.
///
/// When two devices transmit simultaneously on the shared bus, the echoed
/// byte may read as `0xFC` instead of the transmitted value. The
/// controller should discard the frame and retry.
pub const COLLISION: u8 = 0xFC;

/// A parsed CI-V frame.
///
/// `body` holds every byte between the command and the terminator —
/// sub-command and payload undifferentiated, since the split is
/// command-specific knowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Destination CI-V address.
    pub dst_addr: u8,
    /// Source CI-V address.
    pub src_addr: u8,
    /// Command byte.
    pub cmd: u8,
    /// Sub-command and payload bytes (may be empty).
    pub body: Vec<u8>,
}

impl Frame {
    /// Returns `true` if this frame is a positive acknowledgement (ACK).
    pub fn is_ack(&self) -> bool {
        self.cmd == ACK && self.body.is_empty()
    }

    /// Returns `true` if this frame is a negative acknowledgement (NAK).
    pub fn is_nak(&self) -> bool {
        self.cmd == NAK && self.body.is_empty()
    }

    /// Encode this frame into raw bytes ready for transmission.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(6 + self.body.len());
        buf.put_u8(PREAMBLE);
        buf.put_u8(PREAMBLE);
        buf.put_u8(self.dst_addr);
        buf.put_u8(self.src_addr);
        buf.put_u8(self.cmd);
        buf.put_slice(&self.body);
        buf.put_u8(TERMINATOR);
        buf.to_vec()
    }
}

/// Encode a CI-V frame from its parts into raw wire bytes.
///
/// Produces the full wire format including preamble and terminator.
///
/// # Example
///
/// ```
/// use civlink_icom::civ::{encode_frame, CONTROLLER_ADDR};
///
/// // Read-frequency command to an ID-5100 (addr 0x8C)
/// let bytes = encode_frame(0x8C, CONTROLLER_ADDR, 0x03, None, &[]);
/// assert_eq!(bytes, vec![0xFE, 0xFE, 0x8C, 0xE0, 0x03, 0xFD]);
/// ```
pub fn encode_frame(
    dst_addr: u8,
    src_addr: u8,
    cmd: u8,
    sub_cmd: Option<u8>,
    data: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(sub_cmd.is_some() as usize + data.len());
    if let Some(sub) = sub_cmd {
        body.push(sub);
    }
    body.extend_from_slice(data);
    Frame {
        dst_addr,
        src_addr,
        cmd,
        body,
    }
    .encode()
}

/// Result of attempting to decode a frame from a byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A complete frame was decoded. `consumed` is the number of bytes to
    /// drain from the input buffer (including any skipped garbage, the
    /// preamble, and the terminator).
    Frame {
        /// The decoded frame.
        frame: Frame,
        /// Bytes consumed from the input.
        consumed: usize,
    },

    /// The buffer does not yet contain a complete frame.
    Incomplete,

    /// A CI-V bus collision (or unparseable frame) was detected.
    /// `consumed` is the number of bytes to discard.
    Collision {
        /// Bytes to discard from the input.
        consumed: usize,
    },
}

/// Attempt to decode one CI-V frame from a byte buffer.
///
/// Scans `buf` for a valid preamble (`0xFE 0xFE`) followed by a
/// terminator (`0xFD`). Any bytes before the first preamble are silently
/// skipped (garbage or inter-frame noise on the bus).
pub fn decode_frame(buf: &[u8]) -> Decoded {
    let preamble_pos = match find_preamble(buf) {
        Some(pos) => pos,
        None => return Decoded::Incomplete,
    };

    let after_preamble = preamble_pos + 2;
    if after_preamble >= buf.len() {
        return Decoded::Incomplete;
    }

    let term_pos = match buf[after_preamble..].iter().position(|&b| b == TERMINATOR) {
        Some(rel) => after_preamble + rel,
        None => {
            // No terminator yet; a collision marker in the partial data
            // means the frame is already beyond saving.
            if buf[after_preamble..].contains(&COLLISION) {
                return Decoded::Collision { consumed: buf.len() };
            }
            return Decoded::Incomplete;
        }
    };

    let body_bytes = &buf[after_preamble..term_pos];
    let consumed = term_pos + 1;

    if body_bytes.contains(&COLLISION) {
        return Decoded::Collision { consumed };
    }

    // At minimum dst + src + cmd between preamble and terminator.
    if body_bytes.len() < 3 {
        return Decoded::Collision { consumed };
    }

    Decoded::Frame {
        frame: Frame {
            dst_addr: body_bytes[0],
            src_addr: body_bytes[1],
            cmd: body_bytes[2],
            body: body_bytes[3..].to_vec(),
        },
        consumed,
    }
}

/// Find the position of the first CI-V preamble (`0xFE 0xFE`) in a buffer.
fn find_preamble(buf: &[u8]) -> Option<usize> {
    if buf.len() < 2 {
        return None;
    }
    buf.windows(2)
        .position(|w| w[0] == PREAMBLE && w[1] == PREAMBLE)
}

/// Convert a frequency in hertz to 5-byte BCD encoding (LSB first).
///
/// CI-V represents frequencies as 10-digit BCD with the least significant
/// byte transmitted first. Each byte holds two BCD digits.
///
/// # Example
///
/// ```
/// use civlink_icom::civ::freq_to_bcd;
///
/// // 145.450 MHz
/// let bcd = freq_to_bcd(145_450_000);
/// assert_eq!(bcd, [0x00, 0x00, 0x45, 0x45, 0x01]);
/// ```
pub fn freq_to_bcd(freq_hz: u64) -> [u8; 5] {
    let mut result = [0u8; 5];
    let mut freq = freq_hz;

    for byte in &mut result {
        let lo = (freq % 10) as u8;
        freq /= 10;
        let hi = (freq % 10) as u8;
        freq /= 10;
        *byte = (hi << 4) | lo;
    }

    result
}

/// Convert 5-byte BCD encoding (LSB first) back to frequency in hertz.
///
/// This is the inverse of [`freq_to_bcd`].
pub fn bcd_to_freq(bcd: &[u8; 5]) -> u64 {
    let mut freq: u64 = 0;
    let mut multiplier: u64 = 1;

    for &byte in bcd {
        let lo = (byte & 0x0F) as u64;
        let hi = ((byte >> 4) & 0x0F) as u64;
        freq += lo * multiplier;
        multiplier *= 10;
        freq += hi * multiplier;
        multiplier *= 10;
    }

    freq
}

/// Encode a value 0–9999 as 2-byte big-endian BCD.
///
/// Used for level settings (0000–0255) and CTCSS tones (tenths of hertz,
/// e.g. 885 for 88.5 Hz).
///
/// # Example
///
/// ```
/// use civlink_icom::civ::u16_to_bcd_be;
///
/// assert_eq!(u16_to_bcd_be(255), [0x02, 0x55]);
/// assert_eq!(u16_to_bcd_be(885), [0x08, 0x85]);
/// ```
pub fn u16_to_bcd_be(value: u16) -> [u8; 2] {
    let value = value.min(9999);
    let hi = (((value / 1000) as u8) << 4) | ((value / 100 % 10) as u8);
    let lo = (((value / 10 % 10) as u8) << 4) | ((value % 10) as u8);
    [hi, lo]
}

/// Decode 2-byte big-endian BCD to a value 0–9999.
///
/// This is the inverse of [`u16_to_bcd_be`]. Returns `None` if any nibble
/// is not a decimal digit.
pub fn bcd_be_to_u16(bcd: &[u8; 2]) -> Option<u16> {
    let mut value: u16 = 0;
    for &byte in bcd {
        let hi = (byte >> 4) & 0x0F;
        let lo = byte & 0x0F;
        if hi > 9 || lo > 9 {
            return None;
        }
        value = value * 100 + (hi as u16) * 10 + lo as u16;
    }
    Some(value)
}

/// Validate that raw BCD bytes contain only decimal digits (0-9 in each nibble).
pub fn validate_bcd(bcd: &[u8]) -> civlink_core::Result<()> {
    for (i, &byte) in bcd.iter().enumerate() {
        let lo = byte & 0x0F;
        let hi = (byte >> 4) & 0x0F;
        if lo > 9 || hi > 9 {
            return Err(civlink_core::Error::Protocol(format!(
                "invalid BCD digit at byte {i}: 0x{byte:02X}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---------------------------------------------------------------
    // BCD frequency encoding/decoding
    // ---------------------------------------------------------------

    #[test]
    fn bcd_145_450_mhz() {
        // 145,450,000 Hz => 10 digits: 0145450000
        // LSB-first wire order: [0x00, 0x00, 0x45, 0x45, 0x01]
        let bcd = freq_to_bcd(145_450_000);
        assert_eq!(bcd, [0x00, 0x00, 0x45, 0x45, 0x01]);
        assert_eq!(bcd_to_freq(&bcd), 145_450_000);
    }

    #[test]
    fn bcd_433_mhz() {
        let bcd = freq_to_bcd(433_500_000);
        assert_eq!(bcd, [0x00, 0x00, 0x50, 0x33, 0x04]);
        assert_eq!(bcd_to_freq(&bcd), 433_500_000);
    }

    #[test]
    fn bcd_airband() {
        // 118.1 MHz AM airband with sub-kHz precision preserved
        let freq = 118_100_250;
        let bcd = freq_to_bcd(freq);
        assert_eq!(bcd_to_freq(&bcd), freq);
    }

    #[test]
    fn bcd_round_trip_zero() {
        let bcd = freq_to_bcd(0);
        assert_eq!(bcd, [0x00; 5]);
        assert_eq!(bcd_to_freq(&bcd), 0);
    }

    #[test]
    fn bcd_round_trip_max_10_digit() {
        let freq = 9_999_999_999u64;
        let bcd = freq_to_bcd(freq);
        assert_eq!(bcd, [0x99; 5]);
        assert_eq!(bcd_to_freq(&bcd), freq);
    }

    // ---------------------------------------------------------------
    // 2-byte BCD
    // ---------------------------------------------------------------

    #[test]
    fn bcd2_levels() {
        assert_eq!(u16_to_bcd_be(0), [0x00, 0x00]);
        assert_eq!(u16_to_bcd_be(128), [0x01, 0x28]);
        assert_eq!(u16_to_bcd_be(255), [0x02, 0x55]);
    }

    #[test]
    fn bcd2_tones() {
        // 88.5 Hz CTCSS as tenths
        assert_eq!(u16_to_bcd_be(885), [0x08, 0x85]);
        // 203.5 Hz
        assert_eq!(u16_to_bcd_be(2035), [0x20, 0x35]);
    }

    #[test]
    fn bcd2_round_trip() {
        for value in [0u16, 7, 88, 885, 1000, 2541, 9999] {
            let bcd = u16_to_bcd_be(value);
            assert_eq!(bcd_be_to_u16(&bcd), Some(value));
        }
    }

    #[test]
    fn bcd2_rejects_non_decimal() {
        assert_eq!(bcd_be_to_u16(&[0x0A, 0x00]), None);
        assert_eq!(bcd_be_to_u16(&[0x00, 0xF0]), None);
    }

    #[test]
    fn validate_bcd_valid() {
        assert!(validate_bcd(&[0x00, 0x00, 0x45, 0x45, 0x01]).is_ok());
        assert!(validate_bcd(&[0x99; 5]).is_ok());
    }

    #[test]
    fn validate_bcd_invalid_nibble() {
        assert!(validate_bcd(&[0xAB]).is_err());
        assert!(validate_bcd(&[0x1A]).is_err());
        assert!(validate_bcd(&[0xF0]).is_err());
    }

    // ---------------------------------------------------------------
    // Frame encoding
    // ---------------------------------------------------------------

    #[test]
    fn encode_read_frequency() {
        let bytes = encode_frame(0x8C, CONTROLLER_ADDR, 0x03, None, &[]);
        assert_eq!(bytes, vec![0xFE, 0xFE, 0x8C, 0xE0, 0x03, 0xFD]);
    }

    #[test]
    fn encode_with_sub_command() {
        // Select Main band: cmd=0x07, sub=0xD0
        let bytes = encode_frame(0x8C, CONTROLLER_ADDR, 0x07, Some(0xD0), &[]);
        assert_eq!(bytes, vec![0xFE, 0xFE, 0x8C, 0xE0, 0x07, 0xD0, 0xFD]);
    }

    #[test]
    fn encode_frame_struct_round_trips() {
        let original = Frame {
            dst_addr: 0x8C,
            src_addr: CONTROLLER_ADDR,
            cmd: 0x06,
            body: vec![0x05, 0x01],
        };
        let encoded = original.encode();
        match decode_frame(&encoded) {
            Decoded::Frame { frame, consumed } => {
                assert_eq!(frame, original);
                assert_eq!(consumed, encoded.len());
            }
            other => panic!("expected Frame, got {other:?}"),
        }
    }

    // ---------------------------------------------------------------
    // Frame decoding
    // ---------------------------------------------------------------

    #[test]
    fn decode_ack_frame() {
        let buf = vec![0xFE, 0xFE, 0xE0, 0x8C, 0xFB, 0xFD];
        match decode_frame(&buf) {
            Decoded::Frame { frame, consumed } => {
                assert!(frame.is_ack());
                assert!(!frame.is_nak());
                assert_eq!(frame.dst_addr, 0xE0);
                assert_eq!(frame.src_addr, 0x8C);
                assert_eq!(consumed, 6);
            }
            other => panic!("expected Frame, got {other:?}"),
        }
    }

    #[test]
    fn decode_nak_frame() {
        let buf = vec![0xFE, 0xFE, 0xE0, 0x8C, 0xFA, 0xFD];
        match decode_frame(&buf) {
            Decoded::Frame { frame, .. } => {
                assert!(frame.is_nak());
                assert!(!frame.is_ack());
            }
            other => panic!("expected Frame, got {other:?}"),
        }
    }

    #[test]
    fn decode_mode_response_body() {
        // Mode response: cmd=0x04, body=[mode 0x05, width 0x02]
        let buf = vec![0xFE, 0xFE, 0xE0, 0x8C, 0x04, 0x05, 0x02, 0xFD];
        match decode_frame(&buf) {
            Decoded::Frame { frame, consumed } => {
                assert_eq!(frame.cmd, 0x04);
                assert_eq!(frame.body, vec![0x05, 0x02]);
                assert_eq!(consumed, 8);
            }
            other => panic!("expected Frame, got {other:?}"),
        }
    }

    #[test]
    fn decode_incomplete_cases() {
        assert_eq!(decode_frame(&[]), Decoded::Incomplete);
        assert_eq!(decode_frame(&[0xFE]), Decoded::Incomplete);
        assert_eq!(decode_frame(&[0xFE, 0xFE]), Decoded::Incomplete);
        assert_eq!(
            decode_frame(&[0xFE, 0xFE, 0xE0, 0x8C, 0x03]),
            Decoded::Incomplete
        );
        // No preamble at all
        assert_eq!(
            decode_frame(&[0x01, 0x02, 0x03, 0x04]),
            Decoded::Incomplete
        );
    }

    #[test]
    fn decode_garbage_before_preamble() {
        let buf = vec![0x00, 0x01, 0xFE, 0xFE, 0xE0, 0x8C, 0xFB, 0xFD];
        match decode_frame(&buf) {
            Decoded::Frame { frame, consumed } => {
                assert!(frame.is_ack());
                // Consumed includes the skipped garbage.
                assert_eq!(consumed, 8);
            }
            other => panic!("expected Frame, got {other:?}"),
        }
    }

    #[test]
    fn decode_two_frames_back_to_back() {
        let buf = vec![
            0xFE, 0xFE, 0xE0, 0x8C, 0xFB, 0xFD, // ACK
            0xFE, 0xFE, 0xE0, 0x8C, 0xFA, 0xFD, // NAK
        ];
        let Decoded::Frame { frame, consumed } = decode_frame(&buf) else {
            panic!("expected first frame");
        };
        assert!(frame.is_ack());
        let Decoded::Frame { frame, consumed: c2 } = decode_frame(&buf[consumed..]) else {
            panic!("expected second frame");
        };
        assert!(frame.is_nak());
        assert_eq!(c2, 6);
    }

    #[test]
    fn decode_truncated_body_is_discarded() {
        // Terminator arrives with fewer than dst+src+cmd bytes in between.
        let buf = vec![0xFE, 0xFE, 0xE0, 0xFD];
        match decode_frame(&buf) {
            Decoded::Collision { consumed } => assert_eq!(consumed, 4),
            other => panic!("expected Collision, got {other:?}"),
        }
    }

    // ---------------------------------------------------------------
    // Collision detection
    // ---------------------------------------------------------------

    #[test]
    fn decode_collision_in_frame() {
        let buf = vec![0xFE, 0xFE, 0xE0, 0x8C, 0xFC, 0xFD];
        match decode_frame(&buf) {
            Decoded::Collision { consumed } => assert_eq!(consumed, 6),
            other => panic!("expected Collision, got {other:?}"),
        }
    }

    #[test]
    fn decode_collision_without_terminator() {
        let buf = vec![0xFE, 0xFE, 0xE0, 0x8C, 0xFC];
        match decode_frame(&buf) {
            Decoded::Collision { consumed } => assert_eq!(consumed, 5),
            other => panic!("expected Collision, got {other:?}"),
        }
    }
}
