//! Formatting and conversion helpers.
//!
//! Small utility functions that virtually every consuming application
//! (mobile dashboards, CLI tools, logging frontends) needs.

/// Format a frequency in hertz as a human-readable MHz string.
///
/// Returns a string like `"145.500000 MHz"` with six decimal places.
///
/// # Example
///
/// ```
/// use civlink_core::format_freq_mhz;
///
/// assert_eq!(format_freq_mhz(145_500_000), "145.500000 MHz");
/// assert_eq!(format_freq_mhz(433_000_000), "433.000000 MHz");
/// ```
pub fn format_freq_mhz(freq_hz: u64) -> String {
    let mhz = freq_hz as f64 / 1_000_000.0;
    format!("{mhz:.6} MHz")
}

/// Convert a signal strength in dBm to an S-unit string.
///
/// Uses the standard IARU calibration: S9 = −73 dBm, 6 dB per S-unit.
/// Below S1 returns `"S0"`; above S9 returns `"S9+N dB"` rounded to the
/// nearest integer dB.
///
/// # Example
///
/// ```
/// use civlink_core::s_units_from_dbm;
///
/// assert_eq!(s_units_from_dbm(-73.0), "S9");
/// assert_eq!(s_units_from_dbm(-79.0), "S8");
/// assert_eq!(s_units_from_dbm(-63.0), "S9+10 dB");
/// ```
pub fn s_units_from_dbm(dbm: f32) -> String {
    if dbm > -73.0 {
        let over = (dbm + 73.0).round() as i32;
        format!("S9+{over} dB")
    } else {
        // S9 = -73 dBm, each S-unit 6 dB below; S1 = -121 dBm.
        let s = ((dbm + 127.0) / 6.0).round() as i32;
        let s = s.clamp(0, 9);
        format!("S{s}")
    }
}
