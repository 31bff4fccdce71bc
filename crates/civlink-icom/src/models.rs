//! Model definitions for the dual-watch mobile family.
//!
//! Each supported radio is described by an [`IcomModel`] struct capturing
//! its CI-V address, serial parameters, dialect quirks, and capabilities.
//! These are static data consumed by the protocol engine; the only logic
//! is a consistency check run once at connection time.
//!
//! | Model   | CI-V   | Baud       | Power | Coverage            |
//! |---------|--------|------------|-------|---------------------|
//! | ID-5100 | `0x8C` | 4800-19200 | 50W   | 2m + 70cm, RX 118-550 MHz |
//! | ID-4100 | `0x9A` | 4800-19200 | 50W   | 2m + 70cm, RX 118-550 MHz |

use std::time::Duration;

use civlink_core::{
    Error, FreqRange, Func, Level, MeterCal, Mode, Region, Result, RigCapabilities,
};

/// Protocol dialect quirks of a model, consumed by the transaction engine
/// and the driver's command selection.
#[derive(Debug, Clone, Copy)]
pub struct DialectFlags {
    /// Whether the radio uses the short (4-byte BCD) frequency format of
    /// very old CI-V firmware. All radios in this family use 5 bytes.
    pub short_frequency_format: bool,
    /// The radio has no VFO exchange command; A/B swaps must be done as
    /// two selections.
    pub no_vfo_xchg: bool,
    /// Split operation is realized through dual watch (TX on Main, RX on
    /// Sub) rather than a dedicated split mode.
    pub dual_watch_split: bool,
}

/// Receive and transmit coverage for one ITU region.
#[derive(Debug, Clone)]
pub struct BandPlan {
    /// Receive ranges with per-range mode legality.
    pub rx: Vec<FreqRange>,
    /// Transmit ranges with per-range mode legality and power bounds.
    pub tx: Vec<FreqRange>,
}

/// Static model definition for a dual-watch mobile transceiver.
#[derive(Debug, Clone)]
pub struct IcomModel {
    /// Human-readable model name (e.g. "ID-5100").
    pub name: &'static str,
    /// Machine-readable model identifier — the default CI-V address in
    /// hex notation.
    pub model_id: &'static str,
    /// Default CI-V bus address. Users can change it in the radio's
    /// menus, but this is the factory default.
    pub default_civ_address: u8,
    /// Default serial baud rate.
    pub default_baud_rate: u32,
    /// Lowest baud rate the CI-V jack supports.
    pub baud_rate_min: u32,
    /// Highest baud rate the CI-V jack supports.
    pub baud_rate_max: u32,
    /// Default per-command response timeout.
    pub default_timeout: Duration,
    /// Protocol dialect quirks.
    pub dialect: DialectFlags,
    /// Band plan for ITU Region 1 (Europe).
    pub region1: BandPlan,
    /// Band plan for ITU Region 2 (Americas).
    pub region2: BandPlan,
    /// Operating modes the radio supports.
    pub supported_modes: Vec<Mode>,
    /// On/off functions exposed over CI-V.
    pub functions: Vec<Func>,
    /// Adjustable levels exposed over CI-V.
    pub levels: Vec<Level>,
    /// S-meter calibration curve.
    pub meter_cal: MeterCal,
}

impl IcomModel {
    /// The band plan for a region.
    pub fn band_plan(&self, region: Region) -> &BandPlan {
        match region {
            Region::Region1 => &self.region1,
            Region::Region2 => &self.region2,
        }
    }

    /// Assemble the capability table handed to callers, with the band
    /// plan resolved for `region`.
    pub fn capabilities(&self, region: Region) -> RigCapabilities {
        let plan = self.band_plan(region);
        let max_power_watts = plan
            .tx
            .iter()
            .filter_map(|r| r.max_power_watts)
            .fold(0.0f32, f32::max);
        RigCapabilities {
            supported_modes: self.supported_modes.clone(),
            rx_ranges: plan.rx.clone(),
            tx_ranges: plan.tx.clone(),
            functions: self.functions.clone(),
            levels: self.levels.clone(),
            has_dual_watch: self.functions.contains(&Func::DualWatch),
            has_split: self.dialect.dual_watch_split,
            max_power_watts,
            meter_cal: self.meter_cal.clone(),
        }
    }

    /// Check the descriptor for internal consistency.
    ///
    /// Every listed frequency range must carry a non-empty legal mode set
    /// and a coherent ordering of its bounds. Run once at connection
    /// time; a violation indicates a broken model table, not a runtime
    /// condition.
    pub fn validate(&self) -> Result<()> {
        for (region, plan) in [("Region 1", &self.region1), ("Region 2", &self.region2)] {
            for range in plan.rx.iter().chain(plan.tx.iter()) {
                if range.modes.is_empty() {
                    return Err(Error::InvalidParameter(format!(
                        "{}: {region} range {range} has an empty mode set",
                        self.name
                    )));
                }
                if range.low_hz >= range.high_hz {
                    return Err(Error::InvalidParameter(format!(
                        "{}: {region} range {range} has inverted bounds",
                        self.name
                    )));
                }
            }
        }
        if self.supported_modes.is_empty() {
            return Err(Error::InvalidParameter(format!(
                "{}: no supported modes",
                self.name
            )));
        }
        if self.baud_rate_min > self.baud_rate_max {
            return Err(Error::InvalidParameter(format!(
                "{}: inverted baud rate range",
                self.name
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Shared mode/function/level sets
// ---------------------------------------------------------------------------

/// Full mode complement of the dual-watch D-STAR mobiles.
fn mobile_modes() -> Vec<Mode> {
    vec![
        Mode::Am,
        Mode::AmNarrow,
        Mode::Fm,
        Mode::FmNarrow,
        Mode::DigitalVoice,
    ]
}

/// Functions reachable over CI-V on this family.
fn mobile_functions() -> Vec<Func> {
    vec![Func::DualWatch, Func::Tone, Func::ToneSquelch, Func::Vox]
}

/// Levels reachable over CI-V on this family.
fn mobile_levels() -> Vec<Level> {
    vec![Level::AfGain, Level::Squelch, Level::RfPower, Level::MicGain]
}

/// Shared wide RX coverage: 118–174 MHz (airband + 2m) and 375–550 MHz.
fn mobile_rx_ranges() -> Vec<FreqRange> {
    vec![
        FreqRange::rx(118_000_000, 174_000_000, mobile_modes()),
        FreqRange::rx(375_000_000, 550_000_000, mobile_modes()),
    ]
}

// ---------------------------------------------------------------------------
// Model definitions
// ---------------------------------------------------------------------------

/// ID-5100 model definition.
///
/// The ID-5100 is a 2m/70cm dual-watch D-STAR mobile with a touch-screen
/// controller. Rig control runs over the jack labeled "SP2" (the "Data"
/// port is for firmware updates only).
///
/// Key specifications:
/// - CI-V address: `0x8C`
/// - RX coverage: 118–174 MHz and 375–550 MHz
/// - TX: 144 MHz and 430 MHz amateur bands, region dependent
/// - Dual watch (Main/Sub); no memory access over CI-V (clone mode only)
pub fn id_5100() -> IcomModel {
    IcomModel {
        name: "ID-5100",
        model_id: "0x8C",
        default_civ_address: 0x8C,
        default_baud_rate: 19_200,
        baud_rate_min: 4_800,
        baud_rate_max: 19_200,
        default_timeout: Duration::from_millis(1000),
        dialect: DialectFlags {
            short_frequency_format: false,
            no_vfo_xchg: true,
            dual_watch_split: true,
        },
        region1: BandPlan {
            rx: mobile_rx_ranges(),
            tx: vec![
                FreqRange::tx(144_000_000, 146_000_000, mobile_modes(), 5.0, 25.0),
                FreqRange::tx(430_000_000, 440_000_000, mobile_modes(), 5.0, 25.0),
            ],
        },
        region2: BandPlan {
            rx: mobile_rx_ranges(),
            tx: vec![
                FreqRange::tx(144_000_000, 148_000_000, mobile_modes(), 5.0, 50.0),
                FreqRange::tx(430_000_000, 450_000_000, mobile_modes(), 5.0, 50.0),
            ],
        },
        supported_modes: mobile_modes(),
        functions: mobile_functions(),
        levels: mobile_levels(),
        // No published calibration for this family.
        meter_cal: MeterCal::uncalibrated(),
    }
}

/// ID-4100 model definition.
///
/// Compact sibling of the ID-5100 sharing its CI-V dialect, including
/// the dual-watch band addressing. Differs in the default CI-V address.
pub fn id_4100() -> IcomModel {
    IcomModel {
        name: "ID-4100",
        model_id: "0x9A",
        default_civ_address: 0x9A,
        ..id_5100()
    }
}

/// All models this crate can drive.
pub fn all_models() -> Vec<IcomModel> {
    vec![id_5100(), id_4100()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_5100_basics() {
        let model = id_5100();
        assert_eq!(model.default_civ_address, 0x8C);
        assert_eq!(model.default_baud_rate, 19_200);
        assert!(model.dialect.dual_watch_split);
        model.validate().expect("factory model must validate");
    }

    #[test]
    fn id_4100_shares_dialect() {
        let model = id_4100();
        assert_eq!(model.default_civ_address, 0x9A);
        assert!(model.dialect.no_vfo_xchg);
        model.validate().expect("factory model must validate");
    }

    #[test]
    fn all_models_validate() {
        for model in all_models() {
            model
                .validate()
                .unwrap_or_else(|e| panic!("{} failed validation: {e}", model.name));
        }
    }

    #[test]
    fn region_band_plans_differ() {
        let model = id_5100();
        let r1 = model.capabilities(Region::Region1);
        let r2 = model.capabilities(Region::Region2);
        assert_eq!(r1.tx_ranges[0].high_hz, 146_000_000);
        assert_eq!(r2.tx_ranges[0].high_hz, 148_000_000);
        assert_eq!(r1.max_power_watts, 25.0);
        assert_eq!(r2.max_power_watts, 50.0);
        // RX coverage is shared.
        assert_eq!(r1.rx_ranges, r2.rx_ranges);
    }

    #[test]
    fn capabilities_reflect_dual_watch() {
        let caps = id_5100().capabilities(Region::Region2);
        assert!(caps.has_dual_watch);
        assert!(caps.has_split);
        assert_eq!(caps.supported_modes.len(), 5);
    }

    #[test]
    fn validation_rejects_empty_mode_set() {
        let mut model = id_5100();
        model.region2.tx[0].modes.clear();
        let err = model.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
        assert!(err.to_string().contains("empty mode set"));
    }

    #[test]
    fn validation_rejects_inverted_range() {
        let mut model = id_5100();
        model.region1.rx[0].high_hz = model.region1.rx[0].low_hz;
        assert!(model.validate().is_err());
    }
}
