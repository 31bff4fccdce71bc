//! # civlink -- CI-V control for dual-watch mobile transceivers
//!
//! `civlink` is an asynchronous Rust library for controlling Icom
//! dual-watch D-STAR mobiles (ID-5100, ID-4100) over the CI-V serial
//! protocol. It is designed for mobile dashboards, repeater-site
//! automation, and logging software that needs reliable rig control over
//! a lossy serial link.
//!
//! ## Quick Start
//!
//! ```no_run
//! use civlink::{Rig, Vfo};
//! use civlink::icom::{IcomBuilder, models::id_5100};
//!
//! #[tokio::main]
//! async fn main() -> civlink::Result<()> {
//!     let rig = IcomBuilder::new(id_5100())
//!         .serial_port("/dev/ttyUSB0")
//!         .baud_rate(19_200)
//!         .build()
//!         .await?;
//!
//!     // Put the receive path on the Sub band. Dual watch is switched
//!     // on automatically because Main/Sub addressing requires it.
//!     rig.set_vfo(Vfo::Sub).await?;
//!
//!     let freq = rig.get_frequency(Vfo::Current).await?;
//!     println!("Sub band: {} Hz", freq);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                  | Purpose                                     |
//! |------------------------|---------------------------------------------|
//! | `civlink-core`         | Traits ([`Rig`]), types, events, errors     |
//! | `civlink-transport`    | Serial transport implementation             |
//! | `civlink-icom`         | CI-V protocol engine and rig driver         |
//! | `civlink-test-harness` | Mock transports for protocol testing        |
//! | **`civlink`**          | This facade crate -- re-exports everything  |
//!
//! ## Dual-watch addressing
//!
//! These radios expose two receive paths, Main and Sub, that behave like
//! a conventional VFO A/B pair when dual watch is off. The driver
//! accepts both addressing styles on [`Rig::set_vfo`] and silently
//! toggles dual watch so the firmware always sees the style it expects.
//! Split operation is fixed by the hardware: transmit on Main, receive
//! on Sub; [`Rig::set_split_vfo`] rejects any other pairing.

pub use civlink_core::*;

/// Icom CI-V protocol backend.
///
/// Provides [`IcomRig`](icom::IcomRig) and [`IcomBuilder`](icom::IcomBuilder)
/// for controlling the dual-watch mobile family over CI-V.
pub mod icom {
    pub use civlink_icom::*;
}

/// Physical-layer transports (serial).
pub mod transport {
    pub use civlink_transport::*;
}

/// All rig models this library can drive.
pub fn supported_rigs() -> Vec<icom::models::IcomModel> {
    icom::models::all_models()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_rigs_lists_both_mobiles() {
        let rigs = supported_rigs();
        let names: Vec<&str> = rigs.iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["ID-5100", "ID-4100"]);
        for model in &rigs {
            model.validate().expect("shipped models must validate");
        }
    }
}
