//! Location Spoof Simulator
//!
//! Command line harness around [`location_spoof_lib::SpoofingEngine`]: loads a
//! profile, pins or moves the spoofed location and prints every reported sample.

pub mod logging;
mod run;
mod settings;

pub use run::{SimError, run};
pub use settings::Settings;
