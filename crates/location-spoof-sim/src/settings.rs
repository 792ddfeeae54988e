use clap::Parser;
use location_spoof_lib::{Coordinate, EngineConfig, TransportationMode};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Location Spoof Simulator - drives the spoofing engine and prints the locations it reports
pub struct Settings {
    /// GPX file whose track points form the path to follow
    #[clap(short, long, value_name = "FILE")]
    pub gpx: Option<PathBuf>,

    /// Waypoint as "lat,lon"; repeat to build a path (ignored when --gpx is given)
    #[clap(short, long = "waypoint", value_name = "LAT,LON", value_parser = parse_coordinate)]
    pub waypoints: Vec<Coordinate>,

    /// Static spoofed location as "lat,lon"
    #[clap(short, long, value_name = "LAT,LON", value_parser = parse_coordinate)]
    pub base: Option<Coordinate>,

    /// Movement speed in meters per second
    #[clap(short, long, default_value = "5.0")]
    pub speed: f64,

    /// Waypoint index to start moving from
    #[clap(long, default_value = "0")]
    pub start_index: usize,

    /// Transportation mode (stationary, walking, driving); keeps the stored one when omitted
    #[clap(short, long)]
    pub mode: Option<TransportationMode>,

    /// Enable coordinate jitter
    #[clap(long)]
    pub jitter: bool,

    /// Jitter amplitude in meters
    #[clap(long)]
    pub jitter_amplitude: Option<f64>,

    /// Reported accuracy in meters (mode default when omitted)
    #[clap(long)]
    pub accuracy: Option<f64>,

    /// Simulation tick interval in milliseconds
    #[clap(long, default_value = "250")]
    pub tick_ms: u64,

    /// Stop the movement after this many seconds
    #[clap(short, long)]
    pub duration: Option<f64>,

    /// Settings file (per-user config directory when omitted)
    #[clap(long, value_name = "FILE")]
    pub storage: Option<PathBuf>,

    /// Profile whose settings are loaded and saved
    #[clap(short, long, default_value = "default")]
    pub profile: String,

    /// Ignore previously persisted settings and start fresh
    #[clap(long, default_value = "false")]
    pub ignore_persisted: bool,

    /// Do not write settings back when done
    #[clap(long, default_value = "false")]
    pub no_save: bool,

    /// Print samples as JSON lines instead of log records
    #[clap(long, default_value = "false")]
    pub json: bool,
}

impl Settings {
    /// Parse the command line, exiting with usage on error
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            tick_interval: Duration::from_millis(self.tick_ms.max(1)),
            ..EngineConfig::default()
        }
    }
}

/// Parse "lat,lon" into a validated coordinate
fn parse_coordinate(s: &str) -> Result<Coordinate, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON but got '{s}'"))?;
    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude '{lat}': {e}"))?;
    let longitude: f64 = lon
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude '{lon}': {e}"))?;
    let coordinate = Coordinate::new(latitude, longitude);
    if !coordinate.is_valid() {
        return Err(format!("coordinate out of range: {s}"));
    }
    Ok(coordinate)
}
