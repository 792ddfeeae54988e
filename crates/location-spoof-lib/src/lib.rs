//! Location Spoofing Library - Core Engine for Fake GPS Reporting
//!
//! This library computes *what* location, course and speed a device should report
//! while spoofing is active. It either pins the device to a static base coordinate
//! or simulates believable motion along a list of waypoints, adding bounded noise so
//! the readings do not look synthetic.
//!
//! # Architecture
//!
//! - **[`geo_math`]**: Pure distance, bearing and interpolation helpers
//! - **[`NoiseModel`]**: Bounded jitter for coordinates and accuracy
//! - **[`TransportationMode`]**: Speed and accuracy profile per movement mode
//! - **[`PathTracker`]**: Cursor over a [`Path`], advanced by simulated time
//! - **[`MovementScheduler`]**: Cancellable tokio tick loop driving the tracker
//! - **[`SpoofingEngine`]**: Facade used by settings and the interception layer
//! - **[`ProfileStore`]**: Persists engine settings per profile
//!
//! # Concurrency
//!
//! All engine state lives behind a single mutex shared with the tick loop. Every
//! public engine call is synchronous and safe to make from any thread while a
//! movement run is active.

pub mod geo_math;
mod engine;
mod noise;
mod path;
mod scheduler;
mod scope;
mod state;
pub mod storage;
mod transport;

use std::time::Duration;

// Public API exports
pub use engine::SpoofingEngine;
pub use geo_math::Coordinate;
pub use noise::NoiseModel;
pub use path::{
    MAX_SIMPLE_MOVEMENT_SAMPLES, Path, PathCursor, PathTracker, TrackPosition, TrackerState,
    plan_simple_movement,
};
pub use scheduler::{CompletionFn, MovementScheduler, RunHandle, SampleSink};
pub use scope::{AllowList, AppScope};
pub use state::{PersistedSettings, SpoofState, SpoofedLocationSample};
pub use storage::{ProfileStore, StorageError};
pub use transport::TransportationMode;

/// Error types for the spoofing engine
#[derive(Debug, thiserror::Error)]
pub enum SpoofError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("A movement run is already active")]
    AlreadyMoving,

    #[error("Invalid speed: {0} m/s (must be positive and finite)")]
    InvalidSpeed(f64),

    #[error("Invalid coordinate: ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Movement would need {needed} samples, more than the limit of {limit}")]
    TooManySamples { needed: f64, limit: usize },

    #[error("No tokio runtime available to drive movement")]
    NoRuntime,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SpoofError>;

/// Configuration for a spoofing engine instance
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Interval between two ticks of the movement simulation.
    /// Default: 250ms
    pub tick_interval: Duration,
    /// Transportation mode used until settings say otherwise.
    /// Default: walking
    pub default_mode: TransportationMode,
    /// Jitter amplitude in meters used until settings say otherwise.
    /// Default: 3.0
    pub default_jitter_amplitude: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(250),
            default_mode: TransportationMode::Walking,
            default_jitter_amplitude: 3.0,
        }
    }
}
