//! Spoofing state, produced samples and the shared state guarded by the engine mutex

use crate::geo_math::Coordinate;
use crate::noise::NoiseModel;
use crate::path::PathTracker;
use crate::scheduler::RunShared;
use crate::transport::TransportationMode;
use crate::EngineConfig;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

/// One reported location: produced per tick and per `modify` call
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpoofedLocationSample {
    pub coordinate: Coordinate,
    /// Degrees clockwise from north, in [0, 360)
    pub course: f64,
    /// Meters per second
    pub speed: f64,
    /// Horizontal accuracy radius in meters
    pub accuracy: f64,
    pub timestamp: SystemTime,
}

impl SpoofedLocationSample {
    /// A sample with no motion
    pub fn at_rest(coordinate: Coordinate, accuracy: f64, timestamp: SystemTime) -> Self {
        Self {
            coordinate,
            course: 0.0,
            speed: 0.0,
            accuracy,
            timestamp,
        }
    }
}

/// Mutable spoofing settings and last reported motion
#[derive(Clone, Debug, PartialEq)]
pub struct SpoofState {
    /// Set by `enable_spoofing`; requires a valid base coordinate
    pub enabled: bool,
    /// User-facing switch, independent from `enabled`
    pub toggle_enabled: bool,
    pub base_coordinate: Coordinate,
    pub mode: TransportationMode,
    pub jitter_enabled: bool,
    /// Jitter amplitude in meters
    pub jitter_amplitude: f64,
    /// Accuracy override in meters; the mode's default is used when unset
    pub accuracy_value: Option<f64>,
    pub last_speed: f64,
    pub last_course: f64,
    pub is_moving: bool,
    /// Apply accuracy jitter even when coordinate jitter is off
    pub position_variations_enabled: bool,
}

impl SpoofState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            enabled: false,
            toggle_enabled: false,
            base_coordinate: Coordinate::default(),
            mode: config.default_mode,
            jitter_enabled: false,
            jitter_amplitude: config.default_jitter_amplitude,
            accuracy_value: None,
            last_speed: 0.0,
            last_course: 0.0,
            is_moving: false,
            position_variations_enabled: false,
        }
    }

    /// Spoofing applies only when both the enable flag and the user toggle are set
    #[inline]
    pub fn is_effective(&self) -> bool {
        self.enabled && self.toggle_enabled
    }

    /// Noise model for coordinates
    pub fn noise(&self) -> NoiseModel {
        NoiseModel::new(self.jitter_enabled, self.jitter_amplitude)
    }

    /// Noise model for accuracy values
    pub fn accuracy_noise(&self) -> NoiseModel {
        NoiseModel::new(
            self.jitter_enabled || self.position_variations_enabled,
            self.jitter_amplitude,
        )
    }

    /// Baseline accuracy before jitter
    pub fn base_accuracy(&self) -> f64 {
        self.accuracy_value
            .unwrap_or_else(|| self.mode.default_accuracy())
    }

    /// Accuracy to report for the next sample
    pub fn reported_accuracy(&self) -> f64 {
        self.accuracy_noise().accuracy_jitter(self.base_accuracy())
    }

    pub fn to_settings(&self) -> PersistedSettings {
        PersistedSettings {
            latitude: self.base_coordinate.latitude,
            longitude: self.base_coordinate.longitude,
            enabled: self.enabled,
            toggle_enabled: self.toggle_enabled,
            mode: self.mode,
            jitter_enabled: self.jitter_enabled,
            jitter_amplitude: self.jitter_amplitude,
            accuracy: self.accuracy_value,
            position_variations_enabled: self.position_variations_enabled,
        }
    }

    /// Overwrite the persisted subset; transient motion fields are untouched
    ///
    /// A stored base coordinate that is out of range disables spoofing.
    pub fn apply_settings(&mut self, settings: &PersistedSettings) {
        let base = Coordinate::new(settings.latitude, settings.longitude);
        if base.is_valid() {
            self.base_coordinate = base;
            self.enabled = settings.enabled;
        } else {
            tracing::warn!(
                latitude = settings.latitude,
                longitude = settings.longitude,
                "Ignoring stored base coordinate out of range; spoofing disabled"
            );
            self.enabled = false;
        }
        self.toggle_enabled = settings.toggle_enabled;
        self.mode = settings.mode;
        self.jitter_enabled = settings.jitter_enabled;
        self.jitter_amplitude = if settings.jitter_amplitude.is_finite() {
            settings.jitter_amplitude.max(0.0)
        } else {
            0.0
        };
        self.accuracy_value = settings.accuracy.filter(|a| a.is_finite() && *a > 0.0);
        self.position_variations_enabled = settings.position_variations_enabled;
    }
}

/// Flat key/value record persisted per profile
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedSettings {
    pub latitude: f64,
    pub longitude: f64,
    pub enabled: bool,
    pub toggle_enabled: bool,
    pub mode: TransportationMode,
    pub jitter_enabled: bool,
    pub jitter_amplitude: f64,
    pub accuracy: Option<f64>,
    pub position_variations_enabled: bool,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        SpoofState::new(&EngineConfig::default()).to_settings()
    }
}

/// Everything the engine mutex guards
#[derive(Debug)]
pub(crate) struct EngineState {
    pub spoof: SpoofState,
    pub tracker: PathTracker,
    /// Most recent sample published by the active run
    pub last_sample: Option<SpoofedLocationSample>,
    /// Control block of the active run, if any
    pub active_run: Option<Arc<RunShared>>,
    /// Identifier handed to the next run
    pub next_run_id: u64,
}

impl EngineState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            spoof: SpoofState::new(config),
            tracker: PathTracker::new(),
            last_sample: None,
            active_run: None,
            next_run_id: 1,
        }
    }

    /// Whether `run_id` is the run currently installed
    #[inline]
    pub fn is_active_run(&self, run_id: u64) -> bool {
        self.active_run.as_ref().is_some_and(|run| run.id() == run_id)
    }

    /// Drop the active run and return to the stationary state
    pub fn clear_run(&mut self) -> Option<Arc<RunShared>> {
        self.spoof.is_moving = false;
        self.spoof.last_speed = 0.0;
        self.last_sample = None;
        self.active_run.take()
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked
///
/// A panic inside a user callback must not take spoofing down with it.
pub(crate) fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned: PoisonError<MutexGuard<'_, T>>| {
        tracing::warn!("Mutex poisoned; recovering");
        poisoned.into_inner()
    })
}
