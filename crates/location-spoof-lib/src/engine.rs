//! SpoofingEngine - facade used by settings and by the interception layer
//!
//! This module provides the high-level API for enabling spoofing, pinning a base
//! coordinate, driving movement along a path and turning a real location reading
//! into the one that should be reported.

use crate::geo_math::{self, Coordinate};
use crate::path::{Path, plan_simple_movement};
use crate::scheduler::{CompletionFn, MovementScheduler, RunHandle, SampleSink};
use crate::scope::AppScope;
use crate::state::{EngineState, PersistedSettings, SpoofState, SpoofedLocationSample, lock_recover};
use crate::transport::TransportationMode;
use crate::{EngineConfig, Result, SpoofError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tokio::runtime::Handle;
use tokio::sync::watch;

/// Spacing of samples produced by [`SpoofingEngine::calculate_simple_movement`]
const SIMPLE_MOVEMENT_INTERVAL: Duration = Duration::from_secs(1);

/// Location spoofing engine
///
/// One instance is constructed at process start with its collaborators injected and
/// shared by reference afterwards. All methods are synchronous and may be called
/// from any thread, including while a movement run is ticking.
pub struct SpoofingEngine {
    config: EngineConfig,
    state: Arc<Mutex<EngineState>>,
    scheduler: MovementScheduler,
    scope: Arc<dyn AppScope>,
    /// Cached answers of the scope collaborator, by bundle identifier
    scope_cache: Mutex<HashMap<String, bool>>,
    samples: Arc<watch::Sender<Option<SpoofedLocationSample>>>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl SpoofingEngine {
    /// Create an engine bound to the tokio runtime of the calling context
    pub fn new(config: EngineConfig, scope: Arc<dyn AppScope>) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| SpoofError::NoRuntime)?;
        Ok(Self::with_handle(config, scope, handle))
    }

    /// Create an engine that runs its movement loop on `handle`
    pub fn with_handle(config: EngineConfig, scope: Arc<dyn AppScope>, handle: Handle) -> Self {
        let scheduler = MovementScheduler::new(handle, config.tick_interval);
        let (samples, _) = watch::channel(None);
        Self {
            state: Arc::new(Mutex::new(EngineState::new(&config))),
            config,
            scheduler,
            scope,
            scope_cache: Mutex::new(HashMap::new()),
            samples: Arc::new(samples),
        }
    }

    /// Create an engine and load previously persisted settings into it
    pub fn with_settings(
        config: EngineConfig,
        scope: Arc<dyn AppScope>,
        settings: &PersistedSettings,
    ) -> Result<Self> {
        let engine = Self::new(config, scope)?;
        engine.apply_settings(settings);
        Ok(engine)
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // === Core switches ===

    pub fn is_spoofing_enabled(&self) -> bool {
        lock_recover(&self.state).spoof.enabled
    }

    /// Pin spoofing to `coordinate`; does not start any movement
    pub fn enable_spoofing(&self, coordinate: Coordinate) -> Result<()> {
        if !coordinate.is_valid() {
            return Err(SpoofError::InvalidCoordinate {
                latitude: coordinate.latitude,
                longitude: coordinate.longitude,
            });
        }
        let mut guard = lock_recover(&self.state);
        guard.spoof.base_coordinate = coordinate;
        guard.spoof.enabled = true;
        tracing::info!(
            latitude = coordinate.latitude,
            longitude = coordinate.longitude,
            "Location spoofing enabled"
        );
        Ok(())
    }

    /// Turn spoofing off and cancel any movement run
    pub fn disable_spoofing(&self) {
        lock_recover(&self.state).spoof.enabled = false;
        MovementScheduler::stop(&self.state);
        tracing::info!("Location spoofing disabled");
    }

    pub fn is_spoofing_toggle_enabled(&self) -> bool {
        lock_recover(&self.state).spoof.toggle_enabled
    }

    pub fn enable_spoofing_toggle(&self) {
        lock_recover(&self.state).spoof.toggle_enabled = true;
    }

    pub fn disable_spoofing_toggle(&self) {
        lock_recover(&self.state).spoof.toggle_enabled = false;
    }

    // === Location modification ===

    /// Location to report in place of `real`
    ///
    /// Unchanged when spoofing is not effective. While moving, the latest sample of
    /// the active run. Otherwise the base coordinate with jitter and no motion.
    pub fn modify(&self, real: SpoofedLocationSample) -> SpoofedLocationSample {
        let mut guard = lock_recover(&self.state);
        if !guard.spoof.is_effective() {
            return real;
        }
        if guard.spoof.is_moving {
            if let Some(sample) = guard.last_sample {
                return sample;
            }
            let position = guard.tracker.position();
            return SpoofedLocationSample {
                coordinate: position.coordinate,
                course: geo_math::normalize_course(position.course),
                speed: guard.spoof.last_speed,
                accuracy: guard.spoof.reported_accuracy(),
                timestamp: real.timestamp,
            };
        }

        let base = guard.spoof.base_coordinate;
        let sample = realistic_sample(&guard.spoof, base, real.timestamp);
        guard.spoof.last_speed = 0.0;
        guard.spoof.last_course = 0.0;
        sample
    }

    /// A stationary sample around `coordinate`: jitter and accuracy per current settings
    pub fn create_realistic_spoofed_location(&self, coordinate: Coordinate) -> SpoofedLocationSample {
        let guard = lock_recover(&self.state);
        realistic_sample(&guard.spoof, coordinate, SystemTime::now())
    }

    /// Latitude currently reported: the moving position or the base coordinate
    pub fn spoofed_latitude(&self) -> f64 {
        self.spoofed_coordinate().latitude
    }

    /// Longitude currently reported: the moving position or the base coordinate
    pub fn spoofed_longitude(&self) -> f64 {
        self.spoofed_coordinate().longitude
    }

    pub fn spoofed_coordinate(&self) -> Coordinate {
        let guard = lock_recover(&self.state);
        if guard.spoof.is_moving {
            guard.tracker.position().coordinate
        } else {
            guard.spoof.base_coordinate
        }
    }

    // === App scoping ===

    /// Whether `bundle_id` should receive spoofed locations
    ///
    /// Answers of the scope collaborator are cached until [`Self::clear_scope_cache`].
    pub fn should_spoof_app(&self, bundle_id: &str) -> bool {
        if let Some(&cached) = lock_recover(&self.scope_cache).get(bundle_id) {
            return cached;
        }
        let in_scope = self.scope.is_application_in_scope(bundle_id);
        lock_recover(&self.scope_cache).insert(bundle_id.to_string(), in_scope);
        tracing::debug!(bundle_id, in_scope, "Resolved app scope");
        in_scope
    }

    /// Forget cached scope answers, e.g. after the allow-list changed
    pub fn clear_scope_cache(&self) {
        lock_recover(&self.scope_cache).clear();
    }

    // === Advanced settings ===

    pub fn transportation_mode(&self) -> TransportationMode {
        lock_recover(&self.state).spoof.mode
    }

    pub fn set_transportation_mode(&self, mode: TransportationMode) {
        lock_recover(&self.state).spoof.mode = mode;
        tracing::debug!(%mode, "Transportation mode changed");
    }

    /// Highest speed the current mode reports, in m/s
    pub fn max_movement_speed(&self) -> f64 {
        self.transportation_mode().max_speed()
    }

    /// Baseline accuracy in meters: the override, or the mode's default
    pub fn accuracy_value(&self) -> f64 {
        lock_recover(&self.state).spoof.base_accuracy()
    }

    /// Override the reported accuracy; a non-positive value restores the mode default
    pub fn set_accuracy_value(&self, accuracy: f64) {
        let value = (accuracy.is_finite() && accuracy > 0.0).then_some(accuracy);
        lock_recover(&self.state).spoof.accuracy_value = value;
    }

    pub fn jitter_enabled(&self) -> bool {
        lock_recover(&self.state).spoof.jitter_enabled
    }

    pub fn set_jitter_enabled(&self, enabled: bool) {
        lock_recover(&self.state).spoof.jitter_enabled = enabled;
    }

    /// Jitter amplitude in meters
    pub fn jitter_amount(&self) -> f64 {
        lock_recover(&self.state).spoof.jitter_amplitude
    }

    pub fn set_jitter_amplitude(&self, meters: f64) {
        let meters = if meters.is_finite() { meters.max(0.0) } else { 0.0 };
        lock_recover(&self.state).spoof.jitter_amplitude = meters;
    }

    pub fn position_variations_enabled(&self) -> bool {
        lock_recover(&self.state).spoof.position_variations_enabled
    }

    pub fn set_position_variations_enabled(&self, enabled: bool) {
        lock_recover(&self.state).spoof.position_variations_enabled = enabled;
    }

    pub fn last_reported_speed(&self) -> f64 {
        lock_recover(&self.state).spoof.last_speed
    }

    pub fn last_reported_course(&self) -> f64 {
        lock_recover(&self.state).spoof.last_course
    }

    /// Snapshot of the whole spoofing state
    pub fn spoof_state(&self) -> SpoofState {
        lock_recover(&self.state).spoof.clone()
    }

    // === Persistence ===

    /// The persisted subset of the state, to hand to a [`crate::ProfileStore`]
    pub fn settings(&self) -> PersistedSettings {
        lock_recover(&self.state).spoof.to_settings()
    }

    /// Load settings, e.g. after switching profiles
    pub fn apply_settings(&self, settings: &PersistedSettings) {
        let disable = {
            let mut guard = lock_recover(&self.state);
            guard.spoof.apply_settings(settings);
            !guard.spoof.enabled
        };
        if disable {
            MovementScheduler::stop(&self.state);
        }
    }

    // === Movement ===

    /// Straight-line samples from `start` to `end` at `speed`, one per second
    pub fn calculate_simple_movement(
        &self,
        start: Coordinate,
        end: Coordinate,
        speed: f64,
    ) -> Result<Vec<SpoofedLocationSample>> {
        let (mode, accuracy) = {
            let guard = lock_recover(&self.state);
            (guard.spoof.mode, guard.spoof.base_accuracy())
        };
        let mut samples =
            plan_simple_movement(start, end, speed, SIMPLE_MOVEMENT_INTERVAL, accuracy)?;
        for sample in &mut samples {
            sample.speed = mode.clamp_speed(sample.speed);
        }
        Ok(samples)
    }

    /// Start moving along `waypoints` at `speed` m/s from waypoint `start_index`
    ///
    /// `on_complete` fires exactly once: `true` when the last waypoint is reached,
    /// `false` when the run is stopped first. Fails with `AlreadyMoving` while a run
    /// is active, leaving that run untouched.
    pub fn start_movement_along_path(
        &self,
        waypoints: Vec<Coordinate>,
        speed: f64,
        start_index: usize,
        on_complete: Option<CompletionFn>,
    ) -> Result<RunHandle> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(SpoofError::InvalidSpeed(speed));
        }
        let path = Path::new(waypoints)?;
        self.start_movement(path, speed, start_index, on_complete)
    }

    /// Same as [`Self::start_movement_along_path`] for an already built path
    pub fn start_movement(
        &self,
        path: Arc<Path>,
        speed: f64,
        start_index: usize,
        on_complete: Option<CompletionFn>,
    ) -> Result<RunHandle> {
        let samples = self.samples.clone();
        let sink: SampleSink = Arc::new(move |sample| {
            samples.send_replace(Some(sample));
        });
        let handle =
            self.scheduler
                .start(&self.state, path, speed, start_index, Some(sink), on_complete)?;
        tracing::info!(run_id = handle.id(), speed, start_index, "Movement along path started");
        Ok(handle)
    }

    /// Cancel the active run, if any; the device stays where it stopped
    pub fn stop_movement_along_path(&self) -> bool {
        let stopped = MovementScheduler::stop(&self.state);
        if stopped {
            tracing::info!("Movement along path stopped");
        }
        stopped
    }

    pub fn is_currently_moving(&self) -> bool {
        lock_recover(&self.state).spoof.is_moving
    }

    /// Seconds left on the active path at the run's speed; 0 when not moving
    pub fn estimated_time_to_complete_current_path(&self) -> f64 {
        let guard = lock_recover(&self.state);
        if !guard.spoof.is_moving {
            return 0.0;
        }
        guard
            .tracker
            .estimated_seconds_to_complete(guard.tracker.speed())
    }

    /// Waypoints of the active run
    pub fn current_path(&self) -> Option<Vec<Coordinate>> {
        let guard = lock_recover(&self.state);
        if !guard.spoof.is_moving {
            return None;
        }
        guard.tracker.path().map(|path| path.waypoints().to_vec())
    }

    /// Index of the waypoint starting the active segment
    pub fn current_path_index(&self) -> Option<usize> {
        let guard = lock_recover(&self.state);
        guard
            .spoof
            .is_moving
            .then(|| guard.tracker.cursor().current_index)
    }

    /// Receiver of every sample published by movement runs
    pub fn subscribe(&self) -> watch::Receiver<Option<SpoofedLocationSample>> {
        self.samples.subscribe()
    }
}

impl Drop for SpoofingEngine {
    fn drop(&mut self) {
        // Runs must not outlive the engine; their completion reports `false`
        MovementScheduler::stop(&self.state);
    }
}

/// Stationary sample at `coordinate` shaped by the current noise and accuracy settings
fn realistic_sample(
    spoof: &SpoofState,
    coordinate: Coordinate,
    timestamp: SystemTime,
) -> SpoofedLocationSample {
    SpoofedLocationSample::at_rest(
        spoof.noise().apply(coordinate),
        spoof.reported_accuracy(),
        timestamp,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AllowList;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn engine() -> SpoofingEngine {
        let scope: Arc<dyn AppScope> = Arc::new(AllowList::new(["com.example.maps"]));
        SpoofingEngine::new(EngineConfig::default(), scope).unwrap()
    }

    fn real_location() -> SpoofedLocationSample {
        SpoofedLocationSample {
            coordinate: Coordinate::new(51.5074, -0.1278),
            course: 45.0,
            speed: 1.2,
            accuracy: 4.0,
            timestamp: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn test_toggle_off_returns_real_location() {
        let engine = engine();
        engine.enable_spoofing(Coordinate::new(37.0, -122.0)).unwrap();
        assert!(engine.is_spoofing_enabled());
        assert!(!engine.is_spoofing_toggle_enabled());

        let real = real_location();
        assert_eq!(engine.modify(real), real);
    }

    #[tokio::test]
    async fn test_static_spoof_without_jitter_is_exact() {
        let engine = engine();
        engine.enable_spoofing(Coordinate::new(37.0, -122.0)).unwrap();
        engine.enable_spoofing_toggle();
        engine.set_jitter_enabled(false);

        let real = real_location();
        let spoofed = engine.modify(real);
        assert_eq!(spoofed.coordinate, Coordinate::new(37.0, -122.0));
        assert_eq!(spoofed.speed, 0.0);
        assert_eq!(spoofed.course, 0.0);
        assert_eq!(spoofed.accuracy, TransportationMode::Walking.default_accuracy());
        assert_eq!(spoofed.timestamp, real.timestamp);
    }

    #[tokio::test]
    async fn test_toggle_without_enable_returns_real() {
        let engine = engine();
        engine.enable_spoofing_toggle();
        let real = real_location();
        assert_eq!(engine.modify(real), real);
    }

    #[tokio::test]
    async fn test_invalid_base_coordinate_rejected() {
        let engine = engine();
        let result = engine.enable_spoofing(Coordinate::new(100.0, 0.0));
        assert!(matches!(result, Err(SpoofError::InvalidCoordinate { .. })));
        assert!(!engine.is_spoofing_enabled());
    }

    #[tokio::test]
    async fn test_jitter_stays_near_base() {
        let engine = engine();
        let base = Coordinate::new(37.0, -122.0);
        engine.enable_spoofing(base).unwrap();
        engine.enable_spoofing_toggle();
        engine.set_jitter_enabled(true);
        engine.set_jitter_amplitude(4.0);

        for _ in 0..100 {
            let spoofed = engine.modify(real_location());
            assert!(crate::geo_math::distance_meters(base, spoofed.coordinate) < 6.0);
            let default = TransportationMode::Walking.default_accuracy();
            assert!(spoofed.accuracy >= default * 0.79 && spoofed.accuracy <= default * 1.21);
        }
    }

    #[tokio::test]
    async fn test_accuracy_override_and_mode() {
        let engine = engine();
        engine.set_transportation_mode(TransportationMode::Driving);
        assert_eq!(engine.max_movement_speed(), TransportationMode::Driving.max_speed());
        assert_eq!(engine.accuracy_value(), TransportationMode::Driving.default_accuracy());

        engine.set_accuracy_value(30.0);
        assert_eq!(engine.accuracy_value(), 30.0);
        engine.set_accuracy_value(-1.0);
        assert_eq!(engine.accuracy_value(), TransportationMode::Driving.default_accuracy());
    }

    #[tokio::test]
    async fn test_should_spoof_app_caches_answers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scope: Arc<dyn AppScope> = {
            let calls = calls.clone();
            Arc::new(move |bundle_id: &str| {
                calls.fetch_add(1, Ordering::SeqCst);
                bundle_id == "com.example.maps"
            })
        };
        let engine = SpoofingEngine::new(EngineConfig::default(), scope).unwrap();

        assert!(engine.should_spoof_app("com.example.maps"));
        assert!(engine.should_spoof_app("com.example.maps"));
        assert!(!engine.should_spoof_app("com.example.bank"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        engine.clear_scope_cache();
        assert!(engine.should_spoof_app("com.example.maps"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_start_rejects_bad_input() {
        let engine = engine();
        let two = vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.01)];

        assert!(matches!(
            engine.start_movement_along_path(two.clone(), 0.0, 0, None),
            Err(SpoofError::InvalidSpeed(_))
        ));
        assert!(matches!(
            engine.start_movement_along_path(two[..1].to_vec(), 5.0, 0, None),
            Err(SpoofError::InvalidPath(_))
        ));
        assert!(matches!(
            engine.start_movement_along_path(two, 5.0, 3, None),
            Err(SpoofError::InvalidPath(_))
        ));
        assert!(!engine.is_currently_moving());
        assert_eq!(engine.estimated_time_to_complete_current_path(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stationary_mode_keeps_course() {
        let engine = engine();
        engine.enable_spoofing(Coordinate::new(0.0, 0.0)).unwrap();
        engine.enable_spoofing_toggle();
        engine.set_transportation_mode(TransportationMode::Stationary);

        let path = vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.01)];
        engine.start_movement_along_path(path, 2.0, 0, None).unwrap();
        tokio::time::sleep(Duration::from_millis(1_100)).await;

        let spoofed = engine.modify(real_location());
        assert_eq!(spoofed.speed, 0.0);
        assert!((spoofed.course - 90.0).abs() < 1e-6);
        assert!((engine.last_reported_course() - 90.0).abs() < 1e-6);
        // Position still advances at the requested speed
        assert!(spoofed.coordinate.longitude > 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_modify_follows_moving_run() {
        let engine = engine();
        engine.enable_spoofing(Coordinate::new(37.0, -122.0)).unwrap();
        engine.enable_spoofing_toggle();

        let path = vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.01)];
        engine.start_movement_along_path(path.clone(), 2.0, 0, None).unwrap();
        assert!(engine.is_currently_moving());
        assert_eq!(engine.current_path(), Some(path));
        assert_eq!(engine.current_path_index(), Some(0));

        tokio::time::sleep(Duration::from_millis(2_100)).await;
        let spoofed = engine.modify(real_location());
        assert!(spoofed.coordinate.longitude > 0.0);
        assert!(spoofed.coordinate.longitude < 0.01);
        assert!((spoofed.course - 90.0).abs() < 1e-6);
        assert_eq!(spoofed.speed, 2.0);
        assert_eq!(engine.last_reported_speed(), 2.0);
        assert_eq!(engine.spoofed_coordinate().latitude, 0.0);

        let eta = engine.estimated_time_to_complete_current_path();
        assert!(eta > 500.0 && eta < 556.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_keeps_device_where_it_stopped() {
        let engine = engine();
        engine.enable_spoofing(Coordinate::new(37.0, -122.0)).unwrap();
        engine.enable_spoofing_toggle();

        let path = vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.01)];
        engine.start_movement_along_path(path, 2.0, 0, None).unwrap();
        tokio::time::sleep(Duration::from_millis(1_050)).await;

        assert!(engine.stop_movement_along_path());
        assert!(!engine.stop_movement_along_path());
        assert!(!engine.is_currently_moving());
        assert_eq!(engine.estimated_time_to_complete_current_path(), 0.0);
        assert_eq!(engine.last_reported_speed(), 0.0);

        let spoofed = engine.modify(real_location());
        assert!(spoofed.coordinate.longitude > 0.0);
        assert_eq!(spoofed.speed, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_spoofing_cancels_run() {
        let engine = engine();
        engine.enable_spoofing(Coordinate::new(37.0, -122.0)).unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        let on_complete: CompletionFn = Box::new(move |completed| {
            let _ = tx.send(completed);
        });

        let path = vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.01)];
        engine
            .start_movement_along_path(path, 2.0, 0, Some(on_complete))
            .unwrap();
        engine.disable_spoofing();

        assert!(!rx.await.unwrap());
        assert!(!engine.is_currently_moving());
        assert!(!engine.is_spoofing_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_receives_samples() {
        let engine = engine();
        let mut rx = engine.subscribe();
        let path = vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.001)];
        engine.start_movement_along_path(path, 2.0, 0, None).unwrap();

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_some());
    }

    #[tokio::test]
    async fn test_settings_roundtrip() {
        let engine = engine();
        engine.enable_spoofing(Coordinate::new(48.8566, 2.3522)).unwrap();
        engine.enable_spoofing_toggle();
        engine.set_transportation_mode(TransportationMode::Stationary);
        engine.set_jitter_enabled(true);
        let settings = engine.settings();

        let other = self::engine();
        other.apply_settings(&settings);
        assert_eq!(other.settings(), settings);
        assert!(other.is_spoofing_enabled());
        assert_eq!(other.spoofed_coordinate(), Coordinate::new(48.8566, 2.3522));
    }

    #[tokio::test]
    async fn test_calculate_simple_movement_respects_mode() {
        let engine = engine();
        engine.set_transportation_mode(TransportationMode::Walking);
        let samples = engine
            .calculate_simple_movement(Coordinate::new(0.0, 0.0), Coordinate::new(0.001, 0.0), 10.0)
            .unwrap();
        assert!(samples.len() > 2);
        assert!(samples.iter().all(|s| s.speed <= TransportationMode::Walking.max_speed()));
    }

    #[tokio::test]
    async fn test_calculate_simple_movement_tiny_speed_is_an_error() {
        let engine = engine();
        let result = engine.calculate_simple_movement(
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 1.0),
            1e-6,
        );
        assert!(matches!(result, Err(SpoofError::TooManySamples { .. })));
    }

    #[test]
    fn test_new_requires_runtime() {
        let scope: Arc<dyn AppScope> = Arc::new(AllowList::default());
        assert!(matches!(
            SpoofingEngine::new(EngineConfig::default(), scope),
            Err(SpoofError::NoRuntime)
        ));
    }
}
