//! Movement scheduler: the tick loop that drives a [`PathTracker`] along a path
//!
//! One tokio task runs per movement run. Each tick advances the tracker by the tick
//! interval, shapes the result through the transportation profile and noise model,
//! stores it as the engine's latest sample and publishes it.
//!
//! Every run carries a control block ([`RunShared`]) whose completion callback sits
//! in a `Mutex<Option<_>>`. Natural completion and cancellation both decide under the
//! engine mutex whether they own the end of the run, and the callback is taken out of
//! the option before it is called, so it fires exactly once with either `true` or
//! `false`.
//!
//! [`PathTracker`]: crate::PathTracker

use crate::geo_math;
use crate::path::{Path, TrackPosition};
use crate::state::{EngineState, SpoofedLocationSample, lock_recover};
use crate::{Result, SpoofError};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, SystemTime};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::time::{Instant, MissedTickBehavior};

/// Completion notification; receives `true` when the path end was reached and
/// `false` when the run was cancelled
pub type CompletionFn = Box<dyn FnOnce(bool) + Send + 'static>;

/// Receives every sample published by a run
pub type SampleSink = Arc<dyn Fn(SpoofedLocationSample) + Send + Sync + 'static>;

/// Shortest tick the scheduler accepts
const MIN_TICK: Duration = Duration::from_millis(1);

/// Control block shared by a run's task, its handle and the engine state
pub(crate) struct RunShared {
    id: u64,
    cancelled: AtomicBool,
    wake: Notify,
    completion: Mutex<Option<CompletionFn>>,
}

impl RunShared {
    fn new(id: u64, completion: Option<CompletionFn>) -> Self {
        Self {
            id,
            cancelled: AtomicBool::new(false),
            wake: Notify::new(),
            completion: Mutex::new(completion),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fire the completion callback if nobody did yet
    fn finish(&self, completed: bool) -> bool {
        let callback = lock_recover(&self.completion).take();
        match callback {
            Some(callback) => {
                callback(completed);
                true
            }
            None => false,
        }
    }

    /// Flag the run as cancelled, wake its loop and report `false`
    ///
    /// Must only be called by whoever removed the run from the engine state.
    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.wake.notify_one();
        self.finish(false);
    }
}

impl fmt::Debug for RunShared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunShared")
            .field("id", &self.id)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Caller-side handle of one movement run
#[derive(Clone, Debug)]
pub struct RunHandle {
    run: Arc<RunShared>,
    state: Weak<Mutex<EngineState>>,
}

impl RunHandle {
    /// Identifier of this run, unique per engine
    pub fn id(&self) -> u64 {
        self.run.id()
    }

    /// Whether this run is still the engine's active run
    pub fn is_active(&self) -> bool {
        self.state
            .upgrade()
            .is_some_and(|state| lock_recover(&state).is_active_run(self.run.id()))
    }

    /// Cancel this run if it is still active
    ///
    /// The loop stops at its next wake-up and the completion callback receives
    /// `false`. Returns `false` when the run already ended; the call is then a no-op.
    pub fn cancel(&self) -> bool {
        let Some(state) = self.state.upgrade() else {
            return false;
        };
        let removed = {
            let mut guard = lock_recover(&state);
            if !guard.is_active_run(self.run.id()) {
                return false;
            }
            end_run_cancelled(&mut guard)
        };
        match removed {
            Some(run) => {
                tracing::debug!(run_id = run.id(), "Movement run cancelled");
                run.cancel();
                true
            }
            None => false,
        }
    }
}

/// Cancel the tracker, keep the device where it stopped and detach the run
fn end_run_cancelled(state: &mut EngineState) -> Option<Arc<RunShared>> {
    state.tracker.cancel();
    let stopped_at = state.tracker.position().coordinate;
    if stopped_at.is_valid() {
        state.spoof.base_coordinate = stopped_at;
    }
    state.clear_run()
}

/// What a single tick produced
enum TickOutcome {
    /// The run is no longer installed; someone else ended it
    Stale,
    Sample(SpoofedLocationSample),
    Completed(SpoofedLocationSample),
}

/// Drives movement runs on a tokio runtime at a fixed tick interval
#[derive(Clone, Debug)]
pub struct MovementScheduler {
    handle: Handle,
    tick_interval: Duration,
}

impl MovementScheduler {
    pub fn new(handle: Handle, tick_interval: Duration) -> Self {
        Self {
            handle,
            tick_interval: tick_interval.max(MIN_TICK),
        }
    }

    /// Scheduler bound to the runtime of the calling context
    pub fn current(tick_interval: Duration) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| SpoofError::NoRuntime)?;
        Ok(Self::new(handle, tick_interval))
    }

    #[inline]
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Validate and install a run, then spawn its tick loop
    ///
    /// Installation happens under the state lock: on error nothing changes and any
    /// active run continues untouched.
    pub(crate) fn start(
        &self,
        state: &Arc<Mutex<EngineState>>,
        path: Arc<Path>,
        speed: f64,
        start_index: usize,
        on_sample: Option<SampleSink>,
        on_complete: Option<CompletionFn>,
    ) -> Result<RunHandle> {
        #[cfg(feature = "profiling")]
        profiling::scope!("scheduler::start");

        let (run, first_sample) = {
            let mut guard = lock_recover(state);
            if guard.spoof.is_moving || guard.active_run.is_some() {
                return Err(SpoofError::AlreadyMoving);
            }
            guard.tracker.start(path, speed, start_index)?;

            let id = guard.next_run_id;
            guard.next_run_id += 1;
            let run = Arc::new(RunShared::new(id, on_complete));

            let position = guard.tracker.position();
            let spoof = &guard.spoof;
            let sample = SpoofedLocationSample {
                coordinate: spoof.noise().apply(position.coordinate),
                course: geo_math::normalize_course(position.course),
                speed: spoof.mode.clamp_speed(speed),
                accuracy: spoof.reported_accuracy(),
                timestamp: SystemTime::now(),
            };

            guard.spoof.is_moving = true;
            guard.spoof.last_speed = sample.speed;
            guard.spoof.last_course = sample.course;
            guard.last_sample = Some(sample);
            guard.active_run = Some(run.clone());
            (run, sample)
        };

        tracing::debug!(
            run_id = run.id(),
            speed,
            start_index,
            tick_ms = self.tick_interval.as_millis() as u64,
            "Movement run started"
        );
        if let Some(sink) = &on_sample {
            sink(first_sample);
        }

        self.handle.spawn(run_loop(
            Arc::downgrade(state),
            run.clone(),
            self.tick_interval,
            on_sample,
        ));

        Ok(RunHandle {
            run,
            state: Arc::downgrade(state),
        })
    }

    /// Cancel whichever run is active; returns `false` when nothing was moving
    pub(crate) fn stop(state: &Arc<Mutex<EngineState>>) -> bool {
        let removed = {
            let mut guard = lock_recover(state);
            if guard.active_run.is_none() && !guard.spoof.is_moving {
                return false;
            }
            end_run_cancelled(&mut guard)
        };
        match removed {
            Some(run) => {
                tracing::debug!(run_id = run.id(), "Movement run stopped");
                run.cancel();
                true
            }
            None => false,
        }
    }
}

async fn run_loop(
    state: Weak<Mutex<EngineState>>,
    run: Arc<RunShared>,
    tick: Duration,
    on_sample: Option<SampleSink>,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + tick, tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let tick_seconds = tick.as_secs_f64();

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = run.wake.notified() => {}
        }
        if run.is_cancelled() {
            tracing::trace!(run_id = run.id(), "Tick loop observed cancellation");
            return;
        }

        let Some(state) = state.upgrade() else {
            // The engine is gone; nothing can observe this run any more
            tracing::debug!(run_id = run.id(), "Engine dropped during movement run");
            run.finish(false);
            return;
        };
        let outcome = {
            let mut guard = lock_recover(&state);
            tick_once(&mut guard, run.id(), tick_seconds)
        };
        drop(state);

        match outcome {
            TickOutcome::Stale => return,
            TickOutcome::Sample(sample) => {
                if let Some(sink) = &on_sample {
                    sink(sample);
                }
            }
            TickOutcome::Completed(sample) => {
                if let Some(sink) = &on_sample {
                    sink(sample);
                }
                tracing::debug!(run_id = run.id(), "Movement run completed");
                run.finish(true);
                return;
            }
        }
    }
}

/// Advance the tracker one tick and record the resulting sample
fn tick_once(state: &mut EngineState, run_id: u64, elapsed_seconds: f64) -> TickOutcome {
    #[cfg(feature = "profiling")]
    profiling::scope!("scheduler::tick");

    if !state.is_active_run(run_id) {
        return TickOutcome::Stale;
    }
    if !state.tracker.is_moving() {
        // Installed run without a moving tracker: end it as completed
        tracing::warn!(run_id, tracker = ?state.tracker.state(), "Tracker stopped outside the scheduler");
        let position = state.tracker.position();
        return complete_run(state, position);
    }

    let position = state.tracker.advance(elapsed_seconds);
    if !state.tracker.is_moving() {
        return complete_run(state, position);
    }

    let spoof = &state.spoof;
    let sample = SpoofedLocationSample {
        coordinate: spoof.noise().apply(position.coordinate),
        course: geo_math::normalize_course(position.course),
        speed: spoof.mode.clamp_speed(state.tracker.speed()),
        accuracy: spoof.reported_accuracy(),
        timestamp: SystemTime::now(),
    };
    tracing::trace!(
        run_id,
        latitude = sample.coordinate.latitude,
        longitude = sample.coordinate.longitude,
        course = sample.course,
        speed = sample.speed,
        "Movement tick"
    );

    state.spoof.last_speed = sample.speed;
    state.spoof.last_course = sample.course;
    state.last_sample = Some(sample);
    TickOutcome::Sample(sample)
}

/// Park the device on the final position and detach the run
fn complete_run(state: &mut EngineState, position: TrackPosition) -> TickOutcome {
    let spoof = &state.spoof;
    let sample = SpoofedLocationSample {
        coordinate: spoof.noise().apply(position.coordinate),
        course: geo_math::normalize_course(position.course),
        speed: 0.0,
        accuracy: spoof.reported_accuracy(),
        timestamp: SystemTime::now(),
    };
    if position.coordinate.is_valid() {
        state.spoof.base_coordinate = position.coordinate;
    }
    state.spoof.last_course = sample.course;
    state.clear_run();
    TickOutcome::Completed(sample)
}
